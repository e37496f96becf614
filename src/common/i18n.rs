// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

pub const DEFAULT_LANG: &str = "pt";

// (chave, pt, en)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("error.validation", "Um ou mais campos são inválidos.", "One or more fields are invalid."),
    ("error.not_found", "Registro não encontrado", "Record not found"),
    ("error.duplicate", "Já existe um registro com este valor", "A record with this value already exists"),
    (
        "error.delete_protected",
        "Não é possível excluir, existem registros vinculados",
        "Cannot delete, there are linked records",
    ),
    ("error.email_exists", "Este e-mail já está em uso.", "This e-mail is already in use."),
    ("error.invalid_credentials", "E-mail ou senha inválidos.", "Invalid e-mail or password."),
    ("error.invalid_token", "Sessão inválida ou expirada.", "Invalid or expired session."),
    (
        "error.forbidden",
        "Apenas usuários da equipe podem realizar esta ação.",
        "Only staff users can perform this action.",
    ),
    ("error.internal", "Ocorreu um erro inesperado.", "An unexpected error occurred."),
    ("field.required", "Campo obrigatório.", "This field is required."),
    ("field.length", "Tamanho inválido.", "Invalid length."),
    ("field.email", "E-mail inválido.", "Invalid e-mail."),
    ("field.range", "Valor fora da faixa permitida.", "Value out of range."),
    (
        "rule.payment_amount_not_positive",
        "O valor do pagamento deve ser positivo.",
        "Payment amount must be positive.",
    ),
    (
        "rule.payment_date_in_future",
        "A data do pagamento não pode ser no futuro.",
        "Payment date cannot be in the future.",
    ),
    (
        "rule.unit_price_too_low",
        "O valor unitário deve ser de pelo menos R$ 0,01.",
        "Unit price must be at least R$ 0.01.",
    ),
    ("rule.quantity_negative", "Informe a quantidade (m³) do item.", "Enter the item quantity (m³)."),
    (
        "rule.log_quantity_not_positive",
        "A quantidade da unidade deve ser maior que zero.",
        "Log quantity must be greater than zero.",
    ),
    ("rule.length_not_positive", "O comprimento deve ser maior que zero.", "Length must be greater than zero."),
    ("rule.rodo_not_positive", "O rôdo deve ser maior que zero.", "Rodo must be greater than zero."),
    ("rule.deduction_negative", "Os descontos não podem ser negativos.", "Deductions cannot be negative."),
    (
        "rule.duplicate_wood_type",
        "Não é permitido repetir o mesmo Tipo de Madeira no mesmo romaneio.",
        "The same wood type cannot appear twice in one delivery note.",
    ),
    (
        "rule.note_without_items",
        "O romaneio precisa ter pelo menos um item.",
        "A delivery note needs at least one item.",
    ),
    (
        "rule.detailed_item_without_logs",
        "No modo DETALHADO, cada tipo de madeira deve ter pelo menos uma unidade.",
        "In DETAILED mode every wood type needs at least one log.",
    ),
    (
        "rule.logs_require_detailed_mode",
        "Unidades só podem ser lançadas em romaneios DETALHADOS.",
        "Logs can only be recorded on DETAILED delivery notes.",
    ),
    (
        "rule.weighing_mode_locked",
        "A modalidade não pode ser alterada em um romaneio que já possui itens.",
        "The weighing mode cannot change on a delivery note that already has items.",
    ),
    (
        "rule.wood_price_too_low",
        "Os preços devem ser de pelo menos R$ 0,01.",
        "Prices must be at least R$ 0.01.",
    ),
    (
        "rule.freight_price_not_below_normal",
        "O preço COM FRETE deve ser menor que o preço NORMAL.",
        "The WITH FREIGHT price must be lower than the NORMAL price.",
    ),
    ("rule.inactive_customer", "Cliente inativo.", "Inactive customer."),
    ("rule.inactive_wood_type", "Tipo de madeira inativo.", "Inactive wood type."),
    ("rule.inactive_driver", "Motorista inativo.", "Inactive driver."),
    ("rule.value_out_of_range", "Valor acima do limite permitido.", "Value exceeds the allowed limit."),
];

/// Catálogo de mensagens por idioma. Idiomas desconhecidos caem para o português.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: Arc<HashMap<&'static str, HashMap<&'static str, &'static str>>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut pt = HashMap::with_capacity(MESSAGES.len());
        let mut en = HashMap::with_capacity(MESSAGES.len());
        for (key, pt_msg, en_msg) in MESSAGES {
            pt.insert(*key, *pt_msg);
            en.insert(*key, *en_msg);
        }

        let mut catalogs = HashMap::new();
        catalogs.insert("pt", pt);
        catalogs.insert("en", en);
        Self { catalogs: Arc::new(catalogs) }
    }

    /// Traduz `key`; se nem o idioma nem o português tiverem a chave, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .map(|m| m.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_portuguese_then_key() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "error.internal"), "Ocorreu um erro inesperado.");
        assert_eq!(store.translate("en", "error.internal"), "An unexpected error occurred.");
        assert_eq!(store.translate("pt", "no.such.key"), "no.such.key");
    }
}
