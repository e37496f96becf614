// src/common/db_utils.rs

use crate::common::error::AppError;

/// Traduz violações de constraint do Postgres para os erros de domínio.
/// `what` descreve o registro envolvido (ex: "Cliente 'JOÃO'").
pub(crate) fn map_constraint_error(err: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(what.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::DeleteProtected(what.to_string());
        }
    }
    err.into()
}

/// Escapa `%` e `_` para uso seguro em `ILIKE '%' || $1 || '%'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Normaliza nomes de cadastro: sem espaços nas pontas e em maiúsculas.
pub(crate) fn normalize_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Texto opcional: string vazia (após trim) vira `None`.
pub(crate) fn blank_to_none(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" pin "), "%pin%");
        assert_eq!(like_pattern("50%_x"), "%50\\%\\_x%");
    }

    #[test]
    fn names_are_trimmed_and_uppercased() {
        assert_eq!(normalize_name("  eucalipto tratado "), "EUCALIPTO TRATADO");
        assert_eq!(normalize_name("joão"), "JOÃO");
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(blank_to_none(Some("   ".into())), None);
        assert_eq!(blank_to_none(Some(" 123 ".into())), Some("123".into()));
        assert_eq!(blank_to_none(None), None);
    }

    #[test]
    fn non_database_errors_pass_through() {
        let err = map_constraint_error(sqlx::Error::RowNotFound, "x");
        assert!(matches!(err, AppError::DatabaseError(sqlx::Error::RowNotFound)));
    }
}
