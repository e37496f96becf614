// src/services/totals.rs
//
// Cálculos de romaneio, item, tora e saldo. Nada aqui toca o banco:
// os serviços carregam os dados, chamam estas funções e gravam o resultado.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        decimal::{money, volume, MAX_MONEY, MAX_PRICE, MAX_VOLUME},
        error::RuleViolation,
    },
    models::{
        delivery::{FreightMode, LogPayload, Measure, ResolvedLog, WeighingMode},
        registry::{WoodPriceRule, WoodType},
    },
};

/// Quantidade usada quando um item SIMPLES chega sem quantidade (ou com zero).
pub const PLACEHOLDER_QUANTITY: Decimal = Decimal::from_parts(1, 0, 0, false, 3);
/// Menor valor unitário aceito (R$ 0,01).
pub const MIN_UNIT_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
const FOUR: Decimal = Decimal::from_parts(4, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTotals {
    pub quantity: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteTotals {
    pub total_volume: Decimal,
    pub gross_value: Decimal,
    pub net_value: Decimal,
}

/// Valor dentro da largura da coluna, ou `ValueOutOfRange`.
fn within(value: Decimal, max: Decimal) -> Result<Decimal, RuleViolation> {
    if value > max {
        return Err(RuleViolation::ValueOutOfRange);
    }
    Ok(value)
}

// ---
// Preço
// ---

/// Valor unitário do item: o informado, ou (se ausente/zero) o da tabela da madeira.
pub fn resolve_unit_price(
    requested: Option<Decimal>,
    wood: &WoodType,
    mode: FreightMode,
) -> Result<Decimal, RuleViolation> {
    let price = match requested {
        Some(p) if !p.is_zero() => p,
        _ => wood.price_for(mode),
    };
    let price = money(price);
    if price < MIN_UNIT_PRICE {
        return Err(RuleViolation::UnitPriceTooLow);
    }
    within(price, MAX_PRICE)
}

pub fn validate_wood_prices(
    rule: WoodPriceRule,
    normal: Decimal,
    freight: Decimal,
) -> Result<(), RuleViolation> {
    if normal < MIN_UNIT_PRICE || freight < MIN_UNIT_PRICE {
        return Err(RuleViolation::WoodPriceTooLow);
    }
    match rule {
        WoodPriceRule::FreightBelowNormal if freight >= normal => {
            Err(RuleViolation::FreightPriceNotBelowNormal)
        }
        _ => Ok(()),
    }
}

// ---
// Toras (modo DETALHADO)
// ---

/// Volume da tora: (rôdo/4)² × comprimento / 10⁶ − (d1 × d2 × comprimento) / 10⁶, em 3 casas.
pub fn log_volume(
    length: Decimal,
    rodo: Decimal,
    deduction_1: Decimal,
    deduction_2: Decimal,
) -> Result<Decimal, RuleViolation> {
    let gross = rodo
        .checked_div(FOUR)
        .and_then(|r| r.checked_mul(r))
        .and_then(|r| r.checked_mul(length))
        .and_then(|r| r.checked_div(MILLION));
    let deduction = deduction_1
        .checked_mul(deduction_2)
        .and_then(|d| d.checked_mul(length))
        .and_then(|d| d.checked_div(MILLION));
    let net = match (gross, deduction) {
        (Some(g), Some(d)) => g.checked_sub(d),
        _ => None,
    };
    within(volume(net.ok_or(RuleViolation::ValueOutOfRange)?), MAX_VOLUME)
}

/// Valida a tora e fixa a quantidade: manual se positiva, senão pela fórmula.
pub fn resolve_log(input: &LogPayload) -> Result<ResolvedLog, RuleViolation> {
    if input.length.is_some_and(|l| l <= Decimal::ZERO) {
        return Err(RuleViolation::LengthNotPositive);
    }
    if input.rodo.is_some_and(|r| r <= Decimal::ZERO) {
        return Err(RuleViolation::RodoNotPositive);
    }
    let deduction_1 = input.deduction_1.unwrap_or(Decimal::ZERO);
    let deduction_2 = input.deduction_2.unwrap_or(Decimal::ZERO);
    if deduction_1.is_sign_negative() || deduction_2.is_sign_negative() {
        return Err(RuleViolation::DeductionNegative);
    }

    let quantity = match input.quantity {
        Some(q) if q > Decimal::ZERO => volume(q),
        _ => match (input.length, input.rodo) {
            (Some(length), Some(rodo)) => log_volume(length, rodo, deduction_1, deduction_2)?,
            _ => Decimal::ZERO,
        },
    };
    if quantity <= Decimal::ZERO {
        return Err(RuleViolation::LogQuantityNotPositive);
    }
    let quantity = within(quantity, MAX_VOLUME)?;

    Ok(ResolvedLog {
        length: input.length.map(money),
        rodo: input.rodo.map(money),
        deduction_1: money(deduction_1),
        deduction_2: money(deduction_2),
        quantity,
    })
}

// ---
// Itens
// ---

/// Quantidade de item SIMPLES: vazio ou zero vira 0.001; negativo é rejeitado.
pub fn simple_quantity(requested: Option<Decimal>) -> Result<Decimal, RuleViolation> {
    match requested {
        None => Ok(PLACEHOLDER_QUANTITY),
        Some(q) if q.is_sign_negative() && !q.is_zero() => Err(RuleViolation::QuantityNegative),
        Some(q) if q.is_zero() => Ok(PLACEHOLDER_QUANTITY),
        Some(q) => {
            let q = volume(q);
            if q.is_zero() {
                return Ok(PLACEHOLDER_QUANTITY);
            }
            within(q, MAX_VOLUME)
        }
    }
}

/// Monta a medida do item conforme a modalidade de pesagem do romaneio.
pub fn resolve_measure(
    mode: WeighingMode,
    quantity: Option<Decimal>,
    logs: &[LogPayload],
) -> Result<Measure, RuleViolation> {
    match mode {
        WeighingMode::Simple => {
            if !logs.is_empty() {
                return Err(RuleViolation::LogsRequireDetailedMode);
            }
            Ok(Measure::Simple(simple_quantity(quantity)?))
        }
        WeighingMode::Detailed => {
            if logs.is_empty() {
                return Err(RuleViolation::DetailedItemWithoutLogs);
            }
            let resolved = logs.iter().map(resolve_log).collect::<Result<Vec<_>, _>>()?;
            Ok(Measure::Detailed(resolved))
        }
    }
}

/// Quantidade e subtotal do item.
pub fn item_totals(measure: &Measure, unit_price: Decimal) -> Result<ItemTotals, RuleViolation> {
    let quantity = match measure {
        Measure::Simple(q) => Some(*q),
        Measure::Detailed(logs) => logs
            .iter()
            .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.quantity)),
    };
    let quantity = within(volume(quantity.ok_or(RuleViolation::ValueOutOfRange)?), MAX_VOLUME)?;
    let subtotal = quantity
        .checked_mul(unit_price)
        .ok_or(RuleViolation::ValueOutOfRange)?;
    Ok(ItemTotals { quantity, subtotal: within(money(subtotal), MAX_MONEY)? })
}

/// Cada madeira aparece uma única vez no romaneio.
pub fn ensure_unique_wood_types<I>(wood_type_ids: I) -> Result<(), RuleViolation>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut seen = HashSet::new();
    for id in wood_type_ids {
        if !seen.insert(id) {
            return Err(RuleViolation::DuplicateWoodType);
        }
    }
    Ok(())
}

// ---
// Romaneio
// ---

pub fn note_totals<I>(items: I) -> Result<NoteTotals, RuleViolation>
where
    I: IntoIterator<Item = ItemTotals>,
{
    let (quantity, subtotal) = items
        .into_iter()
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(q, s), item| {
            Some((q.checked_add(item.quantity)?, s.checked_add(item.subtotal)?))
        })
        .ok_or(RuleViolation::ValueOutOfRange)?;
    let gross_value = within(money(subtotal), MAX_MONEY)?;
    Ok(NoteTotals {
        total_volume: within(volume(quantity), MAX_VOLUME)?,
        gross_value,
        net_value: gross_value,
    })
}

// ---
// Saldo e pagamentos
// ---

/// Saldo do cliente: pagamentos menos vendas. Negativo = cliente deve.
pub fn balance(total_payments: Decimal, total_sales: Decimal) -> Decimal {
    money(total_payments - total_sales)
}

pub fn validate_payment(amount: Decimal, date: NaiveDate, today: NaiveDate) -> Result<(), RuleViolation> {
    if amount <= Decimal::ZERO {
        return Err(RuleViolation::PaymentAmountNotPositive);
    }
    within(amount, MAX_MONEY)?;
    if date > today {
        return Err(RuleViolation::PaymentDateInFuture);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn wood(normal: Decimal, freight: Decimal) -> WoodType {
        WoodType {
            id: Uuid::new_v4(),
            name: "EUCALIPTO".into(),
            normal_price: normal,
            freight_price: freight,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn log(length: &str, rodo: &str) -> LogPayload {
        LogPayload {
            length: Some(length.parse().unwrap()),
            rodo: Some(rodo.parse().unwrap()),
            ..Default::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn constants_have_expected_values() {
        assert_eq!(PLACEHOLDER_QUANTITY, dec!(0.001));
        assert_eq!(MIN_UNIT_PRICE, dec!(0.01));
    }

    #[test]
    fn unit_price_falls_back_to_table_price() {
        let w = wood(dec!(180.00), dec!(150.00));
        assert_eq!(resolve_unit_price(None, &w, FreightMode::Normal), Ok(dec!(180.00)));
        assert_eq!(resolve_unit_price(Some(dec!(0)), &w, FreightMode::WithFreight), Ok(dec!(150.00)));
        assert_eq!(resolve_unit_price(Some(dec!(99.5)), &w, FreightMode::Normal), Ok(dec!(99.50)));
        assert_eq!(
            resolve_unit_price(Some(dec!(0.004)), &w, FreightMode::Normal),
            Err(RuleViolation::UnitPriceTooLow)
        );
        assert_eq!(
            resolve_unit_price(Some(dec!(-3)), &w, FreightMode::Normal),
            Err(RuleViolation::UnitPriceTooLow)
        );
    }

    #[test]
    fn wood_price_rule() {
        let rule = WoodPriceRule::FreightBelowNormal;
        assert_eq!(validate_wood_prices(rule, dec!(180), dec!(150)), Ok(()));
        assert_eq!(
            validate_wood_prices(rule, dec!(150), dec!(150)),
            Err(RuleViolation::FreightPriceNotBelowNormal)
        );
        assert_eq!(validate_wood_prices(WoodPriceRule::Unchecked, dec!(150), dec!(200)), Ok(()));
        assert_eq!(
            validate_wood_prices(WoodPriceRule::Unchecked, dec!(0), dec!(200)),
            Err(RuleViolation::WoodPriceTooLow)
        );
    }

    #[test]
    fn log_formula_reference_case() {
        // (30/4)² × 4 / 10⁶ = 0.000225 -> 0.000
        let v = log_volume(dec!(4.00), dec!(30.00), dec!(0), dec!(0)).unwrap();
        assert_eq!(v, dec!(0.000));
        assert_eq!(v.scale(), 3);
    }

    #[test]
    fn log_formula_with_deductions() {
        // (120/4)² × 3 / 10⁶ = 0.0027 ; 10 × 5 × 3 / 10⁶ = 0.00015 ; 0.00255 -> 0.003
        assert_eq!(log_volume(dec!(3), dec!(120), dec!(10), dec!(5)), Ok(dec!(0.003)));
        // (400/4)² × 5 / 10⁶ = 0.05
        assert_eq!(log_volume(dec!(5), dec!(400), dec!(0), dec!(0)), Ok(dec!(0.050)));
    }

    #[test]
    fn log_manual_quantity_wins() {
        let mut input = log("4", "30");
        input.quantity = Some(dec!(0.25));
        assert_eq!(resolve_log(&input).unwrap().quantity, dec!(0.250));
    }

    #[test]
    fn log_rejections() {
        // fórmula dá 0.000
        assert_eq!(resolve_log(&log("4", "30")), Err(RuleViolation::LogQuantityNotPositive));
        assert_eq!(resolve_log(&log("0", "30")), Err(RuleViolation::LengthNotPositive));
        assert_eq!(resolve_log(&log("4", "-1")), Err(RuleViolation::RodoNotPositive));

        let mut negative = log("5", "400");
        negative.deduction_2 = Some(dec!(-1));
        assert_eq!(resolve_log(&negative), Err(RuleViolation::DeductionNegative));

        assert_eq!(resolve_log(&LogPayload::default()), Err(RuleViolation::LogQuantityNotPositive));
    }

    #[test]
    fn log_defaults_deductions_to_zero() {
        let resolved = resolve_log(&log("5", "400")).unwrap();
        assert_eq!(resolved.deduction_1, dec!(0.00));
        assert_eq!(resolved.deduction_2, dec!(0.00));
        assert_eq!(resolved.quantity, dec!(0.050));
    }

    #[test]
    fn simple_quantity_placeholder() {
        assert_eq!(simple_quantity(None), Ok(dec!(0.001)));
        assert_eq!(simple_quantity(Some(dec!(0))), Ok(dec!(0.001)));
        assert_eq!(simple_quantity(Some(dec!(2))), Ok(dec!(2.000)));
        assert_eq!(simple_quantity(Some(dec!(1.23456))), Ok(dec!(1.235)));
        assert_eq!(simple_quantity(Some(dec!(-1))), Err(RuleViolation::QuantityNegative));
    }

    #[test]
    fn measure_matches_weighing_mode() {
        assert_eq!(
            resolve_measure(WeighingMode::Simple, Some(dec!(2)), &[]),
            Ok(Measure::Simple(dec!(2.000)))
        );
        assert_eq!(
            resolve_measure(WeighingMode::Simple, None, &[log("5", "400")]),
            Err(RuleViolation::LogsRequireDetailedMode)
        );
        assert_eq!(
            resolve_measure(WeighingMode::Detailed, Some(dec!(9)), &[]),
            Err(RuleViolation::DetailedItemWithoutLogs)
        );

        // A quantidade informada é ignorada no DETALHADO
        let measure =
            resolve_measure(WeighingMode::Detailed, Some(dec!(9)), &[log("5", "400"), log("5", "400")])
                .unwrap();
        assert_eq!(item_totals(&measure, dec!(100)).unwrap().quantity, dec!(0.100));
    }

    #[test]
    fn item_subtotal_is_rounded_half_up() {
        let totals = item_totals(&Measure::Simple(dec!(2.000)), dec!(10.00)).unwrap();
        assert_eq!(totals, ItemTotals { quantity: dec!(2.000), subtotal: dec!(20.00) });

        // 0.125 × 1.00 = 0.125 -> 0.13
        let totals = item_totals(&Measure::Simple(dec!(0.125)), dec!(1.00)).unwrap();
        assert_eq!(totals.subtotal, dec!(0.13));
    }

    #[test]
    fn duplicate_wood_types_are_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(ensure_unique_wood_types([a, b]), Ok(()));
        assert_eq!(ensure_unique_wood_types([a, b, a]), Err(RuleViolation::DuplicateWoodType));
    }

    #[test]
    fn deleting_an_item_drops_the_note_totals() {
        let first = item_totals(&Measure::Simple(dec!(1.000)), dec!(10.00)).unwrap();
        let second = item_totals(&Measure::Simple(dec!(2.000)), dec!(10.00)).unwrap();

        let before = note_totals([first, second]).unwrap();
        assert_eq!(before.net_value, dec!(30.00));
        assert_eq!(before.total_volume, dec!(3.000));

        let after = note_totals([second]).unwrap();
        assert_eq!(after.net_value, dec!(20.00));
        assert_eq!(after.total_volume, dec!(2.000));
    }

    #[test]
    fn empty_note_totals_are_zero_with_fixed_scale() {
        let totals = note_totals(Vec::<ItemTotals>::new()).unwrap();
        assert_eq!(totals.total_volume.to_string(), "0.000");
        assert_eq!(totals.net_value.to_string(), "0.00");
    }

    #[test]
    fn balance_scenario() {
        // Cliente A compra 2 m³ a R$ 10,00 e paga R$ 5,00
        let sale = note_totals([item_totals(&Measure::Simple(dec!(2)), dec!(10.00)).unwrap()]).unwrap();
        assert_eq!(balance(dec!(5.00), sale.net_value), dec!(-15.00));
        // Cliente B só pagou R$ 10,00
        assert_eq!(balance(dec!(10.00), dec!(0)), dec!(10.00));
    }

    #[test]
    fn payment_validation() {
        let today = day(2025, 6, 10);
        assert_eq!(
            validate_payment(dec!(0.00), today, today),
            Err(RuleViolation::PaymentAmountNotPositive)
        );
        assert_eq!(
            validate_payment(dec!(12.34), day(2025, 6, 11), today),
            Err(RuleViolation::PaymentDateInFuture)
        );
        assert_eq!(validate_payment(dec!(12.34), today, today), Ok(()));
        assert_eq!(validate_payment(dec!(12.34), day(2024, 1, 1), today), Ok(()));
        assert_eq!(
            validate_payment(dec!(10000000000000.00), today, today),
            Err(RuleViolation::ValueOutOfRange)
        );
    }

    #[test]
    fn huge_logs_are_rejected_instead_of_overflowing() {
        let huge = dec!(1000000000000000);
        assert_eq!(log_volume(huge, huge, dec!(0), dec!(0)), Err(RuleViolation::ValueOutOfRange));
        assert_eq!(
            log_volume(dec!(9999.99), dec!(9999.99), huge, huge),
            Err(RuleViolation::ValueOutOfRange)
        );
        assert_eq!(
            resolve_log(&log("1000000000000000", "1000000000000000")),
            Err(RuleViolation::ValueOutOfRange)
        );

        let mut manual = log("4", "30");
        manual.quantity = Some(dec!(10000000));
        assert_eq!(resolve_log(&manual), Err(RuleViolation::ValueOutOfRange));
    }

    #[test]
    fn widest_log_still_fits_the_volume_column() {
        // (9999.99/4)² × 9999.99 / 10⁶ ≈ 62500
        let v = log_volume(dec!(9999.99), dec!(9999.99), dec!(0), dec!(0)).unwrap();
        assert!(v <= MAX_VOLUME);
        assert_eq!(v.scale(), 3);
    }

    #[test]
    fn huge_items_are_rejected_instead_of_overflowing() {
        let quantity = volume(dec!(10000000000000000000000000));
        assert_eq!(
            item_totals(&Measure::Simple(quantity), dec!(100000)),
            Err(RuleViolation::ValueOutOfRange)
        );
        assert_eq!(simple_quantity(Some(dec!(10000000))), Err(RuleViolation::ValueOutOfRange));

        // 9 999 999.999 m³ × R$ 99 999 999,99 passa da coluna de subtotal
        assert_eq!(
            item_totals(&Measure::Simple(MAX_VOLUME), MAX_PRICE),
            Err(RuleViolation::ValueOutOfRange)
        );

        let w = wood(dec!(180.00), dec!(150.00));
        assert_eq!(
            resolve_unit_price(Some(dec!(100000000)), &w, FreightMode::Normal),
            Err(RuleViolation::ValueOutOfRange)
        );
    }

    #[test]
    fn note_totals_reject_sums_past_the_columns() {
        let item = ItemTotals { quantity: dec!(6000000.000), subtotal: dec!(6000000000000.00) };
        assert_eq!(note_totals([item, item]), Err(RuleViolation::ValueOutOfRange));

        let widest = ItemTotals { quantity: Decimal::MAX, subtotal: Decimal::MAX };
        assert_eq!(note_totals([widest, widest]), Err(RuleViolation::ValueOutOfRange));
    }

    fn money_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn volume_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=500_000).prop_map(|thousandths| Decimal::new(thousandths, 3))
    }

    proptest! {
        #[test]
        fn note_totals_are_sums_of_items(
            items in prop::collection::vec((volume_strategy(), money_strategy()), 1..12)
        ) {
            let totals: Vec<ItemTotals> = items
                .iter()
                .map(|(q, p)| item_totals(&Measure::Simple(*q), *p).unwrap())
                .collect();
            let note = note_totals(totals.iter().copied()).unwrap();

            let volume_sum: Decimal = totals.iter().map(|t| t.quantity).sum();
            let subtotal_sum: Decimal = totals.iter().map(|t| t.subtotal).sum();
            prop_assert_eq!(note.total_volume, volume_sum);
            prop_assert_eq!(note.net_value, subtotal_sum);
            prop_assert_eq!(note.net_value, note.gross_value);
        }

        #[test]
        fn note_totals_are_idempotent(
            items in prop::collection::vec((volume_strategy(), money_strategy()), 0..8)
        ) {
            let totals: Vec<ItemTotals> = items
                .iter()
                .map(|(q, p)| item_totals(&Measure::Simple(*q), *p).unwrap())
                .collect();
            prop_assert_eq!(note_totals(totals.clone()), note_totals(totals));
        }

        #[test]
        fn detailed_quantity_is_sum_of_logs(
            quantities in prop::collection::vec(volume_strategy(), 1..10),
            price in money_strategy(),
        ) {
            let logs: Vec<LogPayload> = quantities
                .iter()
                .map(|q| LogPayload { quantity: Some(*q), ..Default::default() })
                .collect();
            let measure = resolve_measure(WeighingMode::Detailed, None, &logs).unwrap();
            let totals = item_totals(&measure, price).unwrap();

            let expected: Decimal = quantities.iter().sum();
            prop_assert_eq!(totals.quantity, volume(expected));
            prop_assert_eq!(totals.subtotal, money(totals.quantity * price));
        }

        #[test]
        fn log_volume_has_three_places(
            length in 1i64..=2_000,
            rodo in 1i64..=30_000,
        ) {
            let v = log_volume(Decimal::new(length, 2), Decimal::new(rodo, 2), Decimal::ZERO, Decimal::ZERO)
                .unwrap();
            prop_assert_eq!(v.scale(), 3);
            prop_assert!(v >= Decimal::ZERO);
        }

        #[test]
        fn balance_sign_convention(payments in money_strategy(), sales in money_strategy()) {
            let b = balance(payments, sales);
            prop_assert_eq!(b, payments - sales);
            prop_assert_eq!(b.is_sign_negative() && !b.is_zero(), sales > payments);
        }

        #[test]
        fn future_payments_never_validate(amount in money_strategy(), days_ahead in 1i64..400) {
            let today = day(2025, 6, 10);
            let date = today + chrono::Duration::days(days_ahead);
            prop_assert_eq!(validate_payment(amount, date, today), Err(RuleViolation::PaymentDateInFuture));
        }
    }
}
