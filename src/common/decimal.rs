// src/common/decimal.rs

use rust_decimal::{Decimal, RoundingStrategy};
use validator::ValidationError;

/// Casas decimais de volume (m³).
pub const VOLUME_DP: u32 = 3;
/// Casas decimais de dinheiro (R$).
pub const MONEY_DP: u32 = 2;

// Maiores valores que cabem nas colunas NUMERIC do banco.
/// NUMERIC(6,2): comprimento, rôdo e descontos da tora.
pub const MAX_MEASURE: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);
/// NUMERIC(10,3): quantidades em m³.
pub const MAX_VOLUME: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 3);
/// NUMERIC(10,2): preços por m³.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);
/// NUMERIC(15,2): subtotais, totais do romaneio e pagamentos.
pub const MAX_MONEY: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

/// Menor preço aceito (R$ 0,01).
pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Arredonda "half-up" e fixa a escala, para que 1 vire 1.000 e 0.0005 vire 0.001.
pub fn quantize(value: Decimal, dp: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

pub fn volume(value: Decimal) -> Decimal {
    quantize(value, VOLUME_DP)
}

pub fn money(value: Decimal) -> Decimal {
    quantize(value, MONEY_DP)
}

fn upper_bound(val: &Decimal, max: Decimal) -> Result<(), ValidationError> {
    if *val > max {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &max.to_string());
        err.message = Some(format!("O valor não pode passar de {}.", max).into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_measure(val: &Decimal) -> Result<(), ValidationError> {
    upper_bound(val, MAX_MEASURE)
}

pub(crate) fn validate_volume(val: &Decimal) -> Result<(), ValidationError> {
    upper_bound(val, MAX_VOLUME)
}

pub(crate) fn validate_price(val: &Decimal) -> Result<(), ValidationError> {
    upper_bound(val, MAX_PRICE)
}

pub(crate) fn validate_amount(val: &Decimal) -> Result<(), ValidationError> {
    upper_bound(val, MAX_MONEY)
}

pub(crate) fn validate_min_price(val: &Decimal) -> Result<(), ValidationError> {
    if *val < MIN_PRICE {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &"0.01");
        err.message = Some("O valor deve ser de pelo menos R$ 0,01.".into());
        return Err(err);
    }
    validate_price(val)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn half_up_on_the_midpoint() {
        assert_eq!(money(dec!(0.125)), dec!(0.13));
        assert_eq!(money(dec!(0.135)), dec!(0.14));
        assert_eq!(volume(dec!(0.0005)), dec!(0.001));
        assert_eq!(volume(dec!(0.0004999)), dec!(0.000));
    }

    #[test]
    fn scale_is_fixed() {
        assert_eq!(volume(dec!(2)).scale(), 3);
        assert_eq!(volume(dec!(2)).to_string(), "2.000");
        assert_eq!(money(dec!(20)).to_string(), "20.00");
    }

    #[test]
    fn column_limits() {
        assert_eq!(MAX_MEASURE, dec!(9999.99));
        assert_eq!(MAX_VOLUME, dec!(9999999.999));
        assert_eq!(MAX_PRICE, dec!(99999999.99));
        assert_eq!(MAX_MONEY, dec!(9999999999999.99));
        assert_eq!(MIN_PRICE, dec!(0.01));
    }

    #[test]
    fn upper_bounds_are_inclusive() {
        assert!(validate_measure(&dec!(9999.99)).is_ok());
        assert!(validate_measure(&dec!(10000)).is_err());
        assert!(validate_volume(&dec!(1e25)).is_err());
        assert!(validate_price(&dec!(100000000)).is_err());
        assert!(validate_amount(&dec!(9999999999999.99)).is_ok());
        assert!(validate_min_price(&dec!(0.001)).is_err());
        assert!(validate_min_price(&dec!(100000000)).is_err());
        assert!(validate_min_price(&dec!(180.00)).is_ok());
    }
}
