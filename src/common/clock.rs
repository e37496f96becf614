// src/common/clock.rs

use chrono::{FixedOffset, NaiveDate, Utc};

/// Fonte do "hoje" no fuso local da empresa.
/// Validação de pagamento e período padrão dos relatórios leem daqui, nunca do relógio direto.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Relógio real com deslocamento fixo (America/Sao_Paulo não tem horário de verão desde 2019).
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset: FixedOffset,
}

impl LocalClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

/// Relógio congelado, para testes.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Converte "-03:00" / "+05:30" em FixedOffset.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next()? {
        '-' => (-1, &raw[1..]),
        '+' => (1, &raw[1..]),
        _ => (1, raw),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("-03:00"), FixedOffset::west_opt(3 * 3600));
        assert_eq!(parse_utc_offset("+05:30"), FixedOffset::east_opt(5 * 3600 + 30 * 60));
        assert_eq!(parse_utc_offset("0"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("-3"), FixedOffset::west_opt(3 * 3600));
        assert!(parse_utc_offset("abc").is_none());
        assert!(parse_utc_offset("+15:00").is_none());
        assert!(parse_utc_offset("").is_none());
    }

    #[test]
    fn fixed_clock_is_frozen() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let clock = FixedClock(day);
        assert_eq!(clock.today(), day);
        assert_eq!(clock.today(), day);
    }
}
