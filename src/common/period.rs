// src/common/period.rs

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

/// Mês/ano de referência dos relatórios e listagens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    /// Valores ausentes ou fora da faixa caem no mês/ano de `today`.
    pub fn resolve(month: Option<u32>, year: Option<i32>, today: NaiveDate) -> Self {
        let month = month
            .filter(|m| (1..=12).contains(m))
            .unwrap_or(today.month());
        let year = year
            .filter(|y| (1900..=2500).contains(y))
            .unwrap_or(today.year());
        Self { month, year }
    }

    /// Intervalo [início, fim) para usar em `data >= $1 AND data < $2`.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        // month/year já estão validados em resolve(), então as datas existem
        let start = NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN);
        let end = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        }
        .unwrap_or(NaiveDate::MAX);
        (start, end)
    }

    pub fn label(&self) -> String {
        format!("{:02}/{}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_to_today() {
        let p = Period::resolve(None, None, day(2025, 7, 19));
        assert_eq!(p, Period { month: 7, year: 2025 });
    }

    #[test]
    fn out_of_range_values_fall_back() {
        let today = day(2025, 7, 19);
        assert_eq!(Period::resolve(Some(13), Some(2024), today), Period { month: 7, year: 2024 });
        assert_eq!(Period::resolve(Some(0), Some(1800), today), Period { month: 7, year: 2025 });
        assert_eq!(Period::resolve(Some(2), Some(2600), today), Period { month: 2, year: 2025 });
    }

    #[test]
    fn bounds_cover_the_whole_month() {
        let p = Period { month: 2, year: 2024 };
        assert_eq!(p.bounds(), (day(2024, 2, 1), day(2024, 3, 1)));

        let dec = Period { month: 12, year: 2024 };
        assert_eq!(dec.bounds(), (day(2024, 12, 1), day(2025, 1, 1)));
        assert_eq!(dec.label(), "12/2024");
    }
}
