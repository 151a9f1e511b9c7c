use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use augur_core::error::{AugurError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct HoroscopeInput {
    #[serde(alias = "date_str")]
    pub date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HoroscopeResult {
    pub sign: String,
    pub date: String,
}

/// Last day of each month that still belongs to the month's first sign.
const CUTOFFS: [u32; 12] = [20, 19, 21, 20, 21, 22, 23, 23, 23, 24, 22, 22];

const SIGNS: [&str; 13] = [
    "摩羯座", "水瓶座", "双鱼座", "白羊座", "金牛座", "双子座", "巨蟹座", "狮子座", "处女座", "天秤座",
    "天蝎座", "射手座", "摩羯座",
];

pub fn sign_for(month: u32, day: u32) -> &'static str {
    let m = (month as usize).clamp(1, 12);
    if day > CUTOFFS[m - 1] {
        SIGNS[m]
    } else {
        SIGNS[m - 1]
    }
}

pub fn calculate(input: &HoroscopeInput) -> Result<HoroscopeResult> {
    let date = NaiveDate::parse_from_str(input.date.trim(), "%Y-%m-%d").map_err(|_| {
        AugurError::ToolValidation("Invalid date format. Please use YYYY-MM-DD.".into())
    })?;

    Ok(HoroscopeResult {
        sign: sign_for(date.month(), date.day()).to_string(),
        date: input.date.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(date: &str) -> Result<String> {
        calculate(&HoroscopeInput { date: date.into() }).map(|r| r.sign)
    }

    #[test]
    fn test_known_signs() {
        assert_eq!(sign("2023-03-25").unwrap(), "白羊座");
        assert_eq!(sign("2023-01-01").unwrap(), "摩羯座");
        assert_eq!(sign("2023-12-25").unwrap(), "摩羯座");
        assert_eq!(sign("1990-08-15").unwrap(), "狮子座");
    }

    #[test]
    fn test_cutoff_day_belongs_to_current_sign() {
        assert_eq!(sign("2023-01-20").unwrap(), "摩羯座");
        assert_eq!(sign("2023-01-21").unwrap(), "水瓶座");
        assert_eq!(sign("2023-10-24").unwrap(), "天秤座");
        assert_eq!(sign("2023-10-25").unwrap(), "天蝎座");
    }

    #[test]
    fn test_malformed_dates_rejected() {
        for bad in ["invalid-date", "2023-02-30", "2023/03/25", ""] {
            assert!(matches!(sign(bad), Err(AugurError::ToolValidation(_))), "{bad}");
        }
    }
}
