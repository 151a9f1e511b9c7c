//! BaZi (Four Pillars of Destiny).
//!
//! Month boundaries use fixed approximate solar-term dates, so births
//! within a day of a term boundary may land in the neighbouring month.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use augur_core::error::{AugurError, Result};

const STEMS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];
const BRANCHES: [char; 12] = ['子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥'];

/// Element index (wood, fire, earth, metal, water) per branch.
const BRANCH_ELEMENTS: [usize; 12] = [4, 2, 0, 0, 2, 1, 1, 2, 3, 3, 2, 4];

/// Approximate `(month, day)` on which each month from 寅 to 子 begins.
/// 丑 begins around January 6.
const MONTH_STARTS: [(u32, u32); 11] = [
    (2, 4),
    (3, 6),
    (4, 5),
    (5, 6),
    (6, 6),
    (7, 7),
    (8, 8),
    (9, 8),
    (10, 8),
    (11, 7),
    (12, 7),
];

/// Day count from 0001-01-01 of 2000-01-01, a 戊午 day.
const DAY_ANCHOR: i32 = 730_120;
const DAY_ANCHOR_CYCLE: i32 = 54;

#[derive(Debug, Clone, Deserialize)]
pub struct BaziInput {
    #[serde(alias = "datetime_str")]
    pub datetime: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElementTally {
    #[serde(rename = "木")]
    pub wood: u8,
    #[serde(rename = "火")]
    pub fire: u8,
    #[serde(rename = "土")]
    pub earth: u8,
    #[serde(rename = "金")]
    pub metal: u8,
    #[serde(rename = "水")]
    pub water: u8,
}

impl ElementTally {
    fn add(&mut self, element: usize) {
        match element {
            0 => self.wood += 1,
            1 => self.fire += 1,
            2 => self.earth += 1,
            3 => self.metal += 1,
            _ => self.water += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BaziResult {
    pub year_pillar: String,
    pub month_pillar: String,
    pub day_pillar: String,
    pub hour_pillar: String,
    pub input_time: String,
    pub elements: ElementTally,
    pub note: String,
}

/// A stem/branch pair by index.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Pillar {
    stem: usize,
    branch: usize,
}

impl Pillar {
    fn from_cycle(idx: i32) -> Self {
        let idx = idx.rem_euclid(60) as usize;
        Self {
            stem: idx % 10,
            branch: idx % 12,
        }
    }

    fn text(self) -> String {
        format!("{}{}", STEMS[self.stem], BRANCHES[self.branch])
    }
}

/// 0 for the 寅 month through 11 for 丑.
fn month_index(month: u32, day: u32) -> usize {
    if (month, day) < (1, 6) {
        return 10;
    }
    if (month, day) < MONTH_STARTS[0] {
        return 11;
    }
    MONTH_STARTS
        .iter()
        .rposition(|&start| (month, day) >= start)
        .unwrap_or_default()
}

fn year_pillar(date: NaiveDate) -> Pillar {
    let mut year = date.year();
    // The sexagenary year turns at 立春, not on January 1
    if (date.month(), date.day()) < MONTH_STARTS[0] {
        year -= 1;
    }
    Pillar::from_cycle(year - 4)
}

fn month_pillar(date: NaiveDate, year: Pillar) -> Pillar {
    let m = month_index(date.month(), date.day());
    Pillar {
        stem: (year.stem * 2 + 2 + m) % 10,
        branch: (2 + m) % 12,
    }
}

fn day_pillar(date: NaiveDate) -> Pillar {
    Pillar::from_cycle(date.num_days_from_ce() - DAY_ANCHOR + DAY_ANCHOR_CYCLE)
}

fn hour_pillar(hour: u32, day: Pillar) -> Pillar {
    let branch = ((hour as usize + 1) / 2) % 12;
    Pillar {
        stem: (day.stem * 2 + branch) % 10,
        branch,
    }
}

pub fn calculate(input: &BaziInput) -> Result<BaziResult> {
    let raw = input.datetime.trim();
    let dt = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").map_err(|_| {
        AugurError::ToolValidation("Invalid datetime format. Please use YYYY-MM-DD HH:MM.".into())
    })?;
    let date = dt.date();

    let year = year_pillar(date);
    let month = month_pillar(date, year);
    let day = day_pillar(date);
    let hour = hour_pillar(dt.hour(), day);

    let mut elements = ElementTally::default();
    for p in [year, month, day, hour] {
        elements.add(p.stem / 2);
        elements.add(BRANCH_ELEMENTS[p.branch]);
    }

    Ok(BaziResult {
        year_pillar: year.text(),
        month_pillar: month.text(),
        day_pillar: day.text(),
        hour_pillar: hour.text(),
        input_time: raw.to_string(),
        elements,
        note: "节气交接日按近似日期计算，临近节气出生者请以万年历核对月柱。".to_string(),
    })
}
