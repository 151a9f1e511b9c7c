use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ZodiacInput {
    pub year: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Compatibility {
    pub best: Vec<String>,
    pub worst: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZodiacResult {
    pub year: i32,
    pub sign: String,
    pub compatibility: Compatibility,
}

pub const ANIMALS: [&str; 12] = ["鼠", "牛", "虎", "兔", "龙", "蛇", "马", "羊", "猴", "鸡", "狗", "猪"];

/// `(best, worst)` matches, indexed like `ANIMALS`.
const COMPATIBILITY: [(&[&str], &[&str]); 12] = [
    (&["龙", "猴", "牛"], &["马", "羊", "鸡"]),
    (&["鼠", "蛇", "鸡"], &["马", "羊", "狗"]),
    (&["马", "狗", "猪"], &["蛇", "猴"]),
    (&["羊", "狗", "猪"], &["鼠", "鸡", "龙"]),
    (&["鼠", "猴", "鸡"], &["狗", "兔"]),
    (&["牛", "鸡"], &["猪", "虎"]),
    (&["虎", "羊", "狗"], &["鼠", "牛"]),
    (&["兔", "马", "猪"], &["鼠", "牛", "狗"]),
    (&["鼠", "龙"], &["虎", "猪"]),
    (&["牛", "龙", "蛇"], &["兔", "狗"]),
    (&["虎", "兔", "马"], &["牛", "龙", "羊"]),
    (&["羊", "兔", "虎"], &["蛇", "猴", "猪"]),
];

/// Index into `ANIMALS`; 1900 is a year of the rat.
pub fn animal_index(year: i32) -> usize {
    (year - 1900).rem_euclid(12) as usize
}

pub fn calculate(input: &ZodiacInput) -> ZodiacResult {
    let idx = animal_index(input.year);
    let (best, worst) = COMPATIBILITY[idx];
    let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };

    ZodiacResult {
        year: input.year,
        sign: ANIMALS[idx].to_string(),
        compatibility: Compatibility {
            best: owned(best),
            worst: owned(worst),
        },
    }
}
