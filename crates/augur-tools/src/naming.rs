use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use augur_core::error::{AugurError, Result};

pub const SUGGESTION_COUNT: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct NamingInput {
    pub surname: String,
    pub gender: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NameSuggestion {
    pub name: String,
    pub score: u8,
    pub meaning: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamingResult {
    pub surname: String,
    pub gender: String,
    pub suggestions: Vec<NameSuggestion>,
}

const BOY_CHARS: [(char, &str); 10] = [
    ('伟', "宏伟"),
    ('强', "刚强"),
    ('磊', "光明磊落"),
    ('洋', "胸怀宽广"),
    ('勇', "勇敢"),
    ('军', "威武"),
    ('杰', "才能出众"),
    ('涛', "气势磅礴"),
    ('明', "聪明"),
    ('刚', "坚毅"),
];

const GIRL_CHARS: [(char, &str); 10] = [
    ('芳', "芬芳"),
    ('娜', "婀娜"),
    ('敏', "聪敏"),
    ('静', "文静"),
    ('秀', "秀美"),
    ('娟', "秀丽"),
    ('英', "英气"),
    ('华', "才华"),
    ('慧', "智慧"),
    ('巧', "灵巧"),
];

pub fn suggest<R: Rng + ?Sized>(input: &NamingInput, rng: &mut R) -> Result<NamingResult> {
    let surname = input.surname.trim();
    if surname.is_empty() {
        return Err(AugurError::ToolValidation("surname must not be empty".into()));
    }
    let gender = input.gender.trim().to_lowercase();
    let pool: &[(char, &str)] = match gender.as_str() {
        "boy" => &BOY_CHARS,
        "girl" => &GIRL_CHARS,
        other => {
            return Err(AugurError::ToolValidation(format!(
                "unsupported gender '{}', expected boy or girl",
                other
            )))
        }
    };

    let mut suggestions = Vec::with_capacity(SUGGESTION_COUNT);
    for _ in 0..SUGGESTION_COUNT {
        // Pools are non-empty constants
        let (c1, g1) = pool.choose(rng).copied().unwrap_or(pool[0]);
        let (c2, g2) = pool.choose(rng).copied().unwrap_or(pool[0]);
        let meaning = if c1 == c2 {
            format!("寓意{}", g1)
        } else {
            format!("寓意{}、{}", g1, g2)
        };
        suggestions.push(NameSuggestion {
            name: format!("{}{}{}", surname, c1, c2),
            score: rng.gen_range(80..=100),
            meaning,
        });
    }

    Ok(NamingResult {
        surname: surname.to_string(),
        gender,
        suggestions,
    })
}
