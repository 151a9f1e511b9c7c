//! I Ching divination by the three-coin method.
//!
//! Each line is the sum of three coins worth 2 (tails) or 3 (heads), so it
//! is one of 6 (old yin, moving), 7 (young yang), 8 (young yin) or
//! 9 (old yang, moving). Lines are listed bottom to top.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct IChingInput {
    pub question: String,
}

/// One of the eight trigrams. `lines` runs bottom to top, `true` is yang.
#[derive(Debug, Clone, Copy)]
pub struct Trigram {
    pub name: &'static str,
    pub image: &'static str,
    pub lines: [bool; 3],
}

/// Trigrams in King Wen table order.
pub const TRIGRAMS: [Trigram; 8] = [
    Trigram { name: "乾", image: "天", lines: [true, true, true] },
    Trigram { name: "震", image: "雷", lines: [true, false, false] },
    Trigram { name: "坎", image: "水", lines: [false, true, false] },
    Trigram { name: "艮", image: "山", lines: [false, false, true] },
    Trigram { name: "坤", image: "地", lines: [false, false, false] },
    Trigram { name: "巽", image: "风", lines: [false, true, true] },
    Trigram { name: "离", image: "火", lines: [true, false, true] },
    Trigram { name: "兑", image: "泽", lines: [true, true, false] },
];

/// King Wen number indexed by `[upper][lower]` trigram.
const KING_WEN: [[u8; 8]; 8] = [
    [1, 25, 6, 33, 12, 44, 13, 10],
    [34, 51, 40, 62, 16, 32, 55, 54],
    [5, 3, 29, 39, 8, 48, 63, 60],
    [26, 27, 4, 52, 23, 18, 22, 41],
    [11, 24, 7, 15, 2, 46, 36, 19],
    [9, 42, 59, 53, 20, 57, 37, 61],
    [14, 21, 64, 56, 35, 50, 30, 38],
    [43, 17, 47, 31, 45, 28, 49, 58],
];

const NAMES: [&str; 64] = [
    "乾", "坤", "屯", "蒙", "需", "讼", "师", "比", "小畜", "履", "泰", "否", "同人", "大有",
    "谦", "豫", "随", "蛊", "临", "观", "噬嗑", "贲", "剥", "复", "无妄", "大畜", "颐", "大过",
    "坎", "离", "咸", "恒", "遯", "大壮", "晋", "明夷", "家人", "睽", "蹇", "解", "损", "益",
    "夬", "姤", "萃", "升", "困", "井", "革", "鼎", "震", "艮", "渐", "归妹", "丰", "旅", "巽",
    "兑", "涣", "节", "中孚", "小过", "既济", "未济",
];

const ENGLISH: [&str; 64] = [
    "The Creative",
    "The Receptive",
    "Difficulty at the Beginning",
    "Youthful Folly",
    "Waiting",
    "Conflict",
    "The Army",
    "Holding Together",
    "The Taming Power of the Small",
    "Treading",
    "Peace",
    "Standstill",
    "Fellowship with Men",
    "Possession in Great Measure",
    "Modesty",
    "Enthusiasm",
    "Following",
    "Work on What Has Been Spoiled",
    "Approach",
    "Contemplation",
    "Biting Through",
    "Grace",
    "Splitting Apart",
    "Return",
    "Innocence",
    "The Taming Power of the Great",
    "The Corners of the Mouth",
    "Preponderance of the Great",
    "The Abysmal",
    "The Clinging",
    "Influence",
    "Duration",
    "Retreat",
    "The Power of the Great",
    "Progress",
    "Darkening of the Light",
    "The Family",
    "Opposition",
    "Obstruction",
    "Deliverance",
    "Decrease",
    "Increase",
    "Break-through",
    "Coming to Meet",
    "Gathering Together",
    "Pushing Upward",
    "Oppression",
    "The Well",
    "Revolution",
    "The Caldron",
    "The Arousing",
    "Keeping Still",
    "Development",
    "The Marrying Maiden",
    "Abundance",
    "The Wanderer",
    "The Gentle",
    "The Joyous",
    "Dispersion",
    "Limitation",
    "Inner Truth",
    "Preponderance of the Small",
    "After Completion",
    "Before Completion",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hexagram {
    pub number: u8,
    pub name: String,
    pub english: String,
    pub upper: String,
    pub lower: String,
    /// Bottom-to-top bit pattern, `1` for yang.
    pub pattern: String,
}

impl Hexagram {
    /// Identify a hexagram from six bottom-to-top lines.
    pub fn from_lines(lines: [bool; 6]) -> Self {
        let lower = trigram_index([lines[0], lines[1], lines[2]]);
        let upper = trigram_index([lines[3], lines[4], lines[5]]);
        let number = KING_WEN[upper][lower];
        let idx = usize::from(number - 1);
        let describe = |t: &Trigram| format!("{} ({})", t.name, t.image);

        Self {
            number,
            name: NAMES[idx].to_string(),
            english: ENGLISH[idx].to_string(),
            upper: describe(&TRIGRAMS[upper]),
            lower: describe(&TRIGRAMS[lower]),
            pattern: lines.iter().map(|&l| if l { '1' } else { '0' }).collect(),
        }
    }
}

fn trigram_index(lines: [bool; 3]) -> usize {
    // All eight patterns are present, so the search always hits
    TRIGRAMS
        .iter()
        .position(|t| t.lines == lines)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct IChingReading {
    pub question: String,
    pub original_hexagram: Hexagram,
    pub changed_hexagram: Hexagram,
    pub lines: [u8; 6],
    pub moving_lines: Vec<usize>,
    pub reading: String,
}

/// Toss three coins six times.
pub fn cast<R: Rng + ?Sized>(rng: &mut R) -> [u8; 6] {
    let mut lines = [0u8; 6];
    for line in &mut lines {
        *line = (0..3).map(|_| if rng.gen_bool(0.5) { 3 } else { 2 }).sum();
    }
    lines
}

pub fn divine<R: Rng + ?Sized>(input: &IChingInput, rng: &mut R) -> IChingReading {
    interpret(&input.question, cast(rng))
}

/// Build the full reading for a given cast.
pub fn interpret(question: &str, lines: [u8; 6]) -> IChingReading {
    let original = lines.map(|l| l == 7 || l == 9);
    let changed = lines.map(|l| l == 6 || l == 7);
    let moving_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|&(_, &l)| l == 6 || l == 9)
        .map(|(i, _)| i + 1)
        .collect();

    let original_hexagram = Hexagram::from_lines(original);
    let changed_hexagram = Hexagram::from_lines(changed);
    let reading = reading_guide(&lines, &moving_lines, &original_hexagram);

    IChingReading {
        question: question.to_string(),
        original_hexagram,
        changed_hexagram,
        lines,
        moving_lines,
        reading,
    }
}

/// Traditional name of a line, e.g. 初九, 六二, 上六.
fn line_name(position: usize, yang: bool) -> String {
    let kind = if yang { "九" } else { "六" };
    match position {
        1 => format!("初{kind}"),
        6 => format!("上{kind}"),
        n => format!("{kind}{}", ["", "", "二", "三", "四", "五"][n]),
    }
}

/// Which text to consult, by number of moving lines.
fn reading_guide(lines: &[u8; 6], moving: &[usize], original: &Hexagram) -> String {
    let original_name = |pos: usize| line_name(pos, matches!(lines[pos - 1], 7 | 9));
    let changed_name = |pos: usize| line_name(pos, matches!(lines[pos - 1], 6 | 7));
    let static_lines: Vec<usize> = (1..=6).filter(|p| !moving.contains(p)).collect();

    match moving.len() {
        0 => "无动爻，以本卦卦辞断之。".to_string(),
        1 => format!("一爻动，以本卦{}爻辞断之。", original_name(moving[0])),
        2 => format!(
            "二爻动，以本卦{}、{}两爻爻辞断之，以上爻{}为主。",
            original_name(moving[0]),
            original_name(moving[1]),
            original_name(moving[1])
        ),
        3 => "三爻动，以本卦与之卦卦辞断之，以本卦为主。".to_string(),
        4 => format!(
            "四爻动，以之卦{}、{}两静爻爻辞断之，以下爻{}为主。",
            changed_name(static_lines[0]),
            changed_name(static_lines[1]),
            changed_name(static_lines[0])
        ),
        5 => format!("五爻动，以之卦{}静爻爻辞断之。", changed_name(static_lines[0])),
        _ => match original.number {
            1 => "六爻皆动，乾卦以用九爻辞断之。".to_string(),
            2 => "六爻皆动，坤卦以用六爻辞断之。".to_string(),
            _ => "六爻皆动，以之卦卦辞断之。".to_string(),
        },
    }
}
