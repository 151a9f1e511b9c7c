//! Pull tool arguments out of a free-text question.

use std::sync::OnceLock;

use regex::Regex;

use augur_core::error::{AugurError, Result};

use crate::bazi::BaziInput;
use crate::horoscope::HoroscopeInput;
use crate::iching::IChingInput;
use crate::naming::NamingInput;
use crate::zodiac::ZodiacInput;
use crate::{ToolCall, ToolKind};

fn date_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})\s*[-/年]\s*(\d{1,2})\s*[-/月]\s*(\d{1,2})\s*[日号]?").ok())
        .as_ref()
}

fn time_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})\s*[:：]\s*(\d{2})").ok())
        .as_ref()
}

fn year_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{4})(?:\D|$)").ok())
        .as_ref()
}

fn surname_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"姓(\p{Han})").ok()).as_ref()
}

/// First date in the text, normalized to `YYYY-MM-DD`.
pub fn find_date(text: &str) -> Option<String> {
    let caps = date_re()?.captures(text)?;
    let year: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    Some(format!("{:04}-{:02}-{:02}", year, month, day))
}

/// First `HH:MM` after the first date (or anywhere when there is no date).
pub fn find_time(text: &str) -> Option<String> {
    let rest = match date_re().and_then(|re| re.find(text)) {
        Some(m) => &text[m.end()..],
        None => text,
    };
    let caps = time_re()?.captures(rest)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    Some(format!("{:02}:{:02}", hour, minute))
}

/// First standalone four-digit number.
pub fn find_year(text: &str) -> Option<i32> {
    year_re()?.captures(text)?[1].parse().ok()
}

/// The character after `姓`, skipping the word 姓名.
pub fn find_surname(text: &str) -> Option<String> {
    surname_re()?
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .find(|s| s != "名")
}

/// Gender keywords, most specific first. A word naming the child wins over
/// a bare 男/女 that may describe the asker.
const GENDER_KEYWORDS: &[(&str, &str)] = &[
    ("女儿", "girl"),
    ("儿子", "boy"),
    ("女孩", "girl"),
    ("男孩", "boy"),
    ("girl", "girl"),
    ("boy", "boy"),
    ("女", "girl"),
    ("男", "boy"),
];

pub fn find_gender(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    GENDER_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, gender)| *gender)
}

/// Build the tool call an action stage runs for `question`.
pub fn call_from_question(kind: ToolKind, question: &str) -> Result<ToolCall> {
    let missing = |what: &str| AugurError::ToolValidation(format!("未能从问题中识别{}", what));

    Ok(match kind {
        ToolKind::IChing => ToolCall::IChing(IChingInput {
            question: question.to_string(),
        }),
        ToolKind::Horoscope => ToolCall::Horoscope(HoroscopeInput {
            date: find_date(question).ok_or_else(|| missing("出生日期（例如 1990-05-20）"))?,
        }),
        ToolKind::Zodiac => ToolCall::Zodiac(ZodiacInput {
            year: find_year(question).ok_or_else(|| missing("出生年份（例如 1990）"))?,
        }),
        ToolKind::BaZi => {
            let date =
                find_date(question).ok_or_else(|| missing("出生日期（例如 1990-05-20 08:30）"))?;
            let time = find_time(question).unwrap_or_else(|| "12:00".to_string());
            ToolCall::BaZi(BaziInput {
                datetime: format!("{} {}", date, time),
            })
        }
        ToolKind::Naming => ToolCall::Naming(NamingInput {
            surname: find_surname(question).ok_or_else(|| missing("姓氏（例如 姓李）"))?,
            gender: find_gender(question)
                .ok_or_else(|| missing("性别（男孩或女孩）"))?
                .to_string(),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_date_formats() {
        assert_eq!(find_date("我的生日是2023-03-25").as_deref(), Some("2023-03-25"));
        assert_eq!(find_date("生于1990/5/2，星座？").as_deref(), Some("1990-05-02"));
        assert_eq!(find_date("1988年12月3日出生").as_deref(), Some("1988-12-03"));
        assert_eq!(find_date("没有日期"), None);
    }

    #[test]
    fn test_find_time_after_date() {
        assert_eq!(
            find_time("1990-01-01 8:05 出生的八字").as_deref(),
            Some("08:05")
        );
        assert_eq!(find_time("1990年1月1日 下午13：30").as_deref(), Some("13:30"));
        assert_eq!(find_time("1990-01-01"), None);
    }

    #[test]
    fn test_find_year() {
        assert_eq!(find_year("我是1990年出生的，属什么？"), Some(1990));
        assert_eq!(find_year("2024"), Some(2024));
        assert_eq!(find_year("电话12345678"), None);
        assert_eq!(find_year("属相是什么"), None);
    }

    #[test]
    fn test_find_surname_and_gender() {
        assert_eq!(find_surname("我姓李，想给儿子起名").as_deref(), Some("李"));
        assert_eq!(find_surname("姓名不重要，姓王").as_deref(), Some("王"));
        assert_eq!(find_gender("给女儿取名"), Some("girl"));
        assert_eq!(find_gender("给儿子取名"), Some("boy"));
        assert_eq!(find_gender("a name for my Girl"), Some("girl"));
        assert_eq!(find_gender("起个名字"), None);
    }

    #[test]
    fn test_find_gender_prefers_child_word() {
        assert_eq!(find_gender("我是男的，给女儿起名"), Some("girl"));
        assert_eq!(find_gender("我是女生，想给儿子取名"), Some("boy"));
        assert_eq!(find_gender("女孩名字建议"), Some("girl"));
    }

    #[test]
    fn test_call_from_question() {
        match call_from_question(ToolKind::BaZi, "1990-01-01出生，看看八字").unwrap() {
            ToolCall::BaZi(input) => assert_eq!(input.datetime, "1990-01-01 12:00"),
            other => panic!("unexpected call {other:?}"),
        }
        match call_from_question(ToolKind::Naming, "姓张，给女儿起名").unwrap() {
            ToolCall::Naming(input) => {
                assert_eq!(input.surname, "张");
                assert_eq!(input.gender, "girl");
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn test_missing_input_is_validation_error() {
        let err = call_from_question(ToolKind::Horoscope, "我是什么星座？").unwrap_err();
        assert!(matches!(err, AugurError::ToolValidation(_)));
        let err = call_from_question(ToolKind::Zodiac, "我属什么").unwrap_err();
        assert!(matches!(err, AugurError::ToolValidation(_)));
    }
}
