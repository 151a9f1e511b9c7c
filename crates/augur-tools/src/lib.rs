//! Divination calculators.
//!
//! The tool set is closed: every tool is a [`ToolKind`] and every invocation
//! a [`ToolCall`]. Tools never fail past their boundary; validation problems
//! come back as an inline `{"error": ...}` object.

pub mod bazi;
pub mod extract;
pub mod horoscope;
pub mod iching;
pub mod naming;
pub mod zodiac;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use augur_core::error::{AugurError, Result};
use augur_core::types::ToolDefinition;

pub use extract::call_from_question;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    IChing,
    Horoscope,
    Zodiac,
    BaZi,
    Naming,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::IChing,
        ToolKind::Horoscope,
        ToolKind::Zodiac,
        ToolKind::BaZi,
        ToolKind::Naming,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::IChing => "iching_divination",
            ToolKind::Horoscope => "horoscope_calculator",
            ToolKind::Zodiac => "zodiac_calculator",
            ToolKind::BaZi => "bazi_calculator",
            ToolKind::Naming => "naming_suggestion",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::IChing => {
                "Perform I Ching divination using the three-coin method and look up the original and changed hexagrams."
            }
            ToolKind::Horoscope => "Calculate the Western horoscope sign for a birth date.",
            ToolKind::Zodiac => {
                "Calculate the Chinese zodiac animal and its compatibility for a birth year."
            }
            ToolKind::BaZi => "Calculate the BaZi (Four Pillars) for a birth date and time.",
            ToolKind::Naming => "Suggest given names for a surname and gender.",
        }
    }

    pub fn input_schema(self) -> serde_json::Value {
        match self {
            ToolKind::IChing => serde_json::json!({
                "type": "object",
                "properties": {
                    "question": { "type": "string", "description": "The question for divination" }
                },
                "required": ["question"]
            }),
            ToolKind::Horoscope => serde_json::json!({
                "type": "object",
                "properties": {
                    "date": { "type": "string", "description": "Birth date in YYYY-MM-DD format" }
                },
                "required": ["date"]
            }),
            ToolKind::Zodiac => serde_json::json!({
                "type": "object",
                "properties": {
                    "year": { "type": "integer", "description": "Birth year (e.g. 1990)" }
                },
                "required": ["year"]
            }),
            ToolKind::BaZi => serde_json::json!({
                "type": "object",
                "properties": {
                    "datetime": { "type": "string", "description": "Birth datetime in YYYY-MM-DD HH:MM format" }
                },
                "required": ["datetime"]
            }),
            ToolKind::Naming => serde_json::json!({
                "type": "object",
                "properties": {
                    "surname": { "type": "string", "description": "Family name" },
                    "gender": { "type": "string", "enum": ["boy", "girl"] }
                },
                "required": ["surname", "gender"]
            }),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Definitions of every tool, in a stable order.
pub fn definitions() -> Vec<ToolDefinition> {
    ToolKind::ALL.into_iter().map(ToolKind::definition).collect()
}

/// A validated tool invocation.
#[derive(Debug, Clone)]
pub enum ToolCall {
    IChing(iching::IChingInput),
    Horoscope(horoscope::HoroscopeInput),
    Zodiac(zodiac::ZodiacInput),
    BaZi(bazi::BaziInput),
    Naming(naming::NamingInput),
}

impl ToolCall {
    /// Decode a JSON argument object for `kind`.
    pub fn from_json(kind: ToolKind, input: serde_json::Value) -> Result<Self> {
        fn decode<T: serde::de::DeserializeOwned>(input: serde_json::Value) -> Result<T> {
            serde_json::from_value(input).map_err(|e| AugurError::ToolValidation(e.to_string()))
        }

        Ok(match kind {
            ToolKind::IChing => ToolCall::IChing(decode(input)?),
            ToolKind::Horoscope => ToolCall::Horoscope(decode(input)?),
            ToolKind::Zodiac => ToolCall::Zodiac(decode(input)?),
            ToolKind::BaZi => ToolCall::BaZi(decode(input)?),
            ToolKind::Naming => ToolCall::Naming(decode(input)?),
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::IChing(_) => ToolKind::IChing,
            ToolCall::Horoscope(_) => ToolKind::Horoscope,
            ToolCall::Zodiac(_) => ToolKind::Zodiac,
            ToolCall::BaZi(_) => ToolKind::BaZi,
            ToolCall::Naming(_) => ToolKind::Naming,
        }
    }

    /// Run the tool with the thread-local RNG.
    pub fn execute(&self) -> serde_json::Value {
        self.execute_with(&mut rand::thread_rng())
    }

    /// Run the tool, drawing any randomness from `rng`.
    pub fn execute_with<R: Rng + ?Sized>(&self, rng: &mut R) -> serde_json::Value {
        debug!(tool = self.kind().name(), "Executing tool");
        match self {
            ToolCall::IChing(input) => to_json(Ok(iching::divine(input, rng))),
            ToolCall::Horoscope(input) => to_json(horoscope::calculate(input)),
            ToolCall::Zodiac(input) => to_json(Ok(zodiac::calculate(input))),
            ToolCall::BaZi(input) => to_json(bazi::calculate(input)),
            ToolCall::Naming(input) => to_json(naming::suggest(input, rng)),
        }
    }
}

fn to_json<T: Serialize>(result: Result<T>) -> serde_json::Value {
    match result.and_then(|v| serde_json::to_value(v).map_err(AugurError::from)) {
        Ok(value) => value,
        Err(e) => error_value(&e),
    }
}

/// The inline error object a tool returns instead of a result.
pub fn error_value(e: &AugurError) -> serde_json::Value {
    let message = match e {
        AugurError::ToolValidation(msg) => msg.clone(),
        other => other.to_string(),
    };
    serde_json::json!({ "error": message })
}

/// Run a tool by name. Only an unknown name is an error; bad arguments
/// produce the inline error object.
pub fn run_tool(name: &str, input: serde_json::Value) -> Result<serde_json::Value> {
    let kind = ToolKind::from_name(name).ok_or_else(|| AugurError::ToolNotFound(name.to_string()))?;
    Ok(match ToolCall::from_json(kind, input) {
        Ok(call) => call.execute(),
        Err(e) => error_value(&e),
    })
}
