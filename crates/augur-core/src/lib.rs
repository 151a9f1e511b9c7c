pub mod config;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{AugurError, Result};
pub use event::EventSink;
pub use types::*;
