//! Core helpers shared by every freecoding crate: tracing setup,
//! language codes and message timestamps.

pub mod language;
pub mod time;
pub mod tracing;

pub use language::{DEFAULT_LANGUAGE, Language};
pub use time::{TIMESTAMP_FORMAT, format_timestamp, local_timestamp};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
