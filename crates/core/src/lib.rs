pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{Config, DisplayConfig, UtcOffsetSetting};
pub use error::{Error, EventError, Result};
pub use events::{InboundEvent, RawAttachment};
