//! Domain layer for rask-log-shipper.
//!
//! Contains the canonical types shared across all modules:
//! - `RawRecord`: the inbound log record handed over by the host
//! - `LogDocument`: the normalized document sent to the index
//! - `ExceptionProjection`: the serialization-safe view of an error chain
//! - `Level`: record severity

pub mod document;
pub mod exception;
pub mod level;
pub mod record;

pub use document::LogDocument;
pub use exception::ExceptionProjection;
pub use level::Level;
pub use record::{
    Displayable, JsonPayload, LocationInfo, MessagePayload, RawRecord, RecordedError,
    StructuredMessage,
};
