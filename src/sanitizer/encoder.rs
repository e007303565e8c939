use super::KeySanitizer;
use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON encoder that runs every object key through a `KeySanitizer` before it
/// is written.
///
/// Stateless and `Copy`: share one instance or create one per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizingEncoder {
    sanitizer: KeySanitizer,
}

impl SanitizingEncoder {
    pub const fn new(sanitizer: KeySanitizer) -> Self {
        Self { sanitizer }
    }

    pub fn sanitizer(&self) -> &KeySanitizer {
        &self.sanitizer
    }

    /// Serializes `value` into a sanitized JSON tree.
    pub fn to_value<T>(&self, value: &T) -> Result<Value, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        Ok(self.sanitizer.sanitize_all(value))
    }

    /// Compact sanitized JSON.
    pub fn encode<T>(&self, value: &T) -> Result<String, EncodeError>
    where
        T: Serialize + ?Sized,
    {
        let value = self.to_value(value)?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn encode_to_writer<T, W>(&self, writer: &mut W, value: &T) -> Result<(), EncodeError>
    where
        T: Serialize + ?Sized,
        W: Write,
    {
        let value = self.to_value(value)?;
        serde_json::to_writer(&mut *writer, &value)?;
        Ok(())
    }

    /// Sanitizes and encodes an already-built JSON tree.
    pub fn encode_value(&self, value: Value) -> Result<String, EncodeError> {
        let value = self.sanitizer.sanitize_all(value);
        Ok(serde_json::to_string(&value)?)
    }
}
