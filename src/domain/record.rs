use super::level::Level;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// A structured message object attached to a record.
///
/// Implemented by the host for whatever it logs as a message payload. The
/// builder decides per concrete type whether the payload needs structural
/// JSON rendering or has a meaningful string form of its own.
pub trait StructuredMessage: fmt::Debug + Send + Sync + 'static {
    /// Structural JSON form of the payload.
    fn to_json(&self) -> serde_json::Result<Value>;

    /// `true` when values of this type have no meaningful string form and must
    /// be rendered as JSON. Must not depend on the value itself.
    fn requires_json(&self) -> bool {
        true
    }

    /// String form used when `requires_json` is `false`.
    fn render(&self) -> String {
        format!("{self:?}")
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

/// Wraps any `Serialize` value as a payload rendered through JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPayload<T>(pub T);

impl<T> StructuredMessage for JsonPayload<T>
where
    T: Serialize + fmt::Debug + Send + Sync + 'static,
{
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.0)
    }
}

/// Wraps a `Serialize + Display` value: rendered with `Display`, but still
/// serialized structurally into `serializedMessage`.
#[derive(Debug, Clone, PartialEq)]
pub struct Displayable<T>(pub T);

impl<T> StructuredMessage for Displayable<T>
where
    T: Serialize + fmt::Display + fmt::Debug + Send + Sync + 'static,
{
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(&self.0)
    }

    fn requires_json(&self) -> bool {
        false
    }

    fn render(&self) -> String {
        self.0.to_string()
    }
}

/// The message object of a record.
#[derive(Debug, Clone)]
pub enum MessagePayload {
    Text(String),
    Error(RecordedError),
    Structured(Arc<dyn StructuredMessage>),
}

impl MessagePayload {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePayload::Text(text.into())
    }

    pub fn structured<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        MessagePayload::Structured(Arc::new(JsonPayload(value)))
    }

    pub fn displayable<T>(value: T) -> Self
    where
        T: Serialize + fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        MessagePayload::Structured(Arc::new(Displayable(value)))
    }
}

/// A shared handle to an error attached to a record.
///
/// Captures the concrete type name at construction, since `dyn Error` does
/// not expose one. Clones share identity with the original.
#[derive(Clone)]
pub struct RecordedError {
    inner: Arc<dyn Error + Send + Sync + 'static>,
    type_name: Cow<'static, str>,
    stack_trace: Option<String>,
}

impl RecordedError {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
            type_name: Cow::Borrowed(std::any::type_name::<E>()),
            stack_trace: None,
        }
    }

    /// Wraps an error whose type name is known by the host rather than by Rust
    /// (for example an error decoded from another process).
    pub fn named<E>(error: E, type_name: impl Into<Cow<'static, str>>) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
            type_name: type_name.into(),
            stack_trace: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    /// Identity comparison: `true` only for clones of the same recorded error.
    pub fn is_same(&self, other: &RecordedError) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedError")
            .field("type_name", &self.type_name)
            .field("message", &self.inner.to_string())
            .field("has_stack_trace", &self.stack_trace.is_some())
            .finish()
    }
}

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for RecordedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

/// Source location of the logging call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationInfo {
    pub class_name: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<String>,
    pub method_name: Option<String>,
    pub full_info: Option<String>,
}

impl LocationInfo {
    /// `full_info` if given, otherwise `class.method(file:line)` from whatever
    /// parts are known.
    pub fn full_info(&self) -> Option<String> {
        if let Some(full_info) = &self.full_info {
            return Some(full_info.clone());
        }
        if self.class_name.is_none() && self.method_name.is_none() && self.file_name.is_none() {
            return None;
        }
        let class = self.class_name.as_deref().unwrap_or("?");
        let method = self.method_name.as_deref().unwrap_or("?");
        let file = self.file_name.as_deref().unwrap_or("?");
        let line = self.line_number.as_deref().unwrap_or("?");
        Some(format!("{class}.{method}({file}:{line})"))
    }
}

/// One log record as handed over by the host integration.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub rendered_message: Option<String>,
    pub payload: Option<MessagePayload>,
    pub exception: Option<RecordedError>,
    pub logger_name: Option<String>,
    pub domain: Option<String>,
    pub identity: Option<String>,
    pub thread_name: Option<String>,
    pub user_name: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
    pub level: Option<Level>,
    pub location: Option<LocationInfo>,
    pub fix: Option<String>,
    pub properties: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            rendered_message: None,
            payload: None,
            exception: None,
            logger_name: None,
            domain: None,
            identity: None,
            thread_name: None,
            user_name: None,
            timestamp,
            level: None,
            location: None,
            fix: None,
            properties: BTreeMap::new(),
        }
    }

    /// Sets both the rendered message and a plain text payload.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.payload = Some(MessagePayload::Text(message.clone()));
        self.rendered_message = Some(message);
        self
    }

    pub fn with_rendered_message(mut self, message: impl Into<String>) -> Self {
        self.rendered_message = Some(message.into());
        self
    }

    pub fn with_payload(mut self, payload: MessagePayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_exception(mut self, exception: RecordedError) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_logger_name(mut self, logger_name: impl Into<String>) -> Self {
        self.logger_name = Some(logger_name.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = Some(thread_name.into());
        self
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_location(mut self, location: LocationInfo) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}
