use serde::Serialize;

/// Serialization-safe projection of an error and its source chain.
///
/// Built by `builder::exception::project`; never holds a reference to the
/// original error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionProjection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_exception: Option<Box<ExceptionProjection>>,
    /// Set when the source chain was cut short (depth limit or a cycle).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl ExceptionProjection {
    /// Number of projections in the chain, this one included.
    pub fn depth(&self) -> usize {
        1 + self.inner_exception.as_ref().map_or(0, |inner| inner.depth())
    }
}
