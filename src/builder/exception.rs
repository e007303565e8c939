use crate::domain::{ExceptionProjection, RecordedError};
use std::collections::HashSet;
use std::error::Error;

/// Longest source chain followed before the projection is cut.
pub const MAX_CHAIN_DEPTH: usize = 32;

/// Projects a recorded error and its `source()` chain into a plain tree.
pub fn project(error: &RecordedError) -> ExceptionProjection {
    project_chain(error, MAX_CHAIN_DEPTH)
}

/// Projects an arbitrary error chain, following at most `max_depth` links.
///
/// Links that are themselves `RecordedError`s contribute their type name and
/// stack trace. A link already visited (a cyclic `source()` implementation)
/// ends the chain and marks the last projection as truncated.
pub fn project_chain(error: &(dyn Error + 'static), max_depth: usize) -> ExceptionProjection {
    let mut visited = HashSet::new();
    let mut links: Vec<&(dyn Error + 'static)> = Vec::new();
    let mut truncated = false;
    let mut current = Some(error);

    while let Some(link) = current {
        if links.len() >= max_depth.max(1) || !visited.insert(address_of(link)) {
            truncated = true;
            break;
        }
        // A recorded error reports its inner error's sources, so the inner
        // error counts as visited too.
        if let Some(recorded) = link.downcast_ref::<RecordedError>() {
            let inner: &(dyn Error + 'static) = recorded.error();
            visited.insert(address_of(inner));
        }
        links.push(link);
        current = link.source();
    }

    let mut projection: Option<ExceptionProjection> = None;
    for (index, link) in links.iter().enumerate().rev() {
        let mut node = project_link(*link);
        node.truncated = truncated && index + 1 == links.len();
        node.inner_exception = projection.take().map(Box::new);
        projection = Some(node);
    }

    // links is never empty: the first link always passes the checks above.
    projection.unwrap_or_else(|| project_link(error))
}

fn project_link(link: &(dyn Error + 'static)) -> ExceptionProjection {
    match link.downcast_ref::<RecordedError>() {
        Some(recorded) => ExceptionProjection {
            class_name: Some(recorded.type_name().to_string()),
            message: recorded.error().to_string(),
            stack_trace: recorded.stack_trace().map(str::to_string),
            inner_exception: None,
            truncated: false,
        },
        None => ExceptionProjection {
            class_name: None,
            message: link.to_string(),
            stack_trace: None,
            inner_exception: None,
            truncated: false,
        },
    }
}

fn address_of(link: &(dyn Error + 'static)) -> usize {
    link as *const dyn Error as *const () as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset")]
    struct ConnectionReset;

    #[derive(Debug, thiserror::Error)]
    #[error("query failed")]
    struct QueryFailed {
        #[source]
        source: ConnectionReset,
    }

    #[derive(Debug)]
    struct SelfReferential;

    impl fmt::Display for SelfReferential {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("loops forever")
        }
    }

    impl Error for SelfReferential {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(self)
        }
    }

    #[test]
    fn test_projection_follows_source_chain() {
        let error = RecordedError::new(QueryFailed {
            source: ConnectionReset,
        })
        .with_stack_trace("at db::query");

        let projection = project(&error);

        assert!(projection.class_name.as_deref().unwrap().ends_with("QueryFailed"));
        assert_eq!(projection.message, "query failed");
        assert_eq!(projection.stack_trace.as_deref(), Some("at db::query"));
        assert!(!projection.truncated);

        let inner = projection.inner_exception.as_deref().unwrap();
        assert_eq!(inner.message, "connection reset");
        assert!(inner.class_name.is_none());
        assert!(inner.inner_exception.is_none());
        assert_eq!(projection.depth(), 2);
    }

    #[test]
    fn test_cyclic_chain_terminates() {
        let projection = project(&RecordedError::new(SelfReferential));

        assert_eq!(projection.message, "loops forever");
        assert_eq!(projection.depth(), 1);
        assert!(projection.truncated);
        assert!(projection.inner_exception.is_none());
    }

    #[test]
    fn test_unwrapped_cyclic_chain_terminates() {
        let projection = project_chain(&SelfReferential, MAX_CHAIN_DEPTH);

        assert_eq!(projection.depth(), 1);
        assert!(projection.truncated);
    }

    #[test]
    fn test_depth_limit_cuts_chain() {
        let error = QueryFailed {
            source: ConnectionReset,
        };
        let projection = project_chain(&error, 1);

        assert_eq!(projection.depth(), 1);
        assert!(projection.truncated);
    }

    #[test]
    fn test_projection_serializes_camel_case() {
        let projection = project(&RecordedError::named(ConnectionReset, "System.IO.IOException"));
        let value = serde_json::to_value(&projection).unwrap();

        assert_eq!(value["className"], "System.IO.IOException");
        assert_eq!(value["message"], "connection reset");
        assert!(value.get("innerException").is_none());
        assert!(value.get("truncated").is_none());
    }
}
