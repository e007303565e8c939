use crate::domain::{MessagePayload, StructuredMessage};
use crate::sanitizer::SanitizingEncoder;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Rendered form of an absent payload.
pub const NULL_TEXT: &str = "null";

// Per-type memo of StructuredMessage::requires_json. Only a shortcut: the
// answer is a property of the type, so a cold cache yields the same output.
static REQUIRES_JSON: LazyLock<RwLock<HashMap<TypeId, bool>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Renders a message payload to text.
///
/// Structured payloads without a meaningful string form are rendered as
/// sanitized JSON; everything else uses its own string form.
pub fn render_message(payload: Option<&MessagePayload>, encoder: &SanitizingEncoder) -> String {
    match payload {
        None => NULL_TEXT.to_string(),
        Some(MessagePayload::Text(text)) => text.clone(),
        Some(MessagePayload::Error(error)) => error.to_string(),
        Some(MessagePayload::Structured(message)) => {
            if requires_json(message.as_ref()) {
                message
                    .to_json()
                    .map_err(Into::into)
                    .and_then(|value| encoder.encode_value(value))
                    .unwrap_or_else(|e| {
                        tracing::debug!("Failed to render structured message as JSON: {}", e);
                        NULL_TEXT.to_string()
                    })
            } else {
                message.render()
            }
        }
    }
}

fn requires_json(message: &dyn StructuredMessage) -> bool {
    let key = message.payload_type();
    if let Some(decision) = REQUIRES_JSON.read().get(&key) {
        return *decision;
    }
    let decision = message.requires_json();
    REQUIRES_JSON.write().insert(key, decision);
    decision
}

#[cfg(test)]
pub(crate) fn cached_decision(message: &dyn StructuredMessage) -> Option<bool> {
    REQUIRES_JSON.read().get(&message.payload_type()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JsonPayload, RecordedError};
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct Checkout {
        cart_id: u32,
        #[serde(rename = "total.eur")]
        total_eur: u32,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("payment declined")]
    struct Declined;

    #[test]
    fn test_render_absent_and_text() {
        let encoder = SanitizingEncoder::default();
        assert_eq!(render_message(None, &encoder), "null");
        assert_eq!(
            render_message(Some(&MessagePayload::text("hello")), &encoder),
            "hello"
        );
    }

    #[test]
    fn test_render_structured_as_sanitized_json() {
        let encoder = SanitizingEncoder::default();
        let payload = MessagePayload::structured(Checkout {
            cart_id: 3,
            total_eur: 12,
        });

        assert_eq!(
            render_message(Some(&payload), &encoder),
            r#"{"cart_id":3,"total_eur":12}"#
        );
    }

    #[test]
    fn test_render_displayable_uses_display() {
        let encoder = SanitizingEncoder::default();
        let payload = MessagePayload::displayable("order 17 shipped".to_string());
        assert_eq!(render_message(Some(&payload), &encoder), "order 17 shipped");
    }

    #[test]
    fn test_render_error_uses_display() {
        let encoder = SanitizingEncoder::default();
        let payload = MessagePayload::Error(RecordedError::new(Declined));
        assert_eq!(render_message(Some(&payload), &encoder), "payment declined");
    }

    #[test]
    fn test_classification_is_memoised_per_type() {
        let encoder = SanitizingEncoder::default();
        let payload = JsonPayload(vec![1_u8, 2, 3]);

        render_message(
            Some(&MessagePayload::Structured(std::sync::Arc::new(payload.clone()))),
            &encoder,
        );
        assert_eq!(cached_decision(&payload), Some(true));
    }
}
