//! Field-name sanitization for the index's nested-field separator.
//!
//! The index treats `.` in a field name as a path into nested objects, so a
//! key such as `http.status` collides with a real `http` object. Keys holding
//! the separator are rewritten (`http_status`), and a rewrite that lands on a
//! name already used by the object gets a numeric suffix so no entry is lost.

pub mod encoder;

pub use encoder::{EncodeError, SanitizingEncoder};

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;

pub const SEPARATOR: char = '.';
pub const REPLACEMENT: char = '_';

/// Rewrites object keys that contain a reserved separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySanitizer {
    separator: char,
    replacement: char,
}

impl KeySanitizer {
    pub const fn new(separator: char, replacement: char) -> Self {
        Self {
            separator,
            replacement,
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn replacement(&self) -> char {
        self.replacement
    }

    /// Replaces every separator in `key`. Borrows when there is nothing to do.
    pub fn replace_separator<'a>(&self, key: &'a str) -> Cow<'a, str> {
        if key.contains(self.separator) {
            Cow::Owned(key.replace(self.separator, &self.replacement.to_string()))
        } else {
            Cow::Borrowed(key)
        }
    }

    /// Sanitizes an object, depth first.
    ///
    /// A renamed key that already exists among the *original* keys, or among
    /// the keys emitted so far, receives `_0`, `_1`, ... (smallest free suffix).
    /// Arrays are left as they are.
    pub fn sanitize_object(&self, source: Map<String, Value>) -> Map<String, Value> {
        self.sanitize_map(source, Reach::Objects)
    }

    /// Objects are sanitized; arrays and scalars pass through unchanged.
    pub fn sanitize_value(&self, value: Value) -> Value {
        self.sanitize(value, Reach::Objects)
    }

    /// Like `sanitize_value`, but also descends into arrays so that no key
    /// anywhere in the tree holds the separator. Used for everything written
    /// to the wire.
    pub fn sanitize_all(&self, value: Value) -> Value {
        self.sanitize(value, Reach::Everywhere)
    }

    /// `true` if no key at any depth holds the separator.
    pub fn is_sanitized(&self, value: &Value) -> bool {
        match value {
            Value::Object(map) => map
                .iter()
                .all(|(key, value)| !key.contains(self.separator) && self.is_sanitized(value)),
            Value::Array(items) => items.iter().all(|item| self.is_sanitized(item)),
            _ => true,
        }
    }

    fn sanitize(&self, value: Value, reach: Reach) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.sanitize_map(map, reach)),
            Value::Array(items) if reach == Reach::Everywhere => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.sanitize(item, reach))
                    .collect(),
            ),
            other => other,
        }
    }

    fn sanitize_map(&self, source: Map<String, Value>, reach: Reach) -> Map<String, Value> {
        let mut emitted: HashSet<String> = HashSet::with_capacity(source.len());
        let mut keys = Vec::with_capacity(source.len());

        for key in source.keys() {
            let key = if key.contains(self.separator) {
                self.resolve_collision(&self.replace_separator(key), &source, &emitted)
            } else {
                key.clone()
            };
            emitted.insert(key.clone());
            keys.push(key);
        }

        // serde_json::Map iterates in a stable order, so keys line up with values.
        let mut result = Map::with_capacity(source.len());
        for (key, (_, value)) in keys.into_iter().zip(source) {
            result.insert(key, self.sanitize(value, reach));
        }
        result
    }

    fn resolve_collision(
        &self,
        replaced: &str,
        source: &Map<String, Value>,
        emitted: &HashSet<String>,
    ) -> String {
        let mut candidate = replaced.to_string();
        let mut suffix = 0_usize;
        while source.contains_key(&candidate) || emitted.contains(&candidate) {
            candidate = format!("{replaced}{}{suffix}", self.replacement);
            suffix += 1;
        }
        candidate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    Objects,
    Everywhere,
}

impl Default for KeySanitizer {
    fn default() -> Self {
        Self::new(SEPARATOR, REPLACEMENT)
    }
}

/// `.` -> `_` with the default sanitizer.
pub fn replace_dots(key: &str) -> Cow<'_, str> {
    KeySanitizer::default().replace_separator(key)
}

pub fn sanitize_object(source: Map<String, Value>) -> Map<String, Value> {
    KeySanitizer::default().sanitize_object(source)
}

pub fn sanitize_value(value: Value) -> Value {
    KeySanitizer::default().sanitize_value(value)
}
