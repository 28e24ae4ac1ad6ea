//! Canonical field resolution for backend payloads
//!
//! The backend returns the same logical field as `id_caso`, `IdCaso` or
//! `idCaso` depending on the endpoint. Every mapping function looks fields up
//! through [`Resolver`] using the canonical snake_case name; the resolver
//! tries the exact key first and then any key that folds to the same name
//! (case-insensitive, underscores ignored).

mod decode;
mod encode;

pub use decode::{case_from_raw, category_from_raw, evidence_from_raw, record_from_raw};
pub use encode::{case_to_row, case_to_wire, closure_to_wire, record_to_wire};

use serde_json::{Map, Value};

/// Fold a key so that snake_case, PascalCase and camelCase spellings compare equal
pub fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Read-only view over one raw backend object
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    object: Option<&'a Map<String, Value>>,
}

impl<'a> Resolver<'a> {
    /// Wrap a raw value. Non-objects resolve every key to `None`.
    pub fn new(raw: &'a Value) -> Self {
        Resolver {
            object: raw.as_object(),
        }
    }

    /// Look up a field by canonical name, skipping nulls
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        let object = self.object?;
        if let Some(value) = object.get(key).filter(|v| !v.is_null()) {
            return Some(value);
        }
        let folded = fold_key(key);
        object
            .iter()
            .find(|(k, v)| !v.is_null() && fold_key(k) == folded)
            .map(|(_, v)| v)
    }

    /// First of several canonical names that resolves
    pub fn first(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// Unsigned integer, accepting numeric strings
    pub fn u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(as_u64)
    }

    /// Signed integer, accepting numeric strings
    pub fn i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Text value; numbers are rendered, other types are ignored
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Text value that is not blank
    pub fn non_empty_text(&self, key: &str) -> Option<String> {
        self.text(key).filter(|s| !s.trim().is_empty())
    }

    /// First non-blank text among several canonical names
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.non_empty_text(key))
    }

    /// Rebuild an object containing only `keys`, spelled canonically
    pub fn canonical(&self, keys: &[&str]) -> Value {
        let mut out = Map::new();
        for key in keys {
            if let Some(value) = self.get(key) {
                out.insert((*key).to_string(), value.clone());
            }
        }
        Value::Object(out)
    }
}

/// `id_caso` -> `IdCaso`
#[cfg(test)]
pub(crate) fn to_pascal(snake: &str) -> String {
    snake
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// `id_caso` -> `idCaso`
#[cfg(test)]
pub(crate) fn to_camel(snake: &str) -> String {
    let pascal = to_pascal(snake);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
