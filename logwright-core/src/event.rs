use crate::level::Level;
use crate::processor::builtin::SpanContext;
use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// A structured field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Approximate in-memory footprint, used by queue byte budgets.
    pub fn estimated_size(&self) -> usize {
        let base = std::mem::size_of::<FieldValue>();
        match self {
            FieldValue::Str(s) => base + s.len(),
            FieldValue::List(items) => base + items.iter().map(|v| v.estimated_size()).sum::<usize>(),
            FieldValue::Map(fields) => base + fields.estimated_size(),
            _ => base,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Str(s) => f.write_str(s),
            // Nested values render as compact JSON so they stay on one line.
            other => match serde_json::to_string(other) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str("<unrenderable>"),
            },
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Int(i) => serializer.serialize_i64(*i),
            FieldValue::Float(x) => serializer.serialize_f64(*x),
            FieldValue::Str(s) => serializer.serialize_str(s),
            FieldValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            FieldValue::Map(fields) => fields.serialize(serializer),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => FieldValue::Int(i),
            Err(_) => FieldValue::Str(v.to_string()),
        }
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        FieldValue::from(v as u64)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<Fields> for FieldValue {
    fn from(v: Fields) -> Self {
        FieldValue::Map(v)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        FieldValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

// ----------------------------------------------------------------------------
// Fields
// ----------------------------------------------------------------------------

/// Insertion-ordered field map.
///
/// Renderers iterate in insertion order so output is deterministic. Inserting an
/// existing key replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &FieldValue) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldValue)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn estimated_size(&self) -> usize {
        self.entries
            .iter()
            .map(|(k, v)| k.len() + v.estimated_size())
            .sum()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl<K: Into<String>, V: Into<FieldValue>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Build a [`Fields`] map from `key => value` pairs.
///
/// ```
/// use logwright_core::fields;
///
/// let f = fields! { "user_id" => 42, "ok" => true };
/// assert_eq!(f.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::event::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::event::Fields::new();
        $( fields.insert($key, $value); )+
        fields
    }};
}

// ----------------------------------------------------------------------------
// Event
// ----------------------------------------------------------------------------

/// A single log event as it travels through the processor chain.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub logger_name: String,
    pub level: Level,
    pub message: String,
    pub fields: Fields,
    pub timestamp: DateTime<Utc>,
    /// Span active on the emitting thread, captured before the event can
    /// cross to the queue worker.
    pub span: Option<SpanContext>,
}

impl LogEvent {
    pub fn new(
        logger_name: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        fields: Fields,
    ) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            fields,
            timestamp: Utc::now(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Option<SpanContext>) -> Self {
        self.span = span;
        self
    }

    pub fn estimated_size(&self) -> usize {
        std::mem::size_of::<LogEvent>()
            + self.logger_name.len()
            + self.message.len()
            + self.fields.estimated_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_replaces_in_place() {
        let mut f = fields! { "a" => 1, "b" => 2 };
        f.insert("a", "x");
        let keys: Vec<_> = f.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(f.get("a"), Some(&FieldValue::Str("x".into())));
    }

    #[test]
    fn serializes_nested_values_in_order() {
        let f = fields! {
            "z" => 1,
            "nested" => fields! { "inner" => true },
            "list" => vec![1, 2],
            "missing" => Option::<i32>::None,
        };
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(
            json,
            r#"{"z":1,"nested":{"inner":true},"list":[1,2],"missing":null}"#
        );
    }

    #[test]
    fn large_u64_degrades_to_string() {
        assert_eq!(FieldValue::from(u64::MAX), FieldValue::Str(u64::MAX.to_string()));
        assert_eq!(FieldValue::from(7u64), FieldValue::Int(7));
    }
}
