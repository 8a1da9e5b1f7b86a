//! Turns the metadata API's assorted listing shapes into one ordered sequence.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Where a listing may sit inside a payload. Rules are tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeRule {
    /// The payload itself is the array.
    BareArray,
    /// `payload[name]` is the array.
    Field(&'static str),
    /// `payload[outer][inner]` is the array.
    Nested(&'static str, &'static str),
}

pub const HOT_MANGA_SHAPES: &[ShapeRule] = &[
    ShapeRule::BareArray,
    ShapeRule::Field("chapters"),
    ShapeRule::Field("manga"),
    ShapeRule::Field("data"),
];

/// Trending buckets are preferred from the widest time window down.
pub const TRENDING_SHAPES: &[ShapeRule] = &[
    ShapeRule::BareArray,
    ShapeRule::Field("180"),
    ShapeRule::Field("90"),
    ShapeRule::Field("30"),
    ShapeRule::Field("7"),
    ShapeRule::Field("manga"),
    ShapeRule::Field("data"),
    ShapeRule::Nested("trending", "180"),
    ShapeRule::Nested("trending", "90"),
    ShapeRule::Nested("trending", "30"),
    ShapeRule::Nested("trending", "7"),
];

pub const CHAPTER_SHAPES: &[ShapeRule] = &[
    ShapeRule::BareArray,
    ShapeRule::Field("chapters"),
    ShapeRule::Field("data"),
];

pub const SEARCH_SHAPES: &[ShapeRule] = &[
    ShapeRule::BareArray,
    ShapeRule::Field("data"),
    ShapeRule::Field("manga"),
];

pub const IMAGE_SHAPES: &[ShapeRule] = &[
    ShapeRule::BareArray,
    ShapeRule::Field("images"),
    ShapeRule::Field("data"),
];

impl ShapeRule {
    fn take(&self, payload: &mut Value) -> Option<Vec<Value>> {
        let target = match self {
            ShapeRule::BareArray => Some(payload),
            ShapeRule::Field(name) => payload.get_mut(*name),
            ShapeRule::Nested(outer, inner) => payload
                .get_mut(*outer)
                .and_then(|value| value.get_mut(*inner)),
        };

        match target {
            Some(Value::Array(items)) => Some(std::mem::take(items)),
            _ => None,
        }
    }
}

/// Applies `rules` in order; the first one that finds an array wins.
///
/// A payload no rule recognises is treated as a single element when it is an
/// object, and as nothing otherwise.
pub fn normalize(mut payload: Value, rules: &[ShapeRule]) -> Vec<Value> {
    for rule in rules {
        if let Some(items) = rule.take(&mut payload) {
            return items;
        }
    }

    match payload {
        Value::Object(map) if !map.is_empty() => {
            tracing::debug!("Unrecognised listing shape, treating payload as one element");
            vec![Value::Object(map)]
        }
        _ => Vec::new(),
    }
}

/// Decodes each element, skipping the ones that do not fit `T`.
pub fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                tracing::warn!(index, err.msg = %error, "Skipping malformed listing entry");
                None
            }
        })
        .collect()
}

pub fn normalize_into<T: DeserializeOwned>(
    payload: Value,
    rules: &[ShapeRule],
    limit: usize,
) -> Vec<T> {
    let mut items = decode_items(normalize(payload, rules));
    items.truncate(limit);
    items
}
