//! Immutable, structurally shared JSON-like values.
//!
//! Maps and lists live behind `Arc`s. Updating a nested location copies
//! only the maps along the path to it; every untouched subtree is shared
//! between the old value and the new one, and the old value never changes.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

/// A node of the local state tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Arc<Vec<Value>>),
    Map(Arc<BTreeMap<String, Value>>),
}

impl Value {
    /// An empty map.
    pub fn empty_map() -> Self {
        Value::Map(Arc::new(BTreeMap::new()))
    }

    /// Deep-converts a JSON value.
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.clone()),
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::List(Arc::new(items.iter().map(Value::from_json).collect())),
            Json::Object(map) => Value::Map(Arc::new(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            )),
        }
    }

    /// Deep-converts back into JSON.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => Json::Number(n.clone()),
            Value::Text(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Looks up a direct child by key (or list index).
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Looks up a nested location.
    pub fn get_in<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |node, segment| node.get(segment.as_ref()))
    }

    /// Returns a copy with `value` stored at `path`.
    ///
    /// Missing intermediates are created as maps and scalar intermediates
    /// are replaced by maps. A list grows when the key is the next index;
    /// any other key converts it into a map keyed by index, keeping its
    /// elements. The empty path replaces the whole value.
    pub fn set_in<S: AsRef<str>>(&self, path: &[S], value: Value) -> Value {
        let Some((head, rest)) = path.split_first() else {
            return value;
        };
        let head = head.as_ref();

        match self {
            Value::Map(map) => {
                let child = map.get(head).cloned().unwrap_or_default().set_in(rest, value);
                let mut map = map.clone();
                Arc::make_mut(&mut map).insert(head.to_string(), child);
                Value::Map(map)
            }
            Value::List(items) => match head.parse::<usize>() {
                Ok(i) if i < items.len() => {
                    let child = items[i].set_in(rest, value);
                    let mut items = items.clone();
                    Arc::make_mut(&mut items)[i] = child;
                    Value::List(items)
                }
                Ok(i) if i == items.len() => {
                    let child = Value::Null.set_in(rest, value);
                    let mut items = items.clone();
                    Arc::make_mut(&mut items).push(child);
                    Value::List(items)
                }
                // Any other key turns the list into a map keyed by index
                _ => {
                    let map: BTreeMap<String, Value> = items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| (i.to_string(), item.clone()))
                        .collect();
                    Value::Map(Arc::new(map)).set_in(path, value)
                }
            },
            _ => {
                let child = Value::Null.set_in(rest, value);
                Value::Map(Arc::new(BTreeMap::from([(head.to_string(), child)])))
            }
        }
    }

    /// Returns a copy with the location at `path` removed.
    ///
    /// Only the addressed key goes; siblings and now-empty parents stay.
    /// Removing through a missing or scalar intermediate changes nothing.
    pub fn delete_in<S: AsRef<str>>(&self, path: &[S]) -> Value {
        let Some((head, rest)) = path.split_first() else {
            return Value::Null;
        };
        let head = head.as_ref();

        match self {
            Value::Map(map) if map.contains_key(head) => {
                let mut map = map.clone();
                let entries = Arc::make_mut(&mut map);
                if rest.is_empty() {
                    entries.remove(head);
                } else if let Some(child) = entries.get_mut(head) {
                    *child = child.delete_in(rest);
                }
                Value::Map(map)
            }
            Value::List(items) => match head.parse::<usize>() {
                Ok(i) if i < items.len() => {
                    let mut items = items.clone();
                    let entries = Arc::make_mut(&mut items);
                    if rest.is_empty() {
                        entries.remove(i);
                    } else {
                        entries[i] = entries[i].delete_in(rest);
                    }
                    Value::List(items)
                }
                _ => self.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Whether both values share the same allocation (or are equal scalars).
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            _ => self == other,
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::from_json(&json)
    }
}

impl From<&Value> for Json {
    fn from(value: &Value) -> Self {
        value.to_json()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items.iter()),
            Value::Map(map) => serializer.collect_map(map.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Json::deserialize(deserializer).map(Value::from)
    }
}
