use crate::error::{PivotError, Result};
use crate::surface::Handler;
use indexmap::IndexMap;
use smartstring::alias::String as SmartString;
use std::fmt;

/// Prefix marking a prop key as an event listener (`@click`)
pub const LISTENER_PREFIX: char = '@';

/// Prop key registering the element under a named slot
pub const REF_KEY: &str = "ref";

/// Classified prop key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropKey {
    /// Plain live attribute
    Attr(SmartString),
    /// Event listener, stored without the prefix
    Listener(SmartString),
    /// Slot registration; never becomes a live attribute
    Ref,
}

impl PropKey {
    pub fn parse(key: &str) -> Self {
        if let Some(event) = key.strip_prefix(LISTENER_PREFIX) {
            PropKey::Listener(event.into())
        } else if key == REF_KEY {
            PropKey::Ref
        } else {
            PropKey::Attr(key.into())
        }
    }

    pub fn is_listener(&self) -> bool {
        matches!(self, PropKey::Listener(_))
    }
}

impl fmt::Display for PropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropKey::Attr(name) => f.write_str(name),
            PropKey::Listener(event) => write!(f, "{}{}", LISTENER_PREFIX, event),
            PropKey::Ref => f.write_str(REF_KEY),
        }
    }
}

impl From<&str> for PropKey {
    fn from(key: &str) -> Self {
        PropKey::parse(key)
    }
}

/// Prop value. Equality is strict: scalars compare by value, handlers by identity.
/// A `NaN` float never equals itself, so it is rewritten on every diff.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Text(SmartString),
    Int(i64),
    Float(f64),
    Bool(bool),
    Listener(Handler),
}

impl PropValue {
    /// String form written to the live attribute
    pub fn to_attr_value(&self, key: &PropKey) -> Result<String> {
        match self {
            PropValue::Text(s) => Ok(s.to_string()),
            PropValue::Int(i) => Ok(i.to_string()),
            PropValue::Float(f) => Ok(f.to_string()),
            PropValue::Bool(b) => Ok(b.to_string()),
            PropValue::Listener(_) => Err(PivotError::InvalidProp {
                key: key.to_string().into(),
                reason: "handler used as an attribute value",
            }),
        }
    }

    pub fn as_handler(&self, key: &PropKey) -> Result<&Handler> {
        match self {
            PropValue::Listener(handler) => Ok(handler),
            _ => Err(PivotError::InvalidProp {
                key: key.to_string().into(),
                reason: "listener keys require a handler",
            }),
        }
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Text(s.into())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Text(s.into())
    }
}

impl From<SmartString> for PropValue {
    fn from(s: SmartString) -> Self {
        PropValue::Text(s)
    }
}

impl From<i64> for PropValue {
    fn from(i: i64) -> Self {
        PropValue::Int(i)
    }
}

impl From<i32> for PropValue {
    fn from(i: i32) -> Self {
        PropValue::Int(i as i64)
    }
}

impl From<f64> for PropValue {
    fn from(f: f64) -> Self {
        PropValue::Float(f)
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<Handler> for PropValue {
    fn from(h: Handler) -> Self {
        PropValue::Listener(h)
    }
}

/// Ordered attribute / listener / slot map of a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    entries: IndexMap<PropKey, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert using the string key convention (`@event`, `ref`, attribute)
    pub fn with(mut self, key: &str, value: impl Into<PropValue>) -> Self {
        self.insert(PropKey::parse(key), value.into());
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.insert(PropKey::Attr(name.into()), value.into());
        self
    }

    pub fn on(mut self, event: &str, handler: Handler) -> Self {
        self.insert(PropKey::Listener(event.into()), PropValue::Listener(handler));
        self
    }

    pub fn slot(mut self, name: &str) -> Self {
        self.insert(PropKey::Ref, PropValue::Text(name.into()));
        self
    }

    pub fn insert(&mut self, key: PropKey, value: PropValue) -> Option<PropValue> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &PropKey) -> Option<&PropValue> {
        self.entries.get(key)
    }

    /// Lookup using the string key convention
    pub fn get_str(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(&PropKey::parse(key))
    }

    pub fn contains(&self, key: &PropKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Slot name registered through the `ref` key
    pub fn slot_name(&self) -> Option<&str> {
        match self.entries.get(&PropKey::Ref) {
            Some(PropValue::Text(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropKey, &PropValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<PropKey>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
