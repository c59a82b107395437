use serde::{Deserialize, Serialize};

/// Single `key=value` label pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValue {
    key: String,
    value: String,
}

impl KeyValue {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl<K, V> From<(K, V)> for KeyValue
where
    K: Into<String>,
    V: Into<String>,
{
    fn from((k, v): (K, V)) -> Self {
        KeyValue::new(k, v)
    }
}
