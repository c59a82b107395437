use std::fmt;

use crate::{KeyValue, Labels};

/// One conjunct of a [`LabelSelector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `key=value`
    Equals(KeyValue),
    /// `key` (label present with any value)
    Exists(String),
}

impl Clause {
    pub fn matches(&self, labels: Option<&Labels>) -> bool {
        match self {
            Clause::Equals(kv) => labels
                .and_then(|l| l.get(kv.key()))
                .is_some_and(|v| v == kv.value()),
            Clause::Exists(key) => labels.is_some_and(|l| l.contains_key(key)),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Equals(kv) => write!(f, "{}={}", kv.key(), kv.value()),
            Clause::Exists(key) => f.write_str(key),
        }
    }
}

/// Conjunctive label selector.
///
/// Rendered as clauses joined with `,` (logical AND). There is no OR.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector(Vec<Clause>);

impl LabelSelector {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a clause.
    pub fn and(mut self, clause: Clause) -> Self {
        self.0.push(clause);
        self
    }

    /// Selector equal to a Job's `matchLabels`, in key order.
    pub fn from_labels(labels: &Labels) -> Self {
        Self(
            labels
                .iter()
                .map(|(k, v)| Clause::Equals(KeyValue::new(k.as_str(), v.as_str())))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// An empty selector matches everything.
    pub fn matches(&self, labels: Option<&Labels>) -> bool {
        self.0.iter().all(|c| c.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

impl From<Clause> for LabelSelector {
    fn from(clause: Clause) -> Self {
        Self(vec![clause])
    }
}
