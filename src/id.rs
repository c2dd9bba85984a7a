use std::fmt;

use serde::{Deserialize, Serialize};

const SEED_MODULUS: u64 = 1_000_003;
const SEED_BUCKETS: u64 = 1000;

/// Identifier of a stored message. The data file written by older
/// deployments holds numeric ids; hand-written fixtures sometimes use strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Int(i64),
    Text(String),
}

impl MessageId {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MessageId::Int(id) => Some(*id),
            MessageId::Text(text) => text.parse().ok(),
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Int(id) => write!(f, "{id}"),
            MessageId::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for MessageId {
    fn from(value: i64) -> Self {
        MessageId::Int(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        MessageId::Text(value.to_owned())
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        MessageId::Text(value)
    }
}

/// Stable pseudo-random value in `[0, 1)` tied to a record's identity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Seed(f64);

impl Seed {
    /// Wraps a raw value, folding it into `[0, 1)`.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Seed(value.rem_euclid(1.0))
        } else {
            Seed(0.0)
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

/// Derives the layout seed of an identity from its string form, so `42` and
/// `"42"` give the same seed.
pub fn seed_of(identity: impl fmt::Display) -> Seed {
    seed_of_str(&identity.to_string())
}

pub fn seed_of_str(identity: &str) -> Seed {
    let mut hash: u64 = 0;
    for unit in identity.encode_utf16() {
        hash = (hash * 31 + unit as u64) % SEED_MODULUS;
    }
    Seed((hash % SEED_BUCKETS) as f64 / SEED_BUCKETS as f64)
}
