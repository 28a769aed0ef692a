use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fnv::fnv1a;
use crate::node::now_unix;

/// The literal value written into a [`Sample::value`] to mark a measurement
/// as degraded (spec §4.4.2: a failed ping overwrites the RTT pair with NaN).
pub const NAN_VALUE: &str = "NaN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[repr(i64)]
pub enum SampleKey {
    /// Reserved for parity with the original source's `STATE` constant; no
    /// component in this implementation writes a `State` sample, but the
    /// wire schema stays able to represent one.
    State = 1,
    RttTotal = 2,
    RttRequest = 3,
}

impl SampleKey {
    pub fn decimal(&self) -> i64 {
        *self as i64
    }
}

/// A single measurement from one node to another, keyed by `(from, to, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub id: u32,
    pub from: String,
    pub to: String,
    pub key: SampleKey,
    pub value: String,
    pub ts: i64,
}

impl Sample {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        key: SampleKey,
        value: impl Into<String>,
    ) -> Self {
        let from = from.into();
        let to = to.into();
        let id = sample_id(&from, &to, key);
        Self {
            id,
            from,
            to,
            key,
            value: value.into(),
            ts: now_unix(),
        }
    }

    pub fn with_ts(mut self, ts: i64) -> Self {
        self.ts = ts;
        self
    }

    pub fn is_nan(&self) -> bool {
        self.value == NAN_VALUE
    }
}

/// `id = fnv1a(from ∥ to ∥ decimal(key))`. A new sample for the same triple
/// always recomputes to the same id, so `set_sample` is a natural overwrite.
pub fn sample_id(from: &str, to: &str, key: SampleKey) -> u32 {
    let mut buf = Vec::with_capacity(from.len() + to.len() + 4);
    buf.extend_from_slice(from.as_bytes());
    buf.extend_from_slice(to.as_bytes());
    buf.extend_from_slice(key.decimal().to_string().as_bytes());
    fnv1a(&buf)
}

/// The shape of a `Sample` on the wire (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WireSample {
    pub from: String,
    pub to: String,
    pub key: i64,
    pub value: String,
    pub ts: i64,
}

impl From<&Sample> for WireSample {
    fn from(s: &Sample) -> Self {
        WireSample {
            from: s.from.clone(),
            to: s.to.clone(),
            key: s.key.decimal(),
            value: s.value.clone(),
            ts: s.ts,
        }
    }
}

impl WireSample {
    pub fn try_into_sample(self) -> Option<Sample> {
        let key = match self.key {
            1 => SampleKey::State,
            2 => SampleKey::RttTotal,
            3 => SampleKey::RttRequest,
            _ => return None,
        };
        let id = sample_id(&self.from, &self.to, key);
        Some(Sample {
            id,
            from: self.from,
            to: self.to,
            key,
            value: self.value,
            ts: self.ts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_triple_same_id() {
        let a = Sample::new("x", "y", SampleKey::RttTotal, "5");
        let b = Sample::new("x", "y", SampleKey::RttTotal, "9");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn different_key_different_id() {
        let a = Sample::new("x", "y", SampleKey::RttTotal, "5");
        let b = Sample::new("x", "y", SampleKey::RttRequest, "5");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn state_key_discriminant_is_one() {
        assert_eq!(SampleKey::State.decimal(), 1);
        assert_eq!(SampleKey::RttTotal.decimal(), 2);
        assert_eq!(SampleKey::RttRequest.decimal(), 3);
    }
}
