//! Service identifiers and their allocation.
use std::{
    fmt::{Debug, Display},
    ops::RangeInclusive,
    str::FromStr,
};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FromStrVisitor, ValidationError};

/// Range random service ids are drawn from when the caller does not choose one.
pub const DEFAULT_ID_RANGE: RangeInclusive<i64> = 1000..=9999;

/// CAS registered service identifier.
///
/// The textual form is kept verbatim (so `"0042"` stays `"0042"` in the written
/// descriptor), while the numeric value feeds the default evaluation order.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ServiceId {
    text: String,
    value: i64,
}

impl ServiceId {
    /// Construct an identifier from a non-negative number.
    pub fn from_number(value: i64) -> Result<Self, ValidationError> {
        if value < 0 {
            return Err(ValidationError::InvalidId(value.to_string()));
        }

        Ok(Self {
            text: value.to_string(),
            value,
        })
    }

    /// The identifier as it appears in descriptor files.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The numeric value of the identifier.
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl FromStr for ServiceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidId(s.to_string()));
        }

        let value = s
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidId(s.to_string()))?;

        Ok(Self {
            text: s.to_string(),
            value,
        })
    }
}

impl Debug for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl<'de> Deserialize<'de> for ServiceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(FromStrVisitor::new("service id"))
    }
}

impl Serialize for ServiceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

/// A source of numbers for synthesized service ids.
pub trait IdSource: Send + Sync {
    /// Draw a number from the inclusive range.
    fn draw(&self, range: RangeInclusive<i64>) -> i64;
}

/// Draws ids uniformly with the thread-local RNG.
#[derive(Clone, Copy, Default, Debug)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn draw(&self, range: RangeInclusive<i64>) -> i64 {
        rand::thread_rng().gen_range(range)
    }
}

/// Resolves the id of a new descriptor.
///
/// A caller-chosen id is used verbatim. Uniqueness is not checked here and
/// nothing is retried: a collision surfaces later, when the registry is scanned.
pub struct IdAllocator {
    range: RangeInclusive<i64>,
    source: Box<dyn IdSource>,
}

impl IdAllocator {
    /// Allocator drawing from `range` using `source`.
    pub fn new(range: RangeInclusive<i64>, source: Box<dyn IdSource>) -> Result<Self, ValidationError> {
        if range.is_empty() {
            return Err(ValidationError::Config("empty id range"));
        }
        if *range.start() < 0 {
            return Err(ValidationError::Config("id range must be non-negative"));
        }

        Ok(Self { range, source })
    }

    /// The range synthesized ids are drawn from.
    pub fn range(&self) -> &RangeInclusive<i64> {
        &self.range
    }

    /// Use `provided` if non-empty, otherwise synthesize an id.
    pub fn resolve_id(&self, provided: Option<&str>) -> Result<ServiceId, ValidationError> {
        match provided {
            Some(text) if !text.is_empty() => text.parse(),
            _ => {
                let value = self.source.draw(self.range.clone());
                debug!(value, "synthesized service id");
                ServiceId::from_number(value)
            }
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            range: DEFAULT_ID_RANGE,
            source: Box::new(RandomIdSource),
        }
    }
}
