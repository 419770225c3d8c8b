//! Local policy limits applied while decoding and validating.

#[cfg(feature = "json")]
use std::path::Path;

#[cfg(feature = "json")]
use anyhow::Context as _;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::registry::Registry;
use crate::Result;

/// Largest bitmask this implementation can represent safely (28 bits).
pub const MAX_SAFE_BITMASK: u32 = 0x0fff_ffff;

/// Largest fulfillment payload, in bytes, this implementation accepts.
pub const MAX_FULFILLMENT_LENGTH: u64 = 65535;

/// Default bound on structural nesting (threshold and prefix levels).
pub const MAX_NESTING_DEPTH: usize = 16;

/// Deepest nesting a configuration may allow; bounds recursion.
pub const MAX_CONFIGURABLE_DEPTH: usize = MAX_NESTING_DEPTH * 4;

/// Default bound on the number of subconditions of one threshold node.
pub const MAX_SUBCONDITIONS: usize = 256;

/// Longest fingerprint a condition URI can carry (86 base64url characters).
pub const MAX_FINGERPRINT_LENGTH: usize = 64;

/// Locally enforced feature and size policy.
///
/// `Limits::default()` accepts every feature suite known to the global
/// registry and uses the crate-wide maxima above.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(default, deny_unknown_fields))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Feature suites this node is willing to process.
    pub supported_bitmask: u32,
    /// Largest fulfillment payload accepted.
    pub max_fulfillment_length: u64,
    /// Deepest structural nesting accepted.
    pub max_depth: usize,
    /// Most subconditions accepted in a single threshold node.
    pub max_subconditions: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            supported_bitmask: Registry::global().supported_bitmask(),
            max_fulfillment_length: MAX_FULFILLMENT_LENGTH,
            max_depth: MAX_NESTING_DEPTH,
            max_subconditions: MAX_SUBCONDITIONS,
        }
    }
}

impl Limits {
    /// Rejects limits looser than the hard maxima of this implementation.
    pub fn check(&self) -> Result<()> {
        if self.supported_bitmask > MAX_SAFE_BITMASK {
            return Err(Error::BitmaskTooLarge(self.supported_bitmask));
        }
        if self.max_fulfillment_length > MAX_FULFILLMENT_LENGTH {
            return Err(Error::FulfillmentTooLarge {
                length: self.max_fulfillment_length,
                max: MAX_FULFILLMENT_LENGTH,
            });
        }
        if self.max_depth > MAX_CONFIGURABLE_DEPTH {
            return Err(Error::NestingTooDeep(MAX_CONFIGURABLE_DEPTH));
        }
        Ok(())
    }

    /// Parses limits from JSON; omitted fields keep their defaults.
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let limits: Self = serde_json::from_str(json).context("parsing limits JSON")?;
        limits.check().context("limits exceed implementation maxima")?;
        Ok(limits)
    }

    /// Reads limits from a JSON file at `path`.
    #[cfg(feature = "json")]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("loading limits: {:?}", path))?;
        Self::from_json_str(&content).with_context(|| format!("in {:?}", path))
    }
}
