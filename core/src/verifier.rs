//! Checking fulfillments against published conditions.

use tracing::{debug, debug_span};

use crate::condition::Condition;
use crate::error::Error;
use crate::fulfillment::{Context, Fulfillment};
use crate::limits::Limits;
use crate::registry::Registry;
use crate::Result;

/// Verifies fulfillments under a fixed registry and local limits.
///
/// A fulfillment that simply does not satisfy the condition yields
/// `Ok(false)`. Inputs that are not well-formed crypto-conditions, or that
/// exceed local policy, yield `Err` so callers can tell them apart.
///
/// # Example
///
/// ```
/// use cryptoconditions_core::Verifier;
///
/// let verifier = Verifier::default();
/// let condition = "cc:0:3:LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ:5";
/// assert!(verifier.verify("cf:0:aGVsbG8", condition, b"").unwrap());
/// assert!(!verifier.verify("cf:0:aGVsbHg", condition, b"").unwrap());
/// assert!(verifier.verify("cf:0:aGVsbG8", "cc:nope", b"").is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Verifier<'r> {
    registry: &'r Registry,
    limits: Limits,
}

impl Default for Verifier<'static> {
    fn default() -> Self {
        Self::new(Registry::global(), Limits::default())
    }
}

impl<'r> Verifier<'r> {
    pub fn new(registry: &'r Registry, limits: Limits) -> Self {
        Self { registry, limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    fn context(&self) -> Context<'r> {
        Context::new(self.registry, self.limits)
    }

    /// Parses both URIs and verifies the fulfillment against the condition.
    pub fn verify(
        &self,
        fulfillment_uri: &str,
        condition_uri: &str,
        message: &[u8],
    ) -> Result<bool> {
        let _span = debug_span!("verify", condition = condition_uri).entered();

        let condition = Condition::parse_uri(condition_uri)?;
        // The bitmask tells us up front whether we can process the fulfillment.
        condition.validate_with(&self.limits)?;
        let fulfillment = Fulfillment::parse_uri_in(fulfillment_uri, &self.context())?;
        self.verify_parsed(&fulfillment, &condition, message)
    }

    /// Like [`Verifier::verify`] for already-parsed values.
    pub fn verify_parsed(
        &self,
        fulfillment: &Fulfillment,
        condition: &Condition,
        message: &[u8],
    ) -> Result<bool> {
        match self.check(fulfillment, condition, message) {
            Ok(()) => {
                debug!("fulfillment accepted");
                Ok(true)
            }
            Err(e) if e.is_proof_failure() => {
                debug!(reason = %e, "fulfillment rejected");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Like [`Verifier::verify_parsed`], but reports why a proof failed.
    pub fn check(
        &self,
        fulfillment: &Fulfillment,
        condition: &Condition,
        message: &[u8],
    ) -> Result<()> {
        condition.validate_with(&self.limits)?;

        let derived = fulfillment.condition()?;
        if !derived.matches(condition) {
            return Err(Error::ConditionMismatch);
        }

        let length = fulfillment.payload().len() as u64;
        if length > condition.max_fulfillment_length() {
            return Err(Error::FulfillmentTooLarge {
                length,
                max: condition.max_fulfillment_length(),
            });
        }

        fulfillment.validate_in(message, &self.context())
    }
}

/// Verifies under the global registry and default limits.
pub fn verify(fulfillment_uri: &str, condition_uri: &str, message: &[u8]) -> Result<bool> {
    Verifier::default().verify(fulfillment_uri, condition_uri, message)
}
