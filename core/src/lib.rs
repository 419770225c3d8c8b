//! Crypto-conditions: constant-size conditions and the fulfillments that
//! satisfy them.
//!
//! A [`Condition`] is published to lock a resource; a matching
//! [`Fulfillment`] unlocks it. A condition stays the same size however
//! complex the fulfillment is, so an n-of-m multi-signature locks an output
//! with as few bytes as a single hashlock.
//!
//! ```
//! use cryptoconditions_core::{verify, Fulfillment, PreimageSha256, ThresholdSha256};
//!
//! let a: Fulfillment = PreimageSha256::new(b"A".to_vec()).into();
//! let b: Fulfillment = PreimageSha256::new(b"B".to_vec()).into();
//! let c: Fulfillment = PreimageSha256::new(b"C".to_vec()).into();
//!
//! let two_of_three: Fulfillment = ThresholdSha256::new(2)
//!     .with_subfulfillment(a)?
//!     .with_subfulfillment(b)?
//!     .with_subcondition(c.condition()?)
//!     .into();
//!
//! let lock = two_of_three.condition()?.to_uri();
//! assert!(verify(&two_of_three.to_uri(), &lock, b"")?);
//! # Ok::<(), cryptoconditions_core::Error>(())
//! ```

/// Condition data structure, URI and binary forms, policy validation
pub mod condition;
/// Canonical length-prefixed binary encoding
pub mod encoding;
pub mod error;
/// Fulfillment types and their decoding
pub mod fulfillment;
/// Local policy limits and their configuration
pub mod limits;
/// Type id registry
pub mod registry;
/// Serde helpers for alternative JSON shapes
pub mod serde;
mod uri;
/// Verification of fulfillments against conditions
pub mod verifier;

pub use condition::Condition;
pub use error::{Error, ErrorClass};
pub use fulfillment::{
    Context, Ed25519Sha256, Fulfillment, PrefixSha256, PreimageSha256, Secp256k1Sha256,
    ThresholdSha256,
};
pub use limits::{Limits, MAX_FULFILLMENT_LENGTH, MAX_NESTING_DEPTH, MAX_SAFE_BITMASK};
pub use registry::{Registry, TypeDescriptor};
pub use verifier::{verify, Verifier};

pub type Result<T> = std::result::Result<T, Error>;
