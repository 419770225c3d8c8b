//! Condition type registry.
//!
//! Maps a type id to the behavior needed to decode and fingerprint it.
//! The standard registry is built once and shared read-only afterwards.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Error;
use crate::fulfillment::{
    ed25519, prefix, preimage, secp256k1, threshold, Context, Fulfillment,
};
use crate::Result;

pub const PREIMAGE_SHA256: u16 = 0;
pub const PREFIX_SHA256: u16 = 1;
pub const THRESHOLD_SHA256: u16 = 2;
pub const RSA_SHA256: u16 = 3;
pub const ED25519_SHA256: u16 = 4;
pub const SECP256K1_SHA256: u16 = 5;

/// Feature suite bits.
pub mod features {
    pub const SHA_256: u32 = 0x01;
    pub const PREIMAGE: u32 = 0x02;
    pub const PREFIX: u32 = 0x04;
    pub const THRESHOLD: u32 = 0x08;
    pub const RSA_PSS: u32 = 0x10;
    pub const ED25519: u32 = 0x20;
    pub const SECP256K1: u32 = 0x40;
}

/// How many subfulfillments a type embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No subfulfillments.
    Leaf,
    /// Exactly one subfulfillment (prefix).
    One,
    /// Any number of subfulfillments (threshold).
    Many,
}

/// Hash used to compute a type's fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
}

impl HashAlgorithm {
    /// Hashes `data` into a fingerprint.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }
}

/// Decodes a type-specific payload into a fulfillment.
pub type PayloadDecoder = fn(&[u8], &Context<'_>) -> Result<Fulfillment>;

/// Everything the registry knows about one condition type.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    /// Id carried in URIs and binary encodings.
    pub type_id: u16,
    /// Canonical type name, e.g. `preimage-sha-256`.
    pub name: &'static str,
    /// Feature suites contributed by this type alone.
    pub feature_bits: u32,
    /// Whether the type is a leaf or wraps subfulfillments.
    pub arity: Arity,
    /// Hash applied to the fingerprint contents.
    pub hash: HashAlgorithm,
    /// Turns a payload of this type into a fulfillment.
    pub decode: PayloadDecoder,
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .field("feature_bits", &format_args!("{:#x}", self.feature_bits))
            .field("arity", &self.arity)
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

impl TypeDescriptor {
    /// Whether fulfillments of this type embed other fulfillments.
    pub fn is_structural(&self) -> bool {
        self.arity != Arity::Leaf
    }
}

/// Condition types known to this node, keyed by type id.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<u16, TypeDescriptor>,
}

impl Registry {
    /// A registry with no types.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding every built-in type.
    pub fn standard() -> Self {
        let entries = [
            preimage::DESCRIPTOR,
            prefix::DESCRIPTOR,
            threshold::DESCRIPTOR,
            ed25519::DESCRIPTOR,
            secp256k1::DESCRIPTOR,
        ]
        .into_iter()
        .map(|d| (d.type_id, d))
        .collect();
        Self { entries }
    }

    /// The process-wide standard registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::standard)
    }

    /// Adds a type; fails if its id is already taken.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        if self.entries.contains_key(&descriptor.type_id) {
            return Err(Error::DuplicateType(descriptor.type_id));
        }
        debug!(
            type_id = descriptor.type_id,
            name = descriptor.name,
            "registering condition type"
        );
        self.entries.insert(descriptor.type_id, descriptor);
        Ok(())
    }

    /// The descriptor for `type_id`, or `UnknownType`.
    pub fn lookup(&self, type_id: u16) -> Result<&TypeDescriptor> {
        self.entries
            .get(&type_id)
            .ok_or(Error::UnknownType(type_id))
    }

    pub fn contains(&self, type_id: u16) -> bool {
        self.entries.contains_key(&type_id)
    }

    /// Union of the feature bits of every registered type.
    pub fn supported_bitmask(&self) -> u32 {
        self.entries
            .values()
            .fold(0, |mask, d| mask | d.feature_bits)
    }

    /// Registered types in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.entries.values()
    }
}
