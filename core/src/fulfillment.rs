//! Fulfillments: the proofs that satisfy conditions.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "json")]
use serde_with::{DeserializeFromStr, SerializeDisplay};
use tracing::trace;

use crate::condition::Condition;
use crate::encoding::{
    base64url_decode, base64url_decoded_len, base64url_encode, length_prefix_len, Reader, Writer,
};
use crate::error::Error;
use crate::limits::Limits;
use crate::registry::{Registry, TypeDescriptor};
use crate::uri;
use crate::Result;

pub mod ed25519;
pub mod prefix;
pub mod preimage;
pub mod secp256k1;
pub mod threshold;

pub use ed25519::Ed25519Sha256;
pub use prefix::PrefixSha256;
pub use preimage::PreimageSha256;
pub use secp256k1::Secp256k1Sha256;
pub use threshold::ThresholdSha256;

/// Registry, limits and current nesting depth used while decoding or
/// validating a fulfillment tree.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    registry: &'a Registry,
    limits: Limits,
    depth: usize,
}

impl<'a> Context<'a> {
    pub fn new(registry: &'a Registry, limits: Limits) -> Self {
        Self {
            registry,
            limits,
            depth: 0,
        }
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Context for the children of the current node.
    pub fn descend(&self) -> Result<Self> {
        let depth = self.depth + 1;
        if depth > self.limits.max_depth {
            return Err(Error::NestingTooDeep(self.limits.max_depth));
        }
        Ok(Self { depth, ..*self })
    }
}

impl Default for Context<'static> {
    fn default() -> Self {
        Self::new(Registry::global(), Limits::default())
    }
}

/// Behavior shared by every fulfillment type.
pub(crate) trait Primitive {
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// Static data the fingerprint is computed over.
    fn fingerprint_contents(&self) -> Result<Vec<u8>>;

    /// OR of the bitmasks of all subconditions.
    fn subcondition_bitmask(&self) -> u32 {
        0
    }

    fn max_fulfillment_length(&self) -> Result<u64>;

    fn write_payload(&self, w: &mut Writer);

    fn validate(&self, message: &[u8], ctx: &Context<'_>) -> Result<()>;
}

/// Worst-case binary length of a fulfillment whose payload is at most
/// `max_payload` bytes: type id, length prefix and payload.
pub(crate) fn fulfillment_binary_bound(max_payload: u64) -> Result<u64> {
    max_payload
        .checked_add(2 + length_prefix_len(max_payload) as u64)
        .ok_or(Error::NumericOverflow("max fulfillment length"))
}

/// A fulfillment of any supported type.
///
/// URI form: `cf:<type hex>:<payload base64url>`.
#[cfg_attr(feature = "json", derive(SerializeDisplay, DeserializeFromStr))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fulfillment {
    Preimage(PreimageSha256),
    Prefix(PrefixSha256),
    Threshold(ThresholdSha256),
    Ed25519(Ed25519Sha256),
    Secp256k1(Secp256k1Sha256),
}

impl Fulfillment {
    fn primitive(&self) -> &dyn Primitive {
        match self {
            Self::Preimage(f) => f,
            Self::Prefix(f) => f,
            Self::Threshold(f) => f,
            Self::Ed25519(f) => f,
            Self::Secp256k1(f) => f,
        }
    }

    pub fn descriptor(&self) -> &'static TypeDescriptor {
        self.primitive().descriptor()
    }

    pub fn type_id(&self) -> u16 {
        self.descriptor().type_id
    }

    /// Own feature bits OR every subcondition's bitmask.
    pub fn bitmask(&self) -> u32 {
        self.descriptor().feature_bits | self.primitive().subcondition_bitmask()
    }

    /// Derives the condition this fulfillment satisfies.
    ///
    /// Purely a function of the fulfillment's structure: equal fulfillments
    /// always derive byte-identical conditions.
    pub fn condition(&self) -> Result<Condition> {
        let primitive = self.primitive();
        let descriptor = primitive.descriptor();
        let fingerprint = descriptor.hash.digest(&primitive.fingerprint_contents()?);
        let condition = Condition::new(
            descriptor.type_id,
            self.bitmask(),
            fingerprint,
            primitive.max_fulfillment_length()?,
        );
        trace!(type_name = descriptor.name, %condition, "derived condition");
        Ok(condition)
    }

    /// Type-specific payload bytes.
    pub fn payload(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.primitive().write_payload(&mut w);
        w.into_bytes()
    }

    pub fn to_uri(&self) -> String {
        format!("cf:{:x}:{}", self.type_id(), base64url_encode(&self.payload()))
    }

    pub fn parse_uri(text: &str) -> Result<Self> {
        Self::parse_uri_in(text, &Context::default())
    }

    /// Parses a fulfillment URI against a specific registry and limits.
    pub fn parse_uri_in(text: &str, ctx: &Context<'_>) -> Result<Self> {
        let malformed = || Error::MalformedFulfillment(text.to_string());

        let rest = text.strip_prefix("cf:").ok_or_else(malformed)?;
        let (type_id, payload) = rest.split_once(':').ok_or_else(malformed)?;
        let type_id = uri::hex_field(type_id, 4, true).ok_or_else(malformed)?;
        let payload = uri::base64url_field(payload, None).ok_or_else(malformed)?;

        let type_id =
            u16::from_str_radix(type_id, 16).map_err(|_| Error::NumericOverflow("type id"))?;
        ctx.registry().lookup(type_id)?;

        // Refuse before allocating for oversized payloads.
        let max = ctx.limits().max_fulfillment_length;
        let length = base64url_decoded_len(payload.len()) as u64;
        if length > max {
            return Err(Error::FulfillmentTooLarge { length, max });
        }
        Self::from_payload_in(type_id, &base64url_decode(payload)?, ctx)
    }

    /// Decodes a payload of the given type.
    pub fn from_payload_in(type_id: u16, payload: &[u8], ctx: &Context<'_>) -> Result<Self> {
        let max = ctx.limits().max_fulfillment_length;
        let length = payload.len() as u64;
        if length > max {
            return Err(Error::FulfillmentTooLarge { length, max });
        }
        let descriptor = ctx.registry().lookup(type_id)?;
        let fulfillment = (descriptor.decode)(payload, ctx)?;
        trace!(
            type_name = descriptor.name,
            depth = ctx.depth(),
            "decoded fulfillment"
        );
        Ok(fulfillment)
    }

    pub fn to_binary(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write(&mut w);
        w.into_bytes()
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        w.write_u16(self.type_id());
        w.write_var_bytes(&self.payload());
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        Self::from_binary_in(bytes, &Context::default())
    }

    pub fn from_binary_in(bytes: &[u8], ctx: &Context<'_>) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let fulfillment = Self::read(&mut r, ctx)?;
        r.finish()?;
        Ok(fulfillment)
    }

    pub(crate) fn read(r: &mut Reader<'_>, ctx: &Context<'_>) -> Result<Self> {
        let type_id = r.read_u16()?;
        let payload = r.read_var_bytes()?;
        Self::from_payload_in(type_id, payload, ctx)
    }

    /// Checks the proof against `message` under the default limits.
    ///
    /// Signature types verify their signature over `message`; threshold
    /// types require enough genuine subfulfillments and validate each of
    /// them. Preimages carry no message-dependent proof.
    pub fn validate(&self, message: &[u8]) -> Result<()> {
        self.validate_in(message, &Context::default())
    }

    pub fn validate_with(&self, message: &[u8], limits: &Limits) -> Result<()> {
        self.validate_in(message, &Context::new(Registry::global(), *limits))
    }

    pub(crate) fn validate_in(&self, message: &[u8], ctx: &Context<'_>) -> Result<()> {
        if !ctx.registry().contains(self.type_id()) {
            return Err(Error::UnknownType(self.type_id()));
        }
        self.primitive().validate(message, ctx)
    }
}

impl fmt::Display for Fulfillment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl FromStr for Fulfillment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_uri(s)
    }
}

impl From<PreimageSha256> for Fulfillment {
    fn from(value: PreimageSha256) -> Self {
        Self::Preimage(value)
    }
}

impl From<PrefixSha256> for Fulfillment {
    fn from(value: PrefixSha256) -> Self {
        Self::Prefix(value)
    }
}

impl From<ThresholdSha256> for Fulfillment {
    fn from(value: ThresholdSha256) -> Self {
        Self::Threshold(value)
    }
}

impl From<Ed25519Sha256> for Fulfillment {
    fn from(value: Ed25519Sha256) -> Self {
        Self::Ed25519(value)
    }
}

impl From<Secp256k1Sha256> for Fulfillment {
    fn from(value: Secp256k1Sha256) -> Self {
        Self::Secp256k1(value)
    }
}
