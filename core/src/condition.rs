//! Conditions: constant-size commitments to a class of acceptable fulfillments.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "json")]
use anyhow::Context as _;
#[cfg(feature = "json")]
use serde_with::{DeserializeFromStr, SerializeDisplay};
use subtle::ConstantTimeEq;

use crate::encoding::{base64url_decode, base64url_encode, var_bytes_len, var_uint_len, Reader, Writer};
use crate::error::Error;
use crate::fulfillment::Fulfillment;
use crate::limits::{Limits, MAX_FINGERPRINT_LENGTH, MAX_SAFE_BITMASK};
use crate::uri;
use crate::Result;

/// A crypto-condition.
///
/// A condition only carries the minimum needed to decide whether a
/// fulfillment can be processed and whether it matches: the type, the
/// feature suites used anywhere below it, a fingerprint of the static parts
/// of the fulfillment (public keys, subconditions, ...) and an upper bound on
/// the fulfillment payload size. Its size does not depend on how complex the
/// fulfillment is.
///
/// URI form: `cc:<type hex>:<bitmask hex>:<fingerprint base64url>:<max length>`.
///
/// # Example
///
/// ```
/// use cryptoconditions_core::{Condition, Fulfillment, PreimageSha256};
///
/// let fulfillment = Fulfillment::from(PreimageSha256::new(b"".to_vec()));
/// let condition = fulfillment.condition().unwrap();
/// assert_eq!(
///     condition.to_uri(),
///     "cc:0:3:47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU:0"
/// );
/// assert_eq!(Condition::parse_uri(&condition.to_uri()).unwrap(), condition);
/// ```
#[cfg_attr(feature = "json", derive(SerializeDisplay, DeserializeFromStr))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    type_id: u16,
    bitmask: u32,
    fingerprint: Vec<u8>,
    max_fulfillment_length: u64,
}

impl Condition {
    /// Builds a condition from known parts, e.g. a published fingerprint.
    pub fn new(
        type_id: u16,
        bitmask: u32,
        fingerprint: impl Into<Vec<u8>>,
        max_fulfillment_length: u64,
    ) -> Self {
        Self {
            type_id,
            bitmask,
            fingerprint: fingerprint.into(),
            max_fulfillment_length,
        }
    }

    /// Derives the condition a fulfillment satisfies.
    pub fn derive_from(fulfillment: &Fulfillment) -> Result<Self> {
        fulfillment.condition()
    }

    pub fn type_id(&self) -> u16 {
        self.type_id
    }

    /// For simple types the bits of the type itself; for structural types
    /// the OR of those and every subcondition's bitmask.
    pub fn bitmask(&self) -> u32 {
        self.bitmask
    }

    pub fn fingerprint(&self) -> &[u8] {
        &self.fingerprint
    }

    /// Upper bound, in bytes, on the payload of any fulfillment of this condition.
    ///
    /// Every implementation enforces it, so a fulfillment is valid
    /// everywhere or nowhere regardless of local size limits.
    pub fn max_fulfillment_length(&self) -> u64 {
        self.max_fulfillment_length
    }

    pub fn to_uri(&self) -> String {
        format!(
            "cc:{:x}:{:x}:{}:{}",
            self.type_id,
            self.bitmask,
            base64url_encode(&self.fingerprint),
            self.max_fulfillment_length
        )
    }

    pub fn parse_uri(text: &str) -> Result<Self> {
        let malformed = || Error::MalformedUri(text.to_string());

        let rest = text.strip_prefix("cc:").ok_or_else(malformed)?;
        let mut fields = rest.split(':');
        let (Some(type_id), Some(bitmask), Some(fingerprint), Some(max_length), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(malformed());
        };

        let type_id = uri::hex_field(type_id, 4, true).ok_or_else(malformed)?;
        let bitmask = uri::hex_field(bitmask, 8, false).ok_or_else(malformed)?;
        let fingerprint = uri::base64url_field(fingerprint, Some(86)).ok_or_else(malformed)?;
        let max_length = uri::decimal_field(max_length, 18).ok_or_else(malformed)?;

        Ok(Self {
            type_id: u16::from_str_radix(type_id, 16)
                .map_err(|_| Error::NumericOverflow("type id"))?,
            bitmask: u32::from_str_radix(bitmask, 16)
                .map_err(|_| Error::NumericOverflow("bitmask"))?,
            fingerprint: base64url_decode(fingerprint)?,
            max_fulfillment_length: max_length
                .parse()
                .map_err(|_| Error::NumericOverflow("max fulfillment length"))?,
        })
    }

    pub fn to_binary(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.write(&mut w);
        w.into_bytes()
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        let condition = Self::read(&mut r)?;
        r.finish()?;
        Ok(condition)
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        w.write_u16(self.type_id);
        w.write_var_uint(u64::from(self.bitmask));
        w.write_var_bytes(&self.fingerprint);
        w.write_var_uint(self.max_fulfillment_length);
    }

    pub(crate) fn read(r: &mut Reader<'_>) -> Result<Self> {
        let type_id = r.read_u16()?;
        let bitmask = u32::try_from(r.read_var_uint()?)
            .map_err(|_| Error::NumericOverflow("bitmask"))?;
        let fingerprint = r.read_var_bytes()?;
        if fingerprint.len() > MAX_FINGERPRINT_LENGTH {
            return Err(Error::MalformedBinary("fingerprint too long"));
        }
        let max_fulfillment_length = r.read_var_uint()?;
        Ok(Self::new(type_id, bitmask, fingerprint, max_fulfillment_length))
    }

    /// Length of [`Condition::to_binary`] without encoding.
    pub fn encoded_len(&self) -> u64 {
        2 + var_uint_len(u64::from(self.bitmask)) as u64
            + var_bytes_len(self.fingerprint.len() as u64).unwrap_or(u64::MAX)
            + var_uint_len(self.max_fulfillment_length) as u64
    }

    /// Checks the condition against the default local limits.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&Limits::default())
    }

    /// Checks that this implementation can process fulfillments of this
    /// condition: bitmask representable and supported, size bound acceptable.
    pub fn validate_with(&self, limits: &Limits) -> Result<()> {
        if self.bitmask > MAX_SAFE_BITMASK {
            return Err(Error::BitmaskTooLarge(self.bitmask));
        }
        let unsupported = self.bitmask & !limits.supported_bitmask;
        if unsupported != 0 {
            return Err(Error::UnsupportedFeature {
                bitmask: self.bitmask,
                unsupported,
            });
        }
        if self.max_fulfillment_length > limits.max_fulfillment_length {
            return Err(Error::FulfillmentTooLarge {
                length: self.max_fulfillment_length,
                max: limits.max_fulfillment_length,
            });
        }
        Ok(())
    }

    /// Object JSON form with a base58 hash, see [`crate::serde::condition_object`].
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> anyhow::Result<String> {
        let value = crate::serde::condition_object::serialize(self, serde_json::value::Serializer)
            .context("encoding condition JSON")?;
        Ok(value.to_string())
    }

    /// Parses the object JSON form produced by [`Condition::to_json`].
    #[cfg(feature = "json")]
    pub fn parse_json(json: &str) -> anyhow::Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).context("parsing condition JSON")?;
        crate::serde::condition_object::deserialize(value).context("decoding condition JSON")
    }

    /// Structural equality with the fingerprint compared in constant time.
    pub fn matches(&self, other: &Condition) -> bool {
        let same_fingerprint: bool = self.fingerprint.ct_eq(&other.fingerprint).into();
        same_fingerprint
            && self.type_id == other.type_id
            && self.bitmask == other.bitmask
            && self.max_fulfillment_length == other.max_fulfillment_length
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl FromStr for Condition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_uri(s)
    }
}
