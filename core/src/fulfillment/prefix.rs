use crate::condition::Condition;
use crate::encoding::{var_bytes_len, Reader, Writer};
use crate::error::Error;
use crate::registry::{features, Arity, HashAlgorithm, TypeDescriptor, PREFIX_SHA256};
use crate::Result;

use super::{fulfillment_binary_bound, Context, Fulfillment, Primitive};

pub const DESCRIPTOR: TypeDescriptor = TypeDescriptor {
    type_id: PREFIX_SHA256,
    name: "prefix-sha-256",
    feature_bits: features::SHA_256 | features::PREFIX,
    arity: Arity::One,
    hash: HashAlgorithm::Sha256,
    decode,
};

/// Prepends a fixed prefix to the message before validating the
/// subfulfillment against it.
///
/// Used to bind a signature condition to a context (an asset id, a ledger
/// name) without changing the signer's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixSha256 {
    prefix: Vec<u8>,
    subfulfillment: Box<Fulfillment>,
    subcondition: Condition,
}

impl PrefixSha256 {
    pub fn new(prefix: impl Into<Vec<u8>>, subfulfillment: Fulfillment) -> Result<Self> {
        let subcondition = subfulfillment.condition()?;
        Ok(Self {
            prefix: prefix.into(),
            subfulfillment: Box::new(subfulfillment),
            subcondition,
        })
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn subfulfillment(&self) -> &Fulfillment {
        &self.subfulfillment
    }

    pub fn subcondition(&self) -> &Condition {
        &self.subcondition
    }
}

impl Primitive for PrefixSha256 {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &DESCRIPTOR
    }

    fn fingerprint_contents(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.write_var_bytes(&self.prefix);
        self.subcondition.write(&mut w);
        Ok(w.into_bytes())
    }

    fn subcondition_bitmask(&self) -> u32 {
        self.subcondition.bitmask()
    }

    fn max_fulfillment_length(&self) -> Result<u64> {
        let sub = fulfillment_binary_bound(self.subcondition.max_fulfillment_length())?;
        var_bytes_len(self.prefix.len() as u64)?
            .checked_add(sub)
            .ok_or(Error::NumericOverflow("max fulfillment length"))
    }

    fn write_payload(&self, w: &mut Writer) {
        w.write_var_bytes(&self.prefix);
        self.subfulfillment.write(w);
    }

    fn validate(&self, message: &[u8], ctx: &Context<'_>) -> Result<()> {
        let child = ctx.descend()?;
        let mut prefixed = Vec::with_capacity(self.prefix.len() + message.len());
        prefixed.extend_from_slice(&self.prefix);
        prefixed.extend_from_slice(message);
        self.subfulfillment.validate_in(&prefixed, &child)
    }
}

fn decode(payload: &[u8], ctx: &Context<'_>) -> Result<Fulfillment> {
    let child = ctx.descend()?;
    let mut r = Reader::new(payload);
    let prefix = r.read_var_bytes()?;
    let subfulfillment = Fulfillment::read(&mut r, &child)?;
    r.finish()?;
    Ok(PrefixSha256::new(prefix, subfulfillment)?.into())
}
