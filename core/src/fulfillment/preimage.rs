use crate::encoding::Writer;
use crate::registry::{features, Arity, HashAlgorithm, TypeDescriptor, PREIMAGE_SHA256};
use crate::Result;

use super::{Context, Fulfillment, Primitive};

pub const DESCRIPTOR: TypeDescriptor = TypeDescriptor {
    type_id: PREIMAGE_SHA256,
    name: "preimage-sha-256",
    feature_bits: features::SHA_256 | features::PREIMAGE,
    arity: Arity::Leaf,
    hash: HashAlgorithm::Sha256,
    decode,
};

/// A hashlock: fulfilled by revealing the preimage of its fingerprint.
///
/// The fingerprint is `SHA-256(preimage)` and the payload is the raw
/// preimage, so the maximum fulfillment length is the preimage length.
///
/// # Example
///
/// ```
/// use cryptoconditions_core::{Fulfillment, PreimageSha256};
///
/// let fulfillment = Fulfillment::from(PreimageSha256::new(b"my-secret".to_vec()));
/// let condition = fulfillment.condition().unwrap();
/// assert_eq!(condition.max_fulfillment_length(), 9);
/// assert!(fulfillment.validate(b"").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreimageSha256 {
    preimage: Vec<u8>,
}

impl PreimageSha256 {
    pub fn new(preimage: impl Into<Vec<u8>>) -> Self {
        Self {
            preimage: preimage.into(),
        }
    }

    pub fn preimage(&self) -> &[u8] {
        &self.preimage
    }
}

impl Primitive for PreimageSha256 {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &DESCRIPTOR
    }

    fn fingerprint_contents(&self) -> Result<Vec<u8>> {
        Ok(self.preimage.clone())
    }

    fn max_fulfillment_length(&self) -> Result<u64> {
        Ok(self.preimage.len() as u64)
    }

    fn write_payload(&self, w: &mut Writer) {
        w.write_bytes(&self.preimage);
    }

    /// Revealing the preimage is the whole proof.
    fn validate(&self, _message: &[u8], _ctx: &Context<'_>) -> Result<()> {
        Ok(())
    }
}

fn decode(payload: &[u8], _ctx: &Context<'_>) -> Result<Fulfillment> {
    Ok(PreimageSha256::new(payload).into())
}

#[cfg(test)]
mod tests {
    use sha2::{Digest, Sha256};

    use super::*;

    #[test]
    fn condition_of_preimage() {
        let f = Fulfillment::from(PreimageSha256::new(b"hello".to_vec()));
        let c = f.condition().unwrap();
        assert_eq!(c.type_id(), PREIMAGE_SHA256);
        assert_eq!(c.bitmask(), 0x03);
        assert_eq!(c.fingerprint(), Sha256::digest(b"hello").as_slice());
        assert_eq!(c.max_fulfillment_length(), 5);
        assert_eq!(
            c.to_uri(),
            "cc:0:3:LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ:5"
        );
    }

    #[test]
    fn different_preimages_differ() {
        let a = Fulfillment::from(PreimageSha256::new(b"hello".to_vec()));
        let b = Fulfillment::from(PreimageSha256::new(b"hellx".to_vec()));
        assert_ne!(a.condition().unwrap(), b.condition().unwrap());
    }
}
