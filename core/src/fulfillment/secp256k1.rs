use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};

use crate::encoding::Writer;
use crate::error::Error;
use crate::registry::{features, Arity, HashAlgorithm, TypeDescriptor, SECP256K1_SHA256};
use crate::Result;

use super::{Context, Fulfillment, Primitive};

/// Compressed SEC1 point.
pub const PUBLIC_KEY_LENGTH: usize = 33;
/// Fixed-size `r || s`.
pub const SIGNATURE_LENGTH: usize = 64;

pub const DESCRIPTOR: TypeDescriptor = TypeDescriptor {
    type_id: SECP256K1_SHA256,
    name: "secp256k1-sha-256",
    feature_bits: features::SHA_256 | features::SECP256K1,
    arity: Arity::Leaf,
    hash: HashAlgorithm::Sha256,
    decode,
};

/// Secp256k1 ECDSA signature fulfillment.
///
/// Fulfilled by a valid ECDSA signature (SHA-256 message digest) of the
/// message under `public_key`. The fingerprint is `SHA-256(public_key)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secp256k1Sha256 {
    public_key: [u8; PUBLIC_KEY_LENGTH],
    signature: [u8; SIGNATURE_LENGTH],
}

impl Secp256k1Sha256 {
    pub fn new(public_key: [u8; PUBLIC_KEY_LENGTH], signature: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    /// Signs `message` and wraps the signature with the compressed public key.
    pub fn sign(key: &SigningKey, message: &[u8]) -> Self {
        let signature: Signature = key.sign(message);
        let point = key.verifying_key().to_encoded_point(true);

        let mut public_key = [0u8; PUBLIC_KEY_LENGTH];
        public_key.copy_from_slice(point.as_bytes());
        let mut sig = [0u8; SIGNATURE_LENGTH];
        sig.copy_from_slice(&signature.to_bytes());
        Self::new(public_key, sig)
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.signature
    }
}

impl Primitive for Secp256k1Sha256 {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &DESCRIPTOR
    }

    fn fingerprint_contents(&self) -> Result<Vec<u8>> {
        Ok(self.public_key.to_vec())
    }

    fn max_fulfillment_length(&self) -> Result<u64> {
        Ok((PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH) as u64)
    }

    fn write_payload(&self, w: &mut Writer) {
        w.write_bytes(&self.public_key);
        w.write_bytes(&self.signature);
    }

    fn validate(&self, message: &[u8], _ctx: &Context<'_>) -> Result<()> {
        let vk = VerifyingKey::from_sec1_bytes(&self.public_key)
            .map_err(|_| Error::InvalidSignature)?;
        let sig = Signature::from_slice(&self.signature).map_err(|_| Error::InvalidSignature)?;
        vk.verify(message, &sig)
            .map_err(|_| Error::InvalidSignature)
    }
}

fn decode(payload: &[u8], _ctx: &Context<'_>) -> Result<Fulfillment> {
    if payload.len() != PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH {
        return Err(Error::payload(
            DESCRIPTOR.name,
            format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH,
                payload.len()
            ),
        ));
    }
    if !matches!(payload[0], 0x02 | 0x03) {
        return Err(Error::payload(DESCRIPTOR.name, "public key is not a compressed point"));
    }
    let (public_key, signature) = payload.split_at(PUBLIC_KEY_LENGTH);
    let mut pk = [0u8; PUBLIC_KEY_LENGTH];
    pk.copy_from_slice(public_key);
    let mut sig = [0u8; SIGNATURE_LENGTH];
    sig.copy_from_slice(signature);
    Ok(Secp256k1Sha256::new(pk, sig).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_slice(&[seed; 32]).unwrap()
    }

    #[test]
    fn sign_and_validate() {
        let f = Fulfillment::from(Secp256k1Sha256::sign(&key(5), b"cryptoconditions"));
        assert!(f.validate(b"cryptoconditions").is_ok());
        assert_eq!(f.validate(b"tampered"), Err(Error::InvalidSignature));
    }

    #[test]
    fn condition_fields() {
        let f = Fulfillment::from(Secp256k1Sha256::sign(&key(5), b"msg"));
        let c = f.condition().unwrap();
        assert_eq!(c.type_id(), SECP256K1_SHA256);
        assert_eq!(c.bitmask(), 0x41);
        assert_eq!(c.max_fulfillment_length(), 97);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn uri_round_trip() {
        let f = Fulfillment::from(Secp256k1Sha256::sign(&key(6), b"msg"));
        let parsed = Fulfillment::parse_uri(&f.to_uri()).unwrap();
        assert_eq!(parsed, f);
        assert!(parsed.validate(b"msg").is_ok());
    }

    #[test]
    fn rejects_uncompressed_key_prefix() {
        let f = Secp256k1Sha256::sign(&key(6), b"msg");
        let mut payload = Fulfillment::from(f).payload();
        payload[0] = 0x04;
        assert!(matches!(
            Fulfillment::from_payload_in(SECP256K1_SHA256, &payload, &Context::default()),
            Err(Error::PayloadDecode { .. })
        ));
    }
}
