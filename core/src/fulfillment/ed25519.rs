use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use crate::encoding::Writer;
use crate::error::Error;
use crate::registry::{features, Arity, HashAlgorithm, TypeDescriptor, ED25519_SHA256};
use crate::Result;

use super::{Context, Fulfillment, Primitive};

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 64;

pub const DESCRIPTOR: TypeDescriptor = TypeDescriptor {
    type_id: ED25519_SHA256,
    name: "ed25519-sha-256",
    feature_bits: features::SHA_256 | features::ED25519,
    arity: Arity::Leaf,
    hash: HashAlgorithm::Sha256,
    decode,
};

/// Ed25519 signature fulfillment.
///
/// Fulfilled by a valid Ed25519 signature of the message under
/// `public_key`. The fingerprint is `SHA-256(public_key)`, so the
/// condition commits to the key but not to any particular message.
///
/// # Example
///
/// ```
/// use cryptoconditions_core::{Ed25519Sha256, Fulfillment};
/// use ed25519_dalek::SigningKey;
///
/// let key = SigningKey::from_bytes(&[7u8; 32]);
/// let fulfillment = Fulfillment::from(Ed25519Sha256::sign(&key, b"transfer-42"));
/// assert!(fulfillment.validate(b"transfer-42").is_ok());
/// assert!(fulfillment.validate(b"transfer-43").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519Sha256 {
    public_key: [u8; PUBLIC_KEY_LENGTH],
    signature: [u8; SIGNATURE_LENGTH],
}

impl Ed25519Sha256 {
    pub fn new(public_key: [u8; PUBLIC_KEY_LENGTH], signature: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    /// Signs `message` and wraps the signature with the signer's public key.
    pub fn sign(key: &SigningKey, message: &[u8]) -> Self {
        Self::new(
            key.verifying_key().to_bytes(),
            key.sign(message).to_bytes(),
        )
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.signature
    }
}

impl Primitive for Ed25519Sha256 {
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
        let pk = VerifyingKey::from_bytes(&self.public_key).map_err(|_| Error::InvalidSignature)?;
        let sig = Signature::from_bytes(&self.signature);
        // Strict: small-order keys and non-canonical encodings never verify.
        pk.verify_strict(message, &sig)
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
    let (public_key, signature) = payload.split_at(PUBLIC_KEY_LENGTH);
    let mut pk = [0u8; PUBLIC_KEY_LENGTH];
    pk.copy_from_slice(public_key);
    let mut sig = [0u8; SIGNATURE_LENGTH];
    sig.copy_from_slice(signature);
    Ok(Ed25519Sha256::new(pk, sig).into())
}
