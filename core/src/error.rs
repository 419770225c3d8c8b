use thiserror::Error;

/// Errors raised while decoding, validating or verifying crypto-conditions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("unknown condition type: {0}")]
    UnknownType(u16),

    #[error("condition type {0} is already registered")]
    DuplicateType(u16),

    #[error("malformed condition URI: {0}")]
    MalformedUri(String),

    #[error("malformed fulfillment URI: {0}")]
    MalformedFulfillment(String),

    #[error("malformed binary encoding: {0}")]
    MalformedBinary(&'static str),

    /// The type-specific payload could not be decoded.
    #[error("cannot decode {type_name} payload: {reason}")]
    PayloadDecode {
        type_name: &'static str,
        reason: String,
    },

    #[error("threshold {threshold} is out of range for {subconditions} subconditions")]
    InvalidThreshold {
        threshold: usize,
        subconditions: usize,
    },

    #[error("{0} does not fit its numeric range")]
    NumericOverflow(&'static str),

    #[error("input truncated")]
    TruncatedInput,

    #[error("{0} trailing bytes after encoded value")]
    TrailingData(usize),

    #[error("invalid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("bitmask {0:#x} too large to be safely represented")]
    BitmaskTooLarge(u32),

    #[error("condition requested unsupported feature suites {unsupported:#x} (bitmask {bitmask:#x})")]
    UnsupportedFeature { bitmask: u32, unsupported: u32 },

    #[error("fulfillment length {length} exceeds maximum {max}")]
    FulfillmentTooLarge { length: u64, max: u64 },

    #[error("structure nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("threshold node has {count} subconditions, maximum is {max}")]
    TooManySubconditions { count: usize, max: usize },

    #[error("signature verification failed")]
    InvalidSignature,

    /// Fewer than the required number of genuine subfulfillments were supplied.
    #[error("needed at least {required} fulfillments, but only {satisfied} were provided")]
    ThresholdNotMet { required: usize, satisfied: usize },

    #[error("fulfillment does not match condition")]
    ConditionMismatch,
}

/// Coarse classification of an [`Error`].
///
/// Lets callers tell garbage input apart from inputs that are well-formed
/// but outside local policy, and both apart from a proof that simply does
/// not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Input is not a well-formed crypto-condition at all.
    Malformed,
    /// Well-formed, but exceeds locally supported features or limits.
    Policy,
    /// Well-formed and within policy, but the proof does not hold.
    ProofFailure,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownType(_)
            | Self::DuplicateType(_)
            | Self::MalformedUri(_)
            | Self::MalformedFulfillment(_)
            | Self::MalformedBinary(_)
            | Self::PayloadDecode { .. }
            | Self::InvalidThreshold { .. }
            | Self::NumericOverflow(_)
            | Self::TruncatedInput
            | Self::TrailingData(_)
            | Self::Base64(_) => ErrorClass::Malformed,
            Self::BitmaskTooLarge(_)
            | Self::UnsupportedFeature { .. }
            | Self::FulfillmentTooLarge { .. }
            | Self::NestingTooDeep(_)
            | Self::TooManySubconditions { .. } => ErrorClass::Policy,
            Self::InvalidSignature | Self::ThresholdNotMet { .. } | Self::ConditionMismatch => {
                ErrorClass::ProofFailure
            }
        }
    }

    /// Whether this error is an ordinary "does not fulfill" outcome.
    pub fn is_proof_failure(&self) -> bool {
        self.class() == ErrorClass::ProofFailure
    }

    pub(crate) fn payload(type_name: &'static str, reason: impl Into<String>) -> Self {
        Self::PayloadDecode {
            type_name,
            reason: reason.into(),
        }
    }
}
