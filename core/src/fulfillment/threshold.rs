use tracing::trace;

use crate::condition::Condition;
use crate::encoding::{var_bytes_len, var_uint_len, Reader, Writer};
use crate::error::Error;
use crate::registry::{features, Arity, HashAlgorithm, TypeDescriptor, THRESHOLD_SHA256};
use crate::Result;

use super::{fulfillment_binary_bound, Context, Fulfillment, Primitive};

pub const DESCRIPTOR: TypeDescriptor = TypeDescriptor {
    type_id: THRESHOLD_SHA256,
    name: "threshold-sha-256",
    feature_bits: features::SHA_256 | features::THRESHOLD,
    arity: Arity::Many,
    hash: HashAlgorithm::Sha256,
    decode,
};

const CONDITION_TAG: u8 = 0x00;
const FULFILLMENT_TAG: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Subcondition {
    condition: Condition,
    /// Binary form of `condition`; the canonical sort key.
    key: Vec<u8>,
    fulfillment: Option<Fulfillment>,
    /// Binary form of `fulfillment`, empty for placeholders.
    encoded: Vec<u8>,
}

impl Subcondition {
    fn is_fulfilled(&self) -> bool {
        self.fulfillment.is_some()
    }

    fn placeholder_len(&self) -> Result<u64> {
        Ok(1 + var_bytes_len(self.key.len() as u64)?)
    }

    fn fulfillment_len(&self) -> Result<u64> {
        Ok(1 + var_bytes_len(self.encoded.len() as u64)?)
    }
}

/// N-of-M threshold fulfillment.
///
/// Satisfied when at least `threshold` of its subconditions carry a
/// genuine subfulfillment; the rest are present only as conditions.
/// Subconditions are kept sorted by their binary encoding, so the derived
/// condition depends on the set of subconditions and the threshold, never
/// on insertion order or on which subset happens to be fulfilled.
///
/// # Example
///
/// ```
/// use cryptoconditions_core::{Fulfillment, PreimageSha256, ThresholdSha256};
///
/// let a: Fulfillment = PreimageSha256::new(b"a".to_vec()).into();
/// let b: Fulfillment = PreimageSha256::new(b"b".to_vec()).into();
///
/// let mut threshold = ThresholdSha256::new(1);
/// threshold.add_subfulfillment(a).unwrap();
/// threshold.add_subcondition(b.condition().unwrap());
///
/// let fulfillment = Fulfillment::from(threshold);
/// assert!(fulfillment.validate(b"").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdSha256 {
    threshold: usize,
    subconditions: Vec<Subcondition>,
}

impl ThresholdSha256 {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            subconditions: Vec::new(),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of subconditions, fulfilled or not.
    pub fn len(&self) -> usize {
        self.subconditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subconditions.is_empty()
    }

    /// Subconditions in canonical order.
    pub fn subconditions(&self) -> impl Iterator<Item = &Condition> {
        self.subconditions.iter().map(|s| &s.condition)
    }

    /// Genuine subfulfillments in canonical order.
    pub fn subfulfillments(&self) -> impl Iterator<Item = &Fulfillment> {
        self.subconditions
            .iter()
            .filter_map(|s| s.fulfillment.as_ref())
    }

    pub fn fulfilled_count(&self) -> usize {
        self.subconditions.iter().filter(|s| s.is_fulfilled()).count()
    }

    /// Adds a branch with a genuine proof.
    pub fn add_subfulfillment(&mut self, fulfillment: Fulfillment) -> Result<()> {
        let condition = fulfillment.condition()?;
        self.insert(condition, Some(fulfillment));
        Ok(())
    }

    /// Adds a branch known only by its condition.
    pub fn add_subcondition(&mut self, condition: Condition) {
        self.insert(condition, None);
    }

    pub fn with_subfulfillment(mut self, fulfillment: Fulfillment) -> Result<Self> {
        self.add_subfulfillment(fulfillment)?;
        Ok(self)
    }

    pub fn with_subcondition(mut self, condition: Condition) -> Self {
        self.add_subcondition(condition);
        self
    }

    /// Inserts in canonical order and returns the position taken.
    fn insert(&mut self, condition: Condition, fulfillment: Option<Fulfillment>) -> usize {
        let key = condition.to_binary();
        let encoded = fulfillment
            .as_ref()
            .map(Fulfillment::to_binary)
            .unwrap_or_default();
        let order = (key.as_slice(), fulfillment.is_some(), encoded.as_slice());
        let at = self.subconditions.partition_point(|s| {
            (s.key.as_slice(), s.is_fulfilled(), s.encoded.as_slice()) <= order
        });
        self.subconditions.insert(
            at,
            Subcondition {
                condition,
                key,
                fulfillment,
                encoded,
            },
        );
        at
    }

    fn check_structure(&self) -> Result<()> {
        if self.threshold == 0 || self.threshold > self.subconditions.len() {
            return Err(Error::InvalidThreshold {
                threshold: self.threshold,
                subconditions: self.subconditions.len(),
            });
        }
        Ok(())
    }

    /// Which subconditions the encoding carries a proof for: the
    /// `threshold` proofs that add the fewest bytes over a placeholder.
    fn encoded_proofs(&self) -> Vec<bool> {
        let mut fulfilled: Vec<(usize, i64)> = self
            .subconditions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_fulfilled())
            .map(|(i, s)| (i, s.encoded.len() as i64 - s.key.len() as i64))
            .collect();
        fulfilled.sort_by_key(|&(i, cost)| (cost, i));

        let mut carried = vec![false; self.subconditions.len()];
        for (i, _) in fulfilled.into_iter().take(self.threshold) {
            carried[i] = true;
        }
        carried
    }
}

impl Primitive for ThresholdSha256 {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &DESCRIPTOR
    }

    fn fingerprint_contents(&self) -> Result<Vec<u8>> {
        self.check_structure()?;
        let mut w = Writer::new();
        w.write_var_uint(self.threshold as u64);
        w.write_var_uint(self.subconditions.len() as u64);
        for s in &self.subconditions {
            w.write_bytes(&s.key);
        }
        Ok(w.into_bytes())
    }

    fn subcondition_bitmask(&self) -> u32 {
        self.subconditions
            .iter()
            .fold(0, |mask, s| mask | s.condition.bitmask())
    }

    /// Bound over every satisfying subset: all branches as placeholders,
    /// plus the `threshold` largest growths from swapping a placeholder for
    /// a worst-case subfulfillment.
    fn max_fulfillment_length(&self) -> Result<u64> {
        let overflow = || Error::NumericOverflow("max fulfillment length");

        let mut total =
            (var_uint_len(self.threshold as u64) + var_uint_len(self.subconditions.len() as u64))
                as u64;
        let mut growths = Vec::with_capacity(self.subconditions.len());
        for s in &self.subconditions {
            let placeholder = s.placeholder_len()?;
            let bound = fulfillment_binary_bound(s.condition.max_fulfillment_length())?;
            let worst = 1 + var_bytes_len(bound)?;
            total = total.checked_add(placeholder).ok_or_else(overflow)?;
            growths.push(worst.saturating_sub(placeholder));
        }
        growths.sort_unstable_by(|a, b| b.cmp(a));
        growths
            .into_iter()
            .take(self.threshold)
            .try_fold(total, |acc, g| acc.checked_add(g))
            .ok_or_else(overflow)
    }

    fn write_payload(&self, w: &mut Writer) {
        w.write_var_uint(self.threshold as u64);
        w.write_var_uint(self.subconditions.len() as u64);
        for (s, carried) in self.subconditions.iter().zip(self.encoded_proofs()) {
            if carried {
                w.write_u8(FULFILLMENT_TAG);
                w.write_var_bytes(&s.encoded);
            } else {
                w.write_u8(CONDITION_TAG);
                w.write_var_bytes(&s.key);
            }
        }
    }

    fn validate(&self, message: &[u8], ctx: &Context<'_>) -> Result<()> {
        self.check_structure()?;
        let max = ctx.limits().max_subconditions;
        if self.subconditions.len() > max {
            return Err(Error::TooManySubconditions {
                count: self.subconditions.len(),
                max,
            });
        }
        let child = ctx.descend()?;

        let satisfied = self.fulfilled_count();
        if satisfied < self.threshold {
            return Err(Error::ThresholdNotMet {
                required: self.threshold,
                satisfied,
            });
        }
        self.subfulfillments()
            .try_for_each(|f| f.validate_in(message, &child))
    }
}

fn decode(payload: &[u8], ctx: &Context<'_>) -> Result<Fulfillment> {
    let mut r = Reader::new(payload);
    let threshold = r.read_var_uint()?;
    let count = r.read_var_uint()?;

    let max = ctx.limits().max_subconditions;
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    if count > max {
        return Err(Error::TooManySubconditions { count, max });
    }
    let threshold = usize::try_from(threshold).unwrap_or(usize::MAX);
    if threshold == 0 || threshold > count {
        return Err(Error::payload(
            DESCRIPTOR.name,
            format!("threshold {threshold} out of range for {count} subconditions"),
        ));
    }

    let child = ctx.descend()?;
    let mut node = ThresholdSha256::new(threshold);
    for _ in 0..count {
        let tag = r.read_u8()?;
        let body = r.read_var_bytes()?;
        let at = match tag {
            CONDITION_TAG => node.insert(Condition::from_binary(body)?, None),
            FULFILLMENT_TAG => {
                let fulfillment = Fulfillment::from_binary_in(body, &child)?;
                node.insert(fulfillment.condition()?, Some(fulfillment))
            }
            other => {
                return Err(Error::payload(
                    DESCRIPTOR.name,
                    format!("unknown entry tag {other:#04x}"),
                ))
            }
        };
        // Each entry must sort at or after the previous one.
        if at + 1 != node.len() {
            return Err(Error::payload(
                DESCRIPTOR.name,
                "entries not in canonical order",
            ));
        }
    }
    r.finish()?;

    if node.fulfilled_count() > threshold {
        return Err(Error::payload(
            DESCRIPTOR.name,
            format!(
                "{} subfulfillments for threshold {threshold}",
                node.fulfilled_count()
            ),
        ));
    }
    trace!(
        threshold,
        count,
        depth = ctx.depth(),
        "decoded threshold node"
    );
    Ok(node.into())
}
