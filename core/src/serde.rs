/// Serde helper to (de)serialize a [`Condition`] as a tagged JSON object
/// with a base58 hash:
///
/// ```json
/// {"type":"condition","type_id":0,"bitmask":3,"hash":"...","max_fulfillment_length":5}
/// ```
///
/// The plain `Serialize` impl of [`Condition`] uses the URI string; use
/// this module with `#[serde(with = "...")]` where the object form is
/// expected.
///
/// [`Condition`]: crate::Condition
#[cfg(feature = "json")]
pub mod condition_object {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use crate::condition::Condition;
    use crate::limits::MAX_FINGERPRINT_LENGTH;

    #[derive(Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Tagged {
        Condition {
            type_id: u16,
            bitmask: u32,
            hash: String,
            max_fulfillment_length: u64,
        },
    }

    pub fn serialize<S>(condition: &Condition, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Tagged::Condition {
            type_id: condition.type_id(),
            bitmask: condition.bitmask(),
            hash: bs58::encode(condition.fingerprint()).into_string(),
            max_fulfillment_length: condition.max_fulfillment_length(),
        }
        .serialize(s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Condition, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Tagged::Condition {
            type_id,
            bitmask,
            hash,
            max_fulfillment_length,
        } = Tagged::deserialize(d)?;
        let fingerprint = bs58::decode(&hash).into_vec().map_err(de::Error::custom)?;
        if fingerprint.len() > MAX_FINGERPRINT_LENGTH {
            return Err(de::Error::custom(format!(
                "fingerprint of {} bytes exceeds {MAX_FINGERPRINT_LENGTH}",
                fingerprint.len()
            )));
        }
        Ok(Condition::new(
            type_id,
            bitmask,
            fingerprint,
            max_fulfillment_length,
        ))
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::condition_object;
    use crate::condition::Condition;

    const HELLO: &str = "cc:0:3:LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ:5";

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Output {
        amount: u64,
        #[serde(with = "condition_object")]
        condition: Condition,
    }

    #[test]
    fn object_form_roundtrip() {
        let output = Output {
            amount: 7,
            condition: Condition::parse_uri(HELLO).unwrap(),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["condition"]["type"], "condition");
        assert_eq!(json["condition"]["type_id"], 0);
        assert_eq!(json["condition"]["bitmask"], 3);
        assert_eq!(json["condition"]["max_fulfillment_length"], 5);
        assert_eq!(
            json["condition"]["hash"],
            bs58::encode(output.condition.fingerprint()).into_string()
        );

        let back: Output = serde_json::from_value(json).unwrap();
        assert_eq!(back, output);
    }

    #[test]
    fn object_form_rejects_bad_input() {
        let wrong_tag = r#"{"amount":1,"condition":{"type":"fulfillment","type_id":0,"bitmask":3,"hash":"1","max_fulfillment_length":5}}"#;
        assert!(serde_json::from_str::<Output>(wrong_tag).is_err());

        // '0' is not in the base58 alphabet
        let bad_hash = r#"{"amount":1,"condition":{"type":"condition","type_id":0,"bitmask":3,"hash":"0OIl","max_fulfillment_length":5}}"#;
        assert!(serde_json::from_str::<Output>(bad_hash).is_err());

        let long_hash = format!(
            r#"{{"amount":1,"condition":{{"type":"condition","type_id":0,"bitmask":3,"hash":"{}","max_fulfillment_length":5}}}}"#,
            bs58::encode([0xffu8; 65]).into_string()
        );
        assert!(serde_json::from_str::<Output>(&long_hash).is_err());
    }
}
