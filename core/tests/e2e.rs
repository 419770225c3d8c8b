use cryptoconditions_core::registry::{features, PREIMAGE_SHA256, THRESHOLD_SHA256};
use cryptoconditions_core::{
    verify, Condition, Ed25519Sha256, Error, ErrorClass, Fulfillment, Limits, PrefixSha256,
    PreimageSha256, Registry, Result, Secp256k1Sha256, ThresholdSha256, Verifier,
    MAX_FULFILLMENT_LENGTH, MAX_SAFE_BITMASK,
};
use sha2::{Digest, Sha256};

fn assert_err<T: std::fmt::Debug>(res: Result<T>, expected: Error) {
    match res {
        Err(e) => assert_eq!(e, expected),
        Ok(v) => panic!("Expected error, got Ok({v:?})"),
    }
}

fn preimage(bytes: &[u8]) -> Fulfillment {
    PreimageSha256::new(bytes.to_vec()).into()
}

#[test]
fn preimage_scenario() {
    let fulfillment = preimage(b"hello");
    let condition_uri = fulfillment.condition().unwrap().to_uri();

    let condition = Condition::parse_uri(&condition_uri).unwrap();
    assert_eq!(condition.type_id(), PREIMAGE_SHA256);
    assert_eq!(condition.fingerprint(), Sha256::digest(b"hello").as_slice());
    assert_eq!(condition, Condition::derive_from(&fulfillment).unwrap());

    assert!(verify(&fulfillment.to_uri(), &condition_uri, b"").unwrap());
    assert!(!verify(&preimage(b"hellx").to_uri(), &condition_uri, b"").unwrap());
}

#[test]
fn two_of_three_scenario() {
    let (a, b, c) = (preimage(b"A"), preimage(b"B"), preimage(b"C"));

    let build = |first: &Fulfillment, second: &Fulfillment| -> Fulfillment {
        ThresholdSha256::new(2)
            .with_subfulfillment(first.clone())
            .unwrap()
            .with_subfulfillment(second.clone())
            .unwrap()
            .with_subcondition(c.condition().unwrap())
            .into()
    };
    let ab = build(&a, &b);
    let ba = build(&b, &a);
    assert_eq!(ab.condition().unwrap(), ba.condition().unwrap());
    assert_eq!(ab.condition().unwrap().type_id(), THRESHOLD_SHA256);

    let lock = ab.condition().unwrap().to_uri();
    assert!(verify(&ab.to_uri(), &lock, b"").unwrap());
    assert!(verify(&ba.to_uri(), &lock, b"").unwrap());

    let three_needed: Fulfillment = ThresholdSha256::new(3)
        .with_subfulfillment(a)
        .unwrap()
        .with_subfulfillment(b)
        .unwrap()
        .with_subcondition(c.condition().unwrap())
        .into();
    assert_err(
        three_needed.validate(b""),
        Error::ThresholdNotMet {
            required: 3,
            satisfied: 2,
        },
    );
}

#[test]
fn ledger_style_multisig() {
    use k256::ecdsa::SigningKey as SecpKey;

    let alice = ed25519_dalek::SigningKey::from_bytes(&[0xa1; 32]);
    let bob = SecpKey::from_slice(&[0xb0; 32]).unwrap();
    let carol = ed25519_dalek::SigningKey::from_bytes(&[0xc3; 32]);
    let tx_body = br#"{"operation":"TRANSFER","asset":"42"}"#;

    // the issuer only knows public keys; placeholders stand in for the signatures
    let carol_condition = Fulfillment::from(Ed25519Sha256::sign(&carol, b"anything"))
        .condition()
        .unwrap();
    let spend: Fulfillment = ThresholdSha256::new(2)
        .with_subfulfillment(Ed25519Sha256::sign(&alice, tx_body).into())
        .unwrap()
        .with_subfulfillment(Secp256k1Sha256::sign(&bob, tx_body).into())
        .unwrap()
        .with_subcondition(carol_condition)
        .into();
    let lock = spend.condition().unwrap();
    assert_eq!(
        lock.bitmask(),
        features::SHA_256 | features::THRESHOLD | features::ED25519 | features::SECP256K1
    );
    assert!(lock.validate().is_ok());

    let lock_uri = lock.to_uri();
    assert!(verify(&spend.to_uri(), &lock_uri, tx_body).unwrap());
    assert!(!verify(&spend.to_uri(), &lock_uri, b"different body").unwrap());
}

#[test]
fn prefixed_signature() {
    let key = ed25519_dalek::SigningKey::from_bytes(&[0x11; 32]);
    let sub = Ed25519Sha256::sign(&key, b"ledger-a:payload").into();
    let f: Fulfillment = PrefixSha256::new(b"ledger-a:".to_vec(), sub).unwrap().into();
    let lock = f.condition().unwrap().to_uri();
    assert!(verify(&f.to_uri(), &lock, b"payload").unwrap());
    assert!(!verify(&f.to_uri(), &lock, b"ledger-a:payload").unwrap());
}

#[test]
fn error_classes_at_the_boundary() {
    let f = preimage(b"hello");
    let lock = f.condition().unwrap().to_uri();

    let garbage = verify("not-a-fulfillment", &lock, b"").unwrap_err();
    assert_eq!(garbage.class(), ErrorClass::Malformed);

    let unknown = verify("cf:3:AAAA", &lock, b"").unwrap_err();
    assert_eq!(unknown, Error::UnknownType(3));

    let strict = Verifier::new(
        Registry::global(),
        Limits {
            max_fulfillment_length: 4,
            ..Limits::default()
        },
    );
    let policy = strict.verify(&f.to_uri(), &lock, b"").unwrap_err();
    assert_eq!(policy.class(), ErrorClass::Policy);

    // proof failures are not errors
    assert_eq!(verify(&preimage(b"x").to_uri(), &lock, b""), Ok(false));
}

#[test]
fn boundaries() {
    let permissive = Limits {
        supported_bitmask: MAX_SAFE_BITMASK,
        ..Limits::default()
    };
    assert!(Condition::new(2, MAX_SAFE_BITMASK, vec![1; 32], 1)
        .validate_with(&permissive)
        .is_ok());
    assert_err(
        Condition::new(2, MAX_SAFE_BITMASK + 1, vec![1; 32], 1).validate_with(&permissive),
        Error::BitmaskTooLarge(MAX_SAFE_BITMASK + 1),
    );

    let at_max = preimage(&vec![0u8; MAX_FULFILLMENT_LENGTH as usize]);
    let lock = at_max.condition().unwrap().to_uri();
    assert!(verify(&at_max.to_uri(), &lock, b"").unwrap());

    let over = preimage(&vec![0u8; MAX_FULFILLMENT_LENGTH as usize + 1]);
    assert_err(
        verify(&over.to_uri(), &lock, b""),
        Error::FulfillmentTooLarge {
            length: MAX_FULFILLMENT_LENGTH + 1,
            max: MAX_FULFILLMENT_LENGTH,
        },
    );
}

#[test]
fn narrowed_node() {
    // a node that only understands hashlocks refuses signature conditions
    let mut registry = Registry::empty();
    registry
        .register(cryptoconditions_core::fulfillment::preimage::DESCRIPTOR)
        .unwrap();
    let limits = Limits {
        supported_bitmask: registry.supported_bitmask(),
        ..Limits::default()
    };
    let verifier = Verifier::new(&registry, limits);

    let key = ed25519_dalek::SigningKey::from_bytes(&[0x22; 32]);
    let f = Fulfillment::from(Ed25519Sha256::sign(&key, b"m"));
    let lock = f.condition().unwrap().to_uri();
    assert_err(
        verifier.verify(&f.to_uri(), &lock, b"m"),
        Error::UnsupportedFeature {
            bitmask: 0x21,
            unsupported: 0x20,
        },
    );

    let hashlock = preimage(b"ok");
    let hashlock_lock = hashlock.condition().unwrap().to_uri();
    assert!(verifier.verify(&hashlock.to_uri(), &hashlock_lock, b"").unwrap());
}

#[cfg(feature = "json")]
#[test]
fn json_transaction_output() {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Output {
        amount: u64,
        condition: Condition,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Input {
        fulfillment: Fulfillment,
    }

    let f = preimage(b"secret");
    let output = Output {
        amount: 10,
        condition: f.condition().unwrap(),
    };
    let json = serde_json::to_string(&output).unwrap();
    let back: Output = serde_json::from_str(&json).unwrap();
    assert_eq!(back, output);

    let input: Input =
        serde_json::from_str(&format!(r#"{{"fulfillment":"{}"}}"#, f.to_uri())).unwrap();
    assert!(Verifier::default()
        .verify_parsed(&input.fulfillment, &back.condition, b"")
        .unwrap());
}
