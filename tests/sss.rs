use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use shamir::sss::{combine, combine_shares, split, split_secret};
use shamir::{ConsistencyError, DecodeError, Share, ShamirError};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_threshold_subset_recovers_secret(
        secret in prop::collection::vec(any::<u8>(), 1..64),
        threshold in 2usize..8,
        extra in 0usize..5,
        seed in any::<u64>(),
        pick in any::<u64>(),
    ) {
        let total = threshold + extra;
        let mut rng = StdRng::seed_from_u64(seed);
        let shares = split_secret(&secret, threshold, total, &mut rng).unwrap();
        prop_assert_eq!(shares.len(), total);

        // rotate and stride through the shares to pick an arbitrary subset
        let start = (pick as usize) % total;
        let subset: Vec<Share> = (0..threshold)
            .map(|k| shares[(start + k) % total].clone())
            .collect();
        prop_assert_eq!(combine_shares(&subset).unwrap(), secret.clone());

        // more than threshold shares work just as well
        prop_assert_eq!(combine_shares(&shares).unwrap(), secret);
    }

    #[test]
    fn tokens_survive_decoding(
        secret in prop::collection::vec(any::<u8>(), 1..32),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        for share in split_secret(&secret, 2, 4, &mut rng).unwrap() {
            let token = share.encode();
            prop_assert_eq!(token.len(), 3 + 2 * secret.len());
            prop_assert_eq!(token.parse::<Share>().unwrap(), share.clone());
            prop_assert_eq!(token.to_uppercase().parse::<Share>().unwrap(), share);
        }
    }

    #[test]
    fn flipped_header_character_is_rejected(
        secret in prop::collection::vec(any::<u8>(), 1..16),
        replacement in "[g-z]",
        position in 0usize..3,
    ) {
        let tokens = split(&secret, 2, 2, &mut rand::rngs::OsRng).unwrap();
        let mut broken = tokens[0].clone();
        broken.replace_range(position..position + 1, &replacement);

        prop_assert!(broken.parse::<Share>().is_err());
        let is_decode_error = matches!(
            combine(&[broken.as_str(), tokens[1].as_str()]),
            Err(ShamirError::Decode { index: 0, .. })
        );
        prop_assert!(is_decode_error);
    }
}

#[test]
fn every_pair_recovers_hi() {
    let tokens = split(&[0x48, 0x49], 2, 3, &mut rand::rngs::OsRng).unwrap();

    for (a, b) in [(0, 1), (0, 2), (1, 2)] {
        assert_eq!(combine(&[&tokens[a], &tokens[b]]).unwrap(), vec![0x48, 0x49]);
        assert_eq!(combine(&[&tokens[b], &tokens[a]]).unwrap(), vec![0x48, 0x49]);
    }
}

#[test]
fn fresh_randomness_gives_fresh_shares() {
    let secret = b"same secret twice";
    let first = split(secret, 3, 5, &mut rand::rngs::OsRng).unwrap();
    let second = split(secret, 3, 5, &mut rand::rngs::OsRng).unwrap();

    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a[..3], b[..3]);
        assert_ne!(a, b);
    }
}

#[test]
fn truncated_token_is_rejected() {
    let tokens = split(b"truncate me", 2, 2, &mut rand::rngs::OsRng).unwrap();
    let truncated = &tokens[0][..tokens[0].len() - 1];

    assert!(matches!(
        combine(&[truncated, tokens[1].as_str()]),
        Err(ShamirError::Decode {
            index: 0,
            source: DecodeError::InvalidHex(_)
        })
    ));

    let shortened = &tokens[0][..tokens[0].len() - 2];
    assert!(matches!(
        combine(&[shortened, tokens[1].as_str()]),
        Err(ShamirError::Consistency(ConsistencyError::LengthMismatch { .. }))
    ));
}

#[test]
fn shares_from_different_splits_do_not_mix() {
    let a = split(b"first secret", 2, 3, &mut rand::rngs::OsRng).unwrap();
    let b = split(b"second", 2, 3, &mut rand::rngs::OsRng).unwrap();

    assert!(matches!(
        combine(&[&a[0], &b[1]]),
        Err(ShamirError::Consistency(ConsistencyError::LengthMismatch { .. }))
    ));
}

#[test]
fn duplicate_token_is_rejected() {
    let tokens = split(b"dup", 2, 3, &mut rand::rngs::OsRng).unwrap();

    assert!(matches!(
        combine(&[&tokens[2], &tokens[2]]),
        Err(ShamirError::Consistency(ConsistencyError::DuplicateId(3)))
    ));
}

#[test]
fn tokens_with_different_field_widths_do_not_mix() {
    assert!(matches!(
        combine(&["801ab", "a02cd"]),
        Err(ShamirError::Consistency(ConsistencyError::FieldWidthMismatch {
            id: 2,
            expected: 8,
            found: 10
        }))
    ));
    assert!(matches!(
        combine(&["401ab", "402cd"]),
        Err(ShamirError::Consistency(ConsistencyError::UnsupportedFieldWidth(4)))
    ));
    assert!(matches!(
        combine(&["801ab", "002cd"]),
        Err(ShamirError::Decode {
            index: 1,
            source: DecodeError::UnsupportedFieldWidth(0)
        })
    ));
}
