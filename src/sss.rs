use rand::{CryptoRng, RngCore};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::constants::{FIELD_BITS, MAX_SHARES, MAX_THRESHOLD, MIN_SHARES, MIN_THRESHOLD};
use crate::error::{ConfigError, ConsistencyError, Result, ShamirError};
use crate::field::FieldElement;
use crate::polynomial::{interpolate, Polynomial};
use crate::share::Share;

/// Validated split parameters.
///
/// `threshold` is in `2..=254`, `shares` in `2..=255` and `threshold <= shares`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
    threshold: usize,
    shares: usize,
}

impl SplitConfig {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first violated bound.
    pub fn new(threshold: usize, shares: usize) -> std::result::Result<Self, ConfigError> {
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        if !(MIN_SHARES..=MAX_SHARES).contains(&shares) {
            return Err(ConfigError::SharesOutOfRange(shares));
        }
        if threshold > shares {
            return Err(ConfigError::ThresholdExceedsShares { threshold, shares });
        }
        Ok(SplitConfig { threshold, shares })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn shares(&self) -> usize {
        self.shares
    }
}

/// Splits a secret into a specified number of shares using Shamir's Secret Sharing Scheme.
///
/// Every byte of the secret gets its own polynomial of degree `threshold - 1`
/// with fresh random coefficients. Share `i` holds the evaluations of all of
/// them at `x = i`, for `i` in `1..=shares`.
///
/// # Arguments
/// * `secret` - A byte slice representing the secret to be split. Must not be empty.
/// * `threshold` - The minimum number of shares required to reconstruct the secret.
/// * `shares` - The total number of shares to be created.
/// * `rng` - A cryptographically secure random source, `rand::rngs::OsRng` in production.
///
/// # Returns
/// The shares, ordered by id.
///
/// # Errors
/// * [`ShamirError::Config`] for an empty secret or out-of-range parameters,
///   before any randomness is drawn.
/// * [`ShamirError::Entropy`] if the random source fails.
///
/// # Examples
/// ```rust
/// use shamir::sss::{combine_shares, split_secret};
///
/// let secret = b"hello world";
/// let shares = split_secret(secret, 3, 5, &mut rand::rngs::OsRng).unwrap();
/// assert_eq!(shares.len(), 5);
/// assert_eq!(combine_shares(&shares[1..4]).unwrap(), secret);
/// ```
pub fn split_secret<R: RngCore + CryptoRng>(
    secret: &[u8],
    threshold: usize,
    shares: usize,
    rng: &mut R,
) -> Result<Vec<Share>> {
    let config = SplitConfig::new(threshold, shares)?;
    if secret.is_empty() {
        return Err(ConfigError::EmptySecret.into());
    }

    let mut polynomials = Vec::with_capacity(secret.len());
    for &byte in secret {
        polynomials.push(Polynomial::generate(
            FieldElement::new(byte),
            config.threshold(),
            rng,
        )?);
    }

    let shares = evaluate_shares(&polynomials, config.shares());
    debug!(
        "split {} bytes into {} shares with threshold {}",
        secret.len(),
        config.shares(),
        config.threshold()
    );

    Ok(shares)
}

/// Splits a secret and encodes every share as a text token.
///
/// See [`split_secret`].
pub fn split<R: RngCore + CryptoRng>(
    secret: &[u8],
    threshold: usize,
    shares: usize,
    rng: &mut R,
) -> Result<Vec<String>> {
    Ok(split_secret(secret, threshold, shares, rng)?
        .iter()
        .map(Share::encode)
        .collect())
}

fn evaluate_shares(polynomials: &[Polynomial], count: usize) -> Vec<Share> {
    let build = |index: usize| {
        let id = (index + 1) as u8;
        let x = FieldElement::new(id);
        let data = polynomials.iter().map(|p| u8::from(p.evaluate(x))).collect();
        Share::new(id, data)
    };

    #[cfg(feature = "parallel")]
    let shares: Vec<Share> = (0..count).into_par_iter().map(build).collect();

    #[cfg(not(feature = "parallel"))]
    let shares: Vec<Share> = (0..count).map(build).collect();

    shares
}

/// Checks that a set of shares can be interpolated together.
///
/// Returns the common payload length.
///
/// # Errors
/// * [`ConsistencyError::NotEnoughShares`] for fewer than two shares.
/// * [`ConsistencyError::ReservedId`] / [`ConsistencyError::DuplicateId`] for
///   ids that are zero or repeated.
/// * [`ConsistencyError::FieldWidthMismatch`] / [`ConsistencyError::LengthMismatch`]
///   when shares come from different splits.
/// * [`ConsistencyError::UnsupportedFieldWidth`] when all shares agree on a width other than 8.
/// * [`ConsistencyError::EmptyShare`] when shares carry no payload.
pub fn validate_shares(shares: &[Share]) -> std::result::Result<usize, ConsistencyError> {
    let first = match shares {
        [first, _, ..] => first,
        _ => return Err(ConsistencyError::NotEnoughShares(shares.len())),
    };

    let mut seen = [false; 256];
    for share in shares {
        if share.id == 0 {
            return Err(ConsistencyError::ReservedId);
        }
        if seen[share.id as usize] {
            return Err(ConsistencyError::DuplicateId(share.id));
        }
        seen[share.id as usize] = true;

        if share.bits != first.bits {
            return Err(ConsistencyError::FieldWidthMismatch {
                id: share.id,
                expected: first.bits,
                found: share.bits,
            });
        }
        if share.data.len() != first.data.len() {
            return Err(ConsistencyError::LengthMismatch {
                id: share.id,
                expected: first.data.len(),
                found: share.data.len(),
            });
        }
    }

    if first.bits != FIELD_BITS {
        return Err(ConsistencyError::UnsupportedFieldWidth(first.bits));
    }
    if first.data.is_empty() {
        return Err(ConsistencyError::EmptyShare(first.id));
    }

    Ok(first.data.len())
}

/// Combines shares to reconstruct a secret using Shamir's Secret Sharing Scheme.
///
/// The order of `shares` does not matter. Each byte is recovered by Lagrange
/// interpolation at `x = 0` over all supplied shares.
///
/// Only the structure of the set is validated. Combining fewer shares than the
/// threshold used at split time succeeds and returns bytes unrelated to the
/// secret; only the party that split the secret knows the threshold, so
/// supplying enough shares is the caller's responsibility.
///
/// # Errors
/// Returns [`ShamirError::Consistency`] when [`validate_shares`] rejects the set.
pub fn combine_shares(shares: &[Share]) -> Result<Vec<u8>> {
    let secret_length = validate_shares(shares)?;

    let recover =
        |position: usize| u8::from(interpolate(&points_at(shares, position), FieldElement::ZERO));

    #[cfg(feature = "parallel")]
    let secret: Vec<u8> = (0..secret_length).into_par_iter().map(recover).collect();

    #[cfg(not(feature = "parallel"))]
    let secret: Vec<u8> = (0..secret_length).map(recover).collect();

    debug!("combined {} shares into {} bytes", shares.len(), secret.len());
    Ok(secret)
}

/// The `(id, byte)` points of every share at one byte position.
fn points_at(shares: &[Share], position: usize) -> Vec<(FieldElement, FieldElement)> {
    shares
        .iter()
        .map(|s| (FieldElement::new(s.id), FieldElement::new(s.data[position])))
        .collect()
}

/// Decodes share tokens and combines them.
///
/// Whitespace inside the tokens is ignored, so clean renderings can be passed directly.
///
/// # Errors
/// * [`ShamirError::Decode`] carrying the position of the first malformed token.
/// * Everything [`combine_shares`] reports.
///
/// # Examples
/// ```rust
/// use shamir::sss::{combine, split};
///
/// let tokens = split(b"HI", 2, 3, &mut rand::rngs::OsRng).unwrap();
/// assert_eq!(combine(&[&tokens[2], &tokens[0]]).unwrap(), b"HI");
/// ```
pub fn combine<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<u8>> {
    let shares = decode_all(tokens)?;
    combine_shares(&shares)
}

fn decode_all<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Share>> {
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            Share::decode(token.as_ref()).map_err(|err| ShamirError::decode(index, err))
        })
        .collect()
}

/// Derives the share for an additional id from an existing set.
///
/// The new share lies on the same polynomials, so it combines with the
/// originals. At least `threshold` shares of the original split must be
/// supplied, otherwise the derived share is garbage.
///
/// # Errors
/// * [`ConfigError::InvalidShareId`] when `id` is 0 or larger than 255.
/// * [`ConsistencyError::DuplicateId`] when a supplied share already has `id`.
/// * Everything [`validate_shares`] reports.
pub fn new_share(id: usize, shares: &[Share]) -> Result<Share> {
    if id == 0 || id > MAX_SHARES {
        return Err(ConfigError::InvalidShareId(id).into());
    }
    let id = id as u8;

    let length = validate_shares(shares)?;
    if shares.iter().any(|s| s.id == id) {
        return Err(ConsistencyError::DuplicateId(id).into());
    }

    let x = FieldElement::new(id);
    let data = (0..length)
        .map(|position| u8::from(interpolate(&points_at(shares, position), x)))
        .collect();

    debug!("derived share {} from {} shares", id, shares.len());
    Ok(Share::new(id, data))
}

/// Token flavour of [`new_share`].
pub fn new_share_token<S: AsRef<str>>(id: usize, tokens: &[S]) -> Result<String> {
    let shares = decode_all(tokens)?;
    Ok(new_share(id, &shares)?.encode())
}

/// https://en.wikipedia.org/wiki/Proactive_secret_sharing#Mathematics
/// Refreshes the shares of a secret without changing the secret.
///
/// For every byte position a fresh polynomial with a zero constant term is
/// drawn and its evaluation added to every share. The refreshed shares are
/// returned with the same ids and the input is left as is. They combine to the
/// same secret, but not with shares from before the refresh.
///
/// # Arguments
///
/// * `shares` - Every outstanding share of the secret. Shares left out of the
///   refresh become useless.
/// * `threshold` - The threshold the shares were split with.
/// * `rng` - A cryptographically secure random source.
///
/// # Errors
///
/// * [`ShamirError::Config`] if `threshold` is out of range or exceeds the share count.
/// * [`ShamirError::Consistency`] if the shares do not form a valid set.
/// * [`ShamirError::Entropy`] if the random source fails.
pub fn refresh_shares<R: RngCore + CryptoRng>(
    shares: &[Share],
    threshold: usize,
    rng: &mut R,
) -> Result<Vec<Share>> {
    let length = validate_shares(shares)?;
    SplitConfig::new(threshold, shares.len())?;

    let mut polynomials = Vec::with_capacity(length);
    for _ in 0..length {
        polynomials.push(Polynomial::generate(FieldElement::ZERO, threshold, rng)?);
    }

    let refreshed = shares
        .iter()
        .map(|share| {
            let x = FieldElement::new(share.id);
            let data = share
                .data
                .iter()
                .zip(&polynomials)
                .map(|(&y, poly)| u8::from(FieldElement::new(y) + poly.evaluate(x)))
                .collect();
            Share::new(share.id, data)
        })
        .collect();

    debug!("refreshed {} shares", shares.len());
    Ok(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use rand::rngs::StdRng;
    use rand::seq::IteratorRandom;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    /// Replays a fixed byte stream. Only for asserting exact outputs.
    struct Replay(Vec<u8>);

    impl RngCore for Replay {
        fn next_u32(&mut self) -> u32 {
            next_replayed_u32(self)
        }
        fn next_u64(&mut self) -> u64 {
            next_replayed_u32(self) as u64
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.try_fill_bytes(dest).unwrap()
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            if dest.len() > self.0.len() {
                return Err(rand::Error::new("replay stream exhausted"));
            }
            let rest = self.0.split_off(dest.len());
            dest.copy_from_slice(&self.0);
            self.0 = rest;
            Ok(())
        }
    }

    impl CryptoRng for Replay {}

    fn next_replayed_u32(replay: &mut Replay) -> u32 {
        let mut bytes = [0u8; 4];
        replay.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    #[test]
    fn test_split_and_combine_secret() {
        let secret = "test secret";
        let shares = split_secret(secret.as_bytes(), 3, 5, &mut rng()).unwrap();
        let recovered = combine_shares(&shares).unwrap();

        assert_eq!(secret.as_bytes(), recovered.as_slice());
    }

    #[test]
    fn test_hi_scenario_every_pair() {
        let tokens = split(&[0x48, 0x49], 2, 3, &mut rand::rngs::OsRng).unwrap();
        assert_eq!(tokens.len(), 3);

        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            let recovered = combine(&[&tokens[a], &tokens[b]]).unwrap();
            assert_eq!(recovered, vec![0x48, 0x49]);
        }

        for token in &tokens {
            assert!(matches!(
                combine(&[token]),
                Err(ShamirError::Consistency(ConsistencyError::NotEnoughShares(1)))
            ));
        }
    }

    #[test]
    fn test_exact_shares_from_injected_randomness() {
        // f(x) = 0x48 + 0x01 x for "H" and 0x49 + 0x02 x for "I"
        let mut replay = Replay(vec![0x01, 0x02]);
        let tokens = split(b"HI", 2, 3, &mut replay).unwrap();

        assert_eq!(tokens, vec!["801494b", "8024a4d", "8034b4f"]);
    }

    #[test]
    fn test_invalid_threshold_and_share_count() {
        let secret = b"invalid params";
        let cases = [
            (0, 5, ConfigError::ThresholdOutOfRange(0)),
            (1, 5, ConfigError::ThresholdOutOfRange(1)),
            (255, 255, ConfigError::ThresholdOutOfRange(255)),
            (256, 255, ConfigError::ThresholdOutOfRange(256)),
            (2, 1, ConfigError::SharesOutOfRange(1)),
            (2, 256, ConfigError::SharesOutOfRange(256)),
            (6, 5, ConfigError::ThresholdExceedsShares { threshold: 6, shares: 5 }),
        ];

        for (threshold, shares, expected) in cases {
            match split_secret(secret, threshold, shares, &mut rng()) {
                Err(ShamirError::Config(err)) => assert_eq!(err, expected),
                other => panic!("{threshold}/{shares}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_config_errors_come_before_randomness() {
        let mut replay = Replay(vec![]);
        assert!(matches!(
            split_secret(b"x", 1, 3, &mut replay),
            Err(ShamirError::Config(_))
        ));
        assert!(matches!(
            split_secret(b"", 2, 3, &mut replay),
            Err(ShamirError::Config(ConfigError::EmptySecret))
        ));
    }

    #[test]
    fn test_entropy_failure_is_reported() {
        let mut replay = Replay(vec![0x01]);
        assert!(matches!(
            split_secret(b"HI", 2, 3, &mut replay),
            Err(ShamirError::Entropy(_))
        ));
    }

    #[test]
    fn test_boundary_configs() {
        let secret = b"edge";

        let shares = split_secret(secret, 2, 2, &mut rng()).unwrap();
        assert_eq!(combine_shares(&shares).unwrap(), secret);

        let shares = split_secret(secret, 254, 255, &mut rng()).unwrap();
        assert_eq!(shares.len(), 255);
        assert_eq!(combine_shares(&shares[..254]).unwrap(), secret);
        assert_eq!(combine_shares(&shares[1..]).unwrap(), secret);
    }

    #[test]
    fn test_single_byte_secret() {
        let shares = split_secret(&[0x00], 3, 4, &mut rng()).unwrap();
        assert!(shares.iter().all(|s| s.data.len() == 1));
        assert_eq!(combine_shares(&shares[1..]).unwrap(), vec![0x00]);
    }

    #[test]
    fn test_every_threshold_subset_recovers() {
        let secret = b"subset";
        let shares = split_secret(secret, 3, 6, &mut rng()).unwrap();

        for a in 0..6 {
            for b in a + 1..6 {
                for c in b + 1..6 {
                    let subset = [shares[c].clone(), shares[a].clone(), shares[b].clone()];
                    assert_eq!(combine_shares(&subset).unwrap(), secret);
                }
            }
        }
    }

    #[test]
    fn test_share_subset_combination() {
        let secret = "subset test";
        let threshold = 3;

        let shares = split_secret(secret.as_bytes(), threshold, 5, &mut rng()).unwrap();
        let mut rng = rng();
        let subset: Vec<Share> = shares
            .iter()
            .cloned()
            .choose_multiple(&mut rng, threshold);

        assert_eq!(combine_shares(&subset).unwrap(), secret.as_bytes());
    }

    #[test]
    fn test_should_fail_with_shares_below_threshold() {
        let secret = b"Remember what the dormouse said.";
        let threshold = 12;

        let shares = split_secret(secret, threshold, 30, &mut rng()).unwrap();
        let recovered = combine_shares(&shares[..threshold - 1]).unwrap();

        assert_eq!(recovered.len(), secret.len());
        assert_ne!(recovered.as_slice(), secret);
    }

    #[test]
    fn test_share_uniqueness_across_splits() {
        let secret = b"unique shares";
        let first = split_secret(secret, 3, 5, &mut rand::rngs::OsRng).unwrap();
        let second = split_secret(secret, 3, 5, &mut rand::rngs::OsRng).unwrap();

        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.id, b.id);
            assert_ne!(a.data, b.data);
        }
    }

    #[test]
    fn test_combine_rejects_duplicate_ids() {
        let shares = split_secret(b"duplicate ids", 2, 3, &mut rng()).unwrap();
        let result = combine_shares(&[shares[0].clone(), shares[0].clone()]);

        assert!(matches!(
            result,
            Err(ShamirError::Consistency(ConsistencyError::DuplicateId(1)))
        ));
    }

    #[test]
    fn test_combine_rejects_mixed_splits() {
        let short = split_secret(b"short", 2, 3, &mut rng()).unwrap();
        let long = split_secret(b"much longer", 2, 3, &mut rng()).unwrap();
        assert!(matches!(
            combine_shares(&[short[0].clone(), long[1].clone()]),
            Err(ShamirError::Consistency(ConsistencyError::LengthMismatch {
                id: 2,
                expected: 5,
                found: 11
            }))
        ));

        let mut other_width = short[1].clone();
        other_width.bits = 4;
        assert!(matches!(
            combine_shares(&[short[0].clone(), other_width]),
            Err(ShamirError::Consistency(ConsistencyError::FieldWidthMismatch {
                id: 2,
                expected: 8,
                found: 4
            }))
        ));
    }

    #[test]
    fn test_combine_rejects_unsupported_width_and_empty_payload() {
        let narrow = [
            Share { bits: 4, id: 1, data: vec![1] },
            Share { bits: 4, id: 2, data: vec![2] },
        ];
        assert!(matches!(
            combine_shares(&narrow),
            Err(ShamirError::Consistency(ConsistencyError::UnsupportedFieldWidth(4)))
        ));

        let empty = [Share::new(1, vec![]), Share::new(2, vec![])];
        assert!(matches!(
            combine_shares(&empty),
            Err(ShamirError::Consistency(ConsistencyError::EmptyShare(1)))
        ));

        let reserved = [Share::new(0, vec![1]), Share::new(2, vec![2])];
        assert!(matches!(
            combine_shares(&reserved),
            Err(ShamirError::Consistency(ConsistencyError::ReservedId))
        ));
    }

    #[test]
    fn test_combine_names_malformed_token() {
        let tokens = split(b"tokens", 2, 3, &mut rng()).unwrap();
        let mut broken = tokens[1].clone();
        broken.replace_range(4..5, "z");

        let result = combine(&[tokens[0].clone(), broken]);
        assert!(matches!(
            result,
            Err(ShamirError::Decode {
                index: 1,
                source: DecodeError::InvalidHex(_)
            })
        ));

        let truncated = &tokens[2][..2];
        assert!(matches!(
            combine(&[tokens[0].as_str(), truncated]),
            Err(ShamirError::Decode {
                index: 1,
                source: DecodeError::Truncated { len: 2 }
            })
        ));
    }

    #[test]
    fn test_combine_accepts_clean_rendering() {
        let secret = vec![0xabu8; 64];
        let shares = split_secret(&secret, 2, 2, &mut rng()).unwrap();
        let layout = crate::share::CleanLayout::default();
        let clean: Vec<String> = shares.iter().map(|s| s.render_clean(&layout)).collect();

        assert!(clean[0].contains('\n'));
        assert_eq!(combine(&clean).unwrap(), secret);
    }

    #[test]
    fn test_new_share_combines_with_originals() {
        let secret = b"replacement share";
        let shares = split_secret(secret, 3, 4, &mut rng()).unwrap();

        let fifth = new_share(5, &shares[..3]).unwrap();
        assert_eq!(fifth.id, 5);

        let subset = [shares[3].clone(), fifth, shares[0].clone()];
        assert_eq!(combine_shares(&subset).unwrap(), secret);

        let again = new_share(4, &shares[..3]).unwrap();
        assert_eq!(again, shares[3]);
    }

    #[test]
    fn test_new_share_rejects_bad_ids() {
        let shares = split_secret(b"ids", 2, 3, &mut rng()).unwrap();
        assert!(matches!(
            new_share(0, &shares),
            Err(ShamirError::Config(ConfigError::InvalidShareId(0)))
        ));
        assert!(matches!(
            new_share(256, &shares),
            Err(ShamirError::Config(ConfigError::InvalidShareId(256)))
        ));
        assert!(matches!(
            new_share(2, &shares),
            Err(ShamirError::Consistency(ConsistencyError::DuplicateId(2)))
        ));
    }

    #[test]
    fn test_new_share_token() {
        let tokens = split(b"token", 2, 2, &mut rng()).unwrap();
        let third = new_share_token(3, &tokens).unwrap();
        assert!(third.starts_with("803"));
        assert_eq!(combine(&[&third, &tokens[1]]).unwrap(), b"token");
    }

    #[test]
    fn test_refresh_shares() {
        let secret = "refresh test";
        let threshold = 3;

        let before = split_secret(secret.as_bytes(), threshold, 5, &mut rng()).unwrap();
        let kept = before.clone();
        let shares = refresh_shares(&before, threshold, &mut rand::rngs::OsRng).unwrap();

        assert_eq!(before, kept);
        assert_ne!(before, shares);
        assert!(before.iter().zip(&shares).all(|(old, new)| old.id == new.id));
        assert_eq!(combine_shares(&shares[2..]).unwrap(), secret.as_bytes());

        let mixed = [before[0].clone(), shares[1].clone(), shares[2].clone()];
        assert_ne!(combine_shares(&mixed).unwrap(), secret.as_bytes());
    }

    #[test]
    fn full_test() {
        let secret = b"Remember what the dormouse said.";
        let threshold = 2;

        let mut shares = split_secret(secret, threshold, 5, &mut rng()).unwrap();
        assert_eq!(shares.len(), 5);

        let mut refresh_rng = rng();
        for _ in 0..3 {
            shares = refresh_shares(&shares, threshold, &mut refresh_rng).unwrap();
        }

        assert_eq!(combine_shares(&shares[3..]).unwrap(), secret);
    }

    #[test]
    fn test_refresh_rejects_bad_threshold() {
        let shares = split_secret(b"refresh", 2, 3, &mut rng()).unwrap();
        let before = shares.clone();

        assert!(matches!(
            refresh_shares(&shares, 4, &mut rng()),
            Err(ShamirError::Config(ConfigError::ThresholdExceedsShares { .. }))
        ));
        assert!(matches!(
            refresh_shares(&shares, 2, &mut Replay(vec![])),
            Err(ShamirError::Entropy(_))
        ));
        assert_eq!(shares, before);
    }
}
