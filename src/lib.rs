//! # Shamir Secret Sharing over GF(2^8)
//!
//! This library splits a secret byte string into `N` shares such that any `T`
//! of them reconstruct it exactly, while `T - 1` or fewer reveal nothing about it.
//! Shares travel as self-describing hex tokens.
//!
//! ## Shamir's Secret Sharing (SSS)
//!
//! Shamir's Secret Sharing is a cryptographic algorithm created by Adi Shamir. It is a form of secret
//! sharing, where a secret is divided into parts, giving each participant its own unique part, with
//! the property that a certain number of these parts are needed to reconstruct the secret.
//!
//! ### The Mathematics Behind SSS
//!
//! Every byte `S` of the secret gets its own random polynomial of degree `t-1` over GF(2^8):
//!
//! ```ignore
//! f(x) = a0 + a1*x + a2*x^2 + ... + a(t-1)*x^(t-1)
//! ```
//!
//! where `a0 = S` and `a1, ..., a(t-1)` are drawn from a cryptographically secure source. Share
//! `i` carries `f(i)` for every byte. With at least `t` points each polynomial, and hence the
//! secret, is recovered by Lagrange interpolation at `x = 0`.
//!
//! Combining fewer than `t` shares does not fail. It produces bytes unrelated to the secret,
//! and nothing in the shares tells the two cases apart. Only the party that split the secret
//! knows `t`.
//!
//! ### Share tokens
//!
//! A token is lowercase hex: one nibble with the field width (`8`), two digits with the share
//! id (`01`..`ff`), then the payload, one byte per secret byte. The clean rendering groups the
//! uppercased token into blocks for printing; whitespace is ignored when decoding.
//!
//! ## Usage
//!
//! ```rust
//! use shamir::sss::{combine, split};
//!
//! let tokens = split(b"HI", 2, 3, &mut rand::rngs::OsRng).unwrap();
//! assert_eq!(tokens.len(), 3);
//!
//! let secret = combine(&[&tokens[0], &tokens[2]]).unwrap();
//! assert_eq!(secret, b"HI");
//! ```
//!
//! ## Modules
//!
//! - `constants`: Wire-format constants and defaults.
//! - `field`: GF(2^8) arithmetic.
//! - `polynomial`: Random polynomials, Horner evaluation, Lagrange interpolation.
//! - `share`: The share type and its token codec.
//! - `sss`: Splitting, combining, deriving and refreshing shares.
//! - `error`: Error types.
//! - `config`: Settings for the command-line tool.
//! - `files`: File input and output for the command-line tool.

/// The `constants` module holds the values that define the share format, such as the field
/// width and the primitive polynomial, along with the defaults of the command-line tool.
pub mod constants;

/// The `error` module defines the error taxonomy: invalid parameters, malformed tokens,
/// inconsistent share sets and an unavailable random source.
pub mod error;

/// The `field` module implements addition, multiplication and inversion in GF(2^8) through
/// log/exp tables shared read-only by every operation.
pub mod field;

/// The `polynomial` module builds the per-byte polynomials and interpolates them.
pub mod polynomial;

/// The `share` module defines a share and encodes it to, and decodes it from, a hex token.
pub mod share;

/// The `sss` (Shamir's Secret Sharing) module is the entry point of the library. It splits
/// secrets into shares, combines shares back into the secret, derives additional shares and
/// proactively refreshes existing ones.
pub mod sss;

/// The `config` module loads the layered settings of the command-line tool.
pub mod config;

/// The `files` module writes shares and secrets with owner-only permissions and discovers
/// share files by prefix.
pub mod files;

pub use error::{ConfigError, ConsistencyError, DecodeError, Result, ShamirError};
pub use share::Share;
pub use sss::{combine, combine_shares, new_share, refresh_shares, split, split_secret};
