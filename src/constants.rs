/// Bit width of a field element. Encoded in the first character of every share token.
pub const FIELD_BITS: u8 = 8;

/// Number of elements in GF(2^8).
pub const FIELD_SIZE: usize = 1 << FIELD_BITS;

/// Order of the multiplicative group, `2^8 - 1`.
pub const FIELD_ORDER: usize = FIELD_SIZE - 1;

/// The primitive polynomial `x^8 + x^4 + x^3 + x^2 + 1` defining the field.
///
/// Part of the share wire format: shares produced with one polynomial do not
/// combine under another, so this value must never change.
pub const PRIMITIVE_POLYNOMIAL: u16 = 0x11d;

/// Generator of the multiplicative group under [`PRIMITIVE_POLYNOMIAL`].
pub const GENERATOR: u8 = 0x02;

pub const MIN_THRESHOLD: usize = 2;
pub const MAX_THRESHOLD: usize = 254;
pub const MIN_SHARES: usize = 2;
pub const MAX_SHARES: usize = FIELD_ORDER;

/// Hex characters used by the field-width nibble of a token header.
pub const HEADER_BITS_LEN: usize = 1;

/// Hex characters used by the share id of a token header.
pub const HEADER_ID_LEN: usize = 2;

pub const HEADER_LEN: usize = HEADER_BITS_LEN + HEADER_ID_LEN;

pub const DEFAULT_THRESHOLD: usize = 2;
pub const DEFAULT_SHARES: usize = 3;

pub const DEFAULT_BLOCK_SIZE: usize = 4;
pub const DEFAULT_BLOCKS_PER_GROUP: usize = 5;
pub const DEFAULT_GROUPS_PER_LINE: usize = 3;

pub const DEFAULT_CONFIG_PATH: &str = ".shamir/conf.toml";
pub const ENV_PREFIX: &str = "SHAMIR";
