use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{
    DEFAULT_BLOCKS_PER_GROUP, DEFAULT_BLOCK_SIZE, DEFAULT_GROUPS_PER_LINE, FIELD_BITS,
    HEADER_BITS_LEN, HEADER_LEN,
};
use crate::error::DecodeError;

/// A single share of a split secret.
///
/// A share is the evaluation of every byte-position polynomial at `x = id`.
/// It is only meaningful together with other shares of the same split.
///
/// The textual form is a hex token: one nibble for `bits`, two hex digits for
/// `id`, then the payload.
///
/// ```
/// use shamir::share::Share;
///
/// let share: Share = "801a1b2".parse().unwrap();
/// assert_eq!(share.id, 1);
/// assert_eq!(share.data, vec![0xa1, 0xb2]);
/// assert_eq!(share.to_string(), "801a1b2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Share {
    /// Field width in bits. Always [`FIELD_BITS`] for shares this crate produces.
    pub bits: u8,

    /// The x-coordinate. Never zero.
    pub id: u8,

    /// One evaluated byte per secret byte.
    pub data: Vec<u8>,
}

impl Share {
    pub fn new(id: u8, data: Vec<u8>) -> Self {
        Share {
            bits: FIELD_BITS,
            id,
            data,
        }
    }

    /// Renders the share as a hex token.
    pub fn encode(&self) -> String {
        let mut token = String::with_capacity(HEADER_LEN + self.data.len() * 2);
        token.push_str(&format!("{:x}{:02x}", self.bits, self.id));
        token.push_str(&hex::encode(&self.data));
        token
    }

    /// Parses a token, ignoring any whitespace left over from the clean rendering.
    ///
    /// # Errors
    ///
    /// * [`DecodeError::Truncated`] when the token holds no payload after the header.
    /// * [`DecodeError::InvalidFieldWidth`] when the first character is not a hex digit.
    /// * [`DecodeError::UnsupportedFieldWidth`] for a width of 0. Other widths decode,
    ///   and [`validate_shares`](crate::sss::validate_shares) rejects sets that mix
    ///   widths or use one other than 8.
    /// * [`DecodeError::InvalidHex`] for non-hex characters or an odd-length payload.
    /// * [`DecodeError::ReservedId`] for id 0.
    pub fn decode(token: &str) -> Result<Self, DecodeError> {
        let token = strip_whitespace(token);

        if token.len() <= HEADER_LEN {
            return Err(DecodeError::Truncated { len: token.len() });
        }

        // Multi-byte characters would make the slicing below land off a char boundary.
        if !token.is_ascii() {
            let (index, c) = token
                .chars()
                .enumerate()
                .find(|(_, c)| !c.is_ascii())
                .unwrap_or((0, '?'));
            return Err(DecodeError::InvalidHex(hex::FromHexError::InvalidHexCharacter {
                c,
                index,
            }));
        }

        let (header, payload) = token.split_at(HEADER_LEN);
        let (bits, id) = header.split_at(HEADER_BITS_LEN);

        let bits_char = bits.chars().next().unwrap_or('?');
        let bits = bits_char
            .to_digit(16)
            .ok_or(DecodeError::InvalidFieldWidth(bits_char))? as u8;
        if bits == 0 {
            return Err(DecodeError::UnsupportedFieldWidth(bits));
        }

        let mut id_bytes = [0u8; 1];
        hex::decode_to_slice(id, &mut id_bytes)?;
        let id = id_bytes[0];
        if id == 0 {
            return Err(DecodeError::ReservedId);
        }

        let data = hex::decode(payload)?;

        Ok(Share { bits, id, data })
    }

    /// Renders the share token in the clean, printable layout.
    pub fn render_clean(&self, layout: &CleanLayout) -> String {
        render_clean(&self.encode(), layout)
    }
}

impl fmt::Display for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("bits", &self.bits)
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

impl FromStr for Share {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Share::decode(s)
    }
}

/// Removes every whitespace character, undoing the clean rendering.
pub fn strip_whitespace(token: &str) -> String {
    token.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Layout of the clean rendering of a token.
///
/// Characters are grouped into blocks, blocks into groups and groups into
/// lines. Blocks are separated by one space, groups by two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanLayout {
    pub block_size: usize,
    pub blocks_per_group: usize,
    pub groups_per_line: usize,
}

impl Default for CleanLayout {
    fn default() -> Self {
        CleanLayout {
            block_size: DEFAULT_BLOCK_SIZE,
            blocks_per_group: DEFAULT_BLOCKS_PER_GROUP,
            groups_per_line: DEFAULT_GROUPS_PER_LINE,
        }
    }
}

/// Uppercases a token and lays it out in blocks for printing or writing down by hand.
///
/// The result decodes to the same share, since decoding strips whitespace first.
///
/// ```
/// use shamir::share::{render_clean, CleanLayout};
///
/// let layout = CleanLayout { block_size: 4, blocks_per_group: 2, groups_per_line: 2 };
/// assert_eq!(
///     render_clean("801abcdef0123456789abcd", &layout),
///     "801A BCDE  F012 3456\n789A BCD"
/// );
/// ```
pub fn render_clean(token: &str, layout: &CleanLayout) -> String {
    let chars: Vec<char> = strip_whitespace(token).to_uppercase().chars().collect();
    let block_size = layout.block_size.max(1);
    let blocks_per_group = layout.blocks_per_group.max(1);
    let groups_per_line = layout.groups_per_line.max(1);

    let blocks: Vec<String> = chars
        .chunks(block_size)
        .map(|block| block.iter().collect())
        .collect();
    let groups: Vec<String> = blocks
        .chunks(blocks_per_group)
        .map(|group| group.join(" "))
        .collect();
    let lines: Vec<String> = groups
        .chunks(groups_per_line)
        .map(|line| line.join("  "))
        .collect();

    lines.join("\n")
}
