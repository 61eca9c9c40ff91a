//! Minimal Solidity ABI call encoding and result decoding
//!
//! Only what ERC-721 reads need: zero- or one-`uint256` argument calls, and
//! `uint256` or `string` return values.

use metabaker_core::{MetabakerError, Result};

/// ABI word size in bytes
pub const WORD: usize = 32;

/// `totalSupply()` selector
pub const TOTAL_SUPPLY_SELECTOR: [u8; 4] = [0x18, 0x16, 0x0d, 0xdd];

/// `tokenURI(uint256)` selector
pub const TOKEN_URI_SELECTOR: [u8; 4] = [0xc8, 0x7b, 0x56, 0xdd];

/// Hex calldata for a call without arguments
#[must_use]
pub fn encode_call(selector: [u8; 4]) -> String {
    format!("0x{}", hex::encode(selector))
}

/// Hex calldata for a call with one `uint256` argument
#[must_use]
pub fn encode_call_u256(selector: [u8; 4], arg: u64) -> String {
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector);
    data.extend_from_slice(&[0u8; WORD - 8]);
    data.extend_from_slice(&arg.to_be_bytes());
    format!("0x{}", hex::encode(data))
}

/// Decode a `0x`-prefixed hex result
///
/// # Errors
/// - `MetabakerError::ExternalCallFailure` on invalid hex
pub fn decode_hex(result: &str) -> Result<Vec<u8>> {
    let digits = result.strip_prefix("0x").unwrap_or(result);
    hex::decode(digits).map_err(|e| MetabakerError::external(format!("invalid hex result: {e}")))
}

/// Decode a `uint256` return value that must fit in 64 bits
///
/// # Errors
/// - `MetabakerError::ExternalCallFailure` if the result is shorter than a word
/// - `MetabakerError::InvalidArgument` if the value does not fit in `u64`
pub fn decode_u64(data: &[u8]) -> Result<u64> {
    let word = first_word(data)?;
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(MetabakerError::invalid_argument(format!(
            "value 0x{} does not fit in 64 bits",
            hex::encode(word)
        )));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(low))
}

/// Decode a dynamic `string` return value
///
/// # Errors
/// - `MetabakerError::ExternalCallFailure` on truncated data or invalid UTF-8
pub fn decode_string(data: &[u8]) -> Result<String> {
    let offset = word_as_usize(first_word(data)?)?;
    let len_word = data
        .get(offset..offset.saturating_add(WORD))
        .ok_or_else(|| truncated("string length"))?;
    let len = word_as_usize(len_word)?;
    let start = offset + WORD;
    let bytes = data
        .get(start..start.saturating_add(len))
        .ok_or_else(|| truncated("string body"))?;
    String::from_utf8(bytes.to_vec())
        .map_err(|e| MetabakerError::external(format!("string result is not utf-8: {e}")))
}

fn first_word(data: &[u8]) -> Result<&[u8]> {
    data.get(..WORD).ok_or_else(|| truncated("word"))
}

fn word_as_usize(word: &[u8]) -> Result<usize> {
    let value = decode_u64(word).map_err(|_| truncated("offset"))?;
    usize::try_from(value).map_err(|_| truncated("offset"))
}

fn truncated(what: &str) -> MetabakerError {
    MetabakerError::external(format!("malformed ABI result: bad {what}"))
}
