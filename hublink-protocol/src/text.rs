//! Printable text encoding of frame payloads
//!
//! Standard 64-symbol alphabet, four symbols per three bytes, `=` padding.
//! Decoding is tolerant: symbols outside the alphabet are skipped and the
//! first pad symbol ends the payload.

/// Encoding alphabet
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Pad symbol
pub const PAD: u8 = b'=';

/// Marks bytes outside the alphabet in [`DECODE_TABLE`]
const INVALID: u8 = 0xFF;

/// Reverse lookup from byte to 6-bit symbol value
static DECODE_TABLE: [u8; 256] = build_decode_table();

const fn build_decode_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Errors from encoding or decoding text payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextError {
    /// Output would not fit in the destination
    Overflow,
}

/// Get the 6-bit value of an alphabet symbol
pub fn symbol_value(byte: u8) -> Option<u8> {
    match DECODE_TABLE[usize::from(byte)] {
        INVALID => None,
        value => Some(value),
    }
}

/// Check whether a byte can appear in a well-formed text payload
pub fn is_text_symbol(byte: u8) -> bool {
    byte == PAD || symbol_value(byte).is_some()
}

/// Encoded length of an `len`-byte payload, padding included
pub const fn encoded_len(len: usize) -> usize {
    (len + 2) / 3 * 4
}

/// Encode `src` into `dst`, padding the final group
///
/// Returns the number of symbols written. No terminator is appended.
pub fn encode(src: &[u8], dst: &mut [u8]) -> Result<usize, TextError> {
    let out_len = encoded_len(src.len());
    let out = dst.get_mut(..out_len).ok_or(TextError::Overflow)?;

    for (chunk, quad) in src.chunks(3).zip(out.chunks_exact_mut(4)) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);
        let group = (u32::from(b0) << 16) | (u32::from(b1) << 8) | u32::from(b2);

        quad[0] = ALPHABET[(group >> 18) as usize & 0x3F];
        quad[1] = ALPHABET[(group >> 12) as usize & 0x3F];
        quad[2] = if chunk.len() > 1 {
            ALPHABET[(group >> 6) as usize & 0x3F]
        } else {
            PAD
        };
        quad[3] = if chunk.len() > 2 {
            ALPHABET[group as usize & 0x3F]
        } else {
            PAD
        };
    }

    Ok(out_len)
}

/// Decode `src` into `dst`
///
/// Stops at the first pad symbol, skips bytes outside the alphabet and
/// never writes outside `dst`. Returns the number of bytes produced.
pub fn decode(src: &[u8], dst: &mut [u8]) -> Result<usize, TextError> {
    let mut accum: u32 = 0;
    let mut bits = 0;
    let mut written = 0;

    for &byte in src {
        if byte == PAD {
            break;
        }
        let Some(value) = symbol_value(byte) else {
            continue;
        };

        accum = (accum << 6) | u32::from(value);
        bits += 6;

        if bits >= 8 {
            bits -= 8;
            let slot = dst.get_mut(written).ok_or(TextError::Overflow)?;
            *slot = (accum >> bits) as u8;
            written += 1;
        }
    }

    Ok(written)
}
