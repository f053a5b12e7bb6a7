//! Consistent overhead byte stuffing
//!
//! Removes every zero from a payload so that `0x00` can delimit records.
//! Each group starts with a code byte `c`: copy `c - 1` literal bytes, then
//! emit an implicit zero unless `c == 0xFF` or the record has ended.

/// Largest code byte; a full group carries 254 literals and no implicit zero
const MAX_CODE: u8 = 0xFF;

/// Errors from stuffing or unstuffing a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CobsError {
    /// A zero code byte appeared inside the record
    ZeroCode,
    /// A code byte promised more literals than the record holds
    Truncated,
    /// Output would not fit in the destination
    Overflow,
}

/// Worst-case stuffed size of an `len`-byte payload (terminator excluded)
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / 254 + 1
}

/// Stuff `src` into `dst`
///
/// Returns the number of bytes written. The terminator is not appended.
pub fn encode(src: &[u8], dst: &mut [u8]) -> Result<usize, CobsError> {
    let mut code_index = 0;
    let mut write = 1;
    let mut code: u8 = 1;

    if dst.is_empty() {
        return Err(CobsError::Overflow);
    }

    for &byte in src {
        if byte == 0 {
            dst[code_index] = code;
            code_index = write;
            *dst.get_mut(write).ok_or(CobsError::Overflow)? = 0;
            write += 1;
            code = 1;
            continue;
        }

        *dst.get_mut(write).ok_or(CobsError::Overflow)? = byte;
        write += 1;
        code += 1;

        if code == MAX_CODE {
            dst[code_index] = code;
            code_index = write;
            *dst.get_mut(write).ok_or(CobsError::Overflow)? = 0;
            write += 1;
            code = 1;
        }
    }

    dst[code_index] = code;
    Ok(write)
}

/// Unstuff one record (terminator excluded) into `dst`
///
/// Never writes outside `dst`. Returns the number of payload bytes.
pub fn decode(src: &[u8], dst: &mut [u8]) -> Result<usize, CobsError> {
    let mut read = 0;
    let mut write = 0;

    while read < src.len() {
        let code = src[read];
        if code == 0 {
            return Err(CobsError::ZeroCode);
        }
        read += 1;

        let run = usize::from(code - 1);
        let end = read + run;
        if end > src.len() {
            return Err(CobsError::Truncated);
        }

        let out = dst
            .get_mut(write..write + run)
            .ok_or(CobsError::Overflow)?;
        out.copy_from_slice(&src[read..end]);
        write += run;
        read = end;

        if code != MAX_CODE && read < src.len() {
            *dst.get_mut(write).ok_or(CobsError::Overflow)? = 0;
            write += 1;
        }
    }

    Ok(write)
}
