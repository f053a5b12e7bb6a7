//! Frame recovery from an untrusted byte stream
//!
//! The decoder is a small state machine fed with whatever the link
//! delivered:
//!
//! - `Accumulating`: bytes collect in the [`ReceiveBuffer`] until a record
//!   terminator (`0x00` or `\n`) arrives, then the record is decoded into
//!   the destination in one pass.
//! - `Raw`: entered when a record starts with [`RAW_SENTINEL`]. Payload
//!   bytes are copied straight into the destination, counted down across
//!   any number of `feed` calls.
//!
//! - `Discarding`: entered when the receive buffer overflows. The rest of
//!   the oversized record is swallowed up to its terminator.
//!
//! Any failure discards the record, resets the accumulator and the raw
//! counters, and is reported once as a [`DecodeOutcome::Rejected`].

use crate::buffer::ReceiveBuffer;
use crate::cobs::{self, CobsError};
use crate::text::{self, TextError};
use crate::{
    ACK_ERROR, ACK_OK, RAW_SENTINEL, RECEIVE_MARGIN, STUFFED_TERMINATOR, TEXT_IGNORED,
    TEXT_TERMINATOR,
};

/// Which framings the receiver accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramingMode {
    /// Byte-stuffed, text and raw fast-path, told apart per record
    #[default]
    Auto,
    /// Byte-stuffed records only
    Stuffed,
    /// Text records and the raw fast-path
    Text,
}

impl FramingMode {
    fn accepts_raw(self) -> bool {
        !matches!(self, FramingMode::Stuffed)
    }
}

/// Framing scheme a record was carried in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scheme {
    Stuffed,
    Text,
    Raw,
}

impl Scheme {
    /// Whether the sender expects an acknowledgment byte
    ///
    /// Byte-stuffed records are fire-and-forget.
    pub fn acknowledges(self) -> bool {
        !matches!(self, Scheme::Stuffed)
    }

    fn terminator(self) -> u8 {
        match self {
            Scheme::Stuffed => STUFFED_TERMINATOR,
            Scheme::Text | Scheme::Raw => TEXT_TERMINATOR,
        }
    }
}

/// Why a record was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Malformed or truncated encoding
    Malformed,
    /// Decoded payload is not exactly one frame
    LengthMismatch { expected: usize, actual: usize },
    /// Accumulation or decoding would exceed a fixed buffer
    Overflow,
    /// Raw fast-path counters no longer add up
    Accounting,
    /// Link input was lost mid-record
    Interrupted,
}

impl From<CobsError> for DecodeError {
    fn from(err: CobsError) -> Self {
        match err {
            CobsError::ZeroCode | CobsError::Truncated => DecodeError::Malformed,
            CobsError::Overflow => DecodeError::Overflow,
        }
    }
}

impl From<TextError> for DecodeError {
    fn from(err: TextError) -> Self {
        match err {
            TextError::Overflow => DecodeError::Overflow,
        }
    }
}

/// Result of a completed or abandoned record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeOutcome {
    /// The destination holds exactly one frame
    Frame(Scheme),
    /// The record was discarded; destination contents are unspecified
    Rejected(Scheme, DecodeError),
}

impl DecodeOutcome {
    /// Scheme the record was carried in
    pub fn scheme(&self) -> Scheme {
        match self {
            DecodeOutcome::Frame(scheme) | DecodeOutcome::Rejected(scheme, _) => *scheme,
        }
    }

    /// Acknowledgment byte to send back, if the scheme uses one
    pub fn ack(&self) -> Option<u8> {
        if !self.scheme().acknowledges() {
            return None;
        }
        match self {
            DecodeOutcome::Frame(_) => Some(ACK_OK),
            DecodeOutcome::Rejected(..) => Some(ACK_ERROR),
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, DecodeOutcome::Frame(_))
    }
}

/// Receive buffer capacity needed to accumulate one `frame_len` record
///
/// Covers the worst-case expansion of every scheme `mode` accepts that is
/// accumulated (the raw fast-path bypasses the buffer), plus margin.
pub const fn required_capacity(mode: FramingMode, frame_len: usize) -> usize {
    let stuffed = cobs::max_encoded_len(frame_len);
    // One trailing '\r' is kept in Auto mode
    let text = text::encoded_len(frame_len) + 1;
    let worst = match mode {
        FramingMode::Stuffed => stuffed,
        FramingMode::Text => text,
        FramingMode::Auto => {
            if stuffed > text {
                stuffed
            } else {
                text
            }
        }
    };
    worst + RECEIVE_MARGIN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Collecting a terminated record; `printable` while every byte so far
    /// could belong to a text record, `blank_lead` while the record opened
    /// with a stray line break and every byte after it is printable
    Accumulating { printable: bool, blank_lead: bool },
    /// Copying a raw payload
    Raw { remaining: usize, offset: usize },
    /// Dropping the rest of an overflowed record
    Discarding { terminator: u8 },
}

impl State {
    const IDLE: State = State::Accumulating {
        printable: true,
        blank_lead: false,
    };
}

/// Stream decoder for one fixed frame size
#[derive(Debug)]
pub struct FrameDecoder<'a> {
    mode: FramingMode,
    frame_len: usize,
    buffer: ReceiveBuffer<'a>,
    state: State,
}

impl<'a> FrameDecoder<'a> {
    /// Create a decoder for `frame_len`-byte payloads
    ///
    /// `storage` backs the receive buffer; size it with
    /// [`required_capacity`].
    pub fn new(mode: FramingMode, frame_len: usize, storage: &'a mut [u8]) -> Self {
        Self {
            mode,
            frame_len,
            buffer: ReceiveBuffer::new(storage),
            state: State::IDLE,
        }
    }

    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Bytes currently held in the receive buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Raw payload bytes still expected, if a raw transfer is in progress
    pub fn raw_remaining(&self) -> Option<usize> {
        match self.state {
            State::Raw { remaining, .. } => Some(remaining),
            State::Accumulating { .. } | State::Discarding { .. } => None,
        }
    }

    /// Whether the tail of an overflowed record is being dropped
    pub fn is_discarding(&self) -> bool {
        matches!(self.state, State::Discarding { .. })
    }

    /// Abandon any partial record
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::IDLE;
    }

    /// Abandon the partial record after input was lost
    ///
    /// Returns the rejection to report if a record had started. A lone
    /// stray line break, or the tail of a record already rejected for
    /// overflow, ends without one.
    pub fn abandon(&mut self) -> Option<DecodeOutcome> {
        let scheme = match self.state {
            State::Raw { .. } => Some(Scheme::Raw),
            State::Accumulating {
                printable,
                blank_lead,
            } => (self.buffer.len() > usize::from(blank_lead))
                .then(|| self.accumulating_scheme(printable || blank_lead)),
            State::Discarding { .. } => None,
        };
        self.reset();
        scheme.map(|scheme| DecodeOutcome::Rejected(scheme, DecodeError::Interrupted))
    }

    /// Feed received bytes, decoding into `dest`
    ///
    /// Consumes input up to and including the byte that completes or aborts
    /// a record and returns how many bytes were consumed together with the
    /// outcome. Call again with the rest of the input to continue. Writes
    /// only within the first `frame_len` bytes of `dest`.
    pub fn feed(&mut self, input: &[u8], dest: &mut [u8]) -> (usize, Option<DecodeOutcome>) {
        let limit = dest.len().min(self.frame_len);
        let dest = &mut dest[..limit];
        let mut consumed = 0;

        while consumed < input.len() {
            if let State::Raw { remaining, offset } = self.state {
                let (used, outcome) = self.copy_raw(remaining, offset, &input[consumed..], dest);
                consumed += used;
                if outcome.is_some() {
                    return (consumed, outcome);
                }
                continue;
            }

            let byte = input[consumed];
            consumed += 1;
            if let Some(outcome) = self.accumulate(byte, dest) {
                return (consumed, Some(outcome));
            }
        }

        (consumed, None)
    }

    fn copy_raw(
        &mut self,
        remaining: usize,
        offset: usize,
        input: &[u8],
        dest: &mut [u8],
    ) -> (usize, Option<DecodeOutcome>) {
        if remaining == 0 || offset.checked_add(remaining) != Some(self.frame_len) {
            return (0, Some(self.abort(Scheme::Raw, DecodeError::Accounting)));
        }

        let take = remaining.min(input.len());
        let Some(target) = dest.get_mut(offset..offset + take) else {
            return (take, Some(self.abort(Scheme::Raw, DecodeError::Overflow)));
        };
        target.copy_from_slice(&input[..take]);

        let Some(left) = remaining.checked_sub(take) else {
            return (take, Some(self.abort(Scheme::Raw, DecodeError::Accounting)));
        };
        if left > 0 {
            self.state = State::Raw {
                remaining: left,
                offset: offset + take,
            };
            return (take, None);
        }

        self.reset();
        (take, Some(DecodeOutcome::Frame(Scheme::Raw)))
    }

    fn accumulate(&mut self, byte: u8, dest: &mut [u8]) -> Option<DecodeOutcome> {
        let (printable, blank_lead) = match self.state {
            State::Accumulating {
                printable,
                blank_lead,
            } => (printable, blank_lead),
            State::Discarding { terminator } => {
                if byte == terminator {
                    self.state = State::IDLE;
                }
                return None;
            }
            State::Raw { .. } => return None,
        };

        if self.mode.accepts_raw()
            && byte == RAW_SENTINEL[1]
            && self.buffer.as_slice() == &RAW_SENTINEL[..1]
        {
            self.buffer.clear();
            self.state = State::Raw {
                remaining: self.frame_len,
                offset: 0,
            };
            return None;
        }

        // In Auto mode a leading '\n' or '\r' may be a stuffed code byte
        let started = !self.buffer.is_empty();

        match self.mode {
            FramingMode::Stuffed if byte == STUFFED_TERMINATOR => {
                return self.finish(Scheme::Stuffed, 0, dest);
            }
            FramingMode::Text if byte == TEXT_TERMINATOR => {
                return self.finish(Scheme::Text, 0, dest);
            }
            FramingMode::Text if byte == TEXT_IGNORED => return None,
            FramingMode::Auto if byte == STUFFED_TERMINATOR => {
                return self.finish(Scheme::Stuffed, 0, dest);
            }
            FramingMode::Auto if byte == TEXT_TERMINATOR && printable && started => {
                return self.finish(Scheme::Text, 0, dest);
            }
            // The leading break was a blank line, not a code byte
            FramingMode::Auto if byte == TEXT_TERMINATOR && blank_lead => {
                return self.finish(Scheme::Text, 1, dest);
            }
            _ => {}
        }

        if self.buffer.push(byte).is_err() {
            let scheme = self.accumulating_scheme(printable || blank_lead);
            let outcome = self.abort(scheme, DecodeError::Overflow);
            self.state = State::Discarding {
                terminator: scheme.terminator(),
            };
            return Some(outcome);
        }

        let symbol = text::is_text_symbol(byte) || (byte == TEXT_IGNORED && started);
        let blank_lead = if started {
            blank_lead && symbol
        } else {
            self.mode == FramingMode::Auto && (byte == TEXT_TERMINATOR || byte == TEXT_IGNORED)
        };
        self.state = State::Accumulating {
            printable: printable && symbol,
            blank_lead,
        };
        None
    }

    /// Best guess at the scheme of a record that never terminated
    fn accumulating_scheme(&self, printable: bool) -> Scheme {
        match self.mode {
            FramingMode::Stuffed => Scheme::Stuffed,
            FramingMode::Text => Scheme::Text,
            FramingMode::Auto if printable => Scheme::Text,
            FramingMode::Auto => Scheme::Stuffed,
        }
    }

    /// Decode the buffered record, skipping its first `skip` bytes
    fn finish(&mut self, scheme: Scheme, skip: usize, dest: &mut [u8]) -> Option<DecodeOutcome> {
        let record = self.buffer.as_slice().get(skip..).unwrap_or_default();
        if is_blank(scheme, record) {
            self.reset();
            return None;
        }

        let decoded = match scheme {
            Scheme::Stuffed => cobs::decode(record, dest).map_err(DecodeError::from),
            Scheme::Text => text::decode(record, dest).map_err(DecodeError::from),
            Scheme::Raw => Err(DecodeError::Accounting),
        };
        self.reset();

        let outcome = match decoded {
            Ok(len) if len == self.frame_len => DecodeOutcome::Frame(scheme),
            Ok(len) => DecodeOutcome::Rejected(
                scheme,
                DecodeError::LengthMismatch {
                    expected: self.frame_len,
                    actual: len,
                },
            ),
            Err(err) => DecodeOutcome::Rejected(scheme, err),
        };
        Some(outcome)
    }

    fn abort(&mut self, scheme: Scheme, err: DecodeError) -> DecodeOutcome {
        self.reset();
        DecodeOutcome::Rejected(scheme, err)
    }
}

/// Records that carry nothing and are dropped without an answer
fn is_blank(scheme: Scheme, record: &[u8]) -> bool {
    match scheme {
        Scheme::Text => record.iter().all(|&b| b == TEXT_IGNORED),
        Scheme::Stuffed | Scheme::Raw => record.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME_LEN: usize = 12;

    fn payload() -> [u8; FRAME_LEN] {
        [1, 0, 2, 0, 0, 3, 0xFF, 0x00, 4, 5, 0, 6]
    }

    fn stuffed(data: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; cobs::max_encoded_len(data.len())];
        let len = cobs::encode(data, &mut out).unwrap();
        out.truncate(len);
        out.push(STUFFED_TERMINATOR);
        out
    }

    fn texted(data: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; text::encoded_len(data.len())];
        let len = text::encode(data, &mut out).unwrap();
        out.truncate(len);
        out.extend_from_slice(b"\r\n");
        out
    }

    fn raw(data: &[u8]) -> Vec<u8> {
        let mut out = RAW_SENTINEL.to_vec();
        out.extend_from_slice(data);
        out
    }

    /// Feed a whole stream, collecting every outcome
    fn run(decoder: &mut FrameDecoder<'_>, mut input: &[u8], dest: &mut [u8]) -> Vec<DecodeOutcome> {
        let mut outcomes = Vec::new();
        while !input.is_empty() {
            let (used, outcome) = decoder.feed(input, dest);
            outcomes.extend(outcome);
            input = &input[used..];
        }
        outcomes
    }

    #[test]
    fn test_stuffed_frame() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Stuffed, FRAME_LEN, &mut storage);

        let outcomes = run(&mut decoder, &stuffed(&payload()), &mut dest);
        assert_eq!(outcomes, vec![DecodeOutcome::Frame(Scheme::Stuffed)]);
        assert_eq!(outcomes[0].ack(), None);
        assert_eq!(dest, payload());
    }

    #[test]
    fn test_text_frame_of_zeros_is_acknowledged() {
        const LEN: usize = 128 * 32 * 2;
        let mut storage = vec![0u8; required_capacity(FramingMode::Text, LEN)];
        let mut dest = vec![0xAAu8; LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Text, LEN, &mut storage);

        let outcomes = run(&mut decoder, &texted(&vec![0u8; LEN]), &mut dest);
        assert_eq!(outcomes, vec![DecodeOutcome::Frame(Scheme::Text)]);
        assert_eq!(outcomes[0].ack(), Some(ACK_OK));
        assert!(dest.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_raw_frame_completes_only_after_last_byte() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Text, FRAME_LEN, &mut storage);
        let stream = raw(&payload());
        let (head, tail) = stream.split_at(stream.len() - 1);

        assert_eq!(decoder.feed(head, &mut dest), (head.len(), None));
        assert_eq!(decoder.raw_remaining(), Some(1));

        let (used, outcome) = decoder.feed(tail, &mut dest);
        assert_eq!(used, 1);
        assert_eq!(outcome, Some(DecodeOutcome::Frame(Scheme::Raw)));
        assert_eq!(outcome.and_then(|o| o.ack()), Some(ACK_OK));
        assert_eq!(decoder.raw_remaining(), None);
        assert_eq!(dest, payload());
    }

    #[test]
    fn test_raw_frame_byte_at_a_time() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

        let mut outcomes = Vec::new();
        for byte in raw(&payload()) {
            let (used, outcome) = decoder.feed(&[byte], &mut dest);
            assert_eq!(used, 1);
            outcomes.extend(outcome);
        }
        assert_eq!(outcomes, vec![DecodeOutcome::Frame(Scheme::Raw)]);
        assert_eq!(dest, payload());
    }

    #[test]
    fn test_raw_frame_leaves_following_bytes_unconsumed() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);
        let mut stream = raw(&payload());
        stream.extend_from_slice(&stuffed(&payload()));

        let (used, outcome) = decoder.feed(&stream, &mut dest);
        assert_eq!(used, RAW_SENTINEL.len() + FRAME_LEN);
        assert_eq!(outcome, Some(DecodeOutcome::Frame(Scheme::Raw)));

        let outcomes = run(&mut decoder, &stream[used..], &mut dest);
        assert_eq!(outcomes, vec![DecodeOutcome::Frame(Scheme::Stuffed)]);
    }

    #[test]
    fn test_stuffed_embedded_zero_is_dropped_silently() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Stuffed, FRAME_LEN, &mut storage);

        let mut stream = stuffed(&payload());
        // Corrupt a code byte into an early terminator
        stream[0] = 0x00;
        let outcomes = run(&mut decoder, &stream, &mut dest);

        assert!(outcomes.iter().all(|o| !o.is_frame()));
        assert!(outcomes.iter().all(|o| o.ack().is_none()));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_stuffed_truncated_record() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Stuffed, FRAME_LEN, &mut storage);

        let outcomes = run(&mut decoder, &[0x09, 1, 2, 0x00], &mut dest);
        assert_eq!(
            outcomes,
            vec![DecodeOutcome::Rejected(Scheme::Stuffed, DecodeError::Malformed)]
        );
    }

    #[test]
    fn test_length_mismatch() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Text, FRAME_LEN, &mut storage);

        let outcomes = run(&mut decoder, &texted(&payload()[..9]), &mut dest);
        assert_eq!(
            outcomes,
            vec![DecodeOutcome::Rejected(
                Scheme::Text,
                DecodeError::LengthMismatch {
                    expected: FRAME_LEN,
                    actual: 9
                }
            )]
        );
        assert_eq!(outcomes[0].ack(), Some(ACK_ERROR));
    }

    #[test]
    fn test_oversized_payload_overflows_destination() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN + 4];
        let mut decoder = FrameDecoder::new(FramingMode::Stuffed, FRAME_LEN, &mut storage);

        let outcomes = run(&mut decoder, &stuffed(&[7u8; FRAME_LEN + 3]), &mut dest);
        assert_eq!(
            outcomes,
            vec![DecodeOutcome::Rejected(Scheme::Stuffed, DecodeError::Overflow)]
        );
        assert_eq!(&dest[FRAME_LEN..], &[0u8; 4]);
    }

    #[test]
    fn test_receive_buffer_overflow_resets() {
        let mut storage = [0u8; 8];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Text, FRAME_LEN, &mut storage);

        let (used, outcome) = decoder.feed(b"AAAAAAAAAAAA", &mut dest);
        assert_eq!(used, 9);
        assert_eq!(
            outcome,
            Some(DecodeOutcome::Rejected(Scheme::Text, DecodeError::Overflow))
        );
        assert_eq!(decoder.buffered(), 0);
        assert!(decoder.is_discarding());

        // The rest of the oversized line is dropped without a second answer
        assert_eq!(decoder.feed(b"AAA\n", &mut dest), (4, None));
        assert!(!decoder.is_discarding());

        let (used, outcome) = decoder.feed(b"AAAA\n", &mut dest);
        assert_eq!(used, 5);
        assert_eq!(
            outcome,
            Some(DecodeOutcome::Rejected(
                Scheme::Text,
                DecodeError::LengthMismatch {
                    expected: FRAME_LEN,
                    actual: 3
                }
            ))
        );
    }

    #[test]
    fn test_oversized_line_answered_once() {
        let mut storage = vec![0u8; required_capacity(FramingMode::Auto, FRAME_LEN)];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

        let mut stream = vec![b'A'; 400];
        stream.push(TEXT_TERMINATOR);
        stream.extend_from_slice(&texted(&payload()));

        let outcomes = run(&mut decoder, &stream, &mut dest);
        assert_eq!(
            outcomes,
            vec![
                DecodeOutcome::Rejected(Scheme::Text, DecodeError::Overflow),
                DecodeOutcome::Frame(Scheme::Text),
            ]
        );
        assert_eq!(dest, payload());
    }

    #[test]
    fn test_stuffed_overflow_discards_to_zero() {
        let mut storage = [0u8; 8];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Stuffed, FRAME_LEN, &mut storage);

        let mut stream = vec![0x01u8; 20];
        stream.push(STUFFED_TERMINATOR);
        stream.extend_from_slice(&[0x02, 0x07, STUFFED_TERMINATOR]);

        let outcomes = run(&mut decoder, &stream, &mut dest);
        assert_eq!(
            outcomes,
            vec![
                DecodeOutcome::Rejected(Scheme::Stuffed, DecodeError::Overflow),
                DecodeOutcome::Rejected(
                    Scheme::Stuffed,
                    DecodeError::LengthMismatch {
                        expected: FRAME_LEN,
                        actual: 1
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_auto_mode_tells_schemes_apart() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

        let mut stream = texted(&payload());
        stream.extend_from_slice(&stuffed(&payload()));
        stream.extend_from_slice(&raw(&payload()));

        let outcomes = run(&mut decoder, &stream, &mut dest);
        assert_eq!(
            outcomes,
            vec![
                DecodeOutcome::Frame(Scheme::Text),
                DecodeOutcome::Frame(Scheme::Stuffed),
                DecodeOutcome::Frame(Scheme::Raw),
            ]
        );
    }

    #[test]
    fn test_auto_mode_keeps_newline_inside_stuffed_record() {
        let mut data = payload();
        data[3] = TEXT_TERMINATOR;
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

        let outcomes = run(&mut decoder, &stuffed(&data), &mut dest);
        assert_eq!(outcomes, vec![DecodeOutcome::Frame(Scheme::Stuffed)]);
        assert_eq!(dest, data);
    }

    #[test]
    fn test_stuffed_mode_ignores_sentinel() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Stuffed, FRAME_LEN, &mut storage);

        let (used, outcome) = decoder.feed(&RAW_SENTINEL, &mut dest);
        assert_eq!(used, 2);
        assert_eq!(
            outcome,
            Some(DecodeOutcome::Rejected(Scheme::Stuffed, DecodeError::Malformed))
        );
        assert_eq!(decoder.raw_remaining(), None);
    }

    #[test]
    fn test_empty_records_are_ignored() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];

        let mut decoder = FrameDecoder::new(FramingMode::Text, FRAME_LEN, &mut storage);
        assert_eq!(decoder.feed(b"\r\n\n", &mut dest), (3, None));

        let mut decoder = FrameDecoder::new(FramingMode::Stuffed, FRAME_LEN, &mut storage);
        assert_eq!(decoder.feed(b"\0\0", &mut dest), (2, None));
    }

    #[test]
    fn test_auto_mode_leading_newline_is_a_code_byte() {
        // First zero at index 9 yields a code byte equal to '\n'
        let mut data = [0x41u8; FRAME_LEN];
        data[9] = 0;
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

        let stream = stuffed(&data);
        assert_eq!(stream[0], TEXT_TERMINATOR);
        let outcomes = run(&mut decoder, &stream, &mut dest);
        assert_eq!(outcomes, vec![DecodeOutcome::Frame(Scheme::Stuffed)]);
        assert_eq!(dest, data);
    }

    #[test]
    fn test_auto_mode_blank_line_before_text_frame() {
        let data = [7u8; FRAME_LEN];
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

        let mut stream = b"\n".to_vec();
        let mut encoded = vec![0u8; text::encoded_len(FRAME_LEN)];
        let len = text::encode(&data, &mut encoded).unwrap();
        stream.extend_from_slice(&encoded[..len]);
        stream.push(TEXT_TERMINATOR);

        let outcomes = run(&mut decoder, &stream, &mut dest);
        assert_eq!(outcomes, vec![DecodeOutcome::Frame(Scheme::Text)]);
        assert_eq!(dest, data);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_auto_mode_blank_lines_are_ignored() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

        let mut stream = b"\n\n\r\n\n\r\n".to_vec();
        stream.extend_from_slice(&texted(&payload()));

        let outcomes = run(&mut decoder, &stream, &mut dest);
        assert_eq!(outcomes, vec![DecodeOutcome::Frame(Scheme::Text)]);
        assert_eq!(dest, payload());
    }

    #[test]
    fn test_abandon_rejects_started_record() {
        let mut storage = [0u8; 64];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

        assert_eq!(decoder.abandon(), None);

        decoder.feed(b"QUJD", &mut dest);
        let outcome = decoder.abandon();
        assert_eq!(
            outcome,
            Some(DecodeOutcome::Rejected(Scheme::Text, DecodeError::Interrupted))
        );
        assert_eq!(outcome.and_then(|o| o.ack()), Some(ACK_ERROR));
        assert_eq!(decoder.buffered(), 0);

        decoder.feed(&raw(&payload()[..4]), &mut dest);
        assert_eq!(
            decoder.abandon(),
            Some(DecodeOutcome::Rejected(Scheme::Raw, DecodeError::Interrupted))
        );
        assert_eq!(decoder.raw_remaining(), None);

        // A stray line break is not a record
        decoder.feed(b"\n", &mut dest);
        assert_eq!(decoder.abandon(), None);
    }

    #[test]
    fn test_abandon_after_overflow_is_silent() {
        let mut storage = [0u8; 8];
        let mut dest = [0u8; FRAME_LEN];
        let mut decoder = FrameDecoder::new(FramingMode::Text, FRAME_LEN, &mut storage);

        let (_, outcome) = decoder.feed(b"AAAAAAAAAAAA", &mut dest);
        assert!(matches!(
            outcome,
            Some(DecodeOutcome::Rejected(_, DecodeError::Overflow))
        ));
        assert_eq!(decoder.abandon(), None);
        assert!(!decoder.is_discarding());
    }

    #[test]
    fn test_required_capacity_covers_worst_case() {
        let len = 128 * 64 * 2;
        assert!(required_capacity(FramingMode::Stuffed, len) >= cobs::max_encoded_len(len));
        assert!(required_capacity(FramingMode::Text, len) > text::encoded_len(len));
        assert!(
            required_capacity(FramingMode::Auto, len)
                >= required_capacity(FramingMode::Text, len)
        );
    }

    fn mode_strategy() -> impl Strategy<Value = FramingMode> {
        prop_oneof![
            Just(FramingMode::Auto),
            Just(FramingMode::Stuffed),
            Just(FramingMode::Text),
        ]
    }

    proptest! {
        #[test]
        fn prop_never_writes_outside_destination(
            mode in mode_strategy(),
            chunks in proptest::collection::vec(
                proptest::collection::vec(any::<u8>(), 0..64), 0..32),
        ) {
            const GUARD: usize = 16;
            let mut storage = [0u8; 40];
            let mut backing = [0x5Au8; GUARD + FRAME_LEN + GUARD];
            let mut decoder = FrameDecoder::new(mode, FRAME_LEN, &mut storage);

            for chunk in &chunks {
                let mut rest = &chunk[..];
                loop {
                    let dest = &mut backing[GUARD..GUARD + FRAME_LEN];
                    let (used, _) = decoder.feed(rest, dest);
                    prop_assert!(used <= rest.len());
                    prop_assert!(decoder.buffered() <= decoder.capacity());
                    if let Some(remaining) = decoder.raw_remaining() {
                        prop_assert!(remaining > 0 && remaining <= FRAME_LEN);
                    }
                    rest = &rest[used..];
                    if rest.is_empty() {
                        break;
                    }
                }
            }

            prop_assert!(backing[..GUARD].iter().all(|&b| b == 0x5A));
            prop_assert!(backing[GUARD + FRAME_LEN..].iter().all(|&b| b == 0x5A));
        }

        #[test]
        fn prop_valid_frames_survive_any_scheme(
            data in proptest::collection::vec(any::<u8>(), FRAME_LEN),
            scheme in 0u8..3,
        ) {
            let stream = match scheme {
                0 => stuffed(&data),
                1 => texted(&data),
                _ => raw(&data),
            };
            // A stuffed record opening on a line-break code byte can read as
            // a blank line in Auto mode
            prop_assume!(
                scheme != 0 || !matches!(stream[0], TEXT_TERMINATOR | TEXT_IGNORED)
            );
            let mut storage = [0u8; 64];
            let mut dest = [0u8; FRAME_LEN];
            let mut decoder = FrameDecoder::new(FramingMode::Auto, FRAME_LEN, &mut storage);

            let outcomes = run(&mut decoder, &stream, &mut dest);
            prop_assert_eq!(outcomes.len(), 1);
            prop_assert!(outcomes[0].is_frame());
            prop_assert_eq!(&dest[..], &data[..]);
        }
    }
}
