//! Receive-side link session
//!
//! Feeds link bytes through the [`FrameDecoder`] straight into the back slot
//! of the frame handoff, publishes every accepted frame and answers with an
//! acknowledgment byte where the framing scheme expects one. Decode failures
//! stop here: they become an `E` byte and a statistics counter.

use hublink_protocol::{DecodeError, DecodeOutcome, FrameDecoder};

use crate::frame::FrameError;
use crate::handoff::FrameProducer;

/// Where acknowledgment bytes go
pub trait AckSink {
    /// Queue one acknowledgment byte for the link
    ///
    /// Must not block; a full queue may drop the byte.
    fn send_ack(&mut self, byte: u8);
}

impl<const N: usize> AckSink for heapless::Vec<u8, N> {
    fn send_ack(&mut self, byte: u8) {
        let _ = self.push(byte);
    }
}

/// Running counters for the receive side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionStats {
    /// Frames decoded and published
    pub frames_ok: u32,
    /// Records rejected for any reason
    pub frames_failed: u32,
    /// Rejections caused by a full buffer
    pub overflows: u32,
}

impl SessionStats {
    fn record(&mut self, outcome: &DecodeOutcome) {
        match outcome {
            DecodeOutcome::Frame(_) => self.frames_ok = self.frames_ok.wrapping_add(1),
            DecodeOutcome::Rejected(_, err) => {
                self.frames_failed = self.frames_failed.wrapping_add(1);
                if *err == DecodeError::Overflow {
                    self.overflows = self.overflows.wrapping_add(1);
                }
            }
        }
    }
}

pub struct LinkSession<'d, 'h, 'a> {
    decoder: FrameDecoder<'d>,
    producer: FrameProducer<'h, 'a>,
    stats: SessionStats,
}

impl<'d, 'h, 'a> LinkSession<'d, 'h, 'a> {
    /// Join a decoder to the producer end of a handoff
    ///
    /// The handoff slots must be exactly one frame long.
    pub fn new(
        decoder: FrameDecoder<'d>,
        mut producer: FrameProducer<'h, 'a>,
    ) -> Result<Self, FrameError> {
        let expected = decoder.frame_len();
        let actual = producer.back_mut().len();
        if actual != expected {
            return Err(FrameError::WrongSize { expected, actual });
        }
        Ok(Self {
            decoder,
            producer,
            stats: SessionStats::default(),
        })
    }

    /// Process input up to the first completed or abandoned record
    ///
    /// Returns the number of bytes consumed and the outcome, if any. An
    /// accepted frame is already published when this returns.
    pub fn feed<A: AckSink>(
        &mut self,
        input: &[u8],
        acks: &mut A,
    ) -> (usize, Option<DecodeOutcome>) {
        let (used, outcome) = self.decoder.feed(input, self.producer.back_mut());
        if let Some(outcome) = &outcome {
            self.answer(outcome, acks);
        }
        (used, outcome)
    }

    fn answer<A: AckSink>(&mut self, outcome: &DecodeOutcome, acks: &mut A) {
        if outcome.is_frame() {
            self.producer.publish();
        }
        if let Some(ack) = outcome.ack() {
            acks.send_ack(ack);
        }
        self.stats.record(outcome);
    }

    /// Process all of `input`, returning how many frames were published
    pub fn receive<A: AckSink>(&mut self, mut input: &[u8], acks: &mut A) -> usize {
        let mut published = 0;
        while !input.is_empty() {
            let (used, outcome) = self.feed(input, acks);
            if outcome.is_some_and(|o| o.is_frame()) {
                published += 1;
            }
            input = &input[used..];
        }
        published
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Drop any partially received record after input was lost
    ///
    /// A record that had started is rejected, answered and counted like
    /// any other failure.
    pub fn reset<A: AckSink>(&mut self, acks: &mut A) -> Option<DecodeOutcome> {
        let outcome = self.decoder.abandon();
        if let Some(outcome) = &outcome {
            self.answer(outcome, acks);
        }
        outcome
    }
}
