//! # `swo`
//!
//! A decoder for the Manchester-coded SWO (Serial Wire Output) trace
//! signal. The raw line is observed twice per tick by a double-rate
//! sampler; this crate recovers the bit timing from the resulting pulse
//! widths with no external clock reference, decodes the bit values, and
//! reassembles them into the byte-aligned trace stream.
//!
//! The pipeline is exposed at every level:
//!
//! - [`PulseCapture`](PulseCapture), [`ManchesterDecoder`](ManchesterDecoder)
//! and [`BitPacker`](BitPacker), the individual stages;
//!
//! - [`Pipeline`](Pipeline), the composed pipeline, driven one sample
//! tick at a time with ready/valid backpressure end-to-end;
//!
//! - [`Decoder`](Decoder), which reads a packed capture stream from a
//! given [`Read`](std::io::Read) instance and offers two iterators:
//! [`Bytes`](Bytes) over the decoded trace bytes, and
//! [`Pulses`](Pulses) over the raw (count, level) pulses for timing
//! diagnostics.
//!
//! A capture stream packs 8 line sub-samples per byte, oldest in bit 0;
//! consecutive sub-samples pair up into the early/late phases of one
//! tick.
//!
//! Usage is simple:
//! ```
//! use swo::{Decoder, DecoderOptions};
//!
//! // or a std::fs::File, or anything else that implements std::io::Read
//! let stream: &[u8] = &[
//!     // ...
//! ];
//! let mut decoder = Decoder::new(
//!     stream,
//!     DecoderOptions {
//!         ignore_eof: false,
//!         counter_width: 16,
//!     },
//! );
//! for byte in decoder.bytes() {
//!     // ...
//! }
//! ```
#[deny(rustdoc::broken_intra_doc_links)]
mod capture;
mod iter;
mod manchester;
mod packer;
mod pipeline;

pub use capture::{Pulse, PulseCapture};
pub use iter::{Bytes, Pulses};
pub use manchester::{Bit, ManchesterDecoder};
pub use packer::BitPacker;
pub use pipeline::Pipeline;

use std::io::Read;

use bitvec::prelude::*;

/// [`Decoder`](Decoder) configuration.
pub struct DecoderOptions {
    /// Whether to keep reading after a (temporary) EOF condition. If
    /// set and iteration is done over [`Bytes`](Bytes) or
    /// [`Pulses`](Pulses), [`next`](Iterator::next) will never return
    /// unless the EOF condition is eventually resolved.
    pub ignore_eof: bool,

    /// Width in bits of the pulse counter. Bounds the longest
    /// measurable pulse: a run that reaches bit `counter_width - 1`
    /// saturates and forces a resynchronization. Must be wide enough
    /// that a full bit-period at the slowest expected bit rate does not
    /// saturate. Valid range is `3..=31`.
    pub counter_width: u8,
}

#[derive(Debug, thiserror::Error)]
enum DecoderErrorInt {
    #[error("Buffer failed to read from source: {0}")]
    Io(#[from] std::io::Error),
    #[error("EOF encountered")]
    Eof,
}

/// Set of errors that can occur during decode.
///
/// Timing anomalies on the line are not decode errors: the decoder
/// absorbs them by resynchronizing, and the byte stream simply gaps.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

struct Buffer<R>
where
    R: Read,
{
    reader: R,
    buffer: BitVec,
    ignore_eof: bool,
}

impl<R> Buffer<R>
where
    R: Read,
{
    pub fn new(reader: R, ignore_eof: bool) -> Buffer<R> {
        Buffer {
            reader,
            ignore_eof,
            buffer: BitVec::new(),
        }
    }

    /// Tries to read up to 32 bytes from [Self::reader]. Continuously retries if [ignore_eof] is set.
    fn buffer_some(&mut self) -> Result<(), DecoderErrorInt> {
        // `Read::read` reportedly reads in 32-byte chunks. Source:
        // <https://github.com/rust-embedded/itm/blob/3e4251b42aa2e4b05ae372c47c7b835b8acae6dc/src/lib.rs#L42>.
        let mut buffer: [u8; 32] = [0; 32];
        loop {
            match self.reader.read(&mut buffer) {
                Ok(0) => {
                    if self.ignore_eof {
                        continue;
                    }
                    return Err(DecoderErrorInt::Eof);
                }
                Ok(n) => {
                    let mut bv = BitVec::<_, LocalBits>::from_vec(buffer[0..n].to_vec());
                    bv.reverse();
                    bv.append(&mut self.buffer);
                    self.buffer.append(&mut bv);

                    return Ok(());
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Pops a single sub-sample from the buffer, oldest first. Tries to
    /// buffer first if the buffer is empty.
    pub fn pop_sample(&mut self) -> Result<bool, DecoderErrorInt> {
        loop {
            match self.buffer.pop() {
                None => {
                    self.buffer_some()?;
                    continue;
                }
                Some(bit) => return Ok(bit),
            }
        }
    }
}

/// SWO Manchester trace decoder over a packed capture stream.
///
/// Each byte of the stream carries 8 line sub-samples, oldest in bit 0;
/// consecutive sub-samples form the early/late pair of one sample tick.
/// The decoder drains the pipeline after every tick, so the pipeline
/// never stalls in this mode.
pub struct Decoder<R>
where
    R: Read,
{
    /// Intermediate buffer to store the capture byte stream read from
    /// the given [Read] instance.
    buffer: Buffer<R>,

    pipeline: Pipeline,
}

impl<R> Decoder<R>
where
    R: Read,
{
    /// # Panics
    ///
    /// Panics if [`options.counter_width`](DecoderOptions::counter_width)
    /// is outside `3..=31`.
    pub fn new(reader: R, options: DecoderOptions) -> Decoder<R> {
        Decoder {
            buffer: Buffer::new(reader, options.ignore_eof),
            pipeline: Pipeline::new(options.counter_width),
        }
    }

    /// Returns a reference to the underlying [`Read`](Read).
    pub fn get_ref(&self) -> &R {
        &self.buffer.reader
    }

    /// Returns a mutable reference to the underlying [`Read`](Read).
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.buffer.reader
    }

    /// Returns an iterator over the decoded trace bytes.
    pub fn bytes(&mut self) -> Bytes<R> {
        Bytes::new(self)
    }

    /// Returns an iterator over the raw captured [`Pulse`](Pulse)s,
    /// bypassing the decode and packing stages.
    pub fn pulses(&mut self) -> Pulses<R> {
        Pulses::new(self)
    }

    /// Returns the next decoded byte in the stream.
    fn next_byte(&mut self) -> Result<u8, DecoderErrorInt> {
        loop {
            if let Some(byte) = self.pipeline.pull_byte() {
                return Ok(byte);
            }

            let early = self.buffer.pop_sample()?;
            let late = self.buffer.pop_sample()?;
            // The byte slot was drained above, so the tick cannot be
            // refused.
            self.pipeline.tick(early, late);
        }
    }

    /// Returns the next captured pulse in the stream, driving only the
    /// pulse capture stage.
    fn next_pulse(&mut self) -> Result<Pulse, DecoderErrorInt> {
        loop {
            if let Some(pulse) = self.pipeline.capture.pull() {
                return Ok(pulse);
            }

            let early = self.buffer.pop_sample()?;
            let late = self.buffer.pop_sample()?;
            self.pipeline.capture.tick(early, late);
        }
    }
}
