use super::{Decoder, DecoderError, DecoderErrorInt, Pulse};

use std::io::Read;

/// Iterator that yields the decoded trace bytes.
pub struct Bytes<'a, R>
where
    R: Read,
{
    decoder: &'a mut Decoder<R>,
}

impl<'a, R> Bytes<'a, R>
where
    R: Read,
{
    pub(super) fn new(decoder: &'a mut Decoder<R>) -> Self {
        Self { decoder }
    }
}

impl<'a, R> Iterator for Bytes<'a, R>
where
    R: Read,
{
    type Item = Result<u8, DecoderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let byte = self.decoder.next_byte();

        match byte {
            Err(DecoderErrorInt::Eof) => None,
            Err(DecoderErrorInt::Io(io)) => Some(Err(DecoderError::Io(io))),
            Ok(byte) => Some(Ok(byte)),
        }
    }
}

/// Iterator that yields the raw captured [`Pulse`](Pulse)s, bypassing
/// the decode and packing stages. Intended for bit-rate and
/// signal-quality diagnostics.
pub struct Pulses<'a, R>
where
    R: Read,
{
    decoder: &'a mut Decoder<R>,
}

impl<'a, R> Pulses<'a, R>
where
    R: Read,
{
    pub(super) fn new(decoder: &'a mut Decoder<R>) -> Self {
        Self { decoder }
    }
}

impl<'a, R> Iterator for Pulses<'a, R>
where
    R: Read,
{
    type Item = Result<Pulse, DecoderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let pulse = self.decoder.next_pulse();

        match pulse {
            Err(DecoderErrorInt::Eof) => None,
            Err(DecoderErrorInt::Io(io)) => Some(Err(DecoderError::Io(io))),
            Ok(pulse) => Some(Ok(pulse)),
        }
    }
}
