use crate::capture::PulseCapture;
use crate::manchester::ManchesterDecoder;
use crate::packer::BitPacker;

/// The composed capture → decode → pack pipeline, driven one sample
/// tick at a time.
///
/// All three stages buffer a single item and refuse input while it is
/// pending, so nothing is ever dropped or reordered: a stalled byte
/// consumer stalls the whole pipeline back to the sample source.
pub struct Pipeline {
    pub(crate) capture: PulseCapture,
    decoder: ManchesterDecoder,
    packer: BitPacker,
}

impl Pipeline {
    /// # Panics
    ///
    /// Panics if `counter_width` is outside `3..=31`.
    pub fn new(counter_width: u8) -> Pipeline {
        Pipeline {
            capture: PulseCapture::new(counter_width),
            decoder: ManchesterDecoder::new(counter_width),
            packer: BitPacker::new(),
        }
    }

    /// Advances the pipeline by one sample tick, offering the two
    /// sub-samples to pulse capture. Returns whether the pair was
    /// consumed; a refused pair must be re-offered on a later tick.
    ///
    /// A caller that drains [`pull_byte`](Self::pull_byte) before every
    /// tick is never refused.
    pub fn tick(&mut self, early: bool, late: bool) -> bool {
        // Move held items downstream first, so a single-slot stage
        // frees up within the same tick.
        if self.packer.is_ready() {
            if let Some(bit) = self.decoder.pull() {
                self.packer.feed(bit);
            }
        }
        if self.decoder.is_ready() {
            if let Some(pulse) = self.capture.pull() {
                self.decoder.feed(pulse);
            }
        }

        self.capture.tick(early, late)
    }

    /// Takes the completed byte pending at the end of the pipeline, if
    /// any.
    pub fn pull_byte(&mut self) -> Option<u8> {
        self.packer.pull()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_cell(line: &mut Vec<bool>, bit: bool) {
        line.extend([bit; 4]);
        line.extend([!bit; 4]);
    }

    /// One frame: idle, a start bit at logical one, the bytes LSB-first
    /// with one mid-cell transition per bit, trailing idle.
    fn line_for(bytes: &[u8]) -> Vec<bool> {
        let mut line = vec![false; 32];
        push_cell(&mut line, true);
        for byte in bytes {
            for i in 0..8 {
                push_cell(&mut line, byte >> i & 1 == 1);
            }
        }
        line.extend([false; 32]);
        line
    }

    #[test]
    fn decodes_framed_bytes() {
        let line = line_for(&[0x42, 0x13]);
        let mut pipeline = Pipeline::new(16);

        let mut bytes = vec![];
        for pair in line.chunks(2) {
            assert!(pipeline.tick(pair[0], pair[1]));
            if let Some(byte) = pipeline.pull_byte() {
                bytes.push(byte);
            }
        }

        assert_eq!(bytes, [0x42, 0x13]);
    }

    #[test]
    fn stalls_without_loss_until_the_byte_consumer_drains() {
        let line = line_for(&[0x42, 0x13]);
        let mut pipeline = Pipeline::new(16);

        let mut bytes = vec![];
        let mut stalled = false;
        let mut pairs = line.chunks(2);
        let mut pending = None;

        // Only drain the byte slot once the pipeline refuses a tick;
        // the refused pair is re-offered afterwards.
        loop {
            let (early, late) = match pending
                .take()
                .or_else(|| pairs.next().map(|pair| (pair[0], pair[1])))
            {
                Some(pair) => pair,
                None => break,
            };

            if !pipeline.tick(early, late) {
                stalled = true;
                bytes.push(
                    pipeline
                        .pull_byte()
                        .expect("tick refused without a pending byte"),
                );
                pending = Some((early, late));
            }
        }
        if let Some(byte) = pipeline.pull_byte() {
            bytes.push(byte);
        }

        assert!(stalled);
        assert_eq!(bytes, [0x42, 0x13]);
    }
}
