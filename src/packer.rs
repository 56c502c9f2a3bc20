use crate::manchester::Bit;

/// Accumulates decoded [`Bit`]s into bytes, LSB-first, realigning on
/// the frame-start marker.
///
/// The first accepted bit of a byte lands in bit 0, the eighth in bit
/// 7. A frame-start bit discards any partial accumulation and begins a
/// fresh byte; bits arriving before the first frame-start are consumed
/// but dropped. At most one completed byte is buffered.
pub struct BitPacker {
    acc: u8,
    filled: u8,
    /// Whether a frame-start bit has ever been accepted.
    aligned: bool,
    out: Option<u8>,
}

impl BitPacker {
    pub fn new() -> BitPacker {
        BitPacker {
            acc: 0,
            filled: 0,
            aligned: false,
            out: None,
        }
    }

    /// Offers a bit. Returns whether it was consumed; it is refused
    /// while a completed byte is pending, and must then be re-offered
    /// after [`pull`](Self::pull).
    pub fn feed(&mut self, bit: Bit) -> bool {
        if self.out.is_some() {
            return false;
        }

        if bit.is_frame_start {
            self.acc = bit.value as u8;
            self.filled = 1;
            self.aligned = true;
        } else if self.aligned {
            self.acc |= (bit.value as u8) << self.filled;
            self.filled += 1;
        } else {
            return true;
        }

        if self.filled == 8 {
            self.out = Some(self.acc);
            self.acc = 0;
            self.filled = 0;
        }

        true
    }

    /// Whether the packer can consume a bit.
    pub fn is_ready(&self) -> bool {
        self.out.is_none()
    }

    /// Takes the completed byte, if any.
    pub fn pull(&mut self) -> Option<u8> {
        self.out.take()
    }
}

impl Default for BitPacker {
    fn default() -> BitPacker {
        BitPacker::new()
    }
}
