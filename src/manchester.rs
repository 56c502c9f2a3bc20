use crate::capture::{saturation_bit, Pulse};

use log::{debug, trace};

/// A single decoded Manchester bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bit {
    /// The decoded bit value.
    pub value: bool,

    /// Set on the first bit captured after the decoder
    /// (re)synchronized. Downstream byte packing realigns on it.
    pub is_frame_start: bool,
}

/// Pulse-width boundaries learned from the synchronizing half-bit
/// pulse, held constant until the decoder returns to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Thresholds {
    /// 3/4 bit time.
    short: u32,
    /// 5/4 bit time.
    long: u32,
}

enum Class {
    Short,
    Long,
    ExtraLong,
}

impl Thresholds {
    /// Derives the boundaries from the count of a pulse spanning one
    /// half bit-period.
    fn learn(count: u32) -> Thresholds {
        Thresholds {
            short: count + count / 2,
            long: count * 2 + count / 2,
        }
    }

    fn classify(&self, count: u32) -> Class {
        if count <= self.short {
            Class::Short
        } else if count > self.long {
            Class::ExtraLong
        } else {
            Class::Long
        }
    }
}

/// The decoder's phase relative to the recovered bit clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Unsynchronized. Waiting for a high, unsaturated pulse to learn
    /// the bit timing from.
    Idle,

    /// The last accepted edge sat at a bit center.
    Center {
        thresholds: Thresholds,
        frame_start: bool,
    },

    /// The last accepted edge sat at a bit edge; a short pulse
    /// completes the pending bit.
    Edge {
        thresholds: Thresholds,
        frame_start: bool,
    },
}

/// Transition function of the decode state machine. Consumes one pulse
/// and captures at most one bit.
fn transition(state: DecodeState, pulse: Pulse, sat_bit: u32) -> (DecodeState, Option<Bit>) {
    match state {
        DecodeState::Idle => {
            if pulse.level && pulse.count & sat_bit == 0 {
                // The qualifying pulse spans one half bit-period. It
                // yields no bit itself.
                let thresholds = Thresholds::learn(pulse.count);
                debug!(
                    "synchronized on a half-bit pulse of {} sample periods (thresholds {}/{})",
                    pulse.count, thresholds.short, thresholds.long
                );
                (
                    DecodeState::Center {
                        thresholds,
                        frame_start: true,
                    },
                    None,
                )
            } else {
                (DecodeState::Idle, None)
            }
        }

        DecodeState::Center {
            thresholds,
            frame_start,
        } => match thresholds.classify(pulse.count) {
            // A long pulse from a bit center reaches the next bit
            // center; capture.
            Class::Long => (
                DecodeState::Center {
                    thresholds,
                    frame_start: false,
                },
                Some(Bit {
                    value: pulse.level,
                    is_frame_start: frame_start,
                }),
            ),

            // A short pulse from a bit center reaches the bit edge.
            Class::Short => (
                DecodeState::Edge {
                    thresholds,
                    frame_start,
                },
                None,
            ),

            // End of frame or a timing error.
            Class::ExtraLong => {
                trace!(
                    "pulse of {} sample periods exceeds the long threshold, resynchronizing",
                    pulse.count
                );
                (DecodeState::Idle, None)
            }
        },

        DecodeState::Edge {
            thresholds,
            frame_start,
        } => match thresholds.classify(pulse.count) {
            // A short pulse from a bit edge reaches the bit center;
            // capture.
            Class::Short => (
                DecodeState::Center {
                    thresholds,
                    frame_start: false,
                },
                Some(Bit {
                    value: pulse.level,
                    is_frame_start: frame_start,
                }),
            ),

            // Anything longer than the matching half period is an end
            // bit or a timing error.
            Class::Long | Class::ExtraLong => {
                trace!(
                    "expected a half-bit completion, got {} sample periods; resynchronizing",
                    pulse.count
                );
                (DecodeState::Idle, None)
            }
        },
    }
}

/// Recovers the bit clock and bit values from the [`Pulse`] stream.
///
/// The bit period is learned anew on every synchronization from the
/// first high, unsaturated pulse after idle; every subsequent pulse is
/// classified as a half bit, a full bit, or an idle gap against the
/// learned thresholds. The captured bit value is the level of the
/// classified pulse.
pub struct ManchesterDecoder {
    state: DecodeState,
    sat_bit: u32,
    out: Option<Bit>,
}

impl ManchesterDecoder {
    /// # Panics
    ///
    /// Panics if `counter_width` is outside `3..=31`.
    pub fn new(counter_width: u8) -> ManchesterDecoder {
        ManchesterDecoder {
            state: DecodeState::Idle,
            sat_bit: saturation_bit(counter_width),
            out: None,
        }
    }

    /// Offers a pulse. Returns whether it was consumed; it is refused
    /// while a decoded bit is pending, and must then be re-offered
    /// after [`pull`](Self::pull).
    pub fn feed(&mut self, pulse: Pulse) -> bool {
        if self.out.is_some() {
            return false;
        }

        let (state, bit) = transition(self.state, pulse, self.sat_bit);
        self.state = state;
        self.out = bit;

        true
    }

    /// Whether the decoder can consume a pulse.
    pub fn is_ready(&self) -> bool {
        self.out.is_none()
    }

    /// Takes the pending decoded bit, if any.
    pub fn pull(&mut self) -> Option<Bit> {
        self.out.take()
    }
}
