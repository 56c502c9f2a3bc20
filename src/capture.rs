use bitmatch::bitmatch;

/// Returns the saturation bit for a pulse counter of `counter_width`
/// bits. A count with this bit set is considered saturated everywhere
/// in the pipeline.
///
/// # Panics
///
/// Panics if `counter_width` is outside `3..=31`.
pub(crate) fn saturation_bit(counter_width: u8) -> u32 {
    assert!(
        (3..=31).contains(&counter_width),
        "pulse counter width must be in range 3..=31, got {}",
        counter_width
    );
    1 << (counter_width - 1)
}

/// A measured span at a constant logical level between two transitions
/// of the trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pulse {
    /// The number of sample periods the line held at [`level`](Self::level).
    /// Counted in sub-sample units (one tick contributes two). Saturates
    /// once the counter's top bit is reached.
    pub count: u32,

    /// The level that held for the measured span, i.e. the level of the
    /// run that just ended.
    pub level: bool,
}

/// Converts a two-phase (double-rate) sample stream of the raw trace
/// line into discrete [`Pulse`]s.
///
/// The line is observed twice per tick: an early and a late sub-sample.
/// A run ends when the new sub-samples no longer agree with the
/// committed level; where exactly it ended (the tick boundary or
/// between the two sub-samples) decides the emitted count and the
/// restart value of the run counter.
pub struct PulseCapture {
    /// Committed line level; always the previous tick's late sub-sample.
    level: bool,
    /// Sub-sample periods elapsed at the current level.
    count: u32,
    sat_bit: u32,
    out: Option<Pulse>,
}

impl PulseCapture {
    /// # Panics
    ///
    /// Panics if `counter_width` is outside `3..=31`.
    pub fn new(counter_width: u8) -> PulseCapture {
        PulseCapture {
            level: false,
            count: 0,
            sat_bit: saturation_bit(counter_width),
            out: None,
        }
    }

    /// Offers one tick's pair of sub-samples. Returns whether the pair
    /// was consumed; it is refused while a captured pulse is pending,
    /// and must then be re-offered after [`pull`](Self::pull).
    #[bitmatch]
    pub fn tick(&mut self, early: bool, late: bool) -> bool {
        if self.out.is_some() {
            return false;
        }

        let state = ((self.level as u8) << 2) | ((early as u8) << 1) | late as u8;
        #[bitmatch]
        match state {
            // Two more sub-samples equal to the committed level.
            "0000_0000" => self.advance(),
            "0000_0111" => self.advance(),

            // Two sub-samples opposite the committed level: the run
            // ended at the tick boundary.
            "0000_0011" => self.emit(self.count, 2),
            "0000_0100" => self.emit(self.count, 2),

            // One sub-sample equal and one opposite: the run ended
            // between the two sub-samples.
            "0000_0001" => self.emit(self.count + 1, 1),
            "0000_0110" => self.emit(self.count + 1, 1),

            // Glitch or short pulse; treated like a tick-boundary
            // transition. The late sub-sample equals the committed
            // level, so the next run continues at the same level.
            "0000_0010" => self.emit(self.count, 2),
            "0000_0101" => self.emit(self.count, 2),

            "????_????" => unreachable!(),
        }
        self.level = late;

        true
    }

    /// Takes the pending pulse, if any.
    pub fn pull(&mut self) -> Option<Pulse> {
        self.out.take()
    }

    fn advance(&mut self) {
        // Hold at saturation instead of wrapping. No pulse is forced;
        // the saturated span is reported once a transition occurs.
        if self.count & self.sat_bit == 0 {
            self.count += 2;
        }
    }

    fn emit(&mut self, count: u32, restart: u32) {
        self.out = Some(Pulse {
            count,
            level: self.level,
        });
        self.count = restart;
    }
}
