//! Software serial receiver for the GPS line.
//!
//! There is no UART peripheral free for the GPS module, so reception is
//! synthesized from a falling-edge interrupt on the rx pin plus a timer that
//! samples the line once per bit period. The state machine below only sees
//! abstract edge/tick events, so it can be driven by synthetic sequences in
//! tests.

/// Timer and edge-detection hooks backing a [`BitSampler`].
///
/// The firmware implements this over a hardware timer and the EXTI line of
/// the rx pin; tests implement it with a recording fake.
pub trait SampleClock {
    /// Start the timer, firing once after half a bit period.
    ///
    /// Used right after the start-bit edge so that the first full-period tick
    /// lands in the middle of data bit 0.
    fn arm_half_bit(&mut self);

    /// Restart the timer, firing every full bit period.
    fn arm_full_bit(&mut self);

    /// Stop the timer.
    fn disarm(&mut self);

    /// Enable start-bit edge detection on the rx line.
    fn watch_edges(&mut self);

    /// Suppress edge detection while a byte is being sampled, so the data
    /// bits themselves don't retrigger the start logic.
    fn ignore_edges(&mut self);
}

// States are named for where we are within one frame on the wire.
#[derive(Copy, Clone)]
enum RxState {
    /// Line idle (high), waiting for a start-bit edge.
    Idle,
    /// Start edge seen, timer armed for half a bit period.
    StartBit,
    /// Sampling data bits, one per timer tick.
    Sampling { shift: u8, bits: u8 },
}

/// Reconstructs bytes from raw line-level timing.
pub struct BitSampler {
    state: RxState,
}

impl Default for BitSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl BitSampler {
    pub const fn new() -> Self {
        Self {
            state: RxState::Idle,
        }
    }

    /// Handle a detected edge on the rx line. `level` is the line level at
    /// the time of the interrupt; a start bit pulls the line low, so a high
    /// level means the edge was noise or the line releasing.
    pub fn on_edge(&mut self, level: bool, clock: &mut impl SampleClock) {
        if level {
            return;
        }
        if let RxState::Idle = self.state {
            clock.ignore_edges();
            clock.arm_half_bit();
            self.state = RxState::StartBit;
        }
    }

    /// Handle a timer tick, sampling the current line `level`. Returns the
    /// assembled byte once eight data bits have been sampled.
    ///
    /// A byte always completes after exactly eight samples; the stop bit is
    /// never checked, so a misaligned start silently desynchronizes until the
    /// line idles long enough for edge detection to recover.
    pub fn on_tick(&mut self, level: bool, clock: &mut impl SampleClock) -> Option<u8> {
        match self.state {
            RxState::Idle => None,
            RxState::StartBit => {
                // Mid start bit: from here on, every full period lands mid-bit.
                clock.arm_full_bit();
                self.state = RxState::Sampling { shift: 0, bits: 0 };
                None
            }
            RxState::Sampling { shift, bits } => {
                let shift = (shift << 1) | level as u8;
                let bits = bits + 1;
                if bits == 8 {
                    clock.disarm();
                    clock.watch_edges();
                    self.state = RxState::Idle;
                    // The shift register fills MSB-first while the wire sends
                    // LSB-first, so flip the bit order to get the byte back.
                    Some(reverse_byte(shift))
                } else {
                    self.state = RxState::Sampling { shift, bits };
                    None
                }
            }
        }
    }
}

/// Bit-order inversion (bit 0 <-> bit 7, bit 1 <-> bit 6, ...).
///
/// Involution: `reverse_byte(reverse_byte(x)) == x` for every byte.
pub fn reverse_byte(x: u8) -> u8 {
    x.reverse_bits()
}
