//! PWM pulse slicer

use crate::bitbuf::BitMatrix;

/// Pulse-timing thresholds for one protocol
///
/// All limits are filtered-sample counts at the 48 kS/s input rate.
/// The bits of this modulation family are carried by the *distance*
/// between fixed-width pulses:
///
/// * a gap shorter than `short_limit` encodes bit 0,
/// * a gap shorter than `long_limit` encodes bit 1,
/// * a longer gap separates packet repeats within a burst,
/// * quiet for more than `reset_limit` ends the burst.
///
/// `short_limit < long_limit < reset_limit` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmTiming {
    pub short_limit: u32,
    pub long_limit: u32,
    pub reset_limit: u32,
}

/// Level-crossing PWM demodulator for one protocol
///
/// One state machine per protocol instance; every instance consumes the
/// same filtered sample stream but keeps independent counters, so
/// protocols with ~2× different bit timing decode concurrently without
/// any pulse-timing classification up front.
///
/// State transitions, evaluated once per sample:
///
/// | State | Trigger                        | Next  |
/// |-------|--------------------------------|-------|
/// | idle  | sample above `level_limit`     | pulse |
/// | pulse | sample below `level_limit`     | gap   |
/// | gap   | sample above `level_limit`     | pulse (gap classified into a bit or a row advance) |
/// | any   | quiet for over `reset_limit`   | idle (burst complete) |
///
/// A gap of exactly `short_limit - 1` samples classifies as bit 0,
/// exactly `short_limit` as bit 1, and exactly `long_limit` advances
/// the packet row.
#[derive(Clone, Debug)]
pub struct PwmDemod {
    timing: PwmTiming,
    level_limit: i16,
    pulse_active: bool,
    in_gap: bool,
    counting: bool,
    sample_counter: u32,
    matrix: BitMatrix,
}

impl PwmDemod {
    /// New demodulator in the idle state
    pub fn new(timing: PwmTiming, level_limit: i16) -> Self {
        debug_assert!(timing.short_limit < timing.long_limit);
        debug_assert!(timing.long_limit < timing.reset_limit);
        Self {
            timing,
            level_limit,
            pulse_active: false,
            in_gap: false,
            counting: false,
            sample_counter: 0,
            matrix: BitMatrix::new(),
        }
    }

    /// Return to the idle state and clear the packet store
    pub fn reset(&mut self) {
        self.pulse_active = false;
        self.in_gap = false;
        self.counting = false;
        self.sample_counter = 0;
        self.matrix.reset();
    }

    /// Slice one block of filtered samples
    ///
    /// Gaps between pulses are classified into bits and packed into the
    /// packet matrix. Whenever a quiescent interval exceeds the reset
    /// limit, a snapshot of the completed matrix is appended to
    /// `completed` and the store is cleared for the next burst.
    ///
    /// State carries over between calls, so bursts that span block
    /// boundaries decode normally.
    pub fn process(&mut self, samples: &[i16], completed: &mut Vec<BitMatrix>) {
        for &s in samples {
            if self.in_gap && s > self.level_limit {
                // rising edge closes the gap; classify its length
                if self.sample_counter < self.timing.short_limit {
                    self.matrix.add_bit(false);
                } else if self.sample_counter < self.timing.long_limit {
                    self.matrix.add_bit(true);
                } else {
                    self.matrix.next_row();
                    self.pulse_active = false;
                    self.sample_counter = 0;
                }
                self.in_gap = false;
            }
            if s > self.level_limit {
                self.pulse_active = true;
                self.counting = true;
            }
            if self.pulse_active && s < self.level_limit {
                self.in_gap = true;
                self.sample_counter = 0;
                self.pulse_active = false;
            }
            if self.counting {
                self.sample_counter += 1;
            }
            if self.sample_counter > self.timing.reset_limit {
                self.counting = false;
                self.sample_counter = 0;
                self.in_gap = false;
                completed.push(self.matrix);
                self.matrix.reset();
            }
        }
    }

    /// Timing thresholds in use
    pub fn timing(&self) -> PwmTiming {
        self.timing
    }

    /// Packet store of the burst currently being received
    pub fn matrix(&self) -> &BitMatrix {
        &self.matrix
    }
}
