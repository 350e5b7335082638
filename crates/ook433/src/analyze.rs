//! Pulse-inspection reporter

#[cfg(not(test))]
use log::info;

#[cfg(test)]
use std::println as info;

/// Pulse timing reporter for analysis mode
///
/// A diagnostic alternative to the protocol slicers: it reports the
/// start and end sample index of every pulse crossing the detection
/// level, the distance from the previous pulse, and a running average
/// pulse length. It never touches protocol state.
///
/// The sample counter and the pulse-length average accumulate over the
/// analyzer's whole lifetime; the average is *not* reset between
/// bursts, so it converges on the mean of every pulse seen since
/// startup.
#[derive(Clone, Debug)]
pub struct PulseAnalyzer {
    level_limit: i16,
    counter: u64,
    in_pulse: bool,
    pulses_found: u32,
    pulse_start: u64,
    pulse_end: u64,
    length_sum: u64,
}

impl PulseAnalyzer {
    /// New analyzer with its lifetime counters at zero
    pub fn new(level_limit: i16) -> Self {
        Self {
            level_limit,
            counter: 0,
            in_pulse: false,
            pulses_found: 0,
            pulse_start: 0,
            pulse_end: 0,
            length_sum: 0,
        }
    }

    /// Clear all lifetime counters
    pub fn reset(&mut self) {
        *self = Self::new(self.level_limit);
    }

    /// Inspect one block of filtered samples
    pub fn process(&mut self, samples: &[i16]) {
        for &s in samples {
            if s > self.level_limit && !self.in_pulse {
                self.pulses_found += 1;
                info!("pulse_distance {}", self.counter - self.pulse_end);
                info!(
                    "pulse_start[{}] found at sample {}, value = {}",
                    self.pulses_found, self.counter, s
                );
                self.pulse_start = self.counter;
                self.in_pulse = true;
            }
            self.counter += 1;
            if s < self.level_limit && self.in_pulse {
                self.length_sum += self.counter - self.pulse_start;
                info!(
                    "pulse_end  [{}] found at sample {}, pulse length = {}, pulse avg length = {}",
                    self.pulses_found,
                    self.counter,
                    self.counter - self.pulse_start,
                    self.length_sum / self.pulses_found as u64
                );
                self.pulse_end = self.counter;
                self.in_pulse = false;
            }
        }
    }

    /// Lifetime count of pulses seen
    pub fn pulses_found(&self) -> u32 {
        self.pulses_found
    }

    /// Start sample index of the most recent pulse
    pub fn last_start(&self) -> u64 {
        self.pulse_start
    }

    /// End sample index of the most recent completed pulse
    pub fn last_end(&self) -> u64 {
        self.pulse_end
    }

    /// Lifetime average pulse length, in samples
    pub fn average_length(&self) -> u64 {
        if self.pulses_found == 0 {
            0
        } else {
            self.length_sum / self.pulses_found as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: i16 = 10_000;

    fn samples_with_pulses(len: usize, pulses: &[(usize, usize)]) -> Vec<i16> {
        let mut v = vec![0i16; len];
        for &(start, width) in pulses {
            for s in v[start..start + width].iter_mut() {
                *s = 20_000;
            }
        }
        v
    }

    #[test]
    fn test_three_pulse_report() {
        // pulses of width 604 at samples 1000, 2200 and 3400
        let samples =
            samples_with_pulses(6000, &[(1000, 604), (2200, 604), (3400, 604)]);
        let mut uut = PulseAnalyzer::new(LEVEL);
        uut.process(&samples);

        assert_eq!(uut.pulses_found(), 3);
        assert_eq!(uut.last_start(), 3400);
        // the end index is reported one past the final pulse sample
        assert_eq!(uut.last_end(), 4005);
        assert_eq!(uut.average_length(), 605);
    }

    #[test]
    fn test_average_accumulates_across_blocks() {
        let mut uut = PulseAnalyzer::new(LEVEL);
        uut.process(&samples_with_pulses(2000, &[(100, 99)]));
        assert_eq!(uut.average_length(), 100);

        // a second burst does not restart the average
        uut.process(&samples_with_pulses(2000, &[(100, 299)]));
        assert_eq!(uut.pulses_found(), 2);
        assert_eq!(uut.average_length(), 200);
    }

    #[test]
    fn test_silence_counts_no_pulses() {
        let mut uut = PulseAnalyzer::new(LEVEL);
        uut.process(&vec![0i16; 10_000]);
        assert_eq!(uut.pulses_found(), 0);
        assert_eq!(uut.average_length(), 0);
        assert_eq!(uut.counter, 10_000);
    }

    #[test]
    fn test_reset() {
        let mut uut = PulseAnalyzer::new(LEVEL);
        uut.process(&samples_with_pulses(2000, &[(100, 50)]));
        uut.reset();
        assert_eq!(uut.pulses_found(), 0);
        assert_eq!(uut.counter, 0);
    }
}
