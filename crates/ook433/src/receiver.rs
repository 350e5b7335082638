//! Full receiver chain

use std::collections::VecDeque;
use std::fmt;

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use crate::analyze::PulseAnalyzer;
use crate::bitbuf::BitMatrix;
use crate::builder::OokReceiverBuilder;
use crate::envelope::envelope_detect;
use crate::filter::LowPass;
use crate::protocols::{DecodeErr, Protocol, SensorReading};
use crate::slicer::PwmDemod;

/// One completed transmission burst
///
/// Emitted whenever a protocol slicer sees a quiescent interval longer
/// than its reset limit. The raw packed bits are always carried in
/// `matrix`; `reading` holds the parsed fields if the burst passed the
/// protocol's validity check. Neither protocol has a checksum, so
/// noise bursts with a `DecodeErr` are an expected, frequent outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BurstEvent {
    /// Protocol whose slicer completed the burst
    pub protocol: Protocol,
    /// The packet group exactly as sliced
    pub matrix: BitMatrix,
    /// Parsed reading, or why the burst did not decode
    pub reading: Result<SensorReading, DecodeErr>,
}

impl fmt::Display for BurstEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reading {
            Ok(reading) => write!(f, "{}", reading),
            Err(err) => write!(f, "{}: no decode: {}", self.protocol, err),
        }
    }
}

/// A complete OOK sensor receiver chain
///
/// The receiver takes blocks of interleaved unsigned IQ bytes and
/// performs the following operations:
///
/// 1. Envelope detection with optional power-of-two decimation
/// 2. First-order IIR low-pass filtering, integer fixed point
/// 3. Pulse slicing, one PWM state machine per enabled protocol
/// 4. Packet parsing at every burst boundary
///
/// In analysis mode, step 3 and 4 are replaced by a pulse timing
/// reporter and no events are emitted.
///
/// To create the receiver, first create its
/// [builder](crate::OokReceiverBuilder):
///
/// ```
/// use ook433::OokReceiverBuilder;
///
/// let mut receiver = OokReceiverBuilder::default().build();
/// assert!(receiver.process(&[0x80u8; 512]).next().is_none());
/// ```
///
/// Blocks may have any even length, and bursts that span block
/// boundaries decode normally: filter history and slicer state carry
/// over from call to call.
#[derive(Clone, Debug)]
pub struct OokReceiver {
    decimation: u32,
    lowpass: LowPass,
    demods: Vec<(Protocol, PwmDemod)>,
    analyzer: Option<PulseAnalyzer>,
    envelope_buf: Vec<u16>,
    filtered: Vec<i16>,
    completed: Vec<BitMatrix>,
    events: VecDeque<BurstEvent>,
    input_sample_counter: u64,
}

impl OokReceiver {
    /// Process one block of IQ samples
    ///
    /// `iq` holds interleaved unsigned I/Q bytes biased around `0x80`;
    /// its length must be even. Returns a draining iterator over the
    /// burst events completed within this block, oldest first. Events
    /// not consumed are dropped.
    pub fn process(&mut self, iq: &[u8]) -> impl Iterator<Item = BurstEvent> + '_ {
        envelope_detect(iq, self.decimation, &mut self.envelope_buf);
        self.lowpass.filter(&self.envelope_buf, &mut self.filtered);
        self.input_sample_counter += (iq.len() / 2) as u64;

        if let Some(analyzer) = self.analyzer.as_mut() {
            analyzer.process(&self.filtered);
        } else {
            for (protocol, demod) in self.demods.iter_mut() {
                demod.process(&self.filtered, &mut self.completed);
                for matrix in self.completed.drain(..) {
                    let reading = protocol.parse(&matrix);
                    debug!("{} burst:\n{}", protocol, matrix);
                    self.events.push_back(BurstEvent {
                        protocol: *protocol,
                        matrix,
                        reading,
                    });
                }
            }
        }

        self.events.drain(..)
    }

    /// Filtered samples of the most recent block
    ///
    /// One signed 16-bit sample per (decimated) input pair; intended
    /// for persistence to a raw sample sink.
    pub fn filtered(&self) -> &[i16] {
        &self.filtered
    }

    /// Lifetime total of IQ sample pairs processed
    pub fn input_sample_counter(&self) -> u64 {
        self.input_sample_counter
    }

    /// Decimation exponent in use
    pub fn decimation(&self) -> u32 {
        self.decimation
    }

    /// Clear all DSP state and return to zero initial conditions
    pub fn reset(&mut self) {
        self.lowpass.reset();
        for (_, demod) in self.demods.iter_mut() {
            demod.reset();
        }
        if let Some(analyzer) = self.analyzer.as_mut() {
            analyzer.reset();
        }
        self.envelope_buf.clear();
        self.filtered.clear();
        self.completed.clear();
        self.events.clear();
        self.input_sample_counter = 0;
    }
}

impl From<&OokReceiverBuilder> for OokReceiver {
    fn from(cfg: &OokReceiverBuilder) -> Self {
        let demods = cfg
            .protocols()
            .iter()
            .map(|&p| (p, PwmDemod::new(p.timing(), cfg.level_limit())))
            .collect();
        Self {
            decimation: cfg.decimation(),
            lowpass: LowPass::new(),
            demods,
            analyzer: cfg
                .analyze()
                .then(|| PulseAnalyzer::new(cfg.level_limit())),
            envelope_buf: Vec::new(),
            filtered: Vec::new(),
            completed: Vec::new(),
            events: VecDeque::new(),
            input_sample_counter: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocols::RubicsonReading;
    use crate::Celsius;

    /// `pairs` IQ pairs of one level: 0xFF is a strong carrier
    /// (magnitude² 32258), 0x80 is silence.
    fn iq(pairs: usize, byte: u8) -> Vec<u8> {
        vec![byte; pairs * 2]
    }

    /// A Rubicson-timed pulse train encoding `bits` into row 0.
    ///
    /// Gap lengths sit far from the classification thresholds so the
    /// low-pass group delay cannot tip them over.
    fn train(bits: &[bool]) -> Vec<u8> {
        let mut v = iq(200, 0x80);
        v.extend(iq(600, 0xff));
        for &bit in bits {
            v.extend(iq(if bit { 2500 } else { 1000 }, 0x80));
            v.extend(iq(600, 0xff));
        }
        // quiet long enough to flush Rubicson (5000) but not
        // Prologue (15000)
        v.extend(iq(6000, 0x80));
        v
    }

    fn bits_of(byte: u8) -> Vec<bool> {
        (0..8).rev().map(|k| (byte >> k) & 1 != 0).collect()
    }

    #[test]
    fn test_silence_produces_no_events() {
        let mut rx = OokReceiverBuilder::default().build();
        assert_eq!(rx.process(&iq(30_000, 0x80)).count(), 0);
        assert!(rx.filtered().iter().all(|&s| s == 0));
        assert_eq!(rx.input_sample_counter(), 30_000);
    }

    #[test]
    fn test_end_to_end_rubicson_decode() {
        let mut rx = OokReceiverBuilder::default().build();
        let events: Vec<BurstEvent> = rx.process(&train(&bits_of(0x05))).collect();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.protocol, Protocol::Rubicson);
        assert_eq!(event.matrix.row(0)[0], 0x05);
        assert_eq!(
            event.reading,
            Ok(SensorReading::Rubicson(RubicsonReading {
                id: 0x05,
                temperature: Celsius::from_tenths(0),
            }))
        );
    }

    #[test]
    fn test_deterministic_decoding() {
        let stream = train(&bits_of(0xc3));

        let mut a = OokReceiverBuilder::default().build();
        let mut b = OokReceiverBuilder::default().build();
        let got_a: Vec<BurstEvent> = a.process(&stream).collect();
        let got_b: Vec<BurstEvent> = b.process(&stream).collect();

        assert!(!got_a.is_empty());
        assert_eq!(got_a, got_b);
        assert_eq!(a.filtered(), b.filtered());
    }

    #[test]
    fn test_block_split_equivalence() {
        let stream = train(&bits_of(0x9d));

        let mut whole = OokReceiverBuilder::default().build();
        let expect: Vec<BurstEvent> = whole.process(&stream).collect();
        assert!(!expect.is_empty());

        for chunk in [2usize, 64, 1024, 4096] {
            let mut rx = OokReceiverBuilder::default().build();
            let mut got = Vec::new();
            for block in stream.chunks(chunk) {
                got.extend(rx.process(block));
            }
            assert_eq!(got, expect, "chunk size {}", chunk);
        }
    }

    #[test]
    fn test_protocols_decode_in_isolation() {
        let stream = train(&bits_of(0x31));

        let mut both = OokReceiverBuilder::default().build();
        let from_both: Vec<BurstEvent> = both
            .process(&stream)
            .filter(|e| e.protocol == Protocol::Rubicson)
            .collect();

        let mut alone = OokReceiverBuilder::default()
            .with_protocols(&[Protocol::Rubicson])
            .build();
        let from_alone: Vec<BurstEvent> = alone.process(&stream).collect();

        assert_eq!(from_both, from_alone);
    }

    #[test]
    fn test_prologue_flush_carries_decode_error() {
        // quiet for longer than the Prologue reset limit: both slicers
        // flush, and the Prologue burst fails its family check
        let mut stream = train(&bits_of(0x05));
        stream.extend(iq(16_000, 0x80));

        let mut rx = OokReceiverBuilder::default().build();
        let events: Vec<BurstEvent> = rx.process(&stream).collect();

        let prologue: Vec<&BurstEvent> = events
            .iter()
            .filter(|e| e.protocol == Protocol::Prologue)
            .collect();
        assert_eq!(prologue.len(), 1);
        assert!(prologue[0].reading.is_err());
    }

    #[test]
    fn test_decimation_shortens_filtered_block() {
        let mut rx = OokReceiverBuilder::default().with_decimation(2).build();
        let _ = rx.process(&iq(1024, 0x80)).count();
        assert_eq!(rx.filtered().len(), 256);
    }

    #[test]
    fn test_analyze_mode_emits_no_events() {
        let mut rx = OokReceiverBuilder::default().with_analyze(true).build();
        assert_eq!(rx.process(&train(&bits_of(0xff))).count(), 0);
    }

    #[test]
    fn test_reset_restores_initial_conditions() {
        let stream = train(&bits_of(0x2a));

        let mut rx = OokReceiverBuilder::default().build();
        let first: Vec<BurstEvent> = rx.process(&stream).collect();
        rx.reset();
        assert_eq!(rx.input_sample_counter(), 0);
        let second: Vec<BurstEvent> = rx.process(&stream).collect();
        assert_eq!(first, second);
    }
}
