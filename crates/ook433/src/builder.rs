//! Receiver configuration

use strum::IntoEnumIterator;

use crate::protocols::Protocol;
use crate::receiver::OokReceiver;

/// Builds an OOK sensor receiver
///
/// The builder comes with the defaults the decoder was tuned for: a
/// 48 kS/s input stream and a pulse detection level of 10 000. The
/// protocol timing tables assume the input rate, so avoid resampling
/// the IQ stream; use decimation instead if the envelope is slow
/// enough.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OokReceiverBuilder {
    level_limit: i16,
    decimation: u32,
    analyze: bool,
    protocols: Vec<Protocol>,
}

impl OokReceiverBuilder {
    /// New receiver configuration with default settings
    ///
    /// All protocols are enabled and analysis mode is off.
    pub fn new() -> Self {
        Self {
            level_limit: 10_000,
            decimation: 0,
            analyze: false,
            protocols: Protocol::iter().collect(),
        }
    }

    /// Build a receiver
    ///
    /// Once built, the receiver is immediately ready to process sample
    /// blocks.
    pub fn build(&self) -> OokReceiver {
        OokReceiver::from(self)
    }

    /// Pulse detection level
    ///
    /// The filtered envelope magnitude² above which a sample counts as
    /// part of a pulse. Raise it for noisy antennas, lower it for weak
    /// sensors. Negative values clamp to zero.
    pub fn with_level_limit(&mut self, level_limit: i16) -> &mut Self {
        self.level_limit = level_limit.max(0);
        self
    }

    /// Decimation exponent
    ///
    /// Keeps one IQ pair out of every `2^decimation`. Clamped to 0..=4;
    /// the sensor pulses become too short to slice reliably beyond
    /// that. Note the protocol gap thresholds are fixed sample counts,
    /// so decimation also scales the effective bit timing.
    pub fn with_decimation(&mut self, decimation: u32) -> &mut Self {
        self.decimation = decimation.min(4);
        self
    }

    /// Analysis mode
    ///
    /// When enabled, the receiver reports pulse timing instead of
    /// decoding: no protocol slicer runs and no burst events are
    /// emitted.
    pub fn with_analyze(&mut self, analyze: bool) -> &mut Self {
        self.analyze = analyze;
        self
    }

    /// Protocols to decode
    ///
    /// Each listed protocol gets its own slicer over the shared
    /// filtered stream. Duplicates are kept verbatim.
    pub fn with_protocols(&mut self, protocols: &[Protocol]) -> &mut Self {
        self.protocols = protocols.to_vec();
        self
    }

    /// Pulse detection level
    pub fn level_limit(&self) -> i16 {
        self.level_limit
    }

    /// Decimation exponent
    pub fn decimation(&self) -> u32 {
        self.decimation
    }

    /// True if analysis mode is enabled
    pub fn analyze(&self) -> bool {
        self.analyze
    }

    /// Protocols to decode
    pub fn protocols(&self) -> &[Protocol] {
        &self.protocols
    }
}

impl std::default::Default for OokReceiverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let builder = OokReceiverBuilder::default();
        assert_eq!(builder.level_limit(), 10_000);
        assert_eq!(builder.decimation(), 0);
        assert!(!builder.analyze());
        assert_eq!(
            builder.protocols(),
            &[Protocol::Rubicson, Protocol::Prologue]
        );
    }

    #[test]
    fn test_clamps() {
        let mut builder = OokReceiverBuilder::new();
        builder.with_level_limit(-5).with_decimation(9);
        assert_eq!(builder.level_limit(), 0);
        assert_eq!(builder.decimation(), 4);
    }

    #[test]
    fn test_protocol_selection() {
        let mut builder = OokReceiverBuilder::new();
        builder.with_protocols(&[Protocol::Prologue]);
        assert_eq!(builder.protocols(), &[Protocol::Prologue]);
    }
}
