//! Sensor protocol parsers

mod prologue;
mod rubicson;

use std::fmt;

use strum::{Display, EnumIter};
use thiserror::Error;

use crate::bitbuf::BitMatrix;
use crate::slicer::PwmTiming;

/// Wireless sensor protocol families
///
/// Both families send a 36-bit packet, repeated several times per burst
/// with pulse-distance modulation; they differ in bit timing by roughly
/// 2×, which is why one slicer per protocol runs over the shared sample
/// stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Protocol {
    /// Rubicson wireless thermometer (36 bits, 12 repeats)
    Rubicson,

    /// Prologue wireless thermometer (36 bits, 7 repeats)
    Prologue,
}

impl Protocol {
    /// Pulse-timing thresholds, in filtered-sample counts at 48 kS/s
    pub fn timing(&self) -> PwmTiming {
        match self {
            Protocol::Rubicson => PwmTiming {
                short_limit: 1744,
                long_limit: 3500,
                reset_limit: 5000,
            },
            Protocol::Prologue => PwmTiming {
                short_limit: 3500,
                long_limit: 7000,
                reset_limit: 15_000,
            },
        }
    }

    /// Parse a completed packet group
    ///
    /// Neither protocol carries a checksum, so a cheap validity check
    /// gates every decode; a slicer flushes its matrix on *every* reset
    /// timeout and noise bursts are expected.
    pub fn parse(&self, matrix: &BitMatrix) -> Result<SensorReading, DecodeErr> {
        match self {
            Protocol::Rubicson => rubicson::parse(matrix).map(SensorReading::Rubicson),
            Protocol::Prologue => prologue::parse(matrix).map(SensorReading::Prologue),
        }
    }
}

/// Error decoding a packet group
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErr {
    /// The packet row carries no bits at all
    #[error("packet row contains no data")]
    EmptyRow,

    /// The fixed family nibble does not match
    #[error("family id nibble mismatch: expected {expected:#x}, got {got:#x}")]
    FamilyId { expected: u8, got: u8 },
}

/// A decoded sensor reading
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorReading {
    Rubicson(RubicsonReading),
    Prologue(PrologueReading),
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorReading::Rubicson(r) => r.fmt(f),
            SensorReading::Prologue(r) => r.fmt(f),
        }
    }
}

/// Temperature in tenths of a degree Celsius
///
/// Sensor packets carry temperature as a sign-extended 12-bit count of
/// tenths. `Display` renders the value the way the sensors' own
/// displays do: an explicit sign, then one decimal place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Celsius(i16);

impl Celsius {
    /// From a count of tenths of a degree
    pub fn from_tenths(tenths: i16) -> Self {
        Self(tenths)
    }

    /// Tenths of a degree
    pub fn tenths(&self) -> i16 {
        self.0
    }

    /// Degrees as floating point
    pub fn as_f32(&self) -> f32 {
        f32::from(self.0) / 10.0
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let tenths = (self.0 as i32).abs();
        write!(f, "{}{}.{}", sign, tenths / 10, tenths % 10)
    }
}

/// One decoded Rubicson packet
///
/// The sensor id changes whenever the battery is replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RubicsonReading {
    pub id: u8,
    pub temperature: Celsius,
}

impl fmt::Display for RubicsonReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rubicson: id={:02x} temp={}",
            self.id, self.temperature
        )
    }
}

/// One decoded Prologue packet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrologueReading {
    /// Family nibble, always `0x9`
    pub id: u8,
    /// Random id, regenerated at sensor power-up
    pub rid: u8,
    /// Channel selector on the sensor, 1..=3
    pub channel: u8,
    /// Transmission was triggered by the sensor's button
    pub button: bool,
    /// First reading since power-up
    pub first_reading: bool,
    pub temperature: Celsius,
}

impl fmt::Display for PrologueReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prologue: id={} rid={} ({:02x}) channel={} button={} first={} temp={}",
            self.id,
            self.rid,
            self.rid,
            self.channel,
            self.button as u8,
            self.first_reading as u8,
            self.temperature
        )
    }
}
