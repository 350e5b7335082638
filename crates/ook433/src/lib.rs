//! # ook433: 433.92 MHz OOK/ASK sensor telemetry
//!
//! This crate turns a quadrature IQ sample stream, tuned near 433.92 MHz,
//! into decoded telemetry from low-cost amplitude-shift-keyed wireless
//! sensors. It understands the Rubicson and Prologue wireless thermometer
//! families, which transmit temperature, channel, identifier and button
//! flags with pulse-distance modulation.
//!
//! ## Example
//!
//! You will first need a source of raw IQ samples at 48 kS/s: interleaved
//! unsigned I/Q bytes, biased around `0x80`, as produced by `rtl_sdr` and
//! friends. Obtaining the samples is beyond the scope of this crate.
//!
//! ```
//! use ook433::OokReceiverBuilder;
//!
//! // create a receiver with the pulse detection level for your antenna
//! let mut rx = OokReceiverBuilder::new()
//!     .with_level_limit(10_000)
//!     .build();
//!
//! // iq: interleaved unsigned I/Q bytes, biased around 0x80
//! let iq = vec![0x80u8; 4096];
//! for burst in rx.process(&iq) {
//!     match burst.reading {
//!         Ok(reading) => println!("{}", reading),
//!         Err(_) => {} // noise burst; the raw bits are in burst.matrix
//!     }
//! }
//! ```
//!
//! The receiver is created via a [builder](struct.OokReceiverBuilder.html).
//!
//! [`OokReceiver::process()`](struct.OokReceiver.html#method.process)
//! accepts one sample block at a time and may be called with blocks of any
//! (even) length; filter and slicer state carry over between blocks, so a
//! pulse train split across block boundaries decodes the same as one
//! delivered whole.
//!
//! Each completed transmission burst is reported as a
//! [`BurstEvent`](struct.BurstEvent.html), which always carries the raw
//! packed [bit matrix](struct.BitMatrix.html) alongside the parse result.
//! Both protocols lack any checksum, so bursts that fail the per-protocol
//! validity checks are reported with a [`DecodeErr`](enum.DecodeErr.html)
//! rather than silently dropped.
//!
//! ## Signal chain
//!
//! 1. Envelope detection: IQ pairs are re-centered and reduced to
//!    magnitude², with optional power-of-two decimation.
//! 2. Low-pass filtering: a first-order IIR in Q1.15 fixed point smooths
//!    the envelope. All arithmetic is integer-only.
//! 3. Pulse slicing: one level-crossing state machine per protocol
//!    classifies inter-pulse gaps into bits and packs them into a
//!    12-row × 5-byte matrix, one packet repeat per row.
//! 4. Parsing: at each quiescent interval the matrix is handed to the
//!    protocol parser and reported to the caller.
//!
//! The two protocol slicers differ in bit timing by roughly 2×, so both
//! run concurrently over the same filtered stream; they share no state.

#![allow(dead_code)]

mod analyze;
mod bitbuf;
mod builder;
mod envelope;
mod filter;
mod protocols;
mod receiver;
mod slicer;

pub use bitbuf::BitMatrix;
pub use builder::OokReceiverBuilder;
pub use protocols::{
    Celsius, DecodeErr, PrologueReading, Protocol, RubicsonReading, SensorReading,
};
pub use receiver::{BurstEvent, OokReceiver};
pub use slicer::PwmTiming;
