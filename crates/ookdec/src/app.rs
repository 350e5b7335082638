//! Per-block decode loop

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use byteorder::{NativeEndian, WriteBytesExt};
use log::{debug, info};
use ook433::OokReceiver;

use crate::cli::Args;
use crate::source::SampleSource;

/// Run the decode loop until the input is exhausted
///
/// Each iteration polls the shutdown flag, reads one sample block from
/// `source` (truncated to the remaining byte budget, if any), runs it
/// through the `receiver`, prints decoded readings to standard error,
/// and persists the filtered samples to `sink` if one is given.
///
/// A write error on the sink loses samples and is fatal. Returns the
/// total count of bytes consumed.
pub fn run<S, W>(
    args: &Args,
    receiver: &mut OokReceiver,
    source: &mut S,
    mut sink: Option<W>,
    shutdown: &AtomicBool,
) -> Result<u64, anyhow::Error>
where
    S: SampleSource,
    W: Write,
{
    let block_size = args.effective_block_size();
    let mut block = vec![0u8; block_size];
    let mut remaining = args.bytes_to_read();
    let mut consumed = 0u64;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("shutdown requested, exiting");
            break;
        }

        let filled = read_block(source, &mut block)?;
        if filled == 0 {
            info!("end of input");
            break;
        }

        // whole pairs only; a trailing odd byte means a truncated capture
        let mut len = filled & !1;
        if len < filled {
            debug!("dropping trailing odd byte");
        }

        // budget exhaustion mid-block truncates and cancels the source
        let mut budget_spent = false;
        if let Some(rem) = remaining {
            if rem <= len as u64 {
                len = rem as usize;
                budget_spent = true;
            }
        }

        for event in receiver.process(&block[..len]) {
            match &event.reading {
                Ok(reading) => eprintln!("{}", reading),
                Err(err) => debug!("{}: no decode: {}", event.protocol, err),
            }
        }

        if let Some(out) = sink.as_mut() {
            write_filtered(out, receiver.filtered())
                .context("short write, samples lost, exiting")?;
        }

        consumed += len as u64;
        if let Some(rem) = remaining.as_mut() {
            *rem -= len as u64;
        }
        if budget_spent {
            info!("sample budget spent");
            source.cancel();
            break;
        }
    }

    Ok(consumed)
}

/// Fill `block` from the source, tolerating short reads
///
/// Returns the number of bytes read, which is less than the block
/// length only at end of input.
fn read_block<S>(source: &mut S, block: &mut [u8]) -> Result<usize, anyhow::Error>
where
    S: SampleSource,
{
    let mut filled = 0;
    while filled < block.len() {
        match source.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("read from sample source failed"),
        }
    }
    Ok(filled)
}

/// Persist one block of filtered samples as native-endian i16
fn write_filtered<W>(out: &mut W, samples: &[i16]) -> io::Result<()>
where
    W: Write,
{
    for &sample in samples {
        out.write_i16::<NativeEndian>(sample)?;
    }
    Ok(())
}
