use std::fs::File;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::{info, warn, LevelFilter};

use ook433::OokReceiverBuilder;

mod app;
mod cli;
mod source;

use cli::{Args, CliError};
use source::FileSource;

fn main() {
    match ookdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn ookdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);
    banner(&args);

    // create the decoder
    let mut receiver = OokReceiverBuilder::new()
        .with_level_limit(args.level_limit.min(i16::MAX as u32) as i16)
        .with_decimation(args.decimation)
        .with_analyze(args.analyze)
        .build();

    // sample source: this build decodes from files and pipes only
    let input = args.read_file.as_deref().ok_or_else(|| {
        anyhow!(
            "no sample source: this build reads IQ samples from a file \
             or a pipe (-r PATH, \"-\" for stdin)"
        )
    })?;
    let mut source = FileSource::open(input)?;

    // cooperative shutdown: the handler must also cancel the source so
    // a blocking read returns promptly
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        let cancel = source.cancel_token();
        ctrlc::set_handler(move || {
            eprintln!("signal caught, exiting");
            shutdown.store(true, Ordering::Relaxed);
            cancel.store(true, Ordering::Relaxed);
        })
        .context("unable to install signal handler")?;
    }

    let sink = sink_setup(&args)?;

    let consumed = app::run(&args, &mut receiver, &mut source, sink, &shutdown)?;
    info!(
        "{} bytes processed ({} sample pairs)",
        consumed,
        receiver.input_sample_counter()
    );

    Ok(())
}

fn log_setup(args: &Args) {
    let log_filter = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        pretty_env_logger::formatted_builder()
            .filter_module("ook433", log_filter)
            .filter_module("ookdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

/// Log the effective configuration
///
/// The hardware tuning flags are accepted for command-line
/// compatibility; actual tuning belongs to the SDR driver producing
/// the sample stream.
fn banner(args: &Args) {
    info!(
        "tuning requested: {} Hz at {} S/s on device {}",
        args.frequency, args.sample_rate, args.device
    );
    if args.gain_tenths() == 0 {
        info!("tuner gain: auto");
    } else {
        info!("tuner gain: {:.1} dB", args.gain_tenths() as f64 / 10.0);
    }
    if args.sync_mode {
        info!("synchronous driver reads requested");
    }
    if args.sample_rate != 48_000 {
        warn!("protocol pulse timing assumes 48000 S/s; decoding at other rates is unreliable");
    }
    info!(
        "sample rate decimation set to {}. {} -> {}",
        args.decimation,
        args.sample_rate,
        args.sample_rate >> args.decimation.min(4)
    );
    info!("bit detection level set to {}", args.level_limit);
    if args.analyze {
        info!("analysis mode: reporting pulse timing only");
    }
}

fn sink_setup(args: &Args) -> Result<Option<Box<dyn Write>>, anyhow::Error> {
    match args.output.as_deref() {
        None => Ok(None),
        Some(cli::STDIO_FILE) => {
            info!("dumping filtered samples to standard output");
            Ok(Some(Box::new(io::stdout())))
        }
        Some(path) => {
            info!("writing filtered samples to \"{}\"", path);
            Ok(Some(Box::new(
                File::create(path)
                    .with_context(|| format!("unable to create \"{}\"", path))?,
            )))
        }
    }
}
