use clap::Parser;
use log::warn;

/// Standard stream pseudo-filename
pub const STDIO_FILE: &str = "-";

/// Default sample block size, in bytes
pub const DEFAULT_BLOCK_SIZE: u32 = 262_144;

const MINIMAL_BLOCK_SIZE: u32 = 512;
const MAXIMAL_BLOCK_SIZE: u32 = 4_194_304;

const USAGE_SHORT: &str = r#"
This program decodes Rubicson and Prologue wireless thermometer packets from a raw IQ sample stream tuned near 433.92 MHz. Samples are interleaved unsigned I/Q bytes biased around 0x80, at 48 kS/s, as produced by rtl_sdr and friends. Decoded readings are printed to standard error.

See --help for more details.
"#;

const USAGE_LONG: &str = r#"
This program decodes Rubicson and Prologue wireless thermometer packets from a raw IQ sample stream tuned near 433.92 MHz. Samples are interleaved unsigned I/Q bytes biased around 0x80, at 48 kS/s, as produced by rtl_sdr and friends. Decoded readings are printed to standard error.

This build reads samples from a file or a pipe:

    rtl_sdr -f 433920000 -s 48000 - | ookdec -r -

A previously captured file decodes the same way:

    ookdec -r capture.iq

An output filename argument stores the filtered envelope as native-endian signed 16-bit samples; "-" dumps them to standard output. Decoded readings always go to standard error, so dumping samples to a pipe does not corrupt them.

With -a, pulse timing is reported instead of decoding. Use it to find the right detection level (-l) for your antenna.
"#;

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about = "A 433.92 MHz OOK/ASK sensor telemetry decoder")]
#[command(long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Device index
    #[arg(short = 'd', long = "device", default_value_t = 0, value_parser = parse_count)]
    pub device: u32,

    /// Center frequency (Hz)
    #[arg(short = 'f', long = "frequency", default_value_t = 433_920_000, value_parser = parse_count)]
    pub frequency: u32,

    /// Sample rate (Hz)
    #[arg(short = 's', long = "sample-rate", default_value_t = 48_000, value_parser = parse_count)]
    pub sample_rate: u32,

    /// Tuner gain (dB, 0 for auto)
    #[arg(short = 'g', long = "gain", default_value_t = 0.0)]
    pub gain: f64,

    /// Sample block size (bytes)
    #[arg(short = 'b', long = "block-size", default_value_t = DEFAULT_BLOCK_SIZE, value_parser = parse_count)]
    pub block_size: u32,

    /// Pulse detection level on the filtered envelope
    #[arg(short = 'l', long = "level-limit", default_value_t = 10_000, value_parser = parse_count)]
    pub level_limit: u32,

    /// Decimation exponent: keep one pair in 2^N
    #[arg(short = 'c', long = "decimation", default_value_t = 0, value_parser = parse_count)]
    pub decimation: u32,

    /// Stop after this many sample pairs
    #[arg(short = 'n', long = "sample-count", value_parser = parse_count)]
    pub sample_count: Option<u32>,

    /// Analysis mode: report pulse timing, do not decode
    #[arg(short = 'a', long = "analyze")]
    pub analyze: bool,

    /// Read IQ samples from a file ("-" for stdin) instead of a receiver
    #[arg(short = 'r', long = "read-file")]
    pub read_file: Option<String>,

    /// Force synchronous driver reads
    #[arg(short = 'S', long = "sync")]
    pub sync_mode: bool,

    /// Filtered sample output path; "-" dumps to stdout. Optional.
    pub output: Option<String>,
}

impl Args {
    /// True if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.read_file.as_deref() == Some(STDIO_FILE)
    }

    /// True if filtered samples go to stdout
    pub fn output_is_stdout(&self) -> bool {
        self.output.as_deref() == Some(STDIO_FILE)
    }

    /// Tuner gain in tenths of a dB
    pub fn gain_tenths(&self) -> i32 {
        (self.gain * 10.0) as i32
    }

    /// Byte budget derived from the sample-pair count
    pub fn bytes_to_read(&self) -> Option<u64> {
        self.sample_count.map(|pairs| u64::from(pairs) * 2)
    }

    /// Block size, with out-of-range values falling back to the default
    pub fn effective_block_size(&self) -> usize {
        if !(MINIMAL_BLOCK_SIZE..=MAXIMAL_BLOCK_SIZE).contains(&self.block_size) {
            warn!(
                "block size out of range [{}, {}], falling back to {}",
                MINIMAL_BLOCK_SIZE, MAXIMAL_BLOCK_SIZE, DEFAULT_BLOCK_SIZE
            );
            DEFAULT_BLOCK_SIZE as usize
        } else {
            self.block_size as usize
        }
    }
}

/// Parse a numeric argument in decimal or floating-point form
///
/// Every numeric flag accepts forms like `48e3` or `262144.0`;
/// floating-point input truncates toward zero.
fn parse_count(arg: &str) -> Result<u32, String> {
    if let Ok(n) = arg.parse::<u32>() {
        return Ok(n);
    }
    match arg.parse::<f64>() {
        Ok(f) if f >= 0.0 => Ok(f as u32),
        Ok(_) => Err("value may not be negative".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

/// A fatal program error, split by who renders it
///
/// Usage problems keep clap's own formatting (and its convention of
/// exiting 0 for `--help`/`--version`); everything after argument
/// parsing is an `anyhow` chain printed on one line.
#[derive(Debug)]
pub enum CliError {
    Usage(clap::Error),
    Fatal(anyhow::Error),
}

impl CliError {
    /// Print this error to standard error and exit
    ///
    /// Fatal errors exit nonzero; clean terminations never reach here.
    pub fn exit(self) -> ! {
        match self {
            CliError::Usage(err) => err.exit(),
            CliError::Fatal(err) => {
                eprintln!("ookdec: error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        CliError::Usage(err)
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::Fatal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_count_forms() {
        assert_eq!(parse_count("48000"), Ok(48_000));
        assert_eq!(parse_count("48e3"), Ok(48_000));
        assert_eq!(parse_count("262144.7"), Ok(262_144));
        assert!(parse_count("-1").is_err());
        assert!(parse_count("forty").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["ookdec"]).unwrap();
        assert_eq!(args.frequency, 433_920_000);
        assert_eq!(args.sample_rate, 48_000);
        assert_eq!(args.level_limit, 10_000);
        assert_eq!(args.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(args.bytes_to_read(), None);
        assert!(!args.analyze);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_budget_is_twice_the_pair_count() {
        let args = Args::try_parse_from(["ookdec", "-n", "1000"]).unwrap();
        assert_eq!(args.bytes_to_read(), Some(2000));
    }

    #[test]
    fn test_block_size_fallback() {
        let args = Args::try_parse_from(["ookdec", "-b", "100"]).unwrap();
        assert_eq!(args.effective_block_size(), DEFAULT_BLOCK_SIZE as usize);

        let args = Args::try_parse_from(["ookdec", "-b", "1024"]).unwrap();
        assert_eq!(args.effective_block_size(), 1024);
    }

    #[test]
    fn test_gain_tenths() {
        let args = Args::try_parse_from(["ookdec", "-g", "49.6"]).unwrap();
        assert_eq!(args.gain_tenths(), 496);
    }

    #[test]
    fn test_stdio_paths() {
        let args = Args::try_parse_from(["ookdec", "-r", "-", "-"]).unwrap();
        assert!(args.input_is_stdin());
        assert!(args.output_is_stdout());
    }
}
