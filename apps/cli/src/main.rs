mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use temperhum_core::protocol::constants::MAX_TIMEOUT_MS;
use temperhum_core::{
    DecodePolicy, DeviceIdentity, LibusbTransport, RunOutcome, Session, SessionConfig,
    TemperatureUnit,
};
use tracing::{debug, error, warn};

use output::{EXIT_CONFIG, OutputOptions, exit_code, render};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Reads the temperature and humidity from a PCSensor TEMPerHUM USB sensor (USB ID 413d:2107)",
    long_about = None
)]
struct Args {
    /// Output temperature in Fahrenheit, default is Celsius
    #[arg(short = 'f', long, visible_alias = "f")]
    fahrenheit: bool,

    /// Do not show C, F or %
    #[arg(long)]
    nosymbols: bool,

    /// Include the raw data from the sensor in the output, as hex bytes
    #[arg(long)]
    raw: bool,

    /// Turn on debugging output
    #[arg(short, long, visible_alias = "verbose")]
    debug: bool,

    /// Reattach the kernel driver on exit if it had to be detached
    /// (default is to leave it detached)
    #[arg(long)]
    reattach: bool,

    /// Decode the temperature as unsigned, as early versions did
    /// (wrong below 0C)
    #[arg(long)]
    unsigned: bool,

    /// USB transfer timeout in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_MS))]
    timeout_ms: Option<u64>,

    /// Load session settings from a TOML file; flags override it
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load_from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SessionConfig::default(),
        };

        if self.fahrenheit {
            config.unit = TemperatureUnit::Fahrenheit;
        }
        if self.unsigned {
            config.policy = DecodePolicy::Unsigned;
        }
        if self.reattach {
            config.force_reattach = true;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        config.validate()?;
        Ok(config)
    }

    fn output_options(&self) -> OutputOptions {
        OutputOptions {
            symbols: !self.nosymbols,
            raw: self.raw,
            framed: self.debug,
        }
    }
}

fn main() {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.debug {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::WARN.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match args.session_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    debug!(?config, "Session configuration");

    let session = Session::new(LibusbTransport::new(), DeviceIdentity::TEMPERHUM, config);
    let outcome = session.run();

    std::process::exit(report(outcome, &args.output_options()));
}

/// Print the reading or the error; return the exit status.
fn report(outcome: RunOutcome, opts: &OutputOptions) -> i32 {
    let mut code = 0;

    match outcome.sample {
        Ok(sample) => println!("{}", render(&sample, opts)),
        Err(e) => {
            code = exit_code(e.kind());
            error!("Error: {:#}", anyhow::Error::new(e));
        }
    }

    if let Err(e) = outcome.teardown {
        if code == 0 {
            code = exit_code(e.kind());
            error!("Error: {:#}", anyhow::Error::new(e));
        } else {
            warn!("Teardown also failed: {:#}", anyhow::Error::new(e));
        }
    }

    code
}
