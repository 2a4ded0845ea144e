//! Output formatting and exit codes.

use temperhum_core::{Sample, SessionErrorKind};

/// How a sample is printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Suffix C/F and %.
    pub symbols: bool,
    /// Append the raw response as hex.
    pub raw: bool,
    /// Frame the line with dashes (debug mode).
    pub framed: bool,
}

/// `25.0C 37%`, `25.0 37`, optionally followed by the raw bytes.
pub fn format_line(sample: &Sample, opts: &OutputOptions) -> String {
    let reading = &sample.reading;
    let mut line = if opts.symbols {
        format!(
            "{}{} {}%",
            reading.temperature,
            reading.temperature.unit().symbol(),
            reading.humidity_percent
        )
    } else {
        format!("{} {}", reading.temperature, reading.humidity_percent)
    };

    if opts.raw {
        line.push(' ');
        line.push_str(&sample.raw.to_hex());
    }
    line
}

/// Full text to print for a sample.
pub fn render(sample: &Sample, opts: &OutputOptions) -> String {
    let line = format_line(sample, opts);
    if !opts.framed {
        return line;
    }
    let dashes = "-".repeat(if opts.raw { 50 } else { 12 });
    format!("\n{dashes}\n{line}\n{dashes}\n")
}

/// Process exit status for each error kind.
pub fn exit_code(kind: SessionErrorKind) -> i32 {
    match kind {
        SessionErrorKind::DeviceNotFound => 2,
        SessionErrorKind::DriverDetachFailed => 3,
        SessionErrorKind::InterfaceClaimFailed => 4,
        SessionErrorKind::EndpointResolutionFailed => 5,
        SessionErrorKind::RequestWriteFailed => 6,
        SessionErrorKind::ResponseReadFailed => 7,
        SessionErrorKind::ResourceReleaseFailed => 8,
        SessionErrorKind::DriverReattachFailed => 9,
        SessionErrorKind::InvalidState => 10,
    }
}

/// Exit status for configuration and usage failures.
pub const EXIT_CONFIG: i32 = 1;
