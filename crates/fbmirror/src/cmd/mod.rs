use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use fbmirror_frame::DisplayGeometry;
use fbmirror_transport::DEFAULT_BAUD_RATE;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod doctor;
pub mod ports;
pub mod replay;
pub mod version;
pub mod view;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports and whether each looks like the display device.
    Ports(PortsArgs),
    /// Decode a captured byte stream and print its frames.
    Replay(ReplayArgs),
    /// Run local environment health checks.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Doctor(args) => doctor::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Panel size flags shared by the view and replay.
#[derive(Args, Debug, Clone, Copy)]
pub struct GeometryArgs {
    /// Display width in pixels.
    #[arg(long, default_value_t = DisplayGeometry::DEFAULT.width)]
    pub width: usize,
    /// Display height in pixels (multiple of 8).
    #[arg(long, default_value_t = DisplayGeometry::DEFAULT.height)]
    pub height: usize,
}

impl GeometryArgs {
    pub fn geometry(self) -> CliResult<DisplayGeometry> {
        if self.width == 0 || self.height == 0 || self.height % 8 != 0 {
            return Err(CliError::new(
                USAGE,
                format!(
                    "invalid display size {}x{}: width must be positive and height a positive multiple of 8",
                    self.width, self.height
                ),
            ));
        }
        Ok(DisplayGeometry::new(self.width, self.height))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ViewArgs {
    /// Serial port to open (e.g. /dev/ttyUSB0, COM3). Auto-detected when omitted.
    #[arg(env = "FBMIRROR_PORT")]
    pub port: Option<String>,
    /// Serial baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    #[command(flatten)]
    pub geometry: GeometryArgs,
    /// Exit after N frames have been shown.
    #[arg(long)]
    pub count: Option<usize>,
    /// Delay between reconnect attempts (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub reconnect_delay: String,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {
    /// Only list ports that look like the display device.
    #[arg(long)]
    pub candidates: bool,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Captured stream to decode (`-` for stdin).
    pub file: PathBuf,
    #[command(flatten)]
    pub geometry: GeometryArgs,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn geometry_must_be_page_aligned() {
        let ok = GeometryArgs {
            width: 128,
            height: 32,
        };
        assert_eq!(ok.geometry().unwrap().frame_len(), 512);

        let bad = GeometryArgs {
            width: 128,
            height: 30,
        };
        assert_eq!(bad.geometry().unwrap_err().code, USAGE);
    }
}
