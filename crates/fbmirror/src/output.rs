use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use fbmirror_frame::{DisplayGeometry, Frame, Framebuffer};
use fbmirror_transport::{DeviceDescriptor, MatchReason};
use serde::Serialize;

use crate::render::frame_lines;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    source: &'a str,
    index: usize,
    payload_size: usize,
    lit_pixels: usize,
    complete: bool,
    payload: String,
    timestamp: String,
}

/// Print one decoded frame. `index` counts from 1.
pub fn print_frame(
    frame: &Frame,
    index: usize,
    source: &str,
    geometry: DisplayGeometry,
    format: OutputFormat,
) {
    let fb = Framebuffer::new(geometry, frame.payload.as_ref());
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                source,
                index,
                payload_size: frame.len(),
                lit_pixels: fb.lit_pixels(),
                complete: fb.is_complete(),
                payload: hex(frame.payload.as_ref()),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "SIZE", "LIT", "COMPLETE", "SOURCE"])
                .add_row(vec![
                    index.to_string(),
                    frame.len().to_string(),
                    fb.lit_pixels().to_string(),
                    fb.is_complete().to_string(),
                    source.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame {} size={} lit={} source={}",
                index,
                frame.len(),
                fb.lit_pixels(),
                source
            );
            for line in frame_lines(&fb) {
                println!("{line}");
            }
        }
        OutputFormat::Raw => {
            print_raw(frame.payload.as_ref());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

#[derive(Serialize)]
struct PortOutput<'a> {
    address: &'a str,
    description: &'a str,
    candidate: bool,
    reason: String,
}

/// Print enumerated ports with the reason each one matched (or did not).
pub fn print_ports(ports: &[(DeviceDescriptor, MatchReason)], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|(port, reason)| PortOutput {
                    address: &port.address,
                    description: &port.description,
                    candidate: reason.is_match(),
                    reason: reason.to_string(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "DESCRIPTION", "CANDIDATE", "REASON"]);
            for (port, reason) in ports {
                table.add_row(vec![
                    port.address.clone(),
                    port.description.clone(),
                    if reason.is_match() { "yes" } else { "no" }.to_string(),
                    reason.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for (port, reason) in ports {
                let marker = if reason.is_match() { '*' } else { ' ' };
                println!(
                    "{marker} {:<24} {}  [{}]",
                    port.address, port.description, reason
                );
            }
        }
        OutputFormat::Raw => {
            for (port, _) in ports {
                println!("{}", port.address);
            }
        }
    }
}

fn hex(payload: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(payload.len() * 2);
    for byte in payload {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
