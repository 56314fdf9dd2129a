use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use fbmirror_frame::{DisplayGeometry, FrameQueue};
use fbmirror_link::{LinkConfig, LinkStatus, MirrorSession, PumpConfig, RunSignal, SessionConfig};
use fbmirror_transport::{PortDiscovery, PortEnumerator, SerialOpener, SystemPorts};
use tracing::info;

use crate::cmd::{parse_duration, ViewArgs};
use crate::exit::{io_error, link_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};
use crate::render::{status_line, TerminalRenderer, DISPLAY_TICK, STATUS_TICK};

/// Mirror the device until interrupted (or `--count` frames were shown).
pub fn run(args: ViewArgs, format: OutputFormat) -> CliResult<i32> {
    let geometry = args.geometry.geometry()?;
    let reconnect_delay = parse_duration(&args.reconnect_delay)?;

    // Without an explicit port, discovery is the only way in.
    if args.port.is_none() {
        let ports = SystemPorts
            .ports()
            .map_err(|err| transport_error("serial port enumeration unavailable", err))?;
        info!(ports = ports.len(), "serial enumeration available");
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;
    let signal = RunSignal::from_flag(running);

    let config = SessionConfig {
        link: LinkConfig {
            port: args.port.clone(),
            baud_rate: args.baud,
            reconnect_delay,
            ..LinkConfig::default()
        },
        pump: PumpConfig {
            error_backoff: reconnect_delay,
            ..PumpConfig::default()
        },
        ..SessionConfig::default()
    };

    let mut session = MirrorSession::start(
        SerialOpener::new(),
        PortDiscovery::system(),
        config,
        signal.clone(),
    )
    .map_err(|err| link_error("failed to start mirror session", err))?;

    let result = match format {
        OutputFormat::Table | OutputFormat::Pretty => render_loop(
            &session.queue(),
            &session.status(),
            &signal,
            geometry,
            args.count,
        ),
        OutputFormat::Json | OutputFormat::Raw => print_loop(
            &session.queue(),
            &signal,
            geometry,
            args.count,
            args.port.as_deref().unwrap_or("auto"),
            format,
        ),
    };

    session.stop();
    result.map(|()| SUCCESS)
}

fn render_loop(
    queue: &FrameQueue,
    status: &LinkStatus,
    signal: &RunSignal,
    geometry: DisplayGeometry,
    count: Option<usize>,
) -> CliResult<()> {
    let stdout = std::io::stdout();
    let mut renderer = TerminalRenderer::new(stdout.lock(), geometry);
    renderer
        .begin()
        .map_err(|err| io_error("terminal write failed", err))?;

    let mut next_status = Instant::now();
    let drawn = loop {
        if !signal.is_running() {
            break Ok(());
        }
        if let Some(frame) = queue.drain_latest() {
            if let Err(err) = renderer.show_frame(frame) {
                break Err(io_error("terminal write failed", err));
            }
            if count.is_some_and(|n| renderer.frames_shown() >= n) {
                break Ok(());
            }
        }
        if Instant::now() >= next_status {
            if let Err(err) = renderer.set_status(status_line(&status.snapshot())) {
                break Err(io_error("terminal write failed", err));
            }
            next_status = Instant::now() + STATUS_TICK;
        }
        signal.sleep(DISPLAY_TICK);
    };

    let _ = renderer.finish();
    drawn
}

fn print_loop(
    queue: &FrameQueue,
    signal: &RunSignal,
    geometry: DisplayGeometry,
    count: Option<usize>,
    source: &str,
    format: OutputFormat,
) -> CliResult<()> {
    let mut printed = 0usize;
    while signal.is_running() {
        if let Some(frame) = queue.drain_latest() {
            printed = printed.saturating_add(1);
            print_frame(&frame, printed, source, geometry, format);
            if count.is_some_and(|n| printed >= n) {
                break;
            }
        }
        signal.sleep(DISPLAY_TICK);
    }
    Ok(())
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
