//! Terminal rendering of the mirrored display.

use std::io::{self, Write};
use std::time::Duration;

use fbmirror_frame::{DisplayGeometry, Frame, Framebuffer};
use fbmirror_link::StatusSnapshot;

/// How often the view pulls the newest frame.
pub const DISPLAY_TICK: Duration = Duration::from_millis(33);

/// How often the status bar is refreshed.
pub const STATUS_TICK: Duration = Duration::from_millis(500);

const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const CLEAR_SCREEN: &str = "\x1b[2J";
const CURSOR_HOME: &str = "\x1b[H";

/// Half-block text for a framebuffer, two pixel rows per line.
pub fn frame_lines(fb: &Framebuffer<'_>) -> Vec<String> {
    let geometry = fb.geometry();
    (0..geometry.height)
        .step_by(2)
        .map(|y| {
            (0..geometry.width)
                .map(|x| match (fb.pixel(x, y), fb.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

/// `Connected`, or `Searching (<address>)` while disconnected.
pub fn status_line(status: &StatusSnapshot) -> String {
    if status.connected() {
        return "Connected".to_string();
    }
    match &status.address {
        Some(address) => format!("Searching ({address})"),
        None => "Searching".to_string(),
    }
}

/// Redraws a bordered framebuffer and a status bar in place.
pub struct TerminalRenderer<W: Write> {
    out: W,
    geometry: DisplayGeometry,
    frame: Option<Frame>,
    status: String,
    frames_shown: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, geometry: DisplayGeometry) -> Self {
        Self {
            out,
            geometry,
            frame: None,
            status: "Searching".to_string(),
            frames_shown: 0,
        }
    }

    /// Clear the screen and draw the empty display.
    pub fn begin(&mut self) -> io::Result<()> {
        write!(self.out, "{HIDE_CURSOR}{CLEAR_SCREEN}")?;
        self.draw()
    }

    pub fn show_frame(&mut self, frame: Frame) -> io::Result<()> {
        self.frame = Some(frame);
        self.frames_shown += 1;
        self.draw()
    }

    /// Update the status bar. Redraws only when the text changes.
    pub fn set_status(&mut self, status: String) -> io::Result<()> {
        if status == self.status {
            return Ok(());
        }
        self.status = status;
        self.draw()
    }

    /// Restore the cursor below the drawing.
    pub fn finish(&mut self) -> io::Result<()> {
        writeln!(self.out, "{SHOW_CURSOR}")?;
        self.out.flush()
    }

    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }

    fn draw(&mut self) -> io::Result<()> {
        let data = self
            .frame
            .as_ref()
            .map(|f| f.payload.as_ref())
            .unwrap_or(&[]);
        let fb = Framebuffer::new(self.geometry, data);
        let border = "─".repeat(self.geometry.width);

        let mut screen = String::new();
        screen.push_str(CURSOR_HOME);
        screen.push_str(&format!("┌{border}┐\n"));
        for line in frame_lines(&fb) {
            screen.push_str(&format!("│{line}│\n"));
        }
        screen.push_str(&format!("└{border}┘\n"));
        screen.push_str(&format!("{:<width$}\n", self.status, width = self.geometry.width + 2));

        self.out.write_all(screen.as_bytes())?;
        self.out.flush()
    }
}
