use std::io::Write;

use chrono::{DateTime, Local};
use tracing::warn;

use crate::device::Device;
use crate::state::{ConnectionState, DeviceState};

/// Presentation side of the dashboard. Calls are made synchronously from the
/// dispatch loop, so implementations must not block.
pub trait Render {
    fn connection(&mut self, state: ConnectionState);
    /// `reported_at` is when the device last reported its state, if ever.
    fn device(
        &mut self,
        device: &Device,
        state: &DeviceState,
        reported_at: Option<DateTime<Local>>,
    );
}

/// Writes one status line per change.
pub struct ConsoleRenderer<W> {
    out: W,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!("Failed to write status line: {}", e);
        }
    }
}

impl<W: Write> Render for ConsoleRenderer<W> {
    fn connection(&mut self, state: ConnectionState) {
        self.write_line(&format!("[connection] {state}"));
    }

    fn device(
        &mut self,
        device: &Device,
        state: &DeviceState,
        reported_at: Option<DateTime<Local>>,
    ) {
        let power = if state.power { "ON" } else { "OFF" };
        let mut line = match state.color {
            Some(color) if device.supports_color() => {
                format!("[{}] {}: {} {} {}", device.id, device.name, power, color, color.to_hex())
            }
            _ => format!("[{}] {}: {}", device.id, device.name, power),
        };
        if let Some(at) = reported_at {
            line.push_str(&format!(" ({})", at.format("%H:%M:%S")));
        }
        self.write_line(&line);
    }
}
