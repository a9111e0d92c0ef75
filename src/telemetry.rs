//! Timestamp/telemetry log.
//!
//! An append-only, fixed-capacity sequence of checkpoints. Each checkpoint
//! pairs a phase label with the free-running timer count and a snapshot of
//! all clock-enable registers, so the offline power analysis can correlate
//! the analyzer trace with exactly which domains were clocked at each phase
//! boundary.

use core::fmt::Write as _;

use heapless::{String, Vec};

use crate::hardware::design_parameters::{MAX_LABEL_LENGTH, MAX_LOG_ENTRIES};
use crate::hardware::rcc::{ClockSnapshot, CLOCK_REGISTER_NAMES};

/// Free-running checkpoint counter.
///
/// Counts at 1 MHz ([`TIMESTAMP_TICK_RATE`]), derived from the crystal
/// rather than the system clock so that PLL reconfiguration mid-cycle does
/// not stretch the timestamps.
///
/// [`TIMESTAMP_TICK_RATE`]: crate::hardware::design_parameters::TIMESTAMP_TICK_RATE
pub trait TickTimer {
    /// Configure the counter (prescaler, free-running up-count). Called once
    /// per wake-up, before any checkpoint is taken.
    fn init(&mut self);
    /// Overwrite the current count.
    fn set_counter(&mut self, ticks: u32);
    /// Start counting.
    fn start(&mut self);
    /// Stop counting; the count stays readable.
    fn stop(&mut self);
    /// Current count.
    fn count(&self) -> u32;
}

/// One checkpoint. Never mutated after being appended.
#[derive(Copy, Clone, Debug)]
pub struct LogEntry {
    pub label: &'static str,
    pub ticks: u32,
    pub clocks: ClockSnapshot,
}

/// The per-cycle checkpoint log. Owns the hardware timer.
///
/// Single-buffered by design: `start` silently discards anything an earlier
/// cycle left unflushed. Back-to-back cycles without telemetry loss would
/// need a second buffer; the bench runs one cycle per trigger.
pub struct TimestampLog<T> {
    timer: T,
    entries: Vec<LogEntry, MAX_LOG_ENTRIES>,
    running: bool,
}

impl<T: TickTimer> TimestampLog<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            entries: Vec::new(),
            running: false,
        }
    }

    /// Configure the timer and clear the log. Must run once per wake-up
    /// before the first checkpoint, since the timer's source clock may have
    /// reconfigured since the previous cycle.
    pub fn init(&mut self) {
        self.timer.init();
        self.entries.clear();
    }

    /// Begin a capture bracket: zero the counter on the first start of the
    /// bracket, reset the cursor and start counting.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.timer.set_counter(0);
        }
        self.entries.clear();
        self.timer.start();
    }

    /// Halt the counter. Entries remain readable. Idempotent.
    pub fn stop(&mut self) {
        self.timer.stop();
        self.running = false;
    }

    /// Append one checkpoint. O(1), main-thread only. A checkpoint taken
    /// while the counter is stopped records the stale count; bracket every
    /// capture with `start`.
    ///
    /// Overrunning the fixed capacity halts the device: a truncated power
    /// trace is worse than a hang the operator notices.
    pub fn log(&mut self, label: &'static str, clocks: ClockSnapshot) {
        let entry = LogEntry {
            label,
            ticks: self.timer.count(),
            clocks,
        };
        if self.entries.push(entry).is_err() {
            panic!("timestamp log overflow");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize every checkpoint in append order, one bracketed text line
    /// per entry plus the end-of-log sentinel, then clear the cursor.
    ///
    /// Stops the timer first if it is still running. The bracketed start and
    /// end markers let the capture tool delimit records on a noisy serial
    /// stream without any binary framing.
    pub fn send_over_uart<W: embedded_io::Write>(
        &mut self,
        port: &mut W,
    ) -> Result<(), W::Error> {
        self.stop();

        let mut line: String<512> = String::new();
        for entry in &self.entries {
            line.clear();
            write!(
                &mut line,
                "[SLP_SOL]{:.max$}:{}:us",
                entry.label,
                entry.ticks,
                max = MAX_LABEL_LENGTH
            )
            .ok();
            for (name, value) in
                CLOCK_REGISTER_NAMES.iter().zip(entry.clocks.0.iter())
            {
                write!(&mut line, ":{}={}", name, value).ok();
            }
            line.push_str("[SLP_EOL]\n").ok();
            port.write_all(line.as_bytes())?;
        }
        port.write_all(b"[SLP_SOL]END_OF_LOG[SLP_EOL]\r\n")?;

        self.entries.clear();
        Ok(())
    }
}
