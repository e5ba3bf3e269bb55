//! Live multi-line progress display
//!
//! The display is a scrolling log region followed by one status line per
//! worker. Every report re-renders the status lines in place under a single
//! lock, so output from concurrent workers never interleaves.

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::{IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

/// How the reporter draws to its output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Redraw the worker status lines in place using cursor movement
    Live,
    /// Append every line; used when the output is not a terminal
    Plain,
}

struct Display {
    slots: Vec<String>,
    out: Box<dyn Write + Send>,
    mode: RenderMode,
    /// Whether the status lines are currently on screen below the log region
    drawn: bool,
}

/// Shared progress reporter with one status slot per worker
pub struct ProgressReporter {
    display: Mutex<Display>,
    workers: usize,
}

impl ProgressReporter {
    /// Reporter on stdout; live rendering only when stdout is a terminal
    pub fn stdout(workers: usize) -> Self {
        let stdout = std::io::stdout();
        let mode = if stdout.is_terminal() {
            RenderMode::Live
        } else {
            RenderMode::Plain
        };
        Self::with_writer(workers, Box::new(stdout), mode)
    }

    /// Reporter drawing to an arbitrary writer
    pub fn with_writer(workers: usize, out: Box<dyn Write + Send>, mode: RenderMode) -> Self {
        let slots = (0..workers)
            .map(|id| format!("[Worker {id}] waiting"))
            .collect();
        Self {
            display: Mutex::new(Display {
                slots,
                out,
                mode,
                drawn: false,
            }),
            workers,
        }
    }

    /// Number of worker status slots
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Append a line to the scrolling log region
    pub fn log(&self, line: impl Into<String>) {
        self.report(line, None);
    }

    /// Replace a worker's status line
    pub fn update(&self, worker_id: usize, line: impl Into<String>) {
        self.report(line, Some(worker_id));
    }

    /// Route a line to a worker slot, or to the log region when `worker_id` is
    /// `None` or out of range, then re-render the display.
    ///
    /// Line breaks inside `line` are replaced with spaces; every entry occupies
    /// exactly one terminal line.
    pub fn report(&self, line: impl Into<String>, worker_id: Option<usize>) {
        let line = single_line(line.into());
        let mut display = self.display.lock().unwrap_or_else(PoisonError::into_inner);

        let result = match worker_id.filter(|id| *id < display.slots.len()) {
            Some(id) => {
                display.slots[id] = line;
                match display.mode {
                    RenderMode::Live => display.render_live(None),
                    RenderMode::Plain => display.append(id),
                }
            }
            None => match display.mode {
                RenderMode::Live => display.render_live(Some(&line)),
                RenderMode::Plain => display.append_line(&line),
            },
        };

        if let Err(e) = result {
            tracing::debug!(error = %e, "Failed to render progress");
        }
    }

    /// Current content of every status slot, in worker order
    pub fn slots(&self) -> Vec<String> {
        self.display
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .clone()
    }

    /// Move the cursor below the status lines so later output starts on a fresh line
    pub fn finish(&self) {
        let mut display = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        if display.mode == RenderMode::Live && display.drawn {
            let result = writeln!(display.out).and_then(|()| display.out.flush());
            if let Err(e) = result {
                tracing::debug!(error = %e, "Failed to finish progress display");
            }
            display.drawn = false;
        }
    }
}

fn single_line(line: String) -> String {
    if line.contains(['\n', '\r']) {
        line.trim_end_matches(['\n', '\r']).replace(['\n', '\r'], " ")
    } else {
        line
    }
}

impl Display {
    fn render_live(&mut self, log_line: Option<&str>) -> std::io::Result<()> {
        let Display {
            slots, out, drawn, ..
        } = self;
        let count = slots.len();

        // Cursor sits at the end of the last status line; go back to the first one
        if *drawn {
            if count > 1 {
                let up = u16::try_from(count - 1).unwrap_or(u16::MAX);
                queue!(out, MoveUp(up))?;
            }
            queue!(out, MoveToColumn(0))?;
        }

        if let Some(line) = log_line {
            queue!(out, Clear(ClearType::CurrentLine))?;
            writeln!(out, "{line}")?;
        }

        for (i, slot) in slots.iter().enumerate() {
            queue!(out, Clear(ClearType::CurrentLine), MoveToColumn(0))?;
            out.write_all(slot.as_bytes())?;
            if i + 1 < count {
                writeln!(out)?;
            }
        }

        *drawn = count > 0;
        out.flush()
    }

    fn append(&mut self, slot: usize) -> std::io::Result<()> {
        writeln!(self.out, "{}", self.slots[slot])?;
        self.out.flush()
    }

    fn append_line(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }
}
