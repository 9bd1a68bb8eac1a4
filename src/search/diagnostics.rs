//! Pluggable output for search diagnostics.
//!
//! The controller only reports events; `ConsoleSink` turns them into the
//! terminal view (PV block redrawn in place with ANSI cursor movement) and
//! `RecordingSink` keeps them for inspection.

use std::io::{self, Write};

use crate::search::principal_variation::{PrincipalVariation, PriorEntry};

pub trait DiagnosticSink {
    /// No retained node matched the board, a fresh root was built.
    fn new_root(&mut self) {}

    fn priors(&mut self, _entries: &[PriorEntry]) {}

    /// Periodic PV report; `iteration` counts rollouts of the current batch.
    fn principal_variations(&mut self, _iteration: u32, _lines: &[PrincipalVariation]) {}

    /// The search is running extension batch `round` (1-based).
    fn deeper_search(&mut self, _round: u32) {}

    /// A batch with PV reporting finished; `pv_lines` lines were reserved.
    fn batch_finished(&mut self, _pv_lines: usize) {}
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Box<T> {
    fn new_root(&mut self) {
        (**self).new_root();
    }

    fn priors(&mut self, entries: &[PriorEntry]) {
        (**self).priors(entries);
    }

    fn principal_variations(&mut self, iteration: u32, lines: &[PrincipalVariation]) {
        (**self).principal_variations(iteration, lines);
    }

    fn deeper_search(&mut self, round: u32) {
        (**self).deeper_search(round);
    }

    fn batch_finished(&mut self, pv_lines: usize) {
        (**self).batch_finished(pv_lines);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    NewRoot,
    Priors(Vec<PriorEntry>),
    PrincipalVariations {
        iteration: u32,
        lines: Vec<PrincipalVariation>,
    },
    DeeperSearch(u32),
    BatchFinished(usize),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<DiagnosticEvent>,
}

impl DiagnosticSink for RecordingSink {
    fn new_root(&mut self) {
        self.events.push(DiagnosticEvent::NewRoot);
    }

    fn priors(&mut self, entries: &[PriorEntry]) {
        self.events.push(DiagnosticEvent::Priors(entries.to_vec()));
    }

    fn principal_variations(&mut self, iteration: u32, lines: &[PrincipalVariation]) {
        self.events.push(DiagnosticEvent::PrincipalVariations {
            iteration,
            lines: lines.to_vec(),
        });
    }

    fn deeper_search(&mut self, round: u32) {
        self.events.push(DiagnosticEvent::DeeperSearch(round));
    }

    fn batch_finished(&mut self, pv_lines: usize) {
        self.events.push(DiagnosticEvent::BatchFinished(pv_lines));
    }
}

pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DiagnosticSink for ConsoleSink<W> {
    fn new_root(&mut self) {
        writeln!(self.out, "Creating new node.").ok();
    }

    fn priors(&mut self, entries: &[PriorEntry]) {
        let rendered: Vec<String> = entries.iter().map(ToString::to_string).collect();
        writeln!(self.out, "Priors: {}", rendered.join(", ")).ok();
    }

    fn principal_variations(&mut self, _iteration: u32, lines: &[PrincipalVariation]) {
        for (i, line) in lines.iter().enumerate() {
            // Clear to end of line so a shorter line fully replaces the old one.
            writeln!(self.out, "Pv{}: {}\u{1b}[K", i + 1, line).ok();
        }
        write!(self.out, "\u{1b}[1000D").ok();
        if !lines.is_empty() {
            write!(self.out, "\u{1b}[{}A", lines.len()).ok();
        }
        self.out.flush().ok();
    }

    fn deeper_search(&mut self, _round: u32) {
        writeln!(self.out, "Thinking extra deeply.").ok();
    }

    fn batch_finished(&mut self, pv_lines: usize) {
        write!(self.out, "{}", "\n".repeat(pv_lines)).ok();
        self.out.flush().ok();
    }
}
