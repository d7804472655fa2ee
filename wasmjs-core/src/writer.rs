//! Indentation-aware text buffer used by the emitter.

use std::fmt::Display;

const INDENT: &str = "  ";

/// Accumulates output text.
///
/// The current margin is written lazily, once per physical line, the first
/// time anything is written to that line.
#[derive(Debug, Default)]
pub(crate) struct CodeWriter {
    margins: Vec<String>,
    margin: String,
    output: String,
    dirty: bool,
}

impl CodeWriter {
    pub(crate) fn new() -> Self {
        CodeWriter::default()
    }

    pub(crate) fn out(&mut self, text: impl Display) -> &mut Self {
        if !self.dirty {
            self.output.push_str(&self.margin);
            self.dirty = true;
        }
        // Writing into a String cannot fail.
        let _ = std::fmt::Write::write_fmt(&mut self.output, format_args!("{text}"));
        self
    }

    pub(crate) fn eol(&mut self) -> &mut Self {
        self.output.push('\n');
        self.dirty = false;
        self
    }

    pub(crate) fn indent(&mut self) -> &mut Self {
        let next = format!("{}{INDENT}", self.margin);
        self.margins.push(std::mem::replace(&mut self.margin, next));
        self
    }

    pub(crate) fn dedent(&mut self) -> &mut Self {
        self.margin = self.margins.pop().unwrap_or_default();
        self
    }

    pub(crate) fn finish(self) -> String {
        self.output
    }
}
