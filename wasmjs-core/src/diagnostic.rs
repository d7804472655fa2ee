//! Diagnostics and the shared error sink.
//!
//! Every phase of the pipeline reports problems as [`Diagnostic`] values
//! into one [`Diagnostics`] sink. The pipeline looks at the running error
//! count after each phase and stops before the next one if it is nonzero.

use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A single human-readable message attached to a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            span,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render the diagnostic against the text it points into.
    ///
    /// ```text
    /// error[E0201]: type mismatch in binary `+`: expected i32, found f32
    ///  --> main.wt:3:10
    ///   return 1 + 1.0;
    ///          ^^^^^^^
    /// ```
    pub fn render(&self, source: &str, path: Option<&str>) -> String {
        let (line, col, text) = locate(source, self.span.start as usize);
        let width = source
            .get(self.span.start as usize..self.span.end as usize)
            .map_or(1, |text| text.chars().count())
            .max(1);
        let caret = format!("{}{}", " ".repeat(col - 1), "^".repeat(width));

        let head = match self.code {
            Some(code) => format!("{}[{}]", self.severity, code),
            None => self.severity.to_string(),
        };
        let loc = match path {
            Some(p) => format!("{p}:{line}:{col}"),
            None => format!("{line}:{col}"),
        };

        format!("{head}: {}\n --> {loc}\n{text}\n{caret}", self.message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Returns the 1-based line and column of `offset` and the text of that line.
fn locate(source: &str, offset: usize) -> (usize, usize, &str) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i);
    let line = source[..line_start].matches('\n').count() + 1;
    let col = source[line_start..offset].chars().count() + 1;
    (line, col, &source[line_start..line_end])
}

/// The error sink shared by every phase of one compilation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    errors: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.errors += 1;
        }
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.push(d);
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::FileId;

    #[test]
    fn counts_only_errors() {
        let mut sink = Diagnostics::new();
        sink.push(Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error("unused", Span::dummy())
        });
        assert!(!sink.has_errors());
        sink.push(Diagnostic::error("boom", Span::dummy()));
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.iter().count(), 2);
    }

    #[test]
    fn renders_line_column_and_caret() {
        let source = "func f() i32 {\n  return 1 + 1.0;\n}\n";
        let start = source.find("1 + 1.0").unwrap() as u32;
        let span = Span::new(FileId::MAIN, start, start + 7);
        let rendered = Diagnostic::error("type mismatch", span)
            .with_code("E0201")
            .render(source, Some("main.wt"));

        assert_eq!(
            rendered,
            "error[E0201]: type mismatch\n --> main.wt:2:10\n  return 1 + 1.0;\n         ^^^^^^^"
        );
    }

    #[test]
    fn renders_non_ascii_source_by_character() {
        let source = "func f() i32 { return é; }";
        let parsed = crate::parser::parse_module(FileId::MAIN, source);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(
            parsed.diagnostics[0].render(source, Some("main.wt")),
            "error[E0001]: unexpected character\n --> main.wt:1:23\n\
             func f() i32 { return é; }\n                      ^"
        );
    }

    #[test]
    fn span_inside_a_character_snaps_to_its_start() {
        let source = "return é;";
        let rendered = Diagnostic::error("bad", Span::new(FileId::MAIN, 8, 9)).render(source, None);
        assert_eq!(rendered, "error: bad\n --> 1:8\nreturn é;\n       ^");
    }
}
