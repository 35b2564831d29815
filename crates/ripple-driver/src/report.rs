//! Rendering of lowering diagnostics.
//!
//! With source text available each diagnostic becomes an `ariadne` report
//! pointing at its span; otherwise a single `error: ...` line is printed.

use std::io::Write;

use ariadne::{Color, Label, Report, ReportKind, Source};
use ripple_lower::{Diagnostic, DiagnosticKind, Diagnostics};

/// Stable code for each diagnostic kind.
pub fn diagnostic_code(kind: &DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::ReturnValueInVoidFunction => "E2001",
        DiagnosticKind::MissingReturnValue => "E2002",
        DiagnosticKind::ImplicitConversion { .. } => "E2003",
        DiagnosticKind::UnknownIdentifier(_) => "E2004",
        DiagnosticKind::UnknownFunction(_) => "E2005",
        DiagnosticKind::ArityMismatch { .. } => "E2006",
        DiagnosticKind::VoidValue => "E2007",
        DiagnosticKind::DuplicateFunction(_) => "E2008",
        DiagnosticKind::InvalidOperand { .. } => "E2009",
        DiagnosticKind::AssignToConst(_) => "E2010",
        DiagnosticKind::DuplicateDefault => "E2011",
        DiagnosticKind::DuplicateVariable(_) => "E2012",
        DiagnosticKind::MissingType(_) => "E2013",
    }
}

pub struct DiagnosticRenderer<'a> {
    filename: &'a str,
    source: Option<&'a str>,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(filename: &'a str, source: Option<&'a str>) -> Self {
        Self { filename, source }
    }

    /// Writes one diagnostic to `out`.
    pub fn render(&self, diagnostic: &Diagnostic, out: &mut impl Write) -> std::io::Result<()> {
        let code = diagnostic_code(&diagnostic.kind);
        let Some(source) = self.source else {
            return writeln!(out, "error[{}]: {}: {}", code, self.filename, diagnostic);
        };

        // Spans from hand-written JSON may run past the text they describe.
        let end = diagnostic.span.end.min(source.len());
        let start = diagnostic.span.start.min(end);
        let span = (self.filename, start..end);
        Report::build(ReportKind::Error, span.clone())
            .with_code(code)
            .with_message("lowering error")
            .with_label(
                Label::new(span)
                    .with_message(diagnostic.kind.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .write((self.filename, Source::from(source)), out)
    }
}

/// Writes every diagnostic to stderr.
pub fn render_diagnostics(
    diagnostics: &Diagnostics,
    filename: &str,
    source: Option<&str>,
) -> std::io::Result<()> {
    let renderer = DiagnosticRenderer::new(filename, source);
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    for diagnostic in diagnostics {
        renderer.render(diagnostic, &mut out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_ast::Span;

    fn diagnostic(kind: DiagnosticKind, start: usize, end: usize) -> Diagnostic {
        Diagnostic {
            kind,
            span: Span::new(start, end, 0),
        }
    }

    #[test]
    fn test_plain_rendering() {
        let renderer = DiagnosticRenderer::new("prog.json", None);
        let mut out = Vec::new();
        renderer
            .render(&diagnostic(DiagnosticKind::MissingReturnValue, 4, 10), &mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "error[E2002]: prog.json: function must return a value at 4..10\n"
        );
    }

    #[test]
    fn test_source_rendering_mentions_message() {
        let source = "function f(): i32 { return; }";
        let renderer = DiagnosticRenderer::new("f.ts", Some(source));
        let mut out = Vec::new();
        renderer
            .render(&diagnostic(DiagnosticKind::MissingReturnValue, 20, 27), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("E2002"));
        assert!(text.contains("function must return a value"));
    }

    #[test]
    fn test_span_past_source_is_clamped() {
        let renderer = DiagnosticRenderer::new("short.ts", Some("x"));
        let mut out = Vec::new();
        renderer
            .render(&diagnostic(DiagnosticKind::DuplicateDefault, 50, 90), &mut out)
            .unwrap();
        assert!(!out.is_empty());
    }
}
