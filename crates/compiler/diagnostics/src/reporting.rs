//! # Error Reporting Utilities
//!
//! This module renders diagnostics against the schema source with `ariadne`.

use crate::Diagnostic;
use ariadne::{Label, Report, Source};

/// Build a formatted message for a diagnostic
pub fn build_diagnostic_message(source: &str, diagnostic: &Diagnostic, with_color: bool) -> String {
    let mut write_buffer = Vec::new();
    let code_u32: u32 = diagnostic.code.into();
    let range = clamp_range(diagnostic.location.span.into_range(), source.len());

    let mut report = Report::build(diagnostic.severity.into(), ((), range.clone()))
        .with_config(
            ariadne::Config::new()
                .with_index_type(ariadne::IndexType::Byte)
                .with_color(with_color),
        )
        .with_code(code_u32)
        .with_message(&diagnostic.message)
        .with_label(Label::new(((), range)).with_message(&diagnostic.message));

    for (location, message) in &diagnostic.related {
        let related_range = clamp_range(location.span.into_range(), source.len());
        report = report.with_label(Label::new(((), related_range)).with_message(message));
    }

    if report
        .finish()
        .write(Source::from(source), &mut write_buffer)
        .is_err()
    {
        return diagnostic.to_string();
    }
    String::from_utf8_lossy(&write_buffer).to_string()
}

/// Render several diagnostics, separated by blank lines.
pub fn build_diagnostic_messages(
    source: &str,
    diagnostics: &[Diagnostic],
    with_color: bool,
) -> String {
    diagnostics
        .iter()
        .map(|d| build_diagnostic_message(source, d, with_color))
        .collect::<Vec<_>>()
        .join("\n")
}

fn clamp_range(range: std::ops::Range<usize>, len: usize) -> std::ops::Range<usize> {
    let start = range.start.min(len);
    let end = range.end.clamp(start, len);
    start..end
}
