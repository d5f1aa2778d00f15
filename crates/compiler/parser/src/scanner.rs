//! # Line Scanner
//!
//! Splits a schema source into classified lines and walks them with a cursor.
//!
//! Classification is purely lexical. Whether a heading opens an entity block
//! depends on the dialect and is decided by the [`Grammar`](crate::dialect::Grammar).
//!
//! Nesting depth of a bullet line is its indentation level (two spaces or one
//! tab per level) plus the number of leading dashes, so `- x`, `-- x` and
//! `  - x` have depth 1, 2 and 2.

use chumsky::span::SimpleSpan;
use modelmark_compiler_diagnostics::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Blank lines, horizontal rules, comments and fenced code.
    Ignorable,
    /// `#`-prefixed heading; `level` is the number of `#`.
    Heading { level: usize },
    /// Dash-led bullet line.
    Item { depth: usize },
    /// `> text`; `indent` is the indentation level before the marker.
    Quote { indent: usize },
    /// Any other prose.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'src> {
    /// 1-based line number.
    pub number: usize,
    pub raw: &'src str,
    /// The line with its marker (`#`s, dashes, `>`) and surrounding whitespace removed.
    pub content: &'src str,
    pub kind: LineKind,
    pub span: SimpleSpan<usize>,
}

impl Line<'_> {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.number, self.raw, self.span)
    }

    pub const fn is_ignorable(&self) -> bool {
        matches!(self.kind, LineKind::Ignorable)
    }

    pub const fn heading_level(&self) -> Option<usize> {
        match self.kind {
            LineKind::Heading { level } => Some(level),
            _ => None,
        }
    }

    /// `###` and deeper headings switch sections inside a block.
    pub fn is_section_header(&self) -> bool {
        self.heading_level().is_some_and(|level| level >= 3)
    }

    pub const fn depth(&self) -> Option<usize> {
        match self.kind {
            LineKind::Item { depth } => Some(depth),
            _ => None,
        }
    }

    /// Whether this line continues an item opened at `parent_depth`.
    pub fn is_nested_under(&self, parent_depth: usize) -> bool {
        match self.kind {
            LineKind::Item { depth } => depth > parent_depth,
            LineKind::Quote { indent } => indent > 0,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Mode {
    #[default]
    Normal,
    Comment,
    Fence,
}

#[derive(Debug, Clone)]
pub struct LineScanner<'src> {
    lines: Vec<Line<'src>>,
    position: usize,
}

impl<'src> LineScanner<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lines = Vec::new();
        let mut mode = Mode::Normal;
        let mut offset = 0;

        for (idx, segment) in source.split('\n').enumerate() {
            let raw = segment.strip_suffix('\r').unwrap_or(segment);
            let (kind, content) = classify(raw, &mut mode);
            lines.push(Line {
                number: idx + 1,
                raw,
                content,
                kind,
                span: SimpleSpan::from(offset..offset + raw.len()),
            });
            offset += segment.len() + 1;
        }

        Self { lines, position: 0 }
    }

    pub fn lines(&self) -> &[Line<'src>] {
        &self.lines
    }

    pub const fn position(&self) -> usize {
        self.position
    }

    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.lines.len());
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.lines.len()
    }

    pub fn current(&self) -> Option<&Line<'src>> {
        self.lines.get(self.position)
    }

    /// The next non-ignorable line after the current one.
    pub fn peek(&self) -> Option<&Line<'src>> {
        self.lines
            .iter()
            .skip(self.position + 1)
            .find(|line| !line.is_ignorable())
    }

    /// Return the current line and move past it.
    pub fn advance(&mut self) -> Option<Line<'src>> {
        let line = self.lines.get(self.position).copied()?;
        self.position += 1;
        Some(line)
    }

    pub fn skip_ignorable(&mut self) {
        while self.current().is_some_and(Line::is_ignorable) {
            self.position += 1;
        }
    }
}

fn classify<'src>(raw: &'src str, mode: &mut Mode) -> (LineKind, &'src str) {
    let trimmed = raw.trim();

    match mode {
        Mode::Comment => {
            if trimmed.contains("-->") {
                *mode = Mode::Normal;
            }
            return (LineKind::Ignorable, trimmed);
        }
        Mode::Fence => {
            if trimmed.starts_with("```") {
                *mode = Mode::Normal;
            }
            return (LineKind::Ignorable, trimmed);
        }
        Mode::Normal => {}
    }

    if trimmed.is_empty() {
        return (LineKind::Ignorable, trimmed);
    }
    if trimmed.starts_with("```") {
        *mode = Mode::Fence;
        return (LineKind::Ignorable, trimmed);
    }
    if let Some(comment) = trimmed.strip_prefix("<!--") {
        if !comment.contains("-->") {
            *mode = Mode::Comment;
        }
        return (LineKind::Ignorable, trimmed);
    }
    if trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-') {
        return (LineKind::Ignorable, trimmed);
    }

    if raw.starts_with('#') {
        let level = raw.chars().take_while(|c| *c == '#').count();
        let rest = &raw[level..];
        if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
            return (LineKind::Heading { level }, rest.trim());
        }
        return (LineKind::Text, trimmed);
    }

    let indent = indent_levels(raw);
    let body = raw.trim_start();

    if body.starts_with('-') {
        let dashes = body.chars().take_while(|c| *c == '-').count();
        let rest = &body[dashes..];
        if rest.starts_with(char::is_whitespace) {
            let content = rest.trim();
            if content.is_empty() {
                return (LineKind::Ignorable, content);
            }
            return (
                LineKind::Item {
                    depth: indent + dashes,
                },
                content,
            );
        }
        return (LineKind::Text, trimmed);
    }

    if let Some(quote) = body.strip_prefix('>') {
        return (LineKind::Quote { indent }, quote.trim());
    }

    (LineKind::Text, trimmed)
}

fn indent_levels(raw: &str) -> usize {
    let mut spaces = 0;
    let mut tabs = 0;
    for ch in raw.chars() {
        match ch {
            ' ' => spaces += 1,
            '\t' => tabs += 1,
            _ => break,
        }
    }
    tabs + spaces / 2
}
