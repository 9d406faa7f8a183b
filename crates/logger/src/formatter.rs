//! Severity-dependent line formatting
//!
//! A [`LevelFormatter`] holds one [`Template`] per severity threshold and
//! renders each record with the template of the greatest threshold that is
//! less than or equal to the record's severity. Records below every threshold
//! use the lowest template; records at or above the highest threshold use the
//! highest one.

use crate::{Level, Record};
use chrono::{Local, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

/// Timestamp layout used by `{timestamp}`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Errors raised while building templates and formatters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// `{name}` names nothing a record provides
    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    /// A `{` without its `}` (or a stray `}`)
    #[error("unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),

    /// The format spec has no templates at all
    #[error("format spec has no templates")]
    EmptySpec,
}

/// Turns a record into one line of text (without the trailing newline)
pub trait LogFormatter: Send + Sync {
    /// Render the record
    fn format(&self, record: &Record<'_>) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Timestamp,
    Name,
    Level,
    Message,
    File,
    Line,
    Target,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "timestamp" => Self::Timestamp,
            "name" => Self::Name,
            "level" => Self::Level,
            "message" => Self::Message,
            "file" => Self::File,
            "line" => Self::Line,
            "target" => Self::Target,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// A parsed line template such as `{timestamp} - {name} - {level} - {message}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template. `{{` and `}}` stand for literal braces.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    literal.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::UnbalancedBrace(pos));
                    }
                    let field = Field::parse(name.trim())
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.clone()))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' => return Err(TemplateError::UnbalancedBrace(pos)),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The text the template was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template renders the source location
    pub fn shows_location(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field(Field::File | Field::Line)))
    }

    /// Render a record into `out`
    pub fn render_into(&self, record: &Record<'_>, utc: bool, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::Timestamp) => {
                    if utc {
                        let _ = write!(
                            out,
                            "{}",
                            record.timestamp.with_timezone(&Utc).format(TIMESTAMP_FORMAT)
                        );
                    } else {
                        let _ = write!(
                            out,
                            "{}",
                            record.timestamp.with_timezone(&Local).format(TIMESTAMP_FORMAT)
                        );
                    }
                }
                Segment::Field(Field::Name) => out.push_str(record.logger_name()),
                Segment::Field(Field::Level) => out.push_str(record.level.as_str()),
                Segment::Field(Field::Message) => out.push_str(&record.message),
                Segment::Field(Field::File) => {
                    let file = record
                        .file
                        .and_then(|f| Path::new(f).file_name())
                        .and_then(|f| f.to_str())
                        .unwrap_or("?");
                    out.push_str(file);
                }
                Segment::Field(Field::Line) => match record.line {
                    Some(line) => {
                        let _ = write!(out, "{line}");
                    }
                    None => out.push('?'),
                },
                Segment::Field(Field::Target) => out.push_str(record.target),
            }
        }
    }

    /// Render a record
    pub fn render(&self, record: &Record<'_>, utc: bool) -> String {
        let mut out = String::with_capacity(self.source.len() + record.message.len() + 32);
        self.render_into(record, utc, &mut out);
        out
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Mapping from severity threshold to template text.
///
/// Thresholds are unique: setting the same threshold twice keeps the last
/// template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSpec {
    formats: BTreeMap<u16, String>,
}

impl FormatSpec {
    /// Create an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `template` from `level` upwards
    pub fn level(self, level: Level, template: impl Into<String>) -> Self {
        self.threshold(level.severity(), template)
    }

    /// Use `template` from the raw severity `threshold` upwards
    pub fn threshold(mut self, threshold: u16, template: impl Into<String>) -> Self {
        self.formats.insert(threshold, template.into());
        self
    }

    /// Number of thresholds
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether no threshold is configured
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Thresholds and templates, ascending
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.formats.iter().map(|(t, f)| (*t, f.as_str()))
    }
}

/// Formatter that picks the template by record severity
#[derive(Debug, Clone)]
pub struct LevelFormatter {
    /// Sorted ascending by threshold, never empty
    formats: Vec<(u16, Template)>,
    utc: bool,
}

impl LevelFormatter {
    /// Build from a spec; timestamps render in local time
    pub fn new(spec: &FormatSpec) -> Result<Self, TemplateError> {
        if spec.is_empty() {
            return Err(TemplateError::EmptySpec);
        }
        let formats = spec
            .iter()
            .map(|(threshold, source)| Ok((threshold, Template::parse(source)?)))
            .collect::<Result<Vec<_>, TemplateError>>()?;
        Ok(Self {
            formats,
            utc: false,
        })
    }

    /// Render timestamps in UTC instead of local time
    pub fn with_utc(mut self, utc: bool) -> Self {
        self.utc = utc;
        self
    }

    /// Template for a severity: greatest threshold <= severity, the lowest
    /// template below every threshold.
    pub fn select(&self, severity: u16) -> &Template {
        let idx = self
            .formats
            .partition_point(|(threshold, _)| *threshold <= severity)
            .saturating_sub(1);
        &self.formats[idx].1
    }

    /// Configured thresholds, ascending
    pub fn thresholds(&self) -> impl Iterator<Item = u16> + '_ {
        self.formats.iter().map(|(t, _)| *t)
    }
}

impl LogFormatter for LevelFormatter {
    fn format(&self, record: &Record<'_>) -> String {
        self.select(record.level.severity()).render(record, self.utc)
    }
}
