//! Human-readable diagnostics for flagged highlights.

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::field::{Field, Section};
use crate::highlighter::MAX_HEADER;
use crate::validate;
use crate::{Category, Highlight, Span};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// Why a highlight was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A `[...]` line that is neither `[Interface]` nor `[Peer]`.
    UnknownSection,
    /// A key with no `=` after it.
    MissingEquals,
    /// A key that is not recognised.
    UnknownField,
    /// A known key under the wrong section header.
    MisplacedField { field: Field },
    /// `Key =` with nothing after it.
    MissingValue { field: Field },
    /// A list ending in `,`.
    TrailingComma,
    /// A value the field does not accept.
    InvalidValue { field: Field },
    /// `S1` and `S2` give init and response messages the same size.
    PaddingCollision,
    /// Two of `H1`..`H4` share a non-default id.
    DuplicateHeader { field: Field },
    /// Too many junk packets.
    JunkCount,
    /// `Jmin` is not below `Jmax` or the size ceiling.
    JunkMin,
    /// `Jmax` is not above `Jmin` or is past the size ceiling.
    JunkMax,
    /// `S1` or `S2` padding would exceed the size ceiling.
    PaddingTooLarge { field: Field },
}

/// A warning or error with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub span: Span,
}

/// Explain every [`Category::Warning`] and [`Category::Error`] in `highlights`.
pub fn diagnose(source: &str, highlights: &[Highlight]) -> Vec<Diagnostic> {
    highlights
        .iter()
        .filter(|h| h.category.is_diagnostic())
        .map(|h| Diagnostic {
            severity: if h.category == Category::Warning {
                Severity::Warning
            } else {
                Severity::Error
            },
            kind: explain(source.as_bytes(), h),
            span: h.span,
        })
        .collect()
}

/// Work out what a flagged highlight was from the line around it.
fn explain(src: &[u8], highlight: &Highlight) -> DiagnosticKind {
    let start = highlight.start();
    let end = start + highlight.len();
    let text = &src[start..end];

    let line_start = src[..start]
        .iter()
        .rposition(|&c| c == b'\n')
        .map_or(0, |i| i + 1);
    let line_end = src[start..]
        .iter()
        .position(|&c| c == b'\n' || c == b'#')
        .map_or(src.len(), |i| start + i);
    let line = &src[line_start..line_end];

    let Some(key_start) = line.iter().position(|&c| !matches!(c, b' ' | b'\t')) else {
        return DiagnosticKind::MissingEquals;
    };
    if line[key_start] == b'[' {
        return DiagnosticKind::UnknownSection;
    }

    // The first byte of a key is never its terminator.
    let Some(equals) = line[key_start + 1..]
        .iter()
        .position(|&c| c == b'=')
        .map(|i| line_start + key_start + 1 + i)
    else {
        return DiagnosticKind::MissingEquals;
    };

    if end <= equals {
        return match Field::from_key(text) {
            Field::Invalid => DiagnosticKind::UnknownField,
            field => DiagnosticKind::MisplacedField { field },
        };
    }

    let field = Field::from_key(src[line_start + key_start..equals].trim_ascii());
    if start == equals {
        return DiagnosticKind::MissingValue { field };
    }
    if text == b"," {
        return DiagnosticKind::TrailingComma;
    }

    if highlight.category == Category::Warning {
        return match field {
            Field::Jc => DiagnosticKind::JunkCount,
            Field::Jmin => DiagnosticKind::JunkMin,
            Field::Jmax => DiagnosticKind::JunkMax,
            _ => DiagnosticKind::PaddingTooLarge { field },
        };
    }

    // In-range values flagged as errors were rejected by the consistency pass.
    match field {
        Field::S1 | Field::S2 if validate::is_valid_uint(text, 0, 65_535) => {
            DiagnosticKind::PaddingCollision
        }
        Field::H1 | Field::H2 | Field::H3 | Field::H4
            if validate::is_valid_uint(text, 0, MAX_HEADER) =>
        {
            DiagnosticKind::DuplicateHeader { field }
        }
        _ => DiagnosticKind::InvalidValue { field },
    }
}

/// What a field accepts, for help text.
fn expectation(field: Field) -> &'static str {
    match field {
        Field::PrivateKey | Field::PublicKey | Field::PresharedKey => {
            "a base64-encoded 32-byte key"
        }
        Field::ListenPort => "a port between 0 and 65535",
        Field::Address | Field::AllowedIps => {
            "IP addresses with an optional /prefix, separated by commas"
        }
        Field::Dns => "IP addresses or hostnames, separated by commas",
        Field::Mtu => "a number between 576 and 65535",
        Field::Table => "`off`, `auto`, `main` or a routing table number",
        Field::PreUp | Field::PostUp | Field::PreDown | Field::PostDown => "a shell command",
        Field::Jc | Field::Jmin | Field::Jmax | Field::S1 | Field::S2 => {
            "a number between 0 and 65535"
        }
        Field::H1 | Field::H2 | Field::H3 | Field::H4 => "a number between 0 and 2147483647",
        Field::Endpoint => "`host:port` or `[ipv6%scope]:port`",
        Field::PersistentKeepalive => "`off` or a number of seconds between 0 and 65535",
        Field::Invalid => "a known field name",
    }
}

impl Diagnostic {
    /// Render this diagnostic with ariadne.
    ///
    /// Returns a string containing the formatted message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let range: std::ops::Range<usize> = self.span.into();
        let (kind, color) = match self.severity {
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
            Severity::Error => (ReportKind::Error, Color::Red),
        };
        let report = Report::build(kind, (filename, range.clone()))
            .with_message(self.kind.to_string())
            .with_label(
                Label::new((filename, range))
                    .with_message(self.label())
                    .with_color(color),
            );
        match self.help() {
            Some(help) => report.with_help(help),
            None => report,
        }
    }

    fn label(&self) -> &'static str {
        match self.kind {
            DiagnosticKind::UnknownSection => "unknown section",
            DiagnosticKind::MissingEquals => "expected `=`",
            DiagnosticKind::UnknownField => "unknown field",
            DiagnosticKind::MisplacedField { .. } => "wrong section",
            DiagnosticKind::MissingValue { .. } => "no value after this",
            DiagnosticKind::TrailingComma => "nothing follows this comma",
            DiagnosticKind::InvalidValue { .. } => "invalid value",
            DiagnosticKind::PaddingCollision => "same message size",
            DiagnosticKind::DuplicateHeader { .. } => "duplicate id",
            DiagnosticKind::JunkCount
            | DiagnosticKind::JunkMin
            | DiagnosticKind::JunkMax
            | DiagnosticKind::PaddingTooLarge { .. } => "questionable value",
        }
    }

    fn help(&self) -> Option<String> {
        match self.kind {
            DiagnosticKind::UnknownSection => {
                Some("sections are `[Interface]` and `[Peer]`".to_string())
            }
            DiagnosticKind::MisplacedField { field } => Some(format!(
                "move `{}` under {}",
                field.name(),
                field.section().header()
            )),
            DiagnosticKind::MissingValue { field } | DiagnosticKind::InvalidValue { field } => {
                Some(format!("expected {}", expectation(field)))
            }
            DiagnosticKind::PaddingCollision => {
                Some("change S1 or S2 so the padded sizes differ".to_string())
            }
            DiagnosticKind::DuplicateHeader { .. } => {
                Some("H1, H2, H3 and H4 must all be different".to_string())
            }
            DiagnosticKind::JunkCount => Some("keep Jc at 128 or below".to_string()),
            _ => None,
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::UnknownSection => write!(f, "unknown section header"),
            DiagnosticKind::MissingEquals => write!(f, "expected `=` after key"),
            DiagnosticKind::UnknownField => write!(f, "unknown field"),
            DiagnosticKind::MisplacedField { field } => match field.section() {
                Section::Invalid => write!(f, "unexpected field"),
                section => write!(
                    f,
                    "`{}` is only valid in {}",
                    field.name(),
                    section.header()
                ),
            },
            DiagnosticKind::MissingValue { field } => match field {
                Field::Invalid => write!(f, "missing value"),
                field => write!(f, "missing value for `{}`", field.name()),
            },
            DiagnosticKind::TrailingComma => write!(f, "trailing comma"),
            DiagnosticKind::InvalidValue { field } => match field {
                Field::Invalid => write!(f, "value for an unknown field"),
                field => write!(f, "invalid value for `{}`", field.name()),
            },
            DiagnosticKind::PaddingCollision => {
                write!(f, "S1 and S2 give init and response messages the same size")
            }
            DiagnosticKind::DuplicateHeader { field } => {
                write!(f, "`{}` reuses another header id", field.name())
            }
            DiagnosticKind::JunkCount => write!(f, "unusually many junk packets"),
            DiagnosticKind::JunkMin => {
                write!(f, "`Jmin` should be below `Jmax` and the packet size limit")
            }
            DiagnosticKind::JunkMax => {
                write!(f, "`Jmax` should be above `Jmin` and within the packet size limit")
            }
            DiagnosticKind::PaddingTooLarge { field } => {
                write!(f, "`{}` padding exceeds the packet size limit", field.name())
            }
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{severity}: {} at offset {}", self.kind, self.span.start)
    }
}

impl std::error::Error for Diagnostic {}
