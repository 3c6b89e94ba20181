//! Error reports for terminal output.
//!
//! An [`ErrorReport`] is built from an [`Error`] and rendered with
//! annotate-snippets. Errors that carry a byte span are drawn against the XSD
//! source; the rest show their instance-model path or schema pointer as a note.

use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

use crate::{Error, ErrorKind};

/// A renderable error with its location and follow-up notes.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    /// Short summary, e.g. "unresolved type reference `tns:Address`".
    pub title: String,
    /// Byte range in the XSD source.
    pub span: Option<Range<usize>>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            span: None,
            notes: Vec::new(),
            help: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn with_note(mut self, text: impl Into<String>) -> Self {
        self.notes.push(text.into());
        self
    }

    #[must_use]
    pub fn with_help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }
}

impl From<&Error> for ErrorReport {
    fn from(error: &Error) -> Self {
        let mut report = ErrorReport::new(error.kind(), error.to_string());
        if let Some(span) = error.span() {
            report = report.with_span(span);
        }
        if let Some(location) = error.location() {
            report = report.with_note(format!("at `{location}`"));
        }
        match error.kind() {
            ErrorKind::UnsupportedConstruct => {
                report.with_help("this construct has no JSON Schema mapping")
            }
            ErrorKind::PathNotExpandable => {
                report.with_help("only group paths whose type defines properties can be expanded")
            }
            ErrorKind::PathAlreadyExpanded => {
                report.with_help("remove the path's descendants before expanding it again")
            }
            _ => report,
        }
    }
}

/// A source file an error report can point into.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a> {
    pub path: &'a str,
    pub source: &'a str,
}

/// Render an error report using annotate-snippets.
pub fn format_error_report(
    report: &ErrorReport,
    file: Option<SourceFile<'_>>,
    styled: bool,
) -> String {
    let groups = build_snippet_groups(report, file);
    let renderer = if styled {
        Renderer::styled()
    } else {
        Renderer::plain()
    };
    renderer.render(&groups).to_string()
}

/// Render an error directly.
pub fn format_error(error: &Error, file: Option<SourceFile<'_>>, styled: bool) -> String {
    format_error_report(&ErrorReport::from(error), file, styled)
}

fn build_snippet_groups<'a>(
    report: &'a ErrorReport,
    file: Option<SourceFile<'a>>,
) -> Vec<Group<'a>> {
    let mut groups = Vec::new();

    let primary = match (file, &report.span) {
        (Some(file), Some(span)) => {
            let start = span.start.min(file.source.len());
            let end = span.end.min(file.source.len()).max(start);
            Snippet::source(file.source)
                .line_start(1)
                .path(file.path)
                .annotation(
                    AnnotationKind::Primary
                        .span(start..end)
                        .label(report.title.as_str()),
                )
        }
        (Some(file), None) => Snippet::source("")
            .line_start(1)
            .path(file.path)
            .annotation(AnnotationKind::Primary.span(0..0)),
        (None, _) => Snippet::source("")
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(0..0)),
    };
    groups.push(Level::ERROR.primary_title(report.title.as_str()).element(primary));

    for note in &report.notes {
        groups.push(
            Level::NOTE.primary_title(note.as_str()).element(
                Snippet::source("")
                    .line_start(1)
                    .annotation(AnnotationKind::Context.span(0..0)),
            ),
        );
    }
    if let Some(help) = &report.help {
        groups.push(
            Level::HELP.primary_title(help.as_str()).element(
                Snippet::source("")
                    .line_start(1)
                    .annotation(AnnotationKind::Context.span(0..0)),
            ),
        );
    }

    groups
}
