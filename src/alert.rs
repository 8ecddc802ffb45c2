use std::collections::HashSet;
use std::io::{self, Write};

use termcolor::{Ansi, Color, ColorSpec, NoColor, WriteColor};

use crate::{Config, Span};

/// How serious a finding is.
///
/// The split is presentational: violations surface in every mode, while
/// warnings are suppressed in check-only mode (where the caller asked for
/// hard findings and nothing else).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Warning,
    Violation,
}

/// One finding about the regex under analysis.
///
/// An alert carries up to two source locations for highlighting, an optional
/// rewrite suggestion and an optional example string demonstrating the
/// problem. Alerts are identified by `(kind, loc1.start)` for deduplication:
/// the same rule firing twice on the same spot (say, once per path) only
/// surfaces once.
#[derive(Clone, Debug)]
pub struct Alert {
    pub kind: &'static str,
    pub severity: Severity,
    pub message: String,
    pub suggest: Option<String>,
    pub example: Option<String>,
    pub loc1: Option<Span>,
    pub loc2: Option<Span>,
}

impl Alert {
    /// Create a new violation with the given kind tag and message.
    pub fn violation(kind: &'static str, message: impl Into<String>) -> Alert {
        Alert {
            kind,
            severity: Severity::Violation,
            message: message.into(),
            suggest: None,
            example: None,
            loc1: None,
            loc2: None,
        }
    }

    /// Create a new warning with the given kind tag and message.
    pub fn warning(kind: &'static str, message: impl Into<String>) -> Alert {
        Alert { severity: Severity::Warning, ..Alert::violation(kind, message) }
    }

    /// Attach the primary source location.
    pub fn loc(mut self, span: Span) -> Alert {
        self.loc1 = Some(span);
        self
    }

    /// Attach both source locations.
    pub fn locs(mut self, span1: Span, span2: Span) -> Alert {
        self.loc1 = Some(span1);
        self.loc2 = Some(span2);
        self
    }

    /// Attach a suggested rewrite of the regex.
    pub fn suggest(mut self, suggest: impl Into<String>) -> Alert {
        self.suggest = Some(suggest.into());
        self
    }

    /// Attach an example string that the regex accepts.
    pub fn example(mut self, example: impl Into<String>) -> Alert {
        self.example = Some(example.into());
        self
    }
}

/// The ordered, deduplicated collection of alerts for one engine run.
///
/// Alerts are rendered eagerly on arrival so that the output order is the
/// order in which the rules fired.
#[derive(Debug)]
pub struct Alerts {
    regex: String,
    web_mode: bool,
    check_mode: bool,
    color: bool,
    rendered: Vec<String>,
    seen: HashSet<(&'static str, Option<usize>)>,
}

impl Alerts {
    /// Create an empty alert sink configured from the engine options.
    pub fn new(config: &Config) -> Alerts {
        Alerts {
            regex: config.regex.clone(),
            web_mode: config.web_mode,
            check_mode: config.check_mode,
            color: config.color,
            rendered: vec![],
            seen: HashSet::new(),
        }
    }

    /// Add an alert, unless an alert with the same `(kind, start)` key was
    /// added before.
    pub fn add(&mut self, alert: Alert) {
        let key = (alert.kind, alert.loc1.map(|s| s.start));
        if !self.seen.insert(key) {
            return;
        }
        // Warnings only matter in test generation mode.
        if alert.severity == Severity::Warning && self.check_mode {
            return;
        }
        let rendered = self.render(&alert);
        self.rendered.push(rendered);
    }

    /// Returns true if no alert survived deduplication and filtering.
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Consume the sink, returning the rendered alerts in arrival order.
    pub fn into_lines(self) -> Vec<String> {
        self.rendered
    }

    fn render(&self, alert: &Alert) -> String {
        let lb = if self.web_mode { "<br>" } else { "\n" };
        let word = match alert.severity {
            Severity::Warning => "WARNING",
            Severity::Violation => "VIOLATION",
        };
        let mut out =
            format!("{} ({}): {}{}", word, alert.kind, alert.message, lb);
        if alert.loc1.is_some() {
            out.push_str("...Regex: ");
            out.push_str(&self.highlight(alert.loc1, alert.loc2));
            out.push_str(lb);
        }
        if let Some(ref suggest) = alert.suggest {
            out.push_str("...Suggested fix: ");
            out.push_str(suggest);
            out.push_str(lb);
        }
        if let Some(ref example) = alert.example {
            out.push_str("...Example accepted string: ");
            out.push_str(example);
            out.push_str(lb);
        }
        out
    }

    /// Reproduce the regex with the alert's spans highlighted.
    fn highlight(&self, loc1: Option<Span>, loc2: Option<Span>) -> String {
        if self.web_mode {
            return self.highlight_web(loc1, loc2);
        }
        let mut buf = vec![];
        let result = if self.color {
            write_highlighted(&self.regex, loc1, loc2, Ansi::new(&mut buf))
        } else {
            write_highlighted(&self.regex, loc1, loc2, NoColor::new(&mut buf))
        };
        // Writing into a Vec<u8> cannot fail.
        result.unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn highlight_web(&self, loc1: Option<Span>, loc2: Option<Span>) -> String {
        let mut out = String::new();
        for (pos, ch) in self.regex.char_indices() {
            let last = pos + ch.len_utf8() - 1;
            if span_starts_at(loc1, pos) || span_starts_at(loc2, pos) {
                out.push_str("<mark>");
            }
            out.push(ch);
            if span_ends_at(loc1, last) || span_ends_at(loc2, last) {
                out.push_str("</mark>");
            }
        }
        out
    }
}

fn span_starts_at(span: Option<Span>, pos: usize) -> bool {
    span.map_or(false, |s| s.start == pos)
}

fn span_ends_at(span: Option<Span>, pos: usize) -> bool {
    span.map_or(false, |s| s.end == pos)
}

/// Write the regex to the given writer, coloring the highlighted spans in
/// the traditional "yellow on blue" alert style.
fn write_highlighted<W: WriteColor>(
    regex: &str,
    loc1: Option<Span>,
    loc2: Option<Span>,
    mut wtr: W,
) -> io::Result<()> {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(Color::Yellow)).set_bg(Some(Color::Blue)).set_bold(true);
    for (pos, ch) in regex.char_indices() {
        let last = pos + ch.len_utf8() - 1;
        if span_starts_at(loc1, pos) || span_starts_at(loc2, pos) {
            wtr.set_color(&spec)?;
        }
        write!(wtr, "{}", ch)?;
        if span_ends_at(loc1, last) || span_ends_at(loc2, last) {
            wtr.reset()?;
        }
    }
    Ok(())
}
