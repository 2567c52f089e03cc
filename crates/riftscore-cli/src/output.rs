//! Terminal output for riftscore commands
//!
//! Human mode prints status lines with a glyph; warnings and errors go to
//! stderr. JSON mode keeps stdout for the command's document only, so
//! `riftscore --json ... | jq` always sees a single value; status lines are
//! written to stderr as one-line JSON objects and `info` lines are dropped.

use serde_json::{json, Value};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Severity of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warn,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warn => "warning",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// A rendered status line and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub stream: Stream,
    pub text: String,
}

impl Line {
    fn write(&self) {
        match self.stream {
            Stream::Stdout => println!("{}", self.text),
            Stream::Stderr => eprintln!("{}", self.text),
        }
    }
}

/// Formats CLI output
///
/// Implementors only decide how a status line renders; the provided methods
/// do the writing.
pub trait OutputFormatter {
    /// Renders a status line, or `None` when it is suppressed.
    fn render(&self, level: Level, message: &str) -> Option<Line>;

    /// Renders `label value` pairs as aligned detail lines.
    fn render_fields(&self, fields: &[(&str, String)]) -> Vec<Line>;

    fn print_json(&self, value: &Value);

    fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn fields(&self, fields: &[(&str, String)]) {
        for line in self.render_fields(fields) {
            line.write();
        }
    }

    fn emit(&self, level: Level, message: &str) {
        if let Some(line) = self.render(level, message) {
            line.write();
        }
    }
}

/// Glyph-prefixed lines for a terminal
pub struct HumanFormatter {
    quiet: bool,
}

impl OutputFormatter for HumanFormatter {
    fn render(&self, level: Level, message: &str) -> Option<Line> {
        let (stream, text) = match level {
            Level::Success => (Stream::Stdout, format!("\u{2713} {message}")),
            Level::Info if self.quiet => return None,
            Level::Info => (Stream::Stdout, format!("  {message}")),
            Level::Warn => (Stream::Stderr, format!("\u{26a0} Warning: {message}")),
            Level::Error => (Stream::Stderr, format!("\u{2717} Error: {message}")),
        };
        Some(Line { stream, text })
    }

    fn render_fields(&self, fields: &[(&str, String)]) -> Vec<Line> {
        if self.quiet {
            return Vec::new();
        }
        let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        fields
            .iter()
            .map(|(label, value)| Line {
                stream: Stream::Stdout,
                text: format!("  {label:<width$}  {value}"),
            })
            .collect()
    }

    fn print_json(&self, _value: &Value) {}
}

/// Machine-readable output
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn render(&self, level: Level, message: &str) -> Option<Line> {
        if level == Level::Info {
            return None;
        }
        Some(Line {
            stream: Stream::Stderr,
            text: json!({ "level": level.as_str(), "message": message }).to_string(),
        })
    }

    fn render_fields(&self, _fields: &[(&str, String)]) -> Vec<Line> {
        Vec::new()
    }

    fn print_json(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("{}", json!({ "level": "error", "message": e.to_string() })),
        }
    }
}

pub fn get_formatter(format: OutputFormat, quiet: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Human => Box::new(HumanFormatter { quiet }),
    }
}

/// `""` or `"s"` for counts in human output
pub fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
