use crate::syntax::Span;
use serde::Serialize;
use std::fmt;

/// Kind of analysis diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    ParseFailure,
    NotPartial,
    NestedClass,
    ConflictingMemberTypes,
    FragmentNameCollision,
    Internal,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseFailure => "Parse failure",
            DiagnosticKind::NotPartial => "Class not partial",
            DiagnosticKind::NestedClass => "Nested class",
            DiagnosticKind::ConflictingMemberTypes => "Conflicting member types",
            DiagnosticKind::FragmentNameCollision => "Fragment name collision",
            DiagnosticKind::Internal => "Internal error",
        }
    }

    /// Stable code, one per kind
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::ParseFailure => "CTR001",
            DiagnosticKind::NotPartial => "CTR002",
            DiagnosticKind::NestedClass => "CTR003",
            DiagnosticKind::ConflictingMemberTypes => "CTR004",
            DiagnosticKind::FragmentNameCollision => "CTR005",
            DiagnosticKind::Internal => "CTR006",
        }
    }

    fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::ConflictingMemberTypes => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A user-visible finding tied to a declaration site. Every failure mode of
/// the pipeline lands here; nothing is swallowed and nothing halts the run.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    /// Name of the unit the span points into
    pub file: String,
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic; severity follows the kind
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, file: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
            file: file.into(),
            span,
            related_span: None,
            related_label: None,
            help: None,
        }
    }

    /// Add a related span in the same unit (e.g. "first declared here")
    pub fn with_related(mut self, span: Span) -> Self {
        self.related_span = Some(span);
        self
    }

    /// Set the label for the related span
    pub fn with_related_label(mut self, label: impl Into<String>) -> Self {
        self.related_label = Some(label.into());
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// One-line form used in logs and expected-output fixtures
    pub fn summary(&self) -> String {
        format!(
            "{} {}: {} ({}:{}:{})",
            self.severity.as_str(),
            self.kind.code(),
            self.message,
            self.file,
            self.span.start.line + 1,
            self.span.start.col + 1
        )
    }

    /// Render with source context
    pub fn render(&self, source: &str) -> String {
        self.render_inner(source, false)
    }

    /// Render with source context and ANSI color codes
    pub fn render_color(&self, source: &str) -> String {
        self.render_inner(source, true)
    }

    fn render_inner(&self, source: &str, color: bool) -> String {
        // Red for errors, yellow for warnings, dim for structural chrome
        let label_color = if !color {
            ""
        } else if self.severity == Severity::Error {
            "\x1b[1;31m"
        } else {
            "\x1b[1;33m"
        };
        let dim = if color { "\x1b[2m" } else { "" };
        let underline = if color { "\x1b[4m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();

        // Leading blank line for visual separation
        output.push('\n');

        // File location at the top
        let line = self.span.start.line + 1;
        let col = self.span.start.col + 1;
        let location = format!("{}:{}:{}", self.file, line, col);
        if color {
            // OSC 8 hyperlink: \x1b]8;;URL\x07TEXT\x1b]8;;\x07
            let abs_path = std::path::Path::new(&self.file)
                .canonicalize()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| self.file.clone());
            output.push_str(&format!(
                " {}file:{} \x1b]8;;file://{}\x07{}{}{}\x1b]8;;\x07\n",
                dim, reset, abs_path, underline, location, reset
            ));
        } else {
            output.push_str(&format!(" file: {}\n", location));
        }

        // Header: severity label, code, message with highlighted quotes
        let message = if color { highlight_quoted(&self.message) } else { self.message.clone() };
        output.push_str(&format!(
            "{}{}[{}]:{} {}\n",
            label_color,
            self.severity.as_str(),
            self.kind.code(),
            reset,
            message
        ));

        // Source context with a caret run under the span
        let err_line = self.span.start.line + 1;
        if let Some(source_line) = source.lines().nth(self.span.start.line) {
            let line_num_width = format!("{}", err_line).len().max(2);
            let highlighted = if color { highlight_line(source_line) } else { source_line.to_string() };
            output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = line_num_width));
            output.push_str(&format!(
                "{}{:>width$} |{} {}\n",
                dim, err_line, reset, highlighted,
                width = line_num_width
            ));

            let underline_start = self.span.start.col;
            let underline_len = if self.span.end.line == self.span.start.line {
                (self.span.end.col.saturating_sub(self.span.start.col)).max(1)
            } else {
                source_line.len().saturating_sub(underline_start).max(1)
            };

            let spaces = " ".repeat(underline_start);
            let carets = "^".repeat(underline_len);
            output.push_str(&format!(
                "{}{:>width$} |{} {}{}{}{}\n",
                dim, "", reset,
                spaces, label_color, carets, reset,
                width = line_num_width
            ));
        }

        // Related span: dim chrome, secondary context
        if let Some(ref related) = self.related_span {
            let related_line = related.start.line + 1;
            if let Some(related_source_line) = source.lines().nth(related.start.line) {
                let line_num_width = format!("{}", related_line).len().max(2);
                let highlighted = if color {
                    highlight_line(related_source_line)
                } else {
                    related_source_line.to_string()
                };
                output.push_str(&format!(
                    "{}{:>width$} |{} {}\n",
                    dim, related_line, reset, highlighted,
                    width = line_num_width
                ));

                let underline_start = related.start.col;
                let underline_len = if related.end.line == related.start.line {
                    (related.end.col.saturating_sub(related.start.col)).max(1)
                } else {
                    related_source_line.len().saturating_sub(underline_start).max(1)
                };

                let spaces = " ".repeat(underline_start);
                let carets = "^".repeat(underline_len);
                let label = self.related_label.as_deref().unwrap_or("declared here");
                output.push_str(&format!(
                    "{}{:>width$} |{} {}{}{} {}{}\n",
                    dim, "", reset,
                    spaces, dim, carets, label, reset,
                    width = line_num_width
                ));
            }
        }

        // Help text: cyan label aligned with the severity label
        if let Some(ref help) = self.help {
            output.push('\n');
            for (i, help_line) in help.lines().enumerate() {
                let content = if color { highlight_quoted(help_line) } else { help_line.to_string() };
                if i == 0 {
                    output.push_str(&format!(" {}help:{} {}\n", cyan, reset, content));
                } else {
                    output.push_str(&format!("       {}\n", content));
                }
            }
        }

        // Trailing blank line for visual separation
        output.push('\n');

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

/// Highlight 'quoted' code spans in prose (messages, help text)
fn highlight_quoted(text: &str) -> String {
    const KEYWORD: &str = "\x1b[38;5;173m";
    const RESET: &str = "\x1b[0m";

    let mut result = String::with_capacity(text.len() * 2);
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\'' {
            let content_start = i + 1;
            let mut j = content_start;
            while j < chars.len() && chars[j] != '\'' {
                j += 1;
            }
            if j < chars.len() && j > content_start {
                let content: String = chars[content_start..j].iter().collect();
                result.push_str(KEYWORD);
                result.push('`');
                result.push_str(&content);
                result.push('`');
                result.push_str(RESET);
                i = j + 1;
                continue;
            }
        }
        result.push(chars[i]);
        i += 1;
    }
    result
}

/// Syntax highlighting for C# context lines shown under a diagnostic
fn highlight_line(line: &str) -> String {
    const KEYWORD: &str = "\x1b[38;5;173m";
    const TYPE: &str = "\x1b[38;5;180m";
    const STRING: &str = "\x1b[38;5;72m";
    const NUMBER: &str = "\x1b[38;5;73m";
    const ATTR: &str = "\x1b[38;5;103m";
    const RESET: &str = "\x1b[0m";

    const KEYWORDS: &[&str] = &[
        "using", "namespace", "class", "interface", "struct", "record", "enum",
        "public", "private", "protected", "internal", "partial", "sealed",
        "static", "abstract", "readonly", "virtual", "override", "new",
        "get", "set", "init", "where", "this", "base", "return", "var",
    ];

    const BUILTIN_TYPES: &[&str] = &[
        "int", "uint", "long", "ulong", "short", "ushort", "byte", "sbyte",
        "bool", "double", "float", "decimal", "string", "char", "object", "void",
    ];

    let mut result = String::with_capacity(line.len() * 2);
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        // Attribute lists: [Name(...)] with the name tinted
        if chars[i] == '[' {
            result.push('[');
            i += 1;
            result.push_str(ATTR);
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                result.push(chars[i]);
                i += 1;
            }
            result.push_str(RESET);
            continue;
        }

        // String literals
        if chars[i] == '"' {
            result.push_str(STRING);
            result.push('"');
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                if chars[i] == '\\' && i + 1 < chars.len() {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push(chars[i]);
                i += 1;
            }
            if i < chars.len() {
                result.push('"');
                i += 1;
            }
            result.push_str(RESET);
            continue;
        }

        // Identifiers and keywords
        if chars[i].is_alphabetic() || chars[i] == '_' {
            let word_start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[word_start..i].iter().collect();

            if KEYWORDS.contains(&word.as_str()) {
                result.push_str(KEYWORD);
                result.push_str(&word);
                result.push_str(RESET);
            } else if BUILTIN_TYPES.contains(&word.as_str()) {
                result.push_str(TYPE);
                result.push_str(&word);
                result.push_str(RESET);
            } else {
                result.push_str(&word);
            }
            continue;
        }

        // Numbers
        if chars[i].is_ascii_digit() {
            result.push_str(NUMBER);
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.' || chars[i] == '_') {
                result.push(chars[i]);
                i += 1;
            }
            result.push_str(RESET);
            continue;
        }

        result.push(chars[i]);
        i += 1;
    }

    result
}
