//! Fixed-shape script templates
//!
//! Templates are plain text containing `{{token}}` slots. Rendering is a single
//! pass: substituted values are never re-scanned, and every slot must resolve
//! or rendering fails without producing any output.

pub mod beautify;

pub use beautify::beautify;

use crate::error::{Result, SiteError};
use indexmap::IndexMap;

/// Values bound to template tokens, in insertion order
pub type TemplateValues<'a> = IndexMap<&'a str, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Token(&'a str),
}

/// A parsed template: literal text interleaved with named slots
#[derive(Debug, Clone)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> Template<'a> {
    /// Split `source` into text and `{{token}}` segments
    pub fn parse(source: &'a str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Text(&rest[..start]));
            }
            let after_open = &rest[start + 2..];
            let end = after_open.find("}}").ok_or_else(|| SiteError::TemplateSubstitution {
                token: after_open.lines().next().unwrap_or_default().to_string(),
            })?;
            let token = after_open[..end].trim();
            if !is_token_name(token) {
                return Err(SiteError::TemplateSubstitution {
                    token: token.to_string(),
                });
            }
            segments.push(Segment::Token(token));
            rest = &after_open[end + 2..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Text(rest));
        }

        Ok(Self { segments })
    }

    /// Names of all slots, in order of appearance (repeats included)
    pub fn tokens(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Token(token) => Some(*token),
            Segment::Text(_) => None,
        })
    }

    /// Substitute every slot from `values`
    pub fn render(&self, values: &TemplateValues<'_>) -> Result<String> {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Token(token) => {
                    let value = values.get(token).ok_or_else(|| SiteError::TemplateSubstitution {
                        token: (*token).to_string(),
                    })?;
                    output.push_str(value);
                }
            }
        }
        Ok(output)
    }
}

fn is_token_name(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse `source` and render it in one go
pub fn supplant(source: &str, values: &TemplateValues<'_>) -> Result<String> {
    Template::parse(source)?.render(values)
}

/// Escape `value` for use inside a single-quoted JavaScript string literal
pub fn escape_js_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            _ => escaped.push(c),
        }
    }
    escaped
}
