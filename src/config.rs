use crate::error::{Result, SiteError};
use serde::{Deserialize, Serialize};

/// Indentation unit used when formatting emitted scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum IndentWidth {
    Two,
    #[default]
    Four,
}

impl IndentWidth {
    /// Number of spaces per nesting level
    pub fn spaces(self) -> usize {
        match self {
            IndentWidth::Two => 2,
            IndentWidth::Four => 4,
        }
    }

    /// One level of indentation as a string
    pub fn unit(self) -> &'static str {
        match self {
            IndentWidth::Two => "  ",
            IndentWidth::Four => "    ",
        }
    }
}

impl TryFrom<usize> for IndentWidth {
    type Error = SiteError;

    fn try_from(spaces: usize) -> Result<Self> {
        match spaces {
            2 => Ok(IndentWidth::Two),
            4 => Ok(IndentWidth::Four),
            other => Err(SiteError::InvalidOption(format!(
                "indent width must be 2 or 4, got {}",
                other
            ))),
        }
    }
}

impl From<IndentWidth> for usize {
    fn from(width: IndentWidth) -> Self {
        width.spaces()
    }
}

/// Options for script emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Indentation of the formatted output (default: 4 spaces)
    #[serde(default)]
    pub indent: IndentWidth,
}

impl CompileOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the indentation width
    pub fn indent(mut self, indent: IndentWidth) -> Self {
        self.indent = indent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_indent_is_four() {
        let options = CompileOptions::new();
        assert_eq!(options.indent, IndentWidth::Four);
        assert_eq!(options.indent.unit(), "    ");
    }

    #[test]
    fn test_indent_builder() {
        let options = CompileOptions::new().indent(IndentWidth::Two);
        assert_eq!(options.indent.spaces(), 2);
    }

    #[test]
    fn test_indent_try_from() {
        assert_eq!(IndentWidth::try_from(2).unwrap(), IndentWidth::Two);
        assert_eq!(IndentWidth::try_from(4).unwrap(), IndentWidth::Four);
        assert!(matches!(
            IndentWidth::try_from(3),
            Err(SiteError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_options_deserialize() {
        let options: CompileOptions = serde_json::from_value(serde_json::json!({"indent": 2})).unwrap();
        assert_eq!(options.indent, IndentWidth::Two);

        let options: CompileOptions = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(options.indent, IndentWidth::Four);

        assert!(serde_json::from_value::<CompileOptions>(serde_json::json!({"indent": 8})).is_err());
    }
}
