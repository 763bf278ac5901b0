//! JavaScript re-indenter for emitted scripts.
//!
//! Every line is trimmed and re-indented from bracket nesting alone, so the
//! result never depends on how the source templates or substituted fragments
//! were indented. Brackets inside string literals and comments are ignored.
//! A line gains at most one level regardless of how many brackets it opens,
//! which keeps `casper.then(function() {` bodies one level deep.
//!
//! Blank lines are collapsed to a single one and leading/trailing blank lines
//! are dropped. The output is a fixed point: formatting it again is a no-op.

use crate::config::IndentWidth;

/// Scanner state carried across lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    InString(char),
    InStringEscape(char),
    InBlockComment,
    InBlockCommentStar,
}

/// An open bracket and the indentation level of the line that opened it.
#[derive(Debug, Clone, Copy)]
struct Open {
    bracket: char,
    level: usize,
}

fn closes(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

/// Reformat `source` with `indent` spaces per nesting level
pub fn beautify(source: &str, indent: IndentWidth) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut state = State::Code;
    let mut pending_blank = false;

    for raw_line in source.lines() {
        let line = raw_line.trim();

        if line.is_empty() && !matches!(state, State::InBlockComment | State::InBlockCommentStar) {
            pending_blank = !output.is_empty();
            continue;
        }

        let level = if state == State::Code {
            line_level(line, &stack)
        } else {
            body_level(&stack)
        };

        if pending_blank {
            output.push(String::new());
            pending_blank = false;
        }
        if line.is_empty() {
            output.push(String::new());
        } else {
            output.push(format!("{}{}", indent.unit().repeat(level), line));
        }

        state = scan_line(line, level, state, &mut stack);
    }

    output.join("\n")
}

/// Indentation of lines nested under the innermost open bracket.
fn body_level(stack: &[Open]) -> usize {
    stack.last().map(|open| open.level + 1).unwrap_or(0)
}

/// A line starting with a closing bracket sits at the level of the line that
/// opened the matching bracket; any other line sits one level below it.
fn line_level(line: &str, stack: &[Open]) -> usize {
    match line.chars().next() {
        Some(c @ (')' | ']' | '}')) => match stack.last() {
            Some(open) if closes(open.bracket, c) => open.level,
            _ => body_level(stack).saturating_sub(1),
        },
        _ => body_level(stack),
    }
}

/// Walk `line` updating the bracket stack; returns the state for the next line.
fn scan_line(line: &str, level: usize, mut state: State, stack: &mut Vec<Open>) -> State {
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        state = match state {
            State::Code => match c {
                '\'' | '"' | '`' => State::InString(c),
                '/' if chars.peek() == Some(&'/') => return State::Code,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    State::InBlockComment
                }
                '(' | '[' | '{' => {
                    stack.push(Open { bracket: c, level });
                    State::Code
                }
                ')' | ']' | '}' => {
                    if stack.last().is_some_and(|open| closes(open.bracket, c)) {
                        stack.pop();
                    }
                    State::Code
                }
                _ => State::Code,
            },
            State::InString(quote) => match c {
                '\\' => State::InStringEscape(quote),
                _ if c == quote => State::Code,
                _ => State::InString(quote),
            },
            State::InStringEscape(quote) => State::InString(quote),
            State::InBlockComment => match c {
                '*' => State::InBlockCommentStar,
                _ => State::InBlockComment,
            },
            State::InBlockCommentStar => match c {
                '/' => State::Code,
                '*' => State::InBlockCommentStar,
                _ => State::InBlockComment,
            },
        };
    }

    match state {
        // Unterminated quotes do not leak into the next line.
        State::InString(_) | State::InStringEscape(_) => State::Code,
        State::InBlockCommentStar => State::InBlockComment,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindents_nested_blocks() {
        let source = "casper.then(function() {\n\
                      this.waitForSelector('#btn', function() {\n\
                      this.click('#btn');\n\
                      });\n\
                      });";
        let expected = "casper.then(function() {\n    this.waitForSelector('#btn', function() {\n        this.click('#btn');\n    });\n});";
        assert_eq!(beautify(source, IndentWidth::Four), expected);
    }

    #[test]
    fn test_two_space_indent() {
        let source = "casper.run(function() {\n            this.exit();\n});";
        assert_eq!(
            beautify(source, IndentWidth::Two),
            "casper.run(function() {\n  this.exit();\n});"
        );
    }

    #[test]
    fn test_ignores_brackets_in_strings_and_comments() {
        let source = "var a = '{(';\n// }}}\nvar b = \"[\";\n/* { */\nvar c = 1;";
        assert_eq!(beautify(source, IndentWidth::Four), source);
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let source = "casper.setHttpAuth('O\\'Brien', 'a{');\nvar x = 1;";
        assert_eq!(beautify(source, IndentWidth::Four), source);
    }

    #[test]
    fn test_closing_brace_continues_expression() {
        let source = "this.fill('form', {\n'q': 'rust'\n}, true);\nnext();";
        assert_eq!(
            beautify(source, IndentWidth::Four),
            "this.fill('form', {\n    'q': 'rust'\n}, true);\nnext();"
        );
    }

    #[test]
    fn test_else_branch() {
        let source = "if (a) {\nb();\n} else {\nc();\n}";
        assert_eq!(
            beautify(source, IndentWidth::Two),
            "if (a) {\n  b();\n} else {\n  c();\n}"
        );
    }

    #[test]
    fn test_collapses_blank_lines() {
        let source = "\n\na();\n\n\n\nb();\n\n";
        assert_eq!(beautify(source, IndentWidth::Four), "a();\n\nb();");
    }

    #[test]
    fn test_is_idempotent() {
        let source = "function f(x) {\n      return [\n1,\n  2\n];\n}\nf(1);";
        let once = beautify(source, IndentWidth::Four);
        assert_eq!(beautify(&once, IndentWidth::Four), once);
    }

    #[test]
    fn test_unbalanced_closer_does_not_underflow() {
        assert_eq!(beautify("});\nx();", IndentWidth::Four), "});\nx();");
    }
}
