//! Tokenizer for the inside of one marker.

use butler_core::application::ports::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// `.A.B`; empty for `.`
    Field(Vec<String>),
    Ident(String),
    Str(String),
    Int(i64),
    Bool(bool),
    Pipe,
    LParen,
    RParen,
}

/// One lexed action.
#[derive(Debug)]
pub(crate) struct Action {
    pub tokens: Vec<Token>,
    /// Action was a `/* ... */` comment.
    pub comment: bool,
    /// Closed with ` -` before the end delimiter.
    pub trim_right: bool,
    /// Byte offset just past the end delimiter.
    pub end: usize,
}

const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "if", "else", "end", "range", "with", "define", "template", "block", "break", "continue",
    "nil",
];

/// Lex the action that starts at byte `pos` of `src` (just past the start
/// delimiter and any trim marker) up to and including `end_delim`.
///
/// The end delimiter only counts between tokens, never inside a string.
pub(crate) fn lex_action(src: &str, pos: usize, end_delim: &str) -> Result<Action, ExpressionError> {
    let opened_at = pos;
    let mut i = pos;
    let mut tokens = Vec::new();

    loop {
        let ws_start = i;
        while src[i..].starts_with(char::is_whitespace) {
            i += src[i..].chars().next().map_or(1, char::len_utf8);
        }
        let after_space = i > ws_start;

        if after_space && src[i..].starts_with('-') && src[i + 1..].starts_with(end_delim) {
            return Ok(Action {
                tokens,
                comment: false,
                trim_right: true,
                end: i + 1 + end_delim.len(),
            });
        }
        if src[i..].starts_with(end_delim) {
            return Ok(Action {
                tokens,
                comment: false,
                trim_right: false,
                end: i + end_delim.len(),
            });
        }

        let Some(c) = src[i..].chars().next() else {
            return Err(ExpressionError::parse(format!(
                "unclosed action starting at offset {}",
                opened_at
            )));
        };

        if tokens.is_empty() && src[i..].starts_with("/*") {
            return lex_comment(src, i, end_delim, opened_at);
        }

        match c {
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
                expect_boundary(src, i, end_delim, ")")?;
            }
            '"' => {
                let (value, next) = lex_quoted(src, i)?;
                tokens.push(Token::Str(value));
                i = next;
                expect_boundary(src, i, end_delim, "string")?;
            }
            '`' => {
                let close = src[i + 1..]
                    .find('`')
                    .ok_or_else(|| ExpressionError::parse("unterminated raw quoted string"))?;
                tokens.push(Token::Str(src[i + 1..i + 1 + close].to_string()));
                i += close + 2;
                expect_boundary(src, i, end_delim, "string")?;
            }
            '.' => {
                let (chain, next) = lex_field(src, i);
                let shown = format!(".{}", chain.join("."));
                tokens.push(Token::Field(chain));
                i = next;
                expect_boundary(src, i, end_delim, &shown)?;
            }
            '$' => {
                return Err(ExpressionError::parse(
                    "variables are not supported in markers",
                ));
            }
            c if c.is_ascii_digit() || (c == '-' && next_is_digit(src, i)) => {
                let start = i;
                i += 1;
                while src[i..].starts_with(|c: char| c.is_ascii_digit()) {
                    i += 1;
                }
                let text = &src[start..i];
                let value = text.parse::<i64>().map_err(|e| {
                    ExpressionError::parse(format!("bad number syntax {:?}: {}", text, e))
                })?;
                tokens.push(Token::Int(value));
                expect_boundary(src, i, end_delim, text)?;
            }
            c if is_ident_start(c) => {
                let start = i;
                while src[i..].starts_with(is_ident_char) {
                    i += 1;
                }
                let word = &src[start..i];
                let token = match word {
                    "true" => Token::Bool(true),
                    "false" => Token::Bool(false),
                    kw if UNSUPPORTED_KEYWORDS.contains(&kw) => {
                        return Err(ExpressionError::parse(format!(
                            "{:?} is not supported in markers",
                            kw
                        )));
                    }
                    name => Token::Ident(name.to_string()),
                };
                tokens.push(token);
                expect_boundary(src, i, end_delim, word)?;
            }
            other => {
                return Err(ExpressionError::parse(format!(
                    "unexpected {:?} in action",
                    other
                )));
            }
        }
    }
}

fn lex_comment(
    src: &str,
    at: usize,
    end_delim: &str,
    opened_at: usize,
) -> Result<Action, ExpressionError> {
    let close = src[at + 2..]
        .find("*/")
        .ok_or_else(|| ExpressionError::parse(format!("unclosed comment at offset {}", at)))?;
    let mut i = at + 2 + close + 2;

    let trim_right = src[i..].starts_with(" -") && src[i + 2..].starts_with(end_delim);
    if trim_right {
        i += 2;
    }
    if !src[i..].starts_with(end_delim) {
        return Err(ExpressionError::parse(format!(
            "comment ends before closing delimiter in action at offset {}",
            opened_at
        )));
    }

    Ok(Action {
        tokens: Vec::new(),
        comment: true,
        trim_right,
        end: i + end_delim.len(),
    })
}

/// `"..."` with the usual escapes. Returns the value and the offset past the
/// closing quote.
fn lex_quoted(src: &str, at: usize) -> Result<(String, usize), ExpressionError> {
    let mut value = String::new();
    let mut chars = src[at + 1..].char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '"' => return Ok((value, at + 1 + offset + 1)),
            '\n' => break,
            '\\' => {
                let escaped = match chars.next() {
                    Some((_, 'n')) => '\n',
                    Some((_, 't')) => '\t',
                    Some((_, 'r')) => '\r',
                    Some((_, '\\')) => '\\',
                    Some((_, '"')) => '"',
                    Some((_, '\'')) => '\'',
                    Some((_, other)) => {
                        return Err(ExpressionError::parse(format!(
                            "unknown escape sequence \\{}",
                            other
                        )));
                    }
                    None => break,
                };
                value.push(escaped);
            }
            c => value.push(c),
        }
    }

    Err(ExpressionError::parse("unterminated quoted string"))
}

/// `.A.B` or a lone `.`.
fn lex_field(src: &str, at: usize) -> (Vec<String>, usize) {
    let mut chain = Vec::new();
    let mut i = at;
    while src[i..].starts_with('.') && src[i + 1..].starts_with(is_ident_start) {
        i += 1;
        let start = i;
        while src[i..].starts_with(is_ident_char) {
            i += 1;
        }
        chain.push(src[start..i].to_string());
    }
    if chain.is_empty() {
        i = at + 1;
    }
    (chain, i)
}

/// After a word-like token the next thing must be a separator.
fn expect_boundary(src: &str, i: usize, end_delim: &str, after: &str) -> Result<(), ExpressionError> {
    let rest = &src[i..];
    if rest.is_empty()
        || rest.starts_with(char::is_whitespace)
        || rest.starts_with('|')
        || rest.starts_with(')')
        || rest.starts_with(end_delim)
    {
        return Ok(());
    }
    let next = rest.chars().next().unwrap_or(' ');
    Err(ExpressionError::parse(format!(
        "unexpected {:?} after {}",
        next, after
    )))
}

fn next_is_digit(src: &str, i: usize) -> bool {
    src[i + 1..].starts_with(|c: char| c.is_ascii_digit())
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use butler_core::domain::RenderPhase;

    fn lex(action: &str) -> Result<Action, ExpressionError> {
        lex_action(action, 0, "}")
    }

    #[test]
    fn field_chain_and_end() {
        let action = lex(".Project.Name} tail").unwrap();
        assert_eq!(
            action.tokens,
            vec![Token::Field(vec!["Project".into(), "Name".into()])]
        );
        assert_eq!(action.end, ".Project.Name}".len());
        assert!(!action.trim_right);
    }

    #[test]
    fn pipeline_with_literals() {
        let action = lex(r#" .Vars.x | join ", " -}"#).unwrap();
        assert_eq!(
            action.tokens,
            vec![
                Token::Field(vec!["Vars".into(), "x".into()]),
                Token::Pipe,
                Token::Ident("join".into()),
                Token::Str(", ".into()),
            ]
        );
        assert!(action.trim_right);
    }

    #[test]
    fn end_delimiter_inside_string_is_text() {
        let action = lex(r#"toSnakeCase "a}b"}"#).unwrap();
        assert_eq!(action.tokens[1], Token::Str("a}b".into()));
    }

    #[test]
    fn numbers_bools_parens() {
        let action = lex("(f -3 true) }").unwrap();
        assert_eq!(
            action.tokens,
            vec![
                Token::LParen,
                Token::Ident("f".into()),
                Token::Int(-3),
                Token::Bool(true),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn errors_are_parse_phase() {
        for bad in [
            ".Project.Name",
            r#""open}"#,
            "if .X}",
            "$x}",
            ".A.}",
            "a#b}",
            r#""\q"}"#,
        ] {
            let err = lex(bad).unwrap_err();
            assert_eq!(err.phase, RenderPhase::Parse, "{bad}");
        }
    }

    #[test]
    fn comments_produce_no_tokens() {
        let action = lex("/* note */}rest").unwrap();
        assert!(action.comment);
        assert_eq!(action.end, "/* note */}".len());
    }
}
