//! Marker syntax tree and parser.
//!
//! ```text
//! source    := (text | action)*
//! action    := start pipeline end
//! pipeline  := command ('|' command)*
//! command   := ident operand*  |  operand
//! operand   := field | string | int | bool | ident | '(' pipeline ')'
//! ```

use butler_core::application::ports::ExpressionError;
use butler_core::domain::{Delimiters, FunctionTable};
use serde_json::Value;

use super::lexer::{Token, lex_action};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Call { name: String, args: Vec<Operand> },
    Value(Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Field(Vec<String>),
    Literal(Value),
    Nested(Pipeline),
}

/// Split `source` into text and parsed actions.
///
/// Function names are checked against `functions` here, so an unknown
/// function fails before anything is evaluated.
pub(crate) fn parse(
    source: &str,
    delimiters: &Delimiters,
    functions: &FunctionTable,
) -> Result<Vec<Node>, ExpressionError> {
    let (start, end) = (delimiters.start(), delimiters.end());
    let mut nodes = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    while let Some(offset) = source[pos..].find(start) {
        let mut text = &source[pos..pos + offset];
        if trim_next {
            text = text.trim_start();
        }

        let mut i = pos + offset + start.len();
        let trim_left = source[i..].starts_with('-')
            && source[i + 1..].starts_with(char::is_whitespace);
        if trim_left {
            text = text.trim_end();
            i += 1;
        }
        if !text.is_empty() {
            nodes.push(Node::Text(text.to_string()));
        }

        let action = lex_action(source, i, end)?;
        if !action.comment {
            let mut parser = Parser {
                tokens: &action.tokens,
                pos: 0,
                functions,
            };
            let pipeline = parser.pipeline()?;
            if let Some(token) = parser.peek() {
                return Err(ExpressionError::parse(format!(
                    "unexpected {} in action",
                    describe(token)
                )));
            }
            nodes.push(Node::Action(pipeline));
        }

        trim_next = action.trim_right;
        pos = action.end;
    }

    let mut rest = &source[pos..];
    if trim_next {
        rest = rest.trim_start();
    }
    if !rest.is_empty() {
        nodes.push(Node::Text(rest.to_string()));
    }
    Ok(nodes)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    functions: &'a FunctionTable,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn pipeline(&mut self) -> Result<Pipeline, ExpressionError> {
        let mut commands = vec![self.command()?];
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            let command = self.command()?;
            if let Command::Value(_) = command {
                return Err(ExpressionError::parse(format!(
                    "non executable command in pipeline stage {}",
                    commands.len() + 1
                )));
            }
            commands.push(command);
        }
        Ok(Pipeline { commands })
    }

    fn command(&mut self) -> Result<Command, ExpressionError> {
        let name = match self.peek() {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Some(self.function(name)?)
            }
            _ => None,
        };

        let mut operands = Vec::new();
        while let Some(token) = self.peek() {
            if matches!(token, Token::Pipe | Token::RParen) {
                break;
            }
            operands.push(self.operand()?);
        }

        match name {
            Some(name) => Ok(Command::Call {
                name,
                args: operands,
            }),
            None => {
                let mut operands = operands.into_iter();
                match (operands.next(), operands.next()) {
                    (Some(operand), None) => Ok(Command::Value(operand)),
                    (None, _) => Err(ExpressionError::parse("missing value for command")),
                    (Some(_), Some(_)) => Err(ExpressionError::parse(
                        "can't give argument to non-function",
                    )),
                }
            }
        }
    }

    fn operand(&mut self) -> Result<Operand, ExpressionError> {
        match self.next() {
            Some(Token::Field(chain)) => Ok(Operand::Field(chain.clone())),
            Some(Token::Str(s)) => Ok(Operand::Literal(Value::String(s.clone()))),
            Some(Token::Int(n)) => Ok(Operand::Literal(Value::from(*n))),
            Some(Token::Bool(b)) => Ok(Operand::Literal(Value::Bool(*b))),
            // A bare function name as an argument is a call with no arguments.
            Some(Token::Ident(name)) => Ok(Operand::Nested(Pipeline {
                commands: vec![Command::Call {
                    name: self.function(name)?,
                    args: Vec::new(),
                }],
            })),
            Some(Token::LParen) => {
                let inner = self.pipeline()?;
                match self.next() {
                    Some(Token::RParen) => Ok(Operand::Nested(inner)),
                    _ => Err(ExpressionError::parse("unclosed left paren")),
                }
            }
            Some(token) => Err(ExpressionError::parse(format!(
                "unexpected {} in operand",
                describe(token)
            ))),
            None => Err(ExpressionError::parse("missing operand")),
        }
    }

    fn function(&self, name: &str) -> Result<String, ExpressionError> {
        if self.functions.contains(name) {
            Ok(name.to_string())
        } else {
            Err(ExpressionError::parse(format!(
                "function {:?} not defined",
                name
            )))
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Field(chain) => format!(".{}", chain.join(".")),
        Token::Ident(name) => name.clone(),
        Token::Str(s) => format!("{:?}", s),
        Token::Int(n) => n.to_string(),
        Token::Bool(b) => b.to_string(),
        Token::Pipe => "\"|\"".into(),
        Token::LParen => "\"(\"".into(),
        Token::RParen => "\")\"".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use butler_core::domain::RenderPhase;

    fn parse_default(source: &str) -> Result<Vec<Node>, ExpressionError> {
        parse(source, &Delimiters::default(), &FunctionTable::standard())
    }

    #[test]
    fn text_and_actions_interleave() {
        let nodes = parse_default("package butler{.Project.Name}\n").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], Node::Text("package ".into()));
        assert_eq!(nodes[2], Node::Text("\n".into()));
    }

    #[test]
    fn trim_markers_eat_adjacent_whitespace() {
        let nodes = parse_default("a  \n butler{- .Year -}  \n b").unwrap();
        assert_eq!(nodes[0], Node::Text("a".into()));
        assert_eq!(nodes[2], Node::Text("b".into()));
    }

    #[test]
    fn pipeline_stages_must_be_calls() {
        let err = parse_default("butler{.Vars.a | .Vars.b}").unwrap_err();
        assert!(err.message.contains("pipeline stage 2"));
    }

    #[test]
    fn unknown_function_is_a_parse_error() {
        let err = parse_default("butler{shout .Project.Name}").unwrap_err();
        assert_eq!(err.phase, RenderPhase::Parse);
        assert!(err.message.contains("\"shout\" not defined"));
    }

    #[test]
    fn empty_and_stray_tokens_fail() {
        assert!(parse_default("butler{}").is_err());
        assert!(parse_default("butler{.A)}").is_err());
        assert!(parse_default("butler{(toSnakeCase .A}").is_err());
        assert!(parse_default("butler{.A .B}").is_err());
    }

    #[test]
    fn nested_pipelines_parse() {
        let nodes = parse_default(r#"butler{join (getSurveyResult "f") "-"}"#).unwrap();
        match &nodes[0] {
            Node::Action(p) => match &p.commands[0] {
                Command::Call { name, args } => {
                    assert_eq!(name, "join");
                    assert!(matches!(args[0], Operand::Nested(_)));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn custom_delimiters() {
        let delims = Delimiters::new("[[", "]]").unwrap();
        let nodes = parse("x [[.Year]] {{ .Keep }}", &delims, &FunctionTable::standard()).unwrap();
        assert_eq!(nodes.last(), Some(&Node::Text(" {{ .Keep }}".into())));
    }
}
