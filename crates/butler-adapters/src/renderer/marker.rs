//! Marker engine: the default expression language.

use butler_core::{
    application::ports::{ExpressionEngine, ExpressionError},
    domain::{Context, Delimiters, FunctionTable, display_value},
};
use serde_json::Value;
use tracing::trace;

use super::parser::{Command, Node, Operand, Pipeline, parse};

/// Evaluates `butler{ ... }` markers: field chains, literals, function calls,
/// pipelines and parenthesized sub-pipelines.
///
/// Stateless; one instance serves every worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerEngine;

impl MarkerEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ExpressionEngine for MarkerEngine {
    fn render(
        &self,
        source: &str,
        delimiters: &Delimiters,
        functions: &FunctionTable,
        context: &Context,
    ) -> Result<String, ExpressionError> {
        if !delimiters.appears_in(source) {
            return Ok(source.to_string());
        }

        let nodes = parse(source, delimiters, functions)?;
        trace!(nodes = nodes.len(), "Parsed markers");

        let eval = Evaluator { functions, context };
        let mut out = String::with_capacity(source.len());
        for node in &nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Action(pipeline) => out.push_str(&display_value(&eval.pipeline(pipeline)?)),
            }
        }
        Ok(out)
    }
}

struct Evaluator<'a> {
    functions: &'a FunctionTable,
    context: &'a Context,
}

impl Evaluator<'_> {
    fn pipeline(&self, pipeline: &Pipeline) -> Result<Value, ExpressionError> {
        let mut piped = None;
        for command in &pipeline.commands {
            piped = Some(self.command(command, piped.take())?);
        }
        piped.ok_or_else(|| ExpressionError::execute("empty pipeline"))
    }

    fn command(&self, command: &Command, piped: Option<Value>) -> Result<Value, ExpressionError> {
        match command {
            Command::Value(operand) => self.operand(operand),
            Command::Call { name, args } => {
                let mut values = args
                    .iter()
                    .map(|arg| self.operand(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                values.extend(piped);

                let function = self.functions.get(name).ok_or_else(|| {
                    ExpressionError::execute(format!("function {:?} not defined", name))
                })?;
                function(self.context, &values).map_err(|e| {
                    ExpressionError::execute(format!("error calling {}: {}", name, e))
                })
            }
        }
    }

    fn operand(&self, operand: &Operand) -> Result<Value, ExpressionError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Nested(pipeline) => self.pipeline(pipeline),
            Operand::Field(chain) => self.context.field(chain.as_slice()).cloned().ok_or_else(|| {
                let missing = missing_key(self.context, chain);
                ExpressionError::execute(format!(
                    "map has no entry for key {:?} in .{}",
                    missing,
                    chain.join(".")
                ))
            }),
        }
    }
}

/// First key of `chain` that does not resolve.
fn missing_key<'c>(context: &Context, chain: &'c [String]) -> &'c str {
    (1..=chain.len())
        .find(|&n| context.field(&chain[..n]).is_none())
        .map_or("", |n| chain[n - 1].as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use butler_core::domain::RenderPhase;
    use serde_json::json;

    fn ctx() -> Context {
        Context::builder("my-demo app")
            .path("/tmp/my-demo")
            .template("go-cli")
            .description("A demo")
            .variable("author", "Ada")
            .answer("db", "postgres")
            .answer("features", json!(["auth", "api"]))
            .build()
            .unwrap()
    }

    fn render(source: &str) -> Result<String, ExpressionError> {
        MarkerEngine::new().render(
            source,
            &Delimiters::default(),
            &FunctionTable::standard(),
            &ctx(),
        )
    }

    #[test]
    fn plain_fields() {
        assert_eq!(
            render("name=butler{.Project.Name} by butler{.Vars.author}").unwrap(),
            "name=my-demo app by Ada"
        );
        assert_eq!(render("butler{.Project.Template}").unwrap(), "go-cli");
    }

    #[test]
    fn case_functions_and_pipelines() {
        assert_eq!(render("butler{toSnakeCase .Project.Name}").unwrap(), "my_demo_app");
        assert_eq!(render("butler{.Project.Name | toPascalCase}").unwrap(), "MyDemoApp");
        assert_eq!(
            render("butler{.Project.Name | toCamelCase | toKebabCase}").unwrap(),
            "my-demo-app"
        );
    }

    #[test]
    fn survey_answers_and_join() {
        assert_eq!(render(r#"butler{getSurveyResult "db"}"#).unwrap(), "postgres");
        assert_eq!(
            render(r#"butler{join (getSurveyResult "features") ", "}"#).unwrap(),
            "auth, api"
        );
    }

    #[test]
    fn missing_answer_is_an_execute_error() {
        let err = render(r#"butler{getSurveyResult "orm"}"#).unwrap_err();
        assert_eq!(err.phase, RenderPhase::Execute);
        assert!(err.message.contains("'orm'"));
    }

    #[test]
    fn missing_field_is_an_execute_error() {
        let err = render("butler{.Project.Nme}").unwrap_err();
        assert_eq!(err.phase, RenderPhase::Execute);
        assert!(err.message.contains("\"Nme\""));
    }

    #[test]
    fn unterminated_marker_is_a_parse_error() {
        let err = render("package butler{.Project.Name").unwrap_err();
        assert_eq!(err.phase, RenderPhase::Parse);
    }

    #[test]
    fn wrong_argument_type_is_an_execute_error() {
        let err = render("butler{toSnakeCase 42}").unwrap_err();
        assert_eq!(err.phase, RenderPhase::Execute);
    }

    #[test]
    fn sources_without_markers_are_returned_verbatim() {
        let src = "fn main() { println!(\"{}\", x); } {{ .NotOurs }}";
        assert_eq!(render(src).unwrap(), src);
    }

    #[test]
    fn year_and_date_render() {
        let out = render("butler{.Year}").unwrap();
        assert_eq!(out.len(), 4);
        assert!(render("butler{.Date}").unwrap().contains('T'));
    }

    #[test]
    fn extra_functions_are_callable() {
        let table = FunctionTable::standard().with("shout", |_ctx, args| {
            Ok(Value::String(
                args.first()
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_uppercase(),
            ))
        });
        let out = MarkerEngine::new()
            .render(
                "butler{.Vars.author | shout}",
                &Delimiters::default(),
                &table,
                &ctx(),
            )
            .unwrap();
        assert_eq!(out, "ADA");
    }
}
