//! Renders entry names and file bodies through the expression engine.

use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{ExpressionEngine, ExpressionError};
use crate::domain::{Context, Delimiters, FunctionTable, RenderError, RenderPhase};

/// Engine plus the fixed settings of one run: delimiter pair and capability
/// table. Shared by every worker.
pub struct Renderer {
    engine: Arc<dyn ExpressionEngine>,
    delimiters: Delimiters,
    functions: FunctionTable,
}

impl Renderer {
    pub fn new(
        engine: Arc<dyn ExpressionEngine>,
        delimiters: Delimiters,
        functions: FunctionTable,
    ) -> Self {
        Self {
            engine,
            delimiters,
            functions,
        }
    }

    /// Render a single path component.
    ///
    /// The result must still be a single component: empty names, `.`/`..`
    /// and names containing a separator are rejected.
    pub fn render_name(
        &self,
        raw: &str,
        path: &Path,
        context: &Context,
    ) -> Result<String, RenderError> {
        if !self.delimiters.appears_in(raw) {
            return Ok(raw.to_string());
        }

        let rendered = self.evaluate(raw, path, context)?;

        if rendered.is_empty()
            || rendered == "."
            || rendered == ".."
            || rendered.contains('/')
            || rendered.contains('\\')
        {
            return Err(RenderError {
                phase: RenderPhase::Execute,
                path: path.to_path_buf(),
                cause: format!("'{}' rendered to invalid name '{}'", raw, rendered),
            });
        }

        Ok(rendered)
    }

    /// Render a whole file body.
    ///
    /// Bodies without the start delimiter come back untouched, whatever
    /// their encoding. Bodies that contain it must be UTF-8.
    pub fn render_content(
        &self,
        raw: &[u8],
        path: &Path,
        context: &Context,
    ) -> Result<Vec<u8>, RenderError> {
        if !contains_bytes(raw, self.delimiters.start().as_bytes()) {
            return Ok(raw.to_vec());
        }

        let source = std::str::from_utf8(raw).map_err(|e| RenderError {
            phase: RenderPhase::Parse,
            path: path.to_path_buf(),
            cause: format!("content is not valid UTF-8: {}", e),
        })?;

        self.evaluate(source, path, context).map(String::into_bytes)
    }

    fn evaluate(&self, source: &str, path: &Path, context: &Context) -> Result<String, RenderError> {
        self.engine
            .render(source, &self.delimiters, &self.functions, context)
            .map_err(|ExpressionError { phase, message }| RenderError {
                phase,
                path: path.to_path_buf(),
                cause: message,
            })
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockExpressionEngine;

    fn context() -> Context {
        Context::builder("demo").build().unwrap()
    }

    fn renderer(engine: MockExpressionEngine) -> Renderer {
        Renderer::new(
            Arc::new(engine),
            Delimiters::default(),
            FunctionTable::standard(),
        )
    }

    #[test]
    fn names_without_markers_skip_the_engine() {
        let mut engine = MockExpressionEngine::new();
        engine.expect_render().never();

        let r = renderer(engine);
        let out = r
            .render_name("main.go", Path::new("main.go"), &context())
            .unwrap();
        assert_eq!(out, "main.go");
    }

    #[test]
    fn marker_names_go_through_the_engine() {
        let mut engine = MockExpressionEngine::new();
        engine
            .expect_render()
            .times(1)
            .returning(|_, _, _, ctx| Ok(format!("{}.go", ctx.project().name)));

        let r = renderer(engine);
        let out = r
            .render_name(
                "butler{.Project.Name}.go",
                Path::new("src/butler{.Project.Name}.go"),
                &context(),
            )
            .unwrap();
        assert_eq!(out, "demo.go");
    }

    #[test]
    fn rendered_names_must_stay_one_component() {
        for bad in ["", "a/b", "..", "a\\b"] {
            let mut engine = MockExpressionEngine::new();
            let value = bad.to_string();
            engine
                .expect_render()
                .returning(move |_, _, _, _| Ok(value.clone()));

            let err = renderer(engine)
                .render_name("butler{.Vars.x}", Path::new("butler{.Vars.x}"), &context())
                .unwrap_err();
            assert_eq!(err.phase, RenderPhase::Execute, "{bad:?}");
        }
    }

    #[test]
    fn engine_errors_carry_phase_and_path() {
        let mut engine = MockExpressionEngine::new();
        engine
            .expect_render()
            .returning(|_, _, _, _| Err(ExpressionError::parse("unterminated action")));

        let err = renderer(engine)
            .render_content(b"x butler{.Project", Path::new("a/b.txt"), &context())
            .unwrap_err();
        assert_eq!(err.phase, RenderPhase::Parse);
        assert_eq!(err.path, Path::new("a/b.txt"));
        assert_eq!(err.cause, "unterminated action");
    }

    #[test]
    fn binary_looking_content_without_markers_is_untouched() {
        let mut engine = MockExpressionEngine::new();
        engine.expect_render().never();

        let raw = [0xff, 0xfe, 0x00, b'}'];
        let out = renderer(engine)
            .render_content(&raw, Path::new("blob"), &context())
            .unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn invalid_utf8_with_marker_is_a_parse_error() {
        let mut engine = MockExpressionEngine::new();
        engine.expect_render().never();

        let mut raw = b"butler{.Project.Name}".to_vec();
        raw.push(0xff);
        let err = renderer(engine)
            .render_content(&raw, Path::new("blob"), &context())
            .unwrap_err();
        assert_eq!(err.phase, RenderPhase::Parse);
    }
}
