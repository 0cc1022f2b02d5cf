use modc_ast::Program;
use modc_errors::emitter::Handler;
use modc_errors::Diagnostic;
use modc_evaluator::Evaluator;
use std::path::{Path, PathBuf};

/// Which backend a source file is run through after analysis succeeds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Execute the module body directly with the tree-walking evaluator.
    Interpret,
    /// Lower to the textual IR and write it out; never execute anything.
    Compile,
}

/// What a successful run produced.
#[derive(Debug)]
pub enum Outcome {
    Interpreted { output: String },
    Compiled { ir_path: PathBuf },
}

/// Wires lex → parse → analyze → {evaluate, emit IR}. A fresh `Driver` is
/// built per invocation and holds no state of its own between calls, so
/// compiling the same source twice in one process never sees leftover
/// state from the first run — every pipeline stage it touches
/// (`modc_parser::ParserContext`, `modc_passes`'s scope/procedure tables,
/// `Evaluator`, `IrEmitter`) is likewise constructed fresh inside `run`.
#[derive(Default)]
pub struct Driver;

impl Driver {
    pub fn new() -> Self {
        Self
    }

    /// Runs `source` (read from `source_path`, used only to name the module
    /// and default the `.ll` output path) through the full pipeline.
    /// `ir_output` overrides the emitted IR's path in `Mode::Compile`
    /// (`-o PATH` on the CLI); it is ignored in `Mode::Interpret`.
    pub fn run(
        &self,
        source_path: &Path,
        source: &str,
        mode: Mode,
        ir_output: Option<&Path>,
    ) -> Result<Outcome, Vec<Diagnostic>> {
        tracing::info!(path = %source_path.display(), ?mode, "starting compilation");

        let program = modc_parser::parse(source).map_err(|d| vec![d])?;
        tracing::debug!(declarations = program.declarations.len(), statements = program.statements.len(), "parsed");

        self.analyze(&program)?;
        tracing::debug!("semantic analysis clean");

        match mode {
            Mode::Interpret => self.interpret(&program),
            Mode::Compile => self.compile(&program, source_path, ir_output),
        }
    }

    fn analyze(&self, program: &Program) -> Result<(), Vec<Diagnostic>> {
        let handler = Handler::new();
        modc_passes::analyze(program, &handler);
        if handler.had_errors() {
            return Err(handler.take_diagnostics());
        }
        Ok(())
    }

    fn interpret(&self, program: &Program) -> Result<Outcome, Vec<Diagnostic>> {
        let mut evaluator = Evaluator::new();
        let output = evaluator.run(program).map_err(|d| vec![d])?;
        Ok(Outcome::Interpreted { output })
    }

    fn compile(&self, program: &Program, source_path: &Path, ir_output: Option<&Path>) -> Result<Outcome, Vec<Diagnostic>> {
        let ir = modc_codegen::emit_program(program);
        let ir_path = ir_output.map(Path::to_path_buf).unwrap_or_else(|| default_ir_path(source_path));
        std::fs::write(&ir_path, ir).map_err(|e| vec![Diagnostic::from(e)])?;
        tracing::debug!(path = %ir_path.display(), "wrote IR artifact");
        Ok(Outcome::Compiled { ir_path })
    }
}

/// The source stem with its extension replaced by `.ll`, per the emitted-IR
/// naming rule.
fn default_ir_path(source_path: &Path) -> PathBuf {
    source_path.with_extension("ll")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn source_path() -> &'static Path {
        Path::new("hello.mod")
    }

    #[test]
    fn interprets_hello_world() {
        let src = r#"MODULE H; VAR m: STRING; BEGIN m := "Hello, World!"; Write(m); WriteLn() END H."#;
        let driver = Driver::new();
        match driver.run(source_path(), src, Mode::Interpret, None).unwrap() {
            Outcome::Interpreted { output } => assert_eq!(output, "Hello, World!\n"),
            other => panic!("expected Interpreted, got {other:?}"),
        }
    }

    #[test]
    fn compile_mode_never_touches_the_evaluator() {
        let src = r#"MODULE M; VAR x: INTEGER; BEGIN x := 1 END M."#;
        let driver = Driver::new();
        let dir = tempfile::tempdir().unwrap();
        let ir_path = dir.path().join("m.ll");
        match driver.run(Path::new("m.mod"), src, Mode::Compile, Some(&ir_path)).unwrap() {
            Outcome::Compiled { ir_path: written } => {
                assert_eq!(written, ir_path);
                let text = std::fs::read_to_string(&written).unwrap();
                assert!(text.contains("define i32 @main()"));
            }
            other => panic!("expected Compiled, got {other:?}"),
        }
    }

    #[test]
    fn semantic_errors_accumulate_and_halt_before_evaluation() {
        let src = r#"
            MODULE Bad;
            VAR x: INTEGER;
            VAR x: REAL;
            BEGIN
                x := "oops";
                Undefined()
            END Bad.
        "#;
        let driver = Driver::new();
        let errors = driver.run(source_path(), src, Mode::Interpret, None).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|d| d.render().starts_with("Semantic error:")));
    }

    #[test]
    fn running_the_same_source_twice_produces_identical_output() {
        let src = r#"MODULE Sum; VAR s: INTEGER; BEGIN s := 0; FOR i := 1 TO 10 DO s := s + i END; Write(s) END Sum."#;
        let driver = Driver::new();
        let first = match driver.run(source_path(), src, Mode::Interpret, None).unwrap() {
            Outcome::Interpreted { output } => output,
            other => panic!("expected Interpreted, got {other:?}"),
        };
        let second = match driver.run(source_path(), src, Mode::Interpret, None).unwrap() {
            Outcome::Interpreted { output } => output,
            other => panic!("expected Interpreted, got {other:?}"),
        };
        assert_eq!(first, second);
        assert_eq!(first, "55");
    }
}
