//! The `modc` binary's thin application layer: turns parsed CLI flags into
//! a `Driver` invocation and a typed outcome the binary prints.

pub mod cli;

use cli::Cli;
use modc_compiler::{Driver, Mode, Outcome};
use modc_errors::Diagnostic;

/// Everything that can stop `run` short of a successful `Outcome`. Kept
/// distinct from `Vec<Diagnostic>` because `--gui` never reaches the
/// pipeline at all — there's no diagnostic to report, just an explicit
/// "not available" notice.
#[derive(Debug)]
pub enum Failure {
    Diagnostics(Vec<Diagnostic>),
    GuiUnavailable,
}

impl From<Diagnostic> for Failure {
    fn from(d: Diagnostic) -> Self {
        Failure::Diagnostics(vec![d])
    }
}

pub fn run(cli: &Cli) -> Result<Outcome, Failure> {
    if cli.gui {
        return Err(Failure::GuiUnavailable);
    }
    let source = std::fs::read_to_string(&cli.source).map_err(Diagnostic::from)?;
    let mode = if cli.compile { Mode::Compile } else { Mode::Interpret };
    Driver::new().run(&cli.source, &source, mode, cli.output.as_deref()).map_err(Failure::Diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::path::PathBuf;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::with_suffix(".mod").unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn interprets_by_default() {
        let file = write_fixture(r#"MODULE H; VAR m: STRING; BEGIN m := "Hi"; Write(m) END H."#);
        let cli = Cli { source: file.path().to_path_buf(), interpret: false, compile: false, output: None, gui: false };
        match run(&cli).unwrap() {
            Outcome::Interpreted { output } => assert_eq!(output, "Hi"),
            other => panic!("expected Interpreted, got {other:?}"),
        }
    }

    #[test]
    fn gui_flag_short_circuits_before_touching_the_filesystem() {
        let cli = Cli {
            source: PathBuf::from("/nonexistent/does-not-matter.mod"),
            interpret: false,
            compile: false,
            output: None,
            gui: true,
        };
        assert!(matches!(run(&cli), Err(Failure::GuiUnavailable)));
    }

    #[test]
    fn missing_file_is_an_io_diagnostic() {
        let cli = Cli {
            source: PathBuf::from("/nonexistent/does-not-exist.mod"),
            interpret: false,
            compile: false,
            output: None,
            gui: false,
        };
        match run(&cli).unwrap_err() {
            Failure::Diagnostics(ds) => {
                assert_eq!(ds.len(), 1);
                assert!(ds[0].render().starts_with("Compilation error:"));
            }
            other => panic!("expected Diagnostics, got {other:?}"),
        }
    }
}
