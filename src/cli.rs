use std::path::PathBuf;

use clap::Parser;

/// Ahead-of-time compiler and evaluator for a small Wirth-style module
/// language. Given a single source file, runs it through the lexer,
/// parser, and semantic analyzer, then either interprets it directly or
/// lowers it to a textual intermediate representation.
#[derive(Parser, Debug)]
#[command(name = "modc")]
#[command(author = "The Modc Team <modc@example.com>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ahead-of-time compiler for the Modc language", long_about = None)]
pub struct Cli {
    /// The `.mod` source file to run.
    pub source: PathBuf,

    /// Run the evaluator after analysis. This is the default when neither
    /// `--interpret` nor `--compile` is given.
    #[arg(long)]
    pub interpret: bool,

    /// Emit the intermediate-representation artifact only; do not run the
    /// evaluator.
    #[arg(short = 'c', long)]
    pub compile: bool,

    /// Overrides the path the IR artifact is written to (only meaningful
    /// with `--compile`; the default is the source stem with a `.ll`
    /// extension).
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Launch the interactive editor. Not implemented by this build: an
    /// external collaborator this repository does not ship.
    #[arg(short = 'g', long)]
    pub gui: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compile_with_output_override() {
        let cli = Cli::parse_from(["modc", "-c", "-o", "out.ll", "prog.mod"]);
        assert!(cli.compile);
        assert_eq!(cli.output, Some(PathBuf::from("out.ll")));
        assert_eq!(cli.source, PathBuf::from("prog.mod"));
    }

    #[test]
    fn defaults_to_neither_flag_set() {
        let cli = Cli::parse_from(["modc", "prog.mod"]);
        assert!(!cli.interpret);
        assert!(!cli.compile);
        assert!(!cli.gui);
    }

    #[test]
    fn gui_flag_parses() {
        let cli = Cli::parse_from(["modc", "-g", "prog.mod"]);
        assert!(cli.gui);
    }
}
