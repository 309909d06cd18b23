use std::path::PathBuf;

use clap::Parser;

use cflatc::backend::DefaultGenerator;
use cflatc::compiler::{CompileOutcome, Compiler};
use cflatc::parser::PestAstParser;
use cflatc::semantic::{DefaultNameAnalyser, DefaultTypeChecker};

type ParserImpl = PestAstParser;
type NameAnalyserImpl = DefaultNameAnalyser;
type TypeCheckerImpl = DefaultTypeChecker;
type GeneratorImpl = DefaultGenerator;

/// Command line interface struct.
/// Describes possible arguments using the clap library.
#[derive(Parser)]
struct CompilerCliOptions {
    /// Path of file to compile.
    #[clap(parse(from_os_str))]
    path: PathBuf,

    /// Path to output file, default is <path_filename>.s
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Write compilation result to stdout instead of output
    #[clap(long, action)]
    stdout: bool,

    /// Enable debug-level logging (equivalent to RUST_LOG=debug)
    #[clap(long, action)]
    verbose: bool,
}

impl CompilerCliOptions {
    /// Derives default values for empty arguments that cannot be set to
    /// constants. Output is derived from the input file path.
    fn derive_defaults(mut self) -> Self {
        if self.output.is_none() {
            self.output = Some(self.path.with_extension("s"));
        }
        self
    }
}

fn report_diagnostics(outcome: &CompileOutcome) {
    for diagnostic in &outcome.diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn main() {
    let cli_args = CompilerCliOptions::parse().derive_defaults();

    let env_filter = if cli_args.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let compiler: Compiler<ParserImpl, NameAnalyserImpl, TypeCheckerImpl, GeneratorImpl> = Compiler::default();
    let source_path = cli_args.path.clone();

    let result = if cli_args.stdout {
        compiler.compile(&source_path).map(|outcome| {
            report_diagnostics(&outcome);
            if let Some(assembly) = &outcome.assembly {
                print!("{}", assembly);
            }
            outcome
        })
    } else {
        let dest_path = cli_args.output.clone().expect("output path is always derived");
        compiler.compile_and_save(&source_path, &dest_path).map(|outcome| {
            report_diagnostics(&outcome);
            outcome
        })
    };

    match result {
        Ok(outcome) if outcome.succeeded() => {
            if !cli_args.stdout {
                println!("Compile success!");
            }
            std::process::exit(exitcode::OK);
        }
        Ok(_) => {
            // name analysis or type checking reported diagnostics; already printed above.
            std::process::exit(exitcode::DATAERR);
        }
        Err(why) => {
            println!("Compile Error: {:?}", why);
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}
