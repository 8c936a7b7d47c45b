//! Translate a Pixel Bender kernel into a Zig source file.
//!
//! Usage: `pb2zig <input> [-o FILE] [--no-driver] [--indent N] [--dump-ast]`

use clap::Parser;
use pb2zig::{CompileError, compile_file, init_logging};
use pbk_translate::TranslateOptions;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "pb2zig")]
#[command(about = "Translate a Pixel Bender kernel (.pbk) to Zig")]
struct Args {
    /// Kernel source file
    input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Leave out the per-pixel driver
    #[arg(long)]
    no_driver: bool,

    /// Spaces per indentation level
    #[arg(long, default_value = "4")]
    indent: usize,

    /// Print the parsed syntax tree as JSON instead of translating
    #[arg(long)]
    dump_ast: bool,
}

fn main() {
    init_logging();
    let args = Args::parse();

    let result = if args.dump_ast {
        dump_ast(&args.input, args.output.as_deref())
    } else {
        translate(&args)
    };
    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}

fn translate(args: &Args) -> Result<(), CompileError> {
    let options = TranslateOptions {
        include_driver: !args.no_driver,
        indent_width: args.indent,
        ..TranslateOptions::default()
    };

    info!("Translating {}", args.input.display());
    let compilation = compile_file(&args.input, &options)?;
    let report = compilation.format_diagnostics();
    let Some(zig) = compilation.zig.as_deref().filter(|_| !compilation.has_errors()) else {
        error!("{}", report.trim_end());
        process::exit(1);
    };
    if !report.is_empty() {
        warn!("{}", report.trim_end());
    }

    write_output(args.output.as_deref(), zig)
}

fn dump_ast(input: &Path, output: Option<&Path>) -> Result<(), CompileError> {
    let source = fs::read_to_string(input).map_err(|source| CompileError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let parsed = pb2zig::parse(&source);
    if !parsed.diagnostics.is_empty() {
        let file = pbk_ast::SourceFile::new(input.display().to_string(), source);
        warn!("{}", pb2zig::format_diagnostics(&file, &parsed.diagnostics).trim_end());
    }
    let mut json = serde_json::to_string_pretty(&parsed)?;
    json.push('\n');
    write_output(output, &json)
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), CompileError> {
    match path {
        Some(path) => {
            fs::write(path, text).map_err(|source| CompileError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Wrote {}", path.display());
            Ok(())
        }
        None => std::io::stdout()
            .write_all(text.as_bytes())
            .map_err(|source| CompileError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            }),
    }
}
