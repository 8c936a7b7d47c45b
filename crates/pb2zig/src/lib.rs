// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! pb2zig
//!
//! Single entry point for the kernel translation pipeline: tokenize and
//! parse a kernel source, then translate it to Zig. Every failure from any
//! phase comes back as a [`Diagnostic`] with a source location.

use pbk_ast::{Kernel, Macro, SourceFile, Span};
use pbk_translate::{TranslateOptions, Translator};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

pub use pbk_translate::TranslateError;

/// Pipeline phase a diagnostic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Lex,
    Parse,
    Translate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lex => "lex",
            Phase::Parse => "parse",
            Phase::Translate => "translate",
        };
        f.write_str(name)
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message from any phase of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    /// Byte range in the kernel source.
    pub span: Span,
}

impl Diagnostic {
    pub fn error(phase: Phase, message: impl Into<String>, span: Span) -> Self {
        Self {
            phase,
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    pub fn warning(phase: Phase, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(phase, message, span)
        }
    }
}

/// Result of running the pipeline over one kernel source.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub source: SourceFile,
    /// Generated Zig, present when no error was reported.
    pub zig: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// One `name:line:col: phase: message` line per diagnostic.
    pub fn format_diagnostics(&self) -> String {
        format_diagnostics(&self.source, &self.diagnostics)
    }
}

/// Parsed kernel and macros, for inspection without translating.
#[derive(Debug, Clone, Serialize)]
pub struct Parsed {
    pub kernel: Option<Kernel>,
    pub macros: Vec<Macro>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Failures of the file-level helpers used by the CLI.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize the syntax tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tokenize and parse, turning lexer and parser errors into diagnostics.
pub fn parse(source: &str) -> Parsed {
    let output = pbk_parser::parse(source);
    let mut diagnostics = Vec::new();
    for error in &output.lex_errors {
        diagnostics.push(Diagnostic::error(
            Phase::Lex,
            format!("unrecognized input `{}`", error.text),
            Span::from_range(&error.span),
        ));
    }
    for error in &output.parse_errors {
        diagnostics.push(Diagnostic::error(Phase::Parse, error.message.clone(), error.span));
    }
    Parsed {
        macros: output.macro_definitions(),
        kernel: output.kernel,
        diagnostics,
    }
}

/// Run the whole pipeline over `source`. `name` labels the source in
/// diagnostics (usually the input path).
#[instrument(skip(source, options))]
pub fn compile(name: &str, source: &str, options: &TranslateOptions) -> Compilation {
    let file = SourceFile::new(name, source);
    let parsed = parse(source);
    let mut diagnostics = parsed.diagnostics;

    let kernel = match parsed.kernel {
        Some(kernel) if diagnostics.is_empty() => kernel,
        _ => {
            debug!(errors = diagnostics.len(), "stopping after syntax errors");
            return Compilation {
                source: file,
                zig: None,
                diagnostics,
            };
        }
    };

    for function in kernel.functions().filter(|f| !f.is_supported()) {
        diagnostics.push(Diagnostic::warning(
            Phase::Translate,
            format!(
                "function `{}` uses region or imageRef types and was skipped",
                function.name
            ),
            function.span,
        ));
    }

    let translator = Translator::new(options.clone());
    let zig = match translator.translate(&kernel, &parsed.macros) {
        Ok(zig) => {
            info!(kernel = %kernel.name, bytes = zig.len(), "kernel translated");
            Some(zig)
        }
        Err(error) => {
            diagnostics.push(Diagnostic::error(Phase::Translate, error.to_string(), error.span()));
            None
        }
    };

    Compilation {
        source: file,
        zig,
        diagnostics,
    }
}

/// Read and compile a kernel file.
pub fn compile_file(path: &Path, options: &TranslateOptions) -> Result<Compilation, CompileError> {
    let source = std::fs::read_to_string(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(compile(&path.display().to_string(), &source, options))
}

/// Render diagnostics as `name:line:col: phase: message`, warnings marked.
pub fn format_diagnostics(source: &SourceFile, diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        let (line, col) = source.line_col(diagnostic.span.start);
        let level = match diagnostic.severity {
            Severity::Error => "",
            Severity::Warning => "warning: ",
        };
        out.push_str(&format!(
            "{}:{line}:{col}: {}: {level}{}\n",
            source.name, diagnostic.phase, diagnostic.message
        ));
    }
    out
}

/// Initialize logging for the CLI.
///
/// `RUST_LOG` overrides the default filter of `info` with `debug` for this
/// crate.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pb2zig=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
