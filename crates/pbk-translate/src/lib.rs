// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Pixel Bender kernel to Zig translator
//!
//! Takes a parsed [`pbk_ast::Kernel`] and its `#define` macros and produces
//! one Zig source file: a `kernel` namespace holding the parameter and image
//! tables, a generic `Instance` type with the translated kernel functions,
//! and the runtime helpers those functions call.
//!
//! ## Architecture
//!
//! - `context`: per-translation state, visibility rules, local naming
//! - `scope`: copy-on-push lexical scopes
//! - `typed`: typed expression handles, conversion and promotion
//! - `catalog`: built-in signatures and overload resolution
//! - `expr`: expressions (operators, swizzles, constructors, calls, assignment)
//! - `stmt`, `function`: statements and kernel functions
//! - `macros`: `#define` classification and expansion
//! - `usage`, `library`: runtime helper selection
//! - `kernel`: the generated file layout
//! - `emitter`: brace-depth indentation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pbk_translate::{TranslateOptions, Translator};
//!
//! let output = pbk_parser::parse(source);
//! let kernel = output.kernel.unwrap();
//! let zig = Translator::default().translate(&kernel, &output.macro_definitions())?;
//! ```

mod catalog;
mod context;
pub mod emitter;
mod error;
mod expr;
mod function;
mod kernel;
pub mod library;
mod macros;
mod options;
mod scope;
mod stmt;
mod typed;
mod usage;
pub mod zig;

pub use emitter::Emitter;
pub use error::{Result, TranslateError};
pub use library::{DRIVER, FUNCTIONS, Library};
pub use options::TranslateOptions;
pub use usage::required_helpers;

use context::Context;
use pbk_ast::{Kernel, Macro};
use tracing::{debug, instrument};

/// Reusable kernel translator.
///
/// Holds only configuration and the parsed runtime library; every call to
/// [`Translator::translate`] works on fresh state.
#[derive(Debug, Clone)]
pub struct Translator {
    options: TranslateOptions,
    library: Library,
}

impl Translator {
    pub fn new(options: TranslateOptions) -> Self {
        Self {
            options,
            library: Library::builtin(),
        }
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    /// Translate `kernel` into Zig source. Stops at the first error.
    #[instrument(skip_all, fields(kernel = %kernel.name))]
    pub fn translate(&self, kernel: &Kernel, macros: &[Macro]) -> Result<String> {
        let required = required_helpers(kernel, macros, &self.library);
        let helpers = self.library.select(&required);
        debug!(
            selected = ?helpers.iter().map(|h| h.name.as_str()).collect::<Vec<_>>(),
            "runtime helpers"
        );

        let mut context = Context::new(&self.options, &self.library, kernel, macros);
        context.kernel_source(&helpers)
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(TranslateOptions::default())
    }
}
