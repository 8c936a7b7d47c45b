//! Translator configuration.

/// Settings that stay fixed across translations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Named in the heading comment of the generated file.
    pub tool_name: String,
    /// Append the per-pixel driver template after the kernel.
    pub include_driver: bool,
    /// Spaces per brace level.
    pub indent_width: usize,
    /// Nesting limit for inline macro expansion.
    pub max_macro_depth: usize,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            tool_name: "pb2zig".to_string(),
            include_driver: true,
            indent_width: 4,
            max_macro_depth: 32,
        }
    }
}
