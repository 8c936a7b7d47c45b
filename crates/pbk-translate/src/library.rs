//! Runtime helper library.
//!
//! The helpers live in a Zig asset as top-level `pub fn` blocks. A block
//! starts at a line beginning with `pub fn NAME(` and ends at the next line
//! that is exactly `}`. Only the blocks a kernel needs are copied into the
//! output, together with every helper they call.

use indexmap::IndexSet;
use tracing::debug;

/// Source of the helper library.
pub const FUNCTIONS: &str = include_str!("../assets/functions.zig");

/// Per-pixel driver appended after the kernel.
pub const DRIVER: &str = include_str!("../assets/driver.zig");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Helper {
    pub name: String,
    /// The block with its leading `pub ` removed.
    pub code: String,
    /// Other helpers this one calls, in first-call order.
    pub calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Library {
    helpers: Vec<Helper>,
}

impl Library {
    pub fn builtin() -> Self {
        Self::parse(FUNCTIONS)
    }

    pub fn parse(source: &str) -> Self {
        let mut helpers = Vec::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in source.lines() {
            if let Some((name, mut body)) = current.take() {
                body.push(line);
                if line == "}" {
                    helpers.push(Helper {
                        code: body.join("\n"),
                        name,
                        calls: Vec::new(),
                    });
                } else {
                    current = Some((name, body));
                }
                continue;
            }
            if let Some(rest) = line.strip_prefix("pub fn ")
                && let Some(name) = rest.split('(').next()
                && !name.is_empty()
            {
                let first = line.strip_prefix("pub ").unwrap_or(line);
                current = Some((name.to_string(), vec![first]));
            }
        }
        if let Some((name, _)) = current {
            debug!(helper = %name, "unterminated helper block ignored");
        }

        let names: IndexSet<String> = helpers.iter().map(|h| h.name.clone()).collect();
        for helper in &mut helpers {
            helper.calls = called_names(&helper.code)
                .into_iter()
                .filter(|call| *call != helper.name && names.contains(call))
                .collect();
        }
        Self { helpers }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.iter().any(|h| h.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.iter().map(|h| h.name.as_str())
    }

    fn get(&self, name: &str) -> Option<&Helper> {
        self.helpers.iter().find(|h| h.name == name)
    }

    /// Helpers named in `wanted` plus everything they call, in library
    /// order. Unknown names are ignored.
    pub fn select(&self, wanted: &IndexSet<String>) -> Vec<&Helper> {
        let mut needed: IndexSet<&str> = IndexSet::new();
        let mut pending: Vec<&str> = wanted.iter().map(String::as_str).collect();
        while let Some(name) = pending.pop() {
            let Some(helper) = self.get(name) else {
                continue;
            };
            if needed.insert(helper.name.as_str()) {
                pending.extend(helper.calls.iter().map(String::as_str));
            }
        }
        self.helpers
            .iter()
            .filter(|h| needed.contains(h.name.as_str()))
            .collect()
    }
}

/// Identifiers directly followed by `(` that are not builtins (`@sin(`)
/// or field accesses (`std.math.asin(`).
fn called_names(code: &str) -> IndexSet<String> {
    let bytes = code.as_bytes();
    let mut calls = IndexSet::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let qualified = start > 0 && matches!(bytes[start - 1], b'@' | b'.');
            if !qualified && bytes.get(i) == Some(&b'(') {
                calls.insert(code[start..i].to_string());
            }
        } else {
            i += 1;
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
// header
const std = @import(\"std\");

pub fn twice(v: anytype) @TypeOf(v) {
    return v + v;
}

pub fn quad(v: anytype) @TypeOf(v) {
    return twice(twice(v));
}

pub fn root(v: anytype) @TypeOf(v) {
    return @sqrt(std.math.fabs(v));
}
";

    fn wanted(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_blocks_are_split_and_unexported() {
        let library = Library::parse(SAMPLE);
        assert_eq!(library.names().collect::<Vec<_>>(), ["twice", "quad", "root"]);
        let quad = library.get("quad").unwrap();
        assert!(quad.code.starts_with("fn quad(v: anytype)"));
        assert!(quad.code.ends_with("\n}"));
        assert_eq!(quad.calls, ["twice"]);
    }

    #[test]
    fn test_qualified_calls_are_not_dependencies() {
        let library = Library::parse(SAMPLE);
        assert!(library.get("root").unwrap().calls.is_empty());
    }

    #[test]
    fn test_selection_closes_over_calls_in_library_order() {
        let library = Library::parse(SAMPLE);
        let picked: Vec<&str> = library
            .select(&wanted(&["quad", "missing"]))
            .iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(picked, ["twice", "quad"]);
    }

    #[test]
    fn test_builtin_library_covers_catalog() {
        let library = Library::builtin();
        for name in ["sin", "smoothStep", "matrixOp", "atan2", "lessThan", "not"] {
            assert!(library.contains(name), "missing helper {name}");
        }
        let smooth = library.select(&wanted(&["smoothStep"]));
        let names: Vec<&str> = smooth.iter().map(|h| h.name.as_str()).collect();
        assert!(names.contains(&"clamp"));
        assert!(names.contains(&"broadcast"));
        assert!(!names.contains(&"sin"));
    }

    #[test]
    fn test_driver_defines_image_and_apply() {
        assert!(DRIVER.contains("pub fn Image("));
        assert!(DRIVER.contains("pub fn apply("));
    }
}
