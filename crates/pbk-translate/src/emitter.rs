//! Line-oriented output with brace-depth indentation.
//!
//! Callers hand over text one statement (or one multi-line snippet) at a
//! time. Every line is trimmed and re-indented from a running brace depth;
//! a line starting with `}` dedents before it is written. Braces inside
//! string literals, character literals and `//` comments do not count.

/// Accumulates indented output lines.
#[derive(Debug, Clone)]
pub struct Emitter {
    lines: Vec<String>,
    depth: usize,
    indent_width: usize,
}

impl Emitter {
    pub fn new(indent_width: usize) -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            indent_width,
        }
    }

    /// Fresh emitter with the same settings, for capturing output.
    pub fn detached(&self) -> Self {
        Self::new(self.indent_width)
    }

    /// Add one or more lines of text.
    pub fn line(&mut self, text: &str) {
        for raw in text.split('\n') {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                self.lines.push(String::new());
                continue;
            }

            let braces = count_braces(trimmed);
            let indent = self.depth.saturating_sub(braces.leading_closes);
            self.lines
                .push(format!("{}{trimmed}", " ".repeat(indent * self.indent_width)));
            self.depth = (self.depth + braces.opens).saturating_sub(braces.closes);
        }
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Re-emit captured lines at the current depth.
    pub fn append(&mut self, lines: &[String]) {
        for line in lines {
            self.line(line);
        }
    }

    /// Add text exactly as given, without touching the depth.
    pub fn verbatim(&mut self, text: &str) {
        self.lines.extend(text.lines().map(str::to_string));
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Joined output, ending with a single newline.
    pub fn finish(self) -> String {
        let mut output = self.lines.join("\n");
        while output.ends_with('\n') {
            output.pop();
        }
        output.push('\n');
        output
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Braces {
    leading_closes: usize,
    opens: usize,
    closes: usize,
}

fn count_braces(line: &str) -> Braces {
    let mut braces = Braces::default();
    let mut leading = true;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '}' => {
                braces.closes += 1;
                if leading {
                    braces.leading_closes += 1;
                }
                continue;
            }
            '{' => braces.opens += 1,
            '"' | '\'' => skip_literal(&mut chars, c),
            '/' if chars.peek() == Some(&'/') => break,
            c if c.is_whitespace() => continue,
            _ => {}
        }
        leading = false;
    }

    braces
}

fn skip_literal(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) {
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            c if c == quote => return,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(text: &str) -> String {
        let mut emitter = Emitter::new(4);
        emitter.line(text);
        emitter.finish()
    }

    #[test]
    fn test_basic_indentation() {
        let output = emit("fn f() void {\nif (x) {\ny();\n}\n}");
        assert_eq!(output, "fn f() void {\n    if (x) {\n        y();\n    }\n}\n");
    }

    #[test]
    fn test_else_line_dedents_then_opens() {
        let output = emit("if (a) {\nx();\n} else {\ny();\n}");
        assert_eq!(output, "if (a) {\n    x();\n} else {\n    y();\n}\n");
    }

    #[test]
    fn test_input_indentation_is_replaced() {
        let output = emit("        const x = 1;\n  {\n      y();\n  }");
        assert_eq!(output, "const x = 1;\n{\n    y();\n}\n");
    }

    #[test]
    fn test_braces_in_strings_and_comments_ignored() {
        let output = emit("const s = \"{\";\nconst c = '{'; // {\nz();");
        assert_eq!(output, "const s = \"{\";\nconst c = '{'; // {\nz();\n");
    }

    #[test]
    fn test_balanced_line_keeps_depth() {
        let output = emit("x = .{ .a = 1 };\ny();");
        assert_eq!(output, "x = .{ .a = 1 };\ny();\n");
    }

    #[test]
    fn test_indent_width() {
        let mut emitter = Emitter::new(2);
        emitter.line("{\na;\n}");
        assert_eq!(emitter.finish(), "{\n  a;\n}\n");
    }

    #[test]
    fn test_append_reindents_captured_lines() {
        let mut inner = Emitter::new(4);
        inner.line("{\na;\n}");
        let captured = inner.into_lines();

        let mut outer = Emitter::new(4);
        outer.line("while (true) {");
        outer.append(&captured);
        outer.line("}");
        assert_eq!(
            outer.finish(),
            "while (true) {\n    {\n        a;\n    }\n}\n"
        );
    }
}
