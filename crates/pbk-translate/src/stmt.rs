//! Statement translation.
//!
//! Statements write Zig lines straight to the emitter. Loop conditions that
//! need statements of their own (temporaries, assignments) move into the
//! loop body as `if (!(cond)) break;`.

use crate::context::{Context, Loop, decl_marker, discard_marker};
use crate::error::{Result, TranslateError};
use crate::scope::LocalKind;
use crate::zig;
use pbk_ast::{Declaration, Expr, ExprKind, Span, Stmt, StmtKind, Type};

impl Context<'_> {
    pub(crate) fn statements(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.statement(stmt)?;
        }
        Ok(())
    }

    pub(crate) fn statement(&mut self, stmt: &Stmt) -> Result<()> {
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                self.line("{");
                self.scoped(|ctx| ctx.statements(stmts))?;
                self.line("}");
            }
            StmtKind::Variable(decl) => self.declaration(decl, LocalKind::Variable)?,
            StmtKind::Constant(decl) => self.declaration(decl, LocalKind::Constant)?,
            StmtKind::Expression(expr) => self.expression_statement(expr)?,

            // === Branches ===
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.condition(condition)?;
                self.line(&format!("if ({}) {{", condition.code));
                self.body(then_branch)?;
                self.else_branch(else_branch.as_deref())?;
            }

            // === Loops ===
            StmtKind::While { condition, body } => {
                let (pre, condition) = self.capture(|ctx| ctx.condition(condition))?;
                self.looped(None, |ctx| {
                    if pre.is_empty() {
                        ctx.line(&format!("while ({}) {{", condition.code));
                    } else {
                        ctx.line("while (true) {");
                        ctx.emitter.append(&pre);
                        ctx.line(&format!("if (!({})) break;", condition.code));
                    }
                    ctx.body(body)
                })?;
                self.line("}");
            }
            StmtKind::DoWhile { body, condition } => self.do_while(body, condition)?,
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.line("{");
                self.scoped(|ctx| {
                    ctx.for_loop(init.as_deref(), condition.as_ref(), update.as_ref(), body)
                })?;
                self.line("}");
            }

            // === Jumps ===
            StmtKind::Break => {
                if self.loops.is_empty() {
                    return Err(TranslateError::MisplacedJump {
                        keyword: "break",
                        span,
                    });
                }
                self.line("break;");
            }
            StmtKind::Continue => {
                let Some(current) = self.loops.last_mut() else {
                    return Err(TranslateError::MisplacedJump {
                        keyword: "continue",
                        span,
                    });
                };
                let line = match &current.continue_label {
                    Some(label) => {
                        current.label_used = true;
                        format!("break :{label};")
                    }
                    None => "continue;".to_string(),
                };
                self.line(&line);
            }
            StmtKind::Return(value) => self.return_statement(value.as_ref(), span)?,
            StmtKind::Empty => {}
        }
        Ok(())
    }

    /// Branch or loop body in its own scope. A block body supplies the
    /// braces already written by the caller.
    fn body(&mut self, stmt: &Stmt) -> Result<()> {
        self.scoped(|ctx| match &stmt.kind {
            StmtKind::Block(stmts) => ctx.statements(stmts),
            _ => ctx.statement(stmt),
        })
    }

    /// Close an `if` opened by the caller, chaining `else if` where the
    /// condition needs no statements of its own.
    fn else_branch(&mut self, else_branch: Option<&Stmt>) -> Result<()> {
        let Some(stmt) = else_branch else {
            self.line("}");
            return Ok(());
        };
        let StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } = &stmt.kind
        else {
            self.line("} else {");
            self.body(stmt)?;
            self.line("}");
            return Ok(());
        };

        let (pre, condition) = self.capture(|ctx| ctx.condition(condition))?;
        if pre.is_empty() {
            self.line(&format!("}} else if ({}) {{", condition.code));
            self.body(then_branch)?;
            return self.else_branch(else_branch.as_deref());
        }
        self.line("} else {");
        self.emitter.append(&pre);
        self.line(&format!("if ({}) {{", condition.code));
        self.body(then_branch)?;
        self.else_branch(else_branch.as_deref())?;
        self.line("}");
        Ok(())
    }

    fn looped<T>(
        &mut self,
        continue_label: Option<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<(T, Loop)> {
        self.loops.push(Loop {
            continue_label,
            label_used: false,
        });
        let result = f(self);
        let state = self.loops.pop();
        let value = result?;
        Ok((
            value,
            state.unwrap_or(Loop {
                continue_label: None,
                label_used: false,
            }),
        ))
    }

    /// `while (true) { dw_N: { body } if (!(cond)) break; }`; `continue`
    /// leaves the labeled block so the condition still runs.
    fn do_while(&mut self, body: &Stmt, condition: &Expr) -> Result<()> {
        let label = format!("dw_{}", self.next_id());
        let (lines, state) = self.looped(Some(label.clone()), |ctx| {
            ctx.capture(|ctx| ctx.body(body)).map(|(lines, ())| lines)
        })?;
        let (pre, condition) = self.capture(|ctx| ctx.condition(condition))?;

        self.line("while (true) {");
        if state.label_used {
            self.line(&format!("{label}: {{"));
        } else {
            self.line("{");
        }
        self.emitter.append(&lines);
        self.line("}");
        self.emitter.append(&pre);
        self.line(&format!("if (!({})) break;", condition.code));
        self.line("}");
        Ok(())
    }

    fn for_loop(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
    ) -> Result<()> {
        if let Some(init) = init {
            self.statement(init)?;
        }
        let (pre, condition) = match condition {
            Some(condition) => {
                let (pre, value) = self.capture(|ctx| ctx.condition(condition))?;
                (pre, Some(value))
            }
            None => (Vec::new(), None),
        };
        let update = match update {
            Some(update) => {
                let (lines, ()) = self.capture(|ctx| ctx.expression_statement(update))?;
                continue_expression(lines)
            }
            None => None,
        };
        let continue_part = update.map(|u| format!(" : ({u})")).unwrap_or_default();

        self.looped(None, |ctx| {
            match &condition {
                Some(condition) if pre.is_empty() => {
                    ctx.line(&format!("while ({}){continue_part} {{", condition.code));
                }
                Some(condition) => {
                    ctx.line(&format!("while (true){continue_part} {{"));
                    ctx.emitter.append(&pre);
                    ctx.line(&format!("if (!({})) break;", condition.code));
                }
                None => ctx.line(&format!("while (true){continue_part} {{")),
            }
            ctx.body(body)
        })?;
        self.line("}");
        Ok(())
    }

    fn declaration(&mut self, decl: &Declaration, kind: LocalKind) -> Result<()> {
        let ty_name = zig::value_type_name(decl.ty, decl.span)?;
        for declarator in &decl.declarators {
            let value = match &declarator.init {
                Some(init) => self.expr(init)?.coerce(decl.ty, init.span)?.code,
                None => zig::zero_value(decl.ty, declarator.span)?,
            };
            let slot = self.declare_local(&declarator.name, decl.ty, kind);
            let ident = zig::ident(self.local_name(slot)).into_owned();
            let keyword = match kind {
                LocalKind::Constant => "const".to_string(),
                _ => decl_marker(slot),
            };
            self.line(&format!("{keyword} {ident}: {ty_name} = {value};"));
            self.line(&discard_marker(slot));
        }
        Ok(())
    }

    pub(crate) fn expression_statement(&mut self, expr: &Expr) -> Result<()> {
        let value = self.translate(expr, false)?;
        if value.is_void() || matches!(expr.kind, ExprKind::Literal(_)) {
            return Ok(());
        }
        let line = if value.ty == Type::Void {
            format!("{};", value.code)
        } else {
            format!("_ = {};", value.code)
        };
        self.line(&line);
        Ok(())
    }

    fn return_statement(&mut self, value: Option<&Expr>, span: Span) -> Result<()> {
        let expected = self.return_type;
        match value {
            None if expected == Type::Void => self.line("return;"),
            None => {
                return Err(TranslateError::InvalidConversion {
                    from: Type::Void,
                    to: expected,
                    span,
                });
            }
            Some(value) => {
                let result = self.expr(value)?;
                if expected == Type::Void {
                    return Err(TranslateError::InvalidConversion {
                        from: result.ty,
                        to: Type::Void,
                        span,
                    });
                }
                let result = result.coerce(expected, value.span)?;
                self.line(&format!("return {};", result.code));
            }
        }
        Ok(())
    }
}

/// Text for a `while` continue expression: a single statement without its
/// semicolon, or a block for several.
fn continue_expression(lines: Vec<String>) -> Option<String> {
    let statements: Vec<&str> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    match statements.as_slice() {
        [] => None,
        [single] => Some(single.strip_suffix(';').unwrap_or(single).to_string()),
        many => Some(format!("{{ {} }}", many.join(" "))),
    }
}
