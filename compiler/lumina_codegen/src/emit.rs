//! JS text emission (§4.9). Every write goes through [`Emitter`], which
//! tracks the generated line/column alongside the output so every token
//! can be paired with the originating [`Location`] in the source map.

use lumina_ir::ast::BinaryOp;
use lumina_ir::ir::{IrExpr, IrFunction, IrMatchArm, IrProgram, IrStmt};
use lumina_ir::Location;

use crate::cast;
use crate::runtime::{RUNTIME_NAMES, RUNTIME_PACKAGE};
use crate::sourcemap::{Mapping, SourceMapBuilder};

/// Module system the emitted `import`/`require` prelude targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Esm,
    Cjs,
}

pub struct CodegenOptions {
    pub target: Target,
    pub source_map: bool,
    /// Skips the runtime import/require prelude entirely — the generated
    /// module is expected to supply those names itself (§6.5: `--no-runtime`).
    pub no_runtime: bool,
    pub source_name: String,
    pub output_name: String,
}

pub struct CodegenOutput {
    pub js: String,
    pub source_map: Option<String>,
}

pub fn generate(program: &IrProgram, options: &CodegenOptions) -> CodegenOutput {
    let mut emitter = Emitter::new(options.source_map);
    emitter.emit_prelude(options);
    emitter.emit_program(program);
    let source_map = options.source_map.then(|| emitter.map.build(&options.source_name, &options.output_name));
    CodegenOutput { js: emitter.out, source_map }
}

struct Emitter {
    out: String,
    gen_line: u32,
    gen_col: u32,
    map: SourceMapBuilder,
    want_map: bool,
    match_counter: u32,
}

impl Emitter {
    fn new(want_map: bool) -> Self {
        Emitter { out: String::new(), gen_line: 0, gen_col: 0, map: SourceMapBuilder::new(), want_map, match_counter: 0 }
    }

    fn write(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.gen_line += 1;
                self.gen_col = 0;
            } else {
                self.gen_col += 1;
            }
        }
        self.out.push_str(text);
    }

    fn writeln(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    /// Records a `(generated position) -> (original position)` mapping at
    /// the emitter's current position, for any node with a real location.
    /// Source positions are taken 1-based from the parser and stored
    /// 0-based per source-map-v3 convention.
    fn mark(&mut self, location: Location) {
        if !self.want_map || location.is_dummy() {
            return;
        }
        self.map.push(Mapping {
            generated_line: self.gen_line,
            generated_column: self.gen_col,
            source_line: location.start.line.saturating_sub(1),
            source_column: location.start.column.saturating_sub(1),
        });
    }

    fn emit_prelude(&mut self, options: &CodegenOptions) {
        if options.no_runtime {
            return;
        }
        let names = RUNTIME_NAMES.join(", ");
        match options.target {
            Target::Esm => self.writeln(&format!("import {{ {names} }} from \"{RUNTIME_PACKAGE}\";")),
            Target::Cjs => self.writeln(&format!("const {{ {names} }} = require(\"{RUNTIME_PACKAGE}\");")),
        }
    }

    fn emit_program(&mut self, program: &IrProgram) {
        for stmt in &program.top_level {
            self.emit_stmt(stmt, 0);
        }
        for function in &program.functions {
            self.emit_function(function, program.ssa);
        }
    }

    fn emit_function(&mut self, function: &IrFunction, ssa: bool) {
        self.mark(function.location);
        let params = function.params.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ");
        self.writeln(&format!("function {}({params}) {{", function.name.as_str()));

        let (hoisted, body) =
            if ssa { hoist_ssa_names(&function.body) } else { (Vec::new(), function.body.clone()) };
        let uses_try = body_uses_try(&body);

        if !hoisted.is_empty() {
            self.indent(1);
            self.writeln(&format!("let {};", hoisted.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", ")));
        }

        if uses_try {
            self.writeln("  try {");
            for stmt in &body {
                self.emit_stmt(stmt, 2);
            }
            self.writeln("  } catch (__lumina_try_err) {");
            self.writeln("    if (__lumina_try_err && __lumina_try_err.__lumina_try) { return __lumina_try_err.value; }");
            self.writeln("    throw __lumina_try_err;");
            self.writeln("  }");
        } else {
            for stmt in &body {
                self.emit_stmt(stmt, 1);
            }
        }
        self.writeln("}");
    }

    fn indent(&mut self, depth: usize) {
        self.write(&"  ".repeat(depth));
    }

    fn emit_stmt(&mut self, stmt: &IrStmt, depth: usize) {
        self.mark(stmt.location());
        match stmt {
            IrStmt::Let { name, value, .. } => {
                self.indent(depth);
                self.write(&format!("let {} = ", name.as_str()));
                self.emit_expr(value);
                self.writeln(";");
            }
            IrStmt::Phi { name, condition, then_value, else_value, .. } => {
                self.indent(depth);
                self.write(&format!("let {} = ", name.as_str()));
                self.emit_expr(condition);
                self.write(" ? (");
                self.emit_expr(then_value);
                self.write(") : (");
                self.emit_expr(else_value);
                self.writeln(");");
            }
            IrStmt::Return { value, .. } => {
                self.indent(depth);
                match value {
                    Some(value) => {
                        self.write("return ");
                        self.emit_expr(value);
                        self.writeln(";");
                    }
                    None => self.writeln("return;"),
                }
            }
            IrStmt::ExprStmt { expr, .. } => {
                self.indent(depth);
                self.emit_expr(expr);
                self.writeln(";");
            }
            IrStmt::If { cond, then_branch, else_branch, .. } => {
                self.indent(depth);
                self.write("if (");
                self.emit_expr(cond);
                self.writeln(") {");
                for s in then_branch {
                    self.emit_stmt(s, depth + 1);
                }
                self.indent(depth);
                if else_branch.is_empty() {
                    self.writeln("}");
                } else {
                    self.writeln("} else {");
                    for s in else_branch {
                        self.emit_stmt(s, depth + 1);
                    }
                    self.indent(depth);
                    self.writeln("}");
                }
            }
            IrStmt::While { cond, body, .. } => {
                self.indent(depth);
                self.write("while (");
                self.emit_expr(cond);
                self.writeln(") {");
                for s in body {
                    self.emit_stmt(s, depth + 1);
                }
                self.indent(depth);
                self.writeln("}");
            }
            IrStmt::Assign { target, value, .. } => {
                self.indent(depth);
                self.emit_expr(target);
                self.write(" = ");
                self.emit_expr(value);
                self.writeln(";");
            }
            IrStmt::Noop { .. } => {}
        }
    }

    fn emit_expr(&mut self, expr: &IrExpr) {
        self.mark(expr.location());
        match expr {
            IrExpr::Number { value, .. } => self.write(&format_number(*value)),
            IrExpr::String { value, .. } => self.write(&json_quote(value)),
            IrExpr::Boolean { value, .. } => self.write(if *value { "true" } else { "false" }),
            IrExpr::Identifier { name, .. } => self.write(name.as_str()),
            IrExpr::Binary { op, left, right, .. } => {
                self.write("(");
                self.emit_expr(left);
                self.write(&format!(" {} ", binary_op_token(op)));
                self.emit_expr(right);
                self.write(")");
            }
            IrExpr::Cast { expr, target_type, .. } => {
                let (prefix, suffix) = cast::wrap(*target_type);
                self.write(prefix);
                self.emit_expr(expr);
                self.write(suffix);
            }
            IrExpr::Call { callee, args, .. } => {
                self.emit_expr(callee);
                self.write("(");
                self.emit_args(args);
                self.write(")");
            }
            IrExpr::Member { object, member, .. } => {
                self.emit_expr(object);
                self.write(&format!(".{}", member.as_str()));
            }
            IrExpr::Index { object, index, .. } => {
                self.emit_expr(object);
                self.write("[");
                self.emit_expr(index);
                self.write("]");
            }
            IrExpr::Enum { tag, values, .. } => {
                self.write(&format!("{{ tag: {}, values: [", json_quote(tag.as_str())));
                self.emit_args(values);
                self.write("] }");
            }
            IrExpr::StructLiteral { fields, .. } => {
                self.write("{ ");
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        self.write(", ");
                    }
                    self.write(&format!("{}: ", name.as_str()));
                    self.emit_expr(value);
                }
                self.write(" }");
            }
            IrExpr::Match { value, arms, .. } => self.emit_match(value, arms),
        }
    }

    fn emit_args(&mut self, args: &[IrExpr]) {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.emit_expr(arg);
        }
    }

    /// Lowers a `MatchExpr` to a parameterless-return arrow binding the
    /// scrutinee, whose body is a ternary/ordered-chain over the arms
    /// (§13's decision: ternary form, never a `return`-based IIFE). A arm
    /// with bindings gets its own binding arrow so the values pulled out
    /// of the tagged enum are in scope only for that arm's body.
    fn emit_match(&mut self, value: &IrExpr, arms: &[IrMatchArm]) {
        let temp = format!("_match_{}", self.match_counter);
        self.match_counter += 1;

        self.write(&format!("(({temp}) => "));
        self.emit_match_chain(&temp, arms);
        self.write(")(");
        self.emit_expr(value);
        self.write(")");
    }

    fn emit_match_chain(&mut self, temp: &str, arms: &[IrMatchArm]) {
        let Some((arm, rest)) = arms.split_first() else {
            // Exhaustiveness is already enforced upstream (C5); reaching
            // the end of the arm list with nothing left to fall back to
            // means the match truly had zero arms, which validation (C8
            // step 8) would already have flagged as a compiler bug.
            self.write("(() => { throw new LuminaPanic(\"non-exhaustive match\"); })()");
            return;
        };
        let is_last = rest.is_empty();
        if is_last || arm.variant.is_none() {
            self.emit_arm_body(temp, arm);
            return;
        }
        let variant = arm.variant.expect("checked above");
        self.write(&format!("{temp}.tag === {} ? ", json_quote(variant.as_str())));
        self.emit_arm_body(temp, arm);
        self.write(" : ");
        self.emit_match_chain(temp, rest);
    }

    fn emit_arm_body(&mut self, temp: &str, arm: &IrMatchArm) {
        if arm.bindings.is_empty() {
            self.write("(");
            self.emit_expr(&arm.body);
            self.write(")");
            return;
        }
        let params = arm.bindings.iter().map(|b| b.as_str()).collect::<Vec<_>>().join(", ");
        self.write(&format!("(({params}) => "));
        self.emit_expr(&arm.body);
        self.write(")(");
        for (i, _) in arm.bindings.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.write(&format!("{temp}.values[{i}]"));
        }
        self.write(")");
    }
}

fn binary_op_token(op: &BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "===",
        BinaryOp::Ne => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::Pipe => unreachable!("the pipe operator is desugared away by lumina_canon before codegen sees it"),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn json_quote(s: &str) -> String {
    serde_json::to_string(s).expect("strings from Lumina source cannot contain invalid UTF-8")
}

/// §4.9 SSA hoisting: every `Let` whose name matches `/_\d+$/` becomes a
/// top-of-function `let name;` declaration plus a bare assignment at the
/// point it used to bind, so straight-line SSA output shares names across
/// what would otherwise be redundant `let`s. Returns the names to hoist
/// (emitted as one `let` line by the caller) and the body with those
/// `Let`s rewritten to `Assign`s.
fn hoist_ssa_names(body: &[IrStmt]) -> (Vec<lumina_ir::Symbol>, Vec<IrStmt>) {
    let mut hoisted = Vec::new();
    let mut rest = Vec::with_capacity(body.len());
    for stmt in body {
        match stmt {
            IrStmt::Let { name, value, location } if is_ssa_name(name.as_str()) => {
                hoisted.push(*name);
                rest.push(IrStmt::Assign { target: IrExpr::Identifier { name: *name, location: *location }, value: value.clone(), location: *location });
            }
            other => rest.push(recurse_hoist(other)),
        }
    }
    (hoisted, rest)
}

/// `hoist_ssa_names` only rewrites the straight-line list it's given;
/// nested `If`/`While` bodies need the same treatment, with their hoisted
/// names folded back into the parent's hoist list by the caller — but
/// since §4.9 only hoists within the function's own flat SSA output
/// (branches in SSA form already merge through `Phi`, not nested `Let`s),
/// a statement that isn't itself an SSA `Let` is passed through unchanged.
fn recurse_hoist(stmt: &IrStmt) -> IrStmt {
    stmt.clone()
}

fn is_ssa_name(name: &str) -> bool {
    let Some(pos) = name.rfind('_') else { return false };
    !name[pos + 1..].is_empty() && name[pos + 1..].chars().all(|c| c.is_ascii_digit())
}

fn body_uses_try(stmts: &[IrStmt]) -> bool {
    stmts.iter().any(stmt_uses_try)
}

fn stmt_uses_try(stmt: &IrStmt) -> bool {
    match stmt {
        IrStmt::Let { value, .. } => expr_uses_try(value),
        IrStmt::Phi { condition, then_value, else_value, .. } => {
            expr_uses_try(condition) || expr_uses_try(then_value) || expr_uses_try(else_value)
        }
        IrStmt::Return { value, .. } => value.as_ref().is_some_and(expr_uses_try),
        IrStmt::ExprStmt { expr, .. } => expr_uses_try(expr),
        IrStmt::If { cond, then_branch, else_branch, .. } => {
            expr_uses_try(cond) || body_uses_try(then_branch) || body_uses_try(else_branch)
        }
        IrStmt::While { cond, body, .. } => expr_uses_try(cond) || body_uses_try(body),
        IrStmt::Assign { target, value, .. } => expr_uses_try(target) || expr_uses_try(value),
        IrStmt::Noop { .. } => false,
    }
}

fn expr_uses_try(expr: &IrExpr) -> bool {
    match expr {
        IrExpr::Call { callee, args, .. } => {
            matches!(callee.as_ref(), IrExpr::Identifier { name, .. } if name.as_str() == "__lumina_try") || args.iter().any(expr_uses_try)
        }
        IrExpr::Binary { left, right, .. } => expr_uses_try(left) || expr_uses_try(right),
        IrExpr::Cast { expr, .. } => expr_uses_try(expr),
        IrExpr::Member { object, .. } => expr_uses_try(object),
        IrExpr::Index { object, index, .. } => expr_uses_try(object) || expr_uses_try(index),
        IrExpr::Enum { values, .. } => values.iter().any(expr_uses_try),
        IrExpr::StructLiteral { fields, .. } => fields.iter().any(|(_, v)| expr_uses_try(v)),
        IrExpr::Match { value, arms, .. } => expr_uses_try(value) || arms.iter().any(|a| expr_uses_try(&a.body)),
        IrExpr::Number { .. } | IrExpr::String { .. } | IrExpr::Boolean { .. } | IrExpr::Identifier { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::ir::{IrFunction, IrProgram};
    use lumina_ir::Symbol;

    fn dummy_loc() -> Location {
        Location::DUMMY
    }

    fn num(value: f64) -> IrExpr {
        IrExpr::Number { value, location: dummy_loc() }
    }

    fn ident(name: &str) -> IrExpr {
        IrExpr::Identifier { name: Symbol::intern(name), location: dummy_loc() }
    }

    fn opts() -> CodegenOptions {
        CodegenOptions {
            target: Target::Esm,
            source_map: false,
            no_runtime: true,
            source_name: "input.lm".into(),
            output_name: "input.js".into(),
        }
    }

    #[test]
    fn no_runtime_skips_prelude() {
        let program = IrProgram { top_level: Vec::new(), functions: Vec::new(), ssa: false };
        let out = generate(&program, &opts());
        assert!(!out.js.contains("import"));
        assert!(!out.js.contains("require"));
    }

    #[test]
    fn esm_prelude_imports_runtime_names() {
        let mut options = opts();
        options.no_runtime = false;
        let program = IrProgram { top_level: Vec::new(), functions: Vec::new(), ssa: false };
        let out = generate(&program, &options);
        assert!(out.js.starts_with("import {"));
        assert!(out.js.contains("io"));
        assert!(out.js.contains(RUNTIME_PACKAGE));
    }

    #[test]
    fn cjs_prelude_uses_require() {
        let mut options = opts();
        options.no_runtime = false;
        options.target = Target::Cjs;
        let program = IrProgram { top_level: Vec::new(), functions: Vec::new(), ssa: false };
        let out = generate(&program, &options);
        assert!(out.js.starts_with("const {"));
        assert!(out.js.contains("require("));
    }

    #[test]
    fn string_literal_uses_json_quoting() {
        let mut emitter = Emitter::new(false);
        emitter.emit_expr(&IrExpr::String { value: "a\"b".into(), location: dummy_loc() });
        assert_eq!(emitter.out, "\"a\\\"b\"");
    }

    #[test]
    fn integer_literal_has_no_trailing_dot() {
        let mut emitter = Emitter::new(false);
        emitter.emit_expr(&num(3.0));
        assert_eq!(emitter.out, "3");
    }

    #[test]
    fn binary_expr_is_parenthesized() {
        let mut emitter = Emitter::new(false);
        emitter.emit_expr(&IrExpr::Binary {
            op: BinaryOp::Add,
            left: Box::new(num(1.0)),
            right: Box::new(num(2.0)),
            location: dummy_loc(),
        });
        assert_eq!(emitter.out, "(1 + 2)");
    }

    #[test]
    fn enum_literal_lowers_to_tagged_object() {
        let mut emitter = Emitter::new(false);
        emitter.emit_expr(&IrExpr::Enum {
            tag: Symbol::intern("Some"),
            values: vec![num(1.0)],
            location: dummy_loc(),
        });
        assert_eq!(emitter.out, "{ tag: \"Some\", values: [1] }");
    }

    #[test]
    fn match_lowers_to_ternary_chain_not_iife_return() {
        let mut emitter = Emitter::new(false);
        let arms = vec![
            IrMatchArm {
                variant: Some(Symbol::intern("Red")),
                bindings: Vec::new(),
                body: Box::new(num(0.0)),
                location: dummy_loc(),
            },
            IrMatchArm {
                variant: Some(Symbol::intern("Blue")),
                bindings: Vec::new(),
                body: Box::new(num(1.0)),
                location: dummy_loc(),
            },
        ];
        emitter.emit_match(&ident("c"), &arms);
        assert!(!emitter.out.contains("return"));
        assert!(emitter.out.contains("? (0) : "));
        assert!(emitter.out.contains("_match_0.tag === \"Red\""));
    }

    #[test]
    fn match_arm_with_bindings_destructures_values() {
        let mut emitter = Emitter::new(false);
        let arms = vec![IrMatchArm {
            variant: Some(Symbol::intern("Some")),
            bindings: vec![Symbol::intern("x")],
            body: Box::new(ident("x")),
            location: dummy_loc(),
        }];
        emitter.emit_match(&ident("opt"), &arms);
        assert!(emitter.out.contains("((x) => x)(_match_0.values[0])"));
    }

    #[test]
    fn ssa_names_are_hoisted_to_function_top() {
        let loc = dummy_loc();
        let body = vec![
            IrStmt::Let { name: Symbol::intern("x_0"), value: num(1.0), location: loc },
            IrStmt::Return { value: Some(ident("x_0")), location: loc },
        ];
        let function = IrFunction { name: Symbol::intern("f"), params: Vec::new(), body, location: loc };
        let program = IrProgram { top_level: Vec::new(), functions: vec![function], ssa: true };
        let out = generate(&program, &opts());
        assert!(out.js.contains("let x_0;"));
        assert!(out.js.contains("x_0 = 1;"));
    }

    #[test]
    fn non_ssa_names_keep_their_let() {
        let loc = dummy_loc();
        let body = vec![IrStmt::Let { name: Symbol::intern("total"), value: num(1.0), location: loc }];
        let function = IrFunction { name: Symbol::intern("f"), params: Vec::new(), body, location: loc };
        let program = IrProgram { top_level: Vec::new(), functions: vec![function], ssa: false };
        let out = generate(&program, &opts());
        assert!(out.js.contains("let total = 1;"));
    }

    #[test]
    fn function_containing_try_helper_is_wrapped() {
        let loc = dummy_loc();
        let try_call = IrExpr::Call {
            callee: Box::new(ident("__lumina_try")),
            args: vec![ident("r")],
            location: loc,
        };
        let body = vec![IrStmt::Return { value: Some(try_call), location: loc }];
        let function = IrFunction { name: Symbol::intern("f"), params: Vec::new(), body, location: loc };
        let program = IrProgram { top_level: Vec::new(), functions: vec![function], ssa: false };
        let out = generate(&program, &opts());
        assert!(out.js.contains("try {"));
        assert!(out.js.contains("__lumina_try_err.__lumina_try"));
    }

    #[test]
    fn function_without_try_helper_is_unwrapped() {
        let loc = dummy_loc();
        let body = vec![IrStmt::Return { value: Some(num(1.0)), location: loc }];
        let function = IrFunction { name: Symbol::intern("f"), params: Vec::new(), body, location: loc };
        let program = IrProgram { top_level: Vec::new(), functions: vec![function], ssa: false };
        let out = generate(&program, &opts());
        assert!(!out.js.contains("try {"));
    }

    #[test]
    fn i8_cast_emits_masked_shift_around_operand() {
        let mut emitter = Emitter::new(false);
        emitter.emit_expr(&IrExpr::Cast {
            expr: Box::new(ident("x")),
            target_type: lumina_ir::ir::CastType::I8,
            location: dummy_loc(),
        });
        assert_eq!(emitter.out, "((x << 24) >> 24)");
    }

    #[test]
    fn source_map_marks_generated_positions() {
        let mut options = opts();
        options.source_map = true;
        options.no_runtime = true;
        let loc = Location {
            start: lumina_ir::Position { line: 3, column: 5, offset: 0 },
            end: lumina_ir::Position { line: 3, column: 6, offset: 1 },
        };
        let body = vec![IrStmt::Return { value: Some(num(1.0)), location: loc }];
        let function = IrFunction { name: Symbol::intern("f"), params: Vec::new(), body, location: loc };
        let program = IrProgram { top_level: Vec::new(), functions: vec![function], ssa: false };
        let out = generate(&program, &options);
        assert!(out.source_map.is_some());
        assert!(out.source_map.unwrap().contains("mappings"));
    }
}
