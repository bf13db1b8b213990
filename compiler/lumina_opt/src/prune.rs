//! Dead-function pruning (§4.8 step 7): keeps only functions reachable by
//! call from `main`, plus `main` itself. A function referenced solely by
//! name (passed as a value, never called) is treated as reachable too —
//! the callee-reachability walk looks at every `IrExpr::Identifier` that
//! names a known function, not just ones sitting directly in call
//! position, since the IR doesn't distinguish "called" from "referenced"
//! once an identifier has been looked up.

use lumina_ir::ir::{IrExpr, IrFunction, IrProgram, IrStmt};
use lumina_ir::Symbol;
use rustc_hash::{FxHashMap, FxHashSet};

pub fn prune_unreachable_functions(program: IrProgram) -> IrProgram {
    let by_name: FxHashMap<Symbol, usize> = program.functions.iter().enumerate().map(|(i, f)| (f.name, i)).collect();

    let Some(&main_index) = by_name.get(&Symbol::intern("main")) else {
        // No `main` to root the walk from (e.g. a library module): every
        // function is considered an external entry point and kept.
        return program;
    };

    let mut reachable = FxHashSet::default();
    let mut worklist = vec![main_index];
    reachable.insert(main_index);

    for stmt in &program.top_level {
        mark_reachable_from_stmt(stmt, &by_name, &mut reachable, &mut worklist);
    }

    while let Some(index) = worklist.pop() {
        let function = &program.functions[index];
        for stmt in &function.body {
            mark_reachable_from_stmt(stmt, &by_name, &mut reachable, &mut worklist);
        }
    }

    let functions = program
        .functions
        .into_iter()
        .enumerate()
        .filter(|(i, _)| reachable.contains(i))
        .map(|(_, f)| f)
        .collect();

    IrProgram { functions, top_level: program.top_level, ssa: program.ssa }
}

fn mark_reachable_from_stmt(
    stmt: &IrStmt,
    by_name: &FxHashMap<Symbol, usize>,
    reachable: &mut FxHashSet<usize>,
    worklist: &mut Vec<usize>,
) {
    let mut visit = |expr: &IrExpr| mark_reachable_from_expr(expr, by_name, reachable, worklist);
    match stmt {
        IrStmt::Let { value, .. } => visit(value),
        IrStmt::Phi { condition, then_value, else_value, .. } => {
            visit(condition);
            visit(then_value);
            visit(else_value);
        }
        IrStmt::Return { value, .. } => {
            if let Some(value) = value {
                visit(value);
            }
        }
        IrStmt::ExprStmt { expr, .. } => visit(expr),
        IrStmt::If { cond, then_branch, else_branch, .. } => {
            visit(cond);
            for s in then_branch {
                mark_reachable_from_stmt(s, by_name, reachable, worklist);
            }
            for s in else_branch {
                mark_reachable_from_stmt(s, by_name, reachable, worklist);
            }
        }
        IrStmt::While { cond, body, .. } => {
            visit(cond);
            for s in body {
                mark_reachable_from_stmt(s, by_name, reachable, worklist);
            }
        }
        IrStmt::Assign { target, value, .. } => {
            visit(target);
            visit(value);
        }
        IrStmt::Noop { .. } => {}
    }
}

fn mark_reachable_from_expr(expr: &IrExpr, by_name: &FxHashMap<Symbol, usize>, reachable: &mut FxHashSet<usize>, worklist: &mut Vec<usize>) {
    let mut visit = |e: &IrExpr| mark_reachable_from_expr(e, by_name, reachable, worklist);
    match expr {
        IrExpr::Identifier { name, .. } => {
            if let Some(&index) = by_name.get(name) {
                if reachable.insert(index) {
                    worklist.push(index);
                }
            }
        }
        IrExpr::Binary { left, right, .. } => {
            visit(left);
            visit(right);
        }
        IrExpr::Cast { expr, .. } => visit(expr),
        IrExpr::Call { callee, args, .. } => {
            visit(callee);
            for arg in args {
                visit(arg);
            }
        }
        IrExpr::Member { object, .. } => visit(object),
        IrExpr::Index { object, index, .. } => {
            visit(object);
            visit(index);
        }
        IrExpr::Enum { values, .. } => {
            for v in values {
                visit(v);
            }
        }
        IrExpr::Match { value, arms, .. } => {
            visit(value);
            for arm in arms {
                visit(&arm.body);
            }
        }
        IrExpr::StructLiteral { fields, .. } => {
            for (_, v) in fields {
                visit(v);
            }
        }
        IrExpr::Number { .. } | IrExpr::String { .. } | IrExpr::Boolean { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::Location;

    fn func(name: &str, body: Vec<IrStmt>) -> IrFunction {
        IrFunction { name: Symbol::intern(name), params: vec![], body, location: Location::DUMMY }
    }

    #[test]
    fn keeps_main_and_everything_it_calls() {
        let call_helper = IrStmt::ExprStmt {
            expr: IrExpr::Call {
                callee: Box::new(IrExpr::Identifier { name: Symbol::intern("helper"), location: Location::DUMMY }),
                args: vec![],
                location: Location::DUMMY,
            },
            location: Location::DUMMY,
        };
        let program = IrProgram {
            functions: vec![func("main", vec![call_helper]), func("helper", vec![]), func("unused", vec![])],
            top_level: vec![],
            ssa: false,
        };
        let pruned = prune_unreachable_functions(program);
        let names: Vec<_> = pruned.functions.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"main"));
        assert!(names.contains(&"helper"));
        assert!(!names.contains(&"unused"));
    }

    #[test]
    fn keeps_every_function_when_there_is_no_main() {
        let program = IrProgram { functions: vec![func("a", vec![]), func("b", vec![])], top_level: vec![], ssa: false };
        let pruned = prune_unreachable_functions(program);
        assert_eq!(pruned.functions.len(), 2);
    }
}
