//! Recursive-struct detection (§4.5 "Recursive struct detection").
//!
//! "A struct field that (transitively) contains itself without passing
//! through a recognized indirection wrapper (`Option`/`Box`/`Ref`) emits
//! `RECURSIVE_STRUCT` with a suggested fix listing wrapper options."

use lumina_diagnostic::{recursive_struct, Diagnostic};
use lumina_ir::ast::TypeExpr;
use lumina_ir::Symbol;
use lumina_resolve::{SymbolKind, SymbolTable};
use rustc_hash::FxHashSet;

const INDIRECTION_WRAPPERS: &[&str] = &["Option", "Box", "Ref"];

pub fn check_recursive_structs(table: &SymbolTable) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (name, info) in table.iter() {
        if info.kind != Some(SymbolKind::Type) || info.fields.is_empty() {
            continue;
        }
        for (field_name, field_ty) in &info.fields {
            let mut visited = FxHashSet::default();
            if reaches(field_ty, *name, table, &mut visited) {
                diagnostics.push(recursive_struct(field_ty.location(), name.as_str(), field_name.as_str()));
                break;
            }
        }
    }
    diagnostics
}

fn reaches(ty: &TypeExpr, target: Symbol, table: &SymbolTable, visited: &mut FxHashSet<Symbol>) -> bool {
    let TypeExpr::Name { name, args, .. } = ty else { return false };
    if INDIRECTION_WRAPPERS.contains(&name.as_str()) {
        return false;
    }
    if *name == target {
        return true;
    }
    if !visited.insert(*name) {
        return false;
    }
    let Some(info) = table.get(*name) else { return false };
    if info.fields.iter().any(|(_, field_ty)| reaches(field_ty, target, table, visited)) {
        return true;
    }
    args.iter().any(|a| reaches(a, target, table, visited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_parse::parse;
    use lumina_resolve::hoist_declarations;

    fn table_for(src: &str) -> SymbolTable {
        let program = parse(src).unwrap();
        hoist_declarations("test.lm", &program.items).0
    }

    #[test]
    fn direct_self_reference_is_flagged() {
        let table = table_for("struct Node { next: Node }");
        let diags = check_recursive_structs(&table);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, lumina_diagnostic::ErrorCode::RecursiveStruct);
    }

    #[test]
    fn option_wrapped_self_reference_is_allowed() {
        let table = table_for("struct Node { next: Option<Node> }");
        assert!(check_recursive_structs(&table).is_empty());
    }

    #[test]
    fn box_wrapped_self_reference_is_allowed() {
        let table = table_for("struct Node { next: Box<Node> }");
        assert!(check_recursive_structs(&table).is_empty());
    }

    #[test]
    fn mutually_recursive_structs_without_indirection_are_flagged() {
        let table = table_for("struct A { b: B } struct B { a: A }");
        let diags = check_recursive_structs(&table);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn non_recursive_struct_is_fine() {
        let table = table_for("struct Point { x: int, y: int }");
        assert!(check_recursive_structs(&table).is_empty());
    }
}
