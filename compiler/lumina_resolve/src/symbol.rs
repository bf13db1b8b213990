//! Flat symbol table built by the hoisting pass (§3.2, §4.3 step 1).

use lumina_diagnostic::{Diagnostic, ErrorCode, RelatedInfo};
use lumina_ir::ast::{EnumVariant, FieldDecl, GenericParams, Param, Stmt, TypeExpr, Visibility};
use lumina_ir::{Location, Symbol};
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Function,
    Variable,
}

/// §3.2: "A flat mapping from name → `SymbolInfo`".
#[derive(Clone, Debug, Default)]
pub struct SymbolInfo {
    pub kind: Option<SymbolKind>,
    pub declared_type: Option<TypeExpr>,
    pub visibility: Visibility,
    pub extern_: bool,
    pub origin: String,
    pub type_params: GenericParams,
    pub params: Vec<Param>,
    pub variants: Vec<EnumVariant>,
    pub fields: FxHashMap<Symbol, TypeExpr>,
    pub mutable: bool,
    /// §4.3: "a function declaration lacking a return annotation" — drives
    /// the pending-return fixed point in C5.
    pub pending_return: bool,
    pub location: Location,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: FxHashMap<Symbol, SymbolInfo>,
}

impl SymbolTable {
    pub fn get(&self, name: Symbol) -> Option<&SymbolInfo> {
        self.symbols.get(&name)
    }

    pub fn get_mut(&mut self, name: Symbol) -> Option<&mut SymbolInfo> {
        self.symbols.get_mut(&name)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.symbols.contains_key(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &SymbolInfo)> {
        self.symbols.iter()
    }

    fn declare(&mut self, name: Symbol, info: SymbolInfo, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(existing) = self.symbols.get(&name) {
            diagnostics.push(
                Diagnostic::error(
                    ErrorCode::TypeError,
                    info.location,
                    format!("`{name}` is already declared in this scope"),
                )
                .with_related(RelatedInfo::new(existing.location, "previous declaration here")),
            );
            return;
        }
        self.symbols.insert(name, info);
    }
}

/// §4.3 step 1: "For every `TypeDecl`/`StructDecl`/`EnumDecl`/`FnDecl`,
/// define a symbol." Runs before any scope walk so mutual recursion between
/// top-level functions and types is possible.
pub fn hoist_declarations(origin: &str, items: &[Stmt]) -> (SymbolTable, Vec<Diagnostic>) {
    let mut table = SymbolTable::default();
    let mut diagnostics = Vec::new();

    for item in items {
        match item {
            Stmt::FnDecl(f) => {
                let info = SymbolInfo {
                    kind: Some(SymbolKind::Function),
                    declared_type: f.return_type.clone(),
                    visibility: f.visibility,
                    extern_: f.extern_,
                    origin: origin.to_string(),
                    type_params: f.generics.clone(),
                    params: f.params.clone(),
                    pending_return: f.return_type.is_none(),
                    location: f.location,
                    ..Default::default()
                };
                table.declare(f.name, info, &mut diagnostics);
            }
            Stmt::StructDecl(s) => {
                let fields = s.fields.iter().map(|f: &FieldDecl| (f.name, f.ty.clone())).collect();
                let info = SymbolInfo {
                    kind: Some(SymbolKind::Type),
                    visibility: s.visibility,
                    origin: origin.to_string(),
                    type_params: s.generics.clone(),
                    fields,
                    location: s.location,
                    ..Default::default()
                };
                table.declare(s.name, info, &mut diagnostics);
            }
            Stmt::EnumDecl(e) => {
                let info = SymbolInfo {
                    kind: Some(SymbolKind::Type),
                    visibility: e.visibility,
                    origin: origin.to_string(),
                    type_params: e.generics.clone(),
                    variants: e.variants.clone(),
                    location: e.location,
                    ..Default::default()
                };
                table.declare(e.name, info, &mut diagnostics);
            }
            Stmt::TypeDecl(t) => {
                let fields = t.fields.iter().map(|f: &FieldDecl| (f.name, f.ty.clone())).collect();
                let info = SymbolInfo {
                    kind: Some(SymbolKind::Type),
                    declared_type: t.alias.clone(),
                    visibility: t.visibility,
                    extern_: t.extern_,
                    origin: origin.to_string(),
                    type_params: t.generics.clone(),
                    fields,
                    location: t.location,
                    ..Default::default()
                };
                table.declare(t.name, info, &mut diagnostics);
            }
            _ => {}
        }
    }
    (table, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_parse::parse;

    #[test]
    fn hoists_mutually_recursive_functions() {
        let program = parse("fn even(n:int)->bool { odd(n) } fn odd(n:int)->bool { even(n) }").unwrap();
        let (table, diags) = hoist_declarations("test.lm", &program.items);
        assert!(diags.is_empty());
        assert!(table.contains(Symbol::intern("even")));
        assert!(table.contains(Symbol::intern("odd")));
    }

    #[test]
    fn redeclaration_is_diagnosed() {
        let program = parse("fn f()->int { 1 } fn f()->int { 2 }").unwrap();
        let (_table, diags) = hoist_declarations("test.lm", &program.items);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn fn_without_return_type_is_pending() {
        let program = parse("fn f(x:int) { x }").unwrap();
        let (table, _diags) = hoist_declarations("test.lm", &program.items);
        assert!(table.get(Symbol::intern("f")).unwrap().pending_return);
    }
}
