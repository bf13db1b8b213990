//! Type narrowing (§4.5 "Narrowing").
//!
//! "After `x is V`, or `x == V(_)` under `==`/`!=` with an enum
//! constructor, the then/else scopes narrow `x`'s type to the variant
//! payload type." We don't carry full payload types in C5 (that's C4's
//! job); what this module gives the rest of the checker is enough to
//! resolve *which enum* a bare identifier scrutinee denotes, so match
//! exhaustiveness can be checked against `let c = Color.Red; match c {
//! ... }` without re-deriving a full type environment.

use lumina_ir::ast::{BinaryOp, Expr};
use lumina_ir::Symbol;
use rustc_hash::FxHashMap;

#[derive(Default)]
pub struct Narrowing {
    scopes: Vec<FxHashMap<Symbol, Symbol>>,
}

impl Narrowing {
    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Records that `name` is known (by a `let` binding or a narrowing
    /// condition) to denote a value of enum `enum_name`.
    pub fn declare(&mut self, name: Symbol, enum_name: Symbol) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, enum_name);
        }
    }

    pub fn declared_enum(&self, name: Symbol) -> Option<Symbol> {
        self.scopes.iter().rev().find_map(|s| s.get(&name).copied())
    }

    /// Narrows identifiers appearing in an `if`/`while` condition into the
    /// scope just pushed for the branch taken when the condition is
    /// `polarity` (`true` for the then-branch/loop body, `false` for the
    /// else-branch).
    pub fn apply_condition(&mut self, cond: &Expr, polarity: bool) {
        match cond {
            Expr::Is { scrutinee, enum_name, variant, .. } if polarity => {
                if let Expr::Identifier { name, .. } = scrutinee.as_ref() {
                    self.declare(*name, enum_name.unwrap_or(*variant));
                }
            }
            Expr::Binary { op: BinaryOp::Eq, left, right, .. } if polarity => {
                self.apply_eq(left, right);
            }
            Expr::Binary { op: BinaryOp::And, left, right, .. } if polarity => {
                self.apply_condition(left, true);
                self.apply_condition(right, true);
            }
            _ => {}
        }
    }

    fn apply_eq(&mut self, left: &Expr, right: &Expr) {
        if let (Expr::Identifier { name, .. }, Expr::Enum { enum_name, variant, .. }) = (left, right) {
            self.declare(*name, enum_name.unwrap_or(*variant));
        } else if let (Expr::Enum { enum_name, variant, .. }, Expr::Identifier { name, .. }) = (left, right) {
            self.declare(*name, enum_name.unwrap_or(*variant));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ir::Location;

    #[test]
    fn is_expr_narrows_identifier_to_enum() {
        let mut narrowing = Narrowing::default();
        narrowing.push_scope();
        let cond = Expr::Is {
            scrutinee: Box::new(Expr::Identifier { name: "c".into(), location: Location::DUMMY }),
            enum_name: Some("Color".into()),
            variant: "Red".into(),
            location: Location::DUMMY,
        };
        narrowing.apply_condition(&cond, true);
        assert_eq!(narrowing.declared_enum(Symbol::intern("c")), Some(Symbol::intern("Color")));
    }

    #[test]
    fn narrowing_does_not_leak_across_scopes() {
        let mut narrowing = Narrowing::default();
        narrowing.push_scope();
        narrowing.declare(Symbol::intern("c"), Symbol::intern("Color"));
        narrowing.push_scope();
        assert_eq!(narrowing.declared_enum(Symbol::intern("c")), Some(Symbol::intern("Color")));
        narrowing.pop_scope();
        narrowing.pop_scope();
        assert_eq!(narrowing.declared_enum(Symbol::intern("c")), None);
    }
}
