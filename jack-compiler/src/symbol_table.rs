//! Two-scope symbol table for the Jack compiler
//!
//! Class scope (`static`/`field`) survives the whole class; subroutine scope
//! (`arg`/`var`) is cleared at the start of every subroutine. Lookups check
//! subroutine scope first, so a local shadows a field or static of the same
//! name.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Static,
    Field,
    Arg,
    Var,
}

#[derive(Debug, Clone)]
struct Entry {
    var_type: String,
    kind: Kind,
    index: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Entry>,
    subroutine_scope: HashMap<String, Entry>,
    static_index: u16,
    field_index: u16,
    arg_index: u16,
    var_index: u16,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the subroutine scope and its two counters; class scope and its
    /// counters are untouched.
    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.arg_index = 0;
        self.var_index = 0;
    }

    /// Defines a new identifier in the scope implied by `kind`, assigning it
    /// the next free index for that kind.
    pub fn define(&mut self, name: &str, var_type: &str, kind: Kind) {
        let entry = Entry {
            var_type: var_type.to_string(),
            kind,
            index: self.next_index(kind),
        };
        match kind {
            Kind::Static | Kind::Field => {
                self.class_scope.insert(name.to_string(), entry);
            }
            Kind::Arg | Kind::Var => {
                self.subroutine_scope.insert(name.to_string(), entry);
            }
        }
    }

    fn next_index(&mut self, kind: Kind) -> u16 {
        let counter = match kind {
            Kind::Static => &mut self.static_index,
            Kind::Field => &mut self.field_index,
            Kind::Arg => &mut self.arg_index,
            Kind::Var => &mut self.var_index,
        };
        let index = *counter;
        *counter += 1;
        index
    }

    #[must_use]
    pub fn var_count(&self, kind: Kind) -> u16 {
        match kind {
            Kind::Static => self.static_index,
            Kind::Field => self.field_index,
            Kind::Arg => self.arg_index,
            Kind::Var => self.var_index,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Entry> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|e| e.kind)
    }

    #[must_use]
    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|e| e.var_type.as_str())
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<u16> {
        self.lookup(name).map(|e| e.index)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
