//! Callable symbols, return signatures, and built-in specials
//!
//! The state compiler resolves action names against a symbol table of
//! callables and a registry of numbered engine specials. Both tables match
//! names case-insensitively.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Value-type tags used in parameter lists and return signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Bool,
    Float,
    String,
    Sound,
    State,
    Actor,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Sound => "sound",
            ValueType::State => "state",
            ValueType::Actor => "actor",
        };
        write!(f, "{}", name)
    }
}

/// Ordered return-type list of a callable ("prototype").
/// Empty means the callable returns nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature(pub Vec<ValueType>);

impl Signature {
    /// The empty ("returns nothing") signature
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn new(types: impl Into<Vec<ValueType>>) -> Self {
        Self(types.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn types(&self) -> &[ValueType] {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "void");
        }
        let names: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// Declared kind of one parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Typed(ValueType),
    /// Variadic marker: the preceding parameter's type repeats until `)`
    VarArgs,
}

/// One declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub optional: bool,
}

impl ParamSpec {
    pub fn required(ty: ValueType) -> Self {
        Self {
            kind: ParamKind::Typed(ty),
            optional: false,
        }
    }

    pub fn optional(ty: ValueType) -> Self {
        Self {
            kind: ParamKind::Typed(ty),
            optional: true,
        }
    }

    pub fn varargs() -> Self {
        Self {
            kind: ParamKind::VarArgs,
            optional: false,
        }
    }
}

/// A callable registered in the symbol table.
///
/// Instance methods carry one implicit leading self parameter in `params`;
/// action methods carry two more (caller and owner context). The parameter
/// binder skips the implicit slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callable {
    /// Canonical case-folded name
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub is_method: bool,
    pub is_action: bool,
    pub ret: Signature,
}

impl Callable {
    /// Number of implicit leading parameters the binder skips
    pub fn implicit_params(&self) -> usize {
        let mut count = 0;
        if self.is_method {
            count += 1;
        }
        if self.is_action {
            count += 2;
        }
        count
    }
}

/// Name of the fixed dispatch function special calls compile to
pub const SPECIAL_DISPATCH: &str = "a_callspecial";

/// Reserved type names are routed to distinct internal cast callables so
/// user scripts can spell casts as `int(...)`, `bool(...)`, `state(...)`.
pub fn internal_cast_name(name: &str) -> &str {
    match name {
        "int" => "__internal_int__",
        "bool" => "__internal_bool__",
        "state" => "__internal_state__",
        _ => name,
    }
}

/// Symbol table of callables, keyed by case-folded name
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    callables: HashMap<String, Callable>,
}

impl SymbolTable {
    /// Create an empty symbol table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table pre-populated with the built-ins the compiler itself
    /// targets: the special-dispatch action function and the internal cast
    /// callables
    pub fn with_builtins() -> Self {
        let mut table = Self::new();

        // Dispatch target for numbered specials: the special id plus up to
        // five integer arguments, preceded by the action-context implicits.
        table.define(Callable {
            name: SPECIAL_DISPATCH.to_string(),
            params: vec![
                ParamSpec::required(ValueType::Actor),
                ParamSpec::required(ValueType::Actor),
                ParamSpec::required(ValueType::State),
                ParamSpec::required(ValueType::Int),
                ParamSpec::optional(ValueType::Int),
                ParamSpec::optional(ValueType::Int),
                ParamSpec::optional(ValueType::Int),
                ParamSpec::optional(ValueType::Int),
                ParamSpec::optional(ValueType::Int),
            ],
            is_method: true,
            is_action: true,
            ret: Signature::new([ValueType::Bool]),
        });

        for (name, ty) in [
            ("__internal_int__", ValueType::Int),
            ("__internal_bool__", ValueType::Bool),
            ("__internal_state__", ValueType::State),
        ] {
            table.define(Callable {
                name: name.to_string(),
                params: vec![ParamSpec::required(ty)],
                is_method: false,
                is_action: false,
                ret: Signature::new([ty]),
            });
        }

        table
    }

    /// Register a callable under its case-folded name
    pub fn define(&mut self, callable: Callable) {
        self.callables
            .insert(callable.name.to_ascii_lowercase(), callable);
    }

    /// Look up a callable by name, case-insensitively
    pub fn find(&self, name: &str) -> Option<&Callable> {
        self.callables.get(&name.to_ascii_lowercase())
    }
}

/// A built-in numbered engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDef {
    pub id: i32,
    pub min_args: usize,
    pub max_args: usize,
}

/// Registry of built-in specials, keyed by case-folded name
#[derive(Debug, Clone, Default)]
pub struct SpecialsTable {
    specials: HashMap<String, SpecialDef>,
}

impl SpecialsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a special. Entries with a non-positive id are rejected
    /// (those exist only as placeholders in engine tables).
    pub fn define(&mut self, name: &str, def: SpecialDef) {
        if def.id > 0 {
            self.specials.insert(name.to_ascii_lowercase(), def);
        }
    }

    /// Look up a special by name, case-insensitively
    pub fn find(&self, name: &str) -> Option<&SpecialDef> {
        self.specials.get(&name.to_ascii_lowercase())
    }
}
