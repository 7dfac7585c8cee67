use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::types::{ExprType, FuncSignature};

/// Trait implemented by types that allow looking up for a symbol.
pub trait SymbolLookup {
    fn lookup(&self, ident: &str) -> Option<Rc<Symbol>>;
}

/// An entry in a symbol table.
///
/// Symbols describe the identifiers that can be used in rule conditions:
/// the fields exposed by modules, loop variables, rules and the extra globals
/// available for VirusTotal. Module symbols are created once when the module
/// is loaded, and shared by every expression that references them.
#[derive(Clone, PartialEq)]
pub enum Symbol {
    /// A single value of a primitive type.
    Value(ValueSymbol),
    /// An array indexed by integers.
    Array(IterableSymbol),
    /// A dictionary indexed by strings.
    Dictionary(IterableSymbol),
    /// A function, possibly with multiple overloads.
    Function(FunctionSymbol),
    /// A structure with named attributes.
    Structure(StructureSymbol),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValueSymbol {
    pub(crate) name: String,
    pub(crate) ty: ExprType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IterableSymbol {
    pub(crate) name: String,
    pub(crate) element_type: ExprType,
    /// Describes the elements when `element_type` is [`ExprType::Object`].
    pub(crate) structure: Option<Rc<Symbol>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionSymbol {
    pub(crate) name: String,
    pub(crate) overloads: Vec<FuncSignature>,
}

#[derive(Clone, PartialEq)]
pub struct StructureSymbol {
    pub(crate) name: String,
    pub(crate) attributes: IndexMap<String, Rc<Symbol>>,
}

impl Symbol {
    pub fn value<N: Into<String>>(name: N, ty: ExprType) -> Self {
        Self::Value(ValueSymbol { name: name.into(), ty })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Value(s) => &s.name,
            Self::Array(s) | Self::Dictionary(s) => &s.name,
            Self::Function(s) => &s.name,
            Self::Structure(s) => &s.name,
        }
    }

    /// The type an expression referencing this symbol has.
    pub fn data_type(&self) -> ExprType {
        match self {
            Self::Value(s) => s.ty,
            Self::Array(_)
            | Self::Dictionary(_)
            | Self::Function(_)
            | Self::Structure(_) => ExprType::Object,
        }
    }

    /// Type of the elements for arrays and dictionaries.
    pub fn element_type(&self) -> Option<ExprType> {
        match self {
            Self::Array(s) | Self::Dictionary(s) => Some(s.element_type),
            _ => None,
        }
    }

    /// Structure describing the elements of arrays and dictionaries of
    /// structures.
    pub fn element_structure(&self) -> Option<&Rc<Symbol>> {
        match self {
            Self::Array(s) | Self::Dictionary(s) => s.structure.as_ref(),
            _ => None,
        }
    }

    pub fn overloads(&self) -> &[FuncSignature] {
        match self {
            Self::Function(f) => f.overloads.as_slice(),
            _ => &[],
        }
    }

    /// Attributes of a structure, in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &Rc<Symbol>> {
        let attrs = match self {
            Self::Structure(s) => Some(s.attributes.values()),
            _ => None,
        };
        attrs.into_iter().flatten()
    }

    #[inline]
    pub fn is_structure(&self) -> bool {
        matches!(self, Self::Structure(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    #[inline]
    pub fn is_dictionary(&self) -> bool {
        matches!(self, Self::Dictionary(_))
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    /// Returns a copy of this symbol under a different name. Used for loop
    /// variables that iterate over arrays of structures.
    pub(crate) fn renamed<N: Into<String>>(&self, name: N) -> Symbol {
        let mut symbol = self.clone();
        let name = name.into();
        match &mut symbol {
            Self::Value(s) => s.name = name,
            Self::Array(s) | Self::Dictionary(s) => s.name = name,
            Self::Function(s) => s.name = name,
            Self::Structure(s) => s.name = name,
        }
        symbol
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(s) => write!(f, "{}: {:?}", s.name, s.ty),
            Self::Array(s) => {
                write!(f, "{}: array<{:?}>", s.name, s.element_type)
            }
            Self::Dictionary(s) => {
                write!(f, "{}: dictionary<{:?}>", s.name, s.element_type)
            }
            Self::Function(s) => write!(f, "{}: function", s.name),
            Self::Structure(s) => write!(f, "{}: struct", s.name),
        }
    }
}

impl Debug for StructureSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureSymbol")
            .field("name", &self.name)
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SymbolLookup for Symbol {
    fn lookup(&self, ident: &str) -> Option<Rc<Symbol>> {
        match self {
            Self::Structure(s) => s.attributes.get(ident).cloned(),
            _ => None,
        }
    }
}

/// Implements [`SymbolLookup`] for `Option<Rc<Symbol>>` so that lookup
/// operations can be chained.
///
/// For example, you can do:
///
/// ```text
/// module.lookup("rich_signature").lookup("version")
/// ```
impl SymbolLookup for Option<Rc<Symbol>> {
    fn lookup(&self, ident: &str) -> Option<Rc<Symbol>> {
        self.as_ref().and_then(|symbol| symbol.lookup(ident))
    }
}

/// A map from identifiers to symbols.
#[derive(Default, Debug, Clone)]
pub struct SymbolTable {
    map: FxHashMap<String, Rc<Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new symbol into the table, keyed by its own name.
    ///
    /// If the symbol was already in the table it gets updated and the old
    /// value is returned.
    pub fn insert(&mut self, symbol: Rc<Symbol>) -> Option<Rc<Symbol>> {
        self.map.insert(symbol.name().to_string(), symbol)
    }

    #[inline]
    pub fn contains<I: AsRef<str>>(&self, ident: I) -> bool {
        self.map.contains_key(ident.as_ref())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl SymbolLookup for SymbolTable {
    fn lookup(&self, ident: &str) -> Option<Rc<Symbol>> {
        self.map.get(ident).cloned()
    }
}

/// A set of stacked symbol tables.
///
/// The `lookup` operation is performed first on the symbol table at the top
/// of the stack, and if the symbol is not found, it keeps going down the
/// stack until the symbol is found or the bottom is reached.
#[derive(Default, Debug)]
pub(crate) struct StackedSymbolTable {
    stack: Vec<SymbolTable>,
}

impl StackedSymbolTable {
    pub fn push(&mut self, table: SymbolTable) {
        self.stack.push(table)
    }

    pub fn pop(&mut self) -> Option<SymbolTable> {
        self.stack.pop()
    }

    /// True if any table in the stack defines `ident`.
    pub fn contains(&self, ident: &str) -> bool {
        self.stack.iter().any(|t| t.contains(ident))
    }
}

impl SymbolLookup for StackedSymbolTable {
    fn lookup(&self, ident: &str) -> Option<Rc<Symbol>> {
        self.stack.iter().rev().find_map(|t| t.lookup(ident))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::{StackedSymbolTable, Symbol, SymbolLookup, SymbolTable};
    use crate::types::ExprType;

    #[test]
    fn stacked_lookup() {
        let mut outer = SymbolTable::new();
        outer.insert(Rc::new(Symbol::value("i", ExprType::Int)));
        outer.insert(Rc::new(Symbol::value("s", ExprType::String)));

        let mut inner = SymbolTable::new();
        inner.insert(Rc::new(Symbol::value("i", ExprType::Float)));

        let mut stack = StackedSymbolTable::default();
        stack.push(outer);
        stack.push(inner);

        assert_eq!(stack.lookup("i").unwrap().data_type(), ExprType::Float);
        assert_eq!(stack.lookup("s").unwrap().data_type(), ExprType::String);
        assert!(stack.lookup("x").is_none());

        stack.pop();
        assert_eq!(stack.lookup("i").unwrap().data_type(), ExprType::Int);
    }
}
