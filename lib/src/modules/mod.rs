/*! Modules that can be imported from YARA rules.

Modules are the only way of extending the set of identifiers that rule
conditions can use. This crate doesn't scan files, so a module here is just
the description of the symbols it exposes: values, arrays, dictionaries,
structures and functions, together with their types.

Which modules and which of their attributes are visible depends on the
[`ImportFeatures`] requested for the parse. For instance, `androguard` is
available only with Avast features enabled, and some `cuckoo` attributes
are specific to VirusTotal.
 */

use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::debug;
use rustc_hash::FxHashMap;

use crate::symbols::{
    FunctionSymbol, IterableSymbol, StructureSymbol, Symbol,
};
use crate::types::{ExprType, FuncSignature};

mod androguard;
mod cuckoo;
mod dex;
mod dotnet;
mod elf;
mod hash;
mod macho;
mod magic;
mod math;
mod metadata;
mod pe;
mod phish;
mod time;
mod vt;

pub(crate) use vt::virus_total_symbols;

#[cfg(test)]
mod tests;

bitflags! {
    /// Selects which optional modules and symbols are visible.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ImportFeatures: u32 {
        /// Everything that is part of upstream YARA.
        const BASIC = 0x01;
        /// Symbols that exist only in Avast's fork of YARA.
        const AVAST_ONLY = 0x02;
        /// Symbols that exist only in VirusTotal.
        const VIRUS_TOTAL_ONLY = 0x04;
        /// Symbols that were removed but can still be enabled.
        const DEPRECATED = 0x08;

        const AVAST = Self::BASIC.bits() | Self::AVAST_ONLY.bits();
        const VIRUS_TOTAL = Self::BASIC.bits() | Self::VIRUS_TOTAL_ONLY.bits();
        const ALL_CURRENT = Self::AVAST.bits() | Self::VIRUS_TOTAL_ONLY.bits();
        const EVERYTHING = Self::ALL_CURRENT.bits() | Self::DEPRECATED.bits();
    }
}

impl Default for ImportFeatures {
    fn default() -> Self {
        Self::ALL_CURRENT
    }
}

/// A module loaded for a given set of [`ImportFeatures`].
#[derive(Debug)]
pub struct Module {
    name: &'static str,
    features: ImportFeatures,
    structure: Rc<Symbol>,
}

impl Module {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Features under which the module can be imported.
    #[inline]
    pub fn features(&self) -> ImportFeatures {
        self.features
    }

    /// Structure symbol holding every attribute of the module.
    #[inline]
    pub fn structure(&self) -> &Rc<Symbol> {
        &self.structure
    }
}

/// Static description of a module in the registry.
struct ModuleDescriptor {
    features: ImportFeatures,
    declare: fn(&mut StructBuilder),
}

lazy_static! {
    static ref BUILTIN_MODULES: IndexMap<&'static str, ModuleDescriptor> = {
        let mut modules = IndexMap::new();
        let mut add = |name: &'static str,
                       features: ImportFeatures,
                       declare: fn(&mut StructBuilder)| {
            modules.insert(name, ModuleDescriptor { features, declare });
        };
        add("androguard", ImportFeatures::AVAST_ONLY, androguard::declare);
        add("cuckoo", ImportFeatures::BASIC, cuckoo::declare);
        add("dex", ImportFeatures::BASIC, dex::declare);
        add("dotnet", ImportFeatures::BASIC, dotnet::declare);
        add("elf", ImportFeatures::BASIC, elf::declare);
        add("hash", ImportFeatures::BASIC, hash::declare);
        add("macho", ImportFeatures::BASIC, macho::declare);
        add("magic", ImportFeatures::BASIC, magic::declare);
        add("math", ImportFeatures::BASIC, math::declare);
        add("metadata", ImportFeatures::AVAST_ONLY, metadata::declare);
        add("pe", ImportFeatures::BASIC, pe::declare);
        add("phish", ImportFeatures::AVAST_ONLY, phish::declare);
        add("time", ImportFeatures::BASIC, time::declare);
        modules
    };
}

/// Returns the names of every module known to this crate, regardless of the
/// features needed for importing them.
pub fn known_modules() -> impl Iterator<Item = &'static str> {
    BUILTIN_MODULES.keys().copied()
}

/// Loads modules on demand and keeps them for later use.
///
/// A pool is tied to a set of features. Loading a module with different
/// features discards every module loaded so far, as their attributes may be
/// different.
#[derive(Debug, Default)]
pub struct ModulesPool {
    features: ImportFeatures,
    loaded: FxHashMap<&'static str, Rc<Module>>,
}

impl ModulesPool {
    pub fn new(features: ImportFeatures) -> Self {
        Self { features, loaded: FxHashMap::default() }
    }

    #[inline]
    pub fn features(&self) -> ImportFeatures {
        self.features
    }

    /// Returns the module with the given name if it exists and is available
    /// under `features`.
    pub fn load(
        &mut self,
        name: &str,
        features: ImportFeatures,
    ) -> Option<Rc<Module>> {
        if features != self.features {
            self.loaded.clear();
            self.features = features;
        }

        let (&name, descriptor) = BUILTIN_MODULES.get_key_value(name)?;

        if !descriptor.features.intersects(features) {
            return None;
        }

        if let Some(module) = self.loaded.get(name) {
            return Some(module.clone());
        }

        debug!("initializing module `{}` with features {:?}", name, features);

        let mut builder = StructBuilder::new(name, features);
        (descriptor.declare)(&mut builder);

        let module = Rc::new(Module {
            name,
            features: descriptor.features,
            structure: Rc::new(builder.build()),
        });

        self.loaded.insert(name, module.clone());
        Some(module)
    }
}

/// Helper for declaring the symbols exposed by a module.
///
/// Attributes declared inside [`StructBuilder::only`] are added only when
/// the features the module is being loaded with intersect the given ones.
pub(crate) struct StructBuilder {
    name: String,
    features: ImportFeatures,
    attributes: IndexMap<String, Rc<Symbol>>,
}

impl StructBuilder {
    pub fn new<N: Into<String>>(name: N, features: ImportFeatures) -> Self {
        Self { name: name.into(), features, attributes: IndexMap::new() }
    }

    fn insert(&mut self, symbol: Symbol) -> &mut Self {
        self.attributes.insert(symbol.name().to_string(), Rc::new(symbol));
        self
    }

    pub fn value(&mut self, name: &str, ty: ExprType) -> &mut Self {
        self.insert(Symbol::value(name, ty))
    }

    pub fn int(&mut self, name: &str) -> &mut Self {
        self.value(name, ExprType::Int)
    }

    pub fn string(&mut self, name: &str) -> &mut Self {
        self.value(name, ExprType::String)
    }

    /// Declares many integer values at once, typically constants.
    pub fn ints(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.int(name);
        }
        self
    }

    pub fn strings(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.string(name);
        }
        self
    }

    /// Declares a function, `signatures` are the mangled names without the
    /// function name, like `@ii@s`. Declaring a function that already
    /// exists adds new overloads to it.
    pub fn function(&mut self, name: &str, signatures: &[&str]) -> &mut Self {
        let mut overloads = match self.attributes.get(name).map(|s| &**s) {
            Some(Symbol::Function(f)) => f.overloads.clone(),
            _ => Vec::new(),
        };
        for signature in signatures {
            let signature = FuncSignature::from(format!("{name}{signature}"));
            if let Err(pos) = overloads.binary_search(&signature) {
                overloads.insert(pos, signature);
            }
        }
        self.insert(Symbol::Function(FunctionSymbol {
            name: name.to_string(),
            overloads,
        }))
    }

    pub fn array(&mut self, name: &str, element_type: ExprType) -> &mut Self {
        self.insert(Symbol::Array(IterableSymbol {
            name: name.to_string(),
            element_type,
            structure: None,
        }))
    }

    pub fn dictionary(
        &mut self,
        name: &str,
        element_type: ExprType,
    ) -> &mut Self {
        self.insert(Symbol::Dictionary(IterableSymbol {
            name: name.to_string(),
            element_type,
            structure: None,
        }))
    }

    /// Declares an array of structures.
    pub fn array_of<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut StructBuilder),
    {
        let structure = self.nested(name, f);
        self.insert(Symbol::Array(IterableSymbol {
            name: name.to_string(),
            element_type: ExprType::Object,
            structure: Some(Rc::new(structure)),
        }))
    }

    pub fn structure<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: FnOnce(&mut StructBuilder),
    {
        let structure = self.nested(name, f);
        self.insert(structure)
    }

    /// Declares the attributes added by `f` only if the module is being
    /// loaded with any of the given features.
    pub fn only<F>(&mut self, features: ImportFeatures, f: F) -> &mut Self
    where
        F: FnOnce(&mut StructBuilder),
    {
        if self.features.intersects(features) {
            f(self);
        }
        self
    }

    fn nested<F>(&self, name: &str, f: F) -> Symbol
    where
        F: FnOnce(&mut StructBuilder),
    {
        let mut builder = StructBuilder::new(name, self.features);
        f(&mut builder);
        builder.build()
    }

    pub fn build(self) -> Symbol {
        Symbol::Structure(StructureSymbol {
            name: self.name,
            attributes: self.attributes,
        })
    }
}
