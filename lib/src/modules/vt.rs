use std::rc::Rc;

use crate::symbols::{IterableSymbol, Symbol};
use crate::types::ExprType;

/// Global identifiers that VirusTotal makes available to every rule,
/// without importing any module.
pub(crate) fn virus_total_symbols() -> Vec<Rc<Symbol>> {
    let values = [
        ("new_file", ExprType::Bool),
        ("positives", ExprType::Int),
        ("submissions", ExprType::Int),
        ("file_type", ExprType::String),
        ("file_name", ExprType::String),
        ("signatures", ExprType::String),
        ("first_submitted", ExprType::Int),
        ("last_submitted", ExprType::Int),
    ];

    let mut symbols: Vec<Rc<Symbol>> = values
        .into_iter()
        .map(|(name, ty)| Rc::new(Symbol::value(name, ty)))
        .collect();

    for name in ["tags"] {
        symbols.push(Rc::new(Symbol::Array(IterableSymbol {
            name: name.to_string(),
            element_type: ExprType::String,
            structure: None,
        })));
    }

    symbols
}
