use pretty_assertions::assert_eq;

use super::{known_modules, ImportFeatures, ModulesPool};
use crate::symbols::{Symbol, SymbolLookup};
use crate::types::ExprType;

#[test]
fn registry() {
    assert_eq!(
        known_modules().collect::<Vec<_>>(),
        vec![
            "androguard",
            "cuckoo",
            "dex",
            "dotnet",
            "elf",
            "hash",
            "macho",
            "magic",
            "math",
            "metadata",
            "pe",
            "phish",
            "time"
        ]
    );
}

#[test]
fn feature_gating() {
    let mut pool = ModulesPool::default();

    assert!(pool.load("androguard", ImportFeatures::VIRUS_TOTAL).is_none());
    assert!(pool.load("androguard", ImportFeatures::AVAST).is_some());
    assert!(pool.load("androguard", ImportFeatures::ALL_CURRENT).is_some());
    assert!(pool.load("phish", ImportFeatures::BASIC).is_none());
    assert!(pool.load("pe", ImportFeatures::BASIC).is_some());
    assert!(pool.load("foo", ImportFeatures::EVERYTHING).is_none());

    let cuckoo = pool.load("cuckoo", ImportFeatures::AVAST).unwrap();
    let network = Some(cuckoo.structure().clone()).lookup("network");
    assert!(network.lookup("http_request").is_some());
    assert!(network.lookup("http_request_body").is_none());
    assert!(network.lookup("http_get").is_none());

    let cuckoo = pool.load("cuckoo", ImportFeatures::EVERYTHING).unwrap();
    let network = Some(cuckoo.structure().clone()).lookup("network");
    assert!(network.lookup("http_request_body").is_some());
    assert!(network.lookup("http_get").is_some());
}

#[test]
fn modules_are_shared() {
    let mut pool = ModulesPool::new(ImportFeatures::BASIC);
    let a = pool.load("pe", ImportFeatures::BASIC).unwrap();
    let b = pool.load("pe", ImportFeatures::BASIC).unwrap();
    assert!(std::rc::Rc::ptr_eq(&a, &b));
}

#[test]
fn nested_symbols() {
    let mut pool = ModulesPool::default();
    let pe = pool.load("pe", ImportFeatures::BASIC).unwrap();
    let pe = Some(pe.structure().clone());

    let sections = pe.lookup("sections").unwrap();
    assert!(sections.is_array());
    assert_eq!(sections.element_type(), Some(ExprType::Object));

    let section = sections.element_structure().cloned();
    assert_eq!(
        section.lookup("name").map(|s| s.data_type()),
        Some(ExprType::String)
    );

    assert_eq!(
        pe.lookup("version_info").and_then(|s| s.element_type()),
        Some(ExprType::String)
    );

    let imports = pe.lookup("imports").unwrap();
    assert!(matches!(&*imports, Symbol::Function(_)));
    assert_eq!(imports.overloads().len(), 8);
    assert_eq!(
        pe.lookup("rich_signature")
            .lookup("version")
            .unwrap()
            .overloads()
            .len(),
        2
    );
}
