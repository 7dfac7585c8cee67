use crate::types::ExprType;

use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.strings(&["file_name", "file_type", "detection"]);
    m.ints(&["file_size", "is_signed"]);
    m.array("source_urls", ExprType::String);
    m.dictionary("attributes", ExprType::String);

    m.structure("exif", |e| {
        e.strings(&["author", "company", "description", "product"]);
        e.ints(&["width", "height"]);
    });

    m.function("has_attribute", &["@s@i"]);
}
