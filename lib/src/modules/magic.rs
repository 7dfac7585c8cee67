use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.function("type", &["@@s"]);
    m.function("mime_type", &["@@s"]);
}
