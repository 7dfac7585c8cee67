use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.function("now", &["@@i"]);
}
