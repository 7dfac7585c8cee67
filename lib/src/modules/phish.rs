use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.strings(&["url", "domain", "title"]);
    m.ints(&["number_of_forms", "number_of_links", "has_password_field"]);

    m.array_of("forms", |f| {
        f.strings(&["action", "method"]);
        f.int("number_of_inputs");
    });

    m.function("brand", &["@s@i", "@r@i"]);
    m.function("link", &["@r@i"]);
}
