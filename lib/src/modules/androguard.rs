use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.strings(&[
        "package_name",
        "app_name",
        "main_activity",
        "displayed_version",
    ]);

    m.ints(&[
        "min_sdk",
        "max_sdk",
        "target_sdk",
        "effective_target_sdk",
        "permissions_number",
        "signature_present",
    ]);

    m.ints(&["LOW", "MEDIUM", "HIGH", "CRITICAL"]);

    m.function("activity", &["@s@i", "@r@i"]);
    m.function("permission", &["@s@i", "@r@i"]);
    m.function("service", &["@s@i", "@r@i"]);
    m.function("receiver", &["@s@i", "@r@i"]);
    m.function("provider", &["@s@i", "@r@i"]);
    m.function("filter", &["@s@i", "@r@i"]);
    m.function("url", &["@s@i", "@r@i"]);
    m.function("functionality", &["@s@i", "@r@i"]);
    m.function("new_permission", &["@s@i", "@r@i"]);
    m.function("is_signed", &["@@i"]);

    m.structure("certificate", |c| {
        c.strings(&["sha1", "issuer", "subject", "not_before", "not_after"]);
        c.function("subject", &["@s@i", "@r@i"]);
        c.function("issuer", &["@s@i", "@r@i"]);
    });

    m.array_of("signature", |s| {
        s.strings(&["hits", "names"]);
    });

    m.structure("risk", |r| {
        r.ints(&["score", "level"]);
    });
}
