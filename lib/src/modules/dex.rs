use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.strings(&[
        "DEX_FILE_MAGIC_035",
        "DEX_FILE_MAGIC_036",
        "DEX_FILE_MAGIC_037",
        "DEX_FILE_MAGIC_038",
        "DEX_FILE_MAGIC_039",
    ]);
    m.ints(&[
        "ENDIAN_CONSTANT",
        "REVERSE_ENDIAN_CONSTANT",
        "NO_INDEX",
        "ACC_PUBLIC",
        "ACC_PRIVATE",
        "ACC_PROTECTED",
        "ACC_STATIC",
        "ACC_FINAL",
        "ACC_SYNCHRONIZED",
        "ACC_NATIVE",
        "ACC_INTERFACE",
        "ACC_ABSTRACT",
        "ACC_CONSTRUCTOR",
    ]);

    m.structure("header", |h| {
        h.strings(&["magic", "signature"]);
        h.ints(&[
            "checksum",
            "file_size",
            "header_size",
            "endian_tag",
            "link_size",
            "link_offset",
            "map_offset",
            "string_ids_size",
            "string_ids_offset",
            "type_ids_size",
            "type_ids_offset",
            "proto_ids_size",
            "proto_ids_offset",
            "field_ids_size",
            "field_ids_offset",
            "method_ids_size",
            "method_ids_offset",
            "class_defs_size",
            "class_defs_offset",
            "data_size",
            "data_offset",
        ]);
    });

    m.array_of("string_ids", |s| {
        s.ints(&["offset", "size"]);
        s.string("value");
    });

    m.array_of("method_ids", |s| {
        s.ints(&["class_idx", "proto_idx", "name_idx"]);
    });

    m.array_of("class_defs", |c| {
        c.ints(&[
            "class_idx",
            "access_flags",
            "super_idx",
            "interfaces_offset",
            "source_file_idx",
            "annotations_offset",
            "class_data_offset",
            "static_values_offset",
        ]);
    });

    m.array_of("method", |s| {
        s.strings(&["class_name", "method_name"]);
        s.ints(&["access_flags", "code_off"]);
    });

    m.int("number_of_methods");

    m.function("has_method", &["@s@i", "@ss@i", "@r@i", "@rr@i"]);
    m.function("has_class", &["@s@i", "@r@i"]);
}
