use crate::types::ExprType;

use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.ints(&[
        "is_dotnet",
        "number_of_streams",
        "number_of_guids",
        "number_of_resources",
        "number_of_user_strings",
        "number_of_modulerefs",
        "number_of_assembly_refs",
        "number_of_classes",
        "number_of_field_offsets",
        "typelib",
    ]);

    m.strings(&["version", "module_name"]);

    m.array("guids", ExprType::String);
    m.array("user_strings", ExprType::String);
    m.array("modulerefs", ExprType::String);
    m.array("field_offsets", ExprType::Int);

    m.array_of("streams", |s| {
        s.string("name");
        s.ints(&["offset", "size"]);
    });

    m.array_of("resources", |r| {
        r.ints(&["offset", "length"]);
        r.string("name");
    });

    m.structure("assembly", |a| {
        a.strings(&["name", "culture"]);
        a.structure("version", |v| {
            v.ints(&["major", "minor", "build_number", "revision_number"]);
        });
    });

    m.array_of("assembly_refs", |a| {
        a.strings(&["name", "public_key_or_token"]);
        a.structure("version", |v| {
            v.ints(&["major", "minor", "build_number", "revision_number"]);
        });
    });

    m.array_of("classes", |c| {
        c.strings(&["fullname", "name", "namespace", "visibility", "type"]);
        c.ints(&[
            "abstract",
            "sealed",
            "number_of_generic_parameters",
            "number_of_base_types",
            "number_of_methods",
        ]);
        c.array("generic_parameters", ExprType::String);
        c.array("base_types", ExprType::String);
        c.array_of("methods", |m| {
            m.strings(&["name", "visibility", "return_type"]);
            m.ints(&[
                "abstract",
                "final",
                "virtual",
                "static",
                "number_of_parameters",
                "number_of_generic_parameters",
            ]);
            m.array("generic_parameters", ExprType::String);
            m.array_of("parameters", |p| {
                p.strings(&["name", "type"]);
            });
        });
    });
}
