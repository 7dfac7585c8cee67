use crate::types::ExprType;

use super::{ImportFeatures, StructBuilder};

pub(super) fn declare(m: &mut StructBuilder) {
    m.ints(&[
        "MACHINE_UNKNOWN",
        "MACHINE_AM33",
        "MACHINE_AMD64",
        "MACHINE_ARM",
        "MACHINE_ARMNT",
        "MACHINE_ARM64",
        "MACHINE_EBC",
        "MACHINE_I386",
        "MACHINE_IA64",
        "MACHINE_M32R",
        "MACHINE_MIPS16",
        "MACHINE_MIPSFPU",
        "MACHINE_MIPSFPU16",
        "MACHINE_POWERPC",
        "MACHINE_POWERPCFP",
        "MACHINE_R4000",
        "MACHINE_SH3",
        "MACHINE_SH3DSP",
        "MACHINE_SH4",
        "MACHINE_SH5",
        "MACHINE_THUMB",
        "MACHINE_WCEMIPSV2",
    ]);

    m.ints(&[
        "SUBSYSTEM_UNKNOWN",
        "SUBSYSTEM_NATIVE",
        "SUBSYSTEM_WINDOWS_GUI",
        "SUBSYSTEM_WINDOWS_CUI",
        "SUBSYSTEM_OS2_CUI",
        "SUBSYSTEM_POSIX_CUI",
        "SUBSYSTEM_NATIVE_WINDOWS",
        "SUBSYSTEM_WINDOWS_CE_GUI",
        "SUBSYSTEM_EFI_APPLICATION",
        "SUBSYSTEM_EFI_BOOT_SERVICE_DRIVER",
        "SUBSYSTEM_EFI_RUNTIME_DRIVER",
        "SUBSYSTEM_EFI_ROM_IMAGE",
        "SUBSYSTEM_XBOX",
        "SUBSYSTEM_WINDOWS_BOOT_APPLICATION",
    ]);

    m.ints(&[
        "RELOCS_STRIPPED",
        "EXECUTABLE_IMAGE",
        "LINE_NUMS_STRIPPED",
        "LOCAL_SYMS_STRIPPED",
        "AGGRESIVE_WS_TRIM",
        "LARGE_ADDRESS_AWARE",
        "BYTES_REVERSED_LO",
        "MACHINE_32BIT",
        "DEBUG_STRIPPED",
        "REMOVABLE_RUN_FROM_SWAP",
        "NET_RUN_FROM_SWAP",
        "SYSTEM",
        "DLL",
        "UP_SYSTEM_ONLY",
        "BYTES_REVERSED_HI",
    ]);

    m.ints(&[
        "HIGH_ENTROPY_VA",
        "DYNAMIC_BASE",
        "FORCE_INTEGRITY",
        "NX_COMPAT",
        "NO_ISOLATION",
        "NO_SEH",
        "NO_BIND",
        "APPCONTAINER",
        "WDM_DRIVER",
        "GUARD_CF",
        "TERMINAL_SERVER_AWARE",
    ]);

    m.ints(&[
        "IMAGE_DIRECTORY_ENTRY_EXPORT",
        "IMAGE_DIRECTORY_ENTRY_IMPORT",
        "IMAGE_DIRECTORY_ENTRY_RESOURCE",
        "IMAGE_DIRECTORY_ENTRY_EXCEPTION",
        "IMAGE_DIRECTORY_ENTRY_SECURITY",
        "IMAGE_DIRECTORY_ENTRY_BASERELOC",
        "IMAGE_DIRECTORY_ENTRY_DEBUG",
        "IMAGE_DIRECTORY_ENTRY_ARCHITECTURE",
        "IMAGE_DIRECTORY_ENTRY_GLOBALPTR",
        "IMAGE_DIRECTORY_ENTRY_TLS",
        "IMAGE_DIRECTORY_ENTRY_LOAD_CONFIG",
        "IMAGE_DIRECTORY_ENTRY_BOUND_IMPORT",
        "IMAGE_DIRECTORY_ENTRY_IAT",
        "IMAGE_DIRECTORY_ENTRY_DELAY_IMPORT",
        "IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR",
    ]);

    m.ints(&[
        "SECTION_NO_PAD",
        "SECTION_CNT_CODE",
        "SECTION_CNT_INITIALIZED_DATA",
        "SECTION_CNT_UNINITIALIZED_DATA",
        "SECTION_LNK_OTHER",
        "SECTION_LNK_INFO",
        "SECTION_LNK_REMOVE",
        "SECTION_LNK_COMDAT",
        "SECTION_GPREL",
        "SECTION_MEM_PURGEABLE",
        "SECTION_MEM_LOCKED",
        "SECTION_MEM_PRELOAD",
        "SECTION_LNK_NRELOC_OVFL",
        "SECTION_MEM_DISCARDABLE",
        "SECTION_MEM_NOT_CACHED",
        "SECTION_MEM_NOT_PAGED",
        "SECTION_MEM_SHARED",
        "SECTION_MEM_EXECUTE",
        "SECTION_MEM_READ",
        "SECTION_MEM_WRITE",
    ]);

    m.ints(&[
        "RESOURCE_TYPE_CURSOR",
        "RESOURCE_TYPE_BITMAP",
        "RESOURCE_TYPE_ICON",
        "RESOURCE_TYPE_MENU",
        "RESOURCE_TYPE_DIALOG",
        "RESOURCE_TYPE_STRING",
        "RESOURCE_TYPE_FONTDIR",
        "RESOURCE_TYPE_FONT",
        "RESOURCE_TYPE_ACCELERATOR",
        "RESOURCE_TYPE_RCDATA",
        "RESOURCE_TYPE_MESSAGETABLE",
        "RESOURCE_TYPE_GROUP_CURSOR",
        "RESOURCE_TYPE_GROUP_ICON",
        "RESOURCE_TYPE_VERSION",
        "RESOURCE_TYPE_DLGINCLUDE",
        "RESOURCE_TYPE_PLUGPLAY",
        "RESOURCE_TYPE_VXD",
        "RESOURCE_TYPE_ANICURSOR",
        "RESOURCE_TYPE_ANIICON",
        "RESOURCE_TYPE_HTML",
        "RESOURCE_TYPE_MANIFEST",
    ]);

    m.ints(&[
        "is_pe",
        "machine",
        "number_of_sections",
        "timestamp",
        "pointer_to_symbol_table",
        "number_of_symbols",
        "size_of_optional_header",
        "characteristics",
        "entry_point",
        "entry_point_raw",
        "image_base",
        "number_of_rva_and_sizes",
        "number_of_resources",
        "number_of_version_infos",
        "win32_version_value",
        "size_of_image",
        "size_of_headers",
        "checksum",
        "subsystem",
        "dll_characteristics",
        "size_of_stack_reserve",
        "size_of_stack_commit",
        "size_of_heap_reserve",
        "size_of_heap_commit",
        "loader_flags",
        "opthdr_magic",
        "size_of_code",
        "size_of_initialized_data",
        "size_of_uninitialized_data",
        "base_of_code",
        "base_of_data",
        "section_alignment",
        "file_alignment",
        "export_timestamp",
        "resource_timestamp",
        "number_of_imports",
        "number_of_imported_functions",
        "number_of_delayed_imports",
        "number_of_delayed_imported_functions",
        "number_of_exports",
        "number_of_signatures",
    ]);

    m.strings(&["dll_name", "pdb_path"]);

    for version in [
        "linker_version",
        "os_version",
        "image_version",
        "subsystem_version",
        "resource_version",
    ] {
        m.structure(version, |v| {
            v.ints(&["major", "minor"]);
        });
    }

    m.structure("overlay", |o| {
        o.ints(&["offset", "size"]);
    });

    m.structure("rich_signature", |r| {
        r.ints(&["offset", "length", "key"]);
        r.strings(&["raw_data", "clear_data"]);
        r.function("version", &["@i@i", "@ii@i"]);
        r.function("toolid", &["@i@i", "@ii@i"]);
    });

    m.array_of("data_directories", |d| {
        d.ints(&["virtual_address", "size"]);
    });

    m.array_of("sections", |s| {
        s.strings(&["name", "full_name"]);
        s.ints(&[
            "characteristics",
            "virtual_address",
            "virtual_size",
            "raw_data_offset",
            "raw_data_size",
            "pointer_to_relocations",
            "pointer_to_line_numbers",
            "number_of_relocations",
            "number_of_line_numbers",
        ]);
    });

    m.array_of("resources", |r| {
        r.ints(&["rva", "offset", "length", "type", "id", "language"]);
        r.strings(&["type_string", "name_string", "language_string"]);
    });

    m.dictionary("version_info", ExprType::String);

    m.array_of("version_info_list", |v| {
        v.strings(&["key", "value"]);
    });

    m.array_of("import_details", |i| {
        i.string("library_name");
        i.int("number_of_functions");
        i.array_of("functions", |f| {
            f.string("name");
            f.ints(&["ordinal", "rva"]);
        });
    });

    m.array_of("delayed_import_details", |i| {
        i.string("library_name");
        i.int("number_of_functions");
        i.array_of("functions", |f| {
            f.string("name");
            f.ints(&["ordinal", "rva"]);
        });
    });

    m.array_of("export_details", |e| {
        e.ints(&["offset", "ordinal", "rva"]);
        e.strings(&["name", "forward_name"]);
    });

    m.array_of("signatures", |s| {
        s.strings(&[
            "thumbprint",
            "issuer",
            "subject",
            "algorithm",
            "algorithm_oid",
            "serial",
        ]);
        s.ints(&["version", "not_before", "not_after"]);
        s.function("valid_on", &["@i@i"]);
    });

    m.function("exports", &["@s@i", "@i@i", "@r@i"]);
    m.function("exports_index", &["@s@i", "@i@i", "@r@i"]);
    m.function("imports", &["@ss@i", "@si@i", "@s@i", "@rr@i"]);
    m.function("imports", &["@iss@i", "@isi@i", "@is@i", "@irr@i"]);
    m.function("locale", &["@i@i"]);
    m.function("language", &["@i@i"]);
    m.function("is_dll", &["@@i"]);
    m.function("is_32bit", &["@@i"]);
    m.function("is_64bit", &["@@i"]);
    m.function("section_index", &["@s@i", "@i@i"]);
    m.function("rva_to_offset", &["@i@i"]);
    m.function("calculate_checksum", &["@@i"]);
    m.function("imphash", &["@@s"]);

    m.only(ImportFeatures::AVAST_ONLY, |a| {
        a.function("iconhash", &["@@s"]);
        a.function("exphash", &["@@s"]);
    });
}
