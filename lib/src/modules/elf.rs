use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.ints(&["ET_NONE", "ET_REL", "ET_EXEC", "ET_DYN", "ET_CORE"]);

    m.ints(&[
        "EM_NONE",
        "EM_M32",
        "EM_SPARC",
        "EM_386",
        "EM_68K",
        "EM_88K",
        "EM_860",
        "EM_MIPS",
        "EM_MIPS_RS3_LE",
        "EM_PPC",
        "EM_PPC64",
        "EM_ARM",
        "EM_X86_64",
        "EM_AARCH64",
    ]);

    m.ints(&[
        "SHT_NULL",
        "SHT_PROGBITS",
        "SHT_SYMTAB",
        "SHT_STRTAB",
        "SHT_RELA",
        "SHT_HASH",
        "SHT_DYNAMIC",
        "SHT_NOTE",
        "SHT_NOBITS",
        "SHT_REL",
        "SHT_SHLIB",
        "SHT_DYNSYM",
        "SHF_WRITE",
        "SHF_ALLOC",
        "SHF_EXECINSTR",
    ]);

    m.ints(&[
        "PT_NULL",
        "PT_LOAD",
        "PT_DYNAMIC",
        "PT_INTERP",
        "PT_NOTE",
        "PT_SHLIB",
        "PT_PHDR",
        "PT_TLS",
        "PT_GNU_EH_FRAME",
        "PT_GNU_STACK",
        "PF_X",
        "PF_W",
        "PF_R",
    ]);

    m.ints(&[
        "STT_NOTYPE",
        "STT_OBJECT",
        "STT_FUNC",
        "STT_SECTION",
        "STT_FILE",
        "STT_COMMON",
        "STT_TLS",
        "STB_LOCAL",
        "STB_GLOBAL",
        "STB_WEAK",
    ]);

    m.ints(&[
        "type",
        "machine",
        "entry_point",
        "number_of_sections",
        "sh_offset",
        "sh_entry_size",
        "number_of_segments",
        "ph_offset",
        "ph_entry_size",
        "dynamic_section_entries",
        "symtab_entries",
        "dynsym_entries",
    ]);

    m.array_of("sections", |s| {
        s.ints(&["type", "flags", "address", "size", "offset"]);
        s.string("name");
    });

    m.array_of("segments", |s| {
        s.ints(&[
            "type",
            "flags",
            "offset",
            "virtual_address",
            "physical_address",
            "file_size",
            "memory_size",
            "alignment",
        ]);
    });

    m.array_of("dynamic", |d| {
        d.ints(&["type", "val"]);
    });

    for table in ["symtab", "dynsym"] {
        m.array_of(table, |s| {
            s.string("name");
            s.ints(&["value", "size", "type", "bind", "shndx", "visibility"]);
        });
    }

    m.function("telfhash", &["@@s"]);
    m.function("import_md5", &["@@s"]);
}
