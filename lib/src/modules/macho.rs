use crate::types::ExprType;

use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.ints(&[
        "MH_MAGIC",
        "MH_CIGAM",
        "MH_MAGIC_64",
        "MH_CIGAM_64",
        "FAT_MAGIC",
        "FAT_CIGAM",
        "FAT_MAGIC_64",
        "FAT_CIGAM_64",
    ]);

    m.ints(&[
        "CPU_TYPE_MC680X0",
        "CPU_TYPE_X86",
        "CPU_TYPE_X86_64",
        "CPU_TYPE_MIPS",
        "CPU_TYPE_ARM",
        "CPU_TYPE_ARM64",
        "CPU_TYPE_SPARC",
        "CPU_TYPE_POWERPC",
        "CPU_TYPE_POWERPC64",
    ]);

    m.ints(&[
        "MH_OBJECT",
        "MH_EXECUTE",
        "MH_FVMLIB",
        "MH_CORE",
        "MH_PRELOAD",
        "MH_DYLIB",
        "MH_DYLINKER",
        "MH_BUNDLE",
        "MH_DYLIB_STUB",
        "MH_DSYM",
        "MH_KEXT_BUNDLE",
    ]);

    m.ints(&[
        "MH_NOUNDEFS",
        "MH_INCRLINK",
        "MH_DYLDLINK",
        "MH_BINDATLOAD",
        "MH_PREBOUND",
        "MH_SPLIT_SEGS",
        "MH_TWOLEVEL",
        "MH_PIE",
        "MH_NO_HEAP_EXECUTION",
    ]);

    m.ints(&[
        "magic",
        "cputype",
        "cpusubtype",
        "filetype",
        "ncmds",
        "sizeofcmds",
        "flags",
        "reserved",
        "number_of_segments",
        "entry_point",
        "stack_size",
        "nfat_arch",
    ]);

    m.strings(&["dynamic_linker", "source_version", "uuid"]);
    m.array("dylibs_names", ExprType::String);
    m.array("rpaths", ExprType::String);

    m.array_of("segments", |s| {
        s.string("segname");
        s.ints(&[
            "vmaddr", "vmsize", "fileoff", "fsize", "maxprot", "initprot",
            "nsects", "flags",
        ]);
        s.array_of("sections", |sec| {
            sec.strings(&["segname", "sectname"]);
            sec.ints(&[
                "addr", "size", "offset", "align", "reloff", "nreloc",
                "flags",
            ]);
        });
    });

    m.array_of("dylibs", |d| {
        d.string("name");
        d.ints(&["timestamp", "compatibility_version", "current_version"]);
    });

    m.array_of("fat_arch", |f| {
        f.ints(&["cputype", "cpusubtype", "offset", "size", "align"]);
    });

    m.function("file_index_for_arch", &["@i@i", "@ii@i"]);
    m.function("entry_point_for_arch", &["@i@i", "@ii@i"]);
    m.function("has_dylib", &["@s@b"]);
    m.function("has_rpath", &["@s@b"]);
    m.function("dylib_hash", &["@@s"]);
    m.function("entitlement_hash", &["@@s"]);
}
