use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    for func in ["md5", "sha1", "sha256"] {
        m.function(func, &["@ii@s", "@s@s"]);
    }
    m.function("checksum32", &["@ii@i", "@s@i"]);
    m.function("crc32", &["@ii@i", "@s@i"]);
}
