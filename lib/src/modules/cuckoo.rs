use super::{ImportFeatures, StructBuilder};

pub(super) fn declare(m: &mut StructBuilder) {
    m.structure("network", |n| {
        n.function("dns_lookup", &["@r@i"]);
        n.function("http_request", &["@r@i"]);
        n.function("http_user_agent", &["@r@i"]);
        n.function("host", &["@r@i"]);
        n.function("tcp", &["@ri@i"]);
        n.function("udp", &["@ri@i"]);
        n.only(ImportFeatures::VIRUS_TOTAL_ONLY, |vt| {
            vt.function("http_post", &["@r@i"]);
            vt.function("http_request_body", &["@r@i"]);
            vt.function("http_response_body", &["@r@i"]);
        });
        n.only(ImportFeatures::DEPRECATED, |d| {
            d.function("http_get", &["@r@i"]);
        });
    });

    m.structure("registry", |r| {
        r.function("key_access", &["@r@i"]);
        r.only(ImportFeatures::VIRUS_TOTAL_ONLY, |vt| {
            vt.function("key_create", &["@r@i"]);
            vt.function("key_delete", &["@r@i"]);
            vt.function("key_read", &["@r@i"]);
            vt.function("key_write", &["@r@i"]);
            vt.function("key_value_access", &["@rr@i"]);
        });
    });

    m.structure("filesystem", |f| {
        f.function("file_access", &["@r@i"]);
        f.only(ImportFeatures::VIRUS_TOTAL_ONLY, |vt| {
            vt.function("file_copy", &["@rr@i"]);
            vt.function("file_delete", &["@r@i"]);
            vt.function("file_move", &["@rr@i"]);
            vt.function("file_open", &["@r@i"]);
            vt.function("file_read", &["@r@i"]);
            vt.function("file_write", &["@r@i"]);
        });
    });

    m.structure("sync", |s| {
        s.function("mutex", &["@r@i"]);
        s.only(ImportFeatures::VIRUS_TOTAL_ONLY, |vt| {
            vt.function("mutex_create", &["@r@i"]);
            vt.function("mutex_open", &["@r@i"]);
        });
    });

    m.only(ImportFeatures::VIRUS_TOTAL_ONLY, |vt| {
        vt.structure("process", |p| {
            p.function("executed_command", &["@r@i"]);
            p.function("api_call", &["@r@i"]);
            p.function("created_service", &["@r@i"]);
            p.function("started_service", &["@r@i"]);
            p.function("terminated_process", &["@r@i"]);
        });
        vt.structure("signature", |s| {
            s.function("name", &["@r@i"]);
        });
    });
}
