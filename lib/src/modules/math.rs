use super::StructBuilder;

pub(super) fn declare(m: &mut StructBuilder) {
    m.int("MEAN_BYTES");
    m.function("entropy", &["@ii@f", "@s@f"]);
    m.function("monte_carlo_pi", &["@ii@f", "@s@f"]);
    m.function("serial_correlation", &["@ii@f", "@s@f"]);
    m.function("mean", &["@ii@f", "@s@f"]);
    m.function("deviation", &["@iif@f", "@sf@f"]);
    m.function("in_range", &["@fff@i"]);
    m.function("max", &["@ii@i"]);
    m.function("min", &["@ii@i"]);
    m.function("abs", &["@i@i"]);
    m.function("count", &["@iii@i", "@i@i"]);
    m.function("percentage", &["@iii@f", "@i@f"]);
    m.function("mode", &["@ii@i", "@@i"]);
    m.function("to_number", &["@b@i"]);
    m.function("to_string", &["@i@s", "@ii@s"]);
}
