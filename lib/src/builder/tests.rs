use pretty_assertions::assert_eq;

use crate::builder::*;
use crate::modules::ImportFeatures;
use crate::parser::ErrorInfo;

fn text(builder: YaraExpressionBuilder) -> String {
    let expr = builder.get().unwrap();
    expr.node().text(expr.tokens())
}

#[test]
fn expressions() {
    assert_eq!(
        text(string_ref("$a").and(filesize().lt(int_val(100)))),
        "$a and filesize < 100"
    );
    assert_eq!(
        text(int_function("uint16", int_val(0)).eq(hex_int_val(0x5A4D))),
        "uint16(0) == 0x5A4D"
    );
    assert_eq!(text(not(defined(id("x")))), "not defined x");
    assert_eq!(text(neg(int_val(1)).plus(bitwise_not(int_val(2)))), "-1 + ~2");
    assert_eq!(text(float_val(1.5).multiply(int_val(2))), "1.5 * 2");
    assert_eq!(text(int_val(7).divide(int_val(2))), "7 \\ 2");
    assert_eq!(
        text(string_val("a\"b").contains(string_val("b"))),
        r#""a\"b" contains "b""#
    );
    assert_eq!(
        text(
            id("pe")
                .access("sections")
                .index(int_val(0))
                .access("name")
                .matches(regexp_val(r"\.text", "i"))
        ),
        r"pe.sections[0].name matches /\.text/i"
    );
    assert_eq!(
        text(id("pe").access("exports").call(vec![string_val("Foo")])),
        r#"pe.exports("Foo")"#
    );
    assert_eq!(
        text(
            string_offset("$a", Some(int_val(1)))
                .lt(string_length("$a", None))
                .and(
                    string_count("$a")
                        .in_range(range(int_val(0), int_val(100)))
                        .gt(int_val(1))
                )
        ),
        "@a[1] < !a and #a in (0..100) > 1"
    );
    assert_eq!(
        text(
            paren(bool_val(true).or(bool_val(false)), false)
                .and(entrypoint().neq(int_val(0)))
        ),
        "(true or false) and entrypoint != 0"
    );
}

#[test]
fn string_sets() {
    assert_eq!(text(any().of(them())), "any of them");
    assert_eq!(
        text(int_val(50).percent().of(set(vec![
            string_ref("$a"),
            string_wildcard("$b")
        ]))),
        "50% of ($a, $b*)"
    );
    assert_eq!(
        text(all().of(them()).in_range(range(int_val(0), filesize()))),
        "all of them in (0..filesize)"
    );
    assert_eq!(
        text(none().of(them()).at(int_val(10))),
        "none of them at 10"
    );
    assert_eq!(text(string_ref("$a").at(entrypoint())), "$a at entrypoint");
}

#[test]
fn loops() {
    assert_eq!(
        text(for_in(
            all(),
            &["i"],
            range(int_val(0), int_val(2)),
            id("i").eq(int_val(1))
        )),
        "for all i in (0..2) : (i == 1)"
    );
    assert_eq!(
        text(for_in(
            any(),
            &["k", "v"],
            id("pe").access("version_info"),
            paren(id("k").eq(string_val("x")), false)
        )),
        r#"for any k, v in pe.version_info : (k == "x")"#
    );
    assert_eq!(
        text(for_of(any(), them(), string_ref("$").at(int_val(0)))),
        "for any of them : ($ at 0)"
    );
}

#[test]
fn expression_errors() {
    assert!(matches!(
        regexp_val("abc", "x").get(),
        Err(BuilderError::InvalidRegexp { .. })
    ));
    assert_eq!(
        bool_val(true).and(id("bad name")).get().unwrap_err(),
        BuilderError::InvalidIdentifier("bad name".to_string())
    );
    assert_eq!(
        string_count("a").get().unwrap_err(),
        BuilderError::InvalidStringIdentifier("a".to_string())
    );
    assert_eq!(
        int_val(1).at(int_val(2)).get().unwrap_err(),
        BuilderError::InvalidOperand { operation: "at", expr: "1".to_string() }
    );
    assert_eq!(
        int_function("uint64", int_val(0)).get().unwrap_err(),
        BuilderError::InvalidIdentifier("uint64".to_string())
    );
    assert!(conjunction(vec![], false).get().is_err());
}

#[test]
fn hex_strings() {
    let hex = YaraHexStringBuilder::new()
        .bytes(&[0x4d, 0x5a])
        .wildcard_low(0x0a)
        .wildcard_high(0x0b)
        .not_byte(0)
        .jump(4)
        .jump_from(1)
        .jump_any()
        .alt(vec![
            YaraHexStringBuilder::new().byte(0xff),
            YaraHexStringBuilder::new()
                .bytes(&[1, 2])
                .jump_range(2, 4)
                .byte(3),
        ])
        .get()
        .unwrap();
    assert_eq!(
        hex.node().text(hex.tokens()),
        "{ 4D 5A A? ?B ~00 [4] [1-] [-] ( FF | 01 02 [2-4] 03 ) }"
    );

    assert_eq!(
        YaraHexStringBuilder::new().jump_range(4, 2).get().unwrap_err(),
        BuilderError::InvalidHexJump { low: 4, high: 2 }
    );
    assert_eq!(
        YaraHexStringBuilder::new()
            .alt(vec![YaraHexStringBuilder::new().byte(0)])
            .get()
            .unwrap_err(),
        BuilderError::InvalidHexAlternation
    );
    assert_eq!(
        YaraHexStringBuilder::new().get().unwrap_err(),
        BuilderError::EmptyHexString
    );
}

#[test]
fn complete_file() {
    let hex = YaraHexStringBuilder::new()
        .bytes(&[0x4d, 0x5a])
        .jump_range(2, 4)
        .alt(vec![
            YaraHexStringBuilder::new().byte(0),
            YaraHexStringBuilder::new().wildcard(),
        ])
        .get()
        .unwrap();

    let condition = conjunction(
        vec![
            string_ref("$a"),
            string_ref("$h").at(int_val(0)),
            id("pe").access("number_of_sections").gt(int_val(2)),
        ],
        false,
    );

    let rule = YaraRuleBuilder::new()
        .with_name("test")
        .with_tag("sample")
        .with_comment("generated")
        .with_string_meta("author", "John \"Doe\"")
        .with_int_meta("version", 2)
        .with_hex_int_meta("flags", 0x1f)
        .with_bool_meta("ok", true)
        .with_plain_string("$a", "hello")
        .ascii()
        .wide()
        .with_hex_string("$h", hex)
        .with_regexp("$r", "ab+c", "i")
        .private()
        .with_condition(condition.get().unwrap())
        .get()
        .unwrap();

    let file = YaraFileBuilder::default()
        .with_module("pe")
        .with_rule(rule)
        .get(true)
        .unwrap();

    let expected = r#"import "pe"

rule test : sample
{ // generated
	meta:
		author = "John \"Doe\""
		version = 2
		flags = 0x1F
		ok = true
	strings:
		$a = "hello" ascii wide
		$h = { 4D 5A [2-4] ( 00 | ?? ) }
		$r = /ab+c/i private
	condition:
		$a and $h at 0 and pe.number_of_sections > 2
}
"#;
    assert_eq!(file.get_text_formatted(false), expected);
    assert!(file.has_import("pe"));
    assert_eq!(file.rules().len(), 1);
    assert_eq!(
        file.rules()[0].tags(file.tokens()),
        vec!["sample".to_string()]
    );
}

const ALPHABET: &str =
    "!@#$%^&*(){}[].,|ABCDEFGHIJ\tLMNOPQRSTUVWXYZabcdefghijklmnopqrstu";

#[test]
fn rule_modifiers_and_string_modifiers() {
    let rule = YaraRuleBuilder::new()
        .with_name("r")
        .private_rule()
        .global_rule()
        .with_plain_string("$a", "x")
        .xor_range(1, 255)
        .with_plain_string("$b", "y")
        .xor_range(3, 3)
        .with_plain_string("$c", "z")
        .base64_alphabet(ALPHABET)
        .with_plain_string("$d", "w")
        .base64wide()
        .fullword()
        .get()
        .unwrap();

    let file = YaraFileBuilder::default().with_rule(rule).get(false).unwrap();
    let expected = format!(
        "global private rule r\n{{\n\tstrings:\n\t\t$a = \"x\" xor(1-255)\n\
         \t\t$b = \"y\" xor(3)\n\t\t$c = \"z\" base64(\"{}\")\n\
         \t\t$d = \"w\" base64wide fullword\n\tcondition:\n\t\ttrue\n}}\n",
        ALPHABET.replace('\t', r"\t")
    );
    assert_eq!(file.get_text_formatted(false), expected);
}

#[test]
fn line_breaks() {
    let condition = paren(
        conjunction(vec![string_ref("$a"), string_ref("$b")], true),
        true,
    )
    .or(bool_val(false));

    let rule = YaraRuleBuilder::new()
        .with_name("r")
        .with_plain_string("$a", "a")
        .with_plain_string("$b", "b")
        .with_condition(condition.get().unwrap())
        .get()
        .unwrap();

    let file = YaraFileBuilder::default().with_rule(rule).get(true).unwrap();
    assert_eq!(
        file.get_text_formatted(false),
        "rule r\n{\n\tstrings:\n\t\t$a = \"a\"\n\t\t$b = \"b\"\n\
         \tcondition:\n\t\t(\n\t\t\t$a and\n\t\t\t$b\n\t\t) or false\n}\n"
    );
    // The plain text ignores line breaks.
    assert_eq!(
        file.get_text(),
        "rule r {\n\tstrings:\n\t\t$a = \"a\"\n\t\t$b = \"b\"\n\
         \tcondition:\n\t\t($a and $b) or false\n}"
    );
}

#[test]
fn several_rules_and_imports() {
    let mut rules = YaraRuleBuilder::new();
    let first = rules.with_name("first").get().unwrap();
    let entropy = id("math")
        .access("entropy")
        .call(vec![int_val(0), filesize()])
        .gt(float_val(7.0));
    let second = rules
        .with_name("second")
        .with_condition(id("first").and(entropy).get().unwrap())
        .get()
        .unwrap();

    let file = YaraFileBuilder::new(ImportFeatures::ALL_CURRENT)
        .with_module("pe")
        .with_module("math")
        .with_module("pe")
        .with_rule(first)
        .with_rule(second)
        .get(true)
        .unwrap();

    assert_eq!(
        file.get_text_formatted(false),
        r#"import "math"
import "pe"

rule first
{
	condition:
		true
}

rule second
{
	condition:
		first and math.entropy(0, filesize) > 7.0
}
"#
    );
}

#[test]
fn rule_errors() {
    let mut builder = YaraRuleBuilder::new();
    assert_eq!(builder.get().unwrap_err(), BuilderError::MissingName);

    assert_eq!(
        builder
            .with_name("r")
            .with_plain_string("$a", "x")
            .with_plain_string("$a", "y")
            .get()
            .unwrap_err(),
        BuilderError::DuplicateString("$a".to_string())
    );

    // The failed rule doesn't leak into the next one.
    assert!(builder.with_name("r").get().is_ok());

    assert_eq!(
        builder.with_name("r").ascii().get().unwrap_err(),
        BuilderError::ModifierWithoutString
    );
    assert_eq!(
        builder
            .with_name("r")
            .with_plain_string("$a", "x")
            .xor_range(5, 1)
            .get()
            .unwrap_err(),
        BuilderError::InvalidXorRange { low: 5, high: 1 }
    );
    assert_eq!(
        builder
            .with_name("r")
            .with_plain_string("$a", "x")
            .base64_alphabet("abc")
            .get()
            .unwrap_err(),
        BuilderError::InvalidBase64Alphabet
    );
    assert_eq!(
        builder.with_name("r").with_plain_string("a", "x").get().unwrap_err(),
        BuilderError::InvalidStringIdentifier("a".to_string())
    );
}

#[test]
fn recheck() {
    let rule = YaraRuleBuilder::new()
        .with_name("r")
        .with_condition(string_ref("$missing").get().unwrap())
        .get()
        .unwrap();

    let mut builder = YaraFileBuilder::default();
    builder.with_rule(rule);
    match builder.get(true) {
        Err(BuilderError::Recheck { error, text }) => {
            assert_eq!(
                error.info(),
                &ErrorInfo::UndefinedString { id: "$missing".to_string() }
            );
            assert_eq!(text, "rule r\n{\n\tcondition:\n\t\t$missing\n}\n");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // Without rechecking the file is returned as built.
    let rule = YaraRuleBuilder::new()
        .with_name("r")
        .with_condition(string_ref("$missing").get().unwrap())
        .get()
        .unwrap();
    let file = builder.with_rule(rule).get(false).unwrap();
    assert_eq!(file.rules().len(), 1);
}

#[test]
fn rule_braces_on_own_lines() {
    let rule = YaraRuleBuilder::new().with_name("t").get().unwrap();
    let file = YaraFileBuilder::default().with_rule(rule).get(true).unwrap();
    let text = file.get_text_formatted(false);
    assert!(text.starts_with("rule t\n{\n"), "{}", text);
    assert_eq!(text, "rule t\n{\n\tcondition:\n\t\ttrue\n}\n");
}
