use std::path::PathBuf;

use pretty_assertions::assert_eq;

use crate::ast::{ExprKind, YaraFile};
use crate::literal::LiteralValue;
use crate::modules::ImportFeatures;
use crate::parser::{
    ErrorInfo, ParserConfig, ParserDriver, ParserError, ParserMode,
};
use crate::types::ExprType;

fn parse(src: &str) -> Result<YaraFile, ParserError> {
    parse_with(src, ImportFeatures::ALL_CURRENT)
}

fn parse_with(
    src: &str,
    features: ImportFeatures,
) -> Result<YaraFile, ParserError> {
    let mut driver = ParserDriver::new();
    let config = ParserConfig::new(features, ParserMode::Regular);
    driver.parse_str(src, &config)?;
    Ok(driver.take_parsed_file().unwrap())
}

fn error(src: &str) -> ErrorInfo {
    parse(src).unwrap_err().info().clone()
}

fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("src/parser/tests/testdata")
        .join(name)
}

#[test]
fn empty_source() {
    let file = parse("").unwrap();
    assert!(file.rules().is_empty());
    assert!(file.imports().is_empty());
    assert_eq!(file.get_text(), "");
}

#[test]
fn simple_rule() {
    let file = parse("rule t { condition: true }").unwrap();
    assert_eq!(file.rules().len(), 1);
    assert_eq!(file.get_text(), "rule t {\n\tcondition:\n\t\ttrue\n}");
}

#[test]
fn rule_with_everything() {
    let src = r#"
import "pe"

private global rule abc : tag1 tag2 {
    meta:
        author = "me"
        version = 2
        released = false
        offset = -10
    strings:
        $a = "text" ascii wide
        $h = { 4D 5A ?? [2-4] ( 00 | 01 ) }
        $r = /ab+c/i
    condition:
        pe.number_of_sections > 2 and $a at 0 and #h in (0..100) == 1 or $r
}
"#;
    let file = parse(src).unwrap();
    let tokens = file.tokens();
    let rule = &file.rules()[0];

    assert_eq!(rule.name(tokens), "abc");
    assert!(rule.is_private(tokens));
    assert!(rule.is_global(tokens));
    assert_eq!(rule.tags(tokens), vec!["tag1", "tag2"]);
    assert_eq!(rule.metas.len(), 4);
    assert_eq!(rule.strings.len(), 3);
    assert!(file.has_import("pe"));

    assert_eq!(
        file.get_text(),
        r#"import "pe"

private global rule abc : tag1 tag2 {
	meta:
		author = "me"
		version = 2
		released = false
		offset = -10
	strings:
		$a = "text" ascii wide
		$h = { 4D 5A ?? [2-4] ( 00 | 01 ) }
		$r = /ab+c/i
	condition:
		pe.number_of_sections > 2 and $a at 0 and #h in (0..100) == 1 or $r
}"#
    );
}

#[test]
fn negative_meta_is_single_token() {
    let file = parse("rule t { meta: x = -10 condition: true }").unwrap();
    let tokens = file.tokens();
    let meta = file.rules()[0].meta(tokens, "x").unwrap();
    assert_eq!(meta.value(tokens).unwrap().value(), &LiteralValue::Int(-10));
    assert_eq!(tokens.text(meta.value), "-10");
}

#[test]
fn duplicate_imports_are_merged() {
    let file = parse("import \"pe\"\nimport \"pe\"\n").unwrap();
    assert_eq!(file.imports().len(), 1);
}

#[test]
fn module_availability_depends_on_features() {
    assert!(
        parse_with("import \"androguard\"", ImportFeatures::AVAST).is_ok()
    );

    let err =
        parse_with("import \"androguard\"", ImportFeatures::VIRUS_TOTAL)
            .unwrap_err();
    assert_eq!(
        err.info(),
        &ErrorInfo::UnrecognizedModule { name: "androguard".to_string() }
    );
    assert_eq!(err.location().line(), 1);
    assert_eq!(
        err.info().to_string(),
        "Unrecognized module 'androguard' imported"
    );

    assert!(matches!(
        error("import \"foo\""),
        ErrorInfo::UnrecognizedModule { .. }
    ));
}

#[test]
fn virus_total_globals() {
    let src = "rule t { condition: positives > 10 }";
    assert!(parse_with(src, ImportFeatures::VIRUS_TOTAL).is_ok());
    assert!(matches!(
        parse_with(src, ImportFeatures::AVAST).unwrap_err().info(),
        ErrorInfo::UnrecognizedIdentifier { .. }
    ));
}

#[test]
fn duplicates() {
    assert_eq!(
        error("rule a { condition: true } rule a { condition: false }"),
        ErrorInfo::DuplicateRule { name: "a".to_string() }
    );
    assert_eq!(
        error(r#"rule a { strings: $a = "x" $a = "y" condition: $a }"#),
        ErrorInfo::DuplicateString { id: "$a".to_string() }
    );
    assert_eq!(
        error("rule a : x y x { condition: true }"),
        ErrorInfo::DuplicateTag { tag: "x".to_string() }
    );
    // Anonymous strings can be repeated.
    assert!(parse(
        r#"rule a { strings: $ = "x" $ = "y" condition: all of them }"#
    )
    .is_ok());
}

#[test]
fn string_references() {
    assert_eq!(
        error(r#"rule a { strings: $a = "x" condition: $b }"#),
        ErrorInfo::UndefinedString { id: "$b".to_string() }
    );
    assert_eq!(
        error(r#"rule a { strings: $a = "x" condition: #b > 0 }"#),
        ErrorInfo::UndefinedString { id: "$b".to_string() }
    );
    assert_eq!(
        error(r#"rule a { strings: $a = "x" condition: $ }"#),
        ErrorInfo::AnonymousStringOutsideLoop { id: "$".to_string() }
    );
    assert_eq!(
        error("rule a { condition: any of them }"),
        ErrorInfo::ThemWithoutStrings
    );
    assert!(parse(
        "rule a { strings: $a = \"x\" condition: for any of ($a) : \
         ( $ at 0 and #  > 1 and @[1] < 10 ) }"
    )
    .is_ok());
}

#[test]
fn string_wildcards() {
    let src = r#"
rule a {
    strings:
        $abc1 = "x"
        $abc2 = "y"
        $def = "z"
    condition:
        2 of ($abc*) and any of ($abc1, $def*)
}
"#;
    assert!(parse(src).is_ok());

    assert_eq!(
        error(r#"rule a { strings: $a = "x" condition: any of ($b*) }"#),
        ErrorInfo::UnmatchedStringWildcard { pattern: "$b*".to_string() }
    );
}

#[test]
fn xor_modifier() {
    assert!(parse(r#"rule a { strings: $a = "x" xor(1-255) condition: $a }"#)
        .is_ok());
    assert_eq!(
        error(r#"rule a { strings: $a = "x" xor(256) condition: $a }"#),
        ErrorInfo::XorKeyOutOfBounds
    );
    assert_eq!(
        error(r#"rule a { strings: $a = "x" xor(10-5) condition: $a }"#),
        ErrorInfo::InvalidXorRange
    );
}

#[test]
fn incompatible_modifiers() {
    assert_eq!(
        error(r#"rule a { strings: $a = "x" nocase nocase condition: $a }"#),
        ErrorInfo::DuplicateModifier { modifier: "nocase".to_string() }
    );
    assert!(matches!(
        error(r#"rule a { strings: $a = "x" xor nocase condition: $a }"#),
        ErrorInfo::IncompatibleModifiers { .. }
    ));
    assert!(matches!(
        error(r#"rule a { strings: $a = { 00 } ascii condition: $a }"#),
        ErrorInfo::InvalidModifier { .. }
    ));
    assert_eq!(
        error(r#"rule a { strings: $a = "x" base64("abc") condition: $a }"#),
        ErrorInfo::InvalidBase64Alphabet
    );
}

#[test]
fn hex_strings() {
    assert_eq!(
        error("rule a { strings: $a = { 00 [5-2] 01 } condition: $a }"),
        ErrorInfo::InvalidHexJump { low: 5, high: 2 }
    );
    assert!(parse(
        "rule a { strings: $a = { 0? ?1 [-] ( 00 | 11 22 ) } condition: $a }"
    )
    .is_ok());
}

#[test]
fn expression_types() {
    let file = parse(
        r#"
import "pe"
import "math"

rule a {
    condition:
        math.entropy(0, filesize) > 7.0 and
        pe.sections[0].name == ".text" and
        pe.version_info["CompanyName"] contains "Corp" and
        pe.exports(/^Dll/) and
        uint16(0) == 0x5A4D
}
"#,
    )
    .unwrap();
    let condition = &file.rules()[0].condition;
    assert_eq!(condition.ty(), ExprType::Bool);
    assert!(matches!(condition.kind, ExprKind::And(_)));
}

#[test]
fn type_errors() {
    assert!(matches!(
        error(r#"rule a { condition: "abc" + 1 }"#),
        ErrorInfo::InvalidOperand { .. }
    ));
    assert!(matches!(
        error(r#"rule a { condition: 1 contains "x" }"#),
        ErrorInfo::InvalidOperand { .. }
    ));
    assert!(matches!(
        error(r#"rule a { condition: "x" matches "y" }"#),
        ErrorInfo::InvalidOperand { .. }
    ));
    assert!(matches!(
        error("import \"pe\" rule a { condition: pe.number_of_sections.foo }"),
        ErrorInfo::InvalidAccess { .. }
    ));
    assert!(matches!(
        error("import \"pe\" rule a { condition: pe.sections[\"x\"] }"),
        ErrorInfo::InvalidAccess { .. }
    ));
    assert_eq!(
        error("import \"math\" rule a { condition: math.abs(\"x\") }"),
        ErrorInfo::WrongArguments {
            function: "math.abs".to_string(),
            given: "(string)".to_string(),
        }
    );
    assert_eq!(
        error("rule a { condition: for any i in (5..1) : ( true ) }"),
        ErrorInfo::InvalidRange { low: 5, high: 1 }
    );
}

#[test]
fn identifiers() {
    assert_eq!(
        error("rule a { condition: foo }"),
        ErrorInfo::UnrecognizedIdentifier { name: "foo".to_string() }
    );
    assert_eq!(
        error("import \"pe\" rule a { condition: pe.foo }"),
        ErrorInfo::UnrecognizedIdentifier { name: "foo".to_string() }
    );
    assert_eq!(
        error(
            "rule a { condition: for any i in (1..2) : \
             ( for all i in (1..2) : ( true ) ) }"
        ),
        ErrorInfo::RedefinedIdentifier { name: "i".to_string() }
    );
    assert_eq!(
        error(
            "import \"pe\" rule a { condition: for any pe in (1..2) : \
             ( true ) }"
        ),
        ErrorInfo::RedefinedIdentifier { name: "pe".to_string() }
    );
}

#[test]
fn loops() {
    let src = r#"
import "pe"

rule a {
    strings:
        $a = "x"
    condition:
        for any i in (0..#a) : ( @a[i] < 100 ) and
        for all section in pe.sections : ( section.name != "" ) and
        for any k, v in pe.version_info : ( k == "x" and v == "y" ) and
        for any s in ("a", "b") : ( pe.exports(s) ) and
        50% of them
}
"#;
    assert!(parse(src).is_ok());
}

#[test]
fn rule_references() {
    let file = parse(
        "rule a { condition: true }\nrule b { condition: a and not a }",
    )
    .unwrap();
    assert_eq!(file.rules()[1].condition.text(file.tokens()), "a and not a");
    assert!(matches!(
        error("rule b { condition: a } rule a { condition: true }"),
        ErrorInfo::UnrecognizedIdentifier { .. }
    ));
}

#[test]
fn renames_propagate_to_references() {
    let mut file = parse(
        r#"
rule a {
    strings:
        $s = "x"
    condition:
        $s and #s > 1 and @s[1] == 0 and !s[1] == 1
}

rule b {
    condition:
        a
}
"#,
    )
    .unwrap();

    file.edit_rule("a").unwrap().rename_string("$s", "$t").unwrap();
    file.rename_rule("a", "c").unwrap();

    let tokens = file.tokens();
    assert_eq!(
        file.rules()[0].condition.text(tokens),
        "$t and #t > 1 and @t[1] == 0 and !t[1] == 1"
    );
    assert_eq!(file.rules()[1].condition.text(tokens), "c");
}

#[test]
fn syntax_errors() {
    let err = parse("rule { condition: true }").unwrap_err();
    assert!(matches!(err.info(), ErrorInfo::SyntaxError { .. }));
    assert_eq!(err.location().line(), 1);

    let err = parse("rule a {\n  condition:\n    true and\n}").unwrap_err();
    assert!(matches!(err.info(), ErrorInfo::SyntaxError { .. }));
    assert_eq!(err.location().line(), 4);

    assert!(matches!(
        error("rule a { condition: true"),
        ErrorInfo::SyntaxError { .. }
    ));
}

#[test]
fn invalid_escapes() {
    assert!(matches!(
        error(r#"rule a { strings: $a = "\q" condition: $a }"#),
        ErrorInfo::InvalidEscapeSequence { .. }
    ));
}

#[test]
fn driver_is_reusable_after_errors() {
    let mut driver = ParserDriver::new();
    let config = ParserConfig::default();

    assert!(driver.parse_str("rule a { condition: }", &config).is_err());
    assert!(driver.parsed_file().is_none());

    let file =
        driver.parse_str("rule a { condition: true }", &config).unwrap();
    assert_eq!(file.rules().len(), 1);

    // Rules from previous parses are forgotten.
    let file =
        driver.parse_str("rule a { condition: false }", &config).unwrap();
    assert_eq!(file.rules().len(), 1);
}

#[test]
fn includes() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut driver = ParserDriver::new();
    let file = driver
        .parse_file(testdata("main.yar"), &ParserConfig::default())
        .unwrap();

    let names: Vec<String> =
        file.rules().iter().map(|r| r.name(file.tokens())).collect();
    assert_eq!(names, vec!["common_rule", "main_rule"]);
    assert_eq!(
        file.rules()[1].condition.text(file.tokens()),
        "common_rule and pe.is_dll()"
    );
}

#[test]
fn include_cycles() {
    let err = ParserDriver::new()
        .parse_file(testdata("cycle_a.yar"), &ParserConfig::default())
        .unwrap_err();
    assert!(matches!(err.info(), ErrorInfo::IncludeCycle { .. }));
}

#[test]
fn include_guard() {
    let err = ParserDriver::new()
        .parse_file(testdata("twice.yar"), &ParserConfig::default())
        .unwrap_err();
    assert_eq!(
        err.info(),
        &ErrorInfo::DuplicateRule { name: "common_rule".to_string() }
    );

    let config = ParserConfig::new(
        ImportFeatures::default(),
        ParserMode::IncludeGuarded,
    );
    let mut driver = ParserDriver::new();
    let file = driver.parse_file(testdata("twice.yar"), &config).unwrap();
    assert_eq!(file.rules().len(), 1);
}

#[test]
fn missing_include() {
    assert!(matches!(
        error("include \"does/not/exist.yar\""),
        ErrorInfo::IncludeError { .. }
    ));
}
