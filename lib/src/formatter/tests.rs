use std::path::PathBuf;

use pretty_assertions::assert_eq;

use crate::formatter::{FormatConfig, Formatter};
use crate::parser::{ParserConfig, ParserDriver};

fn format(src: &str) -> String {
    format_with(src, &FormatConfig::default())
}

fn format_with(src: &str, config: &FormatConfig) -> String {
    let mut driver = ParserDriver::new();
    let file = driver.parse_str(src, &ParserConfig::default()).unwrap();
    Formatter::new(config, false).format(file.tokens())
}

/// Formats `src`, checks the result and that formatting it again doesn't
/// change anything.
fn check(src: &str, expected: &str) {
    let formatted = format(src);
    assert_eq!(formatted, expected, "\n\ninput:\n{}", src);
    assert_eq!(format(&formatted), formatted, "formatting is not stable");
}

#[test]
fn empty() {
    assert_eq!(format(""), "");
}

#[test]
fn layout() {
    check(
        "import \"pe\" rule a : t1 t2 { meta: author = \"x\" version = 1 \
         strings: $a = \"foo\" wide $b = { 00 [2-4] ( 01 | 02 ) } \
         condition: $a and pe.number_of_sections > 1 }",
        r#"import "pe"

rule a : t1 t2
{
	meta:
		author = "x"
		version = 1
	strings:
		$a = "foo" wide
		$b = { 00 [2-4] ( 01 | 02 ) }
	condition:
		$a and pe.number_of_sections > 1
}
"#,
    );
}

#[test]
fn spacing() {
    check(
        "rule a { strings: $a = \"x\" xor ( 1 - 255 ) condition: \
         #a in ( 0 .. filesize ) > -1 and @a [ 1 ] < 10 and\n\
         uint16 ( 0 ) == 0x5A4D and 50 % of them }",
        r#"rule a
{
	strings:
		$a = "x" xor(1-255)
	condition:
		#a in (0..filesize) > -1 and @a[1] < 10 and
		uint16(0) == 0x5A4D and 50% of them
}
"#,
    );
}

#[test]
fn rule_braces_on_own_lines() {
    check(
        "rule t { condition: true }",
        "rule t\n{\n\tcondition:\n\t\ttrue\n}\n",
    );
    check(
        "rule t : x /* header */\n\n\n{ condition: true }",
        "rule t : x /* header */\n{\n\tcondition:\n\t\ttrue\n}\n",
    );
    check(
        "rule t // header\n{ condition: true }",
        "rule t // header\n{\n\tcondition:\n\t\ttrue\n}\n",
    );
}

#[test]
fn blank_lines() {
    check(
        "\n\nimport \"pe\"\n\n\n\nrule a { condition: true }\n\
         rule b {\n\n\n  condition: false\n}\n\n\n",
        "import \"pe\"\n\nrule a\n{\n\tcondition:\n\t\ttrue\n}\n\n\
         rule b\n{\n\n\tcondition:\n\t\tfalse\n}\n",
    );
}

#[test]
fn comments() {
    check(
        r#"// header comment
import "pe"
rule a {   // trailing
    condition:
        for any i in (0..2) : (
            i == 1 and i > 0
        )
}
// between
rule b { condition: a } // end
"#,
        r#"// header comment
import "pe"

rule a
{ // trailing
	condition:
		for any i in (0..2) : (
			i == 1 and
			i > 0
		)
}

// between
rule b
{
	condition:
		a
} // end
"#,
    );
}

#[test]
fn aligned_comments() {
    let src = r#"
rule a {
    strings:
        $a = "x" // one
        $bb = "yy"   // two
    condition:
        all of them
}
"#;
    check(
        src,
        r#"rule a
{
	strings:
		$a = "x"   // one
		$bb = "yy" // two
	condition:
		all of them
}
"#,
    );

    let config = FormatConfig {
        indent: "  ".to_string(),
        align_trailing_comments: false,
    };
    assert_eq!(
        format_with(src, &config),
        r#"rule a
{
  strings:
    $a = "x" // one
    $bb = "yy" // two
  condition:
    all of them
}
"#
    );
}

#[test]
fn multiline_hex_strings() {
    check(
        "rule a { strings: $h = {\n4D 5A\n00 01 } condition: $h }",
        "rule a\n{\n\tstrings:\n\t\t$h = {\n\t\t\t4D 5A\n\t\t\t00 01\n\t\t}\n\
         \tcondition:\n\t\t$h\n}\n",
    );
}

#[test]
fn keeps_line_breaks_in_conditions() {
    check(
        "rule a {\ncondition:\n  true and\n  false or\n  (true and\n false)\n\
         }",
        "rule a\n{\n\tcondition:\n\t\ttrue and\n\t\tfalse or\n\
         \t\t(true and\n\t\tfalse)\n}\n",
    );
}

#[test]
fn windows_newlines() {
    check(
        "rule a {\r\n  condition: true\r\n}\r\n",
        "rule a\r\n{\r\n\tcondition:\r\n\t\ttrue\r\n}\r\n",
    );
}

#[test]
fn includes() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("src/parser/tests/testdata/main.yar");
    let mut driver = ParserDriver::new();
    let file = driver.parse_file(path, &ParserConfig::default()).unwrap();

    assert_eq!(
        file.get_text_formatted(false),
        r#"import "pe"

include "common.yar"

rule main_rule
{
	condition:
		common_rule and pe.is_dll()
}
"#
    );

    assert_eq!(
        file.get_text_formatted(true),
        r#"import "pe"

rule common_rule
{
	condition:
		filesize > 100
}

rule main_rule
{
	condition:
		common_rule and pe.is_dll()
}
"#
    );
}
