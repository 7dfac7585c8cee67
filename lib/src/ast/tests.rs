use pretty_assertions::assert_eq;

use crate::ast::visitor::{self, VisitAction, Visitor};
use crate::ast::{EditError, ExprKind, Expression, YaraFile};
use crate::builder::{bool_val, filesize, int_val, string_ref, YaraRuleBuilder};
use crate::literal::Literal;
use crate::parser::{parse, ParserConfig};
use crate::tokens::{Detached, TokenKind, TokenStream};

fn parse_file(src: &str) -> YaraFile {
    parse(src, &ParserConfig::default()).unwrap()
}

const SIMPLE: &str = "rule a\n{\n\tcondition:\n\t\ttrue\n}\n";

#[test]
fn rule_header() {
    let mut file = parse_file(SIMPLE);
    let mut rule = file.edit_rule("a").unwrap();
    rule.set_private(true).unwrap();
    rule.set_global(true).unwrap();
    rule.add_tag("t1").unwrap();
    rule.add_tag("t2").unwrap();
    assert_eq!(
        rule.add_tag("t1").unwrap_err(),
        EditError::DuplicateTag("t1".to_string())
    );
    assert_eq!(
        rule.add_tag("rule").unwrap_err(),
        EditError::InvalidIdentifier("rule".to_string())
    );
    assert!(rule.remove_tag("t1").unwrap());
    assert!(!rule.remove_tag("t1").unwrap());

    assert_eq!(
        file.get_text_formatted(false),
        "global private rule a : t2\n{\n\tcondition:\n\t\ttrue\n}\n"
    );
    let rule = &file.rules()[0];
    assert!(rule.is_private(file.tokens()));
    assert!(rule.is_global(file.tokens()));

    let mut rule = file.edit_rule("a").unwrap();
    rule.set_private(false).unwrap();
    rule.remove_tag("t2").unwrap();
    assert_eq!(
        file.get_text_formatted(false),
        "global rule a\n{\n\tcondition:\n\t\ttrue\n}\n"
    );
}

#[test]
fn metas() {
    let mut file = parse_file(SIMPLE);
    let mut rule = file.edit_rule("a").unwrap();
    rule.add_meta("author", Literal::string("me")).unwrap();
    rule.add_meta("score", Literal::int(5)).unwrap();
    rule.add_meta("author", Literal::string("you")).unwrap();
    assert_eq!(
        file.get_text_formatted(false),
        r#"rule a
{
	meta:
		author = "me"
		score = 5
		author = "you"
	condition:
		true
}
"#
    );

    let mut rule = file.edit_rule("a").unwrap();
    rule.set_meta_value("score", Literal::bool(false)).unwrap();
    assert_eq!(
        rule.set_meta_value("missing", Literal::int(1)).unwrap_err(),
        EditError::MetaNotFound("missing".to_string())
    );
    assert_eq!(rule.remove_meta("author").unwrap(), 2);
    assert_eq!(
        file.get_text(),
        "rule a {\n\tmeta:\n\t\tscore = false\n\tcondition:\n\t\ttrue\n}"
    );

    file.edit_rule("a").unwrap().remove_meta("score").unwrap();
    assert_eq!(file.get_text_formatted(false), SIMPLE);
}

#[test]
fn strings() {
    let mut file = parse_file(
        r#"rule a {
	strings:
		$a = "foo" // first
		$b = "bar"
	condition:
		$a and #a > 1
}
"#,
    );

    let mut rule = file.edit_rule("a").unwrap();
    assert_eq!(
        rule.rename_string("$a", "$b").unwrap_err(),
        EditError::DuplicateString("$b".to_string())
    );
    assert_eq!(
        rule.rename_string("$a", "x").unwrap_err(),
        EditError::InvalidStringIdentifier("x".to_string())
    );
    rule.rename_string("$a", "$x").unwrap();
    assert_eq!(
        rule.remove_string("$x").unwrap_err(),
        EditError::StringInUse("$x".to_string())
    );
    assert_eq!(
        rule.remove_string("$a").unwrap_err(),
        EditError::StringNotFound("$a".to_string())
    );
    rule.remove_string("$b").unwrap();

    assert_eq!(
        file.get_text_formatted(false),
        r#"rule a
{
	strings:
		$x = "foo" // first
	condition:
		$x and #x > 1
}
"#
    );
    assert!(file.rules()[0].is_string_referenced(file.tokens(), "$x"));
}

#[test]
fn conditions() {
    let mut file = parse_file(
        "rule a {\n\tstrings:\n\t\t$a = \"x\"\n\tcondition:\n\
         \t\ttrue and not true\n}\n",
    );

    let mut rule = file.edit_rule("a").unwrap();
    rule.modify_condition(&mut |expr: &Expression, _: &TokenStream| {
        match expr.kind {
            ExprKind::BoolLiteral(_) => bool_val(false).get().ok(),
            _ => None,
        }
    })
    .unwrap();
    assert_eq!(
        file.rules()[0].condition.text(file.tokens()),
        "false and not false"
    );

    let condition = string_ref("$a").and(filesize().lt(int_val(10)));
    file.edit_rule("a")
        .unwrap()
        .set_condition(condition.get().unwrap())
        .unwrap();
    assert_eq!(
        file.get_text_formatted(false),
        "rule a\n{\n\tstrings:\n\t\t$a = \"x\"\n\tcondition:\n\
         \t\t$a and filesize < 10\n}\n"
    );
}

#[test]
fn imports() {
    let mut file = parse_file(SIMPLE);
    assert!(file.add_import("pe").unwrap());
    assert!(!file.add_import("pe").unwrap());
    assert!(file.add_import("math").unwrap());
    assert_eq!(
        file.add_import("nonexistent").unwrap_err(),
        EditError::UnknownModule("nonexistent".to_string())
    );
    assert_eq!(
        file.get_text_formatted(false),
        "import \"pe\"\nimport \"math\"\n\n\
         rule a\n{\n\tcondition:\n\t\ttrue\n}\n"
    );

    assert!(file.remove_import("pe").unwrap());
    assert!(!file.remove_import("pe").unwrap());
    assert_eq!(
        file.get_text_formatted(false),
        "import \"math\"\n\nrule a\n{\n\tcondition:\n\t\ttrue\n}\n"
    );

    let mut file = parse_file(
        "import \"pe\"\n\nrule a {\n\tcondition:\n\t\tpe.is_dll()\n}\n",
    );
    assert_eq!(
        file.remove_import("pe").unwrap_err(),
        EditError::ModuleInUse("pe".to_string())
    );
}

#[test]
fn edits_keep_windows_newlines() {
    let mut file =
        parse_file("rule a\r\n{\r\n\tcondition:\r\n\t\ttrue\r\n}\r\n");
    assert!(file.add_import("pe").unwrap());
    assert_eq!(
        file.get_text_formatted(false),
        "import \"pe\"\r\n\r\n\
         rule a\r\n{\r\n\tcondition:\r\n\t\ttrue\r\n}\r\n"
    );

    let rule = YaraRuleBuilder::new().with_name("b").get().unwrap();
    file.add_rule(rule).unwrap();
    assert!(file
        .tokens()
        .iter()
        .filter(|(_, token)| token.kind() == TokenKind::NewLine)
        .all(|(_, token)| token.literal().as_str() == Some("\r\n")));
}

#[test]
fn rules() {
    let mut file = parse_file(
        "rule a {\n\tcondition:\n\t\ttrue\n}\n\n\
         rule c {\n\tcondition:\n\t\ta\n}\n",
    );

    let first = YaraRuleBuilder::new().with_name("first").get().unwrap();
    file.insert_rule(0, first).unwrap();
    let duplicate = YaraRuleBuilder::new().with_name("a").get().unwrap();
    assert_eq!(
        file.add_rule(duplicate).unwrap_err(),
        EditError::DuplicateRule("a".to_string())
    );

    file.rename_rule("a", "b").unwrap();
    assert_eq!(
        file.rename_rule("b", "c").unwrap_err(),
        EditError::DuplicateRule("c".to_string())
    );
    assert_eq!(
        file.rename_rule("missing", "d").unwrap_err(),
        EditError::RuleNotFound("missing".to_string())
    );
    assert_eq!(
        file.rename_rule("b", "not valid").unwrap_err(),
        EditError::InvalidIdentifier("not valid".to_string())
    );
    assert_eq!(
        file.rename_rule("b", "condition").unwrap_err(),
        EditError::InvalidIdentifier("condition".to_string())
    );
    assert_eq!(file.rules()[2].condition.text(file.tokens()), "b");

    assert_eq!(
        file.get_text_formatted(false),
        r#"rule first
{
	condition:
		true
}

rule b
{
	condition:
		true
}

rule c
{
	condition:
		b
}
"#
    );

    assert!(file.remove_rule("first").unwrap());
    assert!(!file.remove_rule("first").unwrap());
    let names: Vec<String> =
        file.rules().iter().map(|r| r.name(file.tokens())).collect();
    assert_eq!(names, vec!["b", "c"]);
}

#[test]
fn copy_rule_between_files() {
    let source = parse_file(
        "rule a : t {\n\tstrings:\n\t\t$a = \"x\"\n\tcondition:\n\t\t$a\n}\n",
    );
    let rule = &source.rules()[0];
    let copy = Detached::copy_of(
        rule,
        rule.first_token(),
        rule.last_token(),
        source.tokens(),
    )
    .unwrap();

    let mut target = YaraFile::default();
    target.add_rule(copy).unwrap();
    target.edit_rule("a").unwrap().rename_string("$a", "$b").unwrap();

    assert_eq!(
        target.get_text(),
        "rule a : t {\n\tstrings:\n\t\t$b = \"x\"\n\tcondition:\n\t\t$b\n}"
    );
    // The original is untouched.
    assert_eq!(
        source.get_text(),
        "rule a : t {\n\tstrings:\n\t\t$a = \"x\"\n\tcondition:\n\t\t$a\n}"
    );
}

#[test]
fn visitors() {
    let file = parse_file(
        r#"rule a {
	strings:
		$a = "x"
		$b = "y"
	condition:
		$a and ($b or filesize > 10) and for any i in (1..2) : ($a at i)
}
"#,
    );

    #[derive(Default)]
    struct Counter {
        strings: usize,
        depth: usize,
    }

    impl Visitor for Counter {
        fn enter(
            &mut self,
            expr: &Expression,
            _tokens: &TokenStream,
        ) -> VisitAction {
            self.depth += 1;
            match expr.kind {
                ExprKind::StringRef(_) | ExprKind::StringAt(_) => {
                    self.strings += 1
                }
                _ => {}
            }
            if matches!(expr.kind, ExprKind::ForIn(_)) {
                VisitAction::SkipChildren
            } else {
                VisitAction::Continue
            }
        }

        fn leave(&mut self, _expr: &Expression, _tokens: &TokenStream) {
            self.depth -= 1;
        }
    }

    let mut counter = Counter::default();
    file.rules()[0].visit_condition(file.tokens(), &mut counter);
    assert_eq!(counter.strings, 2);
    assert_eq!(counter.depth, 0);

    let mut ints = Vec::new();
    visitor::walk(
        &file.rules()[0].condition,
        file.tokens(),
        &mut visitor::from_fn(|expr: &Expression, tokens: &TokenStream| {
            if let ExprKind::IntLiteral(token) = expr.kind {
                ints.push(tokens.text(token));
            }
        }),
    );
    assert_eq!(ints, vec!["10", "1", "2"]);
}
