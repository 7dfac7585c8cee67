use pretty_assertions::assert_eq;

use super::{is_identifier, Tokenizer};
use crate::location::Position;
use crate::tokens::TokenKind;

fn tokenize(src: &str) -> Vec<(TokenKind, String)> {
    let mut tokenizer = Tokenizer::new(src.as_bytes(), None);
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token() {
        let token = token.unwrap();
        tokens.push((token.kind(), token.literal().text()));
    }
    tokens
}

fn kinds(src: &str) -> Vec<TokenKind> {
    tokenize(src).into_iter().map(|(kind, _)| kind).collect()
}

#[test]
fn keywords() {
    assert_eq!(kinds("global rule"), vec![TokenKind::Global, TokenKind::Rule]);
    assert_eq!(kinds("globalrule"), vec![TokenKind::Ident]);
    assert_eq!(
        kinds("include import in"),
        vec![TokenKind::Include, TokenKind::Import, TokenKind::In]
    );
}

#[test]
fn identifiers() {
    assert_eq!(
        tokenize("foo _bar $ $foo $foo* @foo #foo !foo"),
        vec![
            (TokenKind::Ident, "foo".to_string()),
            (TokenKind::Ident, "_bar".to_string()),
            (TokenKind::StringId, "$".to_string()),
            (TokenKind::StringId, "$foo".to_string()),
            (TokenKind::StringIdWildcard, "$foo*".to_string()),
            (TokenKind::StringOffset, "@foo".to_string()),
            (TokenKind::StringCount, "#foo".to_string()),
            (TokenKind::StringLength, "!foo".to_string()),
        ]
    );
}

#[test]
fn integer_literals() {
    let mut tokenizer = Tokenizer::new(b"10 0x10 0o10 2KB 1MB", None);
    let mut values = Vec::new();
    while let Some(token) = tokenizer.next_token() {
        let token = token.unwrap();
        assert_eq!(token.kind(), TokenKind::IntLiteral);
        let literal = token.literal();
        values.push((literal.as_int().unwrap(), literal.text()));
    }
    assert_eq!(
        values,
        vec![
            (10, "10".to_string()),
            (16, "0x10".to_string()),
            (8, "0o10".to_string()),
            (2048, "2KB".to_string()),
            (1048576, "1MB".to_string()),
        ]
    );
}

#[test]
fn integer_out_of_range() {
    let mut tokenizer = Tokenizer::new(b"0x1FFFFFFFFFFFFFFFF", None);
    let err = tokenizer.next_token().unwrap().unwrap_err();
    assert_eq!(err.code(), "E004");
}

#[test]
fn float_literals_keep_their_text() {
    assert_eq!(
        tokenize("1.50 (1..2)"),
        vec![
            (TokenKind::FloatLiteral, "1.50".to_string()),
            (TokenKind::LParen, "(".to_string()),
            (TokenKind::IntLiteral, "1".to_string()),
            (TokenKind::DoubleDot, "..".to_string()),
            (TokenKind::IntLiteral, "2".to_string()),
            (TokenKind::RParen, ")".to_string()),
        ]
    );
}

#[test]
fn string_literals() {
    assert_eq!(
        tokenize(r#""foo \"bar\" \x00""#),
        vec![(TokenKind::StringLiteral, r#"foo \"bar\" \x00"#.to_string())]
    );

    // Raw bytes that are not valid UTF-8 become escape sequences.
    let mut tokenizer = Tokenizer::new(b"\"a\xffb\"", None);
    let token = tokenizer.next_token().unwrap().unwrap();
    assert_eq!(token.literal().text(), r"a\xffb");
}

#[test]
fn regexps_and_division() {
    assert_eq!(
        tokenize(r"/ab\/c/is 4 \ 2"),
        vec![
            (TokenKind::Regexp, r"/ab\/c/is".to_string()),
            (TokenKind::IntLiteral, "4".to_string()),
            (TokenKind::Divide, r"\".to_string()),
            (TokenKind::IntLiteral, "2".to_string()),
        ]
    );
}

#[test]
fn comments_and_newlines() {
    assert_eq!(
        tokenize("a // one\r\n/* two\nlines */\rb"),
        vec![
            (TokenKind::Ident, "a".to_string()),
            (TokenKind::OneLineComment, "// one".to_string()),
            (TokenKind::NewLine, "\r\n".to_string()),
            (TokenKind::Comment, "/* two\nlines */".to_string()),
            (TokenKind::NewLine, "\r".to_string()),
            (TokenKind::Ident, "b".to_string()),
        ]
    );
}

#[test]
fn hex_patterns() {
    assert_eq!(
        kinds("$a = { 4D 5a ?? ( 01 | ~02 ) [2-4] [-] } and"),
        vec![
            TokenKind::StringId,
            TokenKind::Assign,
            TokenKind::HexStart,
            TokenKind::HexByte,
            TokenKind::HexByte,
            TokenKind::HexByte,
            TokenKind::HexAltLeft,
            TokenKind::HexByte,
            TokenKind::HexAltOr,
            TokenKind::HexByte,
            TokenKind::HexAltRight,
            TokenKind::HexJumpLeft,
            TokenKind::IntLiteral,
            TokenKind::Dash,
            TokenKind::IntLiteral,
            TokenKind::HexJumpRight,
            TokenKind::HexJumpLeft,
            TokenKind::Dash,
            TokenKind::HexJumpRight,
            TokenKind::HexEnd,
            TokenKind::And,
        ]
    );

    // Braces that don't follow an equal sign are not hex patterns.
    assert_eq!(
        kinds("rule a { condition: true }"),
        vec![
            TokenKind::Rule,
            TokenKind::Ident,
            TokenKind::LBrace,
            TokenKind::Condition,
            TokenKind::Colon,
            TokenKind::BoolLiteral,
            TokenKind::RBrace,
        ]
    );
}

#[test]
fn hex_pattern_with_comments() {
    assert_eq!(
        kinds("= {\n  AA // first\n  BB /* second */\n}"),
        vec![
            TokenKind::Assign,
            TokenKind::HexStart,
            TokenKind::NewLine,
            TokenKind::HexByte,
            TokenKind::OneLineComment,
            TokenKind::NewLine,
            TokenKind::HexByte,
            TokenKind::Comment,
            TokenKind::NewLine,
            TokenKind::HexEnd,
        ]
    );
}

#[test]
fn locations() {
    let mut tokenizer =
        Tokenizer::new(b"rule a {\n  condition:\n\t// comment\n}", None);
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.next_token() {
        tokens.push(token.unwrap());
    }

    let condition = &tokens[4];
    assert_eq!(condition.kind(), TokenKind::Condition);
    assert_eq!(condition.location().begin(), Position { line: 2, column: 3 });
    assert_eq!(condition.location().end(), Position { line: 2, column: 11 });
    assert_eq!(condition.location().to_string(), "2.3-11");

    let comment = &tokens[7];
    assert_eq!(comment.kind(), TokenKind::OneLineComment);
    assert_eq!(comment.location().line(), 3);
    assert_eq!(comment.indentation, Some(1));
}

#[test]
fn unknown_tokens() {
    let mut tokenizer = Tokenizer::new(b"rule ?foo bar", None);
    assert_eq!(
        tokenizer.next_token().unwrap().unwrap().kind(),
        TokenKind::Rule
    );
    let err = tokenizer.next_token().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "1.6-9: unknown token '?foo'");
}

#[test]
fn identifier_names() {
    assert!(is_identifier("foo"));
    assert!(is_identifier("_foo_1"));
    assert!(!is_identifier(""));
    assert!(!is_identifier("rule"));
    assert!(!is_identifier("filesize"));
    assert!(!is_identifier("not valid"));
    assert!(!is_identifier("1abc"));
    assert!(!is_identifier("$a"));
}
