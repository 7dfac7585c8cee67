use pretty_assertions::assert_eq;

use crate::literal::Literal;
use crate::tokens::{
    Detached, Remap, Token, TokenId, TokenKind, TokenMap, TokenStream,
    TokenStreamError,
};

fn ident(name: &str) -> Token {
    Token::synthetic(TokenKind::Ident, Literal::escaped_string(name))
}

fn texts(stream: &TokenStream) -> Vec<String> {
    stream.iter().map(|(id, _)| stream.text(id)).collect()
}

#[test]
fn push_and_insert() {
    let mut stream = TokenStream::new();
    let a = stream.push_back(ident("a"));
    let c = stream.push_back(ident("c"));
    let b = stream.insert_before(c, ident("b")).unwrap();
    stream.insert_after(c, ident("d")).unwrap();
    stream.insert_before(a, Token::fixed(TokenKind::LParen)).unwrap();

    assert_eq!(texts(&stream), vec!["(", "a", "b", "c", "d"]);
    assert_eq!(stream.len(), 5);
    assert_eq!(stream.next(a), Some(b));
    assert_eq!(stream.prev(c), Some(b));
    assert_eq!(stream.text(b), "b");
}

#[test]
fn erase_invalidates_handles() {
    let mut stream = TokenStream::new();
    let a = stream.push_back(ident("a"));
    let b = stream.push_back(ident("b"));
    let c = stream.push_back(ident("c"));
    let d = stream.push_back(ident("d"));

    stream.erase(b, c).unwrap();

    assert_eq!(texts(&stream), vec!["a", "d"]);
    assert!(stream.get(b).is_none());
    assert!(!stream.contains(c));
    assert_eq!(stream.next(a), Some(d));

    // The slot of `b` is reused, but the old handle stays invalid.
    let e = stream.push_back(ident("e"));
    assert!(stream.get(b).is_none());
    assert_eq!(stream.text(e), "e");
    assert_eq!(
        stream.insert_before(b, ident("x")).unwrap_err(),
        TokenStreamError::InvalidHandle(b)
    );
}

#[test]
fn reversed_range_is_rejected() {
    let mut stream = TokenStream::new();
    let a = stream.push_back(ident("a"));
    let b = stream.push_back(ident("b"));

    assert_eq!(
        stream.erase(b, a).unwrap_err(),
        TokenStreamError::InvalidRange { first: b, last: a }
    );
    assert_eq!(stream.len(), 2);
}

#[test]
fn aliases_follow_renames() {
    let mut stream = TokenStream::new();
    let def = stream.push_back(Token::synthetic(
        TokenKind::StringIdDef,
        Literal::escaped_string("$a"),
    ));
    let count = stream.push_back(Token::synthetic(
        TokenKind::StringCount,
        stream.alias_of(def),
    ));
    let offset = stream.push_back(Token::synthetic(
        TokenKind::StringOffset,
        stream.alias_of(def),
    ));
    let length = stream.push_back(Token::synthetic(
        TokenKind::StringLength,
        stream.alias_of(def),
    ));
    let reference = stream.push_back(Token::synthetic(
        TokenKind::StringId,
        stream.alias_of(def),
    ));

    assert_eq!(texts(&stream), vec!["$a", "#a", "@a", "!a", "$a"]);

    stream
        .get_mut(def)
        .unwrap()
        .set_literal(Literal::escaped_string("$renamed"));

    assert_eq!(stream.text(count), "#renamed");
    assert_eq!(stream.text(offset), "@renamed");
    assert_eq!(stream.text(length), "!renamed");
    assert_eq!(stream.text(reference), "$renamed");
}

#[test]
fn erasing_aliased_token_keeps_alias_text() {
    let mut stream = TokenStream::new();
    let name = stream.push_back(ident("rule_a"));
    let reference = stream
        .push_back(Token::synthetic(TokenKind::Id, stream.alias_of(name)));

    stream.erase_one(name).unwrap();

    assert_eq!(stream.text(reference), "rule_a");
    assert!(!stream.get(reference).unwrap().literal().is_alias());
}

#[test]
fn string_literals_are_quoted() {
    let mut stream = TokenStream::new();
    let plain = stream.push_back(Token::synthetic(
        TokenKind::StringLiteral,
        Literal::string("a\"b"),
    ));
    let escaped = stream.push_back(Token::synthetic(
        TokenKind::StringLiteral,
        Literal::escaped_string(r"\x00"),
    ));

    assert_eq!(stream.text(plain), r#""a\"b""#);
    assert_eq!(stream.text(escaped), r#""\x00""#);
}

#[test]
fn move_range_between_streams() {
    let mut source = TokenStream::new();
    let def = source.push_back(ident("x"));
    let a = source.push_back(ident("a"));
    let inner =
        source.push_back(Token::synthetic(TokenKind::Id, source.alias_of(a)));
    let outer = source
        .push_back(Token::synthetic(TokenKind::Id, source.alias_of(def)));
    let tail =
        source.push_back(Token::synthetic(TokenKind::Id, source.alias_of(a)));

    let mut target = TokenStream::new();
    let end = target.push_back(ident("end"));

    let map =
        target.move_range_before(Some(end), &mut source, a, outer).unwrap();

    assert_eq!(texts(&target), vec!["a", "a", "x", "end"]);
    assert_eq!(texts(&source), vec!["x", "a"]);
    assert_eq!(map.len(), 3);

    // The alias inside the moved range now points into the new stream.
    let new_a = map.get(a).unwrap();
    let new_inner = map.get(inner).unwrap();
    assert_eq!(new_a.stream(), target.id());
    target.get_mut(new_a).unwrap().set_literal(Literal::escaped_string("b"));
    assert_eq!(target.text(new_inner), "b");

    // The alias that pointed outside of the range got a copy of the literal.
    assert_eq!(target.text(map.get(outer).unwrap()), "x");

    // And the one left behind no longer depends on the moved token.
    assert_eq!(source.text(tail), "a");
}

#[test]
fn exchange_replaces_range() {
    let mut stream = TokenStream::new();
    let first = stream.push_back(ident("a"));
    let op = stream.push_back(Token::fixed(TokenKind::And));
    let last = stream.push_back(ident("b"));

    let mut replacement = TokenStream::new();
    replacement.push_back(Token::synthetic(
        TokenKind::BoolLiteral,
        Literal::bool(true),
    ));

    let map = stream.exchange(op, last, &mut replacement).unwrap();

    assert_eq!(texts(&stream), vec!["a", "true"]);
    assert!(replacement.is_empty());
    assert_eq!(map.len(), 1);
    assert_eq!(stream.next(first), stream.last());
}

#[test]
fn nested_streams() {
    let mut included = TokenStream::new();
    let inner = included.push_back(ident("inner"));

    let mut stream = TokenStream::new();
    let include = stream.push_back(Token::fixed(TokenKind::Include));
    stream.attach_sub_stream(include, included).unwrap();

    assert_eq!(stream.len(), 1);
    assert_eq!(stream.text(inner), "inner");
    assert_eq!(stream.get(include).unwrap().sub_stream().unwrap().len(), 1);
}

#[derive(Debug, PartialEq)]
struct Pair(TokenId, TokenId);

impl Remap for Pair {
    fn remap(&mut self, map: &TokenMap) {
        self.0.remap(map);
        self.1.remap(map);
    }
}

#[test]
fn attach_detached_node() {
    let mut tokens = TokenStream::new();
    let a = tokens.push_back(ident("a"));
    let b = tokens.push_back(ident("b"));
    let detached = Detached::new(tokens, Pair(a, b));

    let mut target = TokenStream::new();
    let z = target.push_back(ident("z"));
    let pair = detached.attach(&mut target, Some(z)).unwrap();

    assert_eq!(texts(&target), vec!["a", "b", "z"]);
    assert_eq!(target.text(pair.0), "a");
    assert_eq!(target.text(pair.1), "b");
    assert_eq!(pair.0.stream(), target.id());
}

#[test]
fn newline_style() {
    let mut stream = TokenStream::new();
    assert_eq!(stream.newline_text(), "\n");
    stream.push_back(ident("a"));
    stream.push_back(Token::synthetic(
        TokenKind::NewLine,
        Literal::escaped_string("\r\n"),
    ));
    assert_eq!(stream.newline_text(), "\r\n");
    assert_eq!(stream.newline().literal().as_str(), Some("\r\n"));
}

#[test]
fn moved_newlines_take_target_style() {
    let mut target = TokenStream::new();
    target.push_back(ident("a"));
    target.push_back(Token::synthetic(
        TokenKind::NewLine,
        Literal::escaped_string("\r\n"),
    ));

    let mut other = TokenStream::new();
    other.push_back(ident("b"));
    other.push_back(Token::fixed(TokenKind::NewLine));

    target.move_all_before(None, &mut other).unwrap();
    assert_eq!(texts(&target), vec!["a", "\r\n", "b", "\r\n"]);

    // A stream without line breaks keeps the moved ones as they are.
    let mut target = TokenStream::new();
    let mut other = TokenStream::new();
    other.push_back(Token::fixed(TokenKind::NewLine));
    target.move_all_before(None, &mut other).unwrap();
    assert_eq!(texts(&target), vec!["\n"]);
}
