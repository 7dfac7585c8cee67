use crate::ast::{
    Anchor, ArrayAccess, BinaryExpr, ExprKind, Expression, ForIn, ForOf,
    FunctionCall, Index, IntFunction, Of, Parentheses, Percentage, Range,
    Regexp, RegexpExpr, Set, StringAt, StringInRange, StringIndexed,
    StructAccess, UnaryExpr,
};
use crate::builder::{is_identifier, is_string_identifier, BuilderError};
use crate::literal::Literal;
use crate::tokens::{Detached, Remap, Token, TokenId, TokenKind, TokenStream};
use crate::types::ExprType;

/// Builds condition expressions.
///
/// Builders are created with the free functions of this module
/// ([`int_val`], [`id`], [`string_ref`], ...) and combined with methods
/// like [`YaraExpressionBuilder::and`] or [`YaraExpressionBuilder::eq`].
/// Every builder owns the tokens of the expression it holds, combining two
/// builders moves the tokens of both into the result.
///
/// Errors are not reported until [`YaraExpressionBuilder::get`] is called,
/// so that expressions can be written as a single chain of calls.
#[derive(Debug)]
pub struct YaraExpressionBuilder {
    tokens: TokenStream,
    expr: Result<Expression, BuilderError>,
}

/// Tokens of an expression under construction.
struct Fragment {
    tokens: TokenStream,
}

impl Fragment {
    fn push(&mut self, kind: TokenKind) -> TokenId {
        self.tokens.push_back(Token::fixed(kind))
    }

    fn push_literal(&mut self, kind: TokenKind, literal: Literal) -> TokenId {
        self.tokens.push_back(Token::synthetic(kind, literal))
    }

    /// Moves the tokens of `builder` to the end of the fragment and returns
    /// its expression.
    fn append(
        &mut self,
        builder: YaraExpressionBuilder,
    ) -> Result<Expression, BuilderError> {
        let YaraExpressionBuilder { mut tokens, expr } = builder;
        let mut expr = expr?;
        let map = self.tokens.move_all_before(None, &mut tokens)?;
        expr.remap(&map);
        Ok(expr)
    }

    fn set_force_newline(&mut self, token: TokenId) {
        if let Some(token) = self.tokens.get_mut(token) {
            token.set_force_newline(true);
        }
    }
}

/// Creates a builder from a closure that produces the expression while
/// adding its tokens to a fragment.
fn build<F>(f: F) -> YaraExpressionBuilder
where
    F: FnOnce(&mut Fragment) -> Result<Expression, BuilderError>,
{
    let mut fragment = Fragment { tokens: TokenStream::new() };
    let expr = f(&mut fragment);
    YaraExpressionBuilder { tokens: fragment.tokens, expr }
}

/// Builder for expressions made of a single token.
fn single(
    kind: TokenKind,
    literal: Literal,
    ty: ExprType,
    make: fn(TokenId) -> ExprKind,
) -> YaraExpressionBuilder {
    build(|f| Ok(Expression::new(make(f.push_literal(kind, literal)), ty)))
}

fn keyword(
    kind: TokenKind,
    ty: ExprType,
    make: fn(TokenId) -> ExprKind,
) -> YaraExpressionBuilder {
    build(|f| Ok(Expression::new(make(f.push(kind)), ty)))
}

fn failed(error: BuilderError) -> YaraExpressionBuilder {
    build(|_| Err(error))
}

impl YaraExpressionBuilder {
    /// Returns the expression, or the first error found while building it.
    pub fn get(self) -> Result<Detached<Expression>, BuilderError> {
        let expr = self.expr?;
        Ok(Detached::new(self.tokens, expr))
    }

    /// The text the expression has so far. Empty if there was an error.
    pub fn text(&self) -> String {
        match &self.expr {
            Ok(expr) => expr.text(&self.tokens),
            Err(_) => String::new(),
        }
    }

    fn binary(self, op: TokenKind, rhs: Self, linebreak: bool) -> Self {
        build(|f| {
            let lhs = f.append(self)?;
            let op_token = f.push(op);
            if linebreak {
                f.push(TokenKind::NewLine);
            }
            let rhs = f.append(rhs)?;
            let ty = binary_type(op, lhs.ty(), rhs.ty());
            let kind = ExprKind::binary(
                op,
                BinaryExpr { lhs, op: op_token, rhs },
            )
            .ok_or(BuilderError::InvalidOperand {
                operation: op.fixed_text().unwrap_or("?"),
                expr: String::new(),
            })?;
            Ok(Expression::new(kind, ty))
        })
    }

    pub fn and(self, other: Self) -> Self {
        self.binary(TokenKind::And, other, false)
    }

    pub fn or(self, other: Self) -> Self {
        self.binary(TokenKind::Or, other, false)
    }

    /// Like [`YaraExpressionBuilder::and`], but `other` goes on a new line.
    pub fn and_newline(self, other: Self) -> Self {
        self.binary(TokenKind::And, other, true)
    }

    /// Like [`YaraExpressionBuilder::or`], but `other` goes on a new line.
    pub fn or_newline(self, other: Self) -> Self {
        self.binary(TokenKind::Or, other, true)
    }

    pub fn lt(self, other: Self) -> Self {
        self.binary(TokenKind::Lt, other, false)
    }

    pub fn gt(self, other: Self) -> Self {
        self.binary(TokenKind::Gt, other, false)
    }

    pub fn le(self, other: Self) -> Self {
        self.binary(TokenKind::Le, other, false)
    }

    pub fn ge(self, other: Self) -> Self {
        self.binary(TokenKind::Ge, other, false)
    }

    pub fn eq(self, other: Self) -> Self {
        self.binary(TokenKind::Eq, other, false)
    }

    pub fn neq(self, other: Self) -> Self {
        self.binary(TokenKind::Neq, other, false)
    }

    pub fn contains(self, other: Self) -> Self {
        self.binary(TokenKind::Contains, other, false)
    }

    pub fn icontains(self, other: Self) -> Self {
        self.binary(TokenKind::IContains, other, false)
    }

    pub fn startswith(self, other: Self) -> Self {
        self.binary(TokenKind::StartsWith, other, false)
    }

    pub fn istartswith(self, other: Self) -> Self {
        self.binary(TokenKind::IStartsWith, other, false)
    }

    pub fn endswith(self, other: Self) -> Self {
        self.binary(TokenKind::EndsWith, other, false)
    }

    pub fn iendswith(self, other: Self) -> Self {
        self.binary(TokenKind::IEndsWith, other, false)
    }

    pub fn iequals(self, other: Self) -> Self {
        self.binary(TokenKind::IEquals, other, false)
    }

    pub fn matches(self, other: Self) -> Self {
        self.binary(TokenKind::Matches, other, false)
    }

    pub fn plus(self, other: Self) -> Self {
        self.binary(TokenKind::Plus, other, false)
    }

    pub fn minus(self, other: Self) -> Self {
        self.binary(TokenKind::Minus, other, false)
    }

    pub fn multiply(self, other: Self) -> Self {
        self.binary(TokenKind::Multiply, other, false)
    }

    /// Integer division, written as `\`.
    pub fn divide(self, other: Self) -> Self {
        self.binary(TokenKind::Divide, other, false)
    }

    pub fn modulo(self, other: Self) -> Self {
        self.binary(TokenKind::Modulo, other, false)
    }

    pub fn bitwise_and(self, other: Self) -> Self {
        self.binary(TokenKind::BitwiseAnd, other, false)
    }

    pub fn bitwise_or(self, other: Self) -> Self {
        self.binary(TokenKind::BitwiseOr, other, false)
    }

    pub fn bitwise_xor(self, other: Self) -> Self {
        self.binary(TokenKind::BitwiseXor, other, false)
    }

    pub fn shift_left(self, other: Self) -> Self {
        self.binary(TokenKind::ShiftLeft, other, false)
    }

    pub fn shift_right(self, other: Self) -> Self {
        self.binary(TokenKind::ShiftRight, other, false)
    }

    /// `<expr>.<attribute>`
    pub fn access(self, attribute: &str) -> Self {
        if !is_identifier(attribute) {
            return failed(BuilderError::InvalidIdentifier(
                attribute.to_string(),
            ));
        }
        build(|f| {
            let structure = f.append(self)?;
            let dot = f.push(TokenKind::Dot);
            let attribute = f.push_literal(
                TokenKind::Id,
                Literal::escaped_string(attribute),
            );
            Ok(Expression::new(
                ExprKind::StructAccess(Box::new(StructAccess {
                    structure,
                    dot,
                    attribute,
                })),
                ExprType::Undefined,
            ))
        })
    }

    /// `<expr>[<index>]`
    pub fn index(self, index: Self) -> Self {
        build(|f| {
            let array = f.append(self)?;
            let lsqb = f.push(TokenKind::LSqb);
            let index = f.append(index)?;
            let rsqb = f.push(TokenKind::RSqb);
            Ok(Expression::new(
                ExprKind::ArrayAccess(Box::new(ArrayAccess {
                    array,
                    lsqb,
                    index,
                    rsqb,
                })),
                ExprType::Undefined,
            ))
        })
    }

    /// `<expr>(<args>)`
    pub fn call(self, args: Vec<Self>) -> Self {
        build(|f| {
            let function = f.append(self)?;
            let lparen = f.push(TokenKind::LParen);
            let mut exprs = Vec::with_capacity(args.len());
            for (i, arg) in args.into_iter().enumerate() {
                if i > 0 {
                    f.push(TokenKind::Comma);
                }
                exprs.push(f.append(arg)?);
            }
            let rparen = f.push(TokenKind::RParen);
            Ok(Expression::new(
                ExprKind::FunctionCall(Box::new(FunctionCall {
                    function,
                    lparen,
                    args: exprs,
                    rparen,
                })),
                ExprType::Undefined,
            ))
        })
    }

    /// `$a at <offset>`, or `<quantifier> of <set> at <offset>`.
    pub fn at(self, offset: Self) -> Self {
        let text = self.text();
        build(|f| {
            let expr = f.append(self)?;
            let at = f.push(TokenKind::At);
            let offset = f.append(offset)?;
            let kind = match expr.kind {
                ExprKind::StringRef(id) => {
                    ExprKind::StringAt(Box::new(StringAt { id, at, offset }))
                }
                ExprKind::Of(mut of) if of.anchor.is_none() => {
                    of.anchor = Some(Anchor { keyword: at, expr: offset });
                    ExprKind::Of(of)
                }
                _ => {
                    return Err(BuilderError::InvalidOperand {
                        operation: "at",
                        expr: text,
                    })
                }
            };
            Ok(Expression::new(kind, ExprType::Bool))
        })
    }

    /// `$a in <range>`, `#a in <range>` or `<quantifier> of <set> in
    /// <range>`.
    pub fn in_range(self, range: Self) -> Self {
        let text = self.text();
        build(|f| {
            let expr = f.append(self)?;
            let in_kw = f.push(TokenKind::In);
            let range = f.append(range)?;
            if !matches!(range.kind, ExprKind::Range(_)) {
                return Err(BuilderError::InvalidOperand {
                    operation: "in",
                    expr: text,
                });
            }
            let (kind, ty) = match expr.kind {
                ExprKind::StringRef(id) => (
                    ExprKind::StringInRange(Box::new(StringInRange {
                        id,
                        in_kw,
                        range,
                    })),
                    ExprType::Bool,
                ),
                ExprKind::StringCount(id) => (
                    ExprKind::StringCountInRange(Box::new(StringInRange {
                        id,
                        in_kw,
                        range,
                    })),
                    ExprType::Int,
                ),
                ExprKind::Of(mut of) if of.anchor.is_none() => {
                    of.anchor = Some(Anchor { keyword: in_kw, expr: range });
                    (ExprKind::Of(of), ExprType::Bool)
                }
                _ => {
                    return Err(BuilderError::InvalidOperand {
                        operation: "in",
                        expr: text,
                    })
                }
            };
            Ok(Expression::new(kind, ty))
        })
    }

    /// `<expr>%`, used as the quantifier in `50% of them`.
    pub fn percent(self) -> Self {
        build(|f| {
            let operand = f.append(self)?;
            let percent = f.push(TokenKind::Percent);
            Ok(Expression::new(
                ExprKind::Percentage(Box::new(Percentage {
                    operand,
                    percent,
                })),
                ExprType::Int,
            ))
        })
    }

    /// `<quantifier> of <set>`
    pub fn of(self, set: Self) -> Self {
        build(|f| {
            let quantifier = f.append(self)?;
            let of = f.push(TokenKind::Of);
            let set = f.append(set)?;
            Ok(Expression::new(
                ExprKind::Of(Box::new(Of {
                    quantifier,
                    of,
                    set,
                    anchor: None,
                })),
                ExprType::Bool,
            ))
        })
    }
}

fn binary_type(op: TokenKind, lhs: ExprType, rhs: ExprType) -> ExprType {
    match op {
        TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Multiply
        | TokenKind::Divide
            if lhs == ExprType::Float || rhs == ExprType::Float =>
        {
            ExprType::Float
        }
        TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Multiply
        | TokenKind::Divide
        | TokenKind::Modulo
        | TokenKind::BitwiseAnd
        | TokenKind::BitwiseOr
        | TokenKind::BitwiseXor
        | TokenKind::ShiftLeft
        | TokenKind::ShiftRight => ExprType::Int,
        _ => ExprType::Bool,
    }
}

pub fn int_val(value: i64) -> YaraExpressionBuilder {
    single(
        TokenKind::IntLiteral,
        Literal::int(value),
        ExprType::Int,
        ExprKind::IntLiteral,
    )
}

/// An integer written in hexadecimal, like `0x5A4D`.
pub fn hex_int_val(value: u64) -> YaraExpressionBuilder {
    let literal = match i64::try_from(value) {
        Ok(value) => Literal::int(value),
        Err(_) => Literal::uint(value),
    };
    single(
        TokenKind::IntLiteral,
        literal.with_formatted(format!("0x{:X}", value)),
        ExprType::Int,
        ExprKind::IntLiteral,
    )
}

pub fn float_val(value: f64) -> YaraExpressionBuilder {
    single(
        TokenKind::FloatLiteral,
        Literal::float(value),
        ExprType::Float,
        ExprKind::FloatLiteral,
    )
}

pub fn bool_val(value: bool) -> YaraExpressionBuilder {
    single(
        TokenKind::BoolLiteral,
        Literal::bool(value),
        ExprType::Bool,
        ExprKind::BoolLiteral,
    )
}

/// A string literal. Characters that need it are escaped in the output.
pub fn string_val(value: &str) -> YaraExpressionBuilder {
    single(
        TokenKind::StringLiteral,
        Literal::string(value),
        ExprType::String,
        ExprKind::StringLiteral,
    )
}

/// A regular expression like `/abc/i`. `pattern` goes between the slashes,
/// the error is reported by [`YaraExpressionBuilder::get`] if it's not a
/// valid pattern.
pub fn regexp_val(pattern: &str, modifiers: &str) -> YaraExpressionBuilder {
    let text = format!("/{}/{}", pattern, modifiers);
    let regexp = match Regexp::parse(&text) {
        Ok(regexp) => regexp,
        Err(reason) => {
            return failed(BuilderError::InvalidRegexp { text, reason })
        }
    };
    build(|f| {
        let token =
            f.push_literal(TokenKind::Regexp, Literal::escaped_string(text));
        Ok(Expression::new(
            ExprKind::Regexp(Box::new(RegexpExpr { token, regexp })),
            ExprType::Regexp,
        ))
    })
}

/// An identifier: a rule, a module or a loop variable.
pub fn id(name: &str) -> YaraExpressionBuilder {
    if !is_identifier(name) {
        return failed(BuilderError::InvalidIdentifier(name.to_string()));
    }
    single(
        TokenKind::Id,
        Literal::escaped_string(name),
        ExprType::Undefined,
        ExprKind::Id,
    )
}

fn string_token(
    id: &str,
    kind: TokenKind,
    ty: ExprType,
    make: fn(TokenId) -> ExprKind,
) -> YaraExpressionBuilder {
    if !is_string_identifier(id) {
        return failed(BuilderError::InvalidStringIdentifier(id.to_string()));
    }
    single(kind, Literal::escaped_string(id), ty, make)
}

/// `$a`
pub fn string_ref(id: &str) -> YaraExpressionBuilder {
    string_token(id, TokenKind::StringId, ExprType::Bool, ExprKind::StringRef)
}

/// `$a*`, `id` is the prefix including the `$`.
pub fn string_wildcard(id: &str) -> YaraExpressionBuilder {
    if !is_string_identifier(id) {
        return failed(BuilderError::InvalidStringIdentifier(id.to_string()));
    }
    single(
        TokenKind::StringIdWildcard,
        Literal::escaped_string(format!("{}*", id)),
        ExprType::Bool,
        ExprKind::StringWildcard,
    )
}

/// `#a`, `id` is the string identifier (`$a`).
pub fn string_count(id: &str) -> YaraExpressionBuilder {
    string_token(
        id,
        TokenKind::StringCount,
        ExprType::Int,
        ExprKind::StringCount,
    )
}

fn string_indexed(
    id: &str,
    kind: TokenKind,
    index: Option<YaraExpressionBuilder>,
) -> YaraExpressionBuilder {
    if !is_string_identifier(id) {
        return failed(BuilderError::InvalidStringIdentifier(id.to_string()));
    }
    build(|f| {
        let id = f.push_literal(kind, Literal::escaped_string(id));
        let index = match index {
            Some(index) => {
                let lsqb = f.push(TokenKind::LSqb);
                let expr = f.append(index)?;
                let rsqb = f.push(TokenKind::RSqb);
                Some(Index { lsqb, expr, rsqb })
            }
            None => None,
        };
        let indexed = Box::new(StringIndexed { id, index });
        let kind = if kind == TokenKind::StringOffset {
            ExprKind::StringOffset(indexed)
        } else {
            ExprKind::StringLength(indexed)
        };
        Ok(Expression::new(kind, ExprType::Int))
    })
}

/// `@a` or `@a[<index>]`, `id` is the string identifier (`$a`).
pub fn string_offset(
    id: &str,
    index: Option<YaraExpressionBuilder>,
) -> YaraExpressionBuilder {
    string_indexed(id, TokenKind::StringOffset, index)
}

/// `!a` or `!a[<index>]`, `id` is the string identifier (`$a`).
pub fn string_length(
    id: &str,
    index: Option<YaraExpressionBuilder>,
) -> YaraExpressionBuilder {
    string_indexed(id, TokenKind::StringLength, index)
}

pub fn filesize() -> YaraExpressionBuilder {
    keyword(TokenKind::Filesize, ExprType::Int, ExprKind::Filesize)
}

pub fn entrypoint() -> YaraExpressionBuilder {
    keyword(TokenKind::Entrypoint, ExprType::Int, ExprKind::Entrypoint)
}

pub fn them() -> YaraExpressionBuilder {
    keyword(TokenKind::Them, ExprType::Undefined, ExprKind::Them)
}

pub fn all() -> YaraExpressionBuilder {
    keyword(TokenKind::All, ExprType::Undefined, ExprKind::All)
}

pub fn any() -> YaraExpressionBuilder {
    keyword(TokenKind::Any, ExprType::Undefined, ExprKind::Any)
}

pub fn none() -> YaraExpressionBuilder {
    keyword(TokenKind::None, ExprType::Undefined, ExprKind::None)
}

/// `(<expr>)`. With `linebreak` the inner expression goes on its own
/// lines.
pub fn paren(
    inner: YaraExpressionBuilder,
    linebreak: bool,
) -> YaraExpressionBuilder {
    build(|f| {
        let lparen = f.push(TokenKind::LParen);
        if linebreak {
            f.set_force_newline(lparen);
            f.push(TokenKind::NewLine);
        }
        let inner = f.append(inner)?;
        if linebreak {
            f.push(TokenKind::NewLine);
        }
        let rparen = f.push(TokenKind::RParen);
        let ty = inner.ty();
        Ok(Expression::new(
            ExprKind::Parentheses(Box::new(Parentheses {
                lparen,
                inner,
                rparen,
            })),
            ty,
        ))
    })
}

/// `(<low>..<high>)`
pub fn range(
    low: YaraExpressionBuilder,
    high: YaraExpressionBuilder,
) -> YaraExpressionBuilder {
    build(|f| {
        let lparen = f.push(TokenKind::LParen);
        let low = f.append(low)?;
        let dots = f.push(TokenKind::DoubleDot);
        let high = f.append(high)?;
        let rparen = f.push(TokenKind::RParen);
        Ok(Expression::new(
            ExprKind::Range(Box::new(Range {
                lparen,
                low,
                dots,
                high,
                rparen,
            })),
            ExprType::Int,
        ))
    })
}

/// `(<element>, <element>, ...)`
pub fn set(elements: Vec<YaraExpressionBuilder>) -> YaraExpressionBuilder {
    build(|f| {
        let lparen = f.push(TokenKind::LParen);
        let mut exprs = Vec::with_capacity(elements.len());
        for (i, element) in elements.into_iter().enumerate() {
            if i > 0 {
                f.push(TokenKind::Comma);
            }
            exprs.push(f.append(element)?);
        }
        let rparen = f.push(TokenKind::RParen);
        Ok(Expression::new(
            ExprKind::Set(Box::new(Set { lparen, elements: exprs, rparen })),
            ExprType::Undefined,
        ))
    })
}

/// `uint16(<arg>)`, `int32be(<arg>)`, etc.
pub fn int_function(
    function: &str,
    arg: YaraExpressionBuilder,
) -> YaraExpressionBuilder {
    if !is_int_function(function) {
        return failed(BuilderError::InvalidIdentifier(function.to_string()));
    }
    build(|f| {
        let function = f.push_literal(
            TokenKind::IntFunction,
            Literal::escaped_string(function),
        );
        let lparen = f.push(TokenKind::LParen);
        let arg = f.append(arg)?;
        let rparen = f.push(TokenKind::RParen);
        Ok(Expression::new(
            ExprKind::IntFunction(Box::new(IntFunction {
                function,
                lparen,
                arg,
                rparen,
            })),
            ExprType::Int,
        ))
    })
}

fn is_int_function(name: &str) -> bool {
    let name = name.strip_prefix('u').unwrap_or(name);
    let name = name.strip_suffix("be").unwrap_or(name);
    matches!(name, "int8" | "int16" | "int32")
}

/// Wraps the body of a loop in parentheses unless it already has them.
fn loop_body(body: YaraExpressionBuilder) -> YaraExpressionBuilder {
    match &body.expr {
        Ok(expr) if matches!(expr.kind, ExprKind::Parentheses(_)) => body,
        _ => paren(body, false),
    }
}

/// `for <quantifier> <vars> in <iterable> : (<body>)`
pub fn for_in(
    quantifier: YaraExpressionBuilder,
    vars: &[&str],
    iterable: YaraExpressionBuilder,
    body: YaraExpressionBuilder,
) -> YaraExpressionBuilder {
    if let Some(var) = vars.iter().find(|v| !is_identifier(v)) {
        return failed(BuilderError::InvalidIdentifier(var.to_string()));
    }
    build(|f| {
        let for_kw = f.push(TokenKind::For);
        let quantifier = f.append(quantifier)?;
        let mut var_tokens = Vec::with_capacity(vars.len());
        for (i, var) in vars.iter().enumerate() {
            if i > 0 {
                f.push(TokenKind::Comma);
            }
            var_tokens.push(
                f.push_literal(TokenKind::Id, Literal::escaped_string(*var)),
            );
        }
        let in_kw = f.push(TokenKind::In);
        let iterable = f.append(iterable)?;
        let colon = f.push(TokenKind::Colon);
        let body = f.append(loop_body(body))?;
        Ok(Expression::new(
            ExprKind::ForIn(Box::new(ForIn {
                for_kw,
                quantifier,
                vars: var_tokens,
                in_kw,
                iterable,
                colon,
                body,
            })),
            ExprType::Bool,
        ))
    })
}

/// `for <quantifier> of <set> : (<body>)`
pub fn for_of(
    quantifier: YaraExpressionBuilder,
    set: YaraExpressionBuilder,
    body: YaraExpressionBuilder,
) -> YaraExpressionBuilder {
    build(|f| {
        let for_kw = f.push(TokenKind::For);
        let quantifier = f.append(quantifier)?;
        let of = f.push(TokenKind::Of);
        let set = f.append(set)?;
        let colon = f.push(TokenKind::Colon);
        let body = f.append(loop_body(body))?;
        Ok(Expression::new(
            ExprKind::ForOf(Box::new(ForOf {
                for_kw,
                quantifier,
                of,
                set,
                colon,
                body,
            })),
            ExprType::Bool,
        ))
    })
}

fn join(
    terms: Vec<YaraExpressionBuilder>,
    op: TokenKind,
    linebreaks: bool,
) -> YaraExpressionBuilder {
    let mut terms = terms.into_iter();
    let Some(mut result) = terms.next() else {
        return failed(BuilderError::InvalidOperand {
            operation: op.fixed_text().unwrap_or("?"),
            expr: String::new(),
        });
    };
    for term in terms {
        result = result.binary(op, term, linebreaks);
    }
    result
}

/// Joins the terms with `and`. With `linebreaks` every term after the first
/// one goes on a new line.
pub fn conjunction(
    terms: Vec<YaraExpressionBuilder>,
    linebreaks: bool,
) -> YaraExpressionBuilder {
    join(terms, TokenKind::And, linebreaks)
}

/// Joins the terms with `or`. With `linebreaks` every term after the first
/// one goes on a new line.
pub fn disjunction(
    terms: Vec<YaraExpressionBuilder>,
    linebreaks: bool,
) -> YaraExpressionBuilder {
    join(terms, TokenKind::Or, linebreaks)
}

fn unary(
    op: TokenKind,
    operand: YaraExpressionBuilder,
    ty: Option<ExprType>,
) -> YaraExpressionBuilder {
    build(|f| {
        let op_token = f.push(op);
        let operand = f.append(operand)?;
        let ty = ty.unwrap_or(operand.ty());
        let kind = ExprKind::unary(op, UnaryExpr { op: op_token, operand })
            .ok_or(BuilderError::InvalidOperand {
                operation: op.fixed_text().unwrap_or("?"),
                expr: String::new(),
            })?;
        Ok(Expression::new(kind, ty))
    })
}

/// `not <expr>`
pub fn not(operand: YaraExpressionBuilder) -> YaraExpressionBuilder {
    unary(TokenKind::Not, operand, Some(ExprType::Bool))
}

/// `defined <expr>`
pub fn defined(operand: YaraExpressionBuilder) -> YaraExpressionBuilder {
    unary(TokenKind::Defined, operand, Some(ExprType::Bool))
}

/// `-<expr>`
pub fn neg(operand: YaraExpressionBuilder) -> YaraExpressionBuilder {
    unary(TokenKind::UnaryMinus, operand, None)
}

/// `~<expr>`
pub fn bitwise_not(operand: YaraExpressionBuilder) -> YaraExpressionBuilder {
    unary(TokenKind::BitwiseNot, operand, Some(ExprType::Int))
}
