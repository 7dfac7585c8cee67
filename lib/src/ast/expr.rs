use crate::ast::regexp::Regexp;
use crate::tokens::{Remap, TokenId, TokenKind, TokenMap, TokenStream};
use crate::types::ExprType;

/// A node in the syntax tree of a rule condition.
///
/// Expressions don't store text, only handles to the tokens they were built
/// from. The text returned by [`Expression::text`] is always derived from
/// the current content of those tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    ty: ExprType,
}

/// Every kind of expression in a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `true` or `false`.
    BoolLiteral(TokenId),
    StringLiteral(TokenId),
    IntLiteral(TokenId),
    FloatLiteral(TokenId),
    Regexp(Box<RegexpExpr>),

    Filesize(TokenId),
    Entrypoint(TokenId),
    All(TokenId),
    Any(TokenId),
    None(TokenId),
    Them(TokenId),

    /// An identifier: a rule name, a module, a loop variable or a
    /// VirusTotal global.
    Id(TokenId),

    /// `$a`
    StringRef(TokenId),
    /// `$a*`, only valid inside sets.
    StringWildcard(TokenId),
    /// `$a at <expr>`
    StringAt(Box<StringAt>),
    /// `$a in (<low>..<high>)`
    StringInRange(Box<StringInRange>),
    /// `#a`
    StringCount(TokenId),
    /// `#a in (<low>..<high>)`
    StringCountInRange(Box<StringInRange>),
    /// `@a` or `@a[<index>]`
    StringOffset(Box<StringIndexed>),
    /// `!a` or `!a[<index>]`
    StringLength(Box<StringIndexed>),

    Not(Box<UnaryExpr>),
    UnaryMinus(Box<UnaryExpr>),
    BitwiseNot(Box<UnaryExpr>),
    Defined(Box<UnaryExpr>),

    And(Box<BinaryExpr>),
    Or(Box<BinaryExpr>),
    Lt(Box<BinaryExpr>),
    Gt(Box<BinaryExpr>),
    Le(Box<BinaryExpr>),
    Ge(Box<BinaryExpr>),
    Eq(Box<BinaryExpr>),
    Neq(Box<BinaryExpr>),
    Contains(Box<BinaryExpr>),
    IContains(Box<BinaryExpr>),
    StartsWith(Box<BinaryExpr>),
    IStartsWith(Box<BinaryExpr>),
    EndsWith(Box<BinaryExpr>),
    IEndsWith(Box<BinaryExpr>),
    IEquals(Box<BinaryExpr>),
    Matches(Box<BinaryExpr>),
    Plus(Box<BinaryExpr>),
    Minus(Box<BinaryExpr>),
    Multiply(Box<BinaryExpr>),
    Divide(Box<BinaryExpr>),
    Modulo(Box<BinaryExpr>),
    BitwiseXor(Box<BinaryExpr>),
    BitwiseAnd(Box<BinaryExpr>),
    BitwiseOr(Box<BinaryExpr>),
    ShiftLeft(Box<BinaryExpr>),
    ShiftRight(Box<BinaryExpr>),

    Parentheses(Box<Parentheses>),
    Range(Box<Range>),
    Set(Box<Set>),

    StructAccess(Box<StructAccess>),
    ArrayAccess(Box<ArrayAccess>),
    FunctionCall(Box<FunctionCall>),
    /// `uint8(<expr>)`, `int32be(<expr>)`, etc.
    IntFunction(Box<IntFunction>),

    /// `<quantifier> of <set> [at <expr> | in <range>]`
    Of(Box<Of>),
    /// `for <quantifier> of <set> : (<expr>)`
    ForOf(Box<ForOf>),
    /// `for <quantifier> <vars> in <iterable> : (<expr>)`
    ForIn(Box<ForIn>),
    /// `<expr>%`, as in `50% of them`.
    Percentage(Box<Percentage>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegexpExpr {
    pub token: TokenId,
    pub regexp: Regexp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: TokenId,
    pub operand: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub lhs: Expression,
    pub op: TokenId,
    pub rhs: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringAt {
    pub id: TokenId,
    pub at: TokenId,
    pub offset: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringInRange {
    pub id: TokenId,
    pub in_kw: TokenId,
    pub range: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringIndexed {
    pub id: TokenId,
    pub index: Option<Index>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub lsqb: TokenId,
    pub expr: Expression,
    pub rsqb: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parentheses {
    pub lparen: TokenId,
    pub inner: Expression,
    pub rparen: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Range {
    pub lparen: TokenId,
    pub low: Expression,
    pub dots: TokenId,
    pub high: Expression,
    pub rparen: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub lparen: TokenId,
    pub elements: Vec<Expression>,
    pub rparen: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructAccess {
    pub structure: Expression,
    pub dot: TokenId,
    pub attribute: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccess {
    pub array: Expression,
    pub lsqb: TokenId,
    pub index: Expression,
    pub rsqb: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function: Expression,
    pub lparen: TokenId,
    pub args: Vec<Expression>,
    pub rparen: TokenId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntFunction {
    pub function: TokenId,
    pub lparen: TokenId,
    pub arg: Expression,
    pub rparen: TokenId,
}

/// The `at <expr>` or `in <range>` that may follow `<quantifier> of <set>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub keyword: TokenId,
    pub expr: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Of {
    pub quantifier: Expression,
    pub of: TokenId,
    pub set: Expression,
    pub anchor: Option<Anchor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForOf {
    pub for_kw: TokenId,
    pub quantifier: Expression,
    pub of: TokenId,
    pub set: Expression,
    pub colon: TokenId,
    pub body: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForIn {
    pub for_kw: TokenId,
    pub quantifier: Expression,
    pub vars: Vec<TokenId>,
    pub in_kw: TokenId,
    pub iterable: Expression,
    pub colon: TokenId,
    pub body: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Percentage {
    pub operand: Expression,
    pub percent: TokenId,
}

impl ExprKind {
    /// Creates a binary expression for the given operator. Returns `None`
    /// if `op` is not a binary operator.
    pub fn binary(op: TokenKind, expr: BinaryExpr) -> Option<Self> {
        let expr = Box::new(expr);
        Some(match op {
            TokenKind::And => Self::And(expr),
            TokenKind::Or => Self::Or(expr),
            TokenKind::Lt => Self::Lt(expr),
            TokenKind::Gt => Self::Gt(expr),
            TokenKind::Le => Self::Le(expr),
            TokenKind::Ge => Self::Ge(expr),
            TokenKind::Eq => Self::Eq(expr),
            TokenKind::Neq => Self::Neq(expr),
            TokenKind::Contains => Self::Contains(expr),
            TokenKind::IContains => Self::IContains(expr),
            TokenKind::StartsWith => Self::StartsWith(expr),
            TokenKind::IStartsWith => Self::IStartsWith(expr),
            TokenKind::EndsWith => Self::EndsWith(expr),
            TokenKind::IEndsWith => Self::IEndsWith(expr),
            TokenKind::IEquals => Self::IEquals(expr),
            TokenKind::Matches => Self::Matches(expr),
            TokenKind::Plus => Self::Plus(expr),
            TokenKind::Minus => Self::Minus(expr),
            TokenKind::Multiply => Self::Multiply(expr),
            TokenKind::Divide => Self::Divide(expr),
            TokenKind::Modulo => Self::Modulo(expr),
            TokenKind::BitwiseXor => Self::BitwiseXor(expr),
            TokenKind::BitwiseAnd => Self::BitwiseAnd(expr),
            TokenKind::BitwiseOr => Self::BitwiseOr(expr),
            TokenKind::ShiftLeft => Self::ShiftLeft(expr),
            TokenKind::ShiftRight => Self::ShiftRight(expr),
            _ => return None,
        })
    }

    /// Creates a unary expression for the given operator. Returns `None` if
    /// `op` is not a unary operator.
    pub fn unary(op: TokenKind, expr: UnaryExpr) -> Option<Self> {
        let expr = Box::new(expr);
        Some(match op {
            TokenKind::Not => Self::Not(expr),
            TokenKind::UnaryMinus => Self::UnaryMinus(expr),
            TokenKind::BitwiseNot => Self::BitwiseNot(expr),
            TokenKind::Defined => Self::Defined(expr),
            _ => return None,
        })
    }

    pub fn as_binary(&self) -> Option<&BinaryExpr> {
        match self {
            Self::And(e)
            | Self::Or(e)
            | Self::Lt(e)
            | Self::Gt(e)
            | Self::Le(e)
            | Self::Ge(e)
            | Self::Eq(e)
            | Self::Neq(e)
            | Self::Contains(e)
            | Self::IContains(e)
            | Self::StartsWith(e)
            | Self::IStartsWith(e)
            | Self::EndsWith(e)
            | Self::IEndsWith(e)
            | Self::IEquals(e)
            | Self::Matches(e)
            | Self::Plus(e)
            | Self::Minus(e)
            | Self::Multiply(e)
            | Self::Divide(e)
            | Self::Modulo(e)
            | Self::BitwiseXor(e)
            | Self::BitwiseAnd(e)
            | Self::BitwiseOr(e)
            | Self::ShiftLeft(e)
            | Self::ShiftRight(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_unary(&self) -> Option<&UnaryExpr> {
        match self {
            Self::Not(e)
            | Self::UnaryMinus(e)
            | Self::BitwiseNot(e)
            | Self::Defined(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the token when the expression consists of a single token.
    pub fn as_token(&self) -> Option<TokenId> {
        match self {
            Self::BoolLiteral(t)
            | Self::StringLiteral(t)
            | Self::IntLiteral(t)
            | Self::FloatLiteral(t)
            | Self::Filesize(t)
            | Self::Entrypoint(t)
            | Self::All(t)
            | Self::Any(t)
            | Self::None(t)
            | Self::Them(t)
            | Self::Id(t)
            | Self::StringRef(t)
            | Self::StringWildcard(t)
            | Self::StringCount(t) => Some(*t),
            Self::Regexp(r) => Some(r.token),
            Self::StringOffset(s) | Self::StringLength(s)
                if s.index.is_none() =>
            {
                Some(s.id)
            }
            _ => None,
        }
    }
}

impl Expression {
    pub fn new(kind: ExprKind, ty: ExprType) -> Self {
        Self { kind, ty }
    }

    /// The type of the value the expression produces.
    #[inline]
    pub fn ty(&self) -> ExprType {
        self.ty
    }

    /// The first token of the expression.
    pub fn first_token(&self) -> TokenId {
        if let Some(token) = self.kind.as_token() {
            return token;
        }
        if let Some(binary) = self.kind.as_binary() {
            return binary.lhs.first_token();
        }
        if let Some(unary) = self.kind.as_unary() {
            return unary.op;
        }
        match &self.kind {
            ExprKind::StringAt(e) => e.id,
            ExprKind::StringInRange(e) | ExprKind::StringCountInRange(e) => {
                e.id
            }
            ExprKind::StringOffset(e) | ExprKind::StringLength(e) => e.id,
            ExprKind::Parentheses(e) => e.lparen,
            ExprKind::Range(e) => e.lparen,
            ExprKind::Set(e) => e.lparen,
            ExprKind::StructAccess(e) => e.structure.first_token(),
            ExprKind::ArrayAccess(e) => e.array.first_token(),
            ExprKind::FunctionCall(e) => e.function.first_token(),
            ExprKind::IntFunction(e) => e.function,
            ExprKind::Of(e) => e.quantifier.first_token(),
            ExprKind::ForOf(e) => e.for_kw,
            ExprKind::ForIn(e) => e.for_kw,
            ExprKind::Percentage(e) => e.operand.first_token(),
            _ => unreachable!(),
        }
    }

    /// The last token of the expression.
    pub fn last_token(&self) -> TokenId {
        if let Some(token) = self.kind.as_token() {
            return token;
        }
        if let Some(binary) = self.kind.as_binary() {
            return binary.rhs.last_token();
        }
        if let Some(unary) = self.kind.as_unary() {
            return unary.operand.last_token();
        }
        match &self.kind {
            ExprKind::StringAt(e) => e.offset.last_token(),
            ExprKind::StringInRange(e) | ExprKind::StringCountInRange(e) => {
                e.range.last_token()
            }
            ExprKind::StringOffset(e) | ExprKind::StringLength(e) => {
                match &e.index {
                    Some(index) => index.rsqb,
                    None => e.id,
                }
            }
            ExprKind::Parentheses(e) => e.rparen,
            ExprKind::Range(e) => e.rparen,
            ExprKind::Set(e) => e.rparen,
            ExprKind::StructAccess(e) => e.attribute,
            ExprKind::ArrayAccess(e) => e.rsqb,
            ExprKind::FunctionCall(e) => e.rparen,
            ExprKind::IntFunction(e) => e.rparen,
            ExprKind::Of(e) => match &e.anchor {
                Some(anchor) => anchor.expr.last_token(),
                None => e.set.last_token(),
            },
            ExprKind::ForOf(e) => e.body.last_token(),
            ExprKind::ForIn(e) => e.body.last_token(),
            ExprKind::Percentage(e) => e.percent,
            _ => unreachable!(),
        }
    }

    /// The direct children of this expression, in source order.
    pub fn children(&self) -> Vec<&Expression> {
        if let Some(binary) = self.kind.as_binary() {
            return vec![&binary.lhs, &binary.rhs];
        }
        if let Some(unary) = self.kind.as_unary() {
            return vec![&unary.operand];
        }
        match &self.kind {
            ExprKind::StringAt(e) => vec![&e.offset],
            ExprKind::StringInRange(e) | ExprKind::StringCountInRange(e) => {
                vec![&e.range]
            }
            ExprKind::StringOffset(e) | ExprKind::StringLength(e) => {
                e.index.iter().map(|index| &index.expr).collect()
            }
            ExprKind::Parentheses(e) => vec![&e.inner],
            ExprKind::Range(e) => vec![&e.low, &e.high],
            ExprKind::Set(e) => e.elements.iter().collect(),
            ExprKind::StructAccess(e) => vec![&e.structure],
            ExprKind::ArrayAccess(e) => vec![&e.array, &e.index],
            ExprKind::FunctionCall(e) => {
                let mut children = vec![&e.function];
                children.extend(e.args.iter());
                children
            }
            ExprKind::IntFunction(e) => vec![&e.arg],
            ExprKind::Of(e) => {
                let mut children = vec![&e.quantifier, &e.set];
                children.extend(e.anchor.iter().map(|a| &a.expr));
                children
            }
            ExprKind::ForOf(e) => vec![&e.quantifier, &e.set, &e.body],
            ExprKind::ForIn(e) => vec![&e.quantifier, &e.iterable, &e.body],
            ExprKind::Percentage(e) => vec![&e.operand],
            _ => vec![],
        }
    }

    /// Mutable version of [`Expression::children`].
    pub fn children_mut(&mut self) -> Vec<&mut Expression> {
        self.parts_mut().1
    }

    /// The handles of the tokens owned directly by this expression, and the
    /// children of the expression.
    fn parts_mut(&mut self) -> (Vec<&mut TokenId>, Vec<&mut Expression>) {
        match &mut self.kind {
            ExprKind::BoolLiteral(t)
            | ExprKind::StringLiteral(t)
            | ExprKind::IntLiteral(t)
            | ExprKind::FloatLiteral(t)
            | ExprKind::Filesize(t)
            | ExprKind::Entrypoint(t)
            | ExprKind::All(t)
            | ExprKind::Any(t)
            | ExprKind::None(t)
            | ExprKind::Them(t)
            | ExprKind::Id(t)
            | ExprKind::StringRef(t)
            | ExprKind::StringWildcard(t)
            | ExprKind::StringCount(t) => (vec![t], vec![]),
            ExprKind::Regexp(e) => (vec![&mut e.token], vec![]),
            ExprKind::Not(e)
            | ExprKind::UnaryMinus(e)
            | ExprKind::BitwiseNot(e)
            | ExprKind::Defined(e) => (vec![&mut e.op], vec![&mut e.operand]),
            ExprKind::And(e)
            | ExprKind::Or(e)
            | ExprKind::Lt(e)
            | ExprKind::Gt(e)
            | ExprKind::Le(e)
            | ExprKind::Ge(e)
            | ExprKind::Eq(e)
            | ExprKind::Neq(e)
            | ExprKind::Contains(e)
            | ExprKind::IContains(e)
            | ExprKind::StartsWith(e)
            | ExprKind::IStartsWith(e)
            | ExprKind::EndsWith(e)
            | ExprKind::IEndsWith(e)
            | ExprKind::IEquals(e)
            | ExprKind::Matches(e)
            | ExprKind::Plus(e)
            | ExprKind::Minus(e)
            | ExprKind::Multiply(e)
            | ExprKind::Divide(e)
            | ExprKind::Modulo(e)
            | ExprKind::BitwiseXor(e)
            | ExprKind::BitwiseAnd(e)
            | ExprKind::BitwiseOr(e)
            | ExprKind::ShiftLeft(e)
            | ExprKind::ShiftRight(e) => {
                (vec![&mut e.op], vec![&mut e.lhs, &mut e.rhs])
            }
            ExprKind::StringAt(e) => {
                (vec![&mut e.id, &mut e.at], vec![&mut e.offset])
            }
            ExprKind::StringInRange(e) | ExprKind::StringCountInRange(e) => {
                (vec![&mut e.id, &mut e.in_kw], vec![&mut e.range])
            }
            ExprKind::StringOffset(e) | ExprKind::StringLength(e) => {
                match &mut e.index {
                    Some(index) => (
                        vec![&mut e.id, &mut index.lsqb, &mut index.rsqb],
                        vec![&mut index.expr],
                    ),
                    None => (vec![&mut e.id], vec![]),
                }
            }
            ExprKind::Parentheses(e) => {
                (vec![&mut e.lparen, &mut e.rparen], vec![&mut e.inner])
            }
            ExprKind::Range(e) => (
                vec![&mut e.lparen, &mut e.dots, &mut e.rparen],
                vec![&mut e.low, &mut e.high],
            ),
            ExprKind::Set(e) => (
                vec![&mut e.lparen, &mut e.rparen],
                e.elements.iter_mut().collect(),
            ),
            ExprKind::StructAccess(e) => {
                (vec![&mut e.dot, &mut e.attribute], vec![&mut e.structure])
            }
            ExprKind::ArrayAccess(e) => (
                vec![&mut e.lsqb, &mut e.rsqb],
                vec![&mut e.array, &mut e.index],
            ),
            ExprKind::FunctionCall(e) => {
                let mut children = vec![&mut e.function];
                children.extend(e.args.iter_mut());
                (vec![&mut e.lparen, &mut e.rparen], children)
            }
            ExprKind::IntFunction(e) => (
                vec![&mut e.function, &mut e.lparen, &mut e.rparen],
                vec![&mut e.arg],
            ),
            ExprKind::Of(e) => {
                let mut tokens = vec![&mut e.of];
                let mut children = vec![&mut e.quantifier, &mut e.set];
                if let Some(anchor) = &mut e.anchor {
                    tokens.push(&mut anchor.keyword);
                    children.push(&mut anchor.expr);
                }
                (tokens, children)
            }
            ExprKind::ForOf(e) => (
                vec![&mut e.for_kw, &mut e.of, &mut e.colon],
                vec![&mut e.quantifier, &mut e.set, &mut e.body],
            ),
            ExprKind::ForIn(e) => {
                let mut tokens =
                    vec![&mut e.for_kw, &mut e.in_kw, &mut e.colon];
                tokens.extend(e.vars.iter_mut());
                (tokens, vec![&mut e.quantifier, &mut e.iterable, &mut e.body])
            }
            ExprKind::Percentage(e) => {
                (vec![&mut e.percent], vec![&mut e.operand])
            }
        }
    }

    /// Returns the text of the expression, with a single space between
    /// tokens where one is needed, regardless of the original formatting.
    pub fn text(&self, tokens: &TokenStream) -> String {
        let t = |id: TokenId| tokens.text(id);
        if let Some(token) = self.kind.as_token() {
            return t(token);
        }
        if let Some(b) = self.kind.as_binary() {
            return format!(
                "{} {} {}",
                b.lhs.text(tokens),
                t(b.op),
                b.rhs.text(tokens)
            );
        }
        match &self.kind {
            ExprKind::Not(e) | ExprKind::Defined(e) => {
                format!("{} {}", t(e.op), e.operand.text(tokens))
            }
            ExprKind::UnaryMinus(e) | ExprKind::BitwiseNot(e) => {
                format!("{}{}", t(e.op), e.operand.text(tokens))
            }
            ExprKind::StringAt(e) => format!(
                "{} {} {}",
                t(e.id),
                t(e.at),
                e.offset.text(tokens)
            ),
            ExprKind::StringInRange(e) | ExprKind::StringCountInRange(e) => {
                format!("{} {} {}", t(e.id), t(e.in_kw), e.range.text(tokens))
            }
            ExprKind::StringOffset(e) | ExprKind::StringLength(e) => {
                match &e.index {
                    Some(index) => {
                        format!("{}[{}]", t(e.id), index.expr.text(tokens))
                    }
                    None => t(e.id),
                }
            }
            ExprKind::Parentheses(e) => format!("({})", e.inner.text(tokens)),
            ExprKind::Range(e) => format!(
                "({}..{})",
                e.low.text(tokens),
                e.high.text(tokens)
            ),
            ExprKind::Set(e) => {
                format!("({})", join(&e.elements, tokens))
            }
            ExprKind::StructAccess(e) => {
                format!("{}.{}", e.structure.text(tokens), t(e.attribute))
            }
            ExprKind::ArrayAccess(e) => format!(
                "{}[{}]",
                e.array.text(tokens),
                e.index.text(tokens)
            ),
            ExprKind::FunctionCall(e) => format!(
                "{}({})",
                e.function.text(tokens),
                join(&e.args, tokens)
            ),
            ExprKind::IntFunction(e) => {
                format!("{}({})", t(e.function), e.arg.text(tokens))
            }
            ExprKind::Of(e) => {
                let mut text = format!(
                    "{} {} {}",
                    e.quantifier.text(tokens),
                    t(e.of),
                    e.set.text(tokens)
                );
                if let Some(anchor) = &e.anchor {
                    text.push_str(&format!(
                        " {} {}",
                        t(anchor.keyword),
                        anchor.expr.text(tokens)
                    ));
                }
                text
            }
            ExprKind::ForOf(e) => format!(
                "{} {} {} {} {} {}",
                t(e.for_kw),
                e.quantifier.text(tokens),
                t(e.of),
                e.set.text(tokens),
                t(e.colon),
                e.body.text(tokens)
            ),
            ExprKind::ForIn(e) => {
                let vars: Vec<String> = e.vars.iter().map(|v| t(*v)).collect();
                format!(
                    "{} {} {} {} {} {} {}",
                    t(e.for_kw),
                    e.quantifier.text(tokens),
                    vars.join(", "),
                    t(e.in_kw),
                    e.iterable.text(tokens),
                    t(e.colon),
                    e.body.text(tokens)
                )
            }
            ExprKind::Percentage(e) => {
                format!("{}{}", e.operand.text(tokens), t(e.percent))
            }
            _ => String::new(),
        }
    }
}

fn join(exprs: &[Expression], tokens: &TokenStream) -> String {
    let texts: Vec<String> = exprs.iter().map(|e| e.text(tokens)).collect();
    texts.join(", ")
}

impl Remap for Expression {
    fn remap(&mut self, map: &TokenMap) {
        let (tokens, children) = self.parts_mut();
        for token in tokens {
            token.remap(map);
        }
        for child in children {
            child.remap(map);
        }
    }
}
