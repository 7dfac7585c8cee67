use std::rc::Rc;

use itertools::Itertools;

use crate::ast::*;
use crate::literal::Literal;
use crate::parser::{ErrorInfo, Parser, ParserError};
use crate::symbols::{Symbol, SymbolLookup, SymbolTable};
use crate::tokens::{TokenId, TokenKind};
use crate::types::ExprType;

/// Side of an operator where a wrong operand was found.
#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left-hand side",
            Side::Right => "right-hand side",
        }
    }
}

const BOOLEAN: &[ExprType] =
    &[ExprType::Bool, ExprType::Int, ExprType::Float, ExprType::String];
const NUMERIC: &[ExprType] = &[ExprType::Int, ExprType::Float];
const INTEGER: &[ExprType] = &[ExprType::Int];
const STRING: &[ExprType] = &[ExprType::String];
const REGEXP: &[ExprType] = &[ExprType::Regexp];

/// Names of the functions that read integers from the scanned data.
const INT_FUNCTIONS: &[&str] = &[
    "int8", "int16", "int32", "int8be", "int16be", "int32be", "uint8",
    "uint16", "uint32", "uint8be", "uint16be", "uint32be",
];

impl<'a> Parser<'a> {
    /// Parses a boolean expression, like a rule condition or the body of a
    /// loop.
    pub(super) fn boolean_expr(&mut self) -> Result<Expression, ParserError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.and_expr()?;
        while let Some(op) = self.accept(TokenKind::Or) {
            let rhs = self.and_expr()?;
            lhs = self.binary(lhs, op, rhs, BOOLEAN, ExprType::Bool)?;
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.not_expr()?;
        while let Some(op) = self.accept(TokenKind::And) {
            let rhs = self.not_expr()?;
            lhs = self.binary(lhs, op, rhs, BOOLEAN, ExprType::Bool)?;
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expression, ParserError> {
        match self.peek() {
            Some(TokenKind::Not) => {
                let op = self.bump()?;
                let operand = self.not_expr()?;
                self.check_type(op, &operand, BOOLEAN, Side::Right)?;
                self.unary(op, TokenKind::Not, operand, ExprType::Bool)
            }
            Some(TokenKind::Defined) => {
                let op = self.bump()?;
                let operand = self.not_expr()?;
                self.unary(op, TokenKind::Defined, operand, ExprType::Bool)
            }
            _ => self.of_expr(),
        }
    }

    /// Parses quantified expressions like `any of them`, loops, and
    /// anything with higher precedence.
    fn of_expr(&mut self) -> Result<Expression, ParserError> {
        match (self.peek(), self.peek_nth(1)) {
            (Some(TokenKind::For), _) => return self.for_expr(),
            (
                Some(TokenKind::All | TokenKind::Any | TokenKind::None),
                Some(TokenKind::Of),
            ) => {
                let quantifier = self.quantifier()?;
                return self.of_rest(quantifier);
            }
            _ => {}
        }
        let expr = self.eq_expr()?;
        match (self.peek(), self.peek_nth(1)) {
            (Some(TokenKind::Modulo), Some(TokenKind::Of)) => {
                let quantifier = self.percentage(expr)?;
                self.of_rest(quantifier)
            }
            (Some(TokenKind::Of), _) => {
                if let Some(of) = self.ctx.peek_id(0) {
                    self.check_type(of, &expr, INTEGER, Side::Left)?;
                }
                self.of_rest(expr)
            }
            _ => Ok(expr),
        }
    }

    /// Parses the part of `<quantifier> of <set> [at <expr> | in <range>]`
    /// that follows the quantifier.
    fn of_rest(
        &mut self,
        quantifier: Expression,
    ) -> Result<Expression, ParserError> {
        let of = self.expect(TokenKind::Of)?;
        let set = self.string_set()?;
        let anchor = match self.peek() {
            Some(TokenKind::At) => {
                let keyword = self.bump()?;
                let expr = self.bor_expr()?;
                self.check_type(keyword, &expr, INTEGER, Side::Right)?;
                Some(Anchor { keyword, expr })
            }
            Some(TokenKind::In) => {
                let keyword = self.bump()?;
                Some(Anchor { keyword, expr: self.range()? })
            }
            _ => None,
        };
        Ok(Expression::new(
            ExprKind::Of(Box::new(Of { quantifier, of, set, anchor })),
            ExprType::Bool,
        ))
    }

    /// Parses `all`, `any`, `none`, an integer expression or a percentage.
    fn quantifier(&mut self) -> Result<Expression, ParserError> {
        let kind = match self.peek() {
            Some(TokenKind::All) => ExprKind::All,
            Some(TokenKind::Any) => ExprKind::Any,
            Some(TokenKind::None) => ExprKind::None,
            _ => {
                let expr = self.add_expr()?;
                if self.peek() == Some(TokenKind::Modulo) {
                    return self.percentage(expr);
                }
                if let Some(next) = self.ctx.peek_id(0) {
                    self.check_type(next, &expr, INTEGER, Side::Left)?;
                }
                return Ok(expr);
            }
        };
        let token = self.bump()?;
        Ok(Expression::new(kind(token), ExprType::Int))
    }

    fn percentage(
        &mut self,
        operand: Expression,
    ) -> Result<Expression, ParserError> {
        let percent = self.expect(TokenKind::Modulo)?;
        self.refine(percent, TokenKind::Percent);
        self.check_type(percent, &operand, INTEGER, Side::Left)?;
        Ok(Expression::new(
            ExprKind::Percentage(Box::new(Percentage { operand, percent })),
            ExprType::Int,
        ))
    }

    fn for_expr(&mut self) -> Result<Expression, ParserError> {
        let for_kw = self.expect(TokenKind::For)?;
        let quantifier = self.quantifier()?;

        if self.peek() == Some(TokenKind::Of) {
            let of = self.bump()?;
            let set = self.string_set()?;
            let colon = self.expect(TokenKind::Colon)?;
            self.for_of_depth += 1;
            let body = self.parenthesized();
            self.for_of_depth -= 1;
            return Ok(Expression::new(
                ExprKind::ForOf(Box::new(ForOf {
                    for_kw,
                    quantifier,
                    of,
                    set,
                    colon,
                    body: body?,
                })),
                ExprType::Bool,
            ));
        }

        let mut vars = vec![self.expect(TokenKind::Ident)?];
        while self.accept(TokenKind::Comma).is_some() {
            vars.push(self.expect(TokenKind::Ident)?);
        }
        let in_kw = self.expect(TokenKind::In)?;
        let iterable = self.iterable()?;
        let var_types = self.loop_var_symbols(&iterable, &vars)?;

        let mut scope = SymbolTable::new();
        for (var, symbol) in vars.iter().zip(var_types) {
            let name = self.text_of(*var);
            if scope.contains(&name) || self.is_defined(&name) {
                return Err(self
                    .error_at(*var, ErrorInfo::RedefinedIdentifier { name }));
            }
            self.refine(*var, TokenKind::Id);
            self.set_literal(*var, Literal::symbol(symbol.clone()));
            scope.insert(symbol);
        }

        let colon = self.expect(TokenKind::Colon)?;
        self.loop_vars.push(scope);
        let body = self.parenthesized();
        self.loop_vars.pop();

        Ok(Expression::new(
            ExprKind::ForIn(Box::new(ForIn {
                for_kw,
                quantifier,
                vars,
                in_kw,
                iterable,
                colon,
                body: body?,
            })),
            ExprType::Bool,
        ))
    }

    /// True if `name` is already taken by a loop variable, a rule, an
    /// imported module or a global.
    fn is_defined(&self, name: &str) -> bool {
        self.loop_vars.contains(name)
            || self.rule_names.contains_key(name)
            || self.imported.contains_key(name)
            || self.vt_symbols.contains(name)
    }

    /// Parses what a `for .. in` loop iterates over: a range, a set of
    /// integers or strings, an array or a dictionary.
    fn iterable(&mut self) -> Result<Expression, ParserError> {
        if self.peek() != Some(TokenKind::LParen) {
            let expr = self.postfix_expr()?;
            let iterable = self
                .symbol_of(&expr)
                .map_or(false, |s| s.is_array() || s.is_dictionary());
            if !iterable {
                return Err(self.error_at(
                    expr.first_token(),
                    ErrorInfo::InvalidAccess {
                        expr: expr.text(self.tokens()),
                        expected: "an array or dictionary".to_string(),
                    },
                ));
            }
            return Ok(expr);
        }

        let lparen = self.bump()?;
        let first = self.bor_expr()?;

        if let Some(dots) = self.accept(TokenKind::DoubleDot) {
            let high = self.bor_expr()?;
            let rparen = self.expect(TokenKind::RParen)?;
            return self.make_range(lparen, first, dots, high, rparen);
        }

        let mut elements = vec![first];
        while self.accept(TokenKind::Comma).is_some() {
            elements.push(self.bor_expr()?);
        }
        let rparen = self.expect(TokenKind::RParen)?;

        let ty = elements[0].ty();
        let accepted: &[ExprType] =
            if ty == ExprType::String { STRING } else { INTEGER };
        for element in &elements {
            self.check_type(lparen, element, accepted, Side::Right)?;
        }

        Ok(Expression::new(
            ExprKind::Set(Box::new(Set { lparen, elements, rparen })),
            ty,
        ))
    }

    /// Creates the symbols of the variables of a `for .. in` loop.
    fn loop_var_symbols(
        &self,
        iterable: &Expression,
        vars: &[TokenId],
    ) -> Result<Vec<Rc<Symbol>>, ParserError> {
        let names: Vec<String> =
            vars.iter().map(|v| self.text_of(*v)).collect();
        let element = |name: &str, symbol: &Symbol| -> Rc<Symbol> {
            match symbol.element_structure() {
                Some(structure) => Rc::new(structure.renamed(name)),
                None => Rc::new(Symbol::value(
                    name,
                    symbol.element_type().unwrap_or_default(),
                )),
            }
        };

        let (expected, symbols) = match self.symbol_of(iterable) {
            Some(symbol) if symbol.is_dictionary() => (
                2,
                names
                    .first()
                    .map(|key| {
                        Rc::new(Symbol::value(key.as_str(), ExprType::String))
                    })
                    .into_iter()
                    .chain(names.get(1).map(|value| element(value, &symbol)))
                    .collect::<Vec<_>>(),
            ),
            Some(symbol) => (
                1,
                names
                    .first()
                    .map(|n| element(n, &symbol))
                    .into_iter()
                    .collect(),
            ),
            None => {
                let ty = match &iterable.kind {
                    ExprKind::Set(_) => iterable.ty(),
                    _ => ExprType::Int,
                };
                (
                    1,
                    names
                        .first()
                        .map(|n| Rc::new(Symbol::value(n.as_str(), ty)))
                        .into_iter()
                        .collect(),
                )
            }
        };

        if vars.len() != expected {
            return Err(self.error_at(
                vars[0],
                ErrorInfo::SyntaxError {
                    found: format!("{} loop variables", vars.len()),
                    expected: format!("{} loop variables", expected),
                },
            ));
        }
        Ok(symbols)
    }

    /// Parses `them` or a parenthesized list of strings and wildcards.
    fn string_set(&mut self) -> Result<Expression, ParserError> {
        if let Some(them) = self.accept(TokenKind::Them) {
            if self.strings.is_empty() {
                return Err(self.error_at(them, ErrorInfo::ThemWithoutStrings));
            }
            return Ok(Expression::new(
                ExprKind::Them(them),
                ExprType::Undefined,
            ));
        }

        let lparen = self.expect(TokenKind::LParen)?;
        let mut elements = Vec::new();
        loop {
            let element = match self.peek() {
                Some(TokenKind::StringId) => {
                    let token = self.bump()?;
                    self.string_ref(token)?;
                    Expression::new(ExprKind::StringRef(token), ExprType::Bool)
                }
                Some(TokenKind::StringIdWildcard) => {
                    let token = self.bump()?;
                    let pattern = self.text_of(token);
                    let prefix = pattern.trim_end_matches('*');
                    if self.strings.find_by_prefix(prefix).is_empty() {
                        return Err(self.error_at(
                            token,
                            ErrorInfo::UnmatchedStringWildcard { pattern },
                        ));
                    }
                    Expression::new(
                        ExprKind::StringWildcard(token),
                        ExprType::Bool,
                    )
                }
                Some(TokenKind::Ident) => {
                    let token = self.bump()?;
                    self.identifier(token)?
                }
                _ => return Err(self.unexpected("string identifier")),
            };
            elements.push(element);
            if self.accept(TokenKind::Comma).is_none() {
                break;
            }
        }
        let rparen = self.expect(TokenKind::RParen)?;
        Ok(Expression::new(
            ExprKind::Set(Box::new(Set { lparen, elements, rparen })),
            ExprType::Undefined,
        ))
    }

    /// Parses `(<low>..<high>)`.
    fn range(&mut self) -> Result<Expression, ParserError> {
        let lparen = self.expect(TokenKind::LParen)?;
        let low = self.bor_expr()?;
        let dots = self.expect(TokenKind::DoubleDot)?;
        let high = self.bor_expr()?;
        let rparen = self.expect(TokenKind::RParen)?;
        self.make_range(lparen, low, dots, high, rparen)
    }

    fn make_range(
        &self,
        lparen: TokenId,
        low: Expression,
        dots: TokenId,
        high: Expression,
        rparen: TokenId,
    ) -> Result<Expression, ParserError> {
        self.check_type(dots, &low, INTEGER, Side::Left)?;
        self.check_type(dots, &high, INTEGER, Side::Right)?;
        if let (Some(l), Some(h)) =
            (self.int_value(&low), self.int_value(&high))
        {
            if l > h {
                return Err(self.error_at(
                    lparen,
                    ErrorInfo::InvalidRange { low: l, high: h },
                ));
            }
        }
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
    }

    /// The value of an integer literal expression.
    fn int_value(&self, expr: &Expression) -> Option<i64> {
        match &expr.kind {
            ExprKind::IntLiteral(t) => {
                self.tokens().get(*t).and_then(|t| t.literal().as_int())
            }
            _ => None,
        }
    }

    /// Parses `( <boolean expression> )`.
    fn parenthesized(&mut self) -> Result<Expression, ParserError> {
        let lparen = self.expect(TokenKind::LParen)?;
        if self.ctx.newline_after(lparen) {
            if let Some(token) = self.tokens_mut().get_mut(lparen) {
                token.set_force_newline(true);
            }
        }
        let inner = self.boolean_expr()?;
        let rparen = self.expect(TokenKind::RParen)?;
        let ty = inner.ty();
        Ok(Expression::new(
            ExprKind::Parentheses(Box::new(Parentheses {
                lparen,
                inner,
                rparen,
            })),
            ty,
        ))
    }

    fn eq_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.rel_expr()?;
        loop {
            let kind = match self.peek() {
                Some(
                    kind @ (TokenKind::Eq
                    | TokenKind::Neq
                    | TokenKind::Contains
                    | TokenKind::IContains
                    | TokenKind::StartsWith
                    | TokenKind::IStartsWith
                    | TokenKind::EndsWith
                    | TokenKind::IEndsWith
                    | TokenKind::IEquals
                    | TokenKind::Matches),
                ) => kind,
                _ => return Ok(lhs),
            };
            let op = self.bump()?;
            let rhs = self.rel_expr()?;
            lhs = match kind {
                TokenKind::Eq | TokenKind::Neq => {
                    self.comparison(lhs, op, rhs)?
                }
                TokenKind::Matches => {
                    self.check_type(op, &lhs, STRING, Side::Left)?;
                    self.check_type(op, &rhs, REGEXP, Side::Right)?;
                    self.make_binary(lhs, op, rhs, ExprType::Bool)?
                }
                _ => self.binary(lhs, op, rhs, STRING, ExprType::Bool)?,
            };
        }
    }

    fn rel_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.bor_expr()?;
        while let Some(
            TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge,
        ) = self.peek()
        {
            let op = self.bump()?;
            let rhs = self.bor_expr()?;
            lhs = self.comparison(lhs, op, rhs)?;
        }
        Ok(lhs)
    }

    /// Both sides must be numbers, or both must be strings.
    fn comparison(
        &self,
        lhs: Expression,
        op: TokenId,
        rhs: Expression,
    ) -> Result<Expression, ParserError> {
        let accepted = match lhs.ty() {
            ExprType::String => STRING,
            ExprType::Bool => &[ExprType::Bool],
            _ => NUMERIC,
        };
        self.check_type(
            op,
            &lhs,
            &[
                ExprType::Int,
                ExprType::Float,
                ExprType::String,
                ExprType::Bool,
            ],
            Side::Left,
        )?;
        self.check_type(op, &rhs, accepted, Side::Right)?;
        self.make_binary(lhs, op, rhs, ExprType::Bool)
    }

    fn bor_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.bxor_expr()?;
        while let Some(op) = self.accept(TokenKind::BitwiseOr) {
            let rhs = self.bxor_expr()?;
            lhs = self.binary(lhs, op, rhs, INTEGER, ExprType::Int)?;
        }
        Ok(lhs)
    }

    fn bxor_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.band_expr()?;
        while let Some(op) = self.accept(TokenKind::BitwiseXor) {
            let rhs = self.band_expr()?;
            lhs = self.binary(lhs, op, rhs, INTEGER, ExprType::Int)?;
        }
        Ok(lhs)
    }

    fn band_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.shift_expr()?;
        while let Some(op) = self.accept(TokenKind::BitwiseAnd) {
            let rhs = self.shift_expr()?;
            lhs = self.binary(lhs, op, rhs, INTEGER, ExprType::Int)?;
        }
        Ok(lhs)
    }

    fn shift_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.add_expr()?;
        while let Some(TokenKind::ShiftLeft | TokenKind::ShiftRight) =
            self.peek()
        {
            let op = self.bump()?;
            let rhs = self.add_expr()?;
            lhs = self.binary(lhs, op, rhs, INTEGER, ExprType::Int)?;
        }
        Ok(lhs)
    }

    fn add_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.mul_expr()?;
        while let Some(TokenKind::Plus | TokenKind::Minus) = self.peek() {
            let op = self.bump()?;
            let rhs = self.mul_expr()?;
            lhs = self.arithmetic(lhs, op, rhs)?;
        }
        Ok(lhs)
    }

    fn mul_expr(&mut self) -> Result<Expression, ParserError> {
        let mut lhs = self.unary_expr()?;
        loop {
            match (self.peek(), self.peek_nth(1)) {
                // `50% of them` is a percentage, not a modulo.
                (Some(TokenKind::Modulo), Some(TokenKind::Of)) => break,
                (Some(TokenKind::Modulo), _) => {
                    let op = self.bump()?;
                    let rhs = self.unary_expr()?;
                    lhs = self.binary(lhs, op, rhs, INTEGER, ExprType::Int)?;
                }
                (Some(TokenKind::Multiply | TokenKind::Divide), _) => {
                    let op = self.bump()?;
                    let rhs = self.unary_expr()?;
                    lhs = self.arithmetic(lhs, op, rhs)?;
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    /// Arithmetic operators produce a float if any operand is a float.
    fn arithmetic(
        &self,
        lhs: Expression,
        op: TokenId,
        rhs: Expression,
    ) -> Result<Expression, ParserError> {
        let ty = if lhs.ty() == ExprType::Float || rhs.ty() == ExprType::Float
        {
            ExprType::Float
        } else {
            ExprType::Int
        };
        self.binary(lhs, op, rhs, NUMERIC, ty)
    }

    fn unary_expr(&mut self) -> Result<Expression, ParserError> {
        match self.peek() {
            Some(TokenKind::Minus) => {
                let op = self.bump()?;
                self.refine(op, TokenKind::UnaryMinus);
                let operand = self.unary_expr()?;
                self.check_type(op, &operand, NUMERIC, Side::Right)?;
                let ty = operand.ty();
                self.unary(op, TokenKind::UnaryMinus, operand, ty)
            }
            Some(TokenKind::BitwiseNot) => {
                let op = self.bump()?;
                let operand = self.unary_expr()?;
                self.check_type(op, &operand, INTEGER, Side::Right)?;
                self.unary(op, TokenKind::BitwiseNot, operand, ExprType::Int)
            }
            _ => self.postfix_expr(),
        }
    }

    /// Parses a primary expression followed by any number of field
    /// accesses, indexes and function calls.
    fn postfix_expr(&mut self) -> Result<Expression, ParserError> {
        let mut expr = self.primary_expr()?;
        loop {
            expr = match self.peek() {
                Some(TokenKind::Dot) => self.struct_access(expr)?,
                Some(TokenKind::LSqb) => self.array_access(expr)?,
                Some(TokenKind::LParen)
                    if self
                        .symbol_of(&expr)
                        .is_some_and(|s| s.is_function()) =>
                {
                    self.function_call(expr)?
                }
                _ => return Ok(expr),
            }
        }
    }

    fn struct_access(
        &mut self,
        structure: Expression,
    ) -> Result<Expression, ParserError> {
        let dot = self.expect(TokenKind::Dot)?;
        let attribute = self.expect(TokenKind::Ident)?;
        let parent = match self.symbol_of(&structure) {
            Some(symbol) if symbol.is_structure() => symbol,
            _ => {
                return Err(self.error_at(
                    dot,
                    ErrorInfo::InvalidAccess {
                        expr: structure.text(self.tokens()),
                        expected: "a structure".to_string(),
                    },
                ))
            }
        };
        let name = self.text_of(attribute);
        let symbol = parent.lookup(&name).ok_or_else(|| {
            self.error_at(
                attribute,
                ErrorInfo::UnrecognizedIdentifier { name: name.clone() },
            )
        })?;
        self.refine(attribute, TokenKind::Id);
        self.set_literal(attribute, Literal::symbol(symbol.clone()));
        Ok(Expression::new(
            ExprKind::StructAccess(Box::new(StructAccess {
                structure,
                dot,
                attribute,
            })),
            symbol.data_type(),
        ))
    }

    fn array_access(
        &mut self,
        array: Expression,
    ) -> Result<Expression, ParserError> {
        let lsqb = self.expect(TokenKind::LSqb)?;
        let symbol = self.symbol_of(&array);
        let (index_type, expected) = match &symbol {
            Some(s) if s.is_array() => (INTEGER, "an array"),
            Some(s) if s.is_dictionary() => (STRING, "a dictionary"),
            _ => {
                return Err(self.error_at(
                    lsqb,
                    ErrorInfo::InvalidAccess {
                        expr: array.text(self.tokens()),
                        expected: "an array or dictionary".to_string(),
                    },
                ))
            }
        };
        let index = self.boolean_expr()?;
        if !accepts(index_type, index.ty()) {
            return Err(self.error_at(
                lsqb,
                ErrorInfo::InvalidAccess {
                    expr: format!(
                        "{}[{}]",
                        array.text(self.tokens()),
                        index.text(self.tokens())
                    ),
                    expected: format!("a valid index for {}", expected),
                },
            ));
        }
        let rsqb = self.expect(TokenKind::RSqb)?;
        let ty = symbol.and_then(|s| s.element_type()).unwrap_or_default();
        Ok(Expression::new(
            ExprKind::ArrayAccess(Box::new(ArrayAccess {
                array,
                lsqb,
                index,
                rsqb,
            })),
            ty,
        ))
    }

    fn function_call(
        &mut self,
        function: Expression,
    ) -> Result<Expression, ParserError> {
        let lparen = self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.peek() != Some(TokenKind::RParen) {
            args.push(self.boolean_expr()?);
            while self.accept(TokenKind::Comma).is_some() {
                args.push(self.boolean_expr()?);
            }
        }
        let rparen = self.expect(TokenKind::RParen)?;

        let arg_types: Vec<ExprType> = args.iter().map(|a| a.ty()).collect();
        let symbol = self.symbol_of(&function);
        let signature = symbol.as_ref().and_then(|s| {
            s.overloads().iter().find(|o| o.accepts(&arg_types))
        });

        let ty = match signature {
            Some(signature) => signature.result,
            None => {
                return Err(self.error_at(
                    lparen,
                    ErrorInfo::WrongArguments {
                        function: function.text(self.tokens()),
                        given: format!(
                            "({})",
                            arg_types.iter().map(|t| t.to_string()).join(", ")
                        ),
                    },
                ))
            }
        };

        Ok(Expression::new(
            ExprKind::FunctionCall(Box::new(FunctionCall {
                function,
                lparen,
                args,
                rparen,
            })),
            ty,
        ))
    }

    fn primary_expr(&mut self) -> Result<Expression, ParserError> {
        let kind = match self.peek() {
            Some(kind) => kind,
            None => return Err(self.unexpected("expression")),
        };
        let single = |kind: fn(TokenId) -> ExprKind, ty: ExprType| (kind, ty);
        let (constructor, ty) = match kind {
            TokenKind::BoolLiteral => {
                single(ExprKind::BoolLiteral, ExprType::Bool)
            }
            TokenKind::IntLiteral => {
                single(ExprKind::IntLiteral, ExprType::Int)
            }
            TokenKind::FloatLiteral => {
                single(ExprKind::FloatLiteral, ExprType::Float)
            }
            TokenKind::Filesize => single(ExprKind::Filesize, ExprType::Int),
            TokenKind::Entrypoint => {
                single(ExprKind::Entrypoint, ExprType::Int)
            }
            TokenKind::StringLiteral => {
                let token = self.bump()?;
                self.check_escapes(token)?;
                return Ok(Expression::new(
                    ExprKind::StringLiteral(token),
                    ExprType::String,
                ));
            }
            TokenKind::Regexp => {
                let token = self.bump()?;
                let regexp = self.regexp(token)?;
                return Ok(Expression::new(
                    ExprKind::Regexp(Box::new(RegexpExpr { token, regexp })),
                    ExprType::Regexp,
                ));
            }
            TokenKind::StringId => return self.string_expr(),
            TokenKind::StringCount => return self.string_count(),
            TokenKind::StringOffset | TokenKind::StringLength => {
                return self.string_indexed(kind)
            }
            TokenKind::LParen => return self.parenthesized(),
            TokenKind::Ident => {
                let token = self.bump()?;
                let name = self.text_of(token);
                if INT_FUNCTIONS.contains(&name.as_str())
                    && self.peek() == Some(TokenKind::LParen)
                {
                    return self.int_function(token);
                }
                return self.identifier(token);
            }
            _ => return Err(self.unexpected("expression")),
        };
        let token = self.bump()?;
        Ok(Expression::new(constructor(token), ty))
    }

    fn int_function(
        &mut self,
        function: TokenId,
    ) -> Result<Expression, ParserError> {
        self.refine(function, TokenKind::IntFunction);
        let lparen = self.expect(TokenKind::LParen)?;
        let arg = self.bor_expr()?;
        self.check_type(lparen, &arg, INTEGER, Side::Right)?;
        let rparen = self.expect(TokenKind::RParen)?;
        Ok(Expression::new(
            ExprKind::IntFunction(Box::new(IntFunction {
                function,
                lparen,
                arg,
                rparen,
            })),
            ExprType::Int,
        ))
    }

    /// Resolves an identifier that is not preceded by a dot. It can be a
    /// loop variable, a rule, an imported module or a global.
    fn identifier(
        &mut self,
        token: TokenId,
    ) -> Result<Expression, ParserError> {
        let name = self.text_of(token);
        self.refine(token, TokenKind::Id);

        if let Some(symbol) = self.loop_vars.lookup(&name) {
            let ty = symbol.data_type();
            self.set_literal(token, Literal::symbol(symbol));
            return Ok(Expression::new(ExprKind::Id(token), ty));
        }

        if let Some((target, _)) = self.rule_names.get(&name) {
            // Rules from other files can be referenced but not aliased
            // while the file is being parsed.
            let target = *target;
            if self.tokens().get(target).is_some() {
                let alias = self.tokens().alias_of(target);
                self.set_literal(token, alias);
            }
            return Ok(Expression::new(ExprKind::Id(token), ExprType::Bool));
        }

        let symbol = self
            .imported
            .get(name.as_str())
            .map(|m| m.structure().clone())
            .or_else(|| self.vt_symbols.lookup(&name))
            .ok_or_else(|| {
                self.error_at(
                    token,
                    ErrorInfo::UnrecognizedIdentifier { name: name.clone() },
                )
            })?;

        let ty = symbol.data_type();
        self.set_literal(token, Literal::symbol(symbol));
        Ok(Expression::new(ExprKind::Id(token), ty))
    }

    /// The symbol an expression refers to, if any. Only identifiers, field
    /// accesses and indexing of arrays of structures have one.
    fn symbol_of(&self, expr: &Expression) -> Option<Rc<Symbol>> {
        let token_symbol = |id: TokenId| {
            self.tokens()
                .get(id)
                .and_then(|t| t.literal().as_symbol().cloned())
        };
        match &expr.kind {
            ExprKind::Id(token) => token_symbol(*token),
            ExprKind::StructAccess(e) => token_symbol(e.attribute),
            ExprKind::ArrayAccess(e) => {
                self.symbol_of(&e.array)?.element_structure().cloned()
            }
            _ => None,
        }
    }

    /// Checks a reference to a string in the condition, and makes the token
    /// an alias of the string definition.
    fn string_ref(&mut self, token: TokenId) -> Result<(), ParserError> {
        let text = self.text_of(token);
        // `#a`, `@a` and `!a` refer to `$a`.
        let id = format!("${}", &text[1..]);
        if id == "$" {
            if self.for_of_depth == 0 {
                return Err(self.error_at(
                    token,
                    ErrorInfo::AnonymousStringOutsideLoop { id: text },
                ));
            }
            return Ok(());
        }
        let def = match self.strings.get(&id) {
            Some(string) => string.id,
            None => {
                return Err(
                    self.error_at(token, ErrorInfo::UndefinedString { id })
                )
            }
        };
        let alias = self.tokens().alias_of(def);
        self.set_literal(token, alias);
        Ok(())
    }

    /// Parses `$a`, `$a at <expr>` and `$a in <range>`.
    fn string_expr(&mut self) -> Result<Expression, ParserError> {
        let id = self.expect(TokenKind::StringId)?;
        self.string_ref(id)?;
        let kind = match self.peek() {
            Some(TokenKind::At) => {
                let at = self.bump()?;
                let offset = self.bor_expr()?;
                self.check_type(at, &offset, INTEGER, Side::Right)?;
                ExprKind::StringAt(Box::new(StringAt { id, at, offset }))
            }
            Some(TokenKind::In) => {
                let in_kw = self.bump()?;
                let range = self.range()?;
                ExprKind::StringInRange(Box::new(StringInRange {
                    id,
                    in_kw,
                    range,
                }))
            }
            _ => ExprKind::StringRef(id),
        };
        Ok(Expression::new(kind, ExprType::Bool))
    }

    /// Parses `#a` and `#a in <range>`.
    fn string_count(&mut self) -> Result<Expression, ParserError> {
        let id = self.expect(TokenKind::StringCount)?;
        self.string_ref(id)?;
        let kind = match self.accept(TokenKind::In) {
            Some(in_kw) => {
                let range = self.range()?;
                ExprKind::StringCountInRange(Box::new(StringInRange {
                    id,
                    in_kw,
                    range,
                }))
            }
            None => ExprKind::StringCount(id),
        };
        Ok(Expression::new(kind, ExprType::Int))
    }

    /// Parses `@a`, `!a` and their indexed forms `@a[<expr>]`, `!a[<expr>]`.
    fn string_indexed(
        &mut self,
        kind: TokenKind,
    ) -> Result<Expression, ParserError> {
        let id = self.expect(kind)?;
        self.string_ref(id)?;
        let index = match self.accept(TokenKind::LSqb) {
            Some(lsqb) => {
                let expr = self.bor_expr()?;
                self.check_type(lsqb, &expr, INTEGER, Side::Right)?;
                let rsqb = self.expect(TokenKind::RSqb)?;
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
    }

    /// Creates a binary expression after checking that both operands have
    /// one of the `accepted` types.
    fn binary(
        &self,
        lhs: Expression,
        op: TokenId,
        rhs: Expression,
        accepted: &[ExprType],
        ty: ExprType,
    ) -> Result<Expression, ParserError> {
        self.check_type(op, &lhs, accepted, Side::Left)?;
        self.check_type(op, &rhs, accepted, Side::Right)?;
        self.make_binary(lhs, op, rhs, ty)
    }

    fn make_binary(
        &self,
        lhs: Expression,
        op: TokenId,
        rhs: Expression,
        ty: ExprType,
    ) -> Result<Expression, ParserError> {
        let op_kind = self.tokens().get(op).map(|t| t.kind());
        op_kind
            .and_then(|k| ExprKind::binary(k, BinaryExpr { lhs, op, rhs }))
            .map(|kind| Expression::new(kind, ty))
            .ok_or_else(|| self.unexpected("binary operator"))
    }

    fn unary(
        &self,
        op: TokenId,
        kind: TokenKind,
        operand: Expression,
        ty: ExprType,
    ) -> Result<Expression, ParserError> {
        ExprKind::unary(kind, UnaryExpr { op, operand })
            .map(|kind| Expression::new(kind, ty))
            .ok_or_else(|| self.unexpected("unary operator"))
    }

    fn check_type(
        &self,
        op: TokenId,
        expr: &Expression,
        accepted: &[ExprType],
        side: Side,
    ) -> Result<(), ParserError> {
        if accepts(accepted, expr.ty()) {
            return Ok(());
        }
        let expected = match accepted {
            BOOLEAN => "boolean".to_string(),
            types => types.iter().map(|t| t.to_string()).join(" or "),
        };
        Err(self.error_at(
            op,
            ErrorInfo::InvalidOperand {
                operator: self.text_of(op),
                expected,
                side: side.as_str().to_string(),
            },
        ))
    }
}

/// Expressions of undefined type are accepted anywhere, their type is only
/// known when scanning.
fn accepts(accepted: &[ExprType], ty: ExprType) -> bool {
    ty == ExprType::Undefined || accepted.contains(&ty)
}
