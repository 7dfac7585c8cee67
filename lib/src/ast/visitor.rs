/*! Traversal and rewriting of condition expressions.

A [`Visitor`] walks an expression tree depth-first, getting called when
entering and leaving every node. A [`Modifier`] rewrites the tree bottom-up,
replacing nodes with new expressions built on their own token stream.
*/

use crate::ast::expr::Expression;
use crate::tokens::{Detached, Remap, TokenStream, TokenStreamError};

/// Tells [`walk`] how to proceed after entering a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    Continue,
    /// The children of the node are not visited. `leave` is still called
    /// for the node.
    SkipChildren,
}

/// Read-only visitor for expression trees.
pub trait Visitor {
    fn enter(
        &mut self,
        _expr: &Expression,
        _tokens: &TokenStream,
    ) -> VisitAction {
        VisitAction::Continue
    }

    fn leave(&mut self, _expr: &Expression, _tokens: &TokenStream) {}
}

/// Walks `expr` in depth-first order.
pub fn walk<V: Visitor + ?Sized>(
    expr: &Expression,
    tokens: &TokenStream,
    visitor: &mut V,
) {
    if visitor.enter(expr, tokens) == VisitAction::Continue {
        for child in expr.children() {
            walk(child, tokens, visitor);
        }
    }
    visitor.leave(expr, tokens);
}

/// A visitor that calls a closure when entering every node.
pub struct FnVisitor<F> {
    f: F,
}

/// Creates a [`Visitor`] from a closure.
pub fn from_fn<F>(f: F) -> FnVisitor<F>
where
    F: FnMut(&Expression, &TokenStream),
{
    FnVisitor { f }
}

impl<F> Visitor for FnVisitor<F>
where
    F: FnMut(&Expression, &TokenStream),
{
    fn enter(
        &mut self,
        expr: &Expression,
        tokens: &TokenStream,
    ) -> VisitAction {
        (self.f)(expr, tokens);
        VisitAction::Continue
    }
}

/// Rewrites expression trees.
pub trait Modifier {
    /// Called for every node after its children were modified. Returning
    /// a new expression replaces the node, returning `None` keeps it.
    fn modify(
        &mut self,
        expr: &Expression,
        tokens: &TokenStream,
    ) -> Option<Detached<Expression>>;
}

impl<F> Modifier for F
where
    F: FnMut(&Expression, &TokenStream) -> Option<Detached<Expression>>,
{
    fn modify(
        &mut self,
        expr: &Expression,
        tokens: &TokenStream,
    ) -> Option<Detached<Expression>> {
        self(expr, tokens)
    }
}

/// Applies `modifier` to every node in `expr`, children first.
///
/// Replaced nodes have their tokens exchanged with the tokens of the new
/// expression, so the changes are visible in the text of the stream.
pub fn modify<M: Modifier + ?Sized>(
    expr: &mut Expression,
    tokens: &mut TokenStream,
    modifier: &mut M,
) -> Result<(), TokenStreamError> {
    for child in expr.children_mut() {
        modify(child, tokens, modifier)?;
    }
    if let Some(replacement) = modifier.modify(expr, tokens) {
        let (mut new_tokens, mut new_expr) = replacement.into_parts();
        let map = tokens.exchange(
            expr.first_token(),
            expr.last_token(),
            &mut new_tokens,
        )?;
        new_expr.remap(&map);
        *expr = new_expr;
    }
    Ok(())
}
