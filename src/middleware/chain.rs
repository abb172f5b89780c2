//! Composition of a middleware list into a single handler.

use super::api::MiddlewareApi;
use super::stage::{Handler, Middleware, Next, Wrap};
use crate::core::Action;

/// Build the composed handler for a store.
///
/// Factories run in configured order. The prepared stages are then folded
/// right-to-left around `terminal`, so the first configured middleware is
/// the outermost handler and sees each action first.
pub(crate) fn compose<S, A>(
    middleware: Vec<Middleware<S, A>>,
    api: &MiddlewareApi<S, A>,
    terminal: Handler<A>,
) -> Handler<A>
where
    S: Clone + 'static,
    A: Action,
{
    let stages: Vec<Wrap<A>> = middleware
        .into_iter()
        .map(|middleware| middleware.prepare(api.clone()))
        .collect();

    stages
        .into_iter()
        .rev()
        .fold(terminal, |next, stage| stage(Next::new(next)))
}
