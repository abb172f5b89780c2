//! Built-in action logging.

use super::stage::Middleware;
use crate::core::Action;
use tracing::debug;

/// Fall-through middleware that logs every action passing through it.
///
/// Records are emitted at `DEBUG` level under the `unistore::action`
/// target. Place it first in the list to see actions exactly as they were
/// dispatched, or last to see them as the reducer will.
pub fn logging<S, A>() -> Middleware<S, A>
where
    S: Clone + 'static,
    A: Action,
{
    Middleware::fall_through(|_api| {
        |action: &A| {
            debug!(target: "unistore::action", action = action.name(), "{:?}", action);
        }
    })
}
