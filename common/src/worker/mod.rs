// Worker module executing dispatched job bodies

pub mod pool;

pub use pool::{PoolStats, WorkerPool};

use crate::models::Action;

/// Hands job bodies to whatever executes them.
///
/// `submit` must return without waiting for the action to run; the trigger
/// thread calls it between deadline waits.
pub trait JobDispatcher: Send + Sync {
    fn submit(&self, action: Action);
}
