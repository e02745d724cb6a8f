//! Single-worker task pipelines with bounded, coalescing queues.
//!
//! Each [`CoalescingExecutor`] owns one named worker thread. Its queue never
//! holds two tasks of the same class: a new submission merges into the
//! pending one, so a burst of updates costs one execution carrying the
//! latest state.

mod cancel;
mod executor;
mod task;

pub use cancel::CancelToken;
pub use executor::{CoalescingExecutor, ExecutorOptions, Submitter};
pub use task::CoalescentTask;
