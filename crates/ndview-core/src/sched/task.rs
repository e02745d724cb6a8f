use std::fmt::Debug;

/// Unit of work for a [`CoalescingExecutor`](super::CoalescingExecutor).
///
/// At most one task of each class waits in the queue. Submitting a task
/// whose class is already pending merges the two with [`coalesce`].
///
/// [`coalesce`]: CoalescentTask::coalesce
pub trait CoalescentTask: Send + 'static {
    type Class: PartialEq + Debug + Send;

    fn class(&self) -> Self::Class;

    /// Merge a later submission into this pending task. The later one wins
    /// unless overridden.
    fn coalesce(self, later: Self) -> Self
    where
        Self: Sized,
    {
        later
    }
}
