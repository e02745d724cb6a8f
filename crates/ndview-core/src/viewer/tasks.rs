use crate::sched::CoalescentTask;
use crate::source::AxisPositions;
use crate::view::ViewCoords;

use super::image_maker::DisplayFrame;

/// Recompute the display for a view snapshot.
#[derive(Clone, Debug)]
pub(crate) struct RecomputeTask {
    pub view: ViewCoords,
    /// Fetch samples from the source again rather than re-tone-mapping the
    /// ones already held.
    pub fetch: bool,
}

impl CoalescentTask for RecomputeTask {
    type Class = ();

    fn class(&self) {}

    fn coalesce(self, later: Self) -> Self {
        Self {
            view: later.view,
            fetch: self.fetch || later.fetch,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PresentationClass {
    Publish,
    ExpandRange,
}

#[derive(Debug)]
pub(crate) enum PresentationTask {
    Publish(DisplayFrame),
    /// New images arrived at these axis positions, oldest first.
    ExpandRange(Vec<AxisPositions>),
}

impl CoalescentTask for PresentationTask {
    type Class = PresentationClass;

    fn class(&self) -> PresentationClass {
        match self {
            Self::Publish(_) => PresentationClass::Publish,
            Self::ExpandRange(_) => PresentationClass::ExpandRange,
        }
    }

    fn coalesce(self, later: Self) -> Self {
        match (self, later) {
            (Self::ExpandRange(mut events), Self::ExpandRange(more)) => {
                for event in more {
                    events.retain(|e| *e != event);
                    events.push(event);
                }
                Self::ExpandRange(events)
            }
            (_, later) => later,
        }
    }
}

/// Rebuild the overlay for the view of the frame just presented.
#[derive(Clone, Debug)]
pub(crate) struct OverlayTask {
    pub view: ViewCoords,
}

impl CoalescentTask for OverlayTask {
    type Class = ();

    fn class(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::axes;

    #[test]
    fn test_recompute_merge_keeps_fetch() {
        let view = ViewCoords::new(None, None, false);
        let earlier = RecomputeTask { view: view.clone(), fetch: true };
        let mut later_view = view;
        later_view.set_view_offset(5.0, 5.0);
        let merged = earlier.coalesce(RecomputeTask { view: later_view.clone(), fetch: false });
        assert!(merged.fetch);
        assert_eq!(merged.view, later_view);
    }

    #[test]
    fn test_expand_range_merge_is_union() {
        let a = axes([("z", 0)]);
        let b = axes([("z", 1)]);
        let c = axes([("z", 2)]);
        let merged = PresentationTask::ExpandRange(vec![a.clone(), b.clone()])
            .coalesce(PresentationTask::ExpandRange(vec![b.clone(), c.clone()]));
        match merged {
            PresentationTask::ExpandRange(events) => assert_eq!(events, vec![a, b, c]),
            other => panic!("unexpected task {other:?}"),
        }
    }
}
