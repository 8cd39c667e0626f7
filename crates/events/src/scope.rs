use lineitems_core::ParentId;

use crate::ChannelMessage;

/// Helper trait for parent-scoped messages.
///
/// Marks payloads that pertain to exactly one parent record, so subscribers
/// bound to a parent can drop messages meant for other parents. A message for
/// a different parent is not an error; it is simply not ours.
pub trait ParentScoped {
    fn parent_id(&self) -> &ParentId;

    /// Whether this message concerns `bound`.
    fn concerns(&self, bound: &ParentId) -> bool {
        self.parent_id() == bound
    }
}

impl<P: ParentScoped> ParentScoped for ChannelMessage<P> {
    fn parent_id(&self) -> &ParentId {
        self.payload().parent_id()
    }
}
