//! Allocation of dense, typed identifiers.

use std::marker::PhantomData;

/// Hands out sequential IDs of type `Id`, starting from zero.
///
/// The IDs are dense, so they double as indexes into a `Vec` arena.
#[derive(Debug)]
pub struct IdGen<Id> {
    next: usize,
    phantom: PhantomData<fn() -> Id>,
}

impl<Id> Default for IdGen<Id> {
    fn default() -> Self {
        IdGen {
            next: 0,
            phantom: PhantomData,
        }
    }
}

impl<Id: From<usize>> IdGen<Id> {
    /// Returns the next ID.
    pub fn next_id(&mut self) -> Id {
        let id = self.next;
        self.next = id.checked_add(1).expect("ID allocator overflowed usize");
        Id::from(id)
    }

    /// The number of IDs handed out so far.
    pub fn count(&self) -> usize {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::IdGen;

    #[derive(Debug, PartialEq)]
    struct NodeId(usize);

    impl From<usize> for NodeId {
        fn from(value: usize) -> Self {
            NodeId(value)
        }
    }

    #[test]
    fn sequential() {
        let mut ids: IdGen<NodeId> = IdGen::default();
        assert_eq!(ids.next_id(), NodeId(0));
        assert_eq!(ids.next_id(), NodeId(1));
        assert_eq!(ids.count(), 2);
    }
}
