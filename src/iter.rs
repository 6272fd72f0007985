use crate::{Link, Node};
use std::iter::FusedIterator;

/// Lazily walks one lane of a [`SkipList`](crate::SkipList), smallest value first.
///
/// Made by [`SkipList::iterate_from`](crate::SkipList::iterate_from). It only
/// borrows the list, so a new one can be made at any time.
pub struct LaneIter<'a, T> {
    nodes: &'a [Node<T>],
    next: Link,
    lane: usize,
}

impl<'a, T> LaneIter<'a, T> {
    pub(crate) fn new(nodes: &'a [Node<T>], first: Link, lane: usize) -> Self {
        Self {
            nodes,
            next: first,
            lane,
        }
    }

    /// The lane being walked.
    pub fn lane(&self) -> usize {
        self.lane
    }
}

impl<'a, T> Iterator for LaneIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.nodes[self.next?];
        self.next = node.forward[self.lane];
        node.value.as_ref()
    }
}

impl<'a, T> FusedIterator for LaneIter<'a, T> {}

impl<'a, T> Clone for LaneIter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            next: self.next,
            lane: self.lane,
        }
    }
}
