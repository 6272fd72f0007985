//! An ordered set backed by a probabilistic skip list.
//!
//! Every element sits on lane 0; each higher lane holds a sparser
//! subsequence of the lane below, picked by coin flips at insertion time.
//! Lookups, inserts and removals are `O(log n)` on average with no
//! rebalancing.
//!
//! ```
//! use lane_skiplist::SkipList;
//!
//! let mut sk: SkipList<i32> = SkipList::default();
//! assert!(sk.insert(3));
//! assert!(sk.insert(8));
//! assert!(!sk.insert(3));
//! assert!(sk.retrieve(&8));
//! assert_eq!(sk.iterate_from(0).unwrap().copied().collect::<Vec<_>>(), vec![3, 8]);
//! assert!(sk.remove(&3));
//! assert_eq!(sk.size(), 1);
//! ```
use std::cmp::Ordering;
use std::fmt;
use std::iter::FromIterator;

use rand::rngs::StdRng;
use tracing::{debug, trace};

pub mod config;
pub mod error;
pub mod iter;
pub mod level;

pub use crate::config::{Config, DEFAULT_MAX_LEVEL, DEFAULT_PROMOTION_PROBABILITY};
pub use crate::error::{ErrorKind, Result, SkipListError};
pub use crate::iter::LaneIter;
pub use crate::level::{LevelSampler, Replay, RngSource, UniformSource};

/// Index of another node in the arena, or `None` at the end of a lane.
pub(crate) type Link = Option<usize>;

/// Arena slot of the sentinel head.
const HEAD: usize = 0;

pub(crate) struct Node<T> {
    /// `None` for the head and for vacated slots.
    pub(crate) value: Option<T>,
    /// Highest lane this node is linked into.
    level: usize,
    /// Always `max_level + 1` wide.
    pub(crate) forward: Vec<Link>,
}

impl<T> Node<T> {
    fn new(value: Option<T>, level: usize, width: usize) -> Self {
        Node {
            value,
            level,
            forward: vec![None; width],
        }
    }
}

pub struct SkipList<T, S = RngSource<StdRng>> {
    nodes: Vec<Node<T>>,
    /// Vacated arena slots, reused by later inserts.
    free: Vec<usize>,
    /// Level of the head: the highest populated lane, `None` when empty.
    top: Option<usize>,
    size: usize,
    sampler: LevelSampler<S>,
    promotion_probability: f64,
    max_level: usize,
}

impl<T: Ord> Default for SkipList<T> {
    fn default() -> Self {
        let config = Config::default();
        SkipList::build(
            config.promotion_probability,
            config.max_level as usize,
            RngSource::default(),
        )
    }
}

impl<T: Ord> SkipList<T> {
    /// Make an empty list with fresh entropy for level sampling.
    ///
    /// Fails with [`ErrorKind::InvalidArgument`] if `promotion_probability`
    /// lies outside `[0, 1]` or `max_level` is negative.
    pub fn new(promotion_probability: f64, max_level: i64) -> Result<Self> {
        Self::with_config(Config {
            promotion_probability,
            max_level,
        })
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_source(config, RngSource::default())
    }
}

impl<T: Ord, S: UniformSource> SkipList<T, S> {
    /// Make an empty list drawing its levels from `source`.
    pub fn with_source(config: Config, source: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(
            config.promotion_probability,
            config.max_level as usize,
            source,
        ))
    }

    fn build(promotion_probability: f64, max_level: usize, source: S) -> Self {
        debug!(promotion_probability, max_level, "creating skip list");
        SkipList {
            nodes: vec![Node::new(None, 0, max_level + 1)],
            free: Vec::new(),
            top: None,
            size: 0,
            sampler: LevelSampler::new(promotion_probability, max_level, source),
            promotion_probability,
            max_level,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_nonempty(&self) -> bool {
        self.size > 0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn promotion_probability(&self) -> f64 {
        self.promotion_probability
    }

    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Highest populated lane, or `-1` when the list is empty.
    pub fn current_level(&self) -> i64 {
        self.top.map_or(-1, |lane| lane as i64)
    }

    /// Highest populated lane, or `None` when the list is empty.
    pub fn top_lane(&self) -> Option<usize> {
        self.top
    }

    pub fn source(&self) -> &S {
        self.sampler.source()
    }

    /// Reach the level source, e.g. to queue draws on a [`Replay`].
    pub fn source_mut(&mut self) -> &mut S {
        self.sampler.source_mut()
    }

    /// Walk `lane` from `from` while the next node is smaller than `value`.
    ///
    /// Returns the last node passed and whether the node right after it
    /// holds `value`.
    #[inline]
    fn advance(&self, mut from: usize, lane: usize, value: &T) -> (usize, bool) {
        while let Some(next) = self.nodes[from].forward[lane] {
            match self.nodes[next].value.as_ref().map(|v| v.cmp(value)) {
                Some(Ordering::Less) => from = next,
                Some(Ordering::Equal) => return (from, true),
                _ => break,
            }
        }
        (from, false)
    }

    /// Record, for every lane from the top down to 0, the last node before
    /// where `value` sits or would sit. The result is indexed by lane.
    fn locate(&self, value: &T) -> (Vec<usize>, bool) {
        let top = match self.top {
            Some(top) => top,
            None => return (Vec::new(), false),
        };
        let mut update = vec![HEAD; top + 1];
        let mut found = false;
        let mut curr = HEAD;
        for lane in (0..=top).rev() {
            let (pred, hit) = self.advance(curr, lane, value);
            found |= hit;
            update[lane] = pred;
            curr = pred;
        }
        (update, found)
    }

    /// Membership test, `O(log n)` on average.
    pub fn retrieve(&self, value: &T) -> bool {
        if self.nodes[HEAD].forward[0].is_none() {
            return false;
        }
        let top = match self.top {
            Some(top) => top,
            None => return false,
        };
        let mut curr = HEAD;
        for lane in (0..=top).rev() {
            let (pred, hit) = self.advance(curr, lane, value);
            if hit {
                return true;
            }
            curr = pred;
        }
        false
    }

    /// Insert `value`, returning `false` if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        // An empty list needs no traversal: every lane of the new node
        // hangs straight off the head.
        let update = if self.nodes[HEAD].forward[0].is_none() {
            Vec::new()
        } else {
            let (update, found) = self.locate(&value);
            if found {
                return false;
            }
            update
        };

        let level = self.sampler.sample();
        let new = self.alloc(value, level);
        for lane in 0..=level {
            if lane >= update.len() {
                self.nodes[new].forward[lane] = self.nodes[HEAD].forward[lane];
                self.nodes[HEAD].forward[lane] = Some(new);
                self.top = Some(lane);
            } else {
                let pred = update[lane];
                self.nodes[new].forward[lane] = self.nodes[pred].forward[lane];
                self.nodes[pred].forward[lane] = Some(new);
            }
        }
        self.size += 1;
        trace!(
            level,
            size = self.size,
            current_level = self.current_level(),
            "inserted"
        );
        true
    }

    /// Remove `value`, returning `false` if it was not present.
    pub fn remove(&mut self, value: &T) -> bool {
        if self.nodes[HEAD].forward[0].is_none() {
            return false;
        }
        let (update, found) = self.locate(value);
        if !found {
            return false;
        }
        let target = match self.nodes[update[0]].forward[0] {
            Some(target) => target,
            None => return false,
        };

        // Try every populated lane. The first lane where the target is not
        // the recorded successor is above its level, and so is every lane
        // after it.
        let mut unlinked = 0;
        for (lane, &pred) in update.iter().enumerate() {
            if self.nodes[pred].forward[lane] != Some(target) {
                break;
            }
            self.nodes[pred].forward[lane] = self.nodes[target].forward[lane];
            unlinked += 1;
        }
        debug_assert_eq!(unlinked, self.nodes[target].level + 1);

        while let Some(top) = self.top {
            if self.nodes[HEAD].forward[top].is_some() {
                break;
            }
            self.top = top.checked_sub(1);
        }

        self.release(target);
        self.size -= 1;
        trace!(
            size = self.size,
            current_level = self.current_level(),
            "removed"
        );
        true
    }

    /// Walk lane `lane` from the head to its end.
    ///
    /// Fails with [`ErrorKind::OutOfRange`] if `lane` is negative or above
    /// [`current_level`](Self::current_level); on an empty list every lane
    /// is out of range.
    pub fn iterate_from(&self, lane: i64) -> Result<LaneIter<'_, T>> {
        let current_level = self.current_level();
        if lane < 0 || lane > current_level {
            return Err(SkipListError::OutOfRange {
                lane,
                current_level,
            });
        }
        let lane = lane as usize;
        Ok(LaneIter::new(&self.nodes, self.nodes[HEAD].forward[lane], lane))
    }

    fn alloc(&mut self, value: T, level: usize) -> usize {
        match self.free.pop() {
            Some(slot) => {
                let node = &mut self.nodes[slot];
                node.value = Some(value);
                node.level = level;
                slot
            }
            None => {
                self.nodes
                    .push(Node::new(Some(value), level, self.max_level + 1));
                self.nodes.len() - 1
            }
        }
    }

    /// Drop the value held in `slot` and park the slot for reuse.
    fn release(&mut self, slot: usize) {
        let node = &mut self.nodes[slot];
        node.value = None;
        node.level = 0;
        for link in node.forward.iter_mut() {
            *link = None;
        }
        self.free.push(slot);
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        let top = match self.top {
            Some(top) => top,
            None => {
                assert_eq!(self.size, 0);
                assert!(self.nodes[HEAD].forward.iter().all(Option::is_none));
                return;
            }
        };
        let mut highest = 0;
        let mut below: Vec<usize> = Vec::new();
        for lane in 0..=top {
            let mut row = Vec::new();
            let mut curr = self.nodes[HEAD].forward[lane];
            while let Some(idx) = curr {
                let node = &self.nodes[idx];
                assert_eq!(node.forward.len(), self.max_level + 1);
                assert!(node.level >= lane);
                highest = highest.max(node.level);
                row.push(idx);
                curr = node.forward[lane];
            }
            assert!(!row.is_empty(), "lane {} is empty below the top", lane);
            for pair in row.windows(2) {
                assert!(self.nodes[pair[0]].value < self.nodes[pair[1]].value);
            }
            if lane == 0 {
                assert_eq!(row.len(), self.size);
            } else {
                let mut rest = below.iter();
                for idx in &row {
                    assert!(rest.any(|b| b == idx), "lane {} is not a subsequence", lane);
                }
            }
            below = row;
        }
        assert_eq!(highest, top);
        for lane in top + 1..=self.max_level {
            assert!(self.nodes[HEAD].forward[lane].is_none());
        }
    }
}

impl<T: Ord, S: UniformSource> Extend<T> for SkipList<T, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord> FromIterator<T> for SkipList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut sk = SkipList::default();
        sk.extend(iter);
        sk
    }
}

impl<T: fmt::Debug, S> fmt::Debug for SkipList<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "SkipList(size: {}, current_level: {}), and lanes:",
            self.size,
            self.top.map_or(-1, |lane| lane as i64)
        )?;
        if let Some(top) = self.top {
            for lane in (0..=top).rev() {
                write!(f, "{}: Head", lane)?;
                let mut curr = self.nodes[HEAD].forward[lane];
                while let Some(idx) = curr {
                    if let Some(value) = &self.nodes[idx].value {
                        write!(f, " -> {:?}", value)?;
                    }
                    curr = self.nodes[idx].forward[lane];
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, Replay, SkipList};

    fn replayed() -> SkipList<i32, Replay> {
        SkipList::with_source(Config::default(), Replay::default()).unwrap()
    }

    fn lane(sk: &SkipList<i32, Replay>, lane: i64) -> Vec<i32> {
        sk.iterate_from(lane).unwrap().copied().collect()
    }

    #[test]
    fn insert_no_panic() {
        let mut sk: SkipList<i32> = SkipList::default();
        for i in &[10, 30, 50, 5, 0, 3] {
            assert!(sk.insert(*i));
        }
        sk.check_invariants();
        assert_eq!(sk.len(), 6);
    }

    #[test]
    fn first_insert_links_every_sampled_lane() {
        let mut sk = replayed();
        sk.source_mut().reset(vec![0.2, 0.4, 1.0]);
        assert!(sk.insert(3));
        assert_eq!(sk.current_level(), 2);
        assert_eq!(sk.top_lane(), Some(2));
        for l in 0..=2 {
            assert_eq!(lane(&sk, l), vec![3]);
        }
        sk.check_invariants();
    }

    #[test]
    fn taller_node_raises_head() {
        let mut sk = replayed();
        assert!(sk.insert(10));
        assert_eq!(sk.current_level(), 0);
        sk.source_mut().reset(vec![0.1, 0.1, 0.1, 0.9]);
        assert!(sk.insert(20));
        assert_eq!(sk.current_level(), 3);
        assert_eq!(lane(&sk, 0), vec![10, 20]);
        assert_eq!(lane(&sk, 3), vec![20]);
        sk.check_invariants();
    }

    #[test]
    fn duplicate_insert_consumes_no_draws() {
        let mut sk = replayed();
        sk.insert(1);
        sk.source_mut().reset(vec![0.1]);
        assert!(!sk.insert(1));
        assert_eq!(sk.source().remaining(), 1);
        assert_eq!(sk.size(), 1);
    }

    #[test]
    fn remove_shrinks_head() {
        let mut sk = replayed();
        sk.source_mut().reset(vec![0.0, 0.0, 0.0, 0.9]);
        sk.insert(5);
        sk.insert(6);
        assert_eq!(sk.current_level(), 3);
        assert!(sk.remove(&5));
        assert_eq!(sk.current_level(), 0);
        assert_eq!(lane(&sk, 0), vec![6]);
        assert!(sk.remove(&6));
        assert_eq!(sk.current_level(), -1);
        assert!(sk.is_empty());
        sk.check_invariants();
    }

    #[test]
    fn slots_are_reused() {
        let mut sk: SkipList<i32> = SkipList::default();
        sk.extend(0..10);
        let slots = sk.nodes.len();
        for i in 0..5 {
            assert!(sk.remove(&i));
        }
        sk.extend(100..105);
        assert_eq!(sk.nodes.len(), slots);
        sk.check_invariants();
        let all: Vec<_> = sk.iterate_from(0).unwrap().copied().collect();
        assert_eq!(all, vec![5, 6, 7, 8, 9, 100, 101, 102, 103, 104]);
    }

    #[test]
    fn random_workload_keeps_invariants() {
        let mut sk = SkipList::with_source(
            Config::default().with_promotion_probability(0.7).with_max_level(8),
            crate::RngSource::seeded(42),
        )
        .unwrap();
        let mut model = std::collections::BTreeSet::new();
        let mut state = 17u64;
        for _ in 0..2000 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 33) % 200) as u32;
            if state & 1 == 0 {
                assert_eq!(sk.insert(value), model.insert(value));
            } else {
                assert_eq!(sk.remove(&value), model.remove(&value));
            }
        }
        sk.check_invariants();
        assert_eq!(sk.size(), model.len());
    }

    #[test]
    fn debug_prints_lanes() {
        let mut sk = replayed();
        sk.source_mut().reset(vec![0.1, 0.9]);
        sk.insert(1);
        sk.insert(2);
        let out = format!("{:?}", sk);
        assert!(out.contains("1: Head -> 1\n"));
        assert!(out.contains("0: Head -> 1 -> 2\n"));
    }
}
