//! The `RankIndex` container.

use std::sync::Arc;

use cosim_core::{Rank, SimRng};
use cosim_object::SimObject;

use crate::IndexError;

// ── SlotHandle ────────────────────────────────────────────────────────────────

/// Positional handle returned by [`RankIndex::append`], redeemable for O(1)
/// removal.
///
/// Handles survive appends and removals of *other* objects (slots are never
/// compacted), but [`RankIndex::shuffle`] permutes a bucket's contents in
/// place — treat handles taken before a shuffle of their rank as expired.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SlotHandle {
    rank: Rank,
    slot: u32,
}

impl SlotHandle {
    pub fn rank(&self) -> Rank {
        self.rank
    }
}

// ── Bucket ────────────────────────────────────────────────────────────────────

/// One rank's worth of objects: slot-stable storage plus a free list so
/// append and remove are both O(1).
#[derive(Default)]
struct Bucket {
    slots: Vec<Option<Arc<SimObject>>>,
    free:  Vec<u32>,
    live:  usize,
}

// ── RankIndex ─────────────────────────────────────────────────────────────────

/// Mapping from rank to an ordered, mutable collection of object handles.
///
/// Invariants: every object appears in exactly one bucket, keyed by its own
/// `rank()`; each bucket's live count equals the number of occupied slots.
/// The index is owned exclusively by the scheduler — object code never
/// touches it.
#[derive(Default)]
pub struct RankIndex {
    ranks: Vec<Bucket>,
    live:  usize,
}

impl RankIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object into its rank's bucket.  O(1): a freed slot is
    /// reused if available, otherwise the bucket grows by one.
    ///
    /// Allocation failure is reported, not swallowed — model load may retry
    /// or abort.
    pub fn append(&mut self, obj: Arc<SimObject>) -> Result<SlotHandle, IndexError> {
        let rank = obj.rank();
        let bucket = self.bucket_mut(rank)?;

        let slot = match bucket.free.pop() {
            Some(slot) => {
                bucket.slots[slot as usize] = Some(obj);
                slot
            }
            None => {
                bucket.slots.try_reserve(1)?;
                bucket.slots.push(Some(obj));
                (bucket.slots.len() - 1) as u32
            }
        };
        bucket.live += 1;
        self.live += 1;
        Ok(SlotHandle { rank, slot })
    }

    /// Unlink the object a handle refers to.  O(1).  Returns `None` if the
    /// slot was already vacated.
    pub fn remove(&mut self, handle: SlotHandle) -> Option<Arc<SimObject>> {
        let bucket = self.ranks.get_mut(handle.rank.index())?;
        let obj = bucket.slots.get_mut(handle.slot as usize)?.take()?;
        bucket.free.push(handle.slot);
        bucket.live -= 1;
        self.live -= 1;
        Some(obj)
    }

    /// The object a handle currently refers to, if any.
    pub fn get(&self, handle: SlotHandle) -> Option<&Arc<SimObject>> {
        self.ranks
            .get(handle.rank.index())?
            .slots
            .get(handle.slot as usize)?
            .as_ref()
    }

    /// Uniformly permute one bucket's contents in place.
    ///
    /// Decorrelates test and scheduling order; production correctness never
    /// depends on intra-rank order.  Same seed, same permutation.
    pub fn shuffle(&mut self, rank: Rank, rng: &mut SimRng) {
        let Some(bucket) = self.ranks.get_mut(rank.index()) else {
            return;
        };

        let occupied: Vec<usize> = (0..bucket.slots.len())
            .filter(|&i| bucket.slots[i].is_some())
            .collect();
        let mut contents: Vec<Arc<SimObject>> = occupied
            .iter()
            .map(|&i| bucket.slots[i].take().expect("slot observed occupied"))
            .collect();

        rng.shuffle(&mut contents);

        for (&i, obj) in occupied.iter().zip(contents) {
            bucket.slots[i] = Some(obj);
        }
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Number of rank buckets (highest seen rank + 1).
    pub fn rank_count(&self) -> usize {
        self.ranks.len()
    }

    /// Iterate one rank's live objects in slot order.
    pub fn iter_rank(&self, rank: Rank) -> impl Iterator<Item = &Arc<SimObject>> {
        self.ranks
            .get(rank.index())
            .into_iter()
            .flat_map(|b| b.slots.iter().filter_map(Option::as_ref))
    }

    /// Iterate every live object, ranks ascending.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SimObject>> {
        self.ranks
            .iter()
            .flat_map(|b| b.slots.iter().filter_map(Option::as_ref))
    }

    // ── Counts ────────────────────────────────────────────────────────────

    /// Live objects in one rank.
    pub fn bucket_len(&self, rank: Rank) -> usize {
        self.ranks.get(rank.index()).map_or(0, |b| b.live)
    }

    /// Live objects across all ranks.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn bucket_mut(&mut self, rank: Rank) -> Result<&mut Bucket, IndexError> {
        if rank == Rank::INVALID {
            return Err(IndexError::InvalidRank(rank));
        }
        let idx = rank.index();
        if idx >= self.ranks.len() {
            self.ranks.try_reserve(idx + 1 - self.ranks.len())?;
            self.ranks.resize_with(idx + 1, Bucket::default);
        }
        Ok(&mut self.ranks[idx])
    }
}
