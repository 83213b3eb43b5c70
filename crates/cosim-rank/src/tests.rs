//! Unit tests for the rank index.

use std::any::Any;
use std::sync::Arc;

use cosim_core::{ObjectId, Rank, SimRng, Timestamp};
use cosim_object::{ObjectModel, ObjectType, SimObject};

use crate::{IndexError, RankIndex};

// ── Helpers ───────────────────────────────────────────────────────────────────

struct Stub;

impl ObjectModel for Stub {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn stub_type() -> Arc<ObjectType> {
    Arc::new(ObjectType::new(
        "stub",
        Box::new(|| Box::new(Stub) as Box<dyn ObjectModel>),
    ))
}

fn object(id: u32, rank: u16) -> Arc<SimObject> {
    let otype = stub_type();
    let model = otype.create();
    Arc::new(SimObject::new(
        ObjectId(id),
        format!("stub_{id}"),
        Rank(rank),
        None,
        otype,
        model,
        Timestamp::ZERO,
    ))
}

/// Live object IDs of one rank, in slot order.
fn ids_in_rank(index: &RankIndex, rank: u16) -> Vec<ObjectId> {
    index.iter_rank(Rank(rank)).map(|o| o.id()).collect()
}

// ── Append / remove ───────────────────────────────────────────────────────────

#[cfg(test)]
mod membership {
    use super::*;

    #[test]
    fn append_places_object_in_its_rank() {
        let mut index = RankIndex::new();
        let h0 = index.append(object(0, 0)).unwrap();
        index.append(object(1, 2)).unwrap();

        assert_eq!(h0.rank(), Rank(0));
        assert_eq!(index.len(), 2);
        assert_eq!(index.rank_count(), 3);
        assert_eq!(index.bucket_len(Rank(0)), 1);
        assert_eq!(index.bucket_len(Rank(1)), 0);
        assert_eq!(index.bucket_len(Rank(2)), 1);
    }

    #[test]
    fn iteration_preserves_append_order() {
        let mut index = RankIndex::new();
        for id in 0..5 {
            index.append(object(id, 1)).unwrap();
        }
        assert_eq!(
            ids_in_rank(&index, 1),
            (0..5).map(ObjectId).collect::<Vec<_>>()
        );
    }

    #[test]
    fn remove_unlinks_and_returns_the_object() {
        let mut index = RankIndex::new();
        let h0 = index.append(object(0, 0)).unwrap();
        let _h1 = index.append(object(1, 0)).unwrap();

        let removed = index.remove(h0).unwrap();
        assert_eq!(removed.id(), ObjectId(0));
        assert_eq!(index.len(), 1);
        assert_eq!(index.bucket_len(Rank(0)), 1);
        assert_eq!(ids_in_rank(&index, 0), vec![ObjectId(1)]);

        // Second redemption of the same handle finds nothing.
        assert!(index.remove(h0).is_none());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut index = RankIndex::new();
        let h0 = index.append(object(0, 0)).unwrap();
        index.append(object(1, 0)).unwrap();

        index.remove(h0).unwrap();
        let h2 = index.append(object(2, 0)).unwrap();

        // The new object landed in the vacated slot, so slot order shows it first.
        assert_eq!(h2, h0);
        assert_eq!(ids_in_rank(&index, 0), vec![ObjectId(2), ObjectId(1)]);
    }

    #[test]
    fn handle_survives_other_removals() {
        let mut index = RankIndex::new();
        let h0 = index.append(object(0, 0)).unwrap();
        let h1 = index.append(object(1, 0)).unwrap();
        let h2 = index.append(object(2, 0)).unwrap();

        index.remove(h1).unwrap();
        assert_eq!(index.get(h0).unwrap().id(), ObjectId(0));
        assert_eq!(index.get(h2).unwrap().id(), ObjectId(2));
    }

    #[test]
    fn invalid_rank_is_rejected() {
        let mut index = RankIndex::new();
        let result = index.append(object(0, u16::MAX));
        assert!(matches!(result, Err(IndexError::InvalidRank(_))));
        assert!(index.is_empty());
    }

    #[test]
    fn whole_index_iteration_is_rank_ascending() {
        let mut index = RankIndex::new();
        index.append(object(10, 1)).unwrap();
        index.append(object(20, 0)).unwrap();
        index.append(object(30, 1)).unwrap();

        let ids: Vec<ObjectId> = index.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![ObjectId(20), ObjectId(10), ObjectId(30)]);
    }
}

// ── Shuffle ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod shuffle {
    use super::*;

    #[test]
    fn shuffle_is_a_permutation() {
        let mut index = RankIndex::new();
        for id in 0..32 {
            index.append(object(id, 0)).unwrap();
        }
        let before: Vec<ObjectId> = {
            let mut v = ids_in_rank(&index, 0);
            v.sort_unstable();
            v
        };

        let mut rng = SimRng::new(99);
        index.shuffle(Rank(0), &mut rng);

        let mut after = ids_in_rank(&index, 0);
        assert_eq!(after.len(), 32, "size must be preserved");
        assert_eq!(index.bucket_len(Rank(0)), 32);
        after.sort_unstable();
        assert_eq!(after, before, "multiset of objects must be preserved");
    }

    #[test]
    fn shuffle_skips_vacated_slots() {
        let mut index = RankIndex::new();
        let mut handles = Vec::new();
        for id in 0..8 {
            handles.push(index.append(object(id, 0)).unwrap());
        }
        index.remove(handles[3]).unwrap();

        let mut rng = SimRng::new(1);
        index.shuffle(Rank(0), &mut rng);

        assert_eq!(index.bucket_len(Rank(0)), 7);
        let mut after = ids_in_rank(&index, 0);
        after.sort_unstable();
        let expected: Vec<ObjectId> =
            [0u32, 1, 2, 4, 5, 6, 7].into_iter().map(ObjectId).collect();
        assert_eq!(after, expected);
    }

    #[test]
    fn same_seed_same_permutation() {
        let build = || {
            let mut index = RankIndex::new();
            for id in 0..16 {
                index.append(object(id, 0)).unwrap();
            }
            index
        };
        let mut a = build();
        let mut b = build();
        a.shuffle(Rank(0), &mut SimRng::new(7));
        b.shuffle(Rank(0), &mut SimRng::new(7));
        assert_eq!(ids_in_rank(&a, 0), ids_in_rank(&b, 0));
    }

    #[test]
    fn shuffle_of_absent_rank_is_a_noop() {
        let mut index = RankIndex::new();
        let mut rng = SimRng::new(0);
        index.shuffle(Rank(5), &mut rng);
        assert!(index.is_empty());
    }
}
