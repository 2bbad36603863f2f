use std::cmp::Ordering;

use rayon::prelude::*;

use crate::error::{CoocError, Result};
use crate::table::{CoocTable, Partner, PartnerKey};

/// Bounded top-K selection over a table's partner lists. While offers
/// stream in, each list is kept as a min-heap on weight so the weakest
/// admitted partner sits at the root; `finalize` then turns every list
/// into the externally visible descending order.
pub struct TopKCollector {
    top_k: usize,
}

impl TopKCollector {
    /// A `top_k` of 0 keeps every offered partner.
    pub fn new(top_k: usize) -> Self {
        let top_k = if top_k == 0 { usize::MAX } else { top_k };
        TopKCollector { top_k }
    }

    /// Record one co-occurrence edge on the main entry's partner list.
    ///
    /// An id below the table's starting offset (on either side of the
    /// edge) is dropped without error; a main id past the table is
    /// fatal. While the list is below capacity the partner is heap
    /// inserted; at capacity it replaces the current minimum only when
    /// its weight is strictly greater, so on equal weight the earlier
    /// admission wins.
    pub fn offer(
        &self,
        table: &mut CoocTable,
        main_id: u32,
        partner_id: u32,
        joint_count: u64,
    ) -> Result<()> {
        if main_id < table.start_id() || partner_id < table.start_id() {
            return Ok(());
        }
        let size = table.len();
        let entry = match table.entry_mut(main_id) {
            Some(entry) => entry,
            None => {
                return Err(CoocError::MainIdOutOfRange {
                    id: main_id as i64,
                    size,
                })
            }
        };
        if entry.count == 0 {
            return Err(CoocError::ZeroCount {
                id: entry.id,
                item: entry.item.to_string(),
            });
        }

        let weight = joint_count as f64 / entry.count as f64;
        let partner = Partner {
            key: PartnerKey::Id(partner_id),
            count: joint_count,
            weight,
        };

        let list = &mut entry.partners;
        if list.len() < self.top_k {
            list.push(partner);
            let last = list.len() - 1;
            sift_up(list, last);
        } else if weight > list[0].weight {
            list[0] = partner;
            sift_down(list, 0);
        }
        Ok(())
    }

    /// One pass after all offers: stable sort of every partner list,
    /// descending by weight. Lists are independent, so entries are
    /// sorted in parallel.
    pub fn finalize(&self, table: &mut CoocTable) {
        table.entries_mut().par_iter_mut().for_each(|entry| {
            entry
                .partners
                .sort_by(|a, b| b.weight.total_cmp(&a.weight));
        });
    }
}

fn sift_up(list: &mut [Partner], mut pos: usize) {
    while pos > 0 {
        let parent = (pos - 1) / 2;
        if list[pos].weight.total_cmp(&list[parent].weight) == Ordering::Less {
            list.swap(pos, parent);
            pos = parent;
        } else {
            break;
        }
    }
}

fn sift_down(list: &mut [Partner], mut pos: usize) {
    loop {
        let left = 2 * pos + 1;
        let right = left + 1;
        let mut min = pos;
        if left < list.len() && list[left].weight.total_cmp(&list[min].weight) == Ordering::Less {
            min = left;
        }
        if right < list.len() && list[right].weight.total_cmp(&list[min].weight) == Ordering::Less {
            min = right;
        }
        if min == pos {
            return;
        }
        list.swap(pos, min);
        pos = min;
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn small_table() -> CoocTable {
        let mut table = CoocTable::new(1);
        table.intern("cat", 5).unwrap();
        table.intern("dog", 3).unwrap();
        table.intern("fish", 1).unwrap();
        table
    }

    fn ids(table: &CoocTable, id: u32) -> Vec<u32> {
        table.entry(id).unwrap().partners.iter().map(|p| match p.key {
            PartnerKey::Id(id) => id,
            PartnerKey::Item(_) => panic!("expected id key"),
        }).collect()
    }

    #[test]
    fn keeps_the_strongest_partner_per_entry() {
        // cat:5 dog:3 fish:1, edges (1,2,4) (1,3,1) (2,1,4), k = 1
        let mut table = small_table();
        let collector = TopKCollector::new(1);
        collector.offer(&mut table, 1, 2, 4).unwrap();
        collector.offer(&mut table, 1, 3, 1).unwrap();
        collector.offer(&mut table, 2, 1, 4).unwrap();
        collector.finalize(&mut table);

        let cat = &table.entry(1).unwrap().partners;
        assert_eq!(cat.len(), 1);
        assert_eq!(cat[0].key, PartnerKey::Id(2));
        assert_eq!(cat[0].count, 4);
        assert_eq!(cat[0].weight, 0.8);

        let dog = &table.entry(2).unwrap().partners;
        assert_eq!(dog.len(), 1);
        assert_eq!(dog[0].key, PartnerKey::Id(1));
        assert_eq!(dog[0].weight, 4.0 / 3.0);

        assert!(table.entry(3).unwrap().partners.is_empty());
    }

    #[test]
    fn list_never_grows_past_k() {
        let mut table = CoocTable::new(1);
        table.intern("hub", 100).unwrap();
        for n in 0..40 {
            table.intern(&format!("p{}", n), 1).unwrap();
        }
        let collector = TopKCollector::new(3);
        for n in 0..40u64 {
            collector.offer(&mut table, 1, n as u32 + 2, n + 1).unwrap();
            assert!(table.entry(1).unwrap().partners.len() <= 3);
        }
        collector.finalize(&mut table);

        // the three largest joint counts survive, strongest first
        assert_eq!(ids(&table, 1), vec![41, 40, 39]);
        let weights: Vec<f64> = table.entry(1).unwrap().partners.iter().map(|p| p.weight).collect();
        assert_eq!(weights, vec![0.40, 0.39, 0.38]);
    }

    #[test]
    fn matches_naive_selection() {
        let joints = [7u64, 3, 9, 9, 1, 12, 5, 9, 2, 11, 4, 8];
        let mut table = CoocTable::new(1);
        table.intern("hub", 10).unwrap();
        for n in 0..joints.len() {
            table.intern(&format!("p{}", n), 1).unwrap();
        }
        let collector = TopKCollector::new(5);
        for (n, joint) in joints.iter().enumerate() {
            collector.offer(&mut table, 1, n as u32 + 2, *joint).unwrap();
        }
        collector.finalize(&mut table);

        let mut naive: Vec<(usize, u64)> = joints.iter().copied().enumerate().collect();
        naive.sort_by(|a, b| b.1.cmp(&a.1));
        let mut expected: Vec<u32> = naive.iter().take(5).map(|(n, _)| *n as u32 + 2).collect();
        expected.sort_unstable();
        let mut kept = ids(&table, 1);
        kept.sort_unstable();
        assert_eq!(kept, expected);
    }

    #[test]
    fn equal_weight_offer_is_discarded() {
        let mut table = CoocTable::new(1);
        table.intern("hub", 4).unwrap();
        table.intern("first", 1).unwrap();
        table.intern("second", 1).unwrap();
        let collector = TopKCollector::new(1);
        collector.offer(&mut table, 1, 2, 2).unwrap();
        collector.offer(&mut table, 1, 3, 2).unwrap();
        collector.finalize(&mut table);

        assert_eq!(ids(&table, 1), vec![2]);
    }

    #[test]
    fn weights_are_non_increasing_after_finalize() {
        let joints = [5u64, 2, 8, 8, 1, 9, 3, 8, 6];
        let mut table = CoocTable::new(1);
        table.intern("hub", 7).unwrap();
        for n in 0..joints.len() {
            table.intern(&format!("p{}", n), 1).unwrap();
        }
        let collector = TopKCollector::new(0);
        for (n, joint) in joints.iter().enumerate() {
            collector.offer(&mut table, 1, n as u32 + 2, *joint).unwrap();
        }
        collector.finalize(&mut table);

        let partners = &table.entry(1).unwrap().partners;
        assert_eq!(partners.len(), joints.len());
        for pair in partners.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn offers_below_the_start_offset_are_noops() {
        let mut table = small_table();
        let collector = TopKCollector::new(2);
        collector.offer(&mut table, 0, 1, 4).unwrap();
        collector.offer(&mut table, 1, 0, 4).unwrap();
        assert!(table.entry(1).unwrap().partners.is_empty());
    }

    #[test]
    fn out_of_range_main_id_is_fatal() {
        let mut table = small_table();
        let collector = TopKCollector::new(2);
        let err = collector.offer(&mut table, 9, 1, 4).unwrap_err();
        assert!(matches!(err, CoocError::MainIdOutOfRange { id: 9, size: 4 }));
    }

    #[test]
    fn zero_count_entry_cannot_take_offers() {
        let mut table = CoocTable::new(1);
        table.intern("ghost", 0).unwrap();
        table.intern("cat", 5).unwrap();
        let collector = TopKCollector::new(2);
        let err = collector.offer(&mut table, 1, 2, 3).unwrap_err();
        assert!(matches!(err, CoocError::ZeroCount { id: 1, .. }));
    }
}
