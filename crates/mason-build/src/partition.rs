//! Quadrant partitioning of a placement plan.
//!
//! The footprint center on each horizontal axis is `(min + max) / 2` with
//! integer division truncating toward zero. Placements on the center line
//! go to the west (x) and north (z) side. Non-empty quadrants become
//! sections, indexed in NW, NE, SW, SE order, each sorted bottom-to-top with
//! a stable sort so equal heights keep their plan order.

use mason_types::{Placement, Quadrant};

use crate::section::Section;

/// Divides a placement plan into up to four quadrant sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialPartitioner;

impl SpatialPartitioner {
    /// Footprint center `(center_x, center_z)` of a plan, or `None` if the
    /// plan is empty.
    pub fn center(plan: &[Placement]) -> Option<(i32, i32)> {
        let first = plan.first()?.position;
        let (mut min_x, mut max_x, mut min_z, mut max_z) = (first.x, first.x, first.z, first.z);
        for p in plan {
            min_x = min_x.min(p.position.x);
            max_x = max_x.max(p.position.x);
            min_z = min_z.min(p.position.z);
            max_z = max_z.max(p.position.z);
        }
        Some((midpoint(min_x, max_x), midpoint(min_z, max_z)))
    }

    /// Partition a plan into sections. An empty plan yields no sections.
    pub fn partition(plan: &[Placement]) -> Vec<Section> {
        let Some((center_x, center_z)) = Self::center(plan) else {
            return Vec::new();
        };

        let mut buckets: [Vec<Placement>; 4] = Default::default();
        for placement in plan {
            let quadrant =
                Quadrant::classify(placement.position.x, placement.position.z, center_x, center_z);
            if let Some(bucket) = buckets.get_mut(quadrant_slot(quadrant)) {
                bucket.push(placement.clone());
            }
        }

        Quadrant::ALL
            .into_iter()
            .zip(buckets)
            .filter(|(_, bucket)| !bucket.is_empty())
            .enumerate()
            .map(|(index, (quadrant, mut bucket))| {
                bucket.sort_by_key(|p| p.position.y);
                Section::new(index, quadrant, bucket)
            })
            .collect()
    }
}

/// `(a + b) / 2`, widened so the sum cannot overflow, truncating toward zero.
fn midpoint(a: i32, b: i32) -> i32 {
    let sum = i64::from(a).saturating_add(i64::from(b));
    // The quotient of two i32 values' sum by 2 always fits in i32.
    i32::try_from(sum / 2).unwrap_or(a)
}

const fn quadrant_slot(quadrant: Quadrant) -> usize {
    match quadrant {
        Quadrant::NW => 0,
        Quadrant::NE => 1,
        Quadrant::SW => 2,
        Quadrant::SE => 3,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mason_types::{BlockPos, MaterialId};

    use super::*;

    fn at(x: i32, y: i32, z: i32) -> Placement {
        Placement::new(BlockPos::new(x, y, z), MaterialId::new("stone"))
    }

    fn multiset(placements: impl IntoIterator<Item = Placement>) -> BTreeMap<(BlockPos, String), usize> {
        let mut counts = BTreeMap::new();
        for p in placements {
            *counts
                .entry((p.position, p.material.as_str().to_owned()))
                .or_insert(0_usize) += 1;
        }
        counts
    }

    #[test]
    fn four_corners_yield_four_single_sections() {
        let plan = vec![at(0, 0, 0), at(9, 0, 0), at(0, 0, 9), at(9, 0, 9)];
        assert_eq!(SpatialPartitioner::center(&plan), Some((4, 4)));

        let sections = SpatialPartitioner::partition(&plan);
        assert_eq!(sections.len(), 4);
        let quadrants: Vec<Quadrant> = sections.iter().map(Section::quadrant).collect();
        assert_eq!(
            quadrants,
            vec![Quadrant::NW, Quadrant::NE, Quadrant::SW, Quadrant::SE]
        );
        assert!(sections.iter().all(|s| s.len() == 1));
        let first = sections.first().and_then(|s| s.placements().first()).map(|p| p.position);
        assert_eq!(first, Some(BlockPos::new(0, 0, 0)));
    }

    #[test]
    fn ten_by_ten_center_line_goes_north_west() {
        let plan: Vec<Placement> = (0..10).map(|i| at(i, 0, i)).collect();
        let sections = SpatialPartitioner::partition(&plan);
        // The diagonal only touches NW (x,z <= 4) and SE (x,z > 4).
        assert_eq!(sections.len(), 2);
        let nw = sections.first().map(|s| (s.quadrant(), s.len()));
        let se = sections.get(1).map(|s| (s.quadrant(), s.len()));
        assert_eq!(nw, Some((Quadrant::NW, 5)));
        assert_eq!(se, Some((Quadrant::SE, 5)));
        assert_eq!(sections.get(1).map(Section::index), Some(1));
    }

    #[test]
    fn partition_preserves_every_placement_exactly_once() {
        let mut plan = Vec::new();
        for x in -3..5 {
            for y in 0..3 {
                for z in 2..7 {
                    plan.push(at(x, y, z));
                }
            }
        }
        plan.push(at(0, 1, 3));

        let sections = SpatialPartitioner::partition(&plan);
        let flattened = sections
            .iter()
            .flat_map(|s| s.placements().iter().cloned());
        assert_eq!(multiset(flattened), multiset(plan.iter().cloned()));
    }

    #[test]
    fn sections_are_sorted_bottom_to_top() {
        let plan = vec![at(0, 5, 0), at(1, 0, 1), at(0, 3, 1), at(1, 1, 0)];
        for section in SpatialPartitioner::partition(&plan) {
            let ys: Vec<i32> = section.placements().iter().map(|p| p.position.y).collect();
            let mut sorted = ys.clone();
            sorted.sort_unstable();
            assert_eq!(ys, sorted);
        }
    }

    #[test]
    fn single_row_keeps_east_and_west_only() {
        let plan: Vec<Placement> = (0..6).map(|x| at(x, 0, 0)).collect();
        let sections = SpatialPartitioner::partition(&plan);
        let quadrants: Vec<Quadrant> = sections.iter().map(Section::quadrant).collect();
        assert_eq!(quadrants, vec![Quadrant::NW, Quadrant::NE]);
    }

    #[test]
    fn negative_coordinates_truncate_toward_zero() {
        // min -3, max 0 -> -3 / 2 == -1 under truncation.
        let plan = vec![at(-3, 0, -3), at(0, 0, 0)];
        assert_eq!(SpatialPartitioner::center(&plan), Some((-1, -1)));
    }

    #[test]
    fn partition_is_deterministic() {
        let plan: Vec<Placement> = (0..30).map(|i| at(i % 7, i % 3, i % 5)).collect();
        let a: Vec<Vec<Placement>> = SpatialPartitioner::partition(&plan)
            .iter()
            .map(|s| s.placements().to_vec())
            .collect();
        let b: Vec<Vec<Placement>> = SpatialPartitioner::partition(&plan)
            .iter()
            .map(|s| s.placements().to_vec())
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_plan_has_no_sections() {
        assert!(SpatialPartitioner::partition(&[]).is_empty());
    }
}
