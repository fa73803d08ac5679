//! Position maps produced by individual edit operations.

use serde::{Deserialize, Serialize};

const DEL_BEFORE: u8 = 1;
const DEL_AFTER: u8 = 2;
const DEL_ACROSS: u8 = 4;
const DEL_SIDE: u8 = 8;

/// Which side a position sticks to when content is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assoc {
    /// Stay before inserted content.
    Before,
    /// Move past inserted content.
    After,
}

impl Assoc {
    /// Returns true for [`Assoc::Before`].
    pub fn is_before(self) -> bool {
        matches!(self, Assoc::Before)
    }
}

/// Token that lets a mirror partner restore a position lying inside a
/// replaced range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recover {
    /// Index of the range within its step map.
    pub index: usize,
    /// Offset of the position from the start of that range.
    pub offset: usize,
}

/// The outcome of mapping a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    /// The mapped position.
    pub pos: usize,
    del_info: u8,
    recover: Option<Recover>,
}

impl MapResult {
    fn untouched(pos: usize) -> Self {
        Self {
            pos,
            del_info: 0,
            recover: None,
        }
    }

    pub(crate) fn with_info(pos: usize, del_info: u8) -> Self {
        Self {
            pos,
            del_info,
            recover: None,
        }
    }

    pub(crate) fn del_info(&self) -> u8 {
        self.del_info
    }

    /// True when the content on the associated side of the position was deleted.
    pub fn deleted(&self) -> bool {
        self.del_info & DEL_SIDE != 0
    }

    /// True when the content directly before the position was deleted.
    pub fn deleted_before(&self) -> bool {
        self.del_info & (DEL_BEFORE | DEL_ACROSS) != 0
    }

    /// True when the content directly after the position was deleted.
    pub fn deleted_after(&self) -> bool {
        self.del_info & (DEL_AFTER | DEL_ACROSS) != 0
    }

    /// True when the position sat strictly inside a deleted range.
    pub fn deleted_across(&self) -> bool {
        self.del_info & DEL_ACROSS != 0
    }

    /// Recovery token, present when the position fell inside a range.
    pub fn recover(&self) -> Option<Recover> {
        self.recover
    }
}

/// Anything that can translate positions from one document state to another.
pub trait Mappable {
    /// Maps a position, reporting deletion information.
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult;

    /// Maps a position.
    fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }
}

/// A single replaced range: `old_size` units at `start` became `new_size` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapRange {
    /// Start of the range in the pre-edit document.
    pub start: usize,
    /// Length of the replaced content.
    pub old_size: usize,
    /// Length of the inserted content.
    pub new_size: usize,
}

/// The position map of one edit operation.
///
/// Ranges are stored in the coordinates of the forward edit and are
/// sorted by `start`. An inverted map reads them backwards without
/// copying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StepMap {
    ranges: Vec<MapRange>,
    inverted: bool,
}

impl StepMap {
    /// Creates a map from sorted, non-overlapping ranges.
    pub fn new(ranges: Vec<MapRange>) -> Self {
        Self {
            ranges,
            inverted: false,
        }
    }

    /// A map that leaves every position untouched.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A map replacing `old_size` units at `start` with `new_size` units.
    pub fn replace(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::empty();
        }
        Self::new(vec![MapRange {
            start,
            old_size,
            new_size,
        }])
    }

    /// Returns the ranges in forward coordinates.
    pub fn ranges(&self) -> &[MapRange] {
        &self.ranges
    }

    /// Returns true if this map undoes the ranges it stores.
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Returns the map that undoes this one.
    pub fn invert(&self) -> StepMap {
        Self {
            ranges: self.ranges.clone(),
            inverted: !self.inverted,
        }
    }

    /// Restores a position from a token produced by this map's mirror partner.
    pub fn recover(&self, token: Recover) -> usize {
        let mut diff: i64 = 0;
        if !self.inverted {
            for range in self.ranges.iter().take(token.index) {
                diff += range.new_size as i64 - range.old_size as i64;
            }
        }
        let start = self
            .ranges
            .get(token.index)
            .map_or(0, |range| range.start as i64);
        clamp(start + diff + token.offset as i64)
    }

    fn sizes(&self, range: &MapRange) -> (usize, usize) {
        if self.inverted {
            (range.new_size, range.old_size)
        } else {
            (range.old_size, range.new_size)
        }
    }
}

impl Mappable for StepMap {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let target = pos as i64;
        let mut diff: i64 = 0;

        for (index, range) in self.ranges.iter().enumerate() {
            let (old_size, new_size) = self.sizes(range);
            let start = range.start as i64 - if self.inverted { diff } else { 0 };
            if start > target {
                break;
            }
            let end = start + old_size as i64;
            if target <= end {
                let side = if old_size == 0 {
                    assoc
                } else if target == start {
                    Assoc::Before
                } else if target == end {
                    Assoc::After
                } else {
                    assoc
                };
                let result = start + diff + if side.is_before() { 0 } else { new_size as i64 };

                let edge = if assoc.is_before() { start } else { end };
                let recover = (target != edge).then(|| Recover {
                    index,
                    offset: (target - start) as usize,
                });

                let mut del_info = if target == start {
                    DEL_AFTER
                } else if target == end {
                    DEL_BEFORE
                } else {
                    DEL_ACROSS
                };
                if target != edge {
                    del_info |= DEL_SIDE;
                }

                return MapResult {
                    pos: clamp(result),
                    del_info,
                    recover,
                };
            }
            diff += new_size as i64 - old_size as i64;
        }

        MapResult::untouched(clamp(target + diff))
    }
}

fn clamp(pos: i64) -> usize {
    pos.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_is_identity() {
        let map = StepMap::empty();
        assert_eq!(map.map(7, Assoc::After), 7);
        assert!(!map.map_result(7, Assoc::Before).deleted());
    }

    #[test]
    fn insertion_respects_assoc() {
        let map = StepMap::replace(2, 0, 3);
        assert_eq!(map.map(2, Assoc::Before), 2);
        assert_eq!(map.map(2, Assoc::After), 5);
        assert_eq!(map.map(1, Assoc::After), 1);
        assert_eq!(map.map(4, Assoc::After), 7);
    }

    #[test]
    fn deletion_reports_flags() {
        // Delete [1, 4)
        let map = StepMap::replace(1, 3, 0);

        let inside = map.map_result(2, Assoc::After);
        assert_eq!(inside.pos, 1);
        assert!(inside.deleted_across());
        assert!(inside.deleted());
        assert!(inside.recover().is_some());

        let at_start = map.map_result(1, Assoc::After);
        assert_eq!(at_start.pos, 1);
        assert!(at_start.deleted_after());
        assert!(!at_start.deleted_across());

        let at_end = map.map_result(4, Assoc::Before);
        assert_eq!(at_end.pos, 1);
        assert!(at_end.deleted_before());
        assert!(!at_end.deleted_across());

        assert_eq!(map.map(6, Assoc::After), 3);
    }

    #[test]
    fn inverted_map_undoes_replacement() {
        let map = StepMap::replace(2, 1, 4);
        let inverse = map.invert();
        assert!(inverse.is_inverted());

        assert_eq!(map.map(3, Assoc::After), 6);
        assert_eq!(inverse.map(6, Assoc::After), 3);
        assert_eq!(inverse.map(9, Assoc::After), 6);
    }

    #[test]
    fn multiple_ranges_accumulate_offsets() {
        let map = StepMap::new(vec![
            MapRange {
                start: 1,
                old_size: 0,
                new_size: 2,
            },
            MapRange {
                start: 5,
                old_size: 2,
                new_size: 0,
            },
        ]);
        assert_eq!(map.map(3, Assoc::After), 5);
        assert_eq!(map.map(8, Assoc::After), 8);

        let inverse = map.invert();
        assert_eq!(inverse.map(8, Assoc::After), 8);
        assert_eq!(inverse.map(5, Assoc::After), 3);
    }

    #[test]
    fn recover_restores_offset_inside_range() {
        let deletion = StepMap::replace(3, 4, 0);
        let result = deletion.map_result(5, Assoc::After);
        let token = result.recover().expect("position inside range");
        assert_eq!(token.offset, 2);

        let reinsertion = deletion.invert();
        assert_eq!(reinsertion.recover(token), 5);
    }
}
