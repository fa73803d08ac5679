//! Mapping sequences: ordered step maps with mirror pairing.

use crate::map::{Assoc, MapResult, Mappable, StepMap};

/// An ordered sequence of step maps.
///
/// Besides the maps themselves a mapping records *mirror pairs*: two
/// indices whose maps exactly cancel each other, such as the undo of a
/// step and its later redo during a rebase. While mapping, a position
/// that falls inside a range of the first map of a pair is restored
/// exactly by the second one instead of being reported as deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    maps: Vec<StepMap>,
    mirror: Vec<(usize, usize)>,
}

impl Mapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mapping from maps without mirror pairs.
    pub fn from_maps(maps: Vec<StepMap>) -> Self {
        Self {
            maps,
            mirror: Vec::new(),
        }
    }

    /// Returns the maps in order.
    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    /// Returns the number of maps.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Returns true if the mapping holds no maps.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Appends a map, optionally pairing it with the map at `mirror`.
    pub fn append_map(&mut self, map: StepMap, mirror: Option<usize>) {
        self.maps.push(map);
        if let Some(partner) = mirror {
            self.set_mirror(self.maps.len() - 1, partner);
        }
    }

    /// Appends all maps of `other`, carrying its mirror pairs along.
    pub fn append_mapping(&mut self, other: &Mapping) {
        let start_size = self.maps.len();
        for (i, map) in other.maps.iter().enumerate() {
            let partner = other
                .get_mirror(i)
                .filter(|&m| m < i)
                .map(|m| start_size + m);
            self.append_map(map.clone(), partner);
        }
    }

    /// Appends the inverse of `other`: its maps inverted, in reverse order.
    pub fn append_mapping_inverted(&mut self, other: &Mapping) {
        let total_size = self.maps.len() + other.maps.len();
        for (i, map) in other.maps.iter().enumerate().rev() {
            let partner = other
                .get_mirror(i)
                .filter(|&m| m > i)
                .map(|m| total_size - m - 1);
            self.append_map(map.invert(), partner);
        }
    }

    /// Returns the mapping that undoes this one.
    pub fn invert(&self) -> Mapping {
        let mut inverse = Mapping::new();
        inverse.append_mapping_inverted(self);
        inverse
    }

    /// Records that the maps at `n` and `m` exactly cancel.
    pub fn set_mirror(&mut self, n: usize, m: usize) {
        self.mirror.push((n, m));
    }

    /// Returns the mirror partner of the map at `n`, if any.
    pub fn get_mirror(&self, n: usize) -> Option<usize> {
        self.mirror.iter().find_map(|&(a, b)| {
            if a == n {
                Some(b)
            } else if b == n {
                Some(a)
            } else {
                None
            }
        })
    }

    /// Returns the composed effect of maps `[from, len)`.
    ///
    /// The slice is fixed at the current end: maps appended later are
    /// not part of it.
    pub fn slice(&self, from: usize) -> MappingSlice<'_> {
        self.slice_range(from, self.maps.len())
    }

    /// Returns the composed effect of maps `[from, to)`.
    pub fn slice_range(&self, from: usize, to: usize) -> MappingSlice<'_> {
        let to = to.min(self.maps.len());
        MappingSlice {
            mapping: self,
            from: from.min(to),
            to,
        }
    }

    fn map_between(&self, from: usize, to: usize, pos: usize, assoc: Assoc) -> MapResult {
        let mut del_info = 0u8;
        let mut pos = pos;
        let mut i = from;

        while i < to {
            let result = self.maps[i].map_result(pos, assoc);
            if let Some(token) = result.recover() {
                if let Some(partner) = self.get_mirror(i).filter(|&p| p > i && p < to) {
                    pos = self.maps[partner].recover(token);
                    i = partner + 1;
                    continue;
                }
            }
            del_info |= result.del_info();
            pos = result.pos;
            i += 1;
        }

        MapResult::with_info(pos, del_info)
    }
}

impl Mappable for Mapping {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.map_between(0, self.maps.len(), pos, assoc)
    }
}

/// A borrowed window `[from, to)` over a [`Mapping`].
#[derive(Debug, Clone, Copy)]
pub struct MappingSlice<'a> {
    mapping: &'a Mapping,
    from: usize,
    to: usize,
}

impl MappingSlice<'_> {
    /// Index of the first map in the window.
    pub fn from(&self) -> usize {
        self.from
    }

    /// Index one past the last map in the window.
    pub fn to(&self) -> usize {
        self.to
    }
}

impl Mappable for MappingSlice<'_> {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.mapping.map_between(self.from, self.to, pos, assoc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_in_order() {
        let mapping = Mapping::from_maps(vec![
            StepMap::replace(0, 0, 2),
            StepMap::replace(4, 0, 1),
        ]);
        assert_eq!(mapping.map(3, Assoc::After), 6);
        assert_eq!(mapping.slice(1).map(3, Assoc::After), 3);
        assert_eq!(mapping.slice(1).map(4, Assoc::After), 5);
    }

    #[test]
    fn invert_reverses_order() {
        let mapping = Mapping::from_maps(vec![
            StepMap::replace(0, 0, 2),
            StepMap::replace(4, 0, 1),
        ]);
        let inverse = mapping.invert();
        assert_eq!(inverse.len(), 2);
        assert_eq!(inverse.map(6, Assoc::After), 3);
    }

    #[test]
    fn mirror_restores_position_inside_undone_range() {
        // Insert three units at 2, undo it, redo it.
        let mut mapping = Mapping::new();
        let insert = StepMap::replace(2, 0, 3);
        mapping.append_map(insert.invert(), None);
        mapping.append_map(insert.clone(), Some(0));

        // Position 4 was created by the insertion; without the mirror it
        // would collapse to the start of the deleted range.
        let mirrored = mapping.map_result(4, Assoc::After);
        assert_eq!(mirrored.pos, 4);
        assert!(!mirrored.deleted());

        let unpaired = Mapping::from_maps(vec![insert.invert(), insert]);
        assert_eq!(unpaired.map(4, Assoc::After), 5);
    }

    #[test]
    fn mirror_outside_slice_is_ignored() {
        let mut mapping = Mapping::new();
        let insert = StepMap::replace(2, 0, 3);
        mapping.append_map(insert.invert(), None);
        mapping.append_map(insert, Some(0));

        let window = mapping.slice_range(0, 1);
        assert_eq!(window.map(4, Assoc::After), 2);
    }

    #[test]
    fn inverted_mapping_keeps_mirror_pairs() {
        let mut mapping = Mapping::new();
        let insert = StepMap::replace(1, 0, 2);
        mapping.append_map(insert.invert(), None);
        mapping.append_map(StepMap::replace(0, 0, 1), None);
        mapping.append_map(insert, Some(0));

        let inverse = mapping.invert();
        assert_eq!(inverse.get_mirror(0), Some(2));
        assert_eq!(inverse.get_mirror(2), Some(0));
        assert_eq!(inverse.get_mirror(1), None);
    }

    #[test]
    fn append_mapping_offsets_mirrors() {
        let mut inner = Mapping::new();
        let insert = StepMap::replace(0, 0, 1);
        inner.append_map(insert.invert(), None);
        inner.append_map(insert, Some(0));

        let mut outer = Mapping::from_maps(vec![StepMap::replace(5, 1, 0)]);
        outer.append_mapping(&inner);
        assert_eq!(outer.get_mirror(2), Some(1));
    }

    #[test]
    fn slice_is_clamped() {
        let mapping = Mapping::from_maps(vec![StepMap::replace(0, 0, 1)]);
        let slice = mapping.slice(5);
        assert_eq!(slice.from(), 1);
        assert_eq!(slice.map(3, Assoc::After), 3);
    }
}
