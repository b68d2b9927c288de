use protosim_data::Vec3;
use std::collections::HashMap;

/// Integer coordinates of one grid cell.
pub type CellKey = (i32, i32, i32);

#[derive(Clone, Debug, Default)]
/// Uniform 3D spatial hash over device positions.
///
/// Space is unbounded, so occupied cells are looked up through a map instead
/// of a dense array. Entity indices are stored contiguously, grouped by cell,
/// and each occupied cell records its `start..end` range into that storage.
///
/// # Performance Characteristics
/// - Build: O(n log n) (sort by cell key)
/// - Radius query: O(cells in the query box + candidates)
///
/// Queries return *candidates*: every entity in a cell overlapping the query
/// box. Callers apply the exact distance test.
///
/// # Examples
/// ```
/// use protosim_core::spatial_hash::SpatialHash;
/// use protosim_data::Vec3;
///
/// let mut spatial = SpatialHash::new(10.0);
/// let positions = vec![Vec3::new(1.0, 1.0, 0.0), Vec3::new(55.0, 0.0, 0.0)];
/// spatial.build(&positions);
///
/// let mut nearby = Vec::new();
/// spatial.query_into(Vec3::ZERO, 5.0, &mut nearby);
/// assert_eq!(nearby, vec![0]);
/// ```
pub struct SpatialHash {
    pub cell_size: f64,
    cells: HashMap<CellKey, (usize, usize)>,
    entity_indices: Vec<usize>,
}

impl SpatialHash {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_indices: Vec::new(),
        }
    }

    /// Cell containing `p`, or `None` for non-finite or out-of-range coordinates.
    #[inline]
    pub fn cell_of(&self, p: Vec3) -> Option<CellKey> {
        Some((
            self.axis_cell(p.x)?,
            self.axis_cell(p.y)?,
            self.axis_cell(p.z)?,
        ))
    }

    #[inline]
    fn axis_cell(&self, v: f64) -> Option<i32> {
        if !v.is_finite() {
            return None;
        }
        let c = (v / self.cell_size).floor();
        // Check for i32 overflow before casting
        if c < i32::MIN as f64 || c > i32::MAX as f64 {
            return None;
        }
        Some(c as i32)
    }

    /// Rebuilds the hash from scratch. Entity `i` is `positions[i]`.
    pub fn build(&mut self, positions: &[Vec3]) {
        let mut keyed: Vec<(CellKey, usize)> = positions
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| self.cell_of(p).map(|k| (k, i)))
            .collect();
        keyed.sort_unstable();

        self.cells.clear();
        self.entity_indices.clear();
        self.entity_indices.reserve(keyed.len());

        let mut start = 0;
        for (pos, (key, idx)) in keyed.iter().enumerate() {
            self.entity_indices.push(*idx);
            let last_in_cell = keyed.get(pos + 1).map_or(true, |(next, _)| next != key);
            if last_in_cell {
                self.cells.insert(*key, (start, pos + 1));
                start = pos + 1;
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entity_indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_indices.is_empty()
    }

    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Corner cells of the box enclosing a sphere, or `None` when either
    /// corner falls outside the representable grid.
    #[must_use]
    pub fn query_box(&self, center: Vec3, radius: f64) -> Option<(CellKey, CellKey)> {
        let extent = Vec3::new(radius, radius, radius);
        Some((self.cell_of(center - extent)?, self.cell_of(center + extent)?))
    }

    pub fn query_callback<F>(&self, center: Vec3, radius: f64, mut callback: F)
    where
        F: FnMut(usize),
    {
        let Some((lo, hi)) = self.query_box(center, radius) else {
            return;
        };

        let span = |a: i32, b: i32| (b as i64 - a as i64 + 1) as u128;
        let box_cells = span(lo.0, hi.0) * span(lo.1, hi.1) * span(lo.2, hi.2);

        // A query box larger than the occupied set is cheaper to answer by
        // scanning the occupied cells.
        if box_cells > self.cells.len() as u128 {
            for (key, &(start, end)) in &self.cells {
                let inside = (lo.0..=hi.0).contains(&key.0)
                    && (lo.1..=hi.1).contains(&key.1)
                    && (lo.2..=hi.2).contains(&key.2);
                if inside {
                    for &idx in &self.entity_indices[start..end] {
                        callback(idx);
                    }
                }
            }
            return;
        }

        for cz in lo.2..=hi.2 {
            for cy in lo.1..=hi.1 {
                for cx in lo.0..=hi.0 {
                    if let Some(&(start, end)) = self.cells.get(&(cx, cy, cz)) {
                        for &idx in &self.entity_indices[start..end] {
                            callback(idx);
                        }
                    }
                }
            }
        }
    }

    #[inline]
    pub fn query_into(&self, center: Vec3, radius: f64, result: &mut Vec<usize>) {
        result.clear();
        self.query_callback(center, radius, |idx| result.push(idx));
        result.sort_unstable();
    }
}
