//! Mixed-radix indexing of dense potential tables.
//!
//! A table over variables `x₀, …, x_{k-1}` with cardinalities `r₀, …, r_{k-1}`
//! is stored row-major: the last variable varies fastest.
//!
//! ```text
//! offset(v) = ((v₀ · r₁ + v₁) · r₂ + v₂) · … + v_{k-1}
//! ```
//!
//! Walking offsets `0, 1, 2, …` is the same as counting with carries on an
//! [`Odometer`], which is how every table in the crate is traversed.

/// Radii (cardinalities) and strides of a row-major table layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixedRadix {
    radii: Vec<usize>,
    strides: Vec<usize>,
    size: usize,
}

impl MixedRadix {
    /// Creates a layout, or `None` if the table size overflows `usize`.
    pub fn new(radii: Vec<usize>) -> Option<Self> {
        let mut strides = vec![0; radii.len()];
        let mut size = 1usize;
        for i in (0..radii.len()).rev() {
            strides[i] = size;
            size = size.checked_mul(radii[i])?;
        }
        Some(Self {
            radii,
            strides,
            size,
        })
    }

    /// Number of cells in the table.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of digits (variables).
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    pub fn radii(&self) -> &[usize] {
        &self.radii
    }

    /// Flat offset of a full assignment.
    pub fn offset(&self, values: &[usize]) -> usize {
        debug_assert_eq!(values.len(), self.radii.len());
        values
            .iter()
            .zip(self.strides.iter())
            .map(|(v, s)| v * s)
            .sum()
    }

    /// Assignment stored at `offset`.
    pub fn values(&self, mut offset: usize) -> Vec<usize> {
        debug_assert!(offset < self.size);
        let mut values = vec![0; self.radii.len()];
        for i in (0..self.radii.len()).rev() {
            values[i] = offset % self.radii[i];
            offset /= self.radii[i];
        }
        values
    }

    /// Starts counting through every assignment in offset order.
    pub fn odometer(&self) -> Odometer<'_> {
        Odometer {
            radii: &self.radii,
            values: vec![0; self.radii.len()],
        }
    }

    /// For every offset of this table, the offset of the sub-assignment
    /// formed by the digits at `positions` in that sub-table's own layout.
    ///
    /// This is the map used to marginalize a clique onto a separator.
    pub fn projection(&self, positions: &[usize]) -> Vec<usize> {
        // A sub-table is never larger than its table, so this cannot overflow.
        let mut sub_strides = vec![0; positions.len()];
        let mut stride = 1;
        for k in (0..positions.len()).rev() {
            sub_strides[k] = stride;
            stride *= self.radii[positions[k]];
        }

        let mut map = Vec::with_capacity(self.size);
        let mut odometer = self.odometer();
        loop {
            let values = odometer.values();
            let offset = positions
                .iter()
                .zip(sub_strides.iter())
                .map(|(&p, s)| values[p] * s)
                .sum::<usize>();
            map.push(offset);
            if !odometer.advance() {
                break;
            }
        }
        map
    }
}

/// Counter over all assignments of a [`MixedRadix`], last digit fastest.
pub struct Odometer<'a> {
    radii: &'a [usize],
    values: Vec<usize>,
}

impl Odometer<'_> {
    /// Current assignment.
    pub fn values(&self) -> &[usize] {
        &self.values
    }

    /// Steps to the next assignment. Returns false after the last one.
    pub fn advance(&mut self) -> bool {
        for i in (0..self.radii.len()).rev() {
            self.values[i] += 1;
            if self.values[i] < self.radii[i] {
                return true;
            }
            self.values[i] = 0;
        }
        false
    }
}
