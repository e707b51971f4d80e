// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Dense row masks used when pruning table rows.

/// A dense keep/drop mask over table rows. A set bit marks a row to keep;
/// freshly-created masks keep nothing.
///
/// The mask always refers to *original* row indices, so a mask computed
/// before a table is resized can still drive the channel pruning of
/// tables that reference it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMask {
    bits: Vec<bool>,
}

impl RowMask {
    pub fn new(len: usize) -> RowMask {
        RowMask {
            bits: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn set(&mut self, index: usize) {
        self.bits[index] = true;
    }

    pub fn get(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// The number of kept rows.
    pub fn cardinality(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// The kept row indices, ascending.
    pub fn kept_indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }
}
