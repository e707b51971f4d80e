// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Strict content comparison of metadata tables, used to deduplicate
//! identical tables while merging.
//!
//! The naming keyword (`INSNAME`, `ARRNAME`) is excluded from the
//! comparison: a table that was renamed with a collision suffix must
//! still compare equal to an identical incoming one. Column data
//! compares with exact equality.

use crate::model::{OiArray, OiWavelength};

impl OiWavelength {
    pub fn content_eq(&self, other: &OiWavelength) -> bool {
        self.eff_wave == other.eff_wave && self.eff_band == other.eff_band
    }
}

impl OiArray {
    pub fn content_eq(&self, other: &OiArray) -> bool {
        self.frame == other.frame && self.stations == other.stations
    }
}
