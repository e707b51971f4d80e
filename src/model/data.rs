// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generic measurement tables over targets, baselines, times and
//! spectral channels.

use indexmap::IndexMap;
use itertools::Itertools;
use ndarray::{Array2, Axis};
use strum_macros::Display;

use crate::{
    mask::RowMask,
    model::{ModelError, OiArray},
    range::Range,
};

/// The concrete OIFITS measurement extension a table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DataKind {
    #[strum(serialize = "OI_VIS")]
    Vis,

    #[strum(serialize = "OI_VIS2")]
    Vis2,

    #[strum(serialize = "OI_T3")]
    T3,

    #[strum(serialize = "OI_FLUX")]
    Flux,
}

/// A measurement table.
///
/// Per-row columns are plain vectors; channel-indexed columns are
/// `(rows, channels)` arrays whose channel axis lines up with the rows
/// of the referenced `OI_WAVELENGTH` table. `sta_index` carries one
/// station tuple per row (2 stations for visibilities, 3 for triple
/// products, 1 for fluxes).
#[derive(Debug, Clone, PartialEq)]
pub struct OiData {
    pub kind: DataKind,
    pub date_obs: String,
    pub ins_name: String,
    pub arr_name: String,
    pub corr_name: Option<String>,
    pub target_id: Vec<i16>,
    pub night_id: Vec<i32>,
    pub mjd: Vec<f64>,
    pub int_time: Vec<f64>,
    pub sta_index: Vec<Vec<i16>>,
    pub values: Array2<f64>,
    pub errors: Array2<f64>,
    pub flags: Array2<bool>,
}

impl OiData {
    /// Check column-length consistency, returning the table when every
    /// per-row column has as many rows as `TARGET_ID` and every
    /// channel-indexed column has the same shape.
    pub fn validated(self) -> Result<OiData, ModelError> {
        let expected = self.target_id.len();
        let check = |column: &'static str, got: usize| -> Result<(), ModelError> {
            if got != expected {
                return Err(ModelError::ColumnLength {
                    column,
                    expected,
                    got,
                });
            }
            Ok(())
        };
        check("NIGHT_ID", self.night_id.len())?;
        check("MJD", self.mjd.len())?;
        check("INT_TIME", self.int_time.len())?;
        check("STA_INDEX", self.sta_index.len())?;
        check("values", self.values.nrows())?;
        check("errors", self.errors.nrows())?;
        check("flags", self.flags.nrows())?;
        if self.errors.ncols() != self.values.ncols() {
            return Err(ModelError::ColumnLength {
                column: "errors",
                expected: self.values.ncols(),
                got: self.errors.ncols(),
            });
        }
        if self.flags.ncols() != self.values.ncols() {
            return Err(ModelError::ColumnLength {
                column: "flags",
                expected: self.values.ncols(),
                got: self.flags.ncols(),
            });
        }
        Ok(self)
    }

    pub fn nb_rows(&self) -> usize {
        self.target_id.len()
    }

    pub fn nb_channels(&self) -> usize {
        self.values.ncols()
    }

    /// The distinct target ids, in first-appearance order.
    pub fn distinct_target_ids(&self) -> Vec<i16> {
        self.target_id.iter().copied().unique().collect()
    }

    /// The distinct night ids, in first-appearance order.
    pub fn distinct_night_ids(&self) -> Vec<i32> {
        self.night_id.iter().copied().unique().collect()
    }

    pub fn has_single_night(&self) -> bool {
        self.distinct_night_ids().len() <= 1
    }

    /// The distinct station tuples, in first-appearance order.
    pub fn distinct_sta_indexes(&self) -> Vec<Vec<i16>> {
        self.sta_index.iter().cloned().unique().collect()
    }

    /// One MJD range per observed night, in night first-appearance
    /// order.
    pub fn distinct_mjd_ranges(&self) -> Vec<Range> {
        let mut per_night: IndexMap<i32, (f64, f64)> = IndexMap::new();
        for (&night, &mjd) in self.night_id.iter().zip(self.mjd.iter()) {
            per_night
                .entry(night)
                .and_modify(|(lo, hi)| {
                    *lo = lo.min(mjd);
                    *hi = hi.max(mjd);
                })
                .or_insert((mjd, mjd));
        }
        per_night
            .into_values()
            .map(|(lo, hi)| Range::new(lo, hi))
            .collect()
    }

    /// The label of a station tuple: station names joined with `-`.
    /// Indices missing from the array table fall back to the numeric
    /// index so a label always exists.
    pub fn baseline_label(sta_index: &[i16], array: Option<&OiArray>) -> String {
        sta_index
            .iter()
            .map(|&idx| match array.and_then(|a| a.sta_name(idx)) {
                Some(name) => name.to_string(),
                None => idx.to_string(),
            })
            .join("-")
    }

    /// The distinct station tuples whose label is among `baselines`.
    pub fn matching_sta_indexes(
        &self,
        array: Option<&OiArray>,
        baselines: &[String],
    ) -> Vec<Vec<i16>> {
        self.distinct_sta_indexes()
            .into_iter()
            .filter(|sta| {
                let label = OiData::baseline_label(sta, array);
                baselines.iter().any(|b| *b == label)
            })
            .collect()
    }

    /// Keep only the masked rows; when a channel mask is given, also
    /// prune the channel-indexed columns.
    pub fn resize(&mut self, row_mask: &RowMask, channel_mask: Option<&RowMask>) {
        let rows = row_mask.kept_indices();
        self.target_id = rows.iter().map(|&i| self.target_id[i]).collect();
        self.night_id = rows.iter().map(|&i| self.night_id[i]).collect();
        self.mjd = rows.iter().map(|&i| self.mjd[i]).collect();
        self.int_time = rows.iter().map(|&i| self.int_time[i]).collect();
        self.sta_index = rows.iter().map(|&i| self.sta_index[i].clone()).collect();
        self.values = self.values.select(Axis(0), &rows);
        self.errors = self.errors.select(Axis(0), &rows);
        self.flags = self.flags.select(Axis(0), &rows);

        if let Some(mask) = channel_mask {
            let channels = mask.kept_indices();
            self.values = self.values.select(Axis(1), &channels);
            self.errors = self.errors.select(Axis(1), &channels);
            self.flags = self.flags.select(Axis(1), &channels);
        }
    }
}
