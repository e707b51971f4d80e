// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Selection criteria and the front-end producing the working set consumed
by the merger.

Selection is table-level only: a measurement table is kept when it
matches every supplied criterion through at least one of its rows.
Row-level pruning along the same axes is the merger's job.
 */

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use log::{debug, info};
use vec1::Vec1;

use crate::{
    model::{DataRef, OiData, OiFitsCollection, OiFitsFile, TargetUid},
    range::Range,
};

/// A night identifier (integer observation night).
pub type NightId = i32;

/// Optional selection criteria. An empty list matches everything on its
/// axis.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    /// Target names, matched through the global target registry.
    pub targets: Vec<String>,
    /// `INSNAME` values.
    pub instruments: Vec<String>,
    /// Observation nights.
    pub nights: Vec<NightId>,
    /// Baseline labels (station names joined with `-`).
    pub baselines: Vec<String>,
    /// MJD intervals.
    pub mjd_ranges: Vec<Range>,
    /// Wavelength intervals [metres].
    pub wavelength_ranges: Vec<Range>,
}

impl Selector {
    pub fn new() -> Selector {
        Selector::default()
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn has_instruments(&self) -> bool {
        !self.instruments.is_empty()
    }

    pub fn has_nights(&self) -> bool {
        !self.nights.is_empty()
    }

    pub fn has_baselines(&self) -> bool {
        !self.baselines.is_empty()
    }

    pub fn has_mjd_ranges(&self) -> bool {
        !self.mjd_ranges.is_empty()
    }

    pub fn has_wavelength_ranges(&self) -> bool {
        !self.wavelength_ranges.is_empty()
    }
}

/// Matches night ids against a selected set.
#[derive(Debug)]
pub struct NightIdMatcher {
    nights: HashSet<NightId>,
}

impl NightIdMatcher {
    pub fn new(nights: &[NightId]) -> NightIdMatcher {
        NightIdMatcher {
            nights: nights.iter().copied().collect(),
        }
    }

    pub fn matches(&self, night: NightId) -> bool {
        self.nights.contains(&night)
    }

    pub fn match_all(&self, nights: impl IntoIterator<Item = NightId>) -> bool {
        nights.into_iter().all(|night| self.matches(night))
    }
}

/// The working set selected out of a collection: the measurement tables
/// to merge, and the distinct files, targets and nights they carry.
///
/// All orders are deterministic: tables in file order then HDU order,
/// targets and nights in first-appearance order over the selected rows.
/// The target order fixes the target numbering of a merged output, and
/// the table order fixes its collision-suffix assignment.
#[derive(Debug, Clone)]
pub struct SelectorResult {
    pub sorted_datas: Vec1<DataRef>,
    pub sorted_files: Vec<usize>,
    pub distinct_targets: Vec<TargetUid>,
    pub distinct_nights: Vec<NightId>,
    pub selector: Option<Selector>,
}

impl OiFitsCollection {
    /// Select the measurement tables matching `selector` (all of them
    /// when `selector` is `None`). Returns `None` when nothing matches.
    pub fn find_data(&self, selector: Option<&Selector>) -> Option<SelectorResult> {
        debug!("selector: {selector:?}");

        let tm = self.target_manager();
        let selected_uids: Option<HashSet<TargetUid>> = selector
            .filter(|s| s.has_targets())
            .map(|s| {
                s.targets
                    .iter()
                    .filter_map(|name| tm.uid_by_name(name))
                    .collect()
            });

        // Local target id -> global target, per file.
        let local_uids: Vec<HashMap<i16, TargetUid>> = self
            .files()
            .iter()
            .map(|file| {
                file.target
                    .as_ref()
                    .map(|t| t.local_uid_map(tm))
                    .unwrap_or_default()
            })
            .collect();

        let mut sorted_datas = Vec::new();
        for (fi, file) in self.files().iter().enumerate() {
            for (ti, data) in file.data.iter().enumerate() {
                if table_matches(
                    file,
                    data,
                    selector,
                    selected_uids.as_ref(),
                    &local_uids[fi],
                ) {
                    sorted_datas.push(DataRef {
                        file: fi,
                        table: ti,
                    });
                }
            }
        }

        let sorted_datas = match Vec1::try_from_vec(sorted_datas) {
            Ok(datas) => datas,
            Err(_) => {
                info!("no matching data");
                return None;
            }
        };

        let mut sorted_files = Vec::new();
        let mut distinct_targets = Vec::new();
        let mut distinct_nights = Vec::new();
        for &r in sorted_datas.iter() {
            if !sorted_files.contains(&r.file) {
                sorted_files.push(r.file);
            }
            let data = self.data(r);
            for id in &data.target_id {
                if let Some(&uid) = local_uids[r.file].get(id) {
                    let selected = selected_uids
                        .as_ref()
                        .map_or(true, |uids| uids.contains(&uid));
                    if selected && !distinct_targets.contains(&uid) {
                        distinct_targets.push(uid);
                    }
                }
            }
            for &night in &data.night_id {
                let selected = selector.map_or(true, |s| {
                    !s.has_nights() || s.nights.contains(&night)
                });
                if selected && !distinct_nights.contains(&night) {
                    distinct_nights.push(night);
                }
            }
        }

        info!("selected data tables: {}", sorted_datas.len());
        debug!("distinct targets: {distinct_targets:?}");
        debug!("distinct nights:  {distinct_nights:?}");

        Some(SelectorResult {
            sorted_datas,
            sorted_files,
            distinct_targets,
            distinct_nights,
            selector: selector.cloned(),
        })
    }
}

/// Does a measurement table match every supplied criterion through at
/// least one of its rows?
fn table_matches(
    file: &OiFitsFile,
    data: &OiData,
    selector: Option<&Selector>,
    selected_uids: Option<&HashSet<TargetUid>>,
    local_uids: &HashMap<i16, TargetUid>,
) -> bool {
    let Some(selector) = selector else {
        return true;
    };

    if selector.has_instruments() && !selector.instruments.iter().any(|n| *n == data.ins_name) {
        return false;
    }

    if selector.has_wavelength_ranges() {
        match file
            .wavelength(&data.ins_name)
            .and_then(|w| w.wavelength_range())
        {
            Some(range) => {
                if !selector
                    .wavelength_ranges
                    .iter()
                    .any(|r| r.overlaps(&range))
                {
                    return false;
                }
            }
            None => return false,
        }
    }

    if selector.has_mjd_ranges() {
        let data_ranges = data.distinct_mjd_ranges();
        if !selector
            .mjd_ranges
            .iter()
            .any(|r| data_ranges.iter().any(|d| r.overlaps(d)))
        {
            return false;
        }
    }

    if selector.has_nights()
        && !data
            .distinct_night_ids()
            .iter()
            .any(|night| selector.nights.contains(night))
    {
        return false;
    }

    if selector.has_baselines() {
        let array = file.array(&data.arr_name);
        if data
            .matching_sta_indexes(array, &selector.baselines)
            .is_empty()
        {
            return false;
        }
    }

    if let Some(uids) = selected_uids {
        if !data.distinct_target_ids().iter().any(|id| {
            local_uids
                .get(id)
                .map_or(false, |uid| uids.contains(uid))
        }) {
            return false;
        }
    }

    true
}
