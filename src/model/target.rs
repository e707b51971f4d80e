// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Logical sky targets, the global target registry and the `OI_TARGET`
//! table.

use std::collections::HashMap;

/// A sky target. Coordinates are J2000 [degrees].
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub ra: f64,
    pub dec: f64,
}

impl Target {
    pub fn new(name: impl Into<String>, ra: f64, dec: f64) -> Target {
        Target {
            name: name.into(),
            ra,
            dec,
        }
    }
}

/// Handle to a target registered in a [`TargetManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetUid(pub usize);

/// Coordinate tolerance when matching targets across datasets
/// \[degrees\] (1 mas).
const COORDS_TOLERANCE: f64 = 1.0 / 3_600_000.0;

fn normalise(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Registry deduplicating logical targets across datasets.
///
/// Two targets match when their normalised names are equal and their
/// coordinates agree within [`COORDS_TOLERANCE`]; the same name at
/// clearly different coordinates stays distinct. Registration order is
/// the global target order.
#[derive(Debug, Default)]
pub struct TargetManager {
    globals: Vec<Target>,
}

impl TargetManager {
    pub fn new() -> TargetManager {
        TargetManager::default()
    }

    fn matches(a: &Target, b: &Target) -> bool {
        normalise(&a.name) == normalise(&b.name)
            && (a.ra - b.ra).abs() <= COORDS_TOLERANCE
            && (a.dec - b.dec).abs() <= COORDS_TOLERANCE
    }

    /// Register a target, returning the handle of the matching global
    /// target (inserting it first if none matches yet).
    pub fn register(&mut self, target: &Target) -> TargetUid {
        if let Some(uid) = self.global_of(target) {
            return uid;
        }
        self.globals.push(target.clone());
        TargetUid(self.globals.len() - 1)
    }

    /// The global target matching `target`, if already registered.
    pub fn global_of(&self, target: &Target) -> Option<TargetUid> {
        self.globals
            .iter()
            .position(|g| TargetManager::matches(g, target))
            .map(TargetUid)
    }

    /// The first registered target carrying the given (normalised) name.
    pub fn uid_by_name(&self, name: &str) -> Option<TargetUid> {
        let name = normalise(name);
        self.globals
            .iter()
            .position(|g| normalise(&g.name) == name)
            .map(TargetUid)
    }

    pub fn get(&self, uid: TargetUid) -> &Target {
        &self.globals[uid.0]
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}

/// One `OI_TARGET` row: a dataset-local 16-bit id and its target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRow {
    pub target_id: i16,
    pub target: Target,
}

/// The `OI_TARGET` table of a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OiTarget {
    rows: Vec<TargetRow>,
}

impl OiTarget {
    pub fn new() -> OiTarget {
        OiTarget::default()
    }

    pub fn push(&mut self, target_id: i16, target: Target) {
        self.rows.push(TargetRow { target_id, target });
    }

    pub fn rows(&self) -> &[TargetRow] {
        &self.rows
    }

    pub fn nb_rows(&self) -> usize {
        self.rows.len()
    }

    /// The local ids whose target matches the given global target.
    pub fn target_ids(&self, tm: &TargetManager, uid: TargetUid) -> Vec<i16> {
        self.rows
            .iter()
            .filter(|row| tm.global_of(&row.target) == Some(uid))
            .map(|row| row.target_id)
            .collect()
    }

    /// Map every local id to its global target.
    pub fn local_uid_map(&self, tm: &TargetManager) -> HashMap<i16, TargetUid> {
        self.rows
            .iter()
            .filter_map(|row| tm.global_of(&row.target).map(|uid| (row.target_id, uid)))
            .collect()
    }
}
