// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
In-memory model of an OIFITS dataset.

A dataset ([`OiFitsFile`]) holds one primary HDU, one `OI_TARGET` table,
and ordered lists of metadata (`OI_WAVELENGTH`, `OI_ARRAY`, `OI_CORR`)
and measurement tables. Measurement tables reference metadata tables by
name (`INSNAME`, `ARRNAME`, `CORRNAME`) within their own dataset.

An [`OiFitsCollection`] is an ordered list of datasets sharing one
[`TargetManager`]. Tables inside a collection are addressed by small
`Copy` handles ([`DataRef`], [`WlRef`], [`ArrRef`], [`CorrRef`]); handles
compare by position, which gives the merger the table-identity semantics
it needs for its cross-phase maps.
 */

mod compare;
mod data;
mod primary;
mod table;
mod target;
#[cfg(test)]
mod tests;

pub use data::{DataKind, OiData};
pub use primary::{fits_date_now, HeaderCard, KeywordDesc, PrimaryHdu, PRIMARY_KEYWORDS};
pub use table::{CorrElem, OiArray, OiCorr, OiWavelength, Station};
pub use target::{OiTarget, Target, TargetManager, TargetRow, TargetUid};

use strum_macros::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("column {column} has {got} rows; expected {expected}")]
    ColumnLength {
        column: &'static str,
        expected: usize,
        got: usize,
    },
}

/// The OIFITS standard revision a dataset conforms to.
///
/// Ordered so that `Version2 > Version1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum OiFitsStandard {
    #[strum(serialize = "OIFITS1")]
    Version1,

    #[strum(serialize = "OIFITS2")]
    Version2,
}

/// Handle to a measurement table inside a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRef {
    pub file: usize,
    pub table: usize,
}

/// Handle to an `OI_WAVELENGTH` table inside a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WlRef {
    pub file: usize,
    pub table: usize,
}

/// Handle to an `OI_ARRAY` table inside a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrRef {
    pub file: usize,
    pub table: usize,
}

/// Handle to an `OI_CORR` table inside a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrRef {
    pub file: usize,
    pub table: usize,
}

/// One OIFITS dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct OiFitsFile {
    pub version: OiFitsStandard,
    pub primary: Option<PrimaryHdu>,
    pub target: Option<OiTarget>,
    pub wavelengths: Vec<OiWavelength>,
    pub arrays: Vec<OiArray>,
    pub corrs: Vec<OiCorr>,
    pub data: Vec<OiData>,
}

impl OiFitsFile {
    pub fn new(version: OiFitsStandard) -> OiFitsFile {
        OiFitsFile {
            version,
            primary: None,
            target: None,
            wavelengths: Vec::new(),
            arrays: Vec::new(),
            corrs: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn is_v2(&self) -> bool {
        self.version == OiFitsStandard::Version2
    }

    pub fn wavelength(&self, ins_name: &str) -> Option<&OiWavelength> {
        self.wavelengths.iter().find(|t| t.ins_name == ins_name)
    }

    pub fn wavelength_index(&self, ins_name: &str) -> Option<usize> {
        self.wavelengths.iter().position(|t| t.ins_name == ins_name)
    }

    pub fn array(&self, arr_name: &str) -> Option<&OiArray> {
        self.arrays.iter().find(|t| t.arr_name == arr_name)
    }

    pub fn array_index(&self, arr_name: &str) -> Option<usize> {
        self.arrays.iter().position(|t| t.arr_name == arr_name)
    }

    pub fn corr(&self, corr_name: &str) -> Option<&OiCorr> {
        self.corrs.iter().find(|t| t.corr_name == corr_name)
    }

    pub fn corr_index(&self, corr_name: &str) -> Option<usize> {
        self.corrs.iter().position(|t| t.corr_name == corr_name)
    }

    /// All `INSNAME` values, in table order.
    pub fn ins_names(&self) -> Vec<&str> {
        self.wavelengths
            .iter()
            .map(|t| t.ins_name.as_str())
            .collect()
    }

    /// All `ARRNAME` values, in table order.
    pub fn arr_names(&self) -> Vec<&str> {
        self.arrays.iter().map(|t| t.arr_name.as_str()).collect()
    }

    /// All `CORRNAME` values, in table order.
    pub fn corr_names(&self) -> Vec<&str> {
        self.corrs.iter().map(|t| t.corr_name.as_str()).collect()
    }
}

/// An ordered collection of OIFITS datasets sharing one target registry.
#[derive(Debug, Default)]
pub struct OiFitsCollection {
    files: Vec<OiFitsFile>,
    targets: TargetManager,
}

impl OiFitsCollection {
    pub fn new() -> OiFitsCollection {
        OiFitsCollection::default()
    }

    pub fn from_files(files: impl IntoIterator<Item = OiFitsFile>) -> OiFitsCollection {
        let mut collection = OiFitsCollection::default();
        for file in files {
            collection.add_file(file);
        }
        collection
    }

    /// Append a dataset, registering its targets in the shared registry.
    pub fn add_file(&mut self, file: OiFitsFile) {
        if let Some(target_table) = &file.target {
            for row in target_table.rows() {
                self.targets.register(&row.target);
            }
        }
        self.files.push(file);
    }

    pub fn files(&self) -> &[OiFitsFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn target_manager(&self) -> &TargetManager {
        &self.targets
    }

    pub fn data(&self, r: DataRef) -> &OiData {
        &self.files[r.file].data[r.table]
    }

    pub fn wavelength(&self, r: WlRef) -> &OiWavelength {
        &self.files[r.file].wavelengths[r.table]
    }

    pub fn array(&self, r: ArrRef) -> &OiArray {
        &self.files[r.file].arrays[r.table]
    }

    pub fn corr(&self, r: CorrRef) -> &OiCorr {
        &self.files[r.file].corrs[r.table]
    }

    /// The `OI_WAVELENGTH` table a measurement table references through
    /// its `INSNAME`, if it resolves.
    pub fn wavelength_of(&self, r: DataRef) -> Option<WlRef> {
        let data = self.data(r);
        self.files[r.file]
            .wavelength_index(&data.ins_name)
            .map(|table| WlRef { file: r.file, table })
    }

    /// The `OI_ARRAY` table a measurement table references through its
    /// `ARRNAME`, if it resolves.
    pub fn array_of(&self, r: DataRef) -> Option<ArrRef> {
        let data = self.data(r);
        self.files[r.file]
            .array_index(&data.arr_name)
            .map(|table| ArrRef { file: r.file, table })
    }

    /// The `OI_CORR` table a measurement table references through its
    /// `CORRNAME`, if any and if it resolves.
    pub fn corr_of(&self, r: DataRef) -> Option<CorrRef> {
        let data = self.data(r);
        data.corr_name
            .as_deref()
            .and_then(|name| self.files[r.file].corr_index(name))
            .map(|table| CorrRef { file: r.file, table })
    }
}
