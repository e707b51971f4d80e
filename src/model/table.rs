// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Metadata tables: spectral setups, telescope arrays and correlation
//! matrices.

use crate::{mask::RowMask, model::ModelError, range::Range};

/// An `OI_WAVELENGTH` table: the spectral channels of one instrument
/// setup. Wavelengths are in metres.
#[derive(Debug, Clone, PartialEq)]
pub struct OiWavelength {
    pub ins_name: String,
    pub eff_wave: Vec<f32>,
    pub eff_band: Vec<f32>,
}

impl OiWavelength {
    pub fn new(
        ins_name: impl Into<String>,
        eff_wave: Vec<f32>,
        eff_band: Vec<f32>,
    ) -> Result<OiWavelength, ModelError> {
        if eff_band.len() != eff_wave.len() {
            return Err(ModelError::ColumnLength {
                column: "EFF_BAND",
                expected: eff_wave.len(),
                got: eff_band.len(),
            });
        }
        Ok(OiWavelength {
            ins_name: ins_name.into(),
            eff_wave,
            eff_band,
        })
    }

    pub fn nb_rows(&self) -> usize {
        self.eff_wave.len()
    }

    /// The spectral coverage of this setup: `[min, max]` of `EFF_WAVE`.
    pub fn wavelength_range(&self) -> Option<Range> {
        if self.eff_wave.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &w in &self.eff_wave {
            let w = f64::from(w);
            min = min.min(w);
            max = max.max(w);
        }
        Some(Range::new(min, max))
    }

    /// Keep only the masked rows.
    pub fn resize(&mut self, mask: &RowMask) {
        let kept = mask.kept_indices();
        self.eff_wave = kept.iter().map(|&i| self.eff_wave[i]).collect();
        self.eff_band = kept.iter().map(|&i| self.eff_band[i]).collect();
    }
}

/// One `OI_ARRAY` station row.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub tel_name: String,
    pub sta_name: String,
    pub sta_index: i16,
    pub diameter: f32,
    pub staxyz: [f64; 3],
}

/// An `OI_ARRAY` table: the geometry of one telescope array.
#[derive(Debug, Clone, PartialEq)]
pub struct OiArray {
    pub arr_name: String,
    pub frame: String,
    pub stations: Vec<Station>,
}

impl OiArray {
    pub fn new(
        arr_name: impl Into<String>,
        frame: impl Into<String>,
        stations: Vec<Station>,
    ) -> OiArray {
        OiArray {
            arr_name: arr_name.into(),
            frame: frame.into(),
            stations,
        }
    }

    pub fn nb_rows(&self) -> usize {
        self.stations.len()
    }

    /// The station name carrying the given index, if any.
    pub fn sta_name(&self, sta_index: i16) -> Option<&str> {
        self.stations
            .iter()
            .find(|s| s.sta_index == sta_index)
            .map(|s| s.sta_name.as_str())
    }
}

/// One `OI_CORR` correlation element.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrElem {
    pub iindx: i32,
    pub jindx: i32,
    pub corr: f64,
}

/// An `OI_CORR` table (OIFITS2): off-diagonal correlations between
/// measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct OiCorr {
    pub corr_name: String,
    pub rows: Vec<CorrElem>,
}

impl OiCorr {
    pub fn new(corr_name: impl Into<String>, rows: Vec<CorrElem>) -> OiCorr {
        OiCorr {
            corr_name: corr_name.into(),
            rows,
        }
    }

    pub fn nb_rows(&self) -> usize {
        self.rows.len()
    }
}
