// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use ndarray::Array2;

use super::*;
use crate::model::{
    DataKind, OiArray, OiFitsFile, OiFitsStandard, OiTarget, OiWavelength, Station, Target,
};

fn wavelength(ins_name: &str, eff_wave: &[f32]) -> OiWavelength {
    OiWavelength::new(ins_name, eff_wave.to_vec(), vec![1.0e-8; eff_wave.len()]).unwrap()
}

fn array(arr_name: &str) -> OiArray {
    let station = |sta_name: &str, sta_index: i16| Station {
        tel_name: format!("T{sta_index}"),
        sta_name: sta_name.to_string(),
        sta_index,
        diameter: 1.8,
        staxyz: [0.0; 3],
    };
    OiArray::new(
        arr_name,
        "GEOCENTRIC",
        vec![station("A0", 1), station("B1", 2), station("C2", 3)],
    )
}

fn data(ins_name: &str, target_id: Vec<i16>, night_id: Vec<i32>, mjd: Vec<f64>) -> OiData {
    let n = target_id.len();
    OiData {
        kind: DataKind::Vis2,
        date_obs: "2020-01-01".to_string(),
        ins_name: ins_name.to_string(),
        arr_name: "VLTI".to_string(),
        corr_name: None,
        target_id,
        night_id,
        mjd,
        int_time: vec![10.0; n],
        sta_index: vec![vec![1, 2]; n],
        values: Array2::zeros((n, 3)),
        errors: Array2::zeros((n, 3)),
        flags: Array2::from_elem((n, 3), false),
    }
}

/// A file with two targets (local ids 1 and 2), one instrument setup and
/// one data table observing both targets over two nights.
fn test_file(ins_name: &str, t1: &str, t2: &str) -> OiFitsFile {
    let mut file = OiFitsFile::new(OiFitsStandard::Version2);
    let mut targets = OiTarget::new();
    targets.push(1, Target::new(t1, 10.0, -24.0));
    targets.push(2, Target::new(t2, 30.0, -60.0));
    file.target = Some(targets);
    file.wavelengths
        .push(wavelength(ins_name, &[1.0e-6, 1.5e-6, 2.0e-6]));
    file.arrays.push(array("VLTI"));
    file.data.push(data(
        ins_name,
        vec![1, 2, 1, 2],
        vec![100, 100, 101, 101],
        vec![50000.0, 50000.1, 50001.0, 50001.1],
    ));
    file
}

#[test]
fn no_selector_keeps_everything_in_order() {
    let collection =
        OiFitsCollection::from_files([test_file("INS_A", "A", "B"), test_file("INS_B", "C", "D")]);
    let result = collection.find_data(None).unwrap();

    assert_eq!(
        sorted(&result),
        vec![DataRef { file: 0, table: 0 }, DataRef { file: 1, table: 0 }]
    );
    assert_eq!(result.sorted_files, vec![0, 1]);
    // First-appearance order across files.
    assert_eq!(result.distinct_targets.len(), 4);
    assert_eq!(result.distinct_nights, vec![100, 101]);
    assert!(result.selector.is_none());
}

fn sorted(result: &SelectorResult) -> Vec<DataRef> {
    result.sorted_datas.iter().copied().collect()
}

#[test]
fn target_criterion_restricts_tables_and_distinct_targets() {
    let collection =
        OiFitsCollection::from_files([test_file("INS_A", "A", "B"), test_file("INS_B", "C", "D")]);

    let selector = Selector {
        targets: vec!["a".to_string()],
        ..Default::default()
    };
    let result = collection.find_data(Some(&selector)).unwrap();
    assert_eq!(sorted(&result), vec![DataRef { file: 0, table: 0 }]);
    assert_eq!(result.distinct_targets.len(), 1);
    let tm = collection.target_manager();
    assert_eq!(tm.get(result.distinct_targets[0]).name, "A");
}

#[test]
fn instrument_criterion_matches_insname() {
    let collection =
        OiFitsCollection::from_files([test_file("INS_A", "A", "B"), test_file("INS_B", "C", "D")]);

    let selector = Selector {
        instruments: vec!["INS_B".to_string()],
        ..Default::default()
    };
    let result = collection.find_data(Some(&selector)).unwrap();
    assert_eq!(sorted(&result), vec![DataRef { file: 1, table: 0 }]);
}

#[test]
fn night_criterion_needs_one_matching_row() {
    let collection = OiFitsCollection::from_files([test_file("INS_A", "A", "B")]);

    let selector = Selector {
        nights: vec![101],
        ..Default::default()
    };
    let result = collection.find_data(Some(&selector)).unwrap();
    assert_eq!(result.sorted_datas.len(), 1);
    assert_eq!(result.distinct_nights, vec![101]);

    let selector = Selector {
        nights: vec![999],
        ..Default::default()
    };
    assert!(collection.find_data(Some(&selector)).is_none());
}

#[test]
fn wavelength_ranges_match_the_instrument_coverage() {
    let collection = OiFitsCollection::from_files([test_file("INS_A", "A", "B")]);

    let selector = Selector {
        wavelength_ranges: vec![Range::new(1.4e-6, 1.6e-6)],
        ..Default::default()
    };
    assert!(collection.find_data(Some(&selector)).is_some());

    let selector = Selector {
        wavelength_ranges: vec![Range::new(3.0e-6, 4.0e-6)],
        ..Default::default()
    };
    assert!(collection.find_data(Some(&selector)).is_none());
}

#[test]
fn mjd_ranges_match_the_observed_span() {
    let collection = OiFitsCollection::from_files([test_file("INS_A", "A", "B")]);

    let selector = Selector {
        mjd_ranges: vec![Range::new(50000.05, 50000.5)],
        ..Default::default()
    };
    assert!(collection.find_data(Some(&selector)).is_some());

    let selector = Selector {
        mjd_ranges: vec![Range::new(60000.0, 60001.0)],
        ..Default::default()
    };
    assert!(collection.find_data(Some(&selector)).is_none());
}

#[test]
fn baseline_criterion_uses_station_labels() {
    let collection = OiFitsCollection::from_files([test_file("INS_A", "A", "B")]);

    let selector = Selector {
        baselines: vec!["A0-B1".to_string()],
        ..Default::default()
    };
    assert!(collection.find_data(Some(&selector)).is_some());

    let selector = Selector {
        baselines: vec!["B1-C2".to_string()],
        ..Default::default()
    };
    assert!(collection.find_data(Some(&selector)).is_none());
}

#[test]
fn night_id_matcher() {
    let matcher = NightIdMatcher::new(&[100, 101]);
    assert!(matcher.matches(100));
    assert!(!matcher.matches(99));
    assert!(matcher.match_all([100, 101]));
    assert!(!matcher.match_all([100, 102]));
}
