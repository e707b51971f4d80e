// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use ndarray::{array, Array2};

use super::*;
use crate::mask::RowMask;

fn simple_data(target_id: Vec<i16>, night_id: Vec<i32>, mjd: Vec<f64>) -> OiData {
    let n = target_id.len();
    OiData {
        kind: DataKind::Vis2,
        date_obs: "2020-01-01".to_string(),
        ins_name: "INS_A".to_string(),
        arr_name: "ARR_A".to_string(),
        corr_name: None,
        target_id,
        night_id,
        mjd,
        int_time: vec![1.0; n],
        sta_index: vec![vec![1, 2]; n],
        values: Array2::zeros((n, 3)),
        errors: Array2::zeros((n, 3)),
        flags: Array2::from_elem((n, 3), false),
    }
}

#[test]
fn version_ordering_and_display() {
    assert!(OiFitsStandard::Version2 > OiFitsStandard::Version1);
    assert_eq!(OiFitsStandard::Version1.to_string(), "OIFITS1");
    assert_eq!(OiFitsStandard::Version2.to_string(), "OIFITS2");
}

#[test]
fn data_kind_display_matches_extnames() {
    assert_eq!(DataKind::Vis.to_string(), "OI_VIS");
    assert_eq!(DataKind::Vis2.to_string(), "OI_VIS2");
    assert_eq!(DataKind::T3.to_string(), "OI_T3");
    assert_eq!(DataKind::Flux.to_string(), "OI_FLUX");
}

#[test]
fn validated_rejects_mismatched_columns() {
    let mut data = simple_data(vec![1, 1], vec![1, 1], vec![50000.0, 50000.1]);
    data.night_id.pop();
    let result = data.validated();
    assert!(matches!(
        result,
        Err(ModelError::ColumnLength {
            column: "NIGHT_ID",
            expected: 2,
            got: 1,
        })
    ));

    let good = simple_data(vec![1], vec![1], vec![50000.0]).validated();
    assert!(good.is_ok());
}

#[test]
fn distinct_queries_preserve_first_appearance_order() {
    let data = simple_data(
        vec![2, 1, 2, 3, 1],
        vec![5, 5, 6, 6, 5],
        vec![50000.0, 50000.1, 50001.0, 50001.5, 50000.2],
    );
    assert_eq!(data.distinct_target_ids(), vec![2, 1, 3]);
    assert_eq!(data.distinct_night_ids(), vec![5, 6]);
    assert!(!data.has_single_night());

    let single = simple_data(vec![1, 1], vec![7, 7], vec![50000.0, 50000.1]);
    assert!(single.has_single_night());
}

#[test]
fn distinct_mjd_ranges_are_per_night() {
    let data = simple_data(
        vec![1, 1, 1, 1],
        vec![5, 6, 5, 6],
        vec![50000.0, 50001.0, 50000.5, 50001.2],
    );
    let ranges = data.distinct_mjd_ranges();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0], crate::range::Range::new(50000.0, 50000.5));
    assert_eq!(ranges[1], crate::range::Range::new(50001.0, 50001.2));
}

fn vlti_array() -> OiArray {
    OiArray::new(
        "VLTI",
        "GEOCENTRIC",
        vec![
            Station {
                tel_name: "AT1".to_string(),
                sta_name: "A0".to_string(),
                sta_index: 1,
                diameter: 1.8,
                staxyz: [0.0; 3],
            },
            Station {
                tel_name: "AT2".to_string(),
                sta_name: "B1".to_string(),
                sta_index: 2,
                diameter: 1.8,
                staxyz: [0.0; 3],
            },
            Station {
                tel_name: "AT3".to_string(),
                sta_name: "C2".to_string(),
                sta_index: 3,
                diameter: 1.8,
                staxyz: [0.0; 3],
            },
        ],
    )
}

#[test]
fn baseline_labels_resolve_station_names() {
    let array = vlti_array();
    assert_eq!(OiData::baseline_label(&[1, 2], Some(&array)), "A0-B1");
    assert_eq!(OiData::baseline_label(&[2, 3], Some(&array)), "B1-C2");
    // Unknown indices and missing arrays fall back to numbers.
    assert_eq!(OiData::baseline_label(&[1, 9], Some(&array)), "A0-9");
    assert_eq!(OiData::baseline_label(&[1, 2], None), "1-2");
}

#[test]
fn matching_sta_indexes_filters_distinct_tuples() {
    let array = vlti_array();
    let mut data = simple_data(vec![1; 4], vec![1; 4], vec![50000.0; 4]);
    data.sta_index = vec![vec![1, 2], vec![2, 3], vec![1, 2], vec![1, 3]];

    let baselines = vec!["A0-B1".to_string(), "B1-C2".to_string()];
    let matchings = data.matching_sta_indexes(Some(&array), &baselines);
    assert_eq!(matchings, vec![vec![1, 2], vec![2, 3]]);

    assert!(data
        .matching_sta_indexes(Some(&array), &["D0-D1".to_string()])
        .is_empty());
}

#[test]
fn resize_prunes_rows_and_channels() {
    let mut data = simple_data(vec![1, 2, 3], vec![1, 1, 1], vec![50000.0, 50000.1, 50000.2]);
    data.values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
    data.errors = data.values.mapv(|v| v / 10.0);

    let mut rows = RowMask::new(3);
    rows.set(0);
    rows.set(2);
    let mut channels = RowMask::new(3);
    channels.set(1);
    channels.set(2);

    data.resize(&rows, Some(&channels));
    assert_eq!(data.nb_rows(), 2);
    assert_eq!(data.nb_channels(), 2);
    assert_eq!(data.target_id, vec![1, 3]);
    assert_eq!(data.values, array![[2.0, 3.0], [8.0, 9.0]]);
    assert_eq!(data.errors, array![[0.2, 0.3], [0.8, 0.9]]);
    assert_eq!(data.sta_index.len(), 2);
}

#[test]
fn wavelength_range_and_resize() {
    let wl = OiWavelength::new(
        "INS_A",
        vec![1.0e-6, 1.3e-6, 1.5e-6, 2.0e-6],
        vec![1.0e-8; 4],
    )
    .unwrap();
    let range = wl.wavelength_range().unwrap();
    assert_eq!(range.min, f64::from(1.0e-6_f32));
    assert_eq!(range.max, f64::from(2.0e-6_f32));

    let mut wl = wl;
    let mut mask = RowMask::new(4);
    mask.set(1);
    mask.set(2);
    wl.resize(&mask);
    assert_eq!(wl.nb_rows(), 2);
    assert_eq!(wl.eff_wave, vec![1.3e-6, 1.5e-6]);

    assert!(OiWavelength::new("BAD", vec![1.0e-6], vec![]).is_err());
}

#[test]
fn target_manager_deduplicates_across_datasets() {
    let mut tm = TargetManager::new();
    let a = tm.register(&Target::new("HD 1234", 10.0, -24.0));
    let b = tm.register(&Target::new(" hd 1234 ", 10.0, -24.0));
    assert_eq!(a, b);
    assert_eq!(tm.len(), 1);

    // Same name, clearly different coordinates: a distinct target.
    let c = tm.register(&Target::new("HD 1234", 11.0, -24.0));
    assert_ne!(a, c);
    assert_eq!(tm.len(), 2);

    assert_eq!(tm.uid_by_name("hd 1234"), Some(a));
    assert_eq!(tm.uid_by_name("nope"), None);
}

#[test]
fn oi_target_resolves_local_ids() {
    let mut tm = TargetManager::new();
    let t1 = Target::new("A", 1.0, 2.0);
    let t2 = Target::new("B", 3.0, 4.0);
    let uid1 = tm.register(&t1);
    let uid2 = tm.register(&t2);

    let mut table = OiTarget::new();
    table.push(1, t1.clone());
    table.push(2, t2.clone());
    // A second local id for the same logical target.
    table.push(3, t1.clone());

    assert_eq!(table.target_ids(&tm, uid1), vec![1, 3]);
    assert_eq!(table.target_ids(&tm, uid2), vec![2]);

    let map = table.local_uid_map(&tm);
    assert_eq!(map[&1], uid1);
    assert_eq!(map[&2], uid2);
    assert_eq!(map[&3], uid1);
}

#[test]
fn content_eq_ignores_the_naming_keyword() {
    let a = OiWavelength::new("INS_A", vec![1.0e-6, 2.0e-6], vec![1.0e-8; 2]).unwrap();
    let mut b = a.clone();
    b.ins_name = "INS_A_1".to_string();
    assert!(a.content_eq(&b));

    b.eff_wave[0] = 1.1e-6;
    assert!(!a.content_eq(&b));

    let arr_a = OiArray::new("VLTI", "GEOCENTRIC", vec![]);
    let mut arr_b = arr_a.clone();
    arr_b.arr_name = "VLTI_1".to_string();
    assert!(arr_a.content_eq(&arr_b));
}

#[test]
fn primary_hdu_keywords_iterate_in_insertion_order() {
    let mut hdu = PrimaryHdu::new();
    hdu.set_keyword("TELESCOP", "VLTI");
    hdu.set_keyword("OBSERVER", "UNKNOWN");
    hdu.set_keyword("TELESCOP", "CHARA");

    assert_eq!(hdu.keyword("TELESCOP"), Some("CHARA"));
    assert_eq!(hdu.keyword("MISSING"), None);
    let names: Vec<&str> = hdu.keywords().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["TELESCOP", "OBSERVER"]);

    hdu.add_history("first");
    hdu.add_history("second");
    assert_eq!(hdu.history(), ["first", "second"]);
}

#[test]
fn fits_date_has_the_expected_shape() {
    let date = fits_date_now();
    assert_eq!(date.len(), 19);
    assert_eq!(&date[4..5], "-");
    assert_eq!(&date[10..11], "T");
}

#[test]
fn collection_resolves_references_by_name() {
    let mut file = OiFitsFile::new(OiFitsStandard::Version2);
    file.wavelengths
        .push(OiWavelength::new("INS_A", vec![1.0e-6], vec![1.0e-8]).unwrap());
    file.arrays.push(vlti_array());
    file.data.push(simple_data(vec![1], vec![1], vec![50000.0]));
    file.data[0].arr_name = "VLTI".to_string();

    let collection = OiFitsCollection::from_files([file]);
    let data_ref = DataRef { file: 0, table: 0 };
    assert_eq!(
        collection.wavelength_of(data_ref),
        Some(WlRef { file: 0, table: 0 })
    );
    assert_eq!(
        collection.array_of(data_ref),
        Some(ArrRef { file: 0, table: 0 })
    );
    // No CORRNAME: no correlation reference.
    assert_eq!(collection.corr_of(data_ref), None);
}
