// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Deterministic consolidation of an OIFITS collection into one
self-consistent dataset.

The merge runs as a fixed pipeline over a mutable [`MergeContext`]:
collect the metadata tables referenced by the selected measurement
tables, build the output primary HDU, renumber targets globally, copy
metadata tables with collision renaming (deduplicating tables that
compare strictly equal), then copy each measurement table, rewriting its
references and pruning rows along the selected axes. Iteration orders
are insertion orders throughout, so collision-suffix assignment and
target numbering are deterministic.

Inputs are never modified; every table landing in the output is a copy.
 */

mod error;

pub use error::MergeError;

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};

use crate::{
    constants::{
        CONTENT_OIFITS2, HISTORY_LINE, KEYWORD_CONTENT, KEYWORD_DATE, UNDEFINED, UNDEFINED_I16,
        VALUE_MULTI,
    },
    mask::RowMask,
    model::{
        fits_date_now, ArrRef, CorrRef, OiFitsCollection, OiFitsFile, OiFitsStandard, OiTarget,
        PrimaryHdu, TargetUid, WlRef, PRIMARY_KEYWORDS,
    },
    range::{self, Range},
    selector::{NightIdMatcher, Selector, SelectorResult},
};

/// Merge the given datasets with no selection.
pub fn merge_files(files: &[OiFitsFile]) -> Result<OiFitsFile, MergeError> {
    if files.is_empty() {
        return Err(MergeError::MissingInputs);
    }
    let collection = OiFitsCollection::from_files(files.iter().cloned());
    merge_collection(&collection)
}

/// Merge a collection with no selection.
pub fn merge_collection(collection: &OiFitsCollection) -> Result<OiFitsFile, MergeError> {
    merge_select(collection, None, None)
}

/// Merge a collection, applying optional selection criteria and an
/// optional explicit output standard.
pub fn merge_select(
    collection: &OiFitsCollection,
    selector: Option<&Selector>,
    std: Option<OiFitsStandard>,
) -> Result<OiFitsFile, MergeError> {
    if collection.is_empty() {
        return Err(MergeError::MissingInputs);
    }
    let result = collection.find_data(selector);
    Ok(merge_result(collection, result.as_ref(), std))
}

/// Merge a precomputed selection. A `None` result yields an empty
/// dataset carrying only its version tag.
pub fn merge_result(
    collection: &OiFitsCollection,
    result: Option<&SelectorResult>,
    std: Option<OiFitsStandard>,
) -> OiFitsFile {
    let mut output = create_output(collection, result, std);

    match result {
        Some(result) => {
            let mut ctx = MergeContext::new(collection, result);
            collect_tables(&mut ctx);
            process_primary_hdu(&ctx, &mut output);
            process_targets(&mut ctx, &mut output);
            process_wavelengths(&mut ctx, &mut output);
            process_arrays(&mut ctx, &mut output);
            if output.is_v2() {
                process_corrs(&mut ctx, &mut output);
            }
            process_data(&mut ctx, &mut output);
        }
        None => {
            // empty selection: the bare output is returned as-is
            info!("no data selected");
        }
    }
    output
}

/// Cross-phase state of one merge run. Fields fill monotonically: the
/// used-table sets first, then the per-phase mappings, each keyed by a
/// table handle.
struct MergeContext<'a> {
    collection: &'a OiFitsCollection,
    result: &'a SelectorResult,
    /// Files whose primary HDU backs a selected measurement table.
    used_primary_hdus: IndexSet<usize>,
    /// Files whose `OI_TARGET` backs a selected measurement table.
    used_targets: IndexSet<usize>,
    used_wavelengths: IndexSet<WlRef>,
    used_arrays: IndexSet<ArrRef>,
    used_corrs: IndexSet<CorrRef>,
    /// Per source `OI_TARGET` (file index): local id -> output id. A
    /// missing entry marks a target dropped by the selection.
    map_target_ids: IndexMap<usize, HashMap<i16, i16>>,
    /// Source table -> index of its table in the output.
    map_wavelengths: IndexMap<WlRef, usize>,
    map_arrays: IndexMap<ArrRef, usize>,
    map_corrs: IndexMap<CorrRef, usize>,
    /// Source table -> channel mask over *original* rows, present when
    /// the output wavelength table was row-filtered.
    mask_wavelengths: IndexMap<WlRef, Option<RowMask>>,
}

impl<'a> MergeContext<'a> {
    fn new(collection: &'a OiFitsCollection, result: &'a SelectorResult) -> MergeContext<'a> {
        MergeContext {
            collection,
            result,
            used_primary_hdus: IndexSet::new(),
            used_targets: IndexSet::new(),
            used_wavelengths: IndexSet::new(),
            used_arrays: IndexSet::new(),
            used_corrs: IndexSet::new(),
            map_target_ids: IndexMap::new(),
            map_wavelengths: IndexMap::new(),
            map_arrays: IndexMap::new(),
            map_corrs: IndexMap::new(),
            mask_wavelengths: IndexMap::new(),
        }
    }
}

/// Decide the output standard and allocate the empty output dataset.
///
/// An explicit standard wins; otherwise the highest version among the
/// selected datasets, defaulting to OIFITS1 when there is no selection.
fn create_output(
    collection: &OiFitsCollection,
    result: Option<&SelectorResult>,
    std: Option<OiFitsStandard>,
) -> OiFitsFile {
    let version = std.unwrap_or_else(|| {
        let mut version = None;
        if let Some(result) = result {
            for &fi in &result.sorted_files {
                let file_version = collection.files()[fi].version;
                if version.map_or(true, |v| file_version > v) {
                    version = Some(file_version);
                    if file_version == OiFitsStandard::Version2 {
                        // max(version) reached
                        break;
                    }
                }
            }
        }
        version.unwrap_or(OiFitsStandard::Version1)
    });

    info!("using {version}");

    OiFitsFile::new(version)
}

/// Collect the primary HDUs and metadata tables the selected
/// measurement tables reference. Insertion order is the processing
/// order of every later phase.
fn collect_tables(ctx: &mut MergeContext) {
    for &r in ctx.result.sorted_datas.iter() {
        let file = &ctx.collection.files()[r.file];
        if file.primary.is_some() {
            ctx.used_primary_hdus.insert(r.file);
        }
        if file.target.is_some() {
            ctx.used_targets.insert(r.file);
        }
        if let Some(wl_ref) = ctx.collection.wavelength_of(r) {
            ctx.used_wavelengths.insert(wl_ref);
        }
        if let Some(arr_ref) = ctx.collection.array_of(r) {
            ctx.used_arrays.insert(arr_ref);
        }
        if let Some(corr_ref) = ctx.collection.corr_of(r) {
            ctx.used_corrs.insert(corr_ref);
        }
    }
}

fn process_primary_hdu(ctx: &MergeContext, output: &mut OiFitsFile) {
    let used: Vec<&PrimaryHdu> = ctx
        .used_primary_hdus
        .iter()
        .filter_map(|&fi| ctx.collection.files()[fi].primary.as_ref())
        .collect();
    output.primary = Some(build_primary(output.version, &used));
}

/// Build the output primary HDU from the used source HDUs.
///
/// OIFITS1 gets a bare HDU with a `DATE` card. OIFITS2 adopts a single
/// source HDU as-is, or synthesises the mandatory keywords from several;
/// either way `CONTENT` and `DATE` are then (re)written. Every output
/// gets the history line.
fn build_primary(version: OiFitsStandard, used: &[&PrimaryHdu]) -> PrimaryHdu {
    let mut primary = if version == OiFitsStandard::Version2 {
        let mut primary = match used {
            [single] => (*single).clone(),
            _ => synthesise_primary(used),
        };
        primary.set_keyword(KEYWORD_CONTENT, CONTENT_OIFITS2);
        primary.set_keyword(KEYWORD_DATE, fits_date_now());
        primary
    } else {
        let mut primary = PrimaryHdu::new();
        primary.add_header_card(KEYWORD_DATE, fits_date_now(), "Date the HDU was written");
        primary
    };

    primary.add_history(HISTORY_LINE);
    primary
}

/// Synthesise the mandatory keywords from several source HDUs: a
/// keyword nobody supplies stays undefined, a unanimous value is kept,
/// a conflicting one degrades to the multi-value sentinel. Optional
/// keywords and header cards are not propagated.
fn synthesise_primary(used: &[&PrimaryHdu]) -> PrimaryHdu {
    let mut key_values: HashMap<&str, IndexSet<String>> = HashMap::with_capacity(32);
    for hdu in used {
        for desc in PRIMARY_KEYWORDS.iter().filter(|d| !d.optional) {
            if let Some(value) = hdu.keyword(desc.name) {
                debug!("get {} = {}", desc.name, value);
                key_values
                    .entry(desc.name)
                    .or_default()
                    .insert(value.to_string());
            }
        }
    }

    let mut primary = PrimaryHdu::new();
    for desc in PRIMARY_KEYWORDS.iter().filter(|d| !d.optional) {
        let value = match key_values.get(desc.name) {
            None => UNDEFINED.to_string(),
            Some(values) if values.len() == 1 => values[0].clone(),
            Some(_) => VALUE_MULTI.to_string(),
        };
        debug!("set {} = {}", desc.name, value);
        primary.set_keyword(desc.name, value);
    }
    primary
}

/// Build the output `OI_TARGET` over the distinct selected targets,
/// numbered contiguously from 1, and derive the per-source id maps.
///
/// Source ids pointing at unselected targets are deliberately left out
/// of the maps; a failed lookup later marks the row for pruning.
fn process_targets(ctx: &mut MergeContext, output: &mut OiFitsFile) {
    let tm = ctx.collection.target_manager();
    let g_targets = &ctx.result.distinct_targets;

    let mut new_target_ids: HashMap<TargetUid, i16> = HashMap::with_capacity(g_targets.len());
    let mut new_table = OiTarget::new();
    for (i, &uid) in g_targets.iter().enumerate() {
        let target_id = (i + 1) as i16;
        new_table.push(target_id, tm.get(uid).clone());
        new_target_ids.insert(uid, target_id);
    }
    output.target = Some(new_table);

    for &fi in &ctx.used_targets {
        let Some(table) = ctx.collection.files()[fi].target.as_ref() else {
            continue;
        };
        let mut map_ids = HashMap::with_capacity(4);
        for &uid in g_targets {
            if let Some(&new_id) = new_target_ids.get(&uid) {
                for id in table.target_ids(tm, uid) {
                    map_ids.insert(id, new_id);
                }
            }
        }
        ctx.map_target_ids.insert(fi, map_ids);
    }

    debug!("new target ids: {new_target_ids:?}");
}

/// Copy the used `OI_WAVELENGTH` tables into the output, renaming on
/// collision (or reusing a strictly-equal table already present), and
/// row-filter them against the selected wavelength ranges.
fn process_wavelengths(ctx: &mut MergeContext, output: &mut OiFitsFile) {
    if ctx.used_wavelengths.is_empty() {
        return;
    }

    let g_wl_ranges: Option<&[Range]> = ctx
        .result
        .selector
        .as_ref()
        .filter(|s| s.has_wavelength_ranges())
        .map(|s| s.wavelength_ranges.as_slice());

    for &wl_ref in &ctx.used_wavelengths {
        let table = ctx.collection.wavelength(wl_ref);
        let name = table.ins_name.clone();

        let mut new_name = name.clone();
        let mut idx = 0;
        let mut reuse = None;
        loop {
            match output.wavelength_index(&new_name) {
                None => break,
                Some(prev) if table.content_eq(&output.wavelengths[prev]) => {
                    info!("same tables: {name} vs {new_name}");
                    reuse = Some(prev);
                    break;
                }
                Some(_) => {
                    idx += 1;
                    new_name = format!("{name}_{idx}");
                }
            }
        }

        let mut mask_rows: Option<RowMask> = None;
        let out_index = if let Some(prev) = reuse {
            prev
        } else {
            let mut copy = table.clone();
            copy.ins_name = new_name.clone();

            let mut check_wl_ranges = false;
            let mut wl_matchings = Vec::new();
            if let Some(g_ranges) = g_wl_ranges {
                if let Some(coverage) = table.wavelength_range() {
                    debug!("wavelength range: {coverage}");
                    wl_matchings = range::matching_selected(g_ranges, coverage);
                    if wl_matchings.is_empty() {
                        // no mapping entry: referring tables will drop
                        debug!("skip {name}, no matching wavelength range");
                        continue;
                    }
                    check_wl_ranges = !range::fully_covers(&wl_matchings, coverage);
                }
            }

            let mut filter_rows = false;
            if check_wl_ranges {
                let nb_rows = copy.nb_rows();
                let mut mask = RowMask::new(nb_rows);
                for (i, &w) in copy.eff_wave.iter().enumerate() {
                    if range::any_contains(&wl_matchings, f64::from(w)) {
                        mask.set(i);
                    } else {
                        filter_rows = true;
                    }
                }
                if filter_rows {
                    if mask.cardinality() == 0 {
                        debug!("skip {name}, no remaining row");
                        continue;
                    }
                    copy.resize(&mask);
                    // The retained mask indexes *original* rows; it
                    // drives the channel pruning of referring tables.
                    mask_rows = Some(mask);
                }
            }

            output.wavelengths.push(copy);
            if filter_rows {
                warn!("table [{new_name}] filtered from [{name}]");
            }
            output.wavelengths.len() - 1
        };

        ctx.map_wavelengths.insert(wl_ref, out_index);
        ctx.mask_wavelengths.insert(wl_ref, mask_rows);
    }

    info!("insNames: {:?}", output.ins_names());
}

/// Copy the used `OI_ARRAY` tables into the output, renaming on
/// collision or reusing a strictly-equal table already present.
fn process_arrays(ctx: &mut MergeContext, output: &mut OiFitsFile) {
    if ctx.used_arrays.is_empty() {
        return;
    }

    for &arr_ref in &ctx.used_arrays {
        let table = ctx.collection.array(arr_ref);
        let name = table.arr_name.clone();

        let mut new_name = name.clone();
        let mut idx = 0;
        let mut reuse = None;
        loop {
            match output.array_index(&new_name) {
                None => break,
                Some(prev) if table.content_eq(&output.arrays[prev]) => {
                    info!("same tables: {name} vs {new_name}");
                    reuse = Some(prev);
                    break;
                }
                Some(_) => {
                    idx += 1;
                    new_name = format!("{name}_{idx}");
                }
            }
        }

        let out_index = if let Some(prev) = reuse {
            prev
        } else {
            let mut copy = table.clone();
            copy.arr_name = new_name;
            output.arrays.push(copy);
            output.arrays.len() - 1
        };

        ctx.map_arrays.insert(arr_ref, out_index);
    }

    info!("arrNames: {:?}", output.arr_names());
}

/// Copy the used `OI_CORR` tables into the output. Collisions only get
/// a suffix; correlation tables are never deduplicated.
fn process_corrs(ctx: &mut MergeContext, output: &mut OiFitsFile) {
    if ctx.used_corrs.is_empty() {
        return;
    }

    for &corr_ref in &ctx.used_corrs {
        let table = ctx.collection.corr(corr_ref);
        let name = table.corr_name.clone();

        let mut new_name = name.clone();
        let mut idx = 0;
        while output.corr_index(&new_name).is_some() {
            idx += 1;
            new_name = format!("{name}_{idx}");
        }

        let mut copy = table.clone();
        copy.corr_name = new_name;
        output.corrs.push(copy);
        ctx.map_corrs.insert(corr_ref, output.corrs.len() - 1);
    }

    info!("corrNames: {:?}", output.corr_names());
}

/// Copy each selected measurement table into the output: rewrite its
/// `INSNAME`/`ARRNAME`/`CORRNAME` to the mapped tables, remap its
/// target ids, and prune rows along the active axes.
fn process_data(ctx: &mut MergeContext, output: &mut OiFitsFile) {
    let MergeContext {
        collection,
        result,
        map_target_ids,
        map_wavelengths,
        map_arrays,
        map_corrs,
        mask_wavelengths,
        ..
    } = ctx;
    let collection: &OiFitsCollection = *collection;
    let result: &SelectorResult = *result;

    info!("merging {} data tables", result.sorted_datas.len());

    let night_matcher = NightIdMatcher::new(&result.distinct_nights);
    let selector = result.selector.as_ref();
    let g_mjd_ranges: Option<&[Range]> = selector
        .filter(|s| s.has_mjd_ranges())
        .map(|s| s.mjd_ranges.as_slice());
    let g_baselines: Option<&[String]> = selector
        .filter(|s| s.has_baselines())
        .map(|s| s.baselines.as_slice());

    for &data_ref in result.sorted_datas.iter() {
        let oi_data = collection.data(data_ref);
        let file = &collection.files()[data_ref.file];

        // INSNAME: an unresolved wavelength reference cannot be
        // represented in the output; drop the whole table.
        let wl_ref = collection.wavelength_of(data_ref);
        let Some(&out_wl) = wl_ref.and_then(|r| map_wavelengths.get(&r)) else {
            warn!(
                "invalid INSNAME [{}], dropping {}",
                oi_data.ins_name, oi_data.kind
            );
            continue;
        };
        let new_ins_name = output.wavelengths[out_wl].ins_name.clone();
        let wl_mask: Option<&RowMask> = wl_ref
            .and_then(|r| mask_wavelengths.get(&r))
            .and_then(|mask| mask.as_ref());
        let check_wavelengths = wl_mask.is_some();

        // ARRNAME: an unresolved array reference degrades to UNDEFINED.
        let new_arr_name = match collection.array_of(data_ref).and_then(|r| map_arrays.get(&r)) {
            Some(&i) => output.arrays[i].arr_name.clone(),
            None => {
                warn!(
                    "invalid ARRNAME [{}], using [{}] instead",
                    oi_data.arr_name, UNDEFINED
                );
                UNDEFINED.to_string()
            }
        };

        // Optional CORRNAME: an unresolved reference is cleared.
        let new_corr_name = match &oi_data.corr_name {
            None => None,
            Some(corr_name) => {
                match collection.corr_of(data_ref).and_then(|r| map_corrs.get(&r)) {
                    Some(&i) => Some(output.corrs[i].corr_name.clone()),
                    None => {
                        warn!("invalid CORRNAME [{corr_name}]");
                        None
                    }
                }
            }
        };

        let Some(map_ids) = map_target_ids.get_mut(&data_ref.file) else {
            warn!("no OI_TARGET for {}, dropping it", oi_data.kind);
            continue;
        };

        // Decide whether target ids need per-row rewriting; ids of
        // dropped targets get a sentinel entry so the row loop prunes
        // them.
        let mut check_target_id = false;
        for id in oi_data.distinct_target_ids() {
            match map_ids.get(&id) {
                None => {
                    check_target_id = true;
                    map_ids.insert(id, UNDEFINED_I16);
                    info!("filter target id {id}");
                }
                Some(&new_id) => {
                    if new_id != id {
                        check_target_id = true;
                    }
                }
            }
        }
        debug!("check target ids: {check_target_id}");

        let mut check_night_id = false;
        if !oi_data.has_single_night() && !night_matcher.match_all(oi_data.distinct_night_ids()) {
            check_night_id = true;
        }

        // Baselines: no matching baseline at all means the table has
        // nothing to contribute.
        let mut check_baselines = false;
        let mut sta_matchings = Vec::new();
        if let Some(baselines) = g_baselines {
            let array = file.array(&oi_data.arr_name);
            sta_matchings = oi_data.matching_sta_indexes(array, baselines);
            if sta_matchings.is_empty() {
                debug!("skip {}, no matching baseline", oi_data.kind);
                continue;
            }
            if oi_data.distinct_sta_indexes().len() > sta_matchings.len() {
                check_baselines = true;
            }
        }

        // MJD ranges: same table-level short-circuit.
        let mut check_mjd_ranges = false;
        let mut mjd_matchings = Vec::new();
        if let Some(g_ranges) = g_mjd_ranges {
            let data_ranges = oi_data.distinct_mjd_ranges();
            debug!("distinct MJD ranges: {data_ranges:?}");
            mjd_matchings = range::matching_selected_all(g_ranges, &data_ranges);
            if mjd_matchings.is_empty() {
                debug!("skip {}, no matching MJD range", oi_data.kind);
                continue;
            }
            check_mjd_ranges = !range::fully_covers_all(&mjd_matchings, &data_ranges);
        }

        let mut copy = oi_data.clone();
        copy.ins_name = new_ins_name;
        copy.arr_name = new_arr_name;
        copy.corr_name = new_corr_name;

        let mut filter_rows = false;
        if check_target_id
            || check_night_id
            || check_mjd_ranges
            || check_baselines
            || check_wavelengths
        {
            let nb_rows = copy.nb_rows();
            let mut mask = RowMask::new(nb_rows);
            let mut new_target_ids = vec![0_i16; nb_rows];

            for i in 0..nb_rows {
                // Fixed check order: target, night, MJD, baseline. The
                // target id is rewritten even for rows a later check
                // rejects.
                new_target_ids[i] = if check_target_id {
                    map_ids
                        .get(&copy.target_id[i])
                        .copied()
                        .unwrap_or(UNDEFINED_I16)
                } else {
                    copy.target_id[i]
                };
                let mut skip = new_target_ids[i] == UNDEFINED_I16;

                if check_night_id && !skip && !night_matcher.matches(copy.night_id[i]) {
                    skip = true;
                }
                if check_mjd_ranges && !skip && !range::any_contains(&mjd_matchings, copy.mjd[i]) {
                    skip = true;
                }
                if check_baselines && !skip && !sta_matchings.contains(&copy.sta_index[i]) {
                    skip = true;
                }

                if skip {
                    filter_rows = true;
                } else {
                    mask.set(i);
                }
            }

            // The id column is rewritten before any resize so the row
            // mask and the column stay aligned.
            copy.target_id = new_target_ids;

            if filter_rows || check_wavelengths {
                if mask.cardinality() == 0 {
                    // nothing left
                    continue;
                }
                copy.resize(&mask, wl_mask);
            }
        }

        let kind = copy.kind;
        output.data.push(copy);
        if filter_rows {
            warn!("table [{kind}] filtered from [{}]", oi_data.kind);
        }
    }
}
