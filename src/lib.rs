// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Merging and filtering of optical interferometry OIFITS datasets.

OIFITS is a profile of the FITS binary-table container used to exchange
optical interferometry data. This crate provides an in-memory model of an
OIFITS dataset (primary HDU, `OI_TARGET`, `OI_WAVELENGTH`, `OI_ARRAY`,
`OI_CORR` and measurement tables), a selection front-end over a collection
of datasets, and a deterministic merger that consolidates a collection
into one self-consistent dataset, renaming colliding metadata tables,
renumbering target ids and pruning rows along the selected axes.

Reading and writing FITS bytes is deliberately not handled here; the model
is the exchange format.
 */

pub mod constants;
pub mod mask;
pub mod merge;
pub mod model;
pub mod range;
pub mod selector;

mod error;

pub use error::OimergeError;
