// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all oimerge-related errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OimergeError {
    #[error("{0}")]
    Merge(#[from] crate::merge::MergeError),

    #[error("{0}")]
    Model(#[from] crate::model::ModelError),
}
