// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Model-wide constants and sentinels.

/// String value standing in for a missing or unknown keyword value.
pub const UNDEFINED: &str = "UNDEFINED";

/// Keyword value written when merged inputs disagree on a mandatory
/// keyword.
pub const VALUE_MULTI: &str = "MULTIPLE";

/// Sentinel marking a filtered-out row in a 16-bit id column.
pub const UNDEFINED_I16: i16 = i16::MIN;

/// `CONTENT` keyword value identifying an OIFITS2 primary HDU.
pub const CONTENT_OIFITS2: &str = "OIFITS2";

/// The `DATE` primary-header keyword.
pub const KEYWORD_DATE: &str = "DATE";

/// The `CONTENT` primary-header keyword.
pub const KEYWORD_CONTENT: &str = "CONTENT";

/// History line appended to the primary HDU of every merged dataset.
pub const HISTORY_LINE: &str = "Written by JMMC OITools";
