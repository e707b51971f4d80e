// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The primary header-data unit and its keyword schema.

use hifitime::Epoch;
use indexmap::IndexMap;

use crate::constants::UNDEFINED;

/// Descriptor of a primary-header keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordDesc {
    pub name: &'static str,
    pub optional: bool,
}

/// The OIFITS2 primary-header keyword schema.
pub const PRIMARY_KEYWORDS: &[KeywordDesc] = &[
    KeywordDesc {
        name: "ORIGIN",
        optional: false,
    },
    KeywordDesc {
        name: "DATE",
        optional: false,
    },
    KeywordDesc {
        name: "DATE-OBS",
        optional: false,
    },
    KeywordDesc {
        name: "CONTENT",
        optional: false,
    },
    KeywordDesc {
        name: "TELESCOP",
        optional: false,
    },
    KeywordDesc {
        name: "INSTRUME",
        optional: false,
    },
    KeywordDesc {
        name: "OBSERVER",
        optional: false,
    },
    KeywordDesc {
        name: "OBJECT",
        optional: false,
    },
    KeywordDesc {
        name: "INSMODE",
        optional: false,
    },
    KeywordDesc {
        name: "REFERENC",
        optional: true,
    },
    KeywordDesc {
        name: "PROG_ID",
        optional: true,
    },
    KeywordDesc {
        name: "PROCSOFT",
        optional: true,
    },
    KeywordDesc {
        name: "OBSTECH",
        optional: true,
    },
];

/// A free-form header card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCard {
    pub keyword: String,
    pub value: String,
    pub comment: String,
}

/// A primary HDU.
///
/// One struct serves both standard revisions: an OIFITS1 primary HDU
/// only carries header cards and history, an OIFITS2 one also fills the
/// keyword dictionary. Keywords iterate in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryHdu {
    keywords: IndexMap<String, String>,
    header_cards: Vec<HeaderCard>,
    history: Vec<String>,
}

impl PrimaryHdu {
    pub fn new() -> PrimaryHdu {
        PrimaryHdu::default()
    }

    pub fn keyword(&self, name: &str) -> Option<&str> {
        self.keywords.get(name).map(String::as_str)
    }

    pub fn set_keyword(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.keywords.insert(name.into(), value.into());
    }

    pub fn keywords(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keywords
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn add_header_card(
        &mut self,
        keyword: impl Into<String>,
        value: impl Into<String>,
        comment: impl Into<String>,
    ) {
        self.header_cards.push(HeaderCard {
            keyword: keyword.into(),
            value: value.into(),
            comment: comment.into(),
        });
    }

    pub fn header_cards(&self) -> &[HeaderCard] {
        &self.header_cards
    }

    pub fn add_history(&mut self, line: impl Into<String>) {
        self.history.push(line.into());
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

/// The current time as a FITS `DATE` string (`YYYY-MM-DDThh:mm:ss`).
///
/// Falls back to the undefined sentinel when the system clock is not
/// available.
pub fn fits_date_now() -> String {
    match Epoch::now() {
        Ok(now) => {
            let (y, month, day, h, min, s, _) = now.to_gregorian_utc();
            format!("{y:04}-{month:02}-{day:02}T{h:02}:{min:02}:{s:02}")
        }
        Err(_) => UNDEFINED.to_string(),
    }
}
