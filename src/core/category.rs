use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

use crate::error::{Error, Result};

/// Display data for one entry of the category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub name: &'static str,
    pub icon: &'static str,
}

/// The fixed category table. Category indices are 1-based into this list.
pub static CATEGORIES: [CategoryInfo; 9] = [
    CategoryInfo { name: "home", icon: "⌂" },
    CategoryInfo { name: "work", icon: "▣" },
    CategoryInfo { name: "shopping", icon: "◍" },
    CategoryInfo { name: "health", icon: "✚" },
    CategoryInfo { name: "finance", icon: "$" },
    CategoryInfo { name: "family", icon: "♥" },
    CategoryInfo { name: "study", icon: "✎" },
    CategoryInfo { name: "travel", icon: "✈" },
    CategoryInfo { name: "other", icon: "•" },
];

/// A 1-based category index. Zero and negative indices cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Category(NonZeroU32);

impl Category {
    pub fn new(index: i64) -> Result<Self> {
        if index < 1 {
            return Err(Error::InvalidCategory(index));
        }
        u32::try_from(index)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(Error::CategoryOutOfRange(index))
    }

    pub fn index(self) -> u32 {
        self.0.get()
    }

    /// Look up the table entry. Indices past the end of the table are an error.
    pub fn info(self) -> Result<&'static CategoryInfo> {
        CATEGORIES
            .get(self.index() as usize - 1)
            .ok_or(Error::UnknownCategory(self.index()))
    }
}

impl Default for Category {
    fn default() -> Self {
        Self(NonZeroU32::MIN)
    }
}

impl TryFrom<i64> for Category {
    type Error = Error;

    fn try_from(index: i64) -> Result<Self> {
        Self::new(index)
    }
}

impl From<Category> for i64 {
    fn from(category: Category) -> Self {
        category.index() as i64
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
