//! Quote data structure and category filter

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::StoreError;
use crate::Result;

/// Sentinel category value meaning "no filter".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    /// Unique within a store snapshot
    pub id: u64,
    /// Display text, never empty
    pub text: String,
    /// Classification label, never empty
    pub category: String,
}

impl Quote {
    /// Build a quote from user input. Both fields are trimmed and must be non-empty.
    pub fn new(id: u64, text: &str, category: &str) -> Result<Self> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() {
            return Err(StoreError::InvalidInput("quote text cannot be empty".into()));
        }
        if category.is_empty() {
            return Err(StoreError::InvalidInput(
                "quote category cannot be empty".into(),
            ));
        }

        Ok(Self {
            id,
            text: text.to_string(),
            category: category.to_string(),
        })
    }

    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty() && !self.category.trim().is_empty()
    }

    pub fn matches(&self, filter: &CategoryFilter) -> bool {
        match filter {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => &self.category == category,
        }
    }
}

/// Outcome of checking one raw JSON entry against the quote invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawEntry {
    /// Valid, with a usable id
    WithId(Quote),
    /// Valid fields, no id present
    WithoutId { text: String, category: String },
    Invalid,
}

impl RawEntry {
    pub(crate) fn parse(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return RawEntry::Invalid;
        };

        let field = |name: &str| {
            obj.get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let (Some(text), Some(category)) = (field("text"), field("category")) else {
            return RawEntry::Invalid;
        };

        match obj.get("id") {
            None | Some(Value::Null) => RawEntry::WithoutId { text, category },
            Some(id) => match id.as_u64() {
                Some(id) => RawEntry::WithId(Quote { id, text, category }),
                None => RawEntry::Invalid,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// `None`, blank and the `"all"` sentinel all mean no filter.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(ALL_CATEGORIES) => CategoryFilter::All,
            Some(category) => CategoryFilter::Only(category.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(category) => category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in quotes used when storage holds nothing usable.
pub fn default_quotes() -> Vec<Quote> {
    vec![
        Quote {
            id: 1,
            text: "The best way to get started is to quit talking and begin doing.".into(),
            category: "Motivation".into(),
        },
        Quote {
            id: 2,
            text: "Life is what happens when you're busy making other plans.".into(),
            category: "Life".into(),
        },
        Quote {
            id: 3,
            text: "Do one thing every day that scares you.".into(),
            category: "Courage".into(),
        },
    ]
}
