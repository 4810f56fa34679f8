use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::Result;

/// Title given to categories no definition matches.
pub const OTHER_SECTION: &str = "Other";

#[derive(Debug, Deserialize)]
struct SectionDef {
    title: String,
    pattern: String,
}

/// Maps raw menu category names onto section titles.
///
/// Definitions are tried in order and the first matching pattern wins. With
/// no definitions at all, every category is its own section.
#[derive(Debug, Clone, Default)]
pub struct SectionClassifier {
    defs: Vec<(String, Regex)>,
}

impl SectionClassifier {
    /// Parse a `[{"title": ..., "pattern": ...}]` document.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<SectionDef> = serde_json::from_str(json)?;
        let defs = raw
            .into_iter()
            .map(|d| Regex::new(&d.pattern).map(|rx| (d.title, rx)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { defs })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn classify(&self, category: &str) -> String {
        if self.defs.is_empty() {
            return category.trim().to_string();
        }
        self.defs
            .iter()
            .find(|(_, rx)| rx.is_match(category))
            .map(|(title, _)| title.clone())
            .unwrap_or_else(|| OTHER_SECTION.to_string())
    }

    /// Section titles matched by at least one of `categories`, in definition
    /// order.
    pub fn sections_for<'a, I>(&self, categories: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let categories: Vec<&str> = categories.into_iter().collect();
        if self.defs.is_empty() {
            let mut names: Vec<String> = categories.iter().map(|c| c.trim().to_string()).collect();
            names.sort();
            names.dedup();
            return names;
        }
        self.defs
            .iter()
            .filter(|(_, rx)| categories.iter().any(|c| rx.is_match(c)))
            .map(|(title, _)| title.clone())
            .collect()
    }
}
