//! # filetype: extension-based eligibility filter
//!
//! Decides whether a file discovered during the walk should be uploaded.
//! Matching is a pure function of the filter state and the file name; the
//! filesystem is never consulted.

use std::collections::HashSet;

/// Default extension list used when none is configured.
pub const DEFAULT_TYPES: &str = "jpg,jpeg,png,gif";

/// Set of lowercase extensions (no leading dot) plus an "include all" override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTypeFilter {
    extensions: HashSet<String>,
    include_all: bool,
}

impl FileTypeFilter {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();
        Self {
            extensions,
            include_all: false,
        }
    }

    /// Builds a filter from a comma-delimited list such as `"jpg, .PNG,gif"`.
    pub fn from_comma_list(list: &str) -> Self {
        Self::new(parse_type_list(list))
    }

    pub fn with_include_all(mut self, include_all: bool) -> Self {
        self.include_all = include_all;
        self
    }

    pub fn include_all(&self) -> bool {
        self.include_all
    }

    pub fn extensions(&self) -> &HashSet<String> {
        &self.extensions
    }

    /// Returns true when `file_name` is eligible for upload.
    ///
    /// The extension is everything after the last `.`, compared case-insensitively.
    /// A name without a `.` has no extension and only matches under "include all".
    pub fn matches(&self, file_name: &str) -> bool {
        if self.include_all {
            return true;
        }
        match file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => self.extensions.contains(&ext.to_lowercase()),
            _ => false,
        }
    }
}

/// Splits a comma-delimited extension list into normalized entries.
pub fn parse_type_list(list: &str) -> Vec<String> {
    list.split(',').filter_map(normalize_extension).collect()
}

fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
