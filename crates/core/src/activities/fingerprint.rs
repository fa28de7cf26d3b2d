//! Source-id markers embedded in destination comments.
//!
//! The comment marker is the only state that survives between runs: every
//! imported transaction carries `source_id=<id>` and the next run rebuilds
//! its view of what is already imported by parsing it back out.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::activities_model::DestinationActivity;

/// Marker prefix. Changing it orphans every previously imported record.
pub const SOURCE_ID_MARKER: &str = "source_id=";

lazy_static! {
    static ref SOURCE_ID_RE: Regex =
        Regex::new(r"(?:^|\s)source_id=(\S+)").expect("source id regex is valid");
}

/// Comment for a transaction derived from `source_id`.
pub fn marker_comment(source_id: &str, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{}{} - {}", SOURCE_ID_MARKER, source_id, label),
        None => format!("{}{}", SOURCE_ID_MARKER, source_id),
    }
}

/// Extracts the embedded source id, if the comment carries a marker.
pub fn extract_source_id(comment: &str) -> Option<&str> {
    SOURCE_ID_RE
        .captures(comment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Set of source ids already present in the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintIndex(HashSet<String>);

impl FingerprintIndex {
    pub fn contains(&self, source_id: &str) -> bool {
        self.0.contains(source_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FingerprintIndex {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Builds the index from the destination's existing records.
///
/// Records without a marker (manual or foreign entries) contribute nothing.
pub fn build_index(activities: &[DestinationActivity]) -> FingerprintIndex {
    activities
        .iter()
        .filter_map(|a| a.comment.as_deref())
        .filter_map(extract_source_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_comment(id: &str, comment: Option<&str>) -> DestinationActivity {
        DestinationActivity {
            id: id.to_string(),
            comment: comment.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_marker_round_trips() {
        for id in ["20240102000000000::8e3c1c4b", "abc", "a-b_c.d:e"] {
            let plain = marker_comment(id, None);
            let labelled = marker_comment(id, Some("Interest"));
            assert_eq!(extract_source_id(&plain), Some(id));
            assert_eq!(extract_source_id(&labelled), Some(id));
        }
    }

    #[test]
    fn test_labelled_marker_format() {
        assert_eq!(marker_comment("42", Some("Fee")), "source_id=42 - Fee");
        assert_eq!(marker_comment("42", None), "source_id=42");
    }

    #[test]
    fn test_marker_must_start_a_word() {
        assert_eq!(extract_source_id("note source_id=7 ok"), Some("7"));
        assert_eq!(extract_source_id("old_source_id=7"), None);
        assert_eq!(extract_source_id("source_id="), None);
        assert_eq!(extract_source_id("bought manually"), None);
    }

    #[test]
    fn test_build_index_ignores_foreign_records() {
        let activities = vec![
            with_comment("d1", Some("source_id=A1")),
            with_comment("d2", Some("source_id=A2 - Interest")),
            with_comment("d3", Some("manual entry")),
            with_comment("d4", None),
        ];
        let index = build_index(&activities);

        assert_eq!(index.len(), 2);
        assert!(index.contains("A1"));
        assert!(index.contains("A2"));
        assert!(!index.contains("d3"));
    }

    #[test]
    fn test_index_is_exact_match() {
        let index = build_index(&[with_comment("d1", Some("source_id=A10"))]);
        assert!(index.contains("A10"));
        assert!(!index.contains("A1"));
        assert!(!index.contains("a10"));
    }
}
