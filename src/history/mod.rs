//! Commit history model and the single-pass traversal engine.
//!
//! The walker visits every commit reachable from a starting reference
//! exactly once, newest first, and feeds each commit (plus its spec-file
//! snapshot) to a set of [visitor::Visitor]s that accumulate independent
//! derived facts in one pass.

pub mod visitor;
pub mod walker;

use std::borrow::Cow;

/// Trailer key that pins the release number of a commit to a fixed value.
pub const RELEASE_RESET_TRAILER: &str = "Release-Reset";

/// Immutable facts about one commit, as seen by visitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Full 40-hex commit digest.
    pub hash: String,
    /// Parent digests in commit order; empty for a root, two or more for
    /// a merge.
    pub parents: Vec<String>,
    /// Authored time in seconds since the epoch.
    pub seconds: i64,
    /// Author timezone offset in minutes east of UTC.
    pub offset_minutes: i32,
    /// `Name <email>` of the commit author.
    pub author: String,
    /// Raw bytes of the first message line; not guaranteed UTF-8.
    pub summary: Vec<u8>,
    /// Key/value annotations from the message's trailer block.
    pub trailers: Vec<(String, String)>,
}

impl HistoryEntry {
    /// The summary line with invalid UTF-8 replaced.
    pub fn summary_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.summary)
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Look up a trailer value by key, case-insensitively.
    pub fn trailer(&self, key: &str) -> Option<&str> {
        self.trailers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// The release-reset directive carried by this commit, if any.
    ///
    /// A trailer with a non-numeric value is ignored; absence is the
    /// normal case, not an error.
    pub fn release_reset(&self) -> Option<u64> {
        self.trailer(RELEASE_RESET_TRAILER)
            .and_then(|value| value.trim().parse().ok())
    }
}

/// Extract the trailer block of a commit message as key/value pairs.
///
/// Messages without a trailer block yield an empty list.
pub fn extract_trailers(message: &str) -> Vec<(String, String)> {
    match git2::message_trailers_strs(message) {
        Ok(trailers) => trailers
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with_trailers(trailers: Vec<(String, String)>) -> HistoryEntry {
        HistoryEntry {
            hash: "0".repeat(40),
            parents: vec![],
            seconds: 0,
            offset_minutes: 0,
            author: "Jane Doe <jane@example.com>".to_string(),
            summary: b"initial".to_vec(),
            trailers,
        }
    }

    #[test]
    fn test_trailer_lookup_is_case_insensitive() {
        let entry =
            entry_with_trailers(vec![("release-reset".to_string(), "7".to_string())]);
        assert_eq!(entry.trailer("Release-Reset"), Some("7"));
        assert_eq!(entry.release_reset(), Some(7));
    }

    #[test]
    fn test_non_numeric_reset_is_ignored() {
        let entry =
            entry_with_trailers(vec![("Release-Reset".to_string(), "soon".to_string())]);
        assert_eq!(entry.release_reset(), None);
    }

    #[test]
    fn test_extract_trailers_from_message() {
        let trailers =
            extract_trailers("rebuild for new toolchain\n\nRelease-Reset: 100\n");
        assert_eq!(
            trailers,
            vec![("Release-Reset".to_string(), "100".to_string())]
        );
    }

    #[test]
    fn test_message_without_trailers_is_empty() {
        assert!(extract_trailers("just a summary line\n").is_empty());
    }

    #[test]
    fn test_merge_detection() {
        let mut entry = entry_with_trailers(vec![]);
        assert!(!entry.is_merge());
        entry.parents = vec!["a".repeat(40), "b".repeat(40)];
        assert!(entry.is_merge());
    }

    #[test]
    fn test_summary_lossy_replaces_invalid_bytes() {
        let mut entry = entry_with_trailers(vec![]);
        entry.summary = vec![b'f', b'o', b'o', 0xff];
        assert_eq!(entry.summary_lossy(), "foo\u{fffd}");
    }
}
