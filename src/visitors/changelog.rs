use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::history::visitor::{Visitor, VisitorResult};
use crate::history::HistoryEntry;
use crate::specfile::PackageMetadata;
use crate::visitors::release::{Observation, ReleaseCounter};

/// Result key of [ChangelogVisitor].
pub const CHANGELOG: &str = "changelog";

/// One changelog block covering all commits between two version changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    /// Hash of the commit that introduced this entry's epoch/version.
    pub boundary_commit: String,
    /// Everyone who authored a commit in the entry's range.
    pub authors: BTreeSet<String>,
    /// Summary lines folded from the range, newest first.
    pub entries: Vec<Vec<u8>>,
    /// Rendered text block; commit summaries are carried as raw bytes,
    /// so the block is bytes too.
    pub data: Vec<u8>,
}

/// Builds one changelog entry per release boundary.
///
/// Boundaries are re-derived from the metadata snapshots during the walk
/// rather than taken from the release-number visitor, so the two can be
/// registered in any combination.
#[derive(Debug, Default)]
pub struct ChangelogVisitor {
    current: Option<SegmentBuilder>,
    completed: Vec<ChangelogEntry>,
}

impl ChangelogVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Visitor for ChangelogVisitor {
    fn name(&self) -> &'static str {
        CHANGELOG
    }

    fn observe(&mut self, entry: &HistoryEntry, metadata: Option<&PackageMetadata>) {
        let declared = metadata.map(|metadata| metadata.epoch_version());

        if let Some(segment) = self.current.as_mut() {
            match segment
                .counter
                .observe(declared.as_ref(), entry.release_reset())
            {
                Observation::Counted => {
                    segment.absorb(entry);
                    return;
                }
                Observation::Boundary => {
                    if let Some(done) = self.current.take() {
                        self.completed.push(done.close());
                    }
                }
            }
        }

        let mut segment = SegmentBuilder::new(entry);
        segment
            .counter
            .observe(declared.as_ref(), entry.release_reset());
        segment.absorb(entry);
        self.current = Some(segment);
    }

    fn finished(&self) -> bool {
        // The changelog covers the whole reachable history.
        false
    }

    fn finish(self: Box<Self>) -> VisitorResult {
        let mut entries = self.completed;
        if let Some(segment) = self.current {
            entries.push(segment.close());
        }
        VisitorResult::Changelog(dedup_entries(entries))
    }
}

/// Accumulates the commits of one release segment, newest first.
#[derive(Debug)]
struct SegmentBuilder {
    counter: ReleaseCounter,
    date: String,
    header_author: String,
    authors: BTreeSet<String>,
    summaries: Vec<Vec<u8>>,
    last_hash: String,
}

impl SegmentBuilder {
    fn new(entry: &HistoryEntry) -> Self {
        SegmentBuilder {
            counter: ReleaseCounter::new(),
            date: format_entry_date(entry.seconds, entry.offset_minutes),
            header_author: entry.author.clone(),
            authors: BTreeSet::new(),
            summaries: Vec::new(),
            last_hash: entry.hash.clone(),
        }
    }

    fn absorb(&mut self, entry: &HistoryEntry) {
        self.authors.insert(entry.author.clone());
        self.summaries.push(entry.summary.clone());
        self.last_hash = entry.hash.clone();
    }

    fn close(self) -> ChangelogEntry {
        let header = match self.counter.reference() {
            Some(epoch_version) => format!(
                "* {} {} - {}-{}",
                self.date,
                self.header_author,
                epoch_version,
                self.counter.release()
            ),
            // No commit in the segment declared a version; the entry
            // still carries the folded summaries.
            None => format!("* {} {}", self.date, self.header_author),
        };

        let mut data = header.into_bytes();
        for summary in &self.summaries {
            data.extend_from_slice(b"\n- ");
            data.extend_from_slice(summary);
        }

        ChangelogEntry {
            boundary_commit: self.last_hash,
            authors: self.authors,
            entries: self.summaries,
            data,
        }
    }
}

/// Drop entries whose rendered block repeats the chronologically earlier
/// neighbour; the earlier entry survives. Idempotent under repetition.
fn dedup_entries(entries: Vec<ChangelogEntry>) -> Vec<ChangelogEntry> {
    let mut deduped = Vec::with_capacity(entries.len());
    let mut iter = entries.into_iter().peekable();
    while let Some(entry) = iter.next() {
        match iter.peek() {
            Some(older) if older.data == entry.data => {}
            _ => deduped.push(entry),
        }
    }
    deduped
}

/// `Dow Mon DD YYYY` in the author's timezone, with English
/// abbreviations regardless of locale.
fn format_entry_date(seconds: i64, offset_minutes: i32) -> String {
    let utc = DateTime::from_timestamp(seconds, 0).unwrap_or(DateTime::UNIX_EPOCH);
    let offset = offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    utc.with_timezone(&offset).format("%a %b %d %Y").to_string()
}
