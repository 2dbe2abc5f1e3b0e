use crate::history::visitor::{Visitor, VisitorResult};
use crate::history::HistoryEntry;
use crate::specfile::{EpochVersion, PackageMetadata};

/// Result key of [ReleaseNumberVisitor].
pub const RELEASE_NUMBER: &str = "release-number";

/// Release number and effective epoch/version derived for the starting
/// commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// `None` when the spec at the starting commit was unparseable; the
    /// release value is then not authoritative.
    pub epoch_version: Option<EpochVersion>,
    /// Accumulated release number, rendered as a numeric string.
    pub release: String,
}

impl ReleaseInfo {
    /// `[epoch:]version-release`, or `None` while the epoch/version is
    /// unknown.
    pub fn evr(&self) -> Option<String> {
        self.epoch_version
            .as_ref()
            .map(|epoch_version| format!("{}-{}", epoch_version, self.release))
    }
}

/// What [ReleaseCounter::observe] concluded about one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Observation {
    /// The commit belongs to the current release segment.
    Counted,
    /// The commit declares a different epoch/version and opens the next
    /// segment; it was not counted.
    Boundary,
}

/// Counts commits within one release segment, fed newest first.
///
/// The reference epoch/version is established by the first commit with a
/// parseable snapshot; commits with an absent or unparseable snapshot
/// contribute to the count but never define the version. A release-reset
/// directive pins the segment's base and halts further counting.
#[derive(Debug, Default)]
pub(crate) struct ReleaseCounter {
    reference: Option<EpochVersion>,
    count: u64,
    base: Option<u64>,
    halted: bool,
}

impl ReleaseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(
        &mut self,
        declared: Option<&EpochVersion>,
        reset: Option<u64>,
    ) -> Observation {
        if let (Some(reference), Some(declared)) = (&self.reference, declared) {
            if declared != reference {
                return Observation::Boundary;
            }
        }
        if self.reference.is_none() {
            self.reference = declared.cloned();
        }
        if !self.halted {
            self.count += 1;
            if let Some(base) = reset {
                self.base = Some(base);
                self.halted = true;
            }
        }
        Observation::Counted
    }

    /// Release number of the newest commit in this segment.
    pub fn release(&self) -> u64 {
        match self.base {
            Some(base) => base + self.count.saturating_sub(1),
            None => self.count.max(1),
        }
    }

    /// Epoch/version the segment counts against, once established.
    pub fn reference(&self) -> Option<&EpochVersion> {
        self.reference.as_ref()
    }

    pub fn halted(&self) -> bool {
        self.halted
    }
}

/// Derives the release number for the starting commit by scanning
/// backward until the declared epoch/version last changed.
///
/// Finishes early: once the version-changing commit is found (or a
/// reset directive halts the count) the walker stops feeding it.
#[derive(Debug, Default)]
pub struct ReleaseNumberVisitor {
    counter: ReleaseCounter,
    head_epoch_version: Option<EpochVersion>,
    seen_head: bool,
    done: bool,
}

impl ReleaseNumberVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Visitor for ReleaseNumberVisitor {
    fn name(&self) -> &'static str {
        RELEASE_NUMBER
    }

    fn observe(&mut self, entry: &HistoryEntry, metadata: Option<&PackageMetadata>) {
        if self.done {
            return;
        }
        let declared = metadata.map(|metadata| metadata.epoch_version());
        if !self.seen_head {
            self.head_epoch_version = declared.clone();
            self.seen_head = true;
        }
        match self.counter.observe(declared.as_ref(), entry.release_reset()) {
            Observation::Boundary => self.done = true,
            Observation::Counted => {
                if self.counter.halted() {
                    self.done = true;
                }
            }
        }
    }

    fn finished(&self) -> bool {
        self.done
    }

    fn finish(self: Box<Self>) -> VisitorResult {
        VisitorResult::ReleaseNumber(ReleaseInfo {
            epoch_version: self.head_epoch_version,
            release: self.counter.release().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hash: &str, trailers: Vec<(String, String)>) -> HistoryEntry {
        HistoryEntry {
            hash: hash.repeat(40),
            parents: vec![],
            seconds: 1_600_000_000,
            offset_minutes: 0,
            author: "Jane Doe <jane@example.com>".to_string(),
            summary: b"a change".to_vec(),
            trailers,
        }
    }

    fn metadata(version: &str) -> PackageMetadata {
        PackageMetadata {
            name: "acme".to_string(),
            epoch: 0,
            version: version.to_string(),
            release_field: None,
            raw: String::new(),
        }
    }

    fn ev(version: &str) -> EpochVersion {
        EpochVersion {
            epoch: 0,
            version: version.to_string(),
        }
    }

    #[test]
    fn test_counter_linear_history() {
        let mut counter = ReleaseCounter::new();
        let current = ev("1.0");
        for _ in 0..3 {
            assert_eq!(counter.observe(Some(&current), None), Observation::Counted);
        }
        assert_eq!(counter.observe(Some(&ev("0.9")), None), Observation::Boundary);
        assert_eq!(counter.release(), 3);
    }

    #[test]
    fn test_counter_invalid_snapshots_contribute() {
        let mut counter = ReleaseCounter::new();
        let current = ev("1.0");
        counter.observe(Some(&current), None);
        counter.observe(None, None);
        counter.observe(Some(&current), None);
        assert_eq!(counter.release(), 3);
    }

    #[test]
    fn test_counter_reset_pins_base_and_halts() {
        let mut counter = ReleaseCounter::new();
        let current = ev("1.0");
        counter.observe(Some(&current), None);
        counter.observe(Some(&current), None);
        counter.observe(Some(&current), Some(100));
        assert!(counter.halted());
        assert_eq!(counter.release(), 102);
        // Older commits in the segment no longer move the number.
        counter.observe(Some(&current), None);
        assert_eq!(counter.release(), 102);
    }

    #[test]
    fn test_counter_epoch_bump_is_a_boundary() {
        let mut counter = ReleaseCounter::new();
        let plain = ev("1.0");
        let bumped = EpochVersion {
            epoch: 1,
            version: "1.0".to_string(),
        };
        counter.observe(Some(&bumped), None);
        assert_eq!(counter.observe(Some(&plain), None), Observation::Boundary);
    }

    #[test]
    fn test_visitor_counts_until_version_change() {
        let mut visitor = ReleaseNumberVisitor::new();
        let current = metadata("1.0");
        let previous = metadata("0.9");
        visitor.observe(&entry("a", vec![]), Some(&current));
        visitor.observe(&entry("b", vec![]), Some(&current));
        assert!(!visitor.finished());
        visitor.observe(&entry("c", vec![]), Some(&previous));
        assert!(visitor.finished());

        let result = Box::new(visitor).finish();
        let VisitorResult::ReleaseNumber(info) = result else {
            panic!("expected a release-number result");
        };
        assert_eq!(info.release, "2");
        assert_eq!(info.epoch_version, Some(ev("1.0")));
        assert_eq!(info.evr().as_deref(), Some("1.0-2"));
    }

    #[test]
    fn test_visitor_unparseable_head_has_no_epoch_version() {
        let mut visitor = ReleaseNumberVisitor::new();
        visitor.observe(&entry("a", vec![]), None);
        visitor.observe(&entry("b", vec![]), Some(&metadata("1.0")));

        let VisitorResult::ReleaseNumber(info) = Box::new(visitor).finish() else {
            panic!("expected a release-number result");
        };
        assert_eq!(info.epoch_version, None);
        assert_eq!(info.evr(), None);
        assert_eq!(info.release, "2");
    }

    #[test]
    fn test_visitor_reset_trailer_finishes_the_scan() {
        let mut visitor = ReleaseNumberVisitor::new();
        let current = metadata("1.0");
        visitor.observe(&entry("a", vec![]), Some(&current));
        let reset = entry(
            "b",
            vec![("Release-Reset".to_string(), "5".to_string())],
        );
        visitor.observe(&reset, Some(&current));
        assert!(visitor.finished());

        let VisitorResult::ReleaseNumber(info) = Box::new(visitor).finish() else {
            panic!("expected a release-number result");
        };
        assert_eq!(info.release, "6");
    }
}
