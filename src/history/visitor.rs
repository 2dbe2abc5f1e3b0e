use crate::history::HistoryEntry;
use crate::specfile::PackageMetadata;
use crate::visitors::changelog::ChangelogEntry;
use crate::visitors::release::ReleaseInfo;

/// Named, typed value contributed by one visitor after a full walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitorResult {
    ReleaseNumber(ReleaseInfo),
    Changelog(Vec<ChangelogEntry>),
}

/// A fact accumulator fed by the history walk.
///
/// Visitors receive every reachable commit exactly once, newest first,
/// together with that commit's spec-file snapshot. They must not assume
/// any call order relative to other visitors registered on the same
/// walk. New derived facts are added by implementing this trait, not by
/// modifying the walker.
pub trait Visitor {
    /// Fixed key under which the result is stored in the run output.
    /// Keys never collide between visitors registered on one walk.
    fn name(&self) -> &'static str;

    /// Observe one commit and its metadata snapshot. `metadata` is
    /// `None` when the spec file was absent or unparseable at this
    /// commit.
    fn observe(&mut self, entry: &HistoryEntry, metadata: Option<&PackageMetadata>);

    /// True once the visitor has gathered sufficient information. The
    /// walker stops feeding a finished visitor and ends the walk early
    /// when every visitor is finished.
    fn finished(&self) -> bool;

    /// Consume the accumulated state into this visitor's result.
    fn finish(self: Box<Self>) -> VisitorResult;
}
