//! Subcommand workflows, decoupled from argument parsing.
//!
//! These functions take plain values so they can be called
//! programmatically and from tests without going through clap.

use std::path::Path;

use crate::collate::{collate_changelog, OutputMode};
use crate::error::{AutorelError, Result};
use crate::history::walker::HistoryWalker;
use crate::visitors::{ChangelogVisitor, ReleaseNumberVisitor};

/// Produce the collated changelog for a package worktree or spec file.
///
/// With `error_on_unparseable_spec` set, an unparseable spec at HEAD is
/// an error; otherwise a best-effort changelog derived from commit
/// messages alone is returned.
pub fn produce_changelog(
    spec_or_path: impl AsRef<Path>,
    error_on_unparseable_spec: bool,
) -> Result<String> {
    let walker = HistoryWalker::open(spec_or_path)?;
    let result = walker.run(
        "HEAD",
        vec![
            Box::new(ReleaseNumberVisitor::new()),
            Box::new(ChangelogVisitor::new()),
        ],
    )?;

    if error_on_unparseable_spec && result.epoch_version().is_none() {
        return Err(AutorelError::spec_parse(format!(
            "couldn't parse spec file {}",
            walker.spec_name()
        )));
    }

    Ok(collate_changelog(&result, OutputMode::Text).into_text())
}

/// Calculate `[epoch:]version-release` for the package at HEAD.
///
/// Unlike the changelog there is no best-effort fallback: without a
/// parseable spec there is nothing meaningful to print.
pub fn calculate_release(spec_or_path: impl AsRef<Path>) -> Result<String> {
    let walker = HistoryWalker::open(spec_or_path)?;
    let result = walker.run("HEAD", vec![Box::new(ReleaseNumberVisitor::new())])?;

    result
        .release()
        .and_then(|info| info.evr())
        .ok_or_else(|| {
            AutorelError::spec_parse(format!(
                "couldn't parse spec file {}",
                walker.spec_name()
            ))
        })
}
