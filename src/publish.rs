//! Build-tag publication against a Pagure-style repository API.
//!
//! Failures here never fail the enclosing build pipeline: every problem
//! is recorded as a [PublishOutcome] and swallowed, and nothing is
//! retried.

use std::fmt;
use std::time::Duration;

use regex::Regex;

use crate::config::PagureConfig;
use crate::error::{AutorelError, Result};

/// Default source-URL pattern; named groups `repo` and `commit` are
/// required of any override.
pub const DEFAULT_GIT_FILTER: &str =
    r".*\.fedoraproject\.org/(?P<repo>rpms/.*)\.git#(?P<commit>[a-f0-9]{40})$";

const TIMEOUT: Duration = Duration::from_secs(30);

/// Identity of a finished build, as reported by the build system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub name: String,
    pub epoch: u64,
    pub version: String,
    pub release: String,
    pub source: Option<String>,
}

/// Repository and commit extracted from a build's source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub repo: String,
    pub commit: String,
}

/// Anchored matcher that extracts a [SourceRef] from a source URL.
#[derive(Debug)]
pub struct SourceFilter {
    pattern: Regex,
}

impl SourceFilter {
    /// Compile a filter pattern, verifying that it exposes the `repo`
    /// and `commit` named capture groups.
    pub fn from_pattern(pattern: &str) -> Result<Self> {
        let compiled = Regex::new(pattern)
            .map_err(|e| AutorelError::config(format!("invalid git_filter pattern: {}", e)))?;
        for group in ["repo", "commit"] {
            if !compiled
                .capture_names()
                .any(|name| name == Some(group))
            {
                return Err(AutorelError::config(format!(
                    "git_filter pattern is missing the '{}' capture group",
                    group
                )));
            }
        }
        Ok(SourceFilter { pattern: compiled })
    }

    /// Extract the repository and commit from a source URL. No match is
    /// a normal outcome, not an error.
    pub fn parse(&self, source: &str) -> Option<SourceRef> {
        let captures = self.pattern.captures(source)?;
        let repo = captures.name("repo")?.as_str();
        let commit = captures.name("commit")?.as_str();
        if repo.is_empty() || commit.is_empty() {
            return None;
        }
        Some(SourceRef {
            repo: repo.to_string(),
            commit: commit.to_string(),
        })
    }
}

/// Tag name for a build: `name-epoch-version-release` with the epoch
/// segment omitted entirely when the epoch is zero.
pub fn tag_name(build: &BuildInfo) -> String {
    let nevr = if build.epoch == 0 {
        format!("{}-{}-{}", build.name, build.version, build.release)
    } else {
        format!(
            "{}-{}-{}-{}",
            build.name, build.epoch, build.version, build.release
        )
    };
    escape_tag(&nevr)
}

/// Replace characters a tag name may not carry with underscores.
pub fn escape_tag(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// What became of one publication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The tag was created in the remote repository.
    Posted { tag: String },
    /// Nothing was sent; the build carried no usable source reference.
    Skipped { reason: String },
    /// A request was attempted and failed.
    Failed { reason: String },
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishOutcome::Posted { tag } => write!(f, "created tag '{}'", tag),
            PublishOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            PublishOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

/// Create a tag for a finished build in its source repository.
///
/// Swallows every failure: the outcome is logged to stderr and returned,
/// never raised.
pub fn publish_tag(config: &PagureConfig, build: &BuildInfo) -> PublishOutcome {
    let Some(source) = build.source.as_deref() else {
        return skip("no source for this build".to_string());
    };

    let filter = match config.source_filter() {
        Ok(filter) => filter,
        Err(e) => return skip(e.to_string()),
    };
    let Some(source_ref) = filter.parse(source) else {
        return skip(format!(
            "could not parse repo and commit from {}",
            source
        ));
    };

    let tag = tag_name(build);
    let endpoint = format!(
        "{}/api/0/{}/git/tags",
        config.url.trim_end_matches('/'),
        source_ref.repo
    );

    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .build()
        .new_agent();
    let response = agent
        .post(&endpoint)
        .header("Authorization", &format!("token {}", config.token))
        .send_form([
            ("tagname", tag.as_str()),
            ("commit_hash", source_ref.commit.as_str()),
            ("with_commits", "true"),
        ]);

    match response {
        Ok(_) => PublishOutcome::Posted { tag },
        Err(ureq::Error::StatusCode(code)) => {
            let reason = format!(
                "while attempting to create a tag in {}, the request failed with status {}",
                endpoint, code
            );
            eprintln!("autorel: {}", reason);
            PublishOutcome::Failed { reason }
        }
        Err(e) => {
            let reason = format!(
                "while attempting to create a tag in {}, the request failed: {}",
                endpoint, e
            );
            eprintln!("autorel: {}", reason);
            PublishOutcome::Failed { reason }
        }
    }
}

fn skip(reason: String) -> PublishOutcome {
    eprintln!("autorel: {}, skipping", reason);
    PublishOutcome::Skipped { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(epoch: u64, source: Option<&str>) -> BuildInfo {
        BuildInfo {
            name: "foo".to_string(),
            epoch,
            version: "1.2".to_string(),
            release: "3".to_string(),
            source: source.map(str::to_string),
        }
    }

    #[test]
    fn test_tag_name_omits_zero_epoch() {
        assert_eq!(tag_name(&build(0, None)), "foo-1.2-3");
    }

    #[test]
    fn test_tag_name_includes_nonzero_epoch() {
        assert_eq!(tag_name(&build(2, None)), "foo-2-1.2-3");
    }

    #[test]
    fn test_escape_tag_replaces_forbidden_characters() {
        assert_eq!(escape_tag("foo~bar:1/2"), "foo_bar_1_2");
        assert_eq!(escape_tag("foo-1.2_3+4"), "foo-1.2_3+4");
    }

    #[test]
    fn test_default_filter_extracts_repo_and_commit() {
        let filter = SourceFilter::from_pattern(DEFAULT_GIT_FILTER).expect("default pattern");
        let commit = "0123456789abcdef0123456789abcdef01234567";
        let source = format!("https://src.fedoraproject.org/rpms/foo.git#{}", commit);
        let source_ref = filter.parse(&source).expect("source should match");
        assert_eq!(source_ref.repo, "rpms/foo");
        assert_eq!(source_ref.commit, commit);
    }

    #[test]
    fn test_short_commit_suffix_does_not_match() {
        let filter = SourceFilter::from_pattern(DEFAULT_GIT_FILTER).expect("default pattern");
        assert_eq!(
            filter.parse("https://src.fedoraproject.org/rpms/foo.git#abc123"),
            None
        );
    }

    #[test]
    fn test_filter_requires_named_groups() {
        let err = SourceFilter::from_pattern(r"(?P<repo>.*)").expect_err("missing group");
        assert!(err.to_string().contains("commit"));
    }

    #[test]
    fn test_filter_rejects_invalid_patterns() {
        assert!(SourceFilter::from_pattern(r"(?P<repo>").is_err());
    }

    #[test]
    fn test_publish_without_source_is_skipped() {
        let config = PagureConfig {
            url: "https://pagure.example".to_string(),
            token: "secret".to_string(),
            git_filter: None,
        };
        let outcome = publish_tag(&config, &build(0, None));
        assert!(matches!(outcome, PublishOutcome::Skipped { .. }));
    }

    #[test]
    fn test_publish_with_unmatched_source_sends_nothing() {
        let config = PagureConfig {
            url: "https://pagure.example".to_string(),
            token: "secret".to_string(),
            git_filter: None,
        };
        // An unmatched source is skipped before any request is built.
        let outcome = publish_tag(&config, &build(0, Some("https://elsewhere.example/foo")));
        assert!(matches!(outcome, PublishOutcome::Skipped { .. }));
    }
}
