use std::fmt;

use regex::Regex;

/// The declared epoch/version pair of a package.
///
/// Two snapshots belong to the same release series exactly when their
/// `EpochVersion`s compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochVersion {
    pub epoch: u64,
    pub version: String,
}

impl fmt::Display for EpochVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:{}", self.epoch, self.version)
        } else {
            f.write_str(&self.version)
        }
    }
}

/// Parsed view of a package spec file as it existed at one commit.
///
/// Parsing is all-or-nothing: when the preamble cannot be read,
/// [PackageMetadata::parse] returns `None` instead of a partially-filled
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub epoch: u64,
    pub version: String,
    /// Raw value of the `Release:` preamble line, if present.
    pub release_field: Option<String>,
    /// The full spec text the fields were read from.
    pub raw: String,
}

impl PackageMetadata {
    /// Parse the spec preamble from raw blob content.
    ///
    /// Commit blobs are not guaranteed to be valid UTF-8; invalid bytes
    /// are replaced before parsing.
    pub fn parse_bytes(content: &[u8]) -> Option<Self> {
        Self::parse(&String::from_utf8_lossy(content))
    }

    /// Parse the spec preamble (Name/Epoch/Version/Release tags).
    ///
    /// `Name` and `Version` are required; a present but non-numeric
    /// `Epoch` makes the whole spec unparseable. The first occurrence of
    /// each tag wins.
    pub fn parse(content: &str) -> Option<Self> {
        let re = Regex::new(r"(?i)^\s*(Name|Epoch|Version|Release)\s*:\s*(.+?)\s*$").ok()?;

        let mut name = None;
        let mut version = None;
        let mut epoch = None;
        let mut release_field = None;

        for line in content.lines() {
            let Some(captures) = re.captures(line) else {
                continue;
            };
            let value = captures[2].to_string();
            match captures[1].to_ascii_lowercase().as_str() {
                "name" => {
                    name.get_or_insert(value);
                }
                "epoch" => {
                    epoch.get_or_insert(value);
                }
                "version" => {
                    version.get_or_insert(value);
                }
                "release" => {
                    release_field.get_or_insert(value);
                }
                _ => continue,
            }
        }

        let name = name?;
        let version = version?;
        let epoch = match epoch {
            Some(raw) => raw.parse::<u64>().ok()?,
            None => 0,
        };

        Some(PackageMetadata {
            name,
            epoch,
            version,
            release_field,
            raw: content.to_string(),
        })
    }

    /// The declared epoch/version pair of this snapshot.
    pub fn epoch_version(&self) -> EpochVersion {
        EpochVersion {
            epoch: self.epoch,
            version: self.version.clone(),
        }
    }
}
