use crate::history::walker::RunResult;

/// Requested representation of collated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Binary,
}

/// Collated changelog in the representation the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collated {
    Text(String),
    Binary(Vec<u8>),
}

impl Collated {
    /// The collated output as text, replacing invalid UTF-8.
    pub fn into_text(self) -> String {
        match self {
            Collated::Text(text) => text,
            Collated::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Collated::Text(text) => text.into_bytes(),
            Collated::Binary(bytes) => bytes,
        }
    }
}

/// Join the changelog entries of a run into one document, newest entry
/// first, separated by blank lines.
///
/// Pure function over the run result. Text mode replaces bytes that are
/// not valid UTF-8 with U+FFFD; it never fails on binary content.
pub fn collate_changelog(result: &RunResult, mode: OutputMode) -> Collated {
    let mut joined: Vec<u8> = Vec::new();
    for (index, entry) in result.changelog().iter().enumerate() {
        if index > 0 {
            joined.extend_from_slice(b"\n\n");
        }
        joined.extend_from_slice(&entry.data);
    }

    match mode {
        OutputMode::Text => Collated::Text(String::from_utf8_lossy(&joined).into_owned()),
        OutputMode::Binary => Collated::Binary(joined),
    }
}
