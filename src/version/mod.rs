// src/version/mod.rs

//! Version comparison for AUR and pacman package versions
//!
//! Package versions have the form `[epoch:]version-release`. The version part
//! may itself contain hyphens (snapshot schemes such as `1.0-beta-2` or dated
//! builds such as `20210304-1`), so the release is always the token after the
//! last hyphen.
//!
//! Both fragments are compared with "loose version" rules: the text is split
//! into numeric and alphabetic fields at dots and at digit/letter boundaries,
//! numeric fields compare by value, text fields compare lexically, a numeric
//! field sorts before a text field, and a field list that extends another one
//! sorts after it.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One field of a loose version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    /// Digit run with leading zeros stripped ("0" for all-zero runs)
    Number(String),
    Text(String),
}

impl Segment {
    fn number(digits: &str) -> Self {
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            Segment::Number("0".to_string())
        } else {
            Segment::Number(trimmed.to_string())
        }
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Digit strings without leading zeros: longer is larger, then lexical.
            // Avoids overflow on dated or hash-like numbers.
            (Segment::Number(a), Segment::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
            (Segment::Number(_), Segment::Text(_)) => Ordering::Less,
            (Segment::Text(_), Segment::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Digit,
    Alpha,
    Dot,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_ascii_digit() {
        CharClass::Digit
    } else if c.is_alphabetic() {
        CharClass::Alpha
    } else if c == '.' {
        CharClass::Dot
    } else {
        CharClass::Other
    }
}

/// A version fragment compared field by field
#[derive(Debug, Clone)]
pub struct LooseVersion {
    raw: String,
    segments: Vec<Segment>,
}

impl LooseVersion {
    /// Split a version fragment into comparable fields
    ///
    /// - "1.10" → [1, 10]
    /// - "2.0rc1" → [2, 0, "rc", 1]
    /// - "r1234.abc" → ["r", 1234, "abc"]
    pub fn parse(s: &str) -> Self {
        let mut segments = Vec::new();
        let mut start = 0;
        let mut current: Option<CharClass> = None;

        for (idx, c) in s.char_indices() {
            let class = classify(c);
            if current != Some(class) {
                if let Some(prev) = current {
                    push_segment(&mut segments, prev, &s[start..idx]);
                }
                start = idx;
                current = Some(class);
            }
        }
        if let Some(prev) = current {
            push_segment(&mut segments, prev, &s[start..]);
        }

        Self {
            raw: s.to_string(),
            segments,
        }
    }

    /// The original text
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn push_segment(segments: &mut Vec<Segment>, class: CharClass, text: &str) {
    match class {
        CharClass::Digit => segments.push(Segment::number(text)),
        CharClass::Alpha | CharClass::Other => segments.push(Segment::Text(text.to_string())),
        CharClass::Dot => {}
    }
}

impl PartialEq for LooseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for LooseVersion {}

impl Hash for LooseVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl Ord for LooseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Vec ordering is field-wise with a strict prefix sorting first
        self.segments.cmp(&other.segments)
    }
}

impl PartialOrd for LooseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for LooseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A decomposed `[epoch:]version-release` string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRelease {
    pub epoch: u64,
    pub version: LooseVersion,
    pub release: LooseVersion,
}

impl VersionRelease {
    /// Parse a pacman/AUR version string
    ///
    /// Format: [epoch:]version[-release]
    /// Examples:
    /// - "1.2-3" → epoch=0, version="1.2", release="3"
    /// - "1:2.0-1" → epoch=1, version="2.0", release="1"
    /// - "1.0-beta-2" → epoch=0, version="1.0-beta", release="2"
    /// - "1.0" → epoch=0, version="1.0", release=""
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        let (epoch, rest) = match s.split_once(':') {
            Some((e, r)) if e.is_empty() => (0, r),
            Some((e, r)) if e.chars().all(|c| c.is_ascii_digit()) => {
                (e.parse::<u64>().unwrap_or(u64::MAX), r)
            }
            _ => (0, s),
        };

        let (version, release) = rest.rsplit_once('-').unwrap_or((rest, ""));

        Self {
            epoch,
            version: LooseVersion::parse(version),
            release: LooseVersion::parse(release),
        }
    }
}

impl Ord for VersionRelease {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.version.cmp(&other.version))
            .then_with(|| self.release.cmp(&other.release))
    }
}

impl PartialOrd for VersionRelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if !self.release.as_str().is_empty() {
            write!(f, "-{}", self.release)?;
        }
        Ok(())
    }
}

/// Report how `candidate` orders relative to `current`
///
/// `Greater` means `candidate` is the newer of the two, so
/// `compare_versions(installed, remote) == Ordering::Greater` is the update
/// condition.
pub fn compare_versions(current: &str, candidate: &str) -> Ordering {
    VersionRelease::parse(candidate).cmp(&VersionRelease::parse(current))
}

/// True when `remote` is strictly newer than `installed`
pub fn is_newer(remote: &str, installed: &str) -> bool {
    compare_versions(installed, remote) == Ordering::Greater
}
