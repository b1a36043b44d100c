// src/version/mod.rs

//! Version handling and specifier matching for locked packages
//!
//! This module provides PEP 440 version parsing and ordering. Versions have
//! the form `[N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]`; specifiers that
//! constrain them (`>=1.2`, `~=2.0`, `==1.4.*`) live in [`specifier`].

pub mod specifier;

pub use specifier::{Operator, Specifier, SpecifierSet, clean_specifier, strip_version};

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Pre-release phase, in ascending order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    Candidate,
}

impl PreRelease {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "a" | "alpha" => Some(Self::Alpha),
            "b" | "beta" => Some(Self::Beta),
            "rc" | "c" | "pre" | "preview" => Some(Self::Candidate),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Candidate => "rc",
        }
    }
}

/// A parsed PEP 440 version
///
/// Equality and ordering are semantic: `1.0` and `1.0.0` compare equal.
#[derive(Debug, Clone)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<(PreRelease, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Option<String>,
}

impl Version {
    /// Parse a version string
    ///
    /// Examples:
    /// - "1.2.3" → release=[1, 2, 3]
    /// - "1!2.0" → epoch=1, release=[2, 0]
    /// - "2.0rc1" → pre=(Candidate, 1)
    /// - "1.0-1" → post=1 (implicit post-release)
    /// - "1.0.dev3+ubuntu.1" → dev=3, local="ubuntu.1"
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidVersion {
            version: s.to_string(),
            reason: reason.to_string(),
        };

        let lowered = s.trim().to_ascii_lowercase();
        let text = lowered.strip_prefix('v').unwrap_or(&lowered);

        let (text, local) = match text.split_once('+') {
            Some((head, local)) => {
                let valid = !local.is_empty()
                    && local
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
                if !valid {
                    return Err(invalid("invalid local version label"));
                }
                (head, Some(local.replace(['-', '_'], ".")))
            }
            None => (text, None),
        };

        let (epoch, rest) = match text.split_once('!') {
            Some((epoch, rest)) => (
                epoch.parse::<u64>().map_err(|_| invalid("invalid epoch"))?,
                rest,
            ),
            None => (0, text),
        };

        let release_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let release_text = rest[..release_end].trim_end_matches('.');
        if release_text.is_empty() {
            return Err(invalid("missing release segment"));
        }
        let release = release_text
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| invalid("invalid release segment"))?;

        let mut version = Self {
            epoch,
            release,
            pre: None,
            post: None,
            dev: None,
            local,
        };

        let mut cursor = &rest[release_end..];
        while !cursor.is_empty() {
            if cursor.starts_with(['.', '-', '_']) {
                cursor = &cursor[1..];
            }

            let label_len = cursor
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(cursor.len());
            let label = &cursor[..label_len];
            cursor = &cursor[label_len..];

            if !label.is_empty()
                && cursor.starts_with(['.', '-', '_'])
                && cursor[1..].starts_with(|c: char| c.is_ascii_digit())
            {
                cursor = &cursor[1..];
            }

            let digits_len = cursor
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(cursor.len());
            let number = if digits_len == 0 {
                0
            } else {
                cursor[..digits_len]
                    .parse::<u64>()
                    .map_err(|_| invalid("numeric component out of range"))?
            };
            cursor = &cursor[digits_len..];

            match label {
                // "1.0-1" is an implicit post-release
                "" if digits_len > 0 && version.post.is_none() && version.dev.is_none() => {
                    version.post = Some(number);
                }
                "post" | "rev" | "r" if version.post.is_none() && version.dev.is_none() => {
                    version.post = Some(number);
                }
                "dev" if version.dev.is_none() => {
                    version.dev = Some(number);
                }
                _ => match PreRelease::from_label(label) {
                    Some(phase)
                        if version.pre.is_none()
                            && version.post.is_none()
                            && version.dev.is_none() =>
                    {
                        version.pre = Some((phase, number));
                    }
                    _ => return Err(invalid("unexpected suffix")),
                },
            }
        }

        Ok(version)
    }

    /// True for alpha/beta/rc and dev releases
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// This version without its local label
    pub fn public(&self) -> Version {
        Version {
            local: None,
            ..self.clone()
        }
    }

    /// Same epoch and release segments, ignoring trailing zeros
    pub fn same_release(&self, other: &Version) -> bool {
        self.epoch == other.epoch && compare_release(&self.release, &other.release).is_eq()
    }

    /// Release segment at `index`, zero-padded past the end
    pub(crate) fn segment(&self, index: usize) -> u64 {
        self.release.get(index).copied().unwrap_or(0)
    }

    /// Compare two versions following PEP 440 ordering
    pub fn compare(&self, other: &Version) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_release(&self.release, &other.release))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| compare_local(self.local.as_deref(), other.local.as_deref()))
    }

    // A dev release of a final version sorts before its pre-releases;
    // a final version sorts after them.
    fn pre_key(&self) -> (u8, Option<(PreRelease, u64)>) {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (0, None),
            (Some(pre), _, _) => (1, Some(pre)),
            (None, _, _) => (2, None),
        }
    }

    fn dev_key(&self) -> (bool, u64) {
        match self.dev {
            Some(n) => (false, n),
            None => (true, 0),
        }
    }
}

fn compare_release(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn compare_local(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let mut left = a.split('.');
            let mut right = b.split('.');
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some(x), Some(y)) => {
                        // Numeric segments sort above alphanumeric ones
                        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                            (Ok(x), Ok(y)) => x.cmp(&y),
                            (Ok(_), Err(_)) => Ordering::Greater,
                            (Err(_), Ok(_)) => Ordering::Less,
                            (Err(_), Err(_)) => x.cmp(y),
                        };
                        if ord.is_ne() {
                            return ord;
                        }
                    }
                }
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((phase, n)) = self.pre {
            write!(f, "{}{}", phase.as_str(), n)?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{}", post)?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{}", dev)?;
        }
        if let Some(ref local) = self.local {
            write!(f, "+{}", local)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other).is_eq()
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let version = v("1.2.3");
        assert_eq!(version.epoch, 0);
        assert_eq!(version.release, vec![1, 2, 3]);
        assert_eq!(version.pre, None);
        assert_eq!(version.local, None);
    }

    #[test]
    fn test_parse_full() {
        let version = v("2!1.0rc2.post3.dev4+ubuntu-1");
        assert_eq!(version.epoch, 2);
        assert_eq!(version.release, vec![1, 0]);
        assert_eq!(version.pre, Some((PreRelease::Candidate, 2)));
        assert_eq!(version.post, Some(3));
        assert_eq!(version.dev, Some(4));
        assert_eq!(version.local.as_deref(), Some("ubuntu.1"));
    }

    #[test]
    fn test_parse_aliases_and_separators() {
        assert_eq!(v("1.0-alpha.1").pre, Some((PreRelease::Alpha, 1)));
        assert_eq!(v("1.0.beta").pre, Some((PreRelease::Beta, 0)));
        assert_eq!(v("1.0c1").pre, Some((PreRelease::Candidate, 1)));
        assert_eq!(v("1.0-1").post, Some(1));
        assert_eq!(v("1.0.rev2").post, Some(2));
        assert_eq!(v("v3.1").release, vec![3, 1]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("abc").is_err());
        assert!(Version::parse("1.0foo").is_err());
        assert!(Version::parse("1.0.post1a1").is_err());
        assert!(Version::parse("1.0+").is_err());
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn test_ordering_of_phases() {
        let ordered = [
            "1.0.dev1", "1.0a1", "1.0a2.dev1", "1.0a2", "1.0b1", "1.0rc1", "1.0", "1.0+local",
            "1.0.post1.dev1", "1.0.post1", "1.1",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_epoch_wins() {
        assert!(v("1!0.1") > v("99.0"));
    }

    #[test]
    fn test_local_ordering() {
        assert!(v("1.0+abc") < v("1.0+1"));
        assert!(v("1.0+1") < v("1.0+1.1"));
        assert!(v("1.0+2") > v("1.0+1"));
    }

    #[test]
    fn test_display_is_normalized() {
        assert_eq!(v("1.2.3").to_string(), "1.2.3");
        assert_eq!(v("1!2.0-RC-1").to_string(), "1!2.0rc1");
        assert_eq!(v("1.0-1").to_string(), "1.0.post1");
        assert_eq!(v("1.0.dev0+Ubuntu_1").to_string(), "1.0.dev0+ubuntu.1");
    }

    #[test]
    fn test_prerelease_flags() {
        assert!(v("1.0a1").is_prerelease());
        assert!(v("1.0.dev1").is_prerelease());
        assert!(!v("1.0.post1").is_prerelease());
        assert!(v("1.0.post1").is_postrelease());
    }
}
