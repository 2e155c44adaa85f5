use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A loosely structured server build string such as `5.7.0.11` or
/// `4.9.0.3-1`.
///
/// Digit runs compare numerically and letter runs lexically; every other
/// character only separates components. Components compare left to right and
/// a version that is a strict prefix of another sorts first, so `6.0.0` is
/// older than `6.0.0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    raw: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Part {
    Num(u64),
    Text(String),
}

impl Version {
    pub fn parse(raw: &str) -> Self {
        let mut parts = Vec::new();
        let mut chars = raw.chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                let mut digits = String::new();
                while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                    digits.push(d);
                    chars.next();
                }
                parts.push(Part::Num(digits.parse().unwrap_or(u64::MAX)));
            } else if c.is_ascii_alphabetic() {
                let mut letters = String::new();
                while let Some(&l) = chars.peek().filter(|l| l.is_ascii_alphabetic()) {
                    letters.push(l.to_ascii_lowercase());
                    chars.next();
                }
                parts.push(Part::Text(letters));
            } else {
                chars.next();
            }
        }

        Self {
            raw: raw.to_string(),
            parts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn at_least(&self, other: &str) -> bool {
        *self >= Version::parse(other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Version::parse(s))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Half-open build range `[from, until)`; an open end is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub from: Option<&'static str>,
    pub until: Option<&'static str>,
}

impl VersionRange {
    pub const fn new(from: Option<&'static str>, until: Option<&'static str>) -> Self {
        Self { from, until }
    }

    pub fn contains(&self, version: &Version) -> bool {
        let above = self.from.is_none_or(|from| *version >= Version::parse(from));
        let below = self.until.is_none_or(|until| *version < Version::parse(until));
        above && below
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_components_compare_numerically() {
        assert!(Version::parse("3.10.0") > Version::parse("3.9.9"));
        assert!(Version::parse("10.0") > Version::parse("9.9.9.9"));
    }

    #[test]
    fn test_prefix_is_older() {
        assert!(Version::parse("6.0.0") < Version::parse("6.0.0.0"));
        assert_eq!(Version::parse("5.7.0.11"), Version::parse("5.7.0.11"));
    }

    #[test]
    fn test_build_suffixes_are_components() {
        assert!(Version::parse("4.9.0.3-1") > Version::parse("4.9.0.3"));
        assert!(Version::parse("4.9.0.3").at_least("4.2.0"));
    }

    #[test]
    fn test_range_contains() {
        let range = VersionRange::new(Some("3.0.0"), Some("3.1.3"));
        assert!(range.contains(&Version::parse("3.0.0")));
        assert!(range.contains(&Version::parse("3.1.2.9")));
        assert!(!range.contains(&Version::parse("3.1.3")));
        assert!(!range.contains(&Version::parse("2.9")));

        let before = VersionRange::new(None, Some("2.7.0"));
        assert!(before.contains(&Version::parse("2.6.9")));
        assert!(!before.contains(&Version::parse("2.7.0")));
    }
}
