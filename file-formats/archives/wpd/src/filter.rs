//! Glob filters over entry names

use std::fmt;
use std::str::FromStr;

/// A set of `;`-separated glob patterns.
///
/// `*` matches any run of characters (including none) and `?` matches
/// exactly one. A name is selected when any alternative matches it whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFilter {
    source: String,
    alternatives: Vec<Vec<char>>,
}

impl EntryFilter {
    /// Parse a filter
    pub fn new(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            alternatives: pattern.split(';').map(|alt| alt.chars().collect()).collect(),
        }
    }

    /// A filter selecting every name
    pub fn all() -> Self {
        Self::new("*")
    }

    /// Check whether `name` is selected
    pub fn matches(&self, name: &str) -> bool {
        let name: Vec<char> = name.chars().collect();
        self.alternatives
            .iter()
            .any(|pattern| glob_match(pattern, &name))
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl FromStr for EntryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Display for EntryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn glob_match(pattern: &[char], name: &[char]) -> bool {
    // greedy scan with a single backtrack point for the last `*`
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some(&'*') => {
                star = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                Some((star_p, star_n)) => {
                    p = star_p + 1;
                    n = star_n + 1;
                    star = Some((star_p, star_n + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
