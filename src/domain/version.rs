//! Version classification for declared npm ranges
//!
//! Only the `major.minor.patch` triple takes part in comparisons.
//! Pre-release and build metadata are discarded, and wildcard or compound
//! ranges (`*`, `x`, `>=1 <2`) are not resolved: `*` is unparseable, and a
//! compound range is reduced to its first version.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

/// Leading non-digit prefix, then up to three dot separated digit groups
static CLEAN_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^0-9]*)([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?")
        .expect("clean version pattern is valid")
});

const WORKSPACE_PROTOCOL: &str = "workspace:";

/// A declared range split into its operator prefix and numeric triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CleanVersion {
    /// Range operator preceding the first digit (`^`, `~`, `>=`, or empty)
    pub prefix: String,
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl CleanVersion {
    /// Creates a CleanVersion with an empty prefix
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            prefix: String::new(),
            major,
            minor,
            patch,
        }
    }

    /// Sets the range prefix (builder pattern)
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// An exact pin: no range operator in front of the version
    pub fn is_locked(&self) -> bool {
        self.prefix.is_empty()
    }

    /// The numeric triple as a tuple
    pub fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl fmt::Display for CleanVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Highest-order version component that differs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeMagnitude {
    None,
    Patch,
    Minor,
    Major,
}

impl UpgradeMagnitude {
    /// Plain label
    pub fn label(&self) -> &'static str {
        match self {
            UpgradeMagnitude::None => "none",
            UpgradeMagnitude::Patch => "patch",
            UpgradeMagnitude::Minor => "minor",
            UpgradeMagnitude::Major => "major",
        }
    }
}

impl fmt::Display for UpgradeMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sign of the comparison between current and latest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeDirection {
    None,
    Upgrade,
    Downgrade,
}

impl fmt::Display for UpgradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpgradeDirection::None => "none",
            UpgradeDirection::Upgrade => "upgrade",
            UpgradeDirection::Downgrade => "downgrade",
        };
        f.write_str(label)
    }
}

/// Outcome of comparing a current version against the latest one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comparison {
    pub magnitude: UpgradeMagnitude,
    pub direction: UpgradeDirection,
}

impl Comparison {
    /// Equal versions
    pub const UNCHANGED: Comparison = Comparison {
        magnitude: UpgradeMagnitude::None,
        direction: UpgradeDirection::None,
    };

    pub fn new(magnitude: UpgradeMagnitude, direction: UpgradeDirection) -> Self {
        Self {
            magnitude,
            direction,
        }
    }

    /// Whether a candidate should be produced under the given downgrade policy
    pub fn passes_gate(&self, allow_downgrade: bool) -> bool {
        match self.direction {
            UpgradeDirection::Upgrade => true,
            UpgradeDirection::Downgrade => allow_downgrade,
            UpgradeDirection::None => false,
        }
    }
}

/// Parse a declared range into its prefix and numeric triple.
///
/// Everything before the first digit is the prefix. Up to three dot separated
/// digit groups follow; missing components default to zero and any trailing
/// text is dropped. Returns `None` for empty or non-numeric input, for
/// components too large for a `u64`, and for git, file, URL and alias
/// specifiers (a prefix holding `:` or `/`, other than `workspace:`).
pub fn parse_clean(raw: &str) -> Option<CleanVersion> {
    let caps = CLEAN_VERSION_RE.captures(raw.trim())?;

    let prefix = &caps[1];
    let operator = prefix.strip_prefix(WORKSPACE_PROTOCOL).unwrap_or(prefix);
    if operator.contains([':', '/']) {
        return None;
    }

    let component = |idx: usize| -> Option<u64> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    Some(CleanVersion {
        prefix: prefix.to_string(),
        major: component(2)?,
        minor: component(3)?,
        patch: component(4)?,
    })
}

/// Compare two clean versions.
///
/// The first differing component, walking major → minor → patch, decides both
/// the magnitude and the direction. Prefixes are ignored.
pub fn compare(current: &CleanVersion, latest: &CleanVersion) -> Comparison {
    let pairs = [
        (UpgradeMagnitude::Major, current.major, latest.major),
        (UpgradeMagnitude::Minor, current.minor, latest.minor),
        (UpgradeMagnitude::Patch, current.patch, latest.patch),
    ];

    for (magnitude, cur, lat) in pairs {
        match lat.cmp(&cur) {
            Ordering::Equal => continue,
            Ordering::Greater => return Comparison::new(magnitude, UpgradeDirection::Upgrade),
            Ordering::Less => return Comparison::new(magnitude, UpgradeDirection::Downgrade),
        }
    }

    Comparison::UNCHANGED
}

/// Compare two raw version strings.
///
/// Identical strings short-circuit to an unchanged comparison before any
/// parsing, which also covers ties on non-numeric suffixes. Returns `None`
/// when either side cannot be parsed.
pub fn classify(current: &str, latest: &str) -> Option<Comparison> {
    if current == latest {
        return Some(Comparison::UNCHANGED);
    }
    let current = parse_clean(current)?;
    let latest = parse_clean(latest)?;
    Some(compare(&current, &latest))
}

/// Whether a version string carries a semver pre-release tag
pub fn is_prerelease(version: &str) -> bool {
    let version = version.strip_prefix('v').unwrap_or(version);
    semver::Version::parse(version)
        .map(|v| !v.pre.is_empty())
        .unwrap_or(false)
}
