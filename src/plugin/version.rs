//! Semantic versions for runtime compatibility checks

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Version of this runtime, checked against plugins' minimum requirements
pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error, PartialEq)]
pub enum VersionError {
    #[error("Invalid version: '{0}'")]
    Invalid(String),
}

/// `major.minor.patch`; missing trailing parts read as 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The version this crate was built as
    pub fn runtime() -> Self {
        RUNTIME_VERSION.parse().unwrap_or_default()
    }

    /// Returns true when `self` satisfies a minimum of `required`
    pub fn satisfies(&self, required: &Version) -> bool {
        self >= required
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, '.');
        let mut next = |required: bool| -> Result<u32, VersionError> {
            match parts.next() {
                Some(part) => leading_number(part).ok_or_else(|| VersionError::Invalid(s.to_string())),
                None if required => Err(VersionError::Invalid(s.to_string())),
                None => Ok(0),
            }
        };

        let major = next(true)?;
        let minor = next(false).unwrap_or(0);
        let patch = next(false).unwrap_or(0);
        Ok(Version::new(major, minor, patch))
    }
}

/// Reads the digits at the start of `part`, so `3-beta` is 3
fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Returns true when `current` is at least `required`; unparseable input is incompatible
pub fn is_compatible(required: &str, current: &str) -> bool {
    match (required.parse::<Version>(), current.parse::<Version>()) {
        (Ok(required), Ok(current)) => current.satisfies(&required),
        _ => false,
    }
}
