//! Backend capabilities
//!
//! Capability names only exist at the boundary (plugin descriptors and
//! configuration); the registry compares [`Capability`] values.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    Shapes2d,
    Transforms,
    HardwareAccel,
    BlendModes,
    Antialiasing,
    Gradients,
    TextRendering,
    Rendering3d,
}

const CAPABILITY_NAMES: &[(Capability, &str)] = &[
    (Capability::Shapes2d, "2d_shapes"),
    (Capability::Transforms, "transforms"),
    (Capability::HardwareAccel, "hardware_accel"),
    (Capability::BlendModes, "blend_modes"),
    (Capability::Antialiasing, "antialiasing"),
    (Capability::Gradients, "gradients"),
    (Capability::TextRendering, "text_rendering"),
    (Capability::Rendering3d, "3d_rendering"),
];

impl Capability {
    pub fn name(&self) -> &'static str {
        CAPABILITY_NAMES
            .iter()
            .find(|(cap, _)| cap == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CAPABILITY_NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map(|(cap, _)| *cap)
            .ok_or_else(|| format!("unknown capability '{}'", s))
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// The feature set a rendering backend advertises
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackendCapabilities(BTreeSet<Capability>);

impl BackendCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    /// Unknown names are never supported
    pub fn supports_name(&self, name: &str) -> bool {
        name.parse().is_ok_and(|cap| self.supports(cap))
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Capability> for BackendCapabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
