//! Requirement scanning
//!
//! Infers which plugins a tree needs from the command ids its nodes issue.
//! A command owned by an active plugin maps to that plugin; otherwise the
//! well-known ranges below apply.

use std::collections::BTreeSet;

use super::manifest::CommandRange;
use super::registry::PluginRegistry;
use crate::domain::{NodeId, Tree};

/// Command ranges of the first-party plugins
pub const WELL_KNOWN_RANGES: &[(&str, CommandRange)] = &[
    ("canvas", CommandRange { start: 100, end: 102 }),
    ("markdown", CommandRange { start: 200, end: 202 }),
];

/// Every command id referenced under `root`, sorted and deduplicated
pub fn collect_commands(tree: &Tree, root: NodeId) -> BTreeSet<u16> {
    tree.descendants(root)
        .into_iter()
        .filter_map(|id| tree.get(id))
        .flat_map(|node| node.commands.iter().copied())
        .collect()
}

/// Names of the plugins the subtree under `root` needs, sorted
pub fn scan_requirements(tree: &Tree, root: NodeId, registry: Option<&PluginRegistry>) -> Vec<String> {
    let mut names = BTreeSet::new();

    for command in collect_commands(tree, root) {
        let owner = registry
            .and_then(|reg| {
                reg.active_ranges()
                    .find(|(_, range)| range.contains(command))
                    .map(|(name, _)| name)
            })
            .or_else(|| {
                WELL_KNOWN_RANGES
                    .iter()
                    .find(|(_, range)| range.contains(command))
                    .map(|(name, _)| *name)
            });

        match owner {
            Some(name) => {
                names.insert(name.to_string());
            }
            None => tracing::debug!(command, "Command id not owned by any plugin"),
        }
    }

    names.into_iter().collect()
}
