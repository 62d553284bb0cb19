// Copyright 2024 Cornell University
// released under BSD 3-Clause License
// author: Kevin Laeufer <laeufer@cornell.edu>

use indexmap::IndexMap;

/// Version index of the first (entry) value of a variable on a path segment.
pub const FIRST_VERSION: u32 = 1;

/// Maps variable base names to their current (highest) SSA version on a path.
/// Versions are positive and monotonically non-decreasing along a path; names that
/// were never assigned resolve to version 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SsaMap {
    map: IndexMap<String, u32>,
}

impl SsaMap {
    pub fn get(&self, name: &str) -> Option<u32> {
        self.map.get(name).copied()
    }

    /// Current version, auto-instantiating absent names at version 1.
    pub fn version_of(&mut self, name: &str) -> u32 {
        *self.map.entry(name.to_string()).or_insert(FIRST_VERSION)
    }

    pub fn set(&mut self, name: &str, version: u32) {
        assert!(version >= FIRST_VERSION, "versions are positive");
        let old = self.map.insert(name.to_string(), version);
        assert!(
            old.map(|o| o <= version).unwrap_or(true),
            "SSA versions must not decrease: {name} {old:?} -> {version}"
        );
    }

    /// Raises the version of `name` to at least `version` (no-op if already higher).
    pub fn set_at_least(&mut self, name: &str, version: u32) {
        let entry = self.map.entry(name.to_string()).or_insert(FIRST_VERSION);
        if *entry < version {
            *entry = version;
        }
    }

    pub fn increment(&mut self, name: &str) -> u32 {
        let entry = self.map.entry(name.to_string()).or_insert(FIRST_VERSION);
        *entry += 1;
        *entry
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.map.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Point-wise maximum of two maps (the SSA map of a control-flow join).
    pub fn merged_with(&self, other: &SsaMap) -> SsaMap {
        let mut out = self.clone();
        for (name, version) in other.iter() {
            out.set_at_least(name, version);
        }
        out
    }
}

/// Spells the versioned variable name, e.g. `x@3`.
pub fn name_at(name: &str, version: u32) -> String {
    format!("{}@{}", name, version)
}

/// Splits a versioned name back into base name and version.
pub fn split_versioned(name: &str) -> Option<(&str, u32)> {
    let (base, idx) = name.rsplit_once('@')?;
    let version = idx.parse().ok()?;
    Some((base, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_version_is_one() {
        let mut ssa = SsaMap::default();
        assert_eq!(ssa.get("x"), None);
        assert_eq!(ssa.version_of("x"), 1);
        assert_eq!(ssa.get("x"), Some(1));
    }

    #[test]
    fn versions_are_monotonic() {
        let mut ssa = SsaMap::default();
        assert_eq!(ssa.increment("x"), 2);
        assert_eq!(ssa.increment("x"), 3);
        ssa.set_at_least("x", 2);
        assert_eq!(ssa.get("x"), Some(3));
    }

    #[test]
    #[should_panic]
    fn decreasing_version_panics() {
        let mut ssa = SsaMap::default();
        ssa.set("x", 3);
        ssa.set("x", 2);
    }

    #[test]
    fn versioned_names_round_trip() {
        assert_eq!(split_versioned(&name_at("x", 4)), Some(("x", 4)));
        assert_eq!(split_versioned("plain"), None);
        // variables with @ in their name keep the last separator
        assert_eq!(split_versioned("a@b@2"), Some(("a@b", 2)));
    }

    #[test]
    fn merged_map_takes_maximum() {
        let mut a = SsaMap::default();
        a.set("x", 3);
        a.set("y", 1);
        let mut b = SsaMap::default();
        b.set("x", 2);
        b.set("z", 4);
        let m = a.merged_with(&b);
        assert_eq!(m.get("x"), Some(3));
        assert_eq!(m.get("y"), Some(1));
        assert_eq!(m.get("z"), Some(4));
    }
}
