//! Inventory model types.
//!
//! An inventory is an ordered snapshot of package records. Comparison and
//! actions happen at the granularity of a single `(name, version)` pair.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One package line: a name and its versions in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    /// Package name.
    pub name: String,
    /// Versions in the order they were listed.
    pub versions: Vec<String>,
}

/// One line of the outdated report: installed version and newest available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutdatedRecord {
    /// Package name.
    pub name: String,
    /// Currently installed version.
    pub current: String,
    /// Latest available version.
    pub latest: String,
}

/// The atomic unit of comparison and action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VersionedUnit {
    /// Package name.
    pub name: String,
    /// Exact version string.
    pub version: String,
}

/// How the versions inside each record are ordered.
///
/// Pruning keeps the first version of each record, so it is only meaningful
/// for inventories whose versions are listed newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionOrder {
    /// Newest version first, as `gem list` reports them.
    NewestFirst,
    /// Whatever order the author wrote them in.
    AsListed,
}

/// An immutable snapshot of packages and their versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    records: Vec<PackageRecord>,
    order: VersionOrder,
}

impl PackageRecord {
    /// Creates a record from a name and its versions.
    #[must_use]
    pub fn new<S: Into<String>>(name: impl Into<String>, versions: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            versions: versions.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the units this record describes, in version order.
    pub fn units(&self) -> impl Iterator<Item = VersionedUnit> + '_ {
        self.versions
            .iter()
            .map(|v| VersionedUnit::new(&self.name, v))
    }
}

impl VersionedUnit {
    /// Creates a unit.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl OutdatedRecord {
    /// The unit that an update installs.
    #[must_use]
    pub fn target(&self) -> VersionedUnit {
        VersionedUnit::new(&self.name, &self.latest)
    }
}

impl Inventory {
    /// Creates an inventory from parsed records.
    #[must_use]
    pub const fn new(records: Vec<PackageRecord>, order: VersionOrder) -> Self {
        Self { records, order }
    }

    /// Returns the records in source order.
    #[must_use]
    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    /// Returns the ordering contract of this inventory.
    #[must_use]
    pub const fn order(&self) -> VersionOrder {
        self.order
    }

    /// Returns true if there are no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Flattens to distinct units, in first-seen order.
    #[must_use]
    pub fn units(&self) -> Vec<VersionedUnit> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .flat_map(PackageRecord::units)
            .filter(|unit| seen.insert(unit.clone()))
            .collect()
    }

    /// Returns true if any record lists exactly this version.
    #[must_use]
    pub fn contains(&self, name: &str, version: &str) -> bool {
        self.records
            .iter()
            .any(|r| r.name == name && r.versions.iter().any(|v| v == version))
    }

    /// Returns a new snapshot with `unit` added.
    ///
    /// The version goes to the front of the first record with a matching
    /// name, so a freshly installed version is treated as the newest.
    #[must_use]
    pub fn with_installed(&self, unit: &VersionedUnit) -> Self {
        if self.contains(&unit.name, &unit.version) {
            return self.clone();
        }

        let mut records = self.records.clone();
        if let Some(record) = records.iter_mut().find(|r| r.name == unit.name) {
            record.versions.insert(0, unit.version.clone());
        } else {
            records.push(PackageRecord::new(&unit.name, [&unit.version]));
        }
        Self::new(records, self.order)
    }

    /// Returns a new snapshot with every listed unit removed.
    ///
    /// Records left without versions are dropped.
    #[must_use]
    pub fn without(&self, units: &[VersionedUnit]) -> Self {
        let removed: HashSet<&VersionedUnit> = units.iter().collect();
        let records = self
            .records
            .iter()
            .map(|r| PackageRecord {
                name: r.name.clone(),
                versions: r
                    .versions
                    .iter()
                    .filter(|v| !removed.contains(&VersionedUnit::new(&r.name, *v)))
                    .cloned()
                    .collect(),
            })
            .filter(|r| !r.versions.is_empty())
            .collect();
        Self::new(records, self.order)
    }

    /// Total number of versions across all records.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.records.iter().map(|r| r.versions.len()).sum()
    }
}

impl fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.versions.join(", "))
    }
}

impl fmt::Display for OutdatedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} < {})", self.name, self.current, self.latest)
    }
}

impl fmt::Display for VersionedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

impl fmt::Display for VersionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NewestFirst => "newest first",
            Self::AsListed => "as listed",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_dedup_across_repeated_names() {
        let inventory = Inventory::new(
            vec![
                PackageRecord::new("foo", ["1.0", "0.9"]),
                PackageRecord::new("bar", ["2.0"]),
                PackageRecord::new("foo", ["1.0", "0.8"]),
            ],
            VersionOrder::AsListed,
        );

        let units = inventory.units();
        assert_eq!(
            units,
            vec![
                VersionedUnit::new("foo", "1.0"),
                VersionedUnit::new("foo", "0.9"),
                VersionedUnit::new("bar", "2.0"),
                VersionedUnit::new("foo", "0.8"),
            ]
        );
        assert_eq!(inventory.version_count(), 5);
    }

    #[test]
    fn test_with_installed_puts_new_version_first() {
        let inventory = Inventory::new(
            vec![PackageRecord::new("foo", ["1.0"])],
            VersionOrder::NewestFirst,
        );

        let updated = inventory.with_installed(&VersionedUnit::new("foo", "2.0"));
        assert_eq!(updated.records()[0].versions, vec!["2.0", "1.0"]);

        let added = updated.with_installed(&VersionedUnit::new("bar", "0.1"));
        assert_eq!(added.records().len(), 2);
        assert!(added.contains("bar", "0.1"));

        let unchanged = added.with_installed(&VersionedUnit::new("bar", "0.1"));
        assert_eq!(unchanged, added);
    }

    #[test]
    fn test_without_drops_empty_records() {
        let inventory = Inventory::new(
            vec![
                PackageRecord::new("foo", ["2.0", "1.0"]),
                PackageRecord::new("bar", ["1.0"]),
            ],
            VersionOrder::NewestFirst,
        );

        let pruned = inventory.without(&[
            VersionedUnit::new("foo", "1.0"),
            VersionedUnit::new("bar", "1.0"),
        ]);
        assert_eq!(pruned.records(), &[PackageRecord::new("foo", ["2.0"])]);
        assert_eq!(pruned.order(), VersionOrder::NewestFirst);
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(PackageRecord::new("rake", ["13.0.6", "12.3.3"]).to_string(), "rake (13.0.6, 12.3.3)");
        assert_eq!(VersionedUnit::new("rake", "13.0.6").to_string(), "rake-13.0.6");
        let outdated = OutdatedRecord {
            name: String::from("rack"),
            current: String::from("2.2.3"),
            latest: String::from("3.0.8"),
        };
        assert_eq!(outdated.to_string(), "rack (2.2.3 < 3.0.8)");
        assert_eq!(outdated.target(), VersionedUnit::new("rack", "3.0.8"));
    }
}
