use std::collections::BTreeMap;

use serde::Serialize;

use super::record::DirectoryRecord;

/// Department name to record count, derived from a record list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepartmentIndex {
    counts: BTreeMap<String, usize>,
    total: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentCard {
    pub name: String,
    pub count: usize,
}

impl DepartmentIndex {
    pub fn from_records<R: DirectoryRecord>(records: &[R]) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            *counts.entry(record.group_key().to_string()).or_insert(0) += 1;
        }
        Self {
            counts,
            total: records.len(),
        }
    }

    /// Distinct department names in lexicographic order.
    pub fn departments(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn count(&self, department: &str) -> usize {
        self.counts.get(department).copied().unwrap_or(0)
    }

    pub fn contains(&self, department: &str) -> bool {
        self.counts.contains_key(department)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn cards(&self) -> Vec<DepartmentCard> {
        self.counts
            .iter()
            .map(|(name, count)| DepartmentCard {
                name: name.clone(),
                count: *count,
            })
            .collect()
    }
}
