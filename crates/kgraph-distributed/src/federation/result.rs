//! The merged answer of a federated query.

use super::normalize::Record;
use crate::sharding::PartitionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one federated query call.
///
/// Always produced, even when every partition failed; check
/// [`is_complete`](Self::is_complete) before trusting `records`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FederatedResult {
    /// Merged records in partition order, deduplicated if enabled
    pub records: Vec<Record>,
    /// Raw records of each partition, indexed by partition
    pub per_partition_records: Vec<Vec<Record>>,
    /// Number of partitions queried
    pub partition_count: usize,
    /// Failure message per failed partition
    pub errors: BTreeMap<PartitionId, String>,
}

impl FederatedResult {
    /// True when no partition failed.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Indices of failed partitions, ascending.
    pub fn failed_partitions(&self) -> Vec<PartitionId> {
        self.errors.keys().copied().collect()
    }

    /// Row count before deduplication.
    pub fn raw_row_count(&self) -> usize {
        self.per_partition_records.iter().map(Vec::len).sum()
    }

    /// Number of merged records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgraph_cypher::Value;

    #[test]
    fn test_helpers() {
        let row: Record = [("n".to_string(), Value::Int(1))].into();
        let mut result = FederatedResult {
            records: vec![row.clone()],
            per_partition_records: vec![vec![row.clone()], vec![row], vec![]],
            partition_count: 3,
            errors: BTreeMap::new(),
        };
        assert!(result.is_complete());
        assert_eq!(result.raw_row_count(), 2);
        assert_eq!(result.len(), 1);
        assert!(!result.is_empty());

        result.errors.insert(2, "boom".into());
        assert!(!result.is_complete());
        assert_eq!(result.failed_partitions(), vec![2]);
    }

    #[test]
    fn test_serializes() {
        let result = FederatedResult {
            partition_count: 1,
            per_partition_records: vec![vec![]],
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["partition_count"], 1);
        assert!(json["records"].as_array().unwrap().is_empty());
    }
}
