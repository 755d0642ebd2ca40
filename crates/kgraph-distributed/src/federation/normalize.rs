//! Normalization of per-partition results into uniform records.
//!
//! Adapters may hand back rows in several shapes. [`normalize`] turns each
//! shape into `Vec<Record>` by trying a fixed sequence of accessors, and
//! falls back to a single `{"value": ...}` field instead of failing.
//!
//! | Shape                          | Tried in order                                |
//! |--------------------------------|-----------------------------------------------|
//! | [`PartitionOutput::Records`]   | used as is                                    |
//! | [`PartitionOutput::Container`] | `rows`, `records`, `results`, `data`          |
//! | [`PartitionOutput::Items`]     | `to_mapping`, `data`, `pairs`, `fields`       |
//! | [`PartitionOutput::Scalar`]    | `{"value": <text>}`, nothing for null         |

use kgraph_cypher::{QueryResult, Row, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// One normalized result row: column name to value, key-sorted.
pub type Record = BTreeMap<String, Value>;

/// Column used when a row has no recognizable shape.
pub const FALLBACK_COLUMN: &str = "value";

/// A row-like object. Every accessor is optional; the first one that
/// answers wins.
pub trait RowLike: Send {
    /// The row as a mapping.
    fn to_mapping(&self) -> Option<Record> {
        None
    }

    /// A data accessor returning the row's mapping.
    fn data(&self) -> Option<Record> {
        None
    }

    /// Key/value pairs.
    fn pairs(&self) -> Option<Vec<(String, Value)>> {
        None
    }

    /// Public fields of a plain data object.
    fn fields(&self) -> Option<Record> {
        None
    }

    /// Text used when no accessor answers.
    fn describe(&self) -> String;
}

/// An object that holds rows under one of several conventional names.
pub trait RowContainer: Send {
    fn rows(&self) -> Option<Vec<Record>> {
        None
    }

    fn records(&self) -> Option<Vec<Record>> {
        None
    }

    fn results(&self) -> Option<Vec<Record>> {
        None
    }

    fn data(&self) -> Option<Vec<Record>> {
        None
    }

    /// Text used when no accessor answers.
    fn describe(&self) -> String;
}

/// What a partition adapter hands back.
pub enum PartitionOutput {
    /// Already a row collection
    Records(Vec<Record>),
    /// A result object holding rows
    Container(Box<dyn RowContainer>),
    /// A sequence of row-like objects
    Items(Vec<Box<dyn RowLike>>),
    /// A single value with no row structure
    Scalar(Value),
}

impl std::fmt::Debug for PartitionOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartitionOutput::Records(records) => f.debug_tuple("Records").field(&records.len()).finish(),
            PartitionOutput::Container(c) => f.debug_tuple("Container").field(&c.describe()).finish(),
            PartitionOutput::Items(items) => f.debug_tuple("Items").field(&items.len()).finish(),
            PartitionOutput::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
        }
    }
}

impl From<QueryResult> for PartitionOutput {
    fn from(result: QueryResult) -> Self {
        PartitionOutput::Container(Box::new(result))
    }
}

impl From<Vec<Record>> for PartitionOutput {
    fn from(records: Vec<Record>) -> Self {
        PartitionOutput::Records(records)
    }
}

/// Normalizes any partition output into records.
pub fn normalize(output: PartitionOutput) -> Vec<Record> {
    match output {
        PartitionOutput::Records(records) => records,
        PartitionOutput::Container(container) => container
            .rows()
            .or_else(|| container.records())
            .or_else(|| container.results())
            .or_else(|| container.data())
            .unwrap_or_else(|| vec![fallback(container.describe())]),
        PartitionOutput::Items(items) => items.iter().map(|item| normalize_row(item.as_ref())).collect(),
        PartitionOutput::Scalar(Value::Null) => Vec::new(),
        PartitionOutput::Scalar(value) => vec![fallback(value.to_simple_string())],
    }
}

/// Normalizes a single row-like object.
pub fn normalize_row(row: &dyn RowLike) -> Record {
    row.to_mapping()
        .or_else(|| row.data())
        .or_else(|| row.pairs().map(|pairs| pairs.into_iter().collect()))
        .or_else(|| row.fields())
        .unwrap_or_else(|| fallback(row.describe()))
}

fn fallback(text: String) -> Record {
    let mut record = Record::new();
    record.insert(FALLBACK_COLUMN.to_string(), Value::String(text));
    record
}

// =============================================================================
// Built-in shapes
// =============================================================================

impl RowContainer for QueryResult {
    fn rows(&self) -> Option<Vec<Record>> {
        Some(self.to_maps())
    }

    fn describe(&self) -> String {
        format!("QueryResult({} rows)", self.row_count())
    }
}

impl RowLike for Row {
    fn to_mapping(&self) -> Option<Record> {
        Some(self.to_map())
    }

    fn describe(&self) -> String {
        let cells: Vec<String> = self
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.to_simple_string()))
            .collect();
        cells.join(", ")
    }
}

impl RowLike for Vec<(String, Value)> {
    fn pairs(&self) -> Option<Vec<(String, Value)>> {
        Some(self.clone())
    }

    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

/// Exposes the public fields of any serializable struct as a row.
///
/// ```
/// use kgraph_distributed::federation::{SerializedFields, normalize_row};
/// use kgraph_cypher::Value;
///
/// #[derive(serde::Serialize)]
/// struct Hit { name: String, score: i64 }
///
/// let row = normalize_row(&SerializedFields(Hit { name: "a".into(), score: 3 }));
/// assert_eq!(row["score"], Value::Int(3));
/// ```
#[derive(Debug, Clone)]
pub struct SerializedFields<T>(pub T);

impl<T: Serialize + Send> RowLike for SerializedFields<T> {
    fn fields(&self) -> Option<Record> {
        match serde_json::to_value(&self.0).ok()? {
            serde_json::Value::Object(obj) => Some(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| std::any::type_name::<T>().to_string())
    }
}
