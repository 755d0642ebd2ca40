//! Query result types.
//!
//! Defines the structure for query results returned to the caller.

use kgraph_core::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// =============================================================================
// Value
// =============================================================================

/// A value in a query result.
///
/// Bound nodes and relationships are materialized as [`Value::Map`]s so a
/// result row is plain data with no references back into the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
    /// List of values
    List(Vec<Value>),
    /// Map of key-value pairs, key-sorted
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns true if the value is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get the value as an i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get the value as an f64, widening integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get the value as a map.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Converts the value to a JSON-compatible serde_json::Value.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(l) => serde_json::Value::Array(l.iter().map(|v| v.to_json()).collect()),
            Value::Map(m) => {
                let obj: serde_json::Map<String, serde_json::Value> =
                    m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();
                serde_json::Value::Object(obj)
            }
        }
    }

    /// Builds a value from JSON. Numbers that fit in i64 stay integers.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts the value to a simple string representation for display.
    pub fn to_simple_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::List(l) => {
                let items: Vec<String> = l.iter().map(|v| v.to_simple_string()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Map(m) => {
                let items: Vec<String> = m
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_simple_string()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
        }
    }
}

impl From<&PropertyValue> for Value {
    fn from(pv: &PropertyValue) -> Self {
        match pv {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Int(i) => Value::Int(*i),
            PropertyValue::Float(f) => Value::Float(*f),
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(pv: PropertyValue) -> Self {
        Value::from(&pv)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Renders the value as a Cypher literal.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::List(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter(), |f, v| write!(f, "{v}"))?;
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                write_joined(f, entries.iter(), |f, (k, v)| write!(f, "{k}: {v}"))?;
                f.write_str("}")
            }
        }
    }
}

fn write_joined<I, F>(f: &mut fmt::Formatter<'_>, items: I, mut each: F) -> fmt::Result
where
    I: Iterator,
    F: FnMut(&mut fmt::Formatter<'_>, I::Item) -> fmt::Result,
{
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        each(f, item)?;
    }
    Ok(())
}

// =============================================================================
// Row
// =============================================================================

/// A single row in a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Column values indexed by column name
    values: HashMap<String, Value>,
    /// Column order for display
    column_order: Vec<String>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            column_order: Vec::new(),
        }
    }

    /// Sets a value for a column.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        let col = column.into();
        if !self.column_order.contains(&col) {
            self.column_order.push(col.clone());
        }
        self.values.insert(col, value);
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[String] {
        &self.column_order
    }

    /// Returns an iterator over (column, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.column_order
            .iter()
            .filter_map(|col| self.values.get(col).map(|v| (col.as_str(), v)))
    }

    /// Copies the row into a key-sorted map.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// QueryResult
// =============================================================================

/// The result of a query execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    columns: Vec<String>,
    /// Result rows
    rows: Vec<Row>,
    /// Execution statistics (e.g. "rows_matched")
    stats: HashMap<String, String>,
}

impl QueryResult {
    /// Creates an empty result with specified columns.
    #[inline]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            stats: HashMap::new(),
        }
    }

    /// Creates a result with pre-allocated capacity for rows.
    #[inline]
    pub fn with_capacity(columns: Vec<String>, capacity: usize) -> Self {
        Self {
            columns,
            rows: Vec::with_capacity(capacity),
            stats: HashMap::new(),
        }
    }

    /// Adds a statistic.
    pub fn add_stat(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.stats.insert(key.into(), value.into());
    }

    /// Gets a statistic.
    pub fn get_stat(&self, key: &str) -> Option<&String> {
        self.stats.get(key)
    }

    /// Adds a row to the result.
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Returns the column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Converts to key-sorted maps, one per row.
    pub fn to_maps(&self) -> Vec<BTreeMap<String, Value>> {
        self.rows.iter().map(Row::to_map).collect()
    }
}

/// One `{column: value}` line per row, then a row count.
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            f.write_str("{")?;
            write_joined(f, self.columns.iter(), |f, col| match row.get(col) {
                Some(value) => write!(f, "{col}: {value}"),
                None => write!(f, "{col}: null"),
            })?;
            f.write_str("}\n")?;
        }
        write!(f, "({} rows)", self.rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_keeps_column_order() {
        let mut row = Row::new();
        row.set("b", Value::Int(1));
        row.set("a", Value::from("x"));
        row.set("b", Value::Int(2));
        assert_eq!(row.columns(), &["b".to_string(), "a".to_string()]);
        assert_eq!(row.get("b"), Some(&Value::Int(2)));
        let pairs: Vec<_> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(pairs, vec!["b", "a"]);
        assert_eq!(row.to_map().keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_value_json_conversions() {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from("Alice"));
        map.insert("age".to_string(), Value::Int(30));
        let v = Value::Map(map);
        let json = v.to_json();
        assert_eq!(json["name"], "Alice");
        assert_eq!(Value::from_json(&json), v);
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_value_serde_untagged() {
        let v = Value::List(vec![Value::Int(1), Value::Null, Value::from("s")]);
        let text = serde_json::to_string(&v).unwrap();
        assert_eq!(text, r#"[1,null,"s"]"#);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_from_property_value() {
        let pv = PropertyValue::List(vec![PropertyValue::Int(1), PropertyValue::from("x")]);
        assert_eq!(
            Value::from(pv),
            Value::List(vec![Value::Int(1), Value::from("x")])
        );
    }

    #[test]
    fn test_value_display_is_cypher_literal() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::from("it's").to_string(), "'it\\'s'");
        let map = Value::Map([("k".to_string(), Value::List(vec![Value::Int(1), Value::Bool(true)]))].into());
        assert_eq!(map.to_string(), "{k: [1, true]}");
    }

    #[test]
    fn test_query_result_display() {
        let mut result = QueryResult::new(vec!["name".into()]);
        let mut row = Row::new();
        row.set("name", Value::from("Alice"));
        result.add_row(row);
        assert_eq!(result.to_string(), "{name: 'Alice'}\n(1 rows)");
        assert_eq!(result.row_count(), 1);
    }
}
