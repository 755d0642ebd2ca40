//! Query executor.
//!
//! Matches the query pattern through [`GraphBackend`] lookups, filters with
//! WHERE, then projects, sorts, deduplicates and pages the rows.

use crate::ast::{Direction, Expression, NodePattern, Pattern, Query, RelPattern};
use crate::cmp;
use crate::eval::{self, Bindings, Bound, Parameters};
use crate::result::{QueryResult, Row, Value};
use crate::{QueryError, Result};
use kgraph_core::{Entity, GraphBackend, Properties, PropertyValue, Relationship, entity_attribute};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Query executor bound to one graph backend.
pub struct Executor<'a, B: GraphBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: GraphBackend + ?Sized> Executor<'a, B> {
    /// Creates a new executor for the given backend.
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Executes a parsed query and returns the query result.
    pub fn execute(&self, query: &Query, params: Option<&Parameters>) -> Result<QueryResult> {
        let matches = self.match_pattern(&query.pattern, params)?;
        let matched = matches.len();

        let mut filtered = Vec::with_capacity(matches.len());
        for bindings in matches {
            let keep = match &query.where_clause {
                Some(predicate) => eval::is_true(predicate, &bindings, params)?,
                None => true,
            };
            if keep {
                filtered.push(bindings);
            }
        }

        let columns: Vec<String> = query
            .return_clause
            .items
            .iter()
            .map(|item| item.column_name())
            .collect();

        // Project each row and compute its sort keys while bindings are live
        let mut projected: Vec<(Vec<Value>, Vec<Value>)> = Vec::with_capacity(filtered.len());
        for bindings in &filtered {
            let values = query
                .return_clause
                .items
                .iter()
                .map(|item| eval::evaluate(&item.expression, bindings, params))
                .collect::<Result<Vec<_>>>()?;
            let keys = query
                .order_by
                .iter()
                .map(|key| self.sort_key(&key.expression, bindings, params, &columns, &values))
                .collect::<Result<Vec<_>>>()?;
            projected.push((values, keys));
        }

        if !query.order_by.is_empty() {
            projected.sort_by(|(_, a), (_, b)| {
                for ((x, y), item) in a.iter().zip(b.iter()).zip(&query.order_by) {
                    let ord = cmp::compare_for_ordering(x, y);
                    let ord = match item.direction {
                        crate::ast::SortDirection::Ascending => ord,
                        crate::ast::SortDirection::Descending => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        if query.return_clause.distinct {
            let mut seen = HashSet::new();
            projected.retain(|(values, _)| {
                let key = Value::List(values.clone()).to_json().to_string();
                seen.insert(key)
            });
        }

        let skip = query.skip.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        let page: Vec<Vec<Value>> = projected
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(values, _)| values)
            .collect();

        let mut result = QueryResult::with_capacity(columns.clone(), page.len());
        for values in page {
            let mut row = Row::new();
            for (column, value) in columns.iter().zip(values) {
                row.set(column.clone(), value);
            }
            result.add_row(row);
        }
        result.add_stat("rows_matched", matched.to_string());
        Ok(result)
    }

    /// ORDER BY may name a projected column (including an alias).
    fn sort_key(
        &self,
        expr: &Expression,
        bindings: &Bindings<'_>,
        params: Option<&Parameters>,
        columns: &[String],
        values: &[Value],
    ) -> Result<Value> {
        let text = expr.to_string();
        if let Some(pos) = columns.iter().position(|c| *c == text) {
            return Ok(values[pos].clone());
        }
        eval::evaluate(expr, bindings, params)
    }

    // =========================================================================
    // Pattern matching
    // =========================================================================

    fn match_pattern(&self, pattern: &Pattern, params: Option<&Parameters>) -> Result<Vec<Bindings<'a>>> {
        match pattern {
            Pattern::Node(node) => {
                let candidates = self.find_nodes(node, params)?;
                Ok(candidates
                    .into_iter()
                    .map(|entity| {
                        let mut bindings = Bindings::new();
                        bind(&mut bindings, node.variable.as_deref(), Bound::Node(entity));
                        bindings
                    })
                    .collect())
            }
            Pattern::Path {
                left,
                relationship,
                right,
            } => {
                let right_props = resolve_properties(&right.properties, params)?;
                let rel_props = resolve_properties(&relationship.properties, params)?;
                let mut out = Vec::new();

                for start in self.find_nodes(left, params)? {
                    for (rel, other_id) in self.expand(start, relationship) {
                        if !relationship_matches(rel, &rel_props) {
                            continue;
                        }
                        // The far endpoint may live in another partition. Without
                        // constraints on it, bind it by id so the edge still matches.
                        let Some(other) = self.backend.get_node(other_id) else {
                            let same_variable = right.variable.is_some() && right.variable == left.variable;
                            if right.labels.is_empty() && right_props.is_empty() && !same_variable {
                                let mut bindings = Bindings::new();
                                bind(&mut bindings, left.variable.as_deref(), Bound::Node(start));
                                bind(&mut bindings, relationship.variable.as_deref(), Bound::Relationship(rel));
                                bind(&mut bindings, right.variable.as_deref(), Bound::NodeRef(other_id));
                                out.push(bindings);
                            }
                            continue;
                        };
                        if !node_matches(other, &right.labels, &right_props) {
                            continue;
                        }
                        if right.variable.is_some()
                            && right.variable == left.variable
                            && other.id != start.id
                        {
                            continue;
                        }

                        let mut bindings = Bindings::new();
                        bind(&mut bindings, left.variable.as_deref(), Bound::Node(start));
                        bind(&mut bindings, relationship.variable.as_deref(), Bound::Relationship(rel));
                        bind(&mut bindings, right.variable.as_deref(), Bound::Node(other));
                        out.push(bindings);
                    }
                }
                Ok(out)
            }
        }
    }

    fn find_nodes(&self, node: &NodePattern, params: Option<&Parameters>) -> Result<Vec<&'a Entity>> {
        let labels: Vec<&str> = node.labels.iter().map(String::as_str).collect();
        let properties = resolve_properties(&node.properties, params)?;
        Ok(self.backend.find_nodes(&labels, &properties, None))
    }

    /// Relationships leaving `start` in the pattern's direction, paired
    /// with the id of the far endpoint.
    fn expand(&self, start: &Entity, pattern: &RelPattern) -> Vec<(&'a Relationship, &'a kgraph_core::EntityId)> {
        let types: Vec<&str> = pattern.types.iter().map(String::as_str).collect();
        let mut out = Vec::new();
        if matches!(pattern.direction, Direction::Outgoing | Direction::Both) {
            for rel in self.backend.get_relationships(Some(&start.id), None, &types, None) {
                out.push((rel, &rel.target_id));
            }
        }
        if matches!(pattern.direction, Direction::Incoming | Direction::Both) {
            for rel in self.backend.get_relationships(None, Some(&start.id), &types, None) {
                // A self-loop was already produced by the outgoing pass
                if pattern.direction == Direction::Both && rel.source_id == rel.target_id {
                    continue;
                }
                out.push((rel, &rel.source_id));
            }
        }
        out
    }
}

fn bind<'g>(bindings: &mut Bindings<'g>, variable: Option<&str>, bound: Bound<'g>) {
    if let Some(name) = variable {
        bindings.insert(name.to_string(), bound);
    }
}

fn node_matches(entity: &Entity, labels: &[String], properties: &Properties) -> bool {
    labels.iter().all(|label| entity.entity_type == *label)
        && properties
            .iter()
            .all(|(key, expected)| entity_attribute(entity, key).as_ref() == Some(expected))
}

fn relationship_matches(rel: &Relationship, properties: &Properties) -> bool {
    properties
        .iter()
        .all(|(key, expected)| rel.properties.get(key) == Some(expected))
}

/// Evaluates inline pattern properties (`{k: v}`) to concrete values.
fn resolve_properties(entries: &[(String, Expression)], params: Option<&Parameters>) -> Result<Properties> {
    let empty = Bindings::new();
    let mut properties = Properties::new();
    for (key, expr) in entries {
        let value = eval::evaluate(expr, &empty, params)?;
        let value = value_to_property(value).ok_or_else(|| {
            QueryError::ExecutionError(format!("property '{}' cannot be matched against a map", key))
        })?;
        properties.insert(key.clone(), value);
    }
    Ok(properties)
}

fn value_to_property(value: Value) -> Option<PropertyValue> {
    Some(match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(b),
        Value::Int(i) => PropertyValue::Int(i),
        Value::Float(f) => PropertyValue::Float(f),
        Value::String(s) => PropertyValue::String(s),
        Value::List(items) => PropertyValue::List(
            items
                .into_iter()
                .map(value_to_property)
                .collect::<Option<Vec<_>>>()?,
        ),
        Value::Map(_) => return None,
    })
}
