//! Expression evaluation.
//!
//! Evaluates expressions against the entities and relationships bound by a
//! MATCH pattern. Predicates use three-valued logic: a comparison involving
//! null yields null, and WHERE keeps only rows that evaluate to `true`.

use crate::ast::{ComparisonOp, Expression, Literal};
use crate::cmp;
use crate::result::Value;
use crate::{QueryError, Result};
use kgraph_core::{Entity, EntityId, Relationship, entity_attribute};
use std::collections::{BTreeMap, HashMap};

/// Parameters for query execution.
pub type Parameters = HashMap<String, Value>;

/// A graph element bound to a pattern variable.
#[derive(Debug, Clone, Copy)]
pub enum Bound<'g> {
    Node(&'g Entity),
    Relationship(&'g Relationship),
    /// Far endpoint of a relationship whose entity is held elsewhere.
    /// Only the id is known; every other attribute is null.
    NodeRef(&'g EntityId),
}

/// Variable bindings for one candidate match.
pub type Bindings<'g> = HashMap<String, Bound<'g>>;

/// Materializes an entity as a result value.
pub fn node_value(entity: &Entity) -> Value {
    let mut map = BTreeMap::new();
    map.insert("id".to_string(), Value::from(entity.id.as_str()));
    map.insert("name".to_string(), Value::from(entity.name.as_str()));
    map.insert("type".to_string(), Value::from(entity.entity_type.as_str()));
    map.insert("properties".to_string(), properties_value(&entity.properties));
    Value::Map(map)
}

/// Materializes a node known only by id.
pub fn node_ref_value(id: &EntityId) -> Value {
    Value::Map([("id".to_string(), Value::from(id.as_str()))].into())
}

/// Materializes a relationship as a result value.
pub fn relationship_value(rel: &Relationship) -> Value {
    let mut map = BTreeMap::new();
    map.insert("id".to_string(), Value::from(rel.id.as_str()));
    map.insert("type".to_string(), Value::from(rel.relation_type.as_str()));
    map.insert("source".to_string(), Value::from(rel.source_id.as_str()));
    map.insert("target".to_string(), Value::from(rel.target_id.as_str()));
    map.insert("properties".to_string(), properties_value(&rel.properties));
    Value::Map(map)
}

fn properties_value(props: &kgraph_core::Properties) -> Value {
    Value::Map(props.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
}

fn relationship_attribute(rel: &Relationship, key: &str) -> Value {
    match key {
        "id" => Value::from(rel.id.as_str()),
        "type" => Value::from(rel.relation_type.as_str()),
        "source" => Value::from(rel.source_id.as_str()),
        "target" => Value::from(rel.target_id.as_str()),
        _ => rel.properties.get(key).map(Value::from).unwrap_or(Value::Null),
    }
}

fn lookup<'g>(bindings: &Bindings<'g>, variable: &str) -> Result<Bound<'g>> {
    bindings
        .get(variable)
        .copied()
        .ok_or_else(|| QueryError::VariableNotFound(variable.to_string()))
}

/// Evaluates an expression given bindings and optional parameters.
pub fn evaluate(expr: &Expression, bindings: &Bindings<'_>, params: Option<&Parameters>) -> Result<Value> {
    match expr {
        Expression::Literal(lit) => Ok(literal_to_value(lit)),

        Expression::Parameter(name) => params
            .and_then(|p| p.get(name))
            .cloned()
            .ok_or_else(|| QueryError::ParameterNotFound(name.clone())),

        Expression::Variable(name) => Ok(match lookup(bindings, name)? {
            Bound::Node(entity) => node_value(entity),
            Bound::Relationship(rel) => relationship_value(rel),
            Bound::NodeRef(id) => node_ref_value(id),
        }),

        Expression::Property { variable, property } => Ok(match lookup(bindings, variable)? {
            Bound::Node(entity) => entity_attribute(entity, property)
                .map(Value::from)
                .unwrap_or(Value::Null),
            Bound::Relationship(rel) => relationship_attribute(rel, property),
            Bound::NodeRef(id) if property == "id" => Value::from(id.as_str()),
            Bound::NodeRef(_) => Value::Null,
        }),

        Expression::Function { name, args } => evaluate_function(name, args, bindings, params),

        Expression::List(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| evaluate(item, bindings, params))
                .collect::<Result<_>>()?,
        )),

        Expression::Comparison { left, op, right } => {
            let left_val = evaluate(left, bindings, params)?;
            let right_val = evaluate(right, bindings, params)?;
            Ok(compare_values(&left_val, *op, &right_val))
        }

        Expression::IsNull { expr, negated } => {
            let is_null = evaluate(expr, bindings, params)?.is_null();
            Ok(Value::Bool(is_null != *negated))
        }

        Expression::And(left, right) => {
            let l = truth(&evaluate(left, bindings, params)?);
            if l == Some(false) {
                return Ok(Value::Bool(false));
            }
            let r = truth(&evaluate(right, bindings, params)?);
            Ok(match (l, r) {
                (_, Some(false)) => Value::Bool(false),
                (Some(true), Some(true)) => Value::Bool(true),
                _ => Value::Null,
            })
        }

        Expression::Or(left, right) => {
            let l = truth(&evaluate(left, bindings, params)?);
            if l == Some(true) {
                return Ok(Value::Bool(true));
            }
            let r = truth(&evaluate(right, bindings, params)?);
            Ok(match (l, r) {
                (_, Some(true)) => Value::Bool(true),
                (Some(false), Some(false)) => Value::Bool(false),
                _ => Value::Null,
            })
        }

        Expression::Not(inner) => Ok(match truth(&evaluate(inner, bindings, params)?) {
            Some(b) => Value::Bool(!b),
            None => Value::Null,
        }),
    }
}

/// Evaluates a predicate; only `true` passes.
pub fn is_true(expr: &Expression, bindings: &Bindings<'_>, params: Option<&Parameters>) -> Result<bool> {
    Ok(truth(&evaluate(expr, bindings, params)?) == Some(true))
}

fn evaluate_function(
    name: &str,
    args: &[Expression],
    bindings: &Bindings<'_>,
    params: Option<&Parameters>,
) -> Result<Value> {
    let lower = name.to_ascii_lowercase();

    match lower.as_str() {
        "id" | "type" | "labels" => {
            let Expression::Variable(variable) = single_arg(name, args)? else {
                return Err(QueryError::ExecutionError(format!(
                    "{}() expects a pattern variable",
                    name
                )));
            };
            let bound = lookup(bindings, variable)?;
            Ok(match (lower.as_str(), bound) {
                ("id", Bound::Node(e)) => Value::from(e.id.as_str()),
                ("id", Bound::Relationship(r)) => Value::from(r.id.as_str()),
                ("type", Bound::Relationship(r)) => Value::from(r.relation_type.as_str()),
                ("type", Bound::Node(e)) => Value::from(e.entity_type.as_str()),
                ("labels", Bound::Node(e)) => Value::List(vec![Value::from(e.entity_type.as_str())]),
                ("id", Bound::NodeRef(id)) => Value::from(id.as_str()),
                ("type" | "labels", Bound::NodeRef(_)) => Value::Null,
                _ => {
                    return Err(QueryError::ExecutionError(format!(
                        "{}() is not defined for relationships",
                        name
                    )));
                }
            })
        }
        "tolower" | "toupper" => {
            let value = evaluate(single_arg(name, args)?, bindings, params)?;
            Ok(match value {
                Value::String(s) if lower == "tolower" => Value::String(s.to_lowercase()),
                Value::String(s) => Value::String(s.to_uppercase()),
                Value::Null => Value::Null,
                other => {
                    return Err(QueryError::ExecutionError(format!(
                        "{}() expects a string, got {}",
                        name, other
                    )));
                }
            })
        }
        "size" => {
            let value = evaluate(single_arg(name, args)?, bindings, params)?;
            Ok(match value {
                Value::String(s) => Value::Int(s.chars().count() as i64),
                Value::List(l) => Value::Int(l.len() as i64),
                Value::Null => Value::Null,
                other => {
                    return Err(QueryError::ExecutionError(format!(
                        "size() expects a string or list, got {}",
                        other
                    )));
                }
            })
        }
        _ => Err(QueryError::UnknownFunction(name.to_string())),
    }
}

fn single_arg<'e>(name: &str, args: &'e [Expression]) -> Result<&'e Expression> {
    match args {
        [arg] => Ok(arg),
        _ => Err(QueryError::ExecutionError(format!(
            "{}() takes exactly one argument, got {}",
            name,
            args.len()
        ))),
    }
}

fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(f) => Value::Float(*f),
        Literal::String(s) => Value::String(s.clone()),
    }
}

/// Truth value of a predicate result; `None` is unknown.
fn truth(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

/// Compares two values with the given operator.
fn compare_values(left: &Value, op: ComparisonOp, right: &Value) -> Value {
    if op == ComparisonOp::In {
        return match right {
            Value::List(items) if !left.is_null() => {
                Value::Bool(items.iter().any(|item| cmp::values_equal(left, item)))
            }
            _ => Value::Null,
        };
    }
    if left.is_null() || right.is_null() {
        return Value::Null;
    }

    let result = match op {
        ComparisonOp::Eq => Some(cmp::values_equal(left, right)),
        ComparisonOp::Neq => Some(!cmp::values_equal(left, right)),
        ComparisonOp::Lt => cmp::partial_compare(left, right).map(|o| o.is_lt()),
        ComparisonOp::Le => cmp::partial_compare(left, right).map(|o| o.is_le()),
        ComparisonOp::Gt => cmp::partial_compare(left, right).map(|o| o.is_gt()),
        ComparisonOp::Ge => cmp::partial_compare(left, right).map(|o| o.is_ge()),
        ComparisonOp::Contains | ComparisonOp::StartsWith | ComparisonOp::EndsWith => {
            match (left, right) {
                (Value::String(l), Value::String(r)) => Some(match op {
                    ComparisonOp::Contains => l.contains(r.as_str()),
                    ComparisonOp::StartsWith => l.starts_with(r.as_str()),
                    _ => l.ends_with(r.as_str()),
                }),
                _ => None,
            }
        }
        ComparisonOp::In => None,
    };
    result.map(Value::Bool).unwrap_or(Value::Null)
}
