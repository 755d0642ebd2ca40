//! Value comparison utilities.
//!
//! Centralized comparisons used for WHERE predicates and ORDER BY.

use crate::result::Value;
use std::cmp::Ordering;

// =============================================================================
// Ordering Comparison (for sorting)
// =============================================================================

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Map(_) => 0,
        Value::List(_) => 1,
        Value::String(_) => 2,
        Value::Bool(_) => 3,
        Value::Int(_) | Value::Float(_) => 4,
        Value::Null => 5,
    }
}

/// Total order used by ORDER BY.
///
/// Values of different kinds order by kind; numbers compare across
/// Int/Float. Null sorts after everything else.
pub fn compare_for_ordering(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ord = compare_for_ordering(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Map(a), Value::Map(b)) => {
            for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                let ord = ka.cmp(kb).then_with(|| compare_for_ordering(va, vb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

// =============================================================================
// Predicate Comparisons
// =============================================================================

/// Checks if two values are equal.
///
/// Handles cross-type numeric comparisons (Int vs Float).
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        _ => left == right,
    }
}

/// Compares two values for `<`, `<=`, `>`, `>=`.
///
/// Returns `None` when the pair is not comparable (mixed kinds or null).
pub fn partial_compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_cross_type() {
        assert!(values_equal(&Value::Int(2), &Value::Float(2.0)));
        assert_eq!(
            partial_compare(&Value::Int(1), &Value::Float(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(partial_compare(&Value::Int(1), &Value::from("1")), None);
    }

    #[test]
    fn test_null_sorts_last() {
        let mut values = vec![Value::Null, Value::Int(3), Value::Int(1)];
        values.sort_by(compare_for_ordering);
        assert_eq!(values, vec![Value::Int(1), Value::Int(3), Value::Null]);
    }

    #[test]
    fn test_strings_order() {
        assert_eq!(
            compare_for_ordering(&Value::from("Alice"), &Value::from("Bob")),
            Ordering::Less
        );
    }
}
