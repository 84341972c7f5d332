//! Typed cell values

use std::fmt;

use serde::Serialize;

/// Index of a [`ContainerHandle`](crate::container::ContainerHandle) in the
/// store's handle arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One (row, column) value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    /// No positional value was supplied at insert time
    Null,
    Text(String),
    Number(f64),
    Container(HandleId),
}

/// Lenient numeric coercion used for NUMBER columns and `sum(...)`
///
/// Empty input is `0`, anything unparsable is `NaN`.
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Loose equality between a stored scalar and a WHERE literal
///
/// Numbers compare numerically against the coerced literal, so `1` matches
/// both `"1"` and `"1.0"`. Text compares as-is.
pub fn loosely_equals(cell: &Cell, literal: &str) -> bool {
    match cell {
        Cell::Null => false,
        Cell::Text(s) => s == literal,
        Cell::Number(n) => *n == coerce_number(literal),
        // handles are matched by reference in the store
        Cell::Container(_) => false,
    }
}

/// Render a number the way it was most likely written (`1` rather than `1.0`)
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
