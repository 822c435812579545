//! Best-effort number extraction from label details.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfrom\s*(\d+)\s*to\s*(\d+)\b").expect("static regex"));

// A whole item that is only a number or only a range, as in `[2, From 6 to 66]`.
static BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(\d+)|from\s*(\d+)\s*to\s*(\d+))$").expect("static regex")
});

// Digits at the start of the text, after optional non-letter prefixes such as `~` or `>`.
static LEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\p{L}\d]*(\d+)").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Quantity {
    Exact(u64),
    Range { min: u64, max: u64 },
}

impl Quantity {
    pub fn min(&self) -> u64 {
        match *self {
            Self::Exact(n) => n,
            Self::Range { min, .. } => min,
        }
    }

    pub fn max(&self) -> u64 {
        match *self {
            Self::Exact(n) => n,
            Self::Range { max, .. } => max,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range { min, max } => write!(f, "{min}-{max}"),
        }
    }
}

/// Scans `text` for a quantity.
///
/// `From 6 to 66` is a range; otherwise the leading integer is taken
/// (`50`, `~1000 shots`). Text that starts with a word yields `None`.
pub fn scan_quantity(text: &str) -> Option<Quantity> {
    let text = text.trim();
    if let Some(caps) = RANGE.captures(text) {
        return range(&caps[1], &caps[2]);
    }
    LEADING
        .captures(text)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .map(Quantity::Exact)
}

/// Reads `text` as a quantity only when it holds nothing else.
///
/// `32` and `From 6 to 66` qualify; `32 qubits` and `~1000` do not.
pub fn bare_quantity(text: &str) -> Option<Quantity> {
    let caps = BARE.captures(text.trim())?;
    match (caps.get(1), caps.get(2), caps.get(3)) {
        (Some(n), _, _) => n.as_str().parse().ok().map(Quantity::Exact),
        (None, Some(a), Some(b)) => range(a.as_str(), b.as_str()),
        _ => None,
    }
}

fn range(a: &str, b: &str) -> Option<Quantity> {
    let a = a.parse::<u64>().ok()?;
    let b = b.parse::<u64>().ok()?;
    Some(Quantity::Range {
        min: a.min(b),
        max: a.max(b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_integers() {
        assert_eq!(scan_quantity("50"), Some(Quantity::Exact(50)));
        assert_eq!(scan_quantity(" 30 mutants"), Some(Quantity::Exact(30)));
        assert_eq!(scan_quantity("~1000"), Some(Quantity::Exact(1000)));
        assert_eq!(scan_quantity("QMutPy"), None);
        assert_eq!(scan_quantity("QMutPy3"), None);
        assert_eq!(scan_quantity(""), None);
    }

    #[test]
    fn ranges_are_ordered() {
        assert_eq!(
            scan_quantity("From 6 to 66"),
            Some(Quantity::Range { min: 6, max: 66 })
        );
        assert_eq!(
            scan_quantity("from 40 TO 4"),
            Some(Quantity::Range { min: 4, max: 40 })
        );
    }

    #[test]
    fn bare_quantities_reject_surrounding_text() {
        assert_eq!(bare_quantity(" 32 "), Some(Quantity::Exact(32)));
        assert_eq!(
            bare_quantity("From 66 to 6"),
            Some(Quantity::Range { min: 6, max: 66 })
        );
        assert_eq!(bare_quantity("32 qubits"), None);
        assert_eq!(bare_quantity("~1000"), None);
        assert_eq!(bare_quantity("Qiskit"), None);
    }
}
