//! Advisory range checks for geotechnical parameters.
//!
//! Checks never block anything: the result is a message for the caller.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Typical ranges in kPa, inclusive.
pub const PARAMETER_RANGES: &[(&str, f64, f64)] = &[
    ("cohesion", 0.0, 50.0),
    ("bearing_capacity", 100.0, 300.0),
];

/// Result of a parameter check.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterCheck {
    /// Every recognized parameter is inside its range.
    WithinRange,
    /// The first recognized parameter found outside its range.
    OutOfRange {
        /// Parameter name
        name: String,
        /// Supplied value in kPa
        value: f64,
        /// Lower bound of the typical range
        min: f64,
        /// Upper bound of the typical range
        max: f64,
    },
}

impl ParameterCheck {
    /// Whether the check produced a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

impl fmt::Display for ParameterCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithinRange => f.write_str("Parameters within expected ranges."),
            Self::OutOfRange {
                name,
                value,
                min,
                max,
            } => write!(
                f,
                "Warning: {name} ({value} kPa) outside typical range ({min}, {max})."
            ),
        }
    }
}

fn range_for(name: &str) -> Option<(f64, f64)> {
    PARAMETER_RANGES
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(_, min, max)| (min, max))
}

/// Check parameters in caller order; the first out-of-range recognized one wins.
///
/// Unknown names are ignored.
pub fn validate_parameters<I, S>(params: I) -> ParameterCheck
where
    I: IntoIterator<Item = (S, f64)>,
    S: AsRef<str>,
{
    for (name, value) in params {
        let name = name.as_ref();
        if let Some((min, max)) = range_for(name) {
            if value < min || value > max {
                return ParameterCheck::OutOfRange {
                    name: name.to_string(),
                    value,
                    min,
                    max,
                };
            }
        }
    }
    ParameterCheck::WithinRange
}

static PARAM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([a-z][a-z_]*(?:[ \t][a-z_]+)?)(?:\s*[:=]\s*|[ \t]+)(-?\d+(?:\.\d+)?)")
        .unwrap_or_else(|e| unreachable!("parameter pattern is valid: {e}"))
});

/// Pull `name: value`, `name = value` and `name value` pairs out of free text.
///
/// Names are lower-cased with spaces turned into underscores; a name ending in
/// a recognized parameter (`soil cohesion`) is reported as that parameter.
pub fn scan_parameters(text: &str) -> Vec<(String, f64)> {
    PARAM_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let raw = caps.get(1)?.as_str();
            let value = caps.get(2)?.as_str().parse::<f64>().ok()?;
            let mut name = raw.to_ascii_lowercase().replace([' ', '\t'], "_");
            if let Some((known, _, _)) = PARAMETER_RANGES
                .iter()
                .find(|(k, _, _)| name.ends_with(&format!("_{k}")))
            {
                name = (*known).to_string();
            }
            Some((name, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cohesion_out_of_range() {
        let check = validate_parameters([("cohesion", 60.0)]);
        assert!(check.is_warning());
        assert_eq!(
            check.to_string(),
            "Warning: cohesion (60 kPa) outside typical range (0, 50)."
        );
    }

    #[test]
    fn test_within_ranges() {
        let check = validate_parameters([("cohesion", 30.0), ("bearing_capacity", 200.0)]);
        assert_eq!(check, ParameterCheck::WithinRange);
        assert_eq!(check.to_string(), "Parameters within expected ranges.");
    }

    #[test]
    fn test_unknown_parameter_ignored() {
        assert_eq!(
            validate_parameters([("unknown_param", 9999.0)]),
            ParameterCheck::WithinRange
        );
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(!validate_parameters([("cohesion", 0.0), ("cohesion", 50.0)]).is_warning());
        assert!(!validate_parameters([("bearing_capacity", 100.0)]).is_warning());
        assert!(validate_parameters([("bearing_capacity", 99.5)]).is_warning());
    }

    #[test]
    fn test_first_out_of_range_in_caller_order() {
        let check = validate_parameters([("bearing_capacity", 500.0), ("cohesion", 80.0)]);
        assert!(check.to_string().contains("bearing_capacity (500 kPa)"));
        assert!(check.to_string().contains("(100, 300)"));

        let check = validate_parameters([("cohesion", 80.0), ("bearing_capacity", 500.0)]);
        assert!(check.to_string().starts_with("Warning: cohesion"));
    }

    #[test]
    fn test_fractional_values() {
        let check = validate_parameters([("cohesion", 50.5)]);
        assert_eq!(
            check.to_string(),
            "Warning: cohesion (50.5 kPa) outside typical range (0, 50)."
        );
    }

    #[test]
    fn test_scan_parameters() {
        let found = scan_parameters("cohesion: 25 kPa, bearing capacity = 350, soil cohesion 12.5");
        assert_eq!(
            found,
            vec![
                ("cohesion".to_string(), 25.0),
                ("bearing_capacity".to_string(), 350.0),
                ("cohesion".to_string(), 12.5),
            ]
        );
        assert!(validate_parameters(found).is_warning());
    }

    #[test]
    fn test_scan_parameters_no_numbers() {
        assert!(scan_parameters("dense glacial till, no groundwater").is_empty());
    }
}
