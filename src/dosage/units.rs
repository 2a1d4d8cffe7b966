//! Dose unit arithmetic. Conversions stay inside a unit family; asking for
//! a cross-family conversion (international units to mass, mass to volume)
//! is an error, never a guess.

use std::sync::LazyLock;

use regex::Regex;

use super::types::DosageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitFamily {
    /// Base factor: micrograms.
    Mass,
    /// Base factor: milliliters.
    Volume,
    /// Base factor: mg/mL. Percent w/v converts at 1 g/mL solvent density.
    Concentration,
    /// International/biological units; convertible only to themselves.
    Biological,
}

fn classify(unit: &str) -> Option<(UnitFamily, f64)> {
    let unit = unit.trim().to_lowercase();
    let entry = match unit.as_str() {
        "mcg" | "ug" | "µg" | "microgram" | "micrograms" => (UnitFamily::Mass, 1.0),
        "mg" | "milligram" | "milligrams" => (UnitFamily::Mass, 1_000.0),
        "g" | "gram" | "grams" => (UnitFamily::Mass, 1_000_000.0),
        "kg" => (UnitFamily::Mass, 1_000_000_000.0),
        "ml" | "milliliter" | "milliliters" => (UnitFamily::Volume, 1.0),
        "dl" => (UnitFamily::Volume, 100.0),
        "l" | "liter" | "liters" => (UnitFamily::Volume, 1_000.0),
        "mcg/ml" => (UnitFamily::Concentration, 0.001),
        "mg/ml" => (UnitFamily::Concentration, 1.0),
        "mg/l" => (UnitFamily::Concentration, 0.001),
        "g/l" => (UnitFamily::Concentration, 1.0),
        "%" | "percent" => (UnitFamily::Concentration, 10.0),
        "unit" | "units" | "iu" | "ui" | "u" => (UnitFamily::Biological, 1.0),
        _ => return None,
    };
    Some(entry)
}

/// Convert `value` from one dose unit to another.
///
/// Mass, volume and concentration units convert within their family;
/// biological units (insulin units, IU) have no mass equivalence and only
/// convert to themselves.
pub fn convert_dosage_units(value: f64, from: &str, to: &str) -> Result<f64, DosageError> {
    let conversion_error = || DosageError::UnitConversion {
        from: from.to_string(),
        to: to.to_string(),
    };

    let (from_family, from_factor) = classify(from).ok_or_else(conversion_error)?;
    let (to_family, to_factor) = classify(to).ok_or_else(conversion_error)?;
    if from_family != to_family {
        return Err(conversion_error());
    }
    Ok(value * from_factor / to_factor)
}

/// Scheduled administrations per day for a frequency label. Protocol and
/// as-needed frequencies have no fixed daily count and map to 1.
pub(crate) fn doses_per_day(frequency: &str) -> f64 {
    match frequency {
        "once_daily" | "every_24_hours" => 1.0,
        "twice_daily" | "every_12_hours" => 2.0,
        "three_times_daily" | "every_8_hours" => 3.0,
        "four_times_daily" | "every_6_hours" => 4.0,
        "every_4_hours" => 6.0,
        "every_36_hours" => 2.0 / 3.0,
        "every_21_days" => 1.0 / 21.0,
        _ => 1.0,
    }
}

/// Leading drug-name pattern (compiled once via LazyLock).
static LEADING_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z'\-]*(?:\s+[A-Za-z][A-Za-z'\-]*)*)").unwrap()
});

/// Extract the drug name from a free-text medication entry such as
/// "warfarin 5mg daily" or "Coumadin 5 mg". Returns `None` when the entry
/// does not start with a name.
pub(crate) fn medication_name_of(entry: &str) -> Option<&str> {
    LEADING_NAME_RE
        .captures(entry)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
}
