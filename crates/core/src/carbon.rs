//! Carbon-footprint estimate from home-audit answers.
//!
//! A pure table lookup: each audit answer selects an annual emission figure
//! (kg CO2e) from a fixed table, summed per category. Absent and unrecognized
//! answers fall back to the same per-question default.

use serde::Serialize;

use crate::record::{FieldValue, Record};

const FRIDGE_AGE: &[(&str, f64)] = &[("old", 450.0), ("medium", 250.0), ("new", 100.0)];
const INSULATION: &[(&str, f64)] = &[("poor", 1000.0), ("average", 500.0), ("good", 100.0)];
const HVAC_AGE: &[(&str, f64)] = &[("old", 600.0), ("medium", 300.0), ("new", 100.0)];
const WATER_HEATER: &[(&str, f64)] = &[
    ("electric_storage", 600.0),
    ("gas_storage", 300.0),
    ("heat_pump_wh", 150.0),
];
const WINDOW_TYPE: &[(&str, f64)] = &[("single", 350.0), ("double", 100.0)];

const DRYER: f64 = 400.0;
const DISHWASHER: f64 = 150.0;
const SOLAR_OFFSET: f64 = -2000.0;

/// Per-category annual emissions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emissions {
    pub appliances: f64,
    pub heating_cooling: f64,
    pub water_heater: f64,
    pub windows: f64,
    pub solar: f64,
    pub total: f64,
}

/// Compute emissions for one set of audit answers.
pub fn calculate_emissions(answers: &Record) -> Emissions {
    let appliances = lookup(answers, "fridge_age", FRIDGE_AGE, 100.0)
        + flag(answers, "has_dryer", DRYER)
        + flag(answers, "has_dishwasher", DISHWASHER);
    let heating_cooling = lookup(answers, "insulation", INSULATION, 100.0)
        + lookup(answers, "hvac_age", HVAC_AGE, 100.0);
    let water_heater = lookup(answers, "water_heater", WATER_HEATER, 150.0);
    let windows = lookup(answers, "window_type", WINDOW_TYPE, 100.0);
    let solar = flag(answers, "has_solar", SOLAR_OFFSET);

    Emissions {
        appliances,
        heating_cooling,
        water_heater,
        windows,
        solar,
        total: appliances + heating_cooling + water_heater + windows + solar,
    }
}

fn lookup(answers: &Record, key: &str, table: &[(&str, f64)], fallback: f64) -> f64 {
    answers
        .get(key)
        .and_then(FieldValue::as_str)
        .and_then(|answer| table.iter().find(|(name, _)| *name == answer))
        .map_or(fallback, |(_, value)| *value)
}

/// `value` when the answer is truthy, zero otherwise (missing means "no").
fn flag(answers: &Record, key: &str, value: f64) -> f64 {
    let truthy = match answers.get(key) {
        Some(FieldValue::Bool(b)) => *b,
        Some(FieldValue::Number(n)) => *n == 1.0,
        Some(FieldValue::Text(s)) => {
            matches!(s.to_ascii_lowercase().as_str(), "true" | "yes" | "1" | "on")
        }
        _ => false,
    };
    if truthy { value } else { 0.0 }
}
