//! Validation of loosely-typed log JSON into [`TelemetryLog`].
//!
//! Every field is checked for presence and type. The first violation aborts
//! normalization; nothing is dropped or coerced silently.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::analyzers::error::ValidationError;
use crate::analyzers::types::{Event, Sample, TelemetryLog, VehicleInfo};

/// Normalizes a whole raw log: `{ "vehicle": {...}, "logs": [...] }`.
///
/// `samples` is accepted as the array key when `logs` is absent.
pub fn normalize_log(raw: &Value) -> Result<TelemetryLog, ValidationError> {
    let root = raw
        .as_object()
        .ok_or_else(|| ValidationError::log("$", "must be a JSON object"))?;

    let vehicle = root
        .get("vehicle")
        .ok_or_else(|| ValidationError::log("vehicle", "is missing"))?;
    let vehicle = normalize_vehicle(vehicle)?;

    let entries = match root.get("logs").or_else(|| root.get("samples")) {
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ValidationError::log("logs", "must be an array")),
        None => return Err(ValidationError::log("logs", "is missing")),
    };

    let mut samples = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let sample = normalize_sample(index, entry)?;

        if let Some(prev) = samples.last() {
            check_continuity(index, prev, &sample);
        }
        samples.push(sample);
    }

    debug!(vin = %vehicle.vin, samples = samples.len(), "Log normalized");
    Ok(TelemetryLog { vehicle, samples })
}

/// Validates the `vehicle` object.
pub fn normalize_vehicle(raw: &Value) -> Result<VehicleInfo, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::log("vehicle", "must be an object"))?;

    let vin = match obj.get("vin") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => return Err(ValidationError::log("vehicle.vin", "is empty")),
        Some(_) => return Err(ValidationError::log("vehicle.vin", "must be a string")),
        None => return Err(ValidationError::log("vehicle.vin", "is missing")),
    };

    let design_capacity_kwh = positive(obj, "design_capacity_kwh")?;
    let nominal_pack_voltage = positive(obj, "nominal_pack_voltage")?;

    Ok(VehicleInfo {
        vin,
        make: optional_string(obj, "make")?,
        model: optional_string(obj, "model")?,
        year: optional_integer(obj, "year")?,
        design_capacity_kwh,
        nominal_pack_voltage,
    })
}

/// Validates one raw log entry at position `index`.
pub fn normalize_sample(index: usize, raw: &Value) -> Result<Sample, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ValidationError::sample(index, "$", "must be an object"))?;

    let timestamp = parse_timestamp(index, obj.get("ts"))?;

    let event = match obj.get("event") {
        Some(Value::String(s)) => Event::from_literal(s).ok_or_else(|| {
            ValidationError::sample(
                index,
                "event",
                format!("unknown event `{s}` (expected drive, charge or rest)"),
            )
        })?,
        Some(_) => return Err(ValidationError::sample(index, "event", "must be a string")),
        None => return Err(ValidationError::sample(index, "event", "is missing")),
    };

    let soc = number(index, obj, "soc")?;
    if !(0.0..=100.0).contains(&soc) {
        return Err(ValidationError::sample(
            index,
            "soc",
            format!("{soc} is outside 0-100"),
        ));
    }

    Ok(Sample {
        timestamp,
        event,
        soc,
        energy_in_kwh: number(index, obj, "energy_in_kwh")?,
        pack_current: number(index, obj, "pack_current")?,
        cell_voltages: cell_array(index, obj, "cell_voltages")?,
        cell_temps_c: cell_array(index, obj, "cell_temps_c")?,
    })
}

fn check_continuity(index: usize, prev: &Sample, sample: &Sample) {
    if sample.timestamp < prev.timestamp {
        warn!(
            index,
            previous = %prev.timestamp,
            current = %sample.timestamp,
            "Sample timestamp goes backwards"
        );
    }
    if sample.cell_voltages.len() != prev.cell_voltages.len() {
        warn!(
            index,
            previous = prev.cell_voltages.len(),
            current = sample.cell_voltages.len(),
            "Cell voltage count changed"
        );
    }
    if sample.cell_temps_c.len() != prev.cell_temps_c.len() {
        warn!(
            index,
            previous = prev.cell_temps_c.len(),
            current = sample.cell_temps_c.len(),
            "Cell temperature count changed"
        );
    }
}

/// Accepts RFC 3339, an offset-less ISO datetime (taken as UTC), or Unix seconds.
fn parse_timestamp(index: usize, raw: Option<&Value>) -> Result<DateTime<Utc>, ValidationError> {
    match raw {
        Some(Value::String(s)) => {
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Ok(ts.with_timezone(&Utc));
            }
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
                .ok_or_else(|| {
                    ValidationError::sample(index, "ts", format!("`{s}` is not a valid timestamp"))
                })
        }
        Some(Value::Number(n)) => {
            let parsed = match n.as_i64() {
                Some(secs) => DateTime::from_timestamp(secs, 0),
                None => n
                    .as_f64()
                    .and_then(|secs| DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)),
            };
            parsed.ok_or_else(|| ValidationError::sample(index, "ts", "epoch value out of range"))
        }
        Some(_) => Err(ValidationError::sample(
            index,
            "ts",
            "must be a string or a number",
        )),
        None => Err(ValidationError::sample(index, "ts", "is missing")),
    }
}

fn number(index: usize, obj: &Map<String, Value>, field: &str) -> Result<f64, ValidationError> {
    match obj.get(field) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ValidationError::sample(index, field, "is not representable as f64")),
        Some(_) => Err(ValidationError::sample(index, field, "must be a number")),
        None => Err(ValidationError::sample(index, field, "is missing")),
    }
}

fn cell_array(
    index: usize,
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Vec<f64>, ValidationError> {
    let values = match obj.get(field) {
        Some(Value::Array(values)) => values,
        Some(_) => return Err(ValidationError::sample(index, field, "must be an array")),
        None => return Err(ValidationError::sample(index, field, "is missing")),
    };
    if values.is_empty() {
        return Err(ValidationError::sample(index, field, "must not be empty"));
    }

    values
        .iter()
        .enumerate()
        .map(|(cell, v)| {
            v.as_f64().ok_or_else(|| {
                ValidationError::sample(index, field, format!("cell {cell} must be a number"))
            })
        })
        .collect()
}

fn positive(obj: &Map<String, Value>, field: &str) -> Result<f64, ValidationError> {
    let path = format!("vehicle.{field}");
    match obj.get(field) {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v > 0.0 => Ok(v),
            _ => Err(ValidationError::log(&path, "must be greater than zero")),
        },
        Some(_) => Err(ValidationError::log(&path, "must be a number")),
        None => Err(ValidationError::log(&path, "is missing")),
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::log(
            &format!("vehicle.{field}"),
            "must be a string",
        )),
    }
}

fn optional_integer(obj: &Map<String, Value>, field: &str) -> Result<Option<i64>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
            ValidationError::log(&format!("vehicle.{field}"), "must be an integer")
        }),
        Some(_) => Err(ValidationError::log(
            &format!("vehicle.{field}"),
            "must be an integer",
        )),
    }
}
