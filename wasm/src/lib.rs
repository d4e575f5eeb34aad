//! WebAssembly module for the horticulture operations platform
//!
//! Sorting forms call these bindings on every change so the confirm button can
//! be gated without a server round-trip. Weights cross the boundary as strings
//! to keep decimal precision.

use std::str::FromStr;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::reconcile::*;

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|e| format!("Invalid {}: {}", field, e))
}

fn reconciler_for(tolerance: &str) -> Result<WeightReconciler, String> {
    if tolerance.trim().is_empty() {
        return Ok(WeightReconciler::default());
    }
    let tolerance = parse_decimal("tolerance", tolerance)?;
    shared::validate_tolerance(tolerance)?;
    Ok(WeightReconciler::new(tolerance))
}

fn reconcile_weights_json(total: &str, parts_json: &str, tolerance: &str) -> Result<String, String> {
    let total = parse_decimal("total", total)?;
    let parts: Vec<Decimal> = serde_json::from_str(parts_json)
        .map_err(|e| format!("Invalid parts JSON: {}", e))?;
    let reconciliation = reconciler_for(tolerance)?.reconcile(total, &parts);
    serde_json::to_string(&reconciliation).map_err(|e| e.to_string())
}

fn reconcile_form_json(total: &str, entries_json: &str, tolerance: &str) -> Result<String, String> {
    let total = parse_decimal("total", total)?;
    let entries: Vec<FormEntry> = serde_json::from_str(entries_json)
        .map_err(|e| format!("Invalid entries JSON: {}", e))?;
    let pairs: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.grade.as_str(), e.weight.as_str()))
        .collect();
    let form = reconciler_for(tolerance)?.reconcile_form(total, &pairs);
    serde_json::to_string(&form).map_err(|e| e.to_string())
}

/// Reconcile typed weights. `parts_json` is an array of decimal strings or
/// numbers; an empty `tolerance` uses the default.
#[wasm_bindgen]
pub fn reconcile_weights(total: &str, parts_json: &str, tolerance: &str) -> Result<String, JsValue> {
    reconcile_weights_json(total, parts_json, tolerance).map_err(|e| JsValue::from_str(&e))
}

/// Reconcile raw form rows `[{ "grade": "A", "weight": "850" }, ...]`
#[wasm_bindgen]
pub fn reconcile_form_entries(
    total: &str,
    entries_json: &str,
    tolerance: &str,
) -> Result<String, JsValue> {
    reconcile_form_json(total, entries_json, tolerance).map_err(|e| JsValue::from_str(&e))
}

/// Quick check for forms that already hold numbers.
/// Non-finite inputs count as zero.
#[wasm_bindgen]
pub fn is_allocation_balanced(total: f64, parts: &[f64], tolerance: f64) -> bool {
    let to_decimal = |v: f64| Decimal::try_from(v).unwrap_or(Decimal::ZERO);
    let tolerance = to_decimal(tolerance);
    if tolerance <= Decimal::ZERO {
        return false;
    }
    reconcile(
        to_decimal(total),
        parts.iter().map(|p| to_decimal(*p)),
        tolerance,
    )
    .balanced
}

/// Default tolerance in kilograms, as a decimal string
#[wasm_bindgen]
pub fn default_tolerance_kg() -> String {
    DEFAULT_TOLERANCE_KG.to_string()
}
