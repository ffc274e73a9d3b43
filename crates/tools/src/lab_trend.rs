//! Lab trend tool.
//!
//! Pulls the historical series for one test code and renders a short
//! trend report: recent values, overall change, and a coarse direction
//! label (stable, increasing, decreasing).

use std::sync::Arc;

use async_trait::async_trait;
use labfollowup_core::fhir::{bundle_entries, FhirReader};
use labfollowup_core::{Tool, ToolError, ToolResult};
use serde_json::{json, Value};
use tracing::warn;

/// Maximum number of historical results requested from the FHIR server.
const HISTORY_COUNT: u32 = 100;

/// Maximum number of individual values listed in the report.
const MAX_LISTED_VALUES: usize = 10;

/// Percent change below which the series is labeled stable.
const STABLE_THRESHOLD_PCT: f64 = 5.0;

/// Tool that analyzes the historical trend of a single lab test.
pub struct LabTrendTool {
    fhir: Arc<dyn FhirReader>,
    default_lookback_days: u32,
}

impl LabTrendTool {
    pub fn new(fhir: Arc<dyn FhirReader>, default_lookback_days: u32) -> Self {
        Self {
            fhir,
            default_lookback_days,
        }
    }
}

#[async_trait]
impl Tool for LabTrendTool {
    fn name(&self) -> &str {
        "analyze_lab_trend"
    }

    fn description(&self) -> &str {
        "Analyze the historical trend of a lab test for a patient. Shows recent values \
         in reverse chronological order and computes the overall change, so you can tell \
         whether an abnormal result is new or part of an established pattern."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "patient_id": {
                    "type": "string",
                    "description": "FHIR patient ID (e.g., '123' from 'Patient/123')"
                },
                "observation_code": {
                    "type": "string",
                    "description": "LOINC code of the lab test (e.g., '2160-0' for serum creatinine)"
                },
                "lookback_days": {
                    "type": "integer",
                    "description": "How many days of history to consider"
                }
            },
            "required": ["patient_id", "observation_code"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let patient_id = arguments["patient_id"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("'patient_id' is required".to_string()))?;
        let observation_code = arguments["observation_code"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("'observation_code' is required".to_string())
        })?;
        let lookback_days = arguments["lookback_days"]
            .as_u64()
            .unwrap_or(u64::from(self.default_lookback_days));

        let bundle = match self
            .fhir
            .observation_history(patient_id, observation_code, HISTORY_COUNT)
            .await
        {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(
                    patient_id = %patient_id,
                    observation_code = %observation_code,
                    error = %e,
                    "Observation history fetch failed"
                );
                return Ok(ToolResult::degraded(no_data_message(
                    observation_code,
                    patient_id,
                )));
            }
        };

        let points = collect_points(&bundle);
        if points.is_empty() {
            return Ok(ToolResult::text(no_data_message(
                observation_code,
                patient_id,
            )));
        }

        Ok(ToolResult::text(format_trend(
            observation_code,
            lookback_days,
            &points,
        )))
    }
}

// --- Series extraction ---

/// One historical observation, newest first in the collected series.
struct TrendPoint {
    date: String,
    value: Option<f64>,
    unit: String,
    reference_range: Option<String>,
}

fn collect_points(bundle: &Value) -> Vec<TrendPoint> {
    bundle_entries(bundle)
        .into_iter()
        .filter(|r| r["resourceType"].as_str() == Some("Observation"))
        .map(|r| TrendPoint {
            date: r["effectiveDateTime"].as_str().unwrap_or("Unknown").to_string(),
            value: r["valueQuantity"]["value"].as_f64(),
            unit: r["valueQuantity"]["unit"].as_str().unwrap_or("").to_string(),
            reference_range: reference_range(r),
        })
        .collect()
}

/// Renders the first reference range as "low-high unit", with one-sided
/// ranges shown as ">low unit" or "<high unit".
fn reference_range(resource: &Value) -> Option<String> {
    let range = resource["referenceRange"].get(0)?;
    let low = range["low"]["value"].as_f64();
    let high = range["high"]["value"].as_f64();
    let unit = range["low"]["unit"].as_str().unwrap_or("");

    match (low, high) {
        (Some(low), Some(high)) => Some(format!("{low}-{high} {unit}")),
        (Some(low), None) => Some(format!(">{low} {unit}")),
        (None, Some(high)) => Some(format!("<{high} {unit}")),
        (None, None) => None,
    }
}

// --- Report rendering ---

fn no_data_message(observation_code: &str, patient_id: &str) -> String {
    format!(
        "\nLab Trend Analysis:\n\nNo historical data found for observation code \
         {observation_code} for patient {patient_id}.\nThis may be the first result for this test.\n"
    )
}

/// Renders the trend report. Points are expected newest first, so the
/// overall change compares the last point (oldest) to the first (newest).
fn format_trend(observation_code: &str, lookback_days: u64, points: &[TrendPoint]) -> String {
    let mut output = format!(
        "Lab Trend Analysis (LOINC: {observation_code}, Last {lookback_days} days):\n\n"
    );
    output.push_str(&format!("Total results found: {}\n\n", points.len()));
    output.push_str("Historical Values (most recent first):\n");

    for (i, point) in points.iter().take(MAX_LISTED_VALUES).enumerate() {
        let value = point
            .value
            .map_or_else(|| "N/A".to_string(), |v| v.to_string());
        output.push_str(&format!(
            "  {}. {}: {} {}",
            i + 1,
            point.date,
            value,
            point.unit
        ));
        if let Some(range) = &point.reference_range {
            output.push_str(&format!(" (Ref: {range})"));
        }
        output.push('\n');
    }

    if points.len() > MAX_LISTED_VALUES {
        output.push_str(&format!(
            "\n  ... and {} more results\n",
            points.len() - MAX_LISTED_VALUES
        ));
    }

    if points.len() >= 2 {
        output.push_str("\nTrend Analysis:\n");

        let values: Vec<f64> = points.iter().filter_map(|p| p.value).collect();
        if values.len() >= 2 {
            let newest = values[0];
            let oldest = values[values.len() - 1];
            let change = newest - oldest;
            let pct_change = if oldest != 0.0 {
                change / oldest * 100.0
            } else {
                0.0
            };

            output.push_str(&format!(
                "  Change: {change:+.2} {} ({pct_change:+.1}%)\n",
                points[0].unit
            ));

            if pct_change.abs() < STABLE_THRESHOLD_PCT {
                output.push_str("  Trend: Stable\n");
            } else if pct_change > 0.0 {
                output.push_str("  Trend: Increasing\n");
            } else {
                output.push_str("  Trend: Decreasing\n");
            }
        }
    }

    output
}

// --- Tests ---
