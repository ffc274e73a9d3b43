//! Normalization of raw FHIR Observation resources.
//!
//! Upstream resources arrive with optional fields missing or null; every
//! accessor here falls back to a defined placeholder so the pipeline always
//! sees a complete [`ObservationSummary`].

use labfollowup_core::{LabStatus, ObservationSummary};

/// Extract the bare resource id from a reference.
///
/// Accepts "12", "Observation/12", or a full URL ending in the id; all
/// resolve to "12".
pub fn resource_id(reference: &str) -> &str {
    match reference.rfind('/') {
        Some(idx) => &reference[idx + 1..],
        None => reference,
    }
}

/// Map a FHIR interpretation code to an abnormality status.
///
/// High/low/abnormal flags (H, HH, A, AA, L, LL) collapse to abnormal,
/// C means critical, anything else reads as normal.
pub fn status_from_code(code: &str) -> LabStatus {
    match code {
        "H" | "HH" | "A" | "AA" | "L" | "LL" => LabStatus::Abnormal,
        "C" => LabStatus::Critical,
        _ => LabStatus::Normal,
    }
}

/// Normalize a fetched Observation resource into the pipeline's summary.
///
/// `id` is the bare resource id; the summary's `observation_ref` is
/// reconstructed from it so the reference is canonical regardless of how
/// the caller spelled it.
pub fn summarize(resource: &serde_json::Value, id: &str) -> ObservationSummary {
    let patient_ref = resource
        .pointer("/subject/reference")
        .and_then(|v| v.as_str())
        .unwrap_or("Patient/Unknown")
        .to_string();

    let code = &resource["code"];
    let test_name = code["text"]
        .as_str()
        .or_else(|| code["coding"][0]["display"].as_str())
        .unwrap_or("Unknown Test")
        .to_string();

    let test_code = code["coding"]
        .as_array()
        .and_then(|codings| codings.iter().find_map(|c| c["code"].as_str()))
        .map(String::from);

    let value = resource["valueQuantity"]["value"].as_f64().unwrap_or(0.0);
    let unit = resource["valueQuantity"]["unit"]
        .as_str()
        .unwrap_or("")
        .to_string();

    let status = resource["interpretation"][0]["coding"][0]["code"]
        .as_str()
        .map_or(LabStatus::Normal, status_from_code);

    ObservationSummary {
        observation_ref: format!("Observation/{id}"),
        patient_ref,
        test_name,
        value,
        unit,
        test_code,
        status,
    }
}
