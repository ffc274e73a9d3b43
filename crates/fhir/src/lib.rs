//! # labfollowup-fhir
//!
//! FHIR R4 repository access: fetches and normalizes the trigger observation,
//! retrieves patient record bundles, and searches observation history. The
//! rest of the system consumes this through the `FhirReader` trait.

mod client;
pub mod observation;

pub use client::FhirClient;
