//! HTTP client for a FHIR R4 repository.
//!
//! Talks to any server exposing the standard read, `$everything`, and search
//! interactions over basic auth. Error mapping preserves the distinctions the
//! service boundary needs: not-found, upstream status, unreachable.

use crate::observation;
use async_trait::async_trait;
use labfollowup_core::error::FhirError;
use labfollowup_core::{FhirReader, ObservationSummary};
use tracing::{debug, warn};

/// A FHIR R4 repository client.
pub struct FhirClient {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl FhirClient {
    /// Create a new client against a FHIR base URL (basic auth).
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            client,
        }
    }

    /// Send a prepared request and parse the FHIR JSON body.
    ///
    /// `resource` names what was being fetched, for not-found reporting.
    async fn send_fhir(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<serde_json::Value, FhirError> {
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/fhir+json")
            .send()
            .await
            .map_err(|e| FhirError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 404 {
            return Err(FhirError::NotFound {
                resource: resource.to_string(),
            });
        }

        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            warn!(status, resource, "FHIR server returned error");
            return Err(FhirError::UpstreamStatus {
                status_code: status,
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| FhirError::MalformedResource(e.to_string()))
    }
}

#[async_trait]
impl FhirReader for FhirClient {
    async fn fetch_observation(&self, reference: &str) -> Result<ObservationSummary, FhirError> {
        let id = observation::resource_id(reference);
        let url = format!("{}/Observation/{}", self.base_url, id);

        debug!(observation_id = %id, "Fetching trigger observation");

        let resource = self
            .send_fhir(self.client.get(&url), &format!("Observation/{id}"))
            .await?;

        Ok(observation::summarize(&resource, id))
    }

    async fn patient_everything(&self, patient_id: &str) -> Result<serde_json::Value, FhirError> {
        let id = observation::resource_id(patient_id);
        let url = format!("{}/Patient/{}/$everything", self.base_url, id);

        debug!(patient_id = %id, "Fetching patient record bundle");

        self.send_fhir(self.client.get(&url), &format!("Patient/{id}"))
            .await
    }

    async fn observation_history(
        &self,
        patient_id: &str,
        test_code: &str,
        count: u32,
    ) -> Result<serde_json::Value, FhirError> {
        let id = observation::resource_id(patient_id);
        let url = format!("{}/Observation", self.base_url);

        debug!(patient_id = %id, test_code, "Searching observation history");

        let request = self.client.get(&url).query(&[
            ("subject", format!("Patient/{id}")),
            ("code", test_code.to_string()),
            ("_sort", "-date".to_string()),
            ("_count", count.to_string()),
        ]);

        self.send_fhir(request, "Observation search").await
    }
}
