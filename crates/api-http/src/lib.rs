//! HTTP implementation of the donation authority.
//!
//! Talks to the hospital donation backend over its JSON API. Every call is
//! scoped by `hospitalId` query parameter and authenticated with the session
//! credential in the `token` header, matching the backend's existing clients.

mod wire;

use async_trait::async_trait;
use donorlink_core::authority::DonationAuthority;
use donorlink_core::model::{
    CompletionDetails, Donation, DonationRequest, Donor, DonorFilters, RequestDraft, RequestPatch,
    ScheduleInput,
};
use donorlink_core::{Session, WorkflowError, WorkflowResult};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Donation authority backed by the remote HTTP API.
pub struct HttpAuthority {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthority {
    /// Creates an authority against `base_url`, e.g.
    /// `https://backend.example.org` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates an authority with a caller-configured client, for timeouts or
    /// proxy settings.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.header("token", session.token().expose())
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> WorkflowResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| WorkflowError::Unavailable(e.to_string()))?;
        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| WorkflowError::Unavailable(format!("malformed response: {e}")))
    }

    async fn check_status(response: Response) -> WorkflowResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<wire::ErrorEnvelope>()
            .await
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("backend returned {status}"));
        tracing::warn!(%status, message, "backend call failed");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                WorkflowError::Unauthorized(message)
            }
            StatusCode::NOT_FOUND => WorkflowError::NotFound(message),
            StatusCode::CONFLICT => WorkflowError::InvalidState(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                WorkflowError::Validation(message)
            }
            _ => WorkflowError::Unavailable(message),
        })
    }

    async fn get_scoped<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(String, String)],
    ) -> WorkflowResult<T> {
        let builder = self.client.get(self.url(path)).query(query);
        self.send(self.authed(builder, session)).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        session: &Session,
        builder: RequestBuilder,
        hospital_id: &str,
        body: &B,
    ) -> WorkflowResult<T> {
        let builder = builder.query(&[("hospitalId", hospital_id)]).json(body);
        self.send(self.authed(builder, session)).await
    }
}

#[async_trait]
impl DonationAuthority for HttpAuthority {
    async fn list_requests(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<DonationRequest>> {
        let envelope: wire::RequestsEnvelope = self
            .get_scoped(
                session,
                "/api/donations/admin/hospitals/requests",
                &[("hospitalId".to_owned(), hospital_id.to_owned())],
            )
            .await?;
        Ok(envelope.requests)
    }

    async fn create_request(
        &self,
        session: &Session,
        hospital_id: &str,
        draft: RequestDraft,
    ) -> WorkflowResult<DonationRequest> {
        let builder = self.client.post(self.url("/api/donations/admin/requests"));
        let envelope: wire::RequestEnvelope = self
            .send_json(session, builder, hospital_id, &draft)
            .await?;
        Ok(envelope.request)
    }

    async fn update_request(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
        patch: RequestPatch,
    ) -> WorkflowResult<DonationRequest> {
        let builder = self
            .client
            .put(self.url(&format!("/api/donations/admin/requests/{request_id}")));
        let envelope: wire::RequestEnvelope = self
            .send_json(session, builder, hospital_id, &patch)
            .await?;
        Ok(envelope.request)
    }

    async fn auto_match(
        &self,
        session: &Session,
        hospital_id: &str,
        request_id: &str,
    ) -> WorkflowResult<Vec<Donor>> {
        let envelope: wire::MatchEnvelope = self
            .get_scoped(
                session,
                &format!("/api/donations/admin/requests/{request_id}/match"),
                &[("hospitalId".to_owned(), hospital_id.to_owned())],
            )
            .await?;
        Ok(envelope.matched_donors)
    }

    async fn search_donors(
        &self,
        session: &Session,
        hospital_id: &str,
        filters: &DonorFilters,
    ) -> WorkflowResult<Vec<Donor>> {
        let query = wire::donor_query(hospital_id, filters);
        let envelope: wire::DonorsEnvelope = self
            .get_scoped(session, "/api/donations/admin/donors/search", &query)
            .await?;
        Ok(envelope.donors)
    }

    async fn schedule_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        input: ScheduleInput,
    ) -> WorkflowResult<Donation> {
        let builder = self
            .client
            .post(self.url("/api/donations/admin/donations/schedule"));
        let envelope: wire::DonationEnvelope = self
            .send_json(session, builder, hospital_id, &input)
            .await?;
        Ok(envelope.donation)
    }

    async fn complete_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        details: CompletionDetails,
    ) -> WorkflowResult<Donation> {
        let builder = self
            .client
            .put(self.url(&format!("/api/donations/admin/{donation_id}/complete")));
        let envelope: wire::DonationEnvelope = self
            .send_json(session, builder, hospital_id, &details)
            .await?;
        Ok(envelope.donation)
    }

    async fn cancel_donation(
        &self,
        session: &Session,
        hospital_id: &str,
        donation_id: &str,
        reason: &str,
    ) -> WorkflowResult<Donation> {
        let builder = self
            .client
            .put(self.url(&format!("/api/donations/admin/{donation_id}/cancel")));
        let body = serde_json::json!({ "reason": reason });
        let envelope: wire::DonationEnvelope = self
            .send_json(session, builder, hospital_id, &body)
            .await?;
        Ok(envelope.donation)
    }

    async fn list_donations(
        &self,
        session: &Session,
        hospital_id: &str,
    ) -> WorkflowResult<Vec<Donation>> {
        let envelope: wire::DonationsEnvelope = self
            .get_scoped(
                session,
                "/api/donations/admin/hospitals/donations",
                &[("hospitalId".to_owned(), hospital_id.to_owned())],
            )
            .await?;
        Ok(envelope.donations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let authority = HttpAuthority::new("https://backend.example.org///");
        assert_eq!(
            authority.url("/api/donations/admin/requests"),
            "https://backend.example.org/api/donations/admin/requests"
        );
    }
}
