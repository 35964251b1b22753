use reqwest::Client;
use tracing::debug;

use crate::domain::{error::OperatorError, resilience::ports::AgencyConnection};

/// Port every ArangoDB server listens on.
pub const ARANGOD_PORT: u16 = 8529;

const AGENCY_CONFIG_PATH: &str = "/_api/agency/config";

/// Builds the HTTP client shared by all agency connections. Server
/// certificates are not verified.
pub fn create_agency_http_client(timeout: std::time::Duration) -> Result<Client, OperatorError> {
    Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| OperatorError::InternalServerError {
            message: format!("unable to create agency HTTP client: {}", e),
        })
}

#[derive(Debug, Clone)]
pub struct HttpAgencyConnection {
    http_client: Client,
    member_id: String,
    endpoint: String,
}

impl HttpAgencyConnection {
    pub fn new(http_client: Client, member_id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            member_id: member_id.into(),
            endpoint: endpoint.into(),
        }
    }

    #[cfg(test)]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AgencyConnection for HttpAgencyConnection {
    fn member_id(&self) -> &str {
        &self.member_id
    }

    async fn ping(&self) -> Result<(), OperatorError> {
        let url = format!("{}{}", self.endpoint, AGENCY_CONFIG_PATH);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| OperatorError::AgencyError {
                message: format!("agent {} did not answer: {}", self.member_id, e),
            })?;

        // Any answer short of a server error means the agent process is up.
        let status = response.status();
        debug!(id = self.member_id.as_str(), %status, "Agent answered");
        if status.is_server_error() {
            return Err(OperatorError::AgencyError {
                message: format!("agent {} answered with {}", self.member_id, status),
            });
        }
        Ok(())
    }
}
