use reqwest::Client;

use crate::domain::model::ServiceTicket;
use crate::utils::error::{Result, VsacError};

/// Retrieves one value set's raw XML from the SVS endpoint.
///
/// One GET per call, ticket and id as query parameters. No retry here:
/// retry responsibility belongs entirely to the ticket layer above.
pub struct ValueSetClient {
    client: Client,
    retrieve_url: String,
}

impl ValueSetClient {
    pub fn new(retrieve_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            retrieve_url: retrieve_url.into(),
        }
    }

    pub async fn fetch(&self, ticket: &ServiceTicket, value_set_id: &str) -> Result<String> {
        tracing::debug!("retrieving value set {value_set_id}");
        let response = self
            .client
            .get(&self.retrieve_url)
            .query(&[("ticket", ticket.as_str()), ("id", value_set_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("retrieval of {value_set_id} returned {status}");
            return Err(VsacError::HttpFailure(status));
        }

        Ok(response.text().await?)
    }
}
