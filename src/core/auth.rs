use chrono::{Duration, Utc};
use reqwest::Client;

use crate::config::Endpoints;
use crate::domain::model::{Credential, ServiceTicket};
use crate::domain::ports::CredentialStore;
use crate::utils::error::{Result, VsacError};

/// How long a cached granting ticket stays usable before a fresh one is
/// requested. Kept well below the remote lifetime so a ticket never expires
/// mid-operation.
const DEFAULT_VALIDITY_WINDOW_SECS: i64 = 60 * 5;

/// Owns the granting-ticket lifecycle over a credential: validity checking,
/// acquisition, invalidation, and the single service-ticket retry.
///
/// Every granting-ticket refresh or invalidation persists the updated
/// credential through the store before returning, so the token file always
/// reflects the last known state.
pub struct TicketManager<S: CredentialStore> {
    client: Client,
    endpoints: Endpoints,
    store: S,
    validity_window: Duration,
}

impl<S: CredentialStore> TicketManager<S> {
    pub fn new(endpoints: Endpoints, store: S) -> Self {
        Self {
            client: Client::new(),
            endpoints,
            store,
            validity_window: Duration::seconds(DEFAULT_VALIDITY_WINDOW_SECS),
        }
    }

    pub fn with_validity_window(mut self, window: Duration) -> Self {
        self.validity_window = window;
        self
    }

    /// Returns a service ticket for the retrieval endpoint, refreshing the
    /// granting ticket when it is absent or expired.
    ///
    /// A failed service-ticket request invalidates the cached granting
    /// ticket, acquires a new one, and retries exactly once; the second
    /// failure is `TicketAcquisitionFailed`. An empty ticket is never
    /// returned.
    pub async fn get_service_ticket(&self, credential: &mut Credential) -> Result<ServiceTicket> {
        if !self.is_granting_ticket_usable(credential) {
            self.refresh_granting_ticket(credential).await?;
        }

        match self.request_service_ticket(credential).await {
            Ok(ticket) => Ok(ticket),
            Err(first) => {
                tracing::warn!(
                    "service ticket request failed ({first}), refreshing granting ticket and retrying once"
                );
                self.invalidate(credential).await?;
                self.refresh_granting_ticket(credential).await?;
                self.request_service_ticket(credential)
                    .await
                    .map_err(|retry| {
                        tracing::error!("service ticket retry failed: {retry}");
                        VsacError::TicketAcquisitionFailed
                    })
            }
        }
    }

    fn is_granting_ticket_usable(&self, credential: &Credential) -> bool {
        match (&credential.granting_ticket, &credential.granted_at) {
            (Some(_), Some(granted_at)) => {
                let age = Utc::now().signed_duration_since(*granted_at);
                // A timestamp from the future means a clock problem; refresh.
                age >= Duration::zero() && age < self.validity_window
            }
            _ => false,
        }
    }

    async fn refresh_granting_ticket(&self, credential: &mut Credential) -> Result<()> {
        match self.request_granting_ticket(&credential.api_key).await {
            Ok(ticket) => {
                tracing::info!("granting ticket refreshed");
                credential.set_ticket(ticket);
                self.store.save(credential).await?;
                Ok(())
            }
            Err(err) => {
                credential.clear_ticket();
                self.store.save(credential).await?;
                Err(err)
            }
        }
    }

    async fn request_granting_ticket(&self, api_key: &str) -> Result<String> {
        tracing::debug!(
            "requesting granting ticket from {}",
            self.endpoints.granting_url
        );
        let response = self
            .client
            .post(&self.endpoints.granting_url)
            .form(&[("apikey", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("granting ticket request returned {status}");
            return Err(VsacError::InvalidApiKey);
        }

        let body = response.text().await?;
        extract_ticket_id(&body).ok_or(VsacError::InvalidApiKey)
    }

    async fn request_service_ticket(&self, credential: &Credential) -> Result<ServiceTicket> {
        let granting_ticket = credential
            .granting_ticket
            .as_deref()
            .ok_or(VsacError::TicketAcquisitionFailed)?;

        let url = self.endpoints.service_ticket_url(granting_ticket);
        tracing::debug!("requesting service ticket from {url}");
        let response = self
            .client
            .post(&url)
            .form(&[("service", self.endpoints.target_service.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VsacError::HttpFailure(status));
        }

        let body = response.text().await?;
        let ticket = body.trim();
        if ticket.is_empty() {
            return Err(VsacError::TicketAcquisitionFailed);
        }
        Ok(ServiceTicket::new(ticket))
    }

    async fn invalidate(&self, credential: &mut Credential) -> Result<()> {
        credential.clear_ticket();
        self.store.save(credential).await
    }
}

/// Pulls the ticket identifier out of the granting response: the trailing
/// path segment of the embedded `action="…"` target string.
fn extract_ticket_id(body: &str) -> Option<String> {
    let start = body.find("action=")? + "action=\"".len();
    let rest = body.get(start..)?;
    let end = rest.find('"')?;
    let action = &rest[..end];
    let ticket = action.rsplit('/').next().unwrap_or(action);
    if ticket.is_empty() {
        None
    } else {
        Some(ticket.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// In-memory store recording every save, so persistence side effects can
    /// be asserted without a file system.
    #[derive(Clone, Default)]
    struct MemoryCredentialStore {
        saved: Arc<Mutex<Vec<Credential>>>,
    }

    impl MemoryCredentialStore {
        fn new() -> Self {
            Self::default()
        }

        async fn saved(&self) -> Vec<Credential> {
            self.saved.lock().await.clone()
        }
    }

    impl CredentialStore for MemoryCredentialStore {
        async fn load(&self) -> Result<Credential> {
            let saved = self.saved.lock().await;
            Ok(saved.last().cloned().unwrap_or_else(Credential::empty))
        }

        async fn save(&self, credential: &Credential) -> Result<()> {
            self.saved.lock().await.push(credential.clone());
            Ok(())
        }
    }

    fn mock_endpoints(server: &MockServer) -> Endpoints {
        Endpoints {
            granting_url: server.url("/cas/v1/api-key"),
            tickets_base: server.url("/cas/v1/tickets"),
            target_service: "http://umlsks.nlm.nih.gov".to_string(),
            retrieve_url: server.url("/vsac/svs/RetrieveValueSet"),
            fhir_base: "http://cts.nlm.nih.gov/fhir/ValueSet/".to_string(),
        }
    }

    fn granting_response(ticket: &str) -> String {
        format!(
            "<html><body><form action=\"https://utslogin.nlm.nih.gov/cas/v1/tickets/{ticket}\" method=\"POST\">\
             <input type=\"submit\" value=\"Submit\"/></form></body></html>"
        )
    }

    #[test]
    fn test_extract_ticket_id_takes_trailing_path_segment() {
        let body = r#"<form action="https://host/path/TGT-123-xyz" method="POST">"#;
        assert_eq!(extract_ticket_id(body).as_deref(), Some("TGT-123-xyz"));
    }

    #[test]
    fn test_extract_ticket_id_without_action_is_none() {
        assert_eq!(extract_ticket_id("<html>nothing here</html>"), None);
        assert_eq!(extract_ticket_id(""), None);
    }

    #[test]
    fn test_extract_ticket_id_rejects_empty_segment() {
        let body = r#"<form action="https://host/path/" method="POST">"#;
        assert_eq!(extract_ticket_id(body), None);
    }

    #[tokio::test]
    async fn test_acquires_granting_ticket_when_absent() {
        let server = MockServer::start();
        let granting_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/cas/v1/api-key")
                .body_contains("apikey=secret-key");
            then.status(201).body(granting_response("TGT-1-new"));
        });
        let service_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/cas/v1/tickets/TGT-1-new")
                .body_contains("service=");
            then.status(200).body("ST-1-abc");
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store.clone());
        let mut credential = Credential::with_api_key("secret-key");

        let ticket = manager.get_service_ticket(&mut credential).await.unwrap();

        granting_mock.assert();
        service_mock.assert();
        assert_eq!(ticket.as_str(), "ST-1-abc");
        assert_eq!(credential.granting_ticket.as_deref(), Some("TGT-1-new"));

        // Refresh persisted through the store before returning.
        let saved = store.saved().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].granting_ticket.as_deref(), Some("TGT-1-new"));
    }

    #[tokio::test]
    async fn test_fresh_granting_ticket_is_reused() {
        let server = MockServer::start();
        let granting_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/api-key");
            then.status(201).body(granting_response("TGT-unused"));
        });
        let service_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/tickets/TGT-cached");
            then.status(200).body("ST-2-def");
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store.clone());
        let mut credential = Credential::with_api_key("secret-key");
        credential.set_ticket("TGT-cached".to_string());

        let ticket = manager.get_service_ticket(&mut credential).await.unwrap();

        assert_eq!(ticket.as_str(), "ST-2-def");
        assert_eq!(granting_mock.hits(), 0);
        service_mock.assert();
        assert!(store.saved().await.is_empty());
    }

    #[tokio::test]
    async fn test_expired_granting_ticket_is_refreshed() {
        let server = MockServer::start();
        let granting_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/api-key");
            then.status(201).body(granting_response("TGT-2-new"));
        });
        let service_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/tickets/TGT-2-new");
            then.status(200).body("ST-3-ghi");
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store.clone());
        let mut credential = Credential::with_api_key("secret-key");
        credential.granting_ticket = Some("TGT-stale".to_string());
        credential.granted_at = Some(Utc::now() - Duration::minutes(10));

        let ticket = manager.get_service_ticket(&mut credential).await.unwrap();

        granting_mock.assert();
        service_mock.assert();
        assert_eq!(ticket.as_str(), "ST-3-ghi");
        assert_eq!(credential.granting_ticket.as_deref(), Some("TGT-2-new"));
    }

    #[tokio::test]
    async fn test_service_failure_invalidates_and_retries_exactly_once() {
        let server = MockServer::start();
        let bad_service_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/tickets/TGT-bad");
            then.status(500);
        });
        let granting_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/api-key");
            then.status(201).body(granting_response("TGT-good"));
        });
        let good_service_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/tickets/TGT-good");
            then.status(200).body("ST-4-jkl");
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store.clone());
        let mut credential = Credential::with_api_key("secret-key");
        credential.set_ticket("TGT-bad".to_string());

        let ticket = manager.get_service_ticket(&mut credential).await.unwrap();

        assert_eq!(ticket.as_str(), "ST-4-jkl");
        assert_eq!(bad_service_mock.hits(), 1);
        assert_eq!(granting_mock.hits(), 1);
        assert_eq!(good_service_mock.hits(), 1);

        // Invalidation and refresh both persisted.
        let saved = store.saved().await;
        assert_eq!(saved.len(), 2);
        assert!(saved[0].granting_ticket.is_none());
        assert_eq!(saved[1].granting_ticket.as_deref(), Some("TGT-good"));
    }

    #[tokio::test]
    async fn test_second_service_failure_is_ticket_acquisition_failed() {
        let server = MockServer::start();
        let bad_service_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/tickets/TGT-bad");
            then.status(500);
        });
        let granting_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/api-key");
            then.status(201).body(granting_response("TGT-good"));
        });
        let good_service_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/tickets/TGT-good");
            then.status(503);
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store);
        let mut credential = Credential::with_api_key("secret-key");
        credential.set_ticket("TGT-bad".to_string());

        let err = manager.get_service_ticket(&mut credential).await.unwrap_err();

        assert!(matches!(err, VsacError::TicketAcquisitionFailed));
        assert_eq!(bad_service_mock.hits(), 1);
        assert_eq!(granting_mock.hits(), 1);
        assert_eq!(good_service_mock.hits(), 1);
    }

    #[tokio::test]
    async fn test_blank_service_ticket_is_never_returned() {
        let server = MockServer::start();
        let granting_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/api-key");
            then.status(201).body(granting_response("TGT-5"));
        });
        let service_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/tickets/TGT-5");
            then.status(200).body("");
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store);
        let mut credential = Credential::with_api_key("secret-key");
        credential.set_ticket("TGT-5".to_string());

        let err = manager.get_service_ticket(&mut credential).await.unwrap_err();

        assert!(matches!(err, VsacError::TicketAcquisitionFailed));
        // First attempt plus the single retry after the refresh.
        assert_eq!(service_mock.hits(), 2);
        assert_eq!(granting_mock.hits(), 1);
    }

    #[tokio::test]
    async fn test_rejected_api_key_is_invalid_api_key() {
        let server = MockServer::start();
        let granting_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/api-key");
            then.status(401);
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store.clone());
        let mut credential = Credential::with_api_key("wrong-key");

        let err = manager.get_service_ticket(&mut credential).await.unwrap_err();

        granting_mock.assert();
        assert!(matches!(err, VsacError::InvalidApiKey));

        // The failed refresh still persists the cleared credential.
        let saved = store.saved().await;
        assert_eq!(saved.len(), 1);
        assert!(saved[0].granting_ticket.is_none());
    }

    #[tokio::test]
    async fn test_response_without_action_target_is_invalid_api_key() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/cas/v1/api-key");
            then.status(200).body("<html><body>no form here</body></html>");
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store);
        let mut credential = Credential::with_api_key("secret-key");

        let err = manager.get_service_ticket(&mut credential).await.unwrap_err();
        assert!(matches!(err, VsacError::InvalidApiKey));
        assert!(!credential.has_ticket());
    }

    #[tokio::test]
    async fn test_validity_window_is_configurable() {
        let server = MockServer::start();
        let granting_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/api-key");
            then.status(201).body(granting_response("TGT-6"));
        });
        let service_mock = server.mock(|when, then| {
            when.method(POST).path("/cas/v1/tickets/TGT-6");
            then.status(200).body("ST-6");
        });

        let store = MemoryCredentialStore::new();
        let manager = TicketManager::new(mock_endpoints(&server), store)
            .with_validity_window(Duration::seconds(1));
        let mut credential = Credential::with_api_key("secret-key");
        credential.granting_ticket = Some("TGT-recent".to_string());
        credential.granted_at = Some(Utc::now() - Duration::seconds(30));

        // 30 seconds old but the window is 1 second: must refresh.
        let ticket = manager.get_service_ticket(&mut credential).await.unwrap();
        assert_eq!(ticket.as_str(), "ST-6");
        granting_mock.assert();
        service_mock.assert();
    }
}
