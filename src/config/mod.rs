pub mod cli;
pub mod store;

use crate::utils::error::Result;
use crate::utils::validation::{validate_url, Validate};

/// Remote endpoints for the CAS ticket flow and the SVS retrieval service.
///
/// Defaults point at the NLM production hosts; tests swap in a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Ticket-granting endpoint; accepts the form-encoded API key.
    pub granting_url: String,
    /// Base of the granting-ticket-scoped service ticket endpoint.
    pub tickets_base: String,
    /// Target service URI submitted when minting a service ticket.
    pub target_service: String,
    /// Value set retrieval endpoint.
    pub retrieve_url: String,
    /// Canonical URL base for emitted FHIR ValueSet resources.
    pub fhir_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            granting_url: "https://utslogin.nlm.nih.gov/cas/v1/api-key".to_string(),
            tickets_base: "https://utslogin.nlm.nih.gov/cas/v1/tickets".to_string(),
            target_service: "http://umlsks.nlm.nih.gov".to_string(),
            retrieve_url: "https://vsac.nlm.nih.gov/vsac/svs/RetrieveValueSet".to_string(),
            fhir_base: "http://cts.nlm.nih.gov/fhir/ValueSet/".to_string(),
        }
    }
}

impl Endpoints {
    pub fn service_ticket_url(&self, granting_ticket: &str) -> String {
        format!(
            "{}/{}",
            self.tickets_base.trim_end_matches('/'),
            granting_ticket
        )
    }
}

impl Validate for Endpoints {
    fn validate(&self) -> Result<()> {
        validate_url("granting_url", &self.granting_url)?;
        validate_url("tickets_base", &self.tickets_base)?;
        validate_url("target_service", &self.target_service)?;
        validate_url("retrieve_url", &self.retrieve_url)?;
        validate_url("fhir_base", &self.fhir_base)?;
        Ok(())
    }
}
