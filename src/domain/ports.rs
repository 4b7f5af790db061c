use crate::domain::model::Credential;
use crate::utils::error::Result;

/// Persistence boundary for the credential record.
///
/// The record is read and rewritten in full on every mutation. Keeping this
/// behind a port keeps the ticket lifecycle testable without a file system.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Credential>> + Send;
    fn save(
        &self,
        credential: &Credential,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
