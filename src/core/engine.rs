use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Endpoints;
use crate::core::auth::TicketManager;
use crate::core::client::ValueSetClient;
use crate::core::emit::{Emitter, OutputFormat};
use crate::domain::model::Credential;
use crate::domain::ports::CredentialStore;
use crate::utils::error::{Result, VsacError};

/// Destination for converted output: an explicit file, a directory, or the
/// working directory with the default `{id}.{suffix}` name.
#[derive(Debug, Clone, Default)]
pub struct OutputTarget {
    pub file: Option<PathBuf>,
    pub dir: Option<PathBuf>,
}

impl OutputTarget {
    fn path_for(&self, value_set_id: &str, suffix: &str) -> PathBuf {
        if let Some(file) = &self.file {
            return file.clone();
        }
        let file_name = format!("{value_set_id}.{suffix}");
        match &self.dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

/// Sequential orchestrator: for each value set id, mint a service ticket,
/// fetch the raw XML, and render the requested format. A failure aborts the
/// remaining batch; there is no per-item isolation.
pub struct VsacEngine<S: CredentialStore> {
    store: S,
    manager: TicketManager<S>,
    client: ValueSetClient,
    emitter: Emitter,
}

impl<S: CredentialStore + Clone> VsacEngine<S> {
    pub fn new(endpoints: Endpoints, store: S) -> Self {
        let manager = TicketManager::new(endpoints.clone(), store.clone());
        let client = ValueSetClient::new(endpoints.retrieve_url.clone());
        let emitter = Emitter::new(endpoints.fhir_base.clone());
        Self {
            store,
            manager,
            client,
            emitter,
        }
    }

    /// Fetches each value set and returns one rendered text per id.
    pub async fn fetch_and_render(&self, ids: &[String], format: &str) -> Result<Vec<String>> {
        // Format check first: an unknown format must trigger zero network calls.
        let format = OutputFormat::parse(format)?;

        let mut credential = self.store.load().await?;
        let mut outputs = Vec::with_capacity(ids.len());
        for id in ids {
            tracing::info!("Fetching value set {id}");
            let raw_xml = self.fetch_raw(&mut credential, id).await?;
            outputs.push(self.emitter.render(format, id, &raw_xml)?);
        }
        Ok(outputs)
    }

    /// Fetches each value set and writes one converted file per id,
    /// returning the written paths.
    pub async fn convert_and_write(
        &self,
        ids: &[String],
        format: &str,
        target: &OutputTarget,
    ) -> Result<Vec<PathBuf>> {
        let format = OutputFormat::parse(format)?;

        if target.file.is_some() && ids.len() > 1 {
            return Err(VsacError::AmbiguousOutputTarget);
        }
        if let Some(dir) = &target.dir {
            if !dir.is_dir() {
                return Err(VsacError::InvalidOutputDirectory(
                    dir.display().to_string(),
                ));
            }
        }

        tracing::info!(
            "Fetching and converting {} {}",
            ids.len(),
            if ids.len() == 1 {
                "value set"
            } else {
                "value sets"
            }
        );

        let mut credential = self.store.load().await?;
        let mut written = Vec::with_capacity(ids.len());
        for id in ids {
            let raw_xml = self.fetch_raw(&mut credential, id).await?;
            tracing::info!("Converting value set {id} to {format}");
            let output = self.emitter.render(format, id, &raw_xml)?;

            let path = target.path_for(id, format.suffix());
            write_output(&path, &output)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Writes an empty credential record, overwriting any existing one.
    pub async fn init_credential(&self) -> Result<()> {
        self.store.save(&Credential::empty()).await?;
        tracing::info!("credential record initialized");
        Ok(())
    }

    /// Clears the cached granting ticket and timestamp, preserving the API key.
    pub async fn reset_credential(&self) -> Result<()> {
        let mut credential = self.store.load().await?;
        credential.clear_ticket();
        self.store.save(&credential).await?;
        tracing::info!("granting ticket cleared");
        Ok(())
    }

    async fn fetch_raw(&self, credential: &mut Credential, value_set_id: &str) -> Result<String> {
        let ticket = self.manager.get_service_ticket(credential).await?;
        self.client.fetch(&ticket, value_set_id).await
    }
}

fn write_output(path: &Path, output: &str) -> Result<()> {
    fs::write(path, output).map_err(|source| VsacError::OutputWriteFailure {
        path: path.display().to_string(),
        source,
    })
}
