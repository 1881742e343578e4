//! CSV import workflow: job creation, upload and progress hand-off

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::progress_sync::{ProgressHandle, ProgressSynchronizer};
use crate::infrastructure::catalog_api::ImportApi;
use crate::infrastructure::http_client::ApiError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Only CSV files can be imported: {0}")]
    NotCsv(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Clone)]
pub struct ImportWorkflow {
    imports: Arc<dyn ImportApi>,
    progress: ProgressSynchronizer,
}

impl ImportWorkflow {
    pub fn new(imports: Arc<dyn ImportApi>, progress: ProgressSynchronizer) -> Self {
        Self { imports, progress }
    }

    /// Reads a CSV from disk and starts importing it
    pub async fn start_file(&self, path: &Path) -> Result<ProgressHandle, ImportError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        ensure_csv(&file_name)?;
        let bytes = tokio::fs::read(path).await.map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.start(&file_name, bytes).await
    }

    /// Uploads the file and starts watching the resulting job.
    ///
    /// Tries the direct-upload path first when the backend hands out
    /// credentials, and falls back to the server-side upload otherwise or
    /// when the direct upload fails. Calling this again is the retry path.
    pub async fn start(&self, file_name: &str, bytes: Vec<u8>) -> Result<ProgressHandle, ImportError> {
        ensure_csv(file_name)?;
        let job_id = self.upload(file_name, bytes).await?;
        info!("📤 Import job {} queued for {}", job_id, file_name);
        Ok(self.progress.watch(job_id))
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Uuid, ApiError> {
        let init = self.imports.init_import().await?;

        if let Some(credentials) = init.direct_upload {
            match self.imports.upload_direct(&credentials, file_name, bytes.clone()).await {
                Ok(file_url) => {
                    let accepted = self.imports.complete_import(init.job_id, &file_url).await?;
                    return Ok(accepted.job_id);
                }
                Err(e) => warn!("Direct upload failed, falling back to server upload: {}", e),
            }
        }

        let accepted = self.imports.upload_csv(file_name, bytes).await?;
        Ok(accepted.job_id)
    }
}

fn ensure_csv(file_name: &str) -> Result<(), ImportError> {
    let is_csv = Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(ImportError::NotCsv(file_name.to_string()))
    }
}
