//! Thin client for the OpenAI files / vector-stores / assistants REST API.
//!
//! Covers exactly the calls the sync pipeline needs: store creation and
//! attachment, paginated file listing, metadata lookup, deletion, multipart
//! upload, and batch registration. Every call is a single awaited request;
//! retry policy is deliberately left to the caller (there is none).

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument};

use kbsync_shared::{KbSyncError, RemoteFile, Result, SyncSettings, UploadedFile, VectorStoreId};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("kbsync/", env!("CARGO_PKG_VERSION"));

/// Page size for vector-store file listings.
const PAGE_SIZE: u32 = 100;

/// Upload purpose tag required by the files endpoint.
const UPLOAD_PURPOSE: &str = "assistants";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Any created/returned object we only need the id of.
#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

/// One page of a vector-store file listing.
#[derive(Debug, Deserialize)]
struct FileListPage {
    data: Vec<ObjectId>,
    #[serde(default)]
    has_more: bool,
}

/// Metadata for a stored file.
#[derive(Debug, Deserialize)]
struct FileMetadata {
    id: String,
    filename: String,
}

/// The API's error envelope: `{"error": {"message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// Bearer-authenticated client over a single API base URL.
///
/// The base URL is injectable so tests can point it at a mock server.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client with the given credentials and base URL.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        // Assistants and vector-store endpoints require the beta opt-in header.
        let mut headers = HeaderMap::new();
        headers.insert("OpenAI-Beta", HeaderValue::from_static("assistants=v2"));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| KbSyncError::Network(format!("failed to build HTTP client: {e}")))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Create a client from resolved sync settings.
    pub fn from_settings(settings: &SyncSettings) -> Result<Self> {
        Self::new(
            &settings.api_key,
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Create a new vector store with the given name.
    #[instrument(skip(self))]
    pub async fn create_vector_store(&self, name: &str) -> Result<VectorStoreId> {
        let url = format!("{}/vector_stores", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| KbSyncError::Network(format!("{url}: {e}")))?;

        let created: ObjectId = Self::check(response).await?.json().await.map_err(|e| {
            KbSyncError::Network(format!("{url}: failed to decode response: {e}"))
        })?;

        debug!(store_id = %created.id, "vector store created");
        Ok(VectorStoreId::from(created.id))
    }

    /// Attach a vector store to an assistant's file-search tool resource.
    ///
    /// This replaces the assistant's store list with a single-element list:
    /// any previously attached vector stores are unset.
    #[instrument(skip(self), fields(store = %store))]
    pub async fn attach_vector_store(
        &self,
        assistant_id: &str,
        store: &VectorStoreId,
    ) -> Result<()> {
        let url = format!("{}/assistants/{assistant_id}", self.base_url);
        let payload = serde_json::json!({
            "tool_resources": {
                "file_search": {
                    "vector_store_ids": [store.as_str()]
                }
            }
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| KbSyncError::Network(format!("{url}: {e}")))?;

        Self::check(response).await?;
        Ok(())
    }

    /// List every file id in the vector store via cursor pagination.
    ///
    /// Pages of [`PAGE_SIZE`]; the cursor is the last-seen id; loops while
    /// the API reports `has_more`.
    #[instrument(skip(self), fields(store = %store))]
    pub async fn list_file_ids(&self, store: &VectorStoreId) -> Result<Vec<String>> {
        let url = format!("{}/vector_stores/{}/files", self.base_url, store);
        let mut ids: Vec<String> = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&[("limit", PAGE_SIZE)]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| KbSyncError::Network(format!("{url}: {e}")))?;

            let page: FileListPage = Self::check(response).await?.json().await.map_err(|e| {
                KbSyncError::Network(format!("{url}: failed to decode page: {e}"))
            })?;

            after = page.data.last().map(|f| f.id.clone());
            ids.extend(page.data.into_iter().map(|f| f.id));

            if !page.has_more || after.is_none() {
                break;
            }
        }

        debug!(count = ids.len(), "vector store files listed");
        Ok(ids)
    }

    /// Fetch metadata for a stored file to resolve its filename.
    pub async fn file_metadata(&self, file_id: &str) -> Result<RemoteFile> {
        let url = format!("{}/files/{file_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| KbSyncError::Network(format!("{url}: {e}")))?;

        let meta: FileMetadata = Self::check(response).await?.json().await.map_err(|e| {
            KbSyncError::Network(format!("{url}: failed to decode metadata: {e}"))
        })?;

        Ok(RemoteFile {
            id: meta.id,
            filename: meta.filename,
        })
    }

    /// Detach a file from the vector store.
    pub async fn detach_file(&self, store: &VectorStoreId, file_id: &str) -> Result<()> {
        let url = format!("{}/vector_stores/{}/files/{file_id}", self.base_url, store);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| KbSyncError::Network(format!("{url}: {e}")))?;

        Self::check(response).await?;
        Ok(())
    }

    /// Delete a file from account-level storage.
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let url = format!("{}/files/{file_id}", self.base_url);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| KbSyncError::Network(format!("{url}: {e}")))?;

        Self::check(response).await?;
        Ok(())
    }

    /// Upload a local file as an assistants-purpose file.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                KbSyncError::config(format!("upload path has no filename: {}", path.display()))
            })?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| KbSyncError::io(path, e))?;

        let form = reqwest::multipart::Form::new()
            .text("purpose", UPLOAD_PURPOSE)
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename.clone()),
            );

        let url = format!("{}/files", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| KbSyncError::Network(format!("{url}: {e}")))?;

        let created: ObjectId = Self::check(response).await?.json().await.map_err(|e| {
            KbSyncError::Network(format!("{url}: failed to decode response: {e}"))
        })?;

        debug!(%filename, file_id = %created.id, "file uploaded");
        Ok(UploadedFile { id: created.id })
    }

    /// Register uploaded files with the vector store as one indexing batch.
    ///
    /// Returns the batch id the API assigned to the async indexing job.
    #[instrument(skip(self, file_ids), fields(store = %store, count = file_ids.len()))]
    pub async fn create_file_batch(
        &self,
        store: &VectorStoreId,
        file_ids: &[String],
    ) -> Result<String> {
        let url = format!("{}/vector_stores/{}/file_batches", self.base_url, store);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "file_ids": file_ids }))
            .send()
            .await
            .map_err(|e| KbSyncError::Network(format!("{url}: {e}")))?;

        let batch: ObjectId = Self::check(response).await?.json().await.map_err(|e| {
            KbSyncError::Network(format!("{url}: failed to decode response: {e}"))
        })?;

        Ok(batch.id)
    }

    /// Map a non-2xx response to [`KbSyncError::Api`], decoding the API's
    /// error envelope when present.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .map(|e| e.message)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    body
                }
            });

        Err(KbSyncError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
