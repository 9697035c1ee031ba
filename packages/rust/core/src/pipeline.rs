//! End-to-end `sync` pipeline: preflight → store → enumerate → clean → upload → register.
//!
//! Each phase is a named step taking and returning explicit values; the
//! only shared state is the resolved store id threaded through the run.
//! Preflight is the single gate before any remote call — every later
//! unhandled error terminates the run.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use kbsync_client::OpenAiClient;
use kbsync_shared::{
    KbSyncError, REQUIRED_FILES, RemoteFile, Result, SyncSettings, UploadedFile, VectorStoreId,
};

// ---------------------------------------------------------------------------
// SyncReport
// ---------------------------------------------------------------------------

/// Summary of a completed sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// The vector store the files were registered with.
    pub store_id: VectorStoreId,
    /// Whether the store was created (and attached) during this run.
    pub store_created: bool,
    /// Number of stale remote copies removed.
    pub files_removed: usize,
    /// Number of local files uploaded.
    pub files_uploaded: usize,
    /// Id of the indexing batch the API assigned.
    pub batch_id: String,
    /// Total duration of the run.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each file upload completes.
    fn file_uploaded(&self, name: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &SyncReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn file_uploaded(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &SyncReport) {}
}

// ---------------------------------------------------------------------------
// Pipeline entry point
// ---------------------------------------------------------------------------

/// Run the full sync pipeline.
///
/// 1. Preflight: required local files present (no network before this passes)
/// 2. Ensure vector store (create + attach if none supplied)
/// 3. Enumerate remote files, matching against the required set
/// 4. Remove stale copies (404-tolerant)
/// 5. Upload fresh copies in fixed order
/// 6. Register the uploads as one indexing batch
#[instrument(skip_all, fields(assistant_id = %settings.assistant_id))]
pub async fn run_sync(
    settings: &SyncSettings,
    progress: &dyn ProgressReporter,
) -> Result<SyncReport> {
    let start = Instant::now();

    progress.phase("Validating local files");
    preflight(settings)?;

    let client = OpenAiClient::from_settings(settings)?;

    progress.phase("Ensuring vector store");
    let (store_id, store_created) = ensure_store(&client, settings).await?;

    progress.phase("Listing remote files");
    let matched = enumerate_remote(&client, &store_id).await?;

    progress.phase("Removing stale copies");
    let files_removed = remove_stale(&client, &store_id, &matched).await?;

    progress.phase("Uploading documentation");
    let uploaded = upload_all(&client, settings, progress).await?;

    progress.phase("Registering file batch");
    let batch_id = register(&client, &store_id, &uploaded).await?;

    let report = SyncReport {
        store_id,
        store_created,
        files_removed,
        files_uploaded: uploaded.len(),
        batch_id,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        store_id = %report.store_id,
        store_created = report.store_created,
        files_removed = report.files_removed,
        files_uploaded = report.files_uploaded,
        batch_id = %report.batch_id,
        elapsed_ms = report.elapsed.as_millis(),
        "sync complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Check that every required documentation file exists locally.
///
/// Fails on the first missing file. This is the only gate before the
/// pipeline starts issuing remote calls.
pub fn preflight(settings: &SyncSettings) -> Result<()> {
    for name in REQUIRED_FILES {
        let path = settings.working_dir.join(name);
        if !path.is_file() {
            return Err(KbSyncError::MissingFile { path });
        }
    }
    Ok(())
}

/// Resolve the vector store for this run.
///
/// A supplied id is used as-is. Otherwise a store is created (name carries
/// a UTC timestamp for uniqueness) and attached to the assistant — exactly
/// one create then one attach, in that order. The attach replaces the
/// assistant's store list, unsetting anything previously attached.
async fn ensure_store(
    client: &OpenAiClient,
    settings: &SyncSettings,
) -> Result<(VectorStoreId, bool)> {
    if let Some(store_id) = &settings.vector_store_id {
        debug!(%store_id, "using supplied vector store");
        return Ok((store_id.clone(), false));
    }

    let name = format!("yeahdesk-knowledge-{}", Utc::now().timestamp_millis());
    let store_id = client.create_vector_store(&name).await?;
    client
        .attach_vector_store(&settings.assistant_id, &store_id)
        .await?;

    // The id is not persisted anywhere; capture it from the logs or the
    // run summary if you want to reuse the store next run.
    info!(%store_id, %name, "vector store created and attached to assistant");
    Ok((store_id, true))
}

/// List the store's files and collect those whose filename is in the
/// required set.
///
/// A failed metadata lookup excludes that file from the removal set but
/// never aborts the run.
async fn enumerate_remote(
    client: &OpenAiClient,
    store_id: &VectorStoreId,
) -> Result<Vec<RemoteFile>> {
    let ids = client.list_file_ids(store_id).await?;

    let mut matched = Vec::new();
    for id in &ids {
        match client.file_metadata(id).await {
            Ok(remote) if REQUIRED_FILES.contains(&remote.filename.as_str()) => {
                debug!(file_id = %remote.id, filename = %remote.filename, "stale copy found");
                matched.push(remote);
            }
            Ok(_) => {}
            Err(e) => {
                warn!(file_id = %id, error = %e, "metadata lookup failed, skipping file");
            }
        }
    }

    info!(
        listed = ids.len(),
        matched = matched.len(),
        "remote files enumerated"
    );
    Ok(matched)
}

/// Remove each matched file: detach from the vector store first, then
/// delete from account storage. 404s mean the resource is already gone
/// and count as success; any other error terminates the run.
async fn remove_stale(
    client: &OpenAiClient,
    store_id: &VectorStoreId,
    matched: &[RemoteFile],
) -> Result<usize> {
    for file in matched {
        tolerate_not_found(client.detach_file(store_id, &file.id).await, &file.id)?;
        tolerate_not_found(client.delete_file(&file.id).await, &file.id)?;
        debug!(file_id = %file.id, filename = %file.filename, "stale copy removed");
    }
    Ok(matched.len())
}

/// Treat a 404 as success (idempotent delete); propagate everything else.
fn tolerate_not_found(result: Result<()>, file_id: &str) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => {
            debug!(%file_id, "already gone, treating delete as success");
            Ok(())
        }
        other => other,
    }
}

/// Upload each required file in `REQUIRED_FILES` order, collecting the
/// returned ids in that same order.
async fn upload_all(
    client: &OpenAiClient,
    settings: &SyncSettings,
    progress: &dyn ProgressReporter,
) -> Result<Vec<UploadedFile>> {
    let total = REQUIRED_FILES.len();
    let mut uploaded = Vec::with_capacity(total);

    for (i, name) in REQUIRED_FILES.iter().enumerate() {
        let path = settings.working_dir.join(name);
        let file = client.upload_file(&path).await?;
        progress.file_uploaded(name, i + 1, total);
        uploaded.push(file);
    }

    Ok(uploaded)
}

/// Register all uploaded ids with the store as a single indexing batch.
///
/// Always the batch endpoint, regardless of count — the single-file attach
/// endpoint is a strict subset of this behavior.
async fn register(
    client: &OpenAiClient,
    store_id: &VectorStoreId,
    uploaded: &[UploadedFile],
) -> Result<String> {
    let file_ids: Vec<String> = uploaded.iter().map(|f| f.id.clone()).collect();
    let batch_id = client.create_file_batch(store_id, &file_ids).await?;

    info!(%batch_id, count = file_ids.len(), "file batch registered");
    Ok(batch_id)
}
