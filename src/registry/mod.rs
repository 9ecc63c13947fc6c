use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{ConversionResult, FileItemView, FileStatus, SourceFile};

/// Global file registry shared by the API handlers.
pub static FILE_REGISTRY: Lazy<FileRegistry> = Lazy::new(FileRegistry::new);

/// A registered file and everything produced for it so far.
///
/// The source bytes double as the preview resource: removing the item
/// drops them, so the preview cannot outlive its owner.
#[derive(Debug, Clone)]
struct FileItem {
    file: SourceFile,
    status: FileStatus,
    ai_insights: Option<String>,
    translation: Option<String>,
    output_format: Option<String>,
    artifact: Option<ConversionResult>,
    created_at: DateTime<Utc>,
}

/// In-memory registry of uploaded files keyed by id.
///
/// Operations never hold a lock across an await point: `begin` hands the
/// caller an owned clone of the source, and the completion methods
/// tolerate an item that was deleted while the operation was in flight
/// by silently discarding the update.
pub struct FileRegistry {
    items: RwLock<HashMap<Uuid, FileItem>>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, file: SourceFile) -> Uuid {
        let id = Uuid::new_v4();
        let item = FileItem {
            file,
            status: FileStatus::Idle,
            ai_insights: None,
            translation: None,
            output_format: None,
            artifact: None,
            created_at: Utc::now(),
        };
        self.items.write().await.insert(id, item);
        info!(item_id = %id, "File registered");
        id
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<FileItemView> {
        let items = self.items.read().await;
        items.get(&id).map(|item| FileItemView {
            id,
            name: item.file.name.clone(),
            size: item.file.size,
            mime_type: item.file.mime_type.clone(),
            category: item.file.category().to_string(),
            status: item.status,
            ai_insights: item.ai_insights.clone(),
            translation: item.translation.clone(),
            output_format: item.output_format.clone(),
            has_artifact: item.artifact.is_some(),
            preview_url: preview_url(id, &item.file),
            created_at: item.created_at,
        })
    }

    /// Owned copy of the source bytes, for the preview endpoint.
    pub async fn source(&self, id: Uuid) -> Option<SourceFile> {
        self.items.read().await.get(&id).map(|item| item.file.clone())
    }

    /// Last stored conversion artifact, if any.
    pub async fn artifact(&self, id: Uuid) -> Option<ConversionResult> {
        self.items
            .read()
            .await
            .get(&id)
            .and_then(|item| item.artifact.clone())
    }

    /// Removes the item, dropping its source bytes and artifact.
    /// Idempotent: removing an unknown id is not an error.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.items.write().await.remove(&id).is_some();
        if removed {
            info!(item_id = %id, "File removed from registry");
        } else {
            debug!(item_id = %id, "Remove requested for unknown item");
        }
        removed
    }

    /// Starts an operation: moves the item into the given busy status and
    /// returns an owned clone of the source so the operation has exclusive
    /// use of its own decode surface.
    pub async fn begin(&self, id: Uuid, busy: FileStatus) -> AppResult<SourceFile> {
        let mut items = self.items.write().await;
        let item = items.get_mut(&id).ok_or(AppError::ItemNotFound { id })?;
        if !item.status.can_start() {
            return Err(AppError::ItemBusy {
                status: item.status,
            });
        }
        item.status = busy;
        debug!(item_id = %id, status = ?busy, "Operation started");
        Ok(item.file.clone())
    }

    /// Stores AI insights and returns the item to idle.
    /// Silently ignored when the item was deleted mid-flight.
    pub async fn store_insights(&self, id: Uuid, text: String) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&id) {
            item.ai_insights = Some(text);
            item.status = FileStatus::Idle;
        } else {
            debug!(item_id = %id, "Insights arrived for removed item, dropping");
        }
    }

    /// Stores a translation and returns the item to idle.
    /// Silently ignored when the item was deleted mid-flight.
    pub async fn store_translation(&self, id: Uuid, text: String) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&id) {
            item.translation = Some(text);
            item.status = FileStatus::Idle;
        } else {
            debug!(item_id = %id, "Translation arrived for removed item, dropping");
        }
    }

    /// Stores a conversion artifact and marks the item completed.
    /// Silently ignored when the item was deleted mid-flight.
    pub async fn store_artifact(&self, id: Uuid, format: String, result: ConversionResult) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&id) {
            item.output_format = Some(format);
            item.artifact = Some(result);
            item.status = FileStatus::Completed;
        } else {
            debug!(item_id = %id, "Artifact arrived for removed item, dropping");
        }
    }

    /// Marks a failed operation. Silently ignored for removed items.
    pub async fn mark_error(&self, id: Uuid) {
        let mut items = self.items.write().await;
        if let Some(item) = items.get_mut(&id) {
            item.status = FileStatus::Error;
        } else {
            debug!(item_id = %id, "Error arrived for removed item, dropping");
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn preview_url(id: Uuid, file: &SourceFile) -> Option<String> {
    if file.is_image() {
        Some(format!("/api/v1/files/{}/preview", id))
    } else {
        None
    }
}
