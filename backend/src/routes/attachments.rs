use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use shared::Attachment;

use crate::error::{KanbanError, Result};
use crate::extract::ApiPath;
use crate::store::NewAttachment;
use crate::uploads::mime_type_for;
use crate::AppState;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";

pub async fn list_attachments(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
) -> Result<Json<Vec<Attachment>>> {
    Ok(Json(state.repo.attachments_of_task(task_id).await?))
}

pub async fn upload_attachment(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Attachment>)> {
    let mut multipart = multipart.map_err(|e| KanbanError::validation(e.body_text()))?;

    // Reject before anything touches the disk.
    state.repo.get_task(task_id).await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("file").to_string();
        let declared = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        upload = Some((file_name, declared, bytes));
        break;
    }
    let Some((file_name, declared, bytes)) = upload else {
        return Err(KanbanError::validation("No file uploaded"));
    };

    let stored = state.uploads.save(&file_name, &bytes).await?;
    let created = state
        .repo
        .create_attachment(NewAttachment {
            task_id,
            mime_type: mime_type_for(&file_name, declared.as_deref()),
            file_name,
            file_url: stored.url.clone(),
            file_size: stored.size,
        })
        .await;

    match created {
        Ok(attachment) => {
            tracing::info!(
                task_id,
                attachment_id = attachment.id,
                size = attachment.file_size,
                "stored attachment"
            );
            Ok((StatusCode::CREATED, Json(attachment)))
        }
        Err(e) => {
            if let Err(cleanup) = state.uploads.remove(&stored.url).await {
                tracing::warn!(file = %stored.url, error = %cleanup, "failed to remove orphaned upload");
            }
            Err(e)
        }
    }
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    ApiPath(attachment_id): ApiPath<i64>,
) -> Result<StatusCode> {
    let attachment = state.repo.delete_attachment(attachment_id).await?;
    state.uploads.remove_all(std::slice::from_ref(&attachment)).await;
    tracing::info!(attachment_id, task_id = attachment.task_id, "deleted attachment");
    Ok(StatusCode::NO_CONTENT)
}
