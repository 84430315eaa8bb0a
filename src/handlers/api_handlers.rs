//! HTTP handlers for the gateway API path.
//!
//! Dispatch is by method plus `?action=`; every mutating action passes the
//! shared-secret check before the body is read. Storage work is delegated to
//! `FileService`.

use crate::{
    errors::AppError,
    models::request::{
        Action, ApiQuery, DeleteRequest, RenameRequest, SuccessResponse, UploadResponse,
    },
    services::file_service::{RenameOutcome, UploadFile},
    state::AppState,
};
use axum::{
    Json,
    extract::{FromRequest, Multipart, Query, Request, State, multipart::MultipartError},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::warn;

pub const AUTH_HEADER: &str = "x-custom-auth";

/// `GET`: version info or prefix listing.
pub async fn handle_get(
    State(state): State<AppState>,
    Query(q): Query<ApiQuery>,
) -> Result<Response, AppError> {
    match Action::parse(q.action.as_deref()) {
        Action::Version => Ok(Json(state.version_info()).into_response()),
        Action::List => {
            let prefix = q.prefix.unwrap_or_default();
            let files = state.files.list_files(&prefix).await?;
            Ok(Json(files).into_response())
        }
        other => Err(AppError::unsupported_action(other.as_str())),
    }
}

/// `POST`: version info, or an authorized upload / rename / delete.
pub async fn handle_post(
    State(state): State<AppState>,
    Query(q): Query<ApiQuery>,
    headers: HeaderMap,
    request: Request,
) -> Result<Response, AppError> {
    let action = Action::parse(q.action.as_deref());
    if action == Action::Version {
        return Ok(Json(state.version_info()).into_response());
    }

    authorize(&headers, &state.auth_token)?;

    match action {
        Action::Upload => {
            let multipart = Multipart::from_request(request, &state)
                .await
                .map_err(|rej| AppError::new(rej.status(), rej.body_text()))?;
            upload(&state, multipart).await
        }
        Action::Rename => {
            let req: RenameRequest = json_body(request, &state).await?;
            match state.files.rename_file(&req).await? {
                RenameOutcome::Renamed => Ok(success()),
                RenameOutcome::SourceMissing => Err(AppError::not_found("File not found")),
            }
        }
        Action::Delete => {
            let req: DeleteRequest = json_body(request, &state).await?;
            state.files.delete_file(&req.key).await?;
            Ok(success())
        }
        Action::Version | Action::List | Action::Unsupported(_) => {
            Err(AppError::unsupported_action(action.as_str()))
        }
    }
}

/// Plain equality against the configured shared secret.
fn authorize(headers: &HeaderMap, expected: &str) -> Result<(), AppError> {
    let provided = headers.get(AUTH_HEADER).and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        warn!(header_present = provided.is_some(), "rejected mutating request");
        Err(AppError::unauthorized())
    }
}

async fn upload(state: &AppState, mut multipart: Multipart) -> Result<Response, AppError> {
    let mut file: Option<UploadFile> = None;
    let mut custom_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadFile {
                    original_name,
                    content_type,
                    custom_name: None,
                    data,
                });
            }
            Some("customName") => {
                custom_name = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let Some(mut file) = file else {
        return Err(AppError::bad_request("Missing `file` form field"));
    };
    file.custom_name = custom_name;

    let url = state.files.upload_file(file).await?;
    Ok(Json(UploadResponse { success: true, url }).into_response())
}

/// Decode a JSON body regardless of the declared content type; browser
/// clients commonly post JSON strings as `text/plain`.
async fn json_body<T: DeserializeOwned>(
    request: Request,
    state: &AppState,
) -> Result<T, AppError> {
    let bytes = Bytes::from_request(request, state)
        .await
        .map_err(|rej| AppError::new(rej.status(), rej.body_text()))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| AppError::bad_request(format!("Invalid JSON body: {}", err)))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::new(err.status(), err.body_text())
}

fn success() -> Response {
    Json(SuccessResponse { success: true }).into_response()
}
