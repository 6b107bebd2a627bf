use actix_web::{HttpResponse, delete, get, http::header, post, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use gitdocx_jobs::StartJob;
use gitdocx_shared::{JobId, JobStatus};

use crate::{AppState, error::ApiError};

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health)
            .service(convert)
            .service(status)
            .service(download)
            .service(cleanup),
    );
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "message": "GitDocx API is running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConvertRequest {
    url: String,
    token: Option<String>,
    extensions: Option<Vec<String>>,
}

#[post("/convert")]
async fn convert(
    body: web::Json<ConvertRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let ConvertRequest {
        url,
        token,
        extensions,
    } = body.into_inner();

    let job_id = state
        .jobs
        .start_job(StartJob {
            url,
            token,
            extensions,
        })
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "job_id": job_id,
        "status": JobStatus::Queued,
    })))
}

#[get("/status/{job_id}")]
async fn status(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let job_id = parse_job_id(&path.into_inner())?;
    let view = state.jobs.status(&job_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[derive(Deserialize)]
struct DownloadPath {
    job_id: String,
    filename: String,
}

#[get("/download/{job_id}/{filename}")]
async fn download(
    params: web::Path<DownloadPath>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let DownloadPath { job_id, filename } = params.into_inner();
    let job_id = parse_job_id(&job_id)?;
    let path = state.jobs.artifact_path(&job_id, &filename).await?;
    let bytes = tokio::fs::read(&path).await?;

    Ok(HttpResponse::Ok()
        .content_type(DOCX_CONTENT_TYPE)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(bytes))
}

#[delete("/cleanup/{job_id}")]
async fn cleanup(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let job_id = parse_job_id(&path.into_inner())?;
    state.jobs.cleanup(&job_id).await?;
    info!(%job_id, "cleanup requested");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Job cleaned up successfully"
    })))
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("job {raw}")))
}
