// src/web/mod.rs
pub mod handlers;
pub mod services;
pub mod types;

pub use services::AppServices;
pub use types::*;

use crate::database::DatabaseConfig;
use crate::environment::{EnvironmentConfig, TimeoutConfig};
use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::response::stream::EventStream;
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, put, routes, Request, Response, Shutdown, State};
use tracing::{error, info};

use crate::models::{DomainSelector, FetchAttempt, JobPosting, ResumeVersion};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// Standard API routes

#[post("/job-postings/fetch", data = "<request>")]
pub async fn fetch_posting(
    request: Json<FetchPostingRequest>,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<JobPosting>>, ApiError> {
    handlers::fetch_posting_handler(request, services).await
}

#[post("/job-postings", data = "<request>")]
pub async fn create_posting(
    request: Json<CreatePostingRequest>,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<JobPosting>>, ApiError> {
    handlers::create_posting_handler(request, services).await
}

#[get("/job-postings/<id>")]
pub async fn get_posting(
    id: &str,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<JobPosting>>, ApiError> {
    handlers::get_posting_handler(id, services).await
}

#[get("/job-postings/<id>/attempts")]
pub async fn list_attempts(
    id: &str,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<Vec<FetchAttempt>>>, ApiError> {
    handlers::list_attempts_handler(id, services).await
}

#[get("/domain-selectors")]
pub async fn list_selectors(
    services: &State<AppServices>,
) -> Result<Json<DataResponse<Vec<DomainSelector>>>, ApiError> {
    handlers::list_selectors_handler(services).await
}

#[post("/resume/design", data = "<request>")]
pub async fn design_resume(
    request: Json<DesignRequest>,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<ResumeVersion>>, ApiError> {
    handlers::design_handler(request, services).await
}

#[get("/resume/versions/<id>")]
pub async fn get_version(
    id: &str,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<ResumeVersion>>, ApiError> {
    handlers::get_version_handler(id, services).await
}

#[get("/resume/pdf/<id>")]
pub async fn get_pdf(
    id: &str,
    services: &State<AppServices>,
) -> Result<PdfFetch, ApiError> {
    handlers::get_pdf_handler(id, services).await
}

#[get("/resume/latex/<id>")]
pub async fn get_latex(
    id: &str,
    services: &State<AppServices>,
) -> Result<String, ApiError> {
    handlers::get_latex_handler(id, services).await
}

#[put("/resume/latex/<id>", data = "<request>")]
pub async fn update_latex(
    id: &str,
    request: Json<UpdateLatexRequest>,
    services: &State<AppServices>,
) -> Result<PdfResponse, ApiError> {
    handlers::update_latex_handler(id, request, services).await
}

#[post("/resume/analyze-keywords", data = "<request>")]
pub async fn analyze_keywords(
    request: Json<AnalyzeKeywordsRequest>,
    services: &State<AppServices>,
) -> Result<Json<DataResponse<KeywordAnalysisData>>, ApiError> {
    handlers::analyze_keywords_handler(request, services).await
}

#[get("/events/<kind>/<entity_id>")]
pub fn status_events(
    kind: &str,
    entity_id: &str,
    services: &State<AppServices>,
    shutdown: Shutdown,
) -> EventStream![] {
    handlers::status_stream(
        services.hub.clone(),
        kind.to_string(),
        entity_id.to_string(),
        shutdown,
    )
}

#[get("/health")]
pub async fn health() -> Json<TextResponse> {
    Json(TextResponse::success("ok".to_string()))
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the request path".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

// Main server start function
pub async fn start_web_server(environment: EnvironmentConfig, timeouts: TimeoutConfig) -> Result<()> {
    environment.ensure_directories().await?;

    let mut db_config = DatabaseConfig::new(environment.database_path.clone());

    if let Err(e) = db_config.init_pool().await {
        error!("Failed to initialize database: {}", e);
        return Err(e);
    }

    if let Err(e) = db_config.migrate().await {
        error!("Failed to run database migrations: {}", e);
        return Err(e);
    }

    let pool = db_config.pool()?.clone();
    let services = AppServices::build(&environment, timeouts, pool)?;

    info!("Starting resume pipeline API server");
    info!("Database: {}", environment.database_path.display());
    info!("Artifacts: {}", environment.artifacts_path.display());

    let _rocket = rocket::build()
        .attach(Cors)
        .manage(services)
        .register("/api", catchers![bad_request, not_found, internal_error])
        .mount(
            "/api",
            routes![
                fetch_posting,
                create_posting,
                get_posting,
                list_attempts,
                list_selectors,
                design_resume,
                get_version,
                get_pdf,
                get_latex,
                update_latex,
                analyze_keywords,
                status_events,
                health,
                options,
            ],
        )
        .launch()
        .await;

    Ok(())
}
