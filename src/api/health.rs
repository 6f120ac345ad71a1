use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use tracing::{debug, error};

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// General health check including reachability of the Remote Job API.
/// Use for load balancers and uptime monitors.
#[get("/health")]
async fn health_check(app: web::Data<AppState>) -> impl Responder {
    match app.queries.api().ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "healthy".to_string(),
            backend: "reachable".to_string(),
            error: None,
        }),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "unhealthy".to_string(),
                backend: "unreachable".to_string(),
                error: Some(format!("Backend error: {}", e)),
            })
        }
    }
}

/// Readiness check endpoint
///
/// Pages render error states while the backend is down, so the dashboard is
/// only ready to take traffic once the backend answers.
#[get("/ready")]
async fn readiness_check(app: web::Data<AppState>) -> impl Responder {
    match app.queries.api().ping().await {
        Ok(()) => {
            debug!("Readiness check passed");
            HttpResponse::Ok().json(HealthResponse {
                status: "ready".to_string(),
                backend: "reachable".to_string(),
                error: None,
            })
        }
        Err(e) => {
            error!("Readiness check failed: backend unavailable: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "not_ready".to_string(),
                backend: "unreachable".to_string(),
                error: Some(format!("Backend unavailable: {}", e)),
            })
        }
    }
}

/// Liveness check endpoint
///
/// Simple check that the process is alive. Does not check the backend.
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive".to_string(),
        backend: "not_checked".to_string(),
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}
