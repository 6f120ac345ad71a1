use actix_web::http::header;
use actix_web::{get, post, web, HttpResponse, Responder};
use actix_web_validator::{Form, Query};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use super::html;
use crate::pages::favorites::{self, FavoritesParams, FavoritesState};
use crate::pages::list::{self, ListParams, ListState};
use crate::pages::{encode_query, Notice};
use crate::remote::JobStatus;
use crate::state::AppState;
use crate::views;

/// Where a mutation sends the browser back to
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_return_path"))]
pub struct ReturnForm {
    pub return_to: String,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_status_return_path"))]
pub struct StatusForm {
    pub status: JobStatus,
    pub return_to: String,
}

/// Only same-site paths are followed after a mutation
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

fn check_return_path(path: &str) -> Result<(), ValidationError> {
    if is_local_path(path) {
        Ok(())
    } else {
        let mut err = ValidationError::new("return_to");
        err.message = Some(Cow::from("Return path must be a path on this site"));
        Err(err)
    }
}

fn validate_return_path(form: &ReturnForm) -> Result<(), ValidationError> {
    check_return_path(&form.return_to)
}

fn validate_status_return_path(form: &StatusForm) -> Result<(), ValidationError> {
    check_return_path(&form.return_to)
}

#[derive(Serialize)]
struct NoticeParam {
    notice: Notice,
}

/// `return_to` with a one-shot notice appended to its query string
fn with_notice(return_to: &str, notice: Notice) -> String {
    let (path, fragment) = match return_to.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (return_to, None),
    };
    let separator = if path.contains('?') { '&' } else { '?' };
    let mut location = format!(
        "{}{}{}",
        path,
        separator,
        encode_query(&NoticeParam { notice })
    );
    if let Some(fragment) = fragment {
        location.push('#');
        location.push_str(fragment);
    }
    location
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[get("/")]
async fn list_page(app: web::Data<AppState>, params: Query<ListParams>) -> impl Responder {
    let state = ListState::from_params(params.into_inner());
    let view = list::load(&app, state).await;
    html(views::list::list_page(&view))
}

#[get("/favorites")]
async fn favorites_page(
    app: web::Data<AppState>,
    params: Query<FavoritesParams>,
) -> impl Responder {
    let state = FavoritesState::from_params(params.into_inner());
    let view = favorites::load(&app, state).await;
    html(views::list::favorites_page(&view))
}

#[post("/jobs/{id}/favorite")]
async fn toggle_favorite(
    app: web::Data<AppState>,
    path: web::Path<i64>,
    form: Form<ReturnForm>,
) -> impl Responder {
    let id = path.into_inner();
    let ReturnForm { return_to } = form.into_inner();

    match app.queries.toggle_favorite(id).await {
        Ok(job) => {
            info!("Job {} favorite set to {}", id, job.is_favorite);
            see_other(&return_to)
        }
        Err(e) => {
            warn!("Failed to toggle favorite on job {}: {}", id, e);
            see_other(&with_notice(&return_to, Notice::FavoriteFailed))
        }
    }
}

#[post("/jobs/{id}/status")]
async fn update_status(
    app: web::Data<AppState>,
    path: web::Path<i64>,
    form: Form<StatusForm>,
) -> impl Responder {
    let id = path.into_inner();
    let StatusForm { status, return_to } = form.into_inner();

    match app.queries.update_status(id, status).await {
        Ok(job) => {
            info!("Job {} status changed to {:?}", id, job.status);
            see_other(&return_to)
        }
        Err(e) => {
            warn!("Failed to change status of job {}: {}", id, e);
            see_other(&with_notice(&return_to, Notice::StatusFailed))
        }
    }
}

pub fn jobs_config(cfg: &mut web::ServiceConfig) {
    cfg.service(list_page)
        .service(favorites_page)
        .service(toggle_favorite)
        .service(update_status);
}
