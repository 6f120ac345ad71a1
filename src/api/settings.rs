use actix_web::{get, post, web, Responder};

use super::error::PageError;
use super::html;
use crate::pages::settings::{self, SettingsDraft};
use crate::remote::NotificationChannel;
use crate::state::AppState;
use crate::views;

#[get("/settings")]
async fn settings_page(app: web::Data<AppState>) -> impl Responder {
    let view = settings::load(&app).await;
    html(views::settings::settings_page(&view))
}

#[post("/settings")]
async fn save_settings(
    app: web::Data<AppState>,
    draft: web::Form<SettingsDraft>,
) -> impl Responder {
    let view = settings::save(&app, draft.into_inner()).await;
    html(views::settings::settings_page(&view))
}

#[post("/settings/test/{channel}")]
async fn send_test(
    app: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder, PageError> {
    let channel: NotificationChannel = path
        .into_inner()
        .parse()
        .map_err(PageError::bad_request)?;
    let view = settings::send_test(&app, channel).await;
    Ok(html(views::settings::settings_page(&view)))
}

pub fn settings_config(cfg: &mut web::ServiceConfig) {
    cfg.service(settings_page)
        .service(save_settings)
        .service(send_test);
}
