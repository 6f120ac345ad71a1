use actix_web::{get, web, Responder};

use super::html;
use crate::pages::stats;
use crate::state::AppState;
use crate::views;

#[get("/stats")]
async fn stats_page(app: web::Data<AppState>) -> impl Responder {
    let view = stats::load(&app).await;
    html(views::stats::stats_page(&view))
}

pub fn stats_config(cfg: &mut web::ServiceConfig) {
    cfg.service(stats_page);
}
