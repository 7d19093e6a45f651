use actix_web::http::header;
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};

use crate::funnel::FunnelController;
use crate::models::Attribution;
use crate::web::helpers::render;
use crate::web::state::AppState;
use crate::web::templates::{FunnelPageTemplate, FunnelView};

/// Landing page. Captures campaign attribution from the query string and
/// referrer, then renders the first funnel step.
#[get("/")]
pub async fn landing(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let referrer = req
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok());
    let attribution = Attribution::capture(req.query_string(), referrer);

    if !attribution.is_empty() {
        log::info!("Visit attributed to {}", attribution.describe());
    }
    state.gateway.track_load(&attribution);

    let funnel = FunnelController::new(attribution);
    let view = FunnelView::build(
        &funnel,
        &state.seal,
        chrono::Utc::now(),
        state.funnel.summary_word_interval,
    );
    render(FunnelPageTemplate { view })
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(landing).service(health);
}
