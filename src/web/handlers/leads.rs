use actix_web::http::StatusCode;
use actix_web::{error, post, web, HttpRequest, HttpResponse, Responder};

use crate::common::{GatewayError, SummaryError};
use crate::types::{
    CompleteLeadResponse, ErrorResponse, LeadRequest, PartialLeadResponse,
    SummaryResponse,
};
use crate::web::helpers::{json_error, json_issues, paced_words, too_many_requests};
use crate::web::security::{client_key, generic_error_message};
use crate::web::state::AppState;

/// Malformed JSON gets the same error body as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| {
            let body = ErrorResponse::new(format!("Invalid request body: {}", err));
            let response = HttpResponse::BadRequest().json(body);
            error::InternalError::from_response(err, response).into()
        })
}

#[post("/api/leads")]
pub async fn save_partial(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<LeadRequest>,
) -> impl Responder {
    if !state.rate_limiter.check(&client_key(&req, "partial")) {
        return too_many_requests();
    }

    let (id, draft) = match body.into_inner().into_draft() {
        Ok(parsed) => parsed,
        Err(issues) => return json_issues(issues),
    };

    match state.gateway.record_partial(id, &draft).await {
        Ok(outcome) => HttpResponse::Ok().json(PartialLeadResponse {
            success: true,
            id: outcome.record.id,
        }),
        Err(e) => {
            log::error!("Partial lead request failed: {}", e);
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &generic_error_message("request"),
            )
        }
    }
}

#[post("/api/leads/complete")]
pub async fn complete(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<LeadRequest>,
) -> impl Responder {
    if !state.rate_limiter.check(&client_key(&req, "complete")) {
        return too_many_requests();
    }

    let (id, draft) = match body.into_inner().into_draft() {
        Ok(parsed) => parsed,
        Err(issues) => return json_issues(issues),
    };

    let completed = match state.gateway.record_complete(id, &draft).await {
        Ok(completed) => completed,
        Err(GatewayError::Validation(issues)) => return json_issues(issues),
        Err(GatewayError::AlreadyCompleted(_)) => {
            return json_error(
                StatusCode::CONFLICT,
                "This lead has already been submitted",
            );
        }
        Err(e) => {
            log::error!("Lead completion failed: {}", e);
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &generic_error_message("submission"),
            );
        }
    };

    let (data, warning) = if state.gateway.settings().await_forward {
        let (record, outcome) = completed.settle().await;
        (record, outcome.warning())
    } else {
        (completed.record, None)
    };

    HttpResponse::Ok().json(CompleteLeadResponse {
        success: true,
        data,
        warning,
    })
}

#[post("/api/leads/summary")]
pub async fn summarize(
    state: web::Data<AppState>,
    body: web::Json<LeadRequest>,
) -> impl Responder {
    let draft = match body.into_inner().into_draft() {
        Ok((_, draft)) => draft,
        Err(issues) => return json_issues(issues),
    };

    match state.summaries.generate(&draft).await {
        Ok(generated) => HttpResponse::Ok().json(SummaryResponse {
            summary: generated.into_text(),
        }),
        Err(e) => summary_failure(e),
    }
}

/// Same as `/api/leads/summary`, delivered word by word as plain text.
#[post("/api/leads/summary/stream")]
pub async fn summarize_stream(
    state: web::Data<AppState>,
    body: web::Json<LeadRequest>,
) -> impl Responder {
    let draft = match body.into_inner().into_draft() {
        Ok((_, draft)) => draft,
        Err(issues) => return json_issues(issues),
    };

    match state.summaries.generate(&draft).await {
        Ok(generated) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .streaming(paced_words(
                &generated,
                state.funnel.summary_word_interval,
            )),
        Err(e) => summary_failure(e),
    }
}

fn summary_failure(err: SummaryError) -> HttpResponse {
    match err {
        SummaryError::Incomplete => {
            json_error(StatusCode::BAD_REQUEST, &err.to_string())
        }
        SummaryError::Provider(_) => {
            log::error!("{}", err);
            json_error(
                StatusCode::BAD_GATEWAY,
                "We couldn't prepare your evaluation. Please try again.",
            )
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(save_partial)
        .service(complete)
        .service(summarize)
        .service(summarize_stream);
}
