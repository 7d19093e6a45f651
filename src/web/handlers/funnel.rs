use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;

use crate::common::{GatewayError, StepError};
use crate::funnel::{FunnelController, FunnelStep, Selection, SummaryGate};
use crate::models::Attribution;
use crate::web::forms::{ContactForm, NameForm, SelectForm, StateForm};
use crate::web::helpers::{is_htmx, render};
use crate::web::security::{client_key, generic_error_message};
use crate::web::state::AppState;
use crate::web::templates::{FunnelPageTemplate, FunnelStepTemplate, FunnelView};

const SESSION_EXPIRED: &str =
    "Your session expired. Please start again from the first question.";

fn respond(req: &HttpRequest, view: FunnelView) -> HttpResponse {
    if is_htmx(req) {
        render(FunnelStepTemplate { view })
    } else {
        render(FunnelPageTemplate { view })
    }
}

fn view_of(state: &AppState, funnel: &FunnelController) -> FunnelView {
    FunnelView::build(
        funnel,
        &state.seal,
        Utc::now(),
        state.funnel.summary_word_interval,
    )
}

/// Opens the session posted back by the page. Tampered or stale state is
/// refused rather than repaired.
fn restore(state: &AppState, raw: &str) -> Option<FunnelController> {
    match state.seal.open(raw) {
        Ok(funnel) => Some(funnel),
        Err(e) => {
            log::warn!("Refusing funnel state: {}", e);
            None
        }
    }
}

fn expired(state: &AppState, req: &HttpRequest) -> HttpResponse {
    let funnel = FunnelController::new(Attribution::default());
    respond(req, view_of(state, &funnel).with_error(SESSION_EXPIRED))
}

fn refused(
    state: &AppState,
    req: &HttpRequest,
    funnel: &FunnelController,
    err: StepError,
) -> HttpResponse {
    let view = view_of(state, funnel);
    let view = match err {
        StepError::Validation(issues) => view.with_issues(issues),
        other => view.with_error(other.to_string()),
    };
    respond(req, view)
}

/// Saves progress after an answer. Failures are logged and never block
/// the visitor.
async fn save_progress(
    state: &AppState,
    req: &HttpRequest,
    funnel: &mut FunnelController,
) {
    if !state.rate_limiter.check(&client_key(req, "partial")) {
        log::warn!("Partial save skipped: rate limit reached");
        return;
    }

    match state
        .gateway
        .record_partial(funnel.lead_id(), funnel.draft())
        .await
    {
        Ok(outcome) => funnel.remember_lead_id(outcome.record.id),
        Err(e) => log::warn!("Partial save failed: {}", e),
    }
}

/// Generates and attaches the summary when the funnel sits on the summary
/// step without one.
async fn ensure_summary(
    state: &AppState,
    funnel: &mut FunnelController,
) -> Option<String> {
    if funnel.step() != FunnelStep::Summary
        || funnel.summary_gate(Utc::now()) != SummaryGate::Generating
    {
        return None;
    }

    let summary = match state.summaries.generate(funnel.draft()).await {
        Ok(summary) => summary,
        Err(e) => {
            log::warn!("Summary generation failed: {}", e);
            return Some(
                "We couldn't prepare your evaluation. Please try again."
                    .to_string(),
            );
        }
    };

    match funnel.attach_summary(
        summary.into_text(),
        Utc::now(),
        state.funnel.summary_min_display,
    ) {
        Ok(()) => None,
        Err(e) => Some(e.to_string()),
    }
}

#[post("/funnel/select")]
pub async fn select(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<SelectForm>,
) -> impl Responder {
    let Some(mut funnel) = restore(&state, &form.state) else {
        return expired(&state, &req);
    };

    let selection = match Selection::parse(&form.field, &form.value) {
        Ok(selection) => selection,
        Err(issue) => {
            return refused(&state, &req, &funnel, StepError::Validation(vec![issue]))
        }
    };

    if let Err(e) = funnel.select(selection) {
        return refused(&state, &req, &funnel, e);
    }

    save_progress(&state, &req, &mut funnel).await;
    respond(&req, view_of(&state, &funnel))
}

#[post("/funnel/back")]
pub async fn back(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<StateForm>,
) -> impl Responder {
    let Some(mut funnel) = restore(&state, &form.state) else {
        return expired(&state, &req);
    };

    if let Err(e) = funnel.retreat() {
        return refused(&state, &req, &funnel, e);
    }

    // Coming back to the summary step keeps the summary already shown.
    respond(&req, view_of(&state, &funnel))
}

#[post("/funnel/name")]
pub async fn name(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<NameForm>,
) -> impl Responder {
    let Some(mut funnel) = restore(&state, &form.state) else {
        return expired(&state, &req);
    };

    if let Err(e) = funnel.submit_name(&form.first_name, &form.last_name) {
        return refused(&state, &req, &funnel, e);
    }

    save_progress(&state, &req, &mut funnel).await;

    let view = match ensure_summary(&state, &mut funnel).await {
        Some(error) => view_of(&state, &funnel).with_error(error),
        None => view_of(&state, &funnel),
    };
    respond(&req, view)
}

/// Re-checks the summary gate. Also retries a summary that failed to
/// generate.
#[post("/funnel/summary-status")]
pub async fn summary_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<StateForm>,
) -> impl Responder {
    let Some(mut funnel) = restore(&state, &form.state) else {
        return expired(&state, &req);
    };

    let view = match ensure_summary(&state, &mut funnel).await {
        Some(error) => view_of(&state, &funnel).with_error(error),
        None => view_of(&state, &funnel),
    };
    respond(&req, view)
}

#[post("/funnel/proceed")]
pub async fn proceed(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<StateForm>,
) -> impl Responder {
    let Some(mut funnel) = restore(&state, &form.state) else {
        return expired(&state, &req);
    };

    if let Err(e) = funnel.advance(Utc::now()) {
        return refused(&state, &req, &funnel, e);
    }

    respond(&req, view_of(&state, &funnel))
}

#[post("/funnel/submit")]
pub async fn submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<ContactForm>,
) -> impl Responder {
    let Some(mut funnel) = restore(&state, &form.state) else {
        return expired(&state, &req);
    };

    let lead = match funnel.prepare_submission(&form.contact()) {
        Ok(lead) => lead,
        Err(e) => return refused(&state, &req, &funnel, e),
    };

    if !state.rate_limiter.check(&client_key(&req, "complete")) {
        let view = view_of(&state, &funnel).with_error(
            "Too many requests. Please wait a moment and try again.",
        );
        return respond(&req, view);
    }

    let completed = match state
        .gateway
        .record_complete(funnel.lead_id(), lead.draft())
        .await
    {
        Ok(completed) => completed,
        Err(GatewayError::Validation(issues)) => {
            return refused(&state, &req, &funnel, StepError::Validation(issues))
        }
        Err(GatewayError::AlreadyCompleted(_)) => {
            return refused(&state, &req, &funnel, StepError::Submitted)
        }
        Err(e) => {
            log::error!("Lead submission failed: {}", e);
            let view = view_of(&state, &funnel)
                .with_error(generic_error_message("submission"));
            return respond(&req, view);
        }
    };

    let (record, warning) = if state.gateway.settings().await_forward {
        let (record, outcome) = completed.settle().await;
        (record, outcome.warning())
    } else {
        (completed.record, None)
    };

    if let Err(e) = funnel.mark_submitted(record.id) {
        return refused(&state, &req, &funnel, e);
    }

    respond(&req, view_of(&state, &funnel).with_warning(warning))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(select)
        .service(back)
        .service(name)
        .service(summary_status)
        .service(proceed)
        .service(submit);
}
