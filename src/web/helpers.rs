use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse};
use askama::Template;
use futures_util::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;

use crate::models::FieldIssue;
use crate::services::Summary;
use crate::types::{ErrorResponse, ValidationResponse};

pub fn is_htmx(req: &HttpRequest) -> bool {
    req.headers()
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|s| s.eq_ignore_ascii_case("true"))
}

pub fn render<T: Template>(t: T) -> HttpResponse {
    match t.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => {
            log::error!("Template error: {}", e);
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body("Template error")
        }
    }
}

pub fn json_error(status: actix_web::http::StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse::new(message))
}

pub fn json_issues(issues: Vec<FieldIssue>) -> HttpResponse {
    HttpResponse::BadRequest().json(ValidationResponse::new(issues))
}

pub fn too_many_requests() -> HttpResponse {
    json_error(
        actix_web::http::StatusCode::TOO_MANY_REQUESTS,
        "Too many requests. Please wait a moment and try again.",
    )
}

/// Emits the summary one word at a time, `interval` apart. Words after the
/// first carry their leading space so the chunks concatenate to the text.
pub fn paced_words(
    summary: &Summary,
    interval: Duration,
) -> impl Stream<Item = Result<Bytes, Infallible>> + 'static {
    let words: Vec<String> = summary.fragments().map(str::to_string).collect();

    stream::iter(words.into_iter().enumerate()).then(move |(i, word)| async move {
        if i == 0 {
            return Ok::<_, Infallible>(Bytes::from(word));
        }
        tokio::time::sleep(interval).await;
        Ok(Bytes::from(format!(" {}", word)))
    })
}
