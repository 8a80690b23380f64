use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use tracing::error;

use super::{add_log, ErrorBody, HttpState};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::upstream::{ForwardMethod, ForwardRequest, UpstreamBody, UpstreamResponse};

const SOURCE: &str = "API Proxy";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/proxy/{path:.*}")
            .route(web::get().to(handle_proxy))
            .route(web::post().to(handle_proxy))
            .route(web::put().to(handle_proxy))
            .route(web::patch().to(handle_proxy))
            .route(web::delete().to(handle_proxy)),
    );
}

async fn handle_proxy(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
    data: web::Data<HttpState>,
) -> HttpResponse {
    let method = req.method().as_str().to_string();
    let path = path.into_inner();

    match forward(&req, &path, body, &data).await {
        Ok(response) => {
            if data.enable_api_logging {
                add_log(
                    &data.logs,
                    "INFO",
                    SOURCE,
                    &format!("{} /{} -> {}", method, path, response.status),
                );
            }
            relay(response)
        }
        Err(err) => {
            error!(error = %err, method = %method, path = %path, "[API Proxy] request failed");
            add_log(
                &data.logs,
                "ERROR",
                SOURCE,
                &format!("{} /{} failed: {}", method, path, err),
            );
            HttpResponse::InternalServerError().json(ErrorBody::new("API proxy error", err.to_string()))
        }
    }
}

async fn forward(
    req: &HttpRequest,
    path: &str,
    body: web::Bytes,
    data: &HttpState,
) -> Result<UpstreamResponse> {
    let upstream = data.upstream()?;
    let method: ForwardMethod = req.method().as_str().parse()?;

    let body = if method.carries_body() && !body.is_empty() {
        Some(String::from_utf8(body.to_vec()).map_err(|err| {
            AppError::ValidationError(format!("Request body is not valid UTF-8: {}", err))
        })?)
    } else {
        None
    };

    upstream
        .forward(ForwardRequest {
            method,
            path: path.to_string(),
            query: parse_query(req.query_string()),
            body,
        })
        .await
}

fn relay(response: UpstreamResponse) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    match response.body {
        UpstreamBody::Json(value) => HttpResponse::build(status).json(value),
        UpstreamBody::Text(text) => HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(text),
    }
}

/// Keeps original key case and order, repeated keys included.
fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}
