use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::{add_log, HttpState};
use crate::application::use_cases::checklist::{build_checklist, entity_fields};
use crate::domain::error::{AppError, Result};
use crate::domain::product::{EntityKind, Subject};
use crate::domain::validation::VerdictStatus;

const SOURCE: &str = "Validation";
pub const REPORT_LOCATION_HEADER: &str = "X-Report-Location";

#[derive(Debug, Deserialize)]
pub struct VerdictInput {
    pub status: VerdictStatus,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionCreated {
    session_id: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/validation")
            .route("/sessions", web::post().to(open_session))
            .service(
                web::resource("/sessions/{session_id}")
                    .route(web::get().to(get_session))
                    .route(web::delete().to(close_session)),
            )
            .route("/sessions/{session_id}/subject", web::put().to(select_subject))
            .route("/sessions/{session_id}/summary", web::get().to(get_summary))
            .route("/sessions/{session_id}/verdicts", web::delete().to(clear_verdicts))
            .service(
                web::resource("/sessions/{session_id}/verdicts/{field}")
                    .route(web::put().to(set_verdict))
                    .route(web::patch().to(update_comment)),
            )
            .route("/sessions/{session_id}/export", web::post().to(export_report))
            .route("/checklist/{product_id}", web::get().to(get_checklist))
            .route(
                "/checklist/{product_id}/{kind}",
                web::get().to(get_entity_checklist),
            ),
    );
}

async fn open_session(data: web::Data<HttpState>) -> Result<HttpResponse> {
    let session_id = data.workspaces.open_session()?;
    add_log(
        &data.logs,
        "INFO",
        SOURCE,
        &format!("Session {} opened", session_id),
    );
    Ok(HttpResponse::Created().json(SessionCreated { session_id }))
}

async fn get_session(
    data: web::Data<HttpState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.workspaces.view(&path)?))
}

async fn close_session(
    data: web::Data<HttpState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    data.workspaces.close_session(&path)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn select_subject(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    subject: web::Json<Subject>,
) -> Result<HttpResponse> {
    let view = data
        .workspaces
        .select_subject(&path, subject.into_inner())?;
    Ok(HttpResponse::Ok().json(view))
}

async fn get_summary(
    data: web::Data<HttpState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(data.workspaces.summary(&path)?))
}

async fn set_verdict(
    data: web::Data<HttpState>,
    path: web::Path<(String, String)>,
    input: web::Json<VerdictInput>,
) -> Result<HttpResponse> {
    let (session_id, field) = path.into_inner();
    let update = data
        .workspaces
        .set_verdict(&session_id, &field, input.status, &input.comment)?;
    Ok(HttpResponse::Ok().json(update))
}

async fn update_comment(
    data: web::Data<HttpState>,
    path: web::Path<(String, String)>,
    input: web::Json<CommentInput>,
) -> Result<HttpResponse> {
    let (session_id, field) = path.into_inner();
    let update = data
        .workspaces
        .update_comment(&session_id, &field, &input.comment)?;
    Ok(HttpResponse::Ok().json(update))
}

async fn clear_verdicts(
    data: web::Data<HttpState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let summary = data.workspaces.clear(&path)?;
    add_log(
        &data.logs,
        "INFO",
        SOURCE,
        &format!("Session {} cleared", path.as_str()),
    );
    Ok(HttpResponse::Ok().json(summary))
}

async fn export_report(
    data: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<ExportQuery>,
) -> Result<HttpResponse> {
    let outcome = data
        .workspaces
        .export(&path, query.filename.as_deref(), data.report_sink.as_deref())
        .map_err(|err| {
            let level = if err == AppError::EmptyExport { "WARN" } else { "ERROR" };
            warn!(error = %err, session_id = %path.as_str(), "Report export failed");
            add_log(&data.logs, level, SOURCE, &format!("Export failed: {}", err));
            err
        })?;

    add_log(
        &data.logs,
        "INFO",
        SOURCE,
        &format!(
            "Exported {} ({} fields)",
            outcome.filename, outcome.report.summary.total
        ),
    );

    let mut response = HttpResponse::Ok();
    response
        .content_type("application/json; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(outcome.filename.clone())],
        });
    if let Some(delivered) = &outcome.delivered {
        response.insert_header((REPORT_LOCATION_HEADER, delivered.location.clone()));
    }
    Ok(response.body(outcome.contents))
}

async fn get_checklist(
    data: web::Data<HttpState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let product_id = path.into_inner();
    let product = data.catalog()?.get_product(product_id).await?;
    let sections = build_checklist(&product)?;
    Ok(HttpResponse::Ok().json(json!({
        "productId": product_id,
        "sections": sections,
    })))
}

async fn get_entity_checklist(
    data: web::Data<HttpState>,
    path: web::Path<(i64, EntityKind)>,
) -> Result<HttpResponse> {
    let (product_id, kind) = path.into_inner();
    let entities = data.catalog()?.list_entities(kind, product_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "productId": product_id,
        "kind": kind,
        "fields": entity_fields(kind, &entities),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::ExportReport;
    use crate::domain::validation::ValidationSummary;
    use crate::infrastructure::storage::{DirectorySink, ReportSink};
    use crate::infrastructure::upstream::{
        ForwardRequest, UpstreamApi, UpstreamBody, UpstreamResponse,
    };
    use crate::interfaces::http::test_support::{state_with, unconfigured};
    use crate::interfaces::http::{configure as configure_api, ErrorBody};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::App;
    use async_trait::async_trait;
    use regex::Regex;
    use serde_json::Value;
    use std::sync::Arc;

    macro_rules! open_session {
        ($app:expr) => {{
            let req = actix_test::TestRequest::post()
                .uri("/api/validation/sessions")
                .to_request();
            let resp = actix_test::call_service($app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let body: Value = actix_test::read_body_json(resp).await;
            body["sessionId"].as_str().unwrap().to_string()
        }};
    }

    fn verdict(session: &str, field: &str, body: Value) -> actix_test::TestRequest {
        actix_test::TestRequest::put()
            .uri(&format!("/api/validation/sessions/{}/verdicts/{}", session, field))
            .set_json(body)
    }

    #[actix_web::test]
    async fn test_verdict_flow_and_export() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(unconfigured()))
                .configure(configure_api),
        )
        .await;
        let session = open_session!(&app);

        let req = actix_test::TestRequest::put()
            .uri(&format!("/api/validation/sessions/{}/subject", session))
            .set_json(json!({"productId": 42, "productName": "Peru Explorer"}))
            .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = verdict(&session, "product_name", json!({"status": "pass"})).to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = verdict(
            &session,
            "lead_in_price",
            json!({"status": "fail", "comment": "wrong currency"}),
        )
        .to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/validation/sessions/{}/summary", session))
            .to_request();
        let summary: ValidationSummary = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            summary,
            ValidationSummary {
                total: 2,
                passed: 1,
                failed: 1
            }
        );

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/validation/sessions/{}/export", session))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        let pattern = Regex::new(r#"attachment; filename="validation-report-42-\d+\.json""#).unwrap();
        assert!(pattern.is_match(&disposition), "{}", disposition);

        let report: ExportReport = actix_test::read_body_json(resp).await;
        assert_eq!(report.summary, summary);
        assert_eq!(report.product_name.as_deref(), Some("Peru Explorer"));
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results["lead_in_price"].comment, "wrong currency");
    }

    #[actix_web::test]
    async fn test_invalid_status_is_rejected() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(unconfigured()))
                .configure(configure_api),
        )
        .await;
        let session = open_session!(&app);

        let req = verdict(&session, "pace", json!({"status": "maybe"})).to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = actix_test::read_body_json(resp).await;
        assert_eq!(body.error, "Invalid request");

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/validation/sessions/{}", session))
            .to_request();
        let view: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["summary"]["total"], 0);
    }

    #[actix_web::test]
    async fn test_empty_export_returns_notice() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(unconfigured()))
                .configure(configure_api),
        )
        .await;
        let session = open_session!(&app);

        let req = actix_test::TestRequest::post()
            .uri(&format!("/api/validation/sessions/{}/export", session))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get("content-disposition").is_none());
        let body: ErrorBody = actix_test::read_body_json(resp).await;
        assert_eq!(body.error, "Nothing to export");
    }

    #[actix_web::test]
    async fn test_export_with_reports_dir_reports_location() {
        let root = std::env::temp_dir()
            .join("tour-validator-tests")
            .join(format!("http-{}", uuid::Uuid::new_v4()));
        let mut state = unconfigured();
        state.report_sink = Some(Arc::new(DirectorySink::new(&root)) as Arc<dyn ReportSink>);
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;
        let session = open_session!(&app);

        let req = verdict(&session, "banner", json!({"status": "pass"})).to_request();
        actix_test::call_service(&app, req).await;

        let req = actix_test::TestRequest::post()
            .uri(&format!(
                "/api/validation/sessions/{}/export?filename=peru-check.json",
                session
            ))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let location = resp
            .headers()
            .get(REPORT_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(location.ends_with("peru-check.json"));
        assert!(root.join("peru-check.json").exists());
        let _ = std::fs::remove_dir_all(root);
    }

    #[actix_web::test]
    async fn test_comment_patch_and_clear() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(unconfigured()))
                .configure(configure_api),
        )
        .await;
        let session = open_session!(&app);

        let patch = |field: &str| {
            actix_test::TestRequest::patch()
                .uri(&format!("/api/validation/sessions/{}/verdicts/{}", session, field))
                .set_json(json!({"comment": "looks good"}))
                .to_request()
        };

        let resp = actix_test::call_service(&app, patch("banner_image")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = verdict(&session, "banner_image", json!({"status": "pass", "comment": ""})).to_request();
        actix_test::call_service(&app, req).await;
        let resp = actix_test::call_service(&app, patch("banner_image")).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/validation/sessions/{}", session))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["summary"]["total"], 1);
        assert_eq!(body["results"]["banner_image"]["status"], "pass");
        assert_eq!(body["results"]["banner_image"]["comment"], "looks good");
        assert_eq!(body["notes"][0]["field"], "banner_image");
        assert_eq!(body["notes"][0]["comment"], "looks good");

        let req = actix_test::TestRequest::delete()
            .uri(&format!("/api/validation/sessions/{}/verdicts", session))
            .to_request();
        let summary: ValidationSummary = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary, ValidationSummary::default());
    }

    #[actix_web::test]
    async fn test_unknown_session_is_404() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(unconfigured()))
                .configure(configure_api),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/api/validation/sessions/nope/summary")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    struct FixedUpstream;

    #[async_trait]
    impl UpstreamApi for FixedUpstream {
        async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse> {
            if request.path == "products/500" {
                return Ok(UpstreamResponse {
                    status: 503,
                    body: UpstreamBody::Text("maintenance".to_string()),
                });
            }
            let body = match request.path.as_str() {
                "products/42" => json!({
                    "product_id": 42,
                    "product_name": "Peru Explorer",
                    "tour_places": "Lima, Cusco"
                }),
                "departures" => json!([{"id": 7, "departure_date": "2026-05-01"}]),
                _ => json!([]),
            };
            Ok(UpstreamResponse {
                status: 200,
                body: UpstreamBody::Json(body),
            })
        }
    }

    #[actix_web::test]
    async fn test_checklists() {
        let state = state_with(Ok(Arc::new(FixedUpstream) as Arc<dyn UpstreamApi>));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/api/validation/checklist/42")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["productId"], 42);
        assert_eq!(body["sections"][0]["fields"][1]["value"], "Peru Explorer");
        assert_eq!(body["sections"][3]["title"], "Destinations");

        let req = actix_test::TestRequest::get()
            .uri("/api/validation/checklist/42/departures")
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["fields"][0]["field"], "departure_7");
        assert_eq!(body["fields"][0]["label"], "2026-05-01");
        assert_eq!(body["kind"], "departures");

        let req = actix_test::TestRequest::get()
            .uri("/api/validation/checklist/42/reviews")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = actix_test::read_body_json(resp).await;
        assert_eq!(body.error, "Not found");
    }

    #[actix_web::test]
    async fn test_failed_checklist_fetch_keeps_verdicts() {
        let state = state_with(Ok(Arc::new(FixedUpstream) as Arc<dyn UpstreamApi>));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_api),
        )
        .await;
        let session = open_session!(&app);

        let req = verdict(&session, "product_name", json!({"status": "pass"})).to_request();
        assert_eq!(actix_test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = actix_test::TestRequest::get()
            .uri("/api/validation/checklist/500")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorBody = actix_test::read_body_json(resp).await;
        assert_eq!(body.error, "Upstream API error");

        let req = actix_test::TestRequest::get()
            .uri(&format!("/api/validation/sessions/{}/summary", session))
            .to_request();
        let summary: ValidationSummary = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            summary,
            ValidationSummary {
                total: 1,
                passed: 1,
                failed: 0
            }
        );
    }
}
