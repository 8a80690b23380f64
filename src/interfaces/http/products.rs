use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::{add_log, HttpState};
use crate::application::use_cases::product_catalog::filter_local;
use crate::domain::error::{AppError, Result};
use crate::domain::product::{EntityKind, ProductFilters};

const SOURCE: &str = "Catalog";

/// Sidebar search applied after the upstream fetch.
#[derive(Debug, Default, Deserialize)]
pub struct LocalMatch {
    #[serde(default, rename = "match")]
    pub needle: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/products", web::get().to(list_products))
        .route("/products/{product_id}", web::get().to(get_product))
        .route(
            "/products/{product_id}/{kind}",
            web::get().to(list_entities),
        );
}

async fn list_products(
    data: web::Data<HttpState>,
    filters: web::Query<ProductFilters>,
    local: web::Query<LocalMatch>,
) -> Result<HttpResponse> {
    let products = data
        .catalog()?
        .list_products(&filters)
        .await
        .map_err(|err| log_failure(&data, "List products", err))?;

    let products = match local.needle.as_deref() {
        Some(needle) => filter_local(&products, needle).into_iter().cloned().collect(),
        None => products,
    };
    Ok(HttpResponse::Ok().json(products))
}

async fn get_product(
    data: web::Data<HttpState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let product_id = path.into_inner();
    let product = data
        .catalog()?
        .get_product(product_id)
        .await
        .map_err(|err| log_failure(&data, &format!("Get product {}", product_id), err))?;
    Ok(HttpResponse::Ok().json(product))
}

async fn list_entities(
    data: web::Data<HttpState>,
    path: web::Path<(i64, EntityKind)>,
) -> Result<HttpResponse> {
    let (product_id, kind) = path.into_inner();
    let items = data
        .catalog()?
        .list_entities(kind, product_id)
        .await
        .map_err(|err| {
            log_failure(
                &data,
                &format!("List {} for product {}", kind.endpoint(), product_id),
                err,
            )
        })?;
    Ok(HttpResponse::Ok().json(items))
}

fn log_failure(data: &HttpState, action: &str, err: AppError) -> AppError {
    add_log(
        &data.logs,
        "ERROR",
        SOURCE,
        &format!("{} failed: {}", action, err),
    );
    err
}
