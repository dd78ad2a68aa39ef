use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::TIMEOUT_HEADER;
use crate::domain::order::{CreateOrder, LocationUpdate, Order, OrderError, OrderService, OrderStatus};

/// Order as returned to clients: the stored document plus its id.
#[derive(Serialize)]
struct OrderView<'a> {
    id: &'a str,
    #[serde(flatten)]
    order: &'a Order,
}

impl<'a> From<&'a Order> for OrderView<'a> {
    fn from(order: &'a Order) -> Self {
        Self { id: &order.id, order }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Service with the per-request timeout applied, if the header is present.
fn scoped(service: &OrderService, req: &HttpRequest) -> Result<OrderService, OrderError> {
    let Some(value) = req.headers().get(TIMEOUT_HEADER) else {
        return Ok(service.clone());
    };

    let millis = value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .ok_or_else(|| OrderError::ValidationFailed(format!("{TIMEOUT_HEADER} must be a positive integer")))?;

    Ok(service.with_timeout(Duration::from_millis(millis)))
}

pub async fn create_order(
    service: web::Data<OrderService>,
    req: HttpRequest,
    input: web::Json<CreateOrder>,
) -> Result<HttpResponse, OrderError> {
    let order = scoped(&service, &req)?.create_order(input.into_inner()).await?;
    Ok(HttpResponse::Created().json(OrderView::from(&order)))
}

pub async fn get_order(
    service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, OrderError> {
    let order = scoped(&service, &req)?.get_order(&path).await?;
    Ok(HttpResponse::Ok().json(OrderView::from(&order)))
}

pub async fn assign_delivery(
    service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, OrderError> {
    let (order_id, delivery_id) = path.into_inner();
    let order = scoped(&service, &req)?.assign_delivery(&order_id, &delivery_id).await?;
    Ok(HttpResponse::Ok().json(OrderView::from(&order)))
}

pub async fn update_status(
    service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, OrderError> {
    let order = scoped(&service, &req)?.update_status(&path, body.status).await?;
    Ok(HttpResponse::Ok().json(OrderView::from(&order)))
}

pub async fn record_location(
    service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<LocationUpdate>,
) -> Result<HttpResponse, OrderError> {
    let order = scoped(&service, &req)?.record_location(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderView::from(&order)))
}
