use actix_web::{delete, get, post, web, HttpResponse};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::helpers::find_or_404,
    app_state::AppState,
    database::models::{client, invoice, payment_order},
    errors::AppError,
    services::billing,
};

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize, ToSchema, Clone)]
pub struct InvoiceDto {
    pub request_id: i64,
    pub client_id: i64,
    #[schema(value_type = String, format = Date)]
    pub pay_due: NaiveDate,
}

#[derive(Deserialize, ToSchema, Clone)]
pub struct PaymentOrderDto {
    pub invoice_id: i64,
    pub request_id: i64,
    pub client_id: i64,
    #[schema(value_type = String, format = Date)]
    pub pay_date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
pub struct BillingQuery {
    pub request_id: Option<i64>,
    pub client_id: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub label: String,
}

// --- Invoices ---

#[utoipa::path(
    get,
    path = "/api/invoices",
    tag = "Billing",
    params(BillingQuery),
    responses(
        (status = 200, description = "List invoices", body = [invoice::Model])
    )
)]
#[get("")]
pub async fn get_invoices(
    data: web::Data<AppState>,
    query: web::Query<BillingQuery>,
) -> Result<HttpResponse, AppError> {
    let mut select = invoice::Entity::find().order_by_asc(invoice::Column::PayDue);
    if let Some(request_id) = query.request_id {
        select = select.filter(invoice::Column::RequestId.eq(request_id));
    }
    if let Some(client_id) = query.client_id {
        select = select.filter(invoice::Column::ClientId.eq(client_id));
    }
    Ok(HttpResponse::Ok().json(select.all(&data.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    tag = "Billing",
    params(
        ("id" = i64, Path, description = "Invoice ID")
    ),
    responses(
        (status = 200, description = "Invoice found", body = InvoiceView),
        (status = 404, description = "Invoice not found")
    )
)]
#[get("/{id}")]
pub async fn get_invoice_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = find_or_404::<invoice::Entity, _>(&data.db, path.into_inner(), "Invoice").await?;
    let owner = find_or_404::<client::Entity, _>(&data.db, found.client_id, "Client").await?;
    let label = found.label(&owner);
    Ok(HttpResponse::Ok().json(InvoiceView {
        invoice: found,
        label,
    }))
}

#[utoipa::path(
    post,
    path = "/api/invoices",
    tag = "Billing",
    request_body = InvoiceDto,
    responses(
        (status = 201, description = "Invoice issued", body = invoice::Model),
        (status = 400, description = "Client did not place the request"),
        (status = 404, description = "Request or client not found")
    )
)]
#[post("")]
pub async fn create_invoice(
    data: web::Data<AppState>,
    body: web::Json<InvoiceDto>,
) -> Result<HttpResponse, AppError> {
    let created =
        billing::issue_invoice(&data.db, body.request_id, body.client_id, body.pay_due).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    tag = "Billing",
    params(
        ("id" = i64, Path, description = "Invoice ID")
    ),
    responses(
        (status = 204, description = "Invoice and its payment orders deleted; the request is reopened when no payment is left"),
        (status = 404, description = "Invoice not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_invoice(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    billing::delete_invoice(&data.db, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// --- Payment orders ---

#[utoipa::path(
    get,
    path = "/api/payment-orders",
    tag = "Billing",
    params(BillingQuery),
    responses(
        (status = 200, description = "List payment orders", body = [payment_order::Model])
    )
)]
#[get("")]
pub async fn get_payment_orders(
    data: web::Data<AppState>,
    query: web::Query<BillingQuery>,
) -> Result<HttpResponse, AppError> {
    let mut select = payment_order::Entity::find().order_by_asc(payment_order::Column::PayDate);
    if let Some(request_id) = query.request_id {
        select = select.filter(payment_order::Column::RequestId.eq(request_id));
    }
    if let Some(client_id) = query.client_id {
        select = select.filter(payment_order::Column::ClientId.eq(client_id));
    }
    Ok(HttpResponse::Ok().json(select.all(&data.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/payment-orders/{id}",
    tag = "Billing",
    params(
        ("id" = i64, Path, description = "Payment order ID")
    ),
    responses(
        (status = 200, description = "Payment order found", body = payment_order::Model),
        (status = 404, description = "Payment order not found")
    )
)]
#[get("/{id}")]
pub async fn get_payment_order_by_id(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found =
        find_or_404::<payment_order::Entity, _>(&data.db, path.into_inner(), "Payment order").await?;
    Ok(HttpResponse::Ok().json(found))
}

/// Records the payment and flips the request to `paid`.
#[utoipa::path(
    post,
    path = "/api/payment-orders",
    tag = "Billing",
    request_body = PaymentOrderDto,
    responses(
        (status = 201, description = "Payment recorded", body = payment_order::Model),
        (status = 400, description = "Payment does not match the invoice"),
        (status = 404, description = "Invoice or request not found")
    )
)]
#[post("")]
pub async fn create_payment_order(
    data: web::Data<AppState>,
    body: web::Json<PaymentOrderDto>,
) -> Result<HttpResponse, AppError> {
    let created = billing::record_payment(
        &data.db,
        body.invoice_id,
        body.request_id,
        body.client_id,
        body.pay_date,
    )
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    delete,
    path = "/api/payment-orders/{id}",
    tag = "Billing",
    params(
        ("id" = i64, Path, description = "Payment order ID")
    ),
    responses(
        (status = 204, description = "Payment order deleted; the request is reopened when it was the last one"),
        (status = 404, description = "Payment order not found")
    )
)]
#[delete("/{id}")]
pub async fn delete_payment_order(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    billing::delete_payment(&data.db, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invoices")
            .service(get_invoices)
            .service(get_invoice_by_id)
            .service(create_invoice)
            .service(delete_invoice),
    )
    .service(
        web::scope("/payment-orders")
            .service(get_payment_orders)
            .service(get_payment_order_by_id)
            .service(create_payment_order)
            .service(delete_payment_order),
    );
}
