use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
    prelude::Decimal,
};

use crate::database::models::{
    RequestStatus, chosen_material, chosen_service, client, invoice, payment_order, request,
};
use crate::errors::AppError;

/// Cost of `amount` pieces at `price` each.
pub fn material_line_total(price: Decimal, amount: i32) -> Result<Decimal, AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidInput(
            "Material amount must be positive".to_string(),
        ));
    }
    price
        .checked_mul(Decimal::from(amount))
        .ok_or_else(|| AppError::InvalidInput("Material total overflows".to_string()))
}

pub async fn find_request<C: ConnectionTrait>(db: &C, id: i64) -> Result<request::Model, AppError> {
    request::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request with id {} not found", id)))
}

/// Sum of every chosen service and material total on the request.
pub async fn request_total<C: ConnectionTrait>(db: &C, request_id: i64) -> Result<Decimal, AppError> {
    let services = chosen_service::Entity::find()
        .filter(chosen_service::Column::RequestId.eq(request_id))
        .all(db)
        .await?;
    let materials = chosen_material::Entity::find()
        .filter(chosen_material::Column::RequestId.eq(request_id))
        .all(db)
        .await?;

    let total = services
        .iter()
        .map(|line| line.total_cost)
        .chain(materials.iter().map(|line| line.total_cost))
        .sum();
    Ok(total)
}

/// Stores the sum of the chosen lines as the request's final price.
pub async fn recalculate_final_price(
    db: &DatabaseConnection,
    request_id: i64,
) -> Result<request::Model, AppError> {
    let req = find_request(db, request_id).await?;
    let total = request_total(db, request_id).await?;

    let mut active = req.into_active_model();
    active.final_price = Set(total);
    let updated = active.update(db).await?;
    log::info!("request {} final price set to {}", updated.id, updated.final_price);
    Ok(updated)
}

/// Issues an invoice. The invoiced client must be the one who placed the request.
pub async fn issue_invoice(
    db: &DatabaseConnection,
    request_id: i64,
    client_id: i64,
    pay_due: NaiveDate,
) -> Result<invoice::Model, AppError> {
    let req = find_request(db, request_id).await?;
    client::Entity::find_by_id(client_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client with id {} not found", client_id)))?;

    if req.client_id != client_id {
        return Err(AppError::InvalidInput(format!(
            "Request {} belongs to client {}, not {}",
            req.id, req.client_id, client_id
        )));
    }

    let created = invoice::ActiveModel {
        request_id: Set(request_id),
        client_id: Set(client_id),
        pay_due: Set(pay_due),
        ..Default::default()
    }
    .insert(db)
    .await?;
    log::info!("issued invoice {} for request {}", created.id, request_id);
    Ok(created)
}

/// Records a payment against an invoice and marks the request as paid, in
/// one transaction.
pub async fn record_payment(
    db: &DatabaseConnection,
    invoice_id: i64,
    request_id: i64,
    client_id: i64,
    pay_date: NaiveDate,
) -> Result<payment_order::Model, AppError> {
    let txn = db.begin().await?;

    let inv = invoice::Entity::find_by_id(invoice_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice with id {} not found", invoice_id)))?;

    if inv.request_id != request_id || inv.client_id != client_id {
        return Err(AppError::InvalidInput(format!(
            "Invoice {} was issued for request {} and client {}",
            inv.id, inv.request_id, inv.client_id
        )));
    }

    let req = find_request(&txn, request_id).await?;

    let created = payment_order::ActiveModel {
        request_id: Set(request_id),
        client_id: Set(client_id),
        invoice_id: Set(invoice_id),
        pay_date: Set(pay_date),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if req.status != RequestStatus::Paid {
        let mut active = req.into_active_model();
        active.status = Set(RequestStatus::Paid);
        active.update(&txn).await?;
    }

    txn.commit().await?;
    log::info!(
        "recorded payment {} on invoice {} (request {})",
        created.id,
        invoice_id,
        request_id
    );
    Ok(created)
}

/// Puts a paid request back to `unpaid` once no payment order is left for it.
async fn reopen_if_unsettled<C: ConnectionTrait>(db: &C, request_id: i64) -> Result<(), AppError> {
    let remaining = payment_order::Entity::find()
        .filter(payment_order::Column::RequestId.eq(request_id))
        .count(db)
        .await?;
    if remaining > 0 {
        return Ok(());
    }

    let req = find_request(db, request_id).await?;
    if req.status == RequestStatus::Paid {
        let mut active = req.into_active_model();
        active.status = Set(RequestStatus::Unpaid);
        active.update(db).await?;
        log::info!("request {} has no payments left, back to unpaid", request_id);
    }
    Ok(())
}

/// Deletes a payment order; the request is reopened when it was the last one.
pub async fn delete_payment(db: &DatabaseConnection, payment_id: i64) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let payment = payment_order::Entity::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Payment order with id {} not found", payment_id))
        })?;
    let request_id = payment.request_id;
    payment.delete(&txn).await?;
    reopen_if_unsettled(&txn, request_id).await?;

    txn.commit().await?;
    log::info!("deleted payment order {} (request {})", payment_id, request_id);
    Ok(())
}

/// Deletes an invoice together with the payments recorded against it.
pub async fn delete_invoice(db: &DatabaseConnection, invoice_id: i64) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let inv = invoice::Entity::find_by_id(invoice_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Invoice with id {} not found", invoice_id)))?;
    let request_id = inv.request_id;

    payment_order::Entity::delete_many()
        .filter(payment_order::Column::InvoiceId.eq(invoice_id))
        .exec(&txn)
        .await?;
    inv.delete(&txn).await?;
    reopen_if_unsettled(&txn, request_id).await?;

    txn.commit().await?;
    log::info!("deleted invoice {} (request {})", invoice_id, request_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_price_by_amount() {
        let total = material_line_total(Decimal::new(1250, 2), 4).unwrap();
        assert_eq!(total, Decimal::new(5000, 2));
    }

    #[test]
    fn line_total_rejects_non_positive_amounts() {
        assert!(material_line_total(Decimal::ONE, 0).is_err());
        assert!(material_line_total(Decimal::ONE, -3).is_err());
    }
}
