// src/handlers/booking.rs
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use tracing::{error, info, instrument};

use crate::dtos::booking::{BookingResponse, DispatchRequest};
use crate::dtos::common::{ListQuery, RefreshResponse};
use crate::error::AppError;
use crate::handlers::quotation::pdf_response;
use crate::lifecycle::{validate_delivery, validate_dispatch, validate_payment};
use crate::models::booking::NewPayment;
use crate::pagination::{matches_search, paginate, Page};
use crate::state::AppState;
use crate::sync::{find_booking, refresh_bookings};

// GET /bookings - Newest first, filtered by status and customer or order number
#[instrument(skip(state))]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<BookingResponse>>, AppError> {
    if query.refresh || state.bookings.refreshed_at().await.is_none() {
        refresh_bookings(&state).await.inspect_err(|e| {
            error!(error = %e, "Failed to fetch bookings");
        })?;
    }

    let needle = query.search();
    let mut bookings: Vec<_> = state
        .bookings
        .all()
        .await
        .into_iter()
        .filter(|b| query.status_matches(b.status.as_str()))
        .filter(|b| b.customer.matches(needle) || matches_search(&[&b.order_number, &b.id], needle))
        .collect();
    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(paginate(bookings, query.page, query.page_size).map(BookingResponse::from)))
}

// GET /bookings/{id}
#[instrument(skip(state))]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    Ok(Json(find_booking(&state, &id).await?.into()))
}

// POST /bookings/refresh
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let applied = refresh_bookings(&state).await?;
    let count = state.bookings.all().await.len();
    Ok(Json(RefreshResponse { applied, count }))
}

// POST /bookings/{id}/payments
#[instrument(skip(state, payload))]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<NewPayment>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = find_booking(&state, &id).await?;
    validate_payment(&booking, &payload)?;

    let updated = state.upstream.record_payment(&id, &payload).await.inspect_err(|e| {
        error!(error = %e, booking = %id, "Recording payment failed");
    })?;
    info!(
        booking = %id,
        amount = payload.amount,
        admin = %payload.admin,
        balance = updated.balance(),
        "Payment recorded"
    );
    state.bookings.upsert(updated.clone()).await;

    Ok(Json(updated.into()))
}

// PATCH /bookings/{id}/dispatch - Full or partial dispatch
#[instrument(skip(state, payload))]
pub async fn dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<DispatchRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = find_booking(&state, &id).await?;
    validate_dispatch(&booking, &payload.products)?;

    let lines: Vec<_> = payload.products.into_iter().filter(|l| l.quantity > 0).collect();
    let updated = state.upstream.dispatch_booking(&id, &lines).await.inspect_err(|e| {
        error!(error = %e, booking = %id, "Dispatch failed");
    })?;
    info!(
        booking = %id,
        dispatched = updated.dispatched_quantity(),
        ordered = updated.ordered_quantity(),
        "Booking dispatched"
    );
    state.bookings.upsert(updated.clone()).await;

    Ok(Json(updated.into()))
}

// PATCH /bookings/{id}/deliver
#[instrument(skip(state))]
pub async fn deliver(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = find_booking(&state, &id).await?;
    validate_delivery(&booking)?;

    let updated = state.upstream.deliver_booking(&id).await?;
    info!(booking = %id, "Booking delivered");
    state.bookings.upsert(updated.clone()).await;

    Ok(Json(updated.into()))
}

// GET /bookings/{id}/invoice
#[instrument(skip(state))]
pub async fn download_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.upstream.booking_pdf(&id).await?;
    Ok(pdf_response(bytes, format!("invoice-{id}.pdf")))
}
