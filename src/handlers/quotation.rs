// src/handlers/quotation.rs
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, instrument};

use crate::dtos::booking::BookingResponse;
use crate::dtos::common::{ListQuery, RefreshResponse};
use crate::dtos::quotation::{BookQuotationResponse, QuotationResponse};
use crate::error::AppError;
use crate::lifecycle::{check_quotation, QuotationAction, QuotationStatus};
use crate::pagination::{matches_search, paginate, Page};
use crate::routes::BASE_PATH;
use crate::state::AppState;
use crate::sync::{find_quotation, refresh_products_quietly, refresh_quotations};

pub(crate) fn pdf_response(bytes: Vec<u8>, filename: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response()
}

// GET /quotations - Newest first, filtered by status and customer
#[instrument(skip(state))]
pub async fn list_quotations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<QuotationResponse>>, AppError> {
    if query.refresh || state.quotations.refreshed_at().await.is_none() {
        refresh_quotations(&state).await.inspect_err(|e| {
            error!(error = %e, "Failed to fetch quotations");
        })?;
    }

    let needle = query.search();
    let mut quotations: Vec<_> = state
        .quotations
        .all()
        .await
        .into_iter()
        .filter(|q| query.status_matches(q.status.as_str()))
        .filter(|q| q.customer.matches(needle) || matches_search(&[&q.id], needle))
        .collect();
    quotations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(paginate(quotations, query.page, query.page_size).map(QuotationResponse::from)))
}

// GET /quotations/{id}
#[instrument(skip(state))]
pub async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuotationResponse>, AppError> {
    Ok(Json(find_quotation(&state, &id).await?.into()))
}

// POST /quotations/refresh
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let applied = refresh_quotations(&state).await?;
    let count = state.quotations.all().await.len();
    Ok(Json(RefreshResponse { applied, count }))
}

// POST /quotations/{id}/book - Convert a pending quotation into a booking
#[instrument(skip(state))]
pub async fn book_quotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookQuotationResponse>, AppError> {
    let quotation = find_quotation(&state, &id).await?;
    check_quotation(&quotation, QuotationAction::Book)?;

    let booking = state.upstream.book_quotation(&id).await.inspect_err(|e| {
        error!(error = %e, quotation = %id, "Booking quotation failed");
    })?;
    info!(quotation = %id, booking = %booking.id, "Quotation booked");

    state.bookings.upsert(booking.clone()).await;
    let updated = state
        .quotations
        .update(&id, |q| q.status = QuotationStatus::Booked)
        .await;
    refresh_products_quietly(&state).await;

    Ok(Json(BookQuotationResponse {
        quotation: updated.map(QuotationResponse::from),
        invoice_url: format!("{BASE_PATH}/bookings/{}/invoice", booking.id),
        booking: BookingResponse::from(booking),
    }))
}

// PATCH /quotations/{id}/cancel
#[instrument(skip(state))]
pub async fn cancel_quotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuotationResponse>, AppError> {
    let quotation = find_quotation(&state, &id).await?;
    check_quotation(&quotation, QuotationAction::Cancel)?;

    let canceled = state.upstream.cancel_quotation(&id).await?;
    info!(quotation = %id, "Quotation canceled");
    state.quotations.upsert(canceled.clone()).await;

    Ok(Json(canceled.into()))
}

// GET /quotations/{id}/pdf
#[instrument(skip(state))]
pub async fn download_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.upstream.quotation_pdf(&id).await?;
    Ok(pdf_response(bytes, format!("quotation-{id}.pdf")))
}
