use std::collections::BTreeMap;

use axum::{extract::State, Json};
use tracing::instrument;

use crate::dtos::report::{ProductMovement, ReportSummary, StatusBucket};
use crate::error::AppError;
use crate::lifecycle::{BookingStatus, QuotationStatus};
use crate::models::booking::Booking;
use crate::models::quotation::Quotation;
use crate::pricing::round2;
use crate::state::AppState;
use crate::sync::{refresh_bookings, refresh_quotations};

const STATUS_ORDER: [BookingStatus; 4] = [
    BookingStatus::Booked,
    BookingStatus::Paid,
    BookingStatus::Dispatched,
    BookingStatus::Delivered,
];

pub fn summarize(bookings: &[Booking], quotations: &[Quotation]) -> ReportSummary {
    let by_status = STATUS_ORDER
        .iter()
        .map(|status| {
            let mut bucket = StatusBucket::default();
            for booking in bookings.iter().filter(|b| b.status == *status) {
                bucket.count += 1;
                bucket.value += booking.total;
            }
            bucket.value = round2(bucket.value);
            (*status, bucket)
        })
        .collect();

    // Keyed by serial so the listing comes out in a stable order.
    let mut movements: BTreeMap<&str, ProductMovement> = BTreeMap::new();
    for line in bookings.iter().flat_map(|b| &b.products) {
        let entry = movements
            .entry(line.line.serial_number.as_str())
            .or_insert_with(|| ProductMovement {
                serial_number: line.line.serial_number.clone(),
                product_name: line.line.product_name.clone(),
                booked: 0,
                dispatched: 0,
            });
        entry.booked += line.line.quantity;
        entry.dispatched += line.dispatched_qty;
    }

    ReportSummary {
        by_status,
        bookings: bookings.len(),
        order_value: round2(bookings.iter().map(|b| b.total).sum()),
        collected: round2(bookings.iter().map(|b| b.amount_paid).sum()),
        outstanding: round2(bookings.iter().map(Booking::balance).sum()),
        pending_quotations: quotations
            .iter()
            .filter(|q| q.status == QuotationStatus::Pending)
            .count(),
        products: movements.into_values().collect(),
    }
}

// GET /reports/summary
#[instrument(skip(state))]
pub async fn summary(State(state): State<AppState>) -> Result<Json<ReportSummary>, AppError> {
    if state.bookings.refreshed_at().await.is_none() {
        refresh_bookings(&state).await?;
    }
    if state.quotations.refreshed_at().await.is_none() {
        refresh_quotations(&state).await?;
    }

    let bookings = state.bookings.all().await;
    let quotations = state.quotations.all().await;
    Ok(Json(summarize(&bookings, &quotations)))
}
