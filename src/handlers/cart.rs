// Storefront cart. Every committed change is written to local storage before
// it becomes visible, so a failed write leaves the cart as it was.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::cart::{Cart, CartField};
use crate::dtos::booking::BookingResponse;
use crate::dtos::cart::{AddToCartRequest, CartResponse, CheckoutRequest, UpdateCartItemRequest};
use crate::error::AppError;
use crate::models::order::OrderDraft;
use crate::pricing::ExtraCharges;
use crate::state::AppState;
use crate::sync::{find_product, refresh_products_quietly};

async fn update_cart<F>(state: &AppState, edit: F) -> Result<Cart, AppError>
where
    F: FnOnce(&mut Cart) -> Result<(), AppError>,
{
    let mut cart = state.cart.lock().await;
    let mut next = cart.clone();
    edit(&mut next)?;
    state.storage.save_cart(&next).await?;
    *cart = next.clone();
    Ok(next)
}

// GET /cart?tax=&pf=&deduction=
pub async fn get_cart(
    State(state): State<AppState>,
    Query(charges): Query<ExtraCharges>,
) -> Json<CartResponse> {
    let cart = state.cart.lock().await;
    Json(CartResponse::new(&cart, &charges))
}

// POST /cart/items
#[instrument(skip(state, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let product = find_product(&state, &payload.serial_number).await?;
    let cart = update_cart(&state, |cart| {
        cart.add(&product, payload.quantity)?;
        Ok(())
    })
    .await?;
    Ok(Json(CartResponse::new(&cart, &ExtraCharges::default())))
}

// PATCH /cart/items/{serial} - Customers may only change quantities
#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(serial): Path<String>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>, AppError> {
    if payload.field != CartField::Quantity {
        return Err(AppError::validation("Only the quantity can be changed"));
    }
    let cart = update_cart(&state, |cart| {
        cart.update_field(&serial, payload.field, payload.value)?;
        Ok(())
    })
    .await?;
    Ok(Json(CartResponse::new(&cart, &ExtraCharges::default())))
}

// DELETE /cart/items/{serial}
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = update_cart(&state, |cart| {
        cart.remove(&serial)?;
        Ok(())
    })
    .await?;
    Ok(Json(CartResponse::new(&cart, &ExtraCharges::default())))
}

// DELETE /cart
pub async fn clear_cart(State(state): State<AppState>) -> Result<Json<CartResponse>, AppError> {
    let cart = update_cart(&state, |cart| {
        cart.clear();
        Ok(())
    })
    .await?;
    Ok(Json(CartResponse::new(&cart, &ExtraCharges::default())))
}

// POST /cart/checkout - Submit the cart as a booking
#[instrument(skip(state, payload))]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    payload.customer.validate().map_err(AppError::validation)?;

    // Held across the upstream call so a concurrent edit cannot slip in
    // between submission and clearing.
    let mut cart = state.cart.lock().await;
    let products = cart.order_lines()?;
    let totals = cart.totals(&payload.charges);
    if totals.negative_total {
        warn!(total = totals.total, "Submitting storefront order with negative total");
    }

    let draft = OrderDraft {
        customer: payload.customer,
        products,
        charges: payload.charges,
        total: totals.total,
    };
    let booking = state.upstream.create_booking(&draft).await?;

    let emptied = Cart::restore(Vec::new());
    state.storage.save_cart(&emptied).await?;
    *cart = emptied;
    drop(cart);

    info!(booking = %booking.id, total = booking.total, "Storefront order booked");
    state.bookings.upsert(booking.clone()).await;
    refresh_products_quietly(&state).await;

    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}
