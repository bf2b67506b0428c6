// Admin edit carts (direct booking, new quotation, quotation edit). Kept in
// memory only; rows at zero quantity stay until removed.
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use crate::cart::{Cart, CartItem, CartMode};
use crate::dtos::cart::{
    AddToCartRequest, CartResponse, SubmitCartRequest, SubmitResponse, SubmitTarget,
    UpdateCartItemRequest,
};
use crate::error::AppError;
use crate::lifecycle::{check_quotation, QuotationAction};
use crate::middleware::session::SessionContext;
use crate::models::order::OrderDraft;
use crate::pricing::ExtraCharges;
use crate::state::AppState;
use crate::sync::{find_product, find_quotation, refresh_products_quietly};

/// Edits a copy of the cart and stores it only when the edit succeeds. An
/// unknown key starts an empty cart when `create` is set and is a 404 otherwise.
async fn edit_cart<F>(state: &AppState, key: &str, create: bool, edit: F) -> Result<Cart, AppError>
where
    F: FnOnce(&mut Cart) -> Result<(), AppError>,
{
    let mut carts = state.admin_carts.write().await;
    let mut next = match carts.get(key) {
        Some(cart) => cart.clone(),
        None if create => Cart::new(CartMode::Admin),
        None => return Err(AppError::not_found(format!("Cart {key} not found"))),
    };
    edit(&mut next)?;
    carts.insert(key.to_string(), next.clone());
    Ok(next)
}

// GET /admin-carts/{key}?tax=&pf=&deduction=
pub async fn get_cart(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(charges): Query<ExtraCharges>,
) -> Json<CartResponse> {
    let carts = state.admin_carts.read().await;
    let empty = Cart::new(CartMode::Admin);
    let cart = carts.get(&key).unwrap_or(&empty);
    Json(CartResponse::new(cart, &charges))
}

// DELETE /admin-carts/{key}
pub async fn discard_cart(State(state): State<AppState>, Path(key): Path<String>) -> StatusCode {
    state.admin_carts.write().await.remove(&key);
    StatusCode::NO_CONTENT
}

// POST /admin-carts/{key}/items
#[instrument(skip(state, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let product = find_product(&state, &payload.serial_number).await?;
    let cart = edit_cart(&state, &key, true, |cart| {
        cart.add(&product, payload.quantity)?;
        Ok(())
    })
    .await?;
    Ok(Json(CartResponse::new(&cart, &ExtraCharges::default())))
}

// PATCH /admin-carts/{key}/items/{serial}
#[instrument(skip(state, payload))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((key, serial)): Path<(String, String)>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = edit_cart(&state, &key, false, |cart| {
        cart.update_field(&serial, payload.field, payload.value)?;
        Ok(())
    })
    .await?;
    Ok(Json(CartResponse::new(&cart, &ExtraCharges::default())))
}

// DELETE /admin-carts/{key}/items/{serial}
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((key, serial)): Path<(String, String)>,
) -> Result<Json<CartResponse>, AppError> {
    let cart = edit_cart(&state, &key, false, |cart| {
        cart.remove(&serial)?;
        Ok(())
    })
    .await?;
    Ok(Json(CartResponse::new(&cart, &ExtraCharges::default())))
}

// POST /admin-carts/{key}/load/{quotation_id} - Open a pending quotation for editing
#[instrument(skip(state))]
pub async fn load_quotation(
    State(state): State<AppState>,
    Path((key, quotation_id)): Path<(String, String)>,
) -> Result<Json<CartResponse>, AppError> {
    let quotation = find_quotation(&state, &quotation_id).await?;
    check_quotation(&quotation, QuotationAction::Edit)?;

    let mut items = Vec::with_capacity(quotation.products.len());
    for line in &quotation.products {
        let stock = state.products.get(&line.serial_number).await.map(|p| p.stock);
        items.push(CartItem::from_line(line, stock));
    }

    let cart = edit_cart(&state, &key, true, |cart| {
        cart.load(items);
        Ok(())
    })
    .await?;
    Ok(Json(CartResponse::new(&cart, &quotation.charges)))
}

// POST /admin-carts/{key}/submit
#[instrument(skip(state, session, payload))]
pub async fn submit(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(key): Path<String>,
    Json(payload): Json<SubmitCartRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let cart = state
        .admin_carts
        .read()
        .await
        .get(&key)
        .cloned()
        .ok_or_else(|| AppError::not_found(format!("Cart {key} not found")))?;

    let products = cart.order_lines()?;
    payload.customer.validate().map_err(AppError::validation)?;
    let totals = cart.totals(&payload.charges);
    if totals.negative_total {
        warn!(cart = %key, total = totals.total, "Submitting order with negative total");
    }

    let draft = OrderDraft {
        customer: payload.customer,
        products,
        charges: payload.charges,
        total: totals.total,
    };

    let (status, response) = match payload.target {
        SubmitTarget::Quotation => {
            let quotation = state.upstream.create_quotation(&draft).await?;
            state.quotations.upsert(quotation.clone()).await;
            (StatusCode::CREATED, SubmitResponse::Quotation(quotation.into()))
        }
        SubmitTarget::Booking => {
            let booking = state.upstream.create_booking(&draft).await?;
            state.bookings.upsert(booking.clone()).await;
            refresh_products_quietly(&state).await;
            (StatusCode::CREATED, SubmitResponse::Booking(booking.into()))
        }
        SubmitTarget::QuotationUpdate { id } => {
            if let Some(existing) = state.quotations.get(&id).await {
                check_quotation(&existing, QuotationAction::Edit)?;
            }
            let quotation = state.upstream.update_quotation(&id, &draft).await?;
            state.quotations.upsert(quotation.clone()).await;
            (StatusCode::OK, SubmitResponse::Quotation(quotation.into()))
        }
    };

    state.admin_carts.write().await.remove(&key);
    info!(cart = %key, admin = %session.username, total = totals.total, "Admin cart submitted");

    Ok((status, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartField;
    use crate::lifecycle::QuotationStatus;
    use crate::models::customer::Customer;
    use crate::state::tests::test_state;

    fn session() -> Extension<SessionContext> {
        Extension(SessionContext { username: "admin".into() })
    }

    fn request(target: SubmitTarget, charges: ExtraCharges) -> Json<SubmitCartRequest> {
        Json(SubmitCartRequest {
            target,
            customer: Customer {
                name: "Selvam Traders".into(),
                mobile_number: "9443012345".into(),
                ..Default::default()
            },
            charges,
        })
    }

    async fn fill(state: &AppState, key: &str, serial: &str, quantity: u32) {
        add_item(
            State(state.clone()),
            Path(key.to_string()),
            Json(AddToCartRequest { serial_number: serial.into(), quantity }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn admin_rows_survive_zero_quantity() {
        let (state, _) = test_state().await;
        fill(&state, "direct", "FW-1", 2).await;

        let Json(res) = update_item(
            State(state.clone()),
            Path(("direct".to_string(), "FW-1".to_string())),
            Json(UpdateCartItemRequest { field: CartField::Quantity, value: 0.0 }),
        )
        .await
        .unwrap();
        assert_eq!(res.items.len(), 1);
        assert_eq!(res.totals.total, 0.0);

        // Admin carts never reach local storage.
        assert!(state.storage.load_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_as_quotation_then_edit_in_place() {
        let (state, _) = test_state().await;
        fill(&state, "new-quote", "FW-1", 2).await;

        let (status, Json(res)) = submit(
            State(state.clone()),
            session(),
            Path("new-quote".into()),
            request(SubmitTarget::Quotation, ExtraCharges::new(5.0, 2.0, 1.0)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let SubmitResponse::Quotation(quotation) = res else { panic!("expected a quotation") };
        assert_eq!(quotation.quotation.total, 186.0);
        assert_eq!(quotation.quotation.status, QuotationStatus::Pending);
        assert!(state.admin_carts.read().await.get("new-quote").is_none());

        let id = quotation.quotation.id.clone();
        let path = Path(("edit".to_string(), id.clone()));
        let Json(loaded) = load_quotation(State(state.clone()), path).await.unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.totals.total, 186.0);

        update_item(
            State(state.clone()),
            Path(("edit".to_string(), "FW-1".to_string())),
            Json(UpdateCartItemRequest { field: CartField::Discount, value: 20.0 }),
        )
        .await
        .unwrap();

        let (status, Json(res)) = submit(
            State(state.clone()),
            session(),
            Path("edit".into()),
            request(SubmitTarget::QuotationUpdate { id: id.clone() }, ExtraCharges::default()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::OK);
        let SubmitResponse::Quotation(updated) = res else { panic!("expected a quotation") };
        assert_eq!(updated.quotation.id, id);
        assert_eq!(updated.quotation.total, 160.0);
        assert_eq!(state.quotations.get(&id).await.unwrap().total, 160.0);
    }

    #[tokio::test]
    async fn submit_as_direct_booking() {
        let (state, _) = test_state().await;
        fill(&state, "direct", "FW-2", 1).await;

        let (_, Json(res)) = submit(
            State(state.clone()),
            session(),
            Path("direct".into()),
            request(SubmitTarget::Booking, ExtraCharges::default()),
        )
        .await
        .unwrap();
        let SubmitResponse::Booking(booking) = res else { panic!("expected a booking") };
        assert_eq!(booking.balance, 250.0);
        assert_eq!(state.products.get("FW-2").await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn unknown_cart_cannot_be_submitted() {
        let (state, _) = test_state().await;
        let err = submit(
            State(state),
            session(),
            Path("missing".into()),
            request(SubmitTarget::Quotation, ExtraCharges::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn edits_to_unknown_carts_are_not_found() {
        let (state, _) = test_state().await;

        let err = update_item(
            State(state.clone()),
            Path(("ghost".to_string(), "FW-1".to_string())),
            Json(UpdateCartItemRequest { field: CartField::Quantity, value: 2.0 }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let path = Path(("ghost".to_string(), "FW-1".to_string()));
        let err = remove_item(State(state.clone()), path).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = add_item(
            State(state.clone()),
            Path("ghost".to_string()),
            Json(AddToCartRequest { serial_number: "FW-3".into(), quantity: 1 }),
        )
        .await
        .unwrap_err();
        assert!(err.message().contains("out of stock"));
        assert!(state.admin_carts.read().await.is_empty());
    }

    #[tokio::test]
    async fn query_charges_fall_back_to_zero() {
        let (state, _) = test_state().await;
        fill(&state, "direct", "FW-1", 2).await;

        let uri = "/admin-carts/direct?tax=abc&pf=2".parse().unwrap();
        let query = Query::<ExtraCharges>::try_from_uri(&uri).unwrap();
        let Json(res) = get_cart(State(state), Path("direct".into()), query).await;
        assert_eq!(res.totals.total, 182.0);
    }
}
