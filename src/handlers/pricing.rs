use axum::Json;

use crate::dtos::pricing::{PriceRequest, PriceResponse, PricedLine};
use crate::pricing::compute_totals;

// POST /pricing - Price an arbitrary list of lines
pub async fn price_items(Json(req): Json<PriceRequest>) -> Json<PriceResponse> {
    let totals = compute_totals(&req.items, &req.charges());
    Json(PriceResponse {
        lines: req.items.iter().map(PricedLine::from).collect(),
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn prices_loose_form_input() {
        let req: PriceRequest = serde_json::from_value(json!({
            "items": [
                { "price": 100, "discount": 10, "qty": 2 },
                { "price": "oops", "discount": 5, "quantity": "3" }
            ],
            "tax": 5, "pf": "2", "deduction": 1
        }))
        .unwrap();

        let Json(res) = price_items(Json(req)).await;
        assert_eq!(res.totals.total, 186.0);
        assert_eq!(res.lines[0].net_price, 90.0);
        assert_eq!(res.lines[0].line_total, 180.0);
        assert_eq!(res.lines[1].line_total, 0.0);
    }
}
