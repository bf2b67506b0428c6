use serde::{Deserialize, Serialize};

use crate::lifecycle::{booking_actions, BookingAction};
use crate::models::booking::Booking;
use crate::models::order::DispatchLine;
use crate::pricing::Totals;

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub totals: Totals,
    pub balance: f64,
    pub fully_dispatched: bool,
    pub actions: Vec<BookingAction>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            totals: booking.totals(),
            balance: booking.balance(),
            fully_dispatched: booking.fully_dispatched(),
            actions: booking_actions(&booking),
            booking,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub products: Vec<DispatchLine>,
}
