use serde::Serialize;

use crate::lifecycle::BookingStatus;

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct StatusBucket {
    pub count: usize,
    pub value: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ProductMovement {
    pub serial_number: String,
    pub product_name: String,
    pub booked: u32,
    pub dispatched: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ReportSummary {
    pub by_status: Vec<(BookingStatus, StatusBucket)>,
    pub bookings: usize,
    pub order_value: f64,
    pub collected: f64,
    pub outstanding: f64,
    pub pending_quotations: usize,
    pub products: Vec<ProductMovement>,
}
