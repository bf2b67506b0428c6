pub mod booking;
pub mod cart;
pub mod common;
pub mod pricing;
pub mod product;
pub mod quotation;
pub mod report;
pub mod session;
