//! Recurring billing: expanding a purchase-order commitment into installments

pub mod schedule;

pub use schedule::*;
