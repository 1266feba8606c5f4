//! Data models for BookNest entities

pub mod book;
pub mod loan;
pub mod prebooking;
pub mod user;
