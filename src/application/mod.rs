//! Application services: entity facades and the record-store seam.

pub mod api;
pub mod error;
pub mod repos;
