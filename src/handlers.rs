// src/handlers.rs

pub mod auth;
pub mod customers;
pub mod delivery_notes;
pub mod documents;
pub mod drivers;
pub mod payments;
pub mod reports;
pub mod wood_types;
