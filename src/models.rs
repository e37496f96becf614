// src/models.rs

pub mod auth;
pub mod delivery;
pub mod finance;
pub mod page;
pub mod registry;
pub mod reports;
