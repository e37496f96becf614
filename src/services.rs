// src/services.rs

pub mod auth;
pub mod csv_export;
pub mod delivery_service;
pub mod document_service;
pub mod payment_service;
pub mod registry_service;
pub mod report_service;
pub mod totals;
