// src/common.rs

pub mod clock;
pub mod db_utils;
pub mod decimal;
pub mod error;
pub mod i18n;
pub mod period;
