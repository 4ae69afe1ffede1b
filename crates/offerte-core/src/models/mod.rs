//! Data models for quotations and configuration.

pub mod amount;
pub mod config;
pub mod invoice;
