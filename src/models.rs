// src/models.rs

pub mod auth;
pub mod contractors;
pub mod costs;
pub mod dashboard;
pub mod documents;
pub mod drivers;
pub mod fleet;
pub mod invoices;
pub mod notes;
pub mod orders;
pub mod settings;
pub mod tenancy;
pub mod transfer;
pub mod users;
