// src/services.rs

pub mod auth;
pub mod contractor_service;
pub mod cost_service;
pub mod dashboard_service;
pub mod document_service;
pub mod driver_service;
pub mod export_service;
pub mod fleet_service;
pub mod import_service;
pub mod invoice_service;
pub mod note_service;
pub mod numbering;
pub mod order_service;
pub mod revenue;
pub mod settings_service;
pub mod user_service;
