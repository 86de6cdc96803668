// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "TMS Backend", description = "Spedycja i transport: flota, zlecenia, faktury, koszty"),
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::change_password,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::deactivate_user,

        // --- Drivers ---
        handlers::drivers::list_drivers,
        handlers::drivers::get_driver,
        handlers::drivers::create_driver,
        handlers::drivers::update_driver,
        handlers::drivers::deactivate_driver,
        handlers::drivers::reactivate_driver,

        // --- Fleet ---
        handlers::fleet::list_vehicles,
        handlers::fleet::get_vehicle,
        handlers::fleet::create_vehicle,
        handlers::fleet::update_vehicle,
        handlers::fleet::deactivate_vehicle,
        handlers::fleet::list_trailers,
        handlers::fleet::get_trailer,
        handlers::fleet::create_trailer,
        handlers::fleet::update_trailer,
        handlers::fleet::deactivate_trailer,

        // --- Contractors ---
        handlers::contractors::list_contractors,
        handlers::contractors::get_contractor,
        handlers::contractors::create_contractor,
        handlers::contractors::update_contractor,
        handlers::contractors::deactivate_contractor,

        // --- Orders ---
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::create_order,
        handlers::orders::update_order,
        handlers::orders::change_order_status,
        handlers::orders::delete_order,
        handlers::orders::add_assignment,
        handlers::orders::remove_assignment,
        handlers::orders::download_cmr,

        // --- Invoices ---
        handlers::invoices::list_invoices,
        handlers::invoices::get_invoice,
        handlers::invoices::create_invoice,
        handlers::invoices::create_invoice_from_order,
        handlers::invoices::update_invoice,
        handlers::invoices::change_invoice_status,
        handlers::invoices::delete_invoice,
        handlers::invoices::download_invoice_pdf,

        // --- Costs ---
        handlers::costs::list_costs,
        handlers::costs::cost_summary,
        handlers::costs::get_cost,
        handlers::costs::create_cost,
        handlers::costs::update_cost,
        handlers::costs::delete_cost,

        // --- Documents ---
        handlers::documents::list_documents,
        handlers::documents::get_document,
        handlers::documents::upload_document,
        handlers::documents::download_document,
        handlers::documents::delete_document,

        // --- Notes ---
        handlers::notes::list_notes,
        handlers::notes::get_note,
        handlers::notes::create_note,
        handlers::notes::update_note,
        handlers::notes::delete_note,
        handlers::notes::add_comment,
        handlers::notes::delete_comment,
        handlers::notes::toggle_reaction,

        // --- Export / import ---
        handlers::transfer::export_entity,
        handlers::transfer::import_entity,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_monthly_chart,
        handlers::dashboard::get_alerts,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Mobile ---
        handlers::mobile::mobile_login,
        handlers::mobile::my_orders,
        handlers::mobile::my_order,
        handlers::mobile::update_my_order_status,
        handlers::mobile::report_cost,
        handlers::mobile::upload_order_document,
    ),
    components(
        schemas(
            // --- Auth / Users ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterPayload,
            models::auth::LoginPayload,
            models::auth::ChangePasswordPayload,
            models::auth::AuthResponse,
            models::users::CreateUserPayload,
            models::users::UpdateUserPayload,

            // --- Drivers / Fleet ---
            models::drivers::Driver,
            models::drivers::DriverInput,
            models::fleet::VehicleType,
            models::fleet::VehicleStatus,
            models::fleet::Vehicle,
            models::fleet::VehicleInput,
            models::fleet::TrailerType,
            models::fleet::Trailer,
            models::fleet::TrailerInput,

            // --- Contractors ---
            models::contractors::ContractorKind,
            models::contractors::Contractor,
            models::contractors::ContractorInput,

            // --- Orders ---
            models::orders::OrderStatus,
            models::orders::ResourceKind,
            models::orders::Order,
            models::orders::OrderListItem,
            models::orders::OrderInput,
            models::orders::StatusChangeInput,
            models::orders::OrderAssignment,
            models::orders::AssignmentInput,
            models::orders::StatusHistoryEntry,
            models::orders::RevenueShareLine,
            models::orders::OrderDetail,

            // --- Invoices ---
            models::invoices::InvoiceStatus,
            models::invoices::Invoice,
            models::invoices::InvoiceListItem,
            models::invoices::InvoiceItem,
            models::invoices::InvoiceItemInput,
            models::invoices::InvoiceInput,
            models::invoices::InvoiceFromOrderInput,
            models::invoices::InvoiceStatusInput,
            models::invoices::InvoiceDetail,

            // --- Costs ---
            models::costs::CostCategory,
            models::costs::Cost,
            models::costs::CostInput,
            models::costs::CostPage,
            models::costs::CostCategorySummary,

            // --- Documents ---
            models::documents::DocumentType,
            models::documents::Document,

            // --- Notes ---
            models::notes::NoteEntity,
            models::notes::Note,
            models::notes::NoteComment,
            models::notes::ReactionCount,
            models::notes::NoteDetail,
            models::notes::NoteInput,
            models::notes::CommentInput,
            models::notes::ReactionInput,
            models::notes::ReactionToggle,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::MonthlyChartEntry,
            models::dashboard::AlertSource,
            models::dashboard::AlertKind,
            models::dashboard::ExpiryAlert,

            // --- Settings ---
            models::settings::TenantSettings,
            models::settings::UpdateSettingsRequest,

            // --- Export / import ---
            models::transfer::ExportFormat,
            models::transfer::ImportRowError,
            models::transfer::ImportResult,
        )
    ),
    tags(
        (name = "Auth", description = "Rejestracja firmy, logowanie, hasło"),
        (name = "Users", description = "Konta użytkowników firmy"),
        (name = "Drivers", description = "Kierowcy"),
        (name = "Fleet", description = "Pojazdy i naczepy"),
        (name = "Contractors", description = "Kontrahenci"),
        (name = "Orders", description = "Zlecenia transportowe, statusy i przypisania"),
        (name = "Invoices", description = "Faktury VAT"),
        (name = "Costs", description = "Koszty"),
        (name = "Documents", description = "Dokumenty i pliki"),
        (name = "Notes", description = "Notatki zespołu"),
        (name = "Transfer", description = "Eksport CSV/XML/JSON i import CSV"),
        (name = "Dashboard", description = "Wskaźniki i alerty terminów"),
        (name = "Settings", description = "Dane firmy"),
        (name = "Mobile", description = "Aplikacja kierowcy")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_protected_route_uses_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
        assert!(doc.paths.paths.contains_key("/api/orders/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/export/{entity}"));
        assert!(doc.paths.paths.contains_key("/api/mobile/auth/login"));
    }
}
