// src/services/export_service.rs

use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::{error::AppError, money::format_pl},
    db::{
        ContractorRepository, CostRepository, DriverRepository, FleetRepository, InvoiceRepository,
        OrderRepository,
    },
    models::{
        contractors::Contractor,
        costs::Cost,
        drivers::Driver,
        fleet::{Trailer, Vehicle},
        invoices::InvoiceListItem,
        orders::OrderListItem,
        transfer::{ExportEntity, ExportFormat, ExportQuery},
    },
    services::cost_service::check_range,
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Arquivo pronto para download.
#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// `orders_20240517.csv`
pub fn file_name(entity: ExportEntity, format: ExportFormat, today: NaiveDate) -> String {
    format!("{}_{}.{}", entity.as_str(), today.format("%Y%m%d"), format.extension())
}

// Valor de uma célula; CSV e XML formatam de forma diferente.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Money(Decimal),
    Number(Decimal),
    Int(i64),
    Flag(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Label { code: String, label: &'static str },
}

impl Cell {
    fn text(value: &Option<String>) -> Self {
        value.clone().map(Cell::Text).unwrap_or(Cell::Empty)
    }

    fn date(value: Option<NaiveDate>) -> Self {
        value.map(Cell::Date).unwrap_or(Cell::Empty)
    }

    fn number(value: Option<Decimal>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }

    fn id(value: Option<Uuid>) -> Self {
        value.map(|id| Cell::Text(id.to_string())).unwrap_or(Cell::Empty)
    }

    fn label<T: Serialize>(value: &T, label: &'static str) -> Self {
        Cell::Label { code: enum_code(value), label }
    }

    fn csv(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Money(d) => format_pl(*d),
            Cell::Number(d) => d.normalize().to_string().replace('.', ","),
            Cell::Int(i) => i.to_string(),
            Cell::Flag(true) => "Tak".to_string(),
            Cell::Flag(false) => "Nie".to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Timestamp(t) => t.format("%Y-%m-%d %H:%M").to_string(),
            Cell::Label { label, .. } => label.to_string(),
        }
    }

    fn xml(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Money(d) => Some(format!("{:.2}", d)),
            Cell::Number(d) => Some(d.normalize().to_string()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Flag(b) => Some(b.to_string()),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Cell::Timestamp(t) => Some(t.to_rfc3339()),
            Cell::Label { code, .. } => Some(code.clone()),
        }
    }
}

// Código SCREAMING_CASE do enum, igual ao da API.
fn enum_code<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

/// Registro exportável: colunas (chave camelCase, cabeçalho polonês) e células.
trait ExportRecord: Serialize {
    const COLUMNS: &'static [(&'static str, &'static str)];

    fn cells(&self) -> Vec<Cell>;
}

impl ExportRecord for OrderListItem {
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("orderNumber", "Numer zlecenia"),
        ("status", "Status"),
        ("contractorName", "Kontrahent"),
        ("loadingAddress", "Miejsce załadunku"),
        ("loadingDate", "Data załadunku"),
        ("unloadingAddress", "Miejsce rozładunku"),
        ("unloadingDate", "Data rozładunku"),
        ("cargoDescription", "Ładunek"),
        ("cargoWeightKg", "Waga (kg)"),
        ("isAdr", "ADR"),
        ("priceNet", "Cena netto"),
        ("currency", "Waluta"),
    ];

    fn cells(&self) -> Vec<Cell> {
        let o = &self.order;
        vec![
            Cell::Text(o.order_number.clone()),
            Cell::label(&o.status, o.status.label()),
            Cell::Text(self.contractor_name.clone()),
            Cell::Text(o.loading_address.clone()),
            Cell::Timestamp(o.loading_date),
            Cell::Text(o.unloading_address.clone()),
            Cell::Timestamp(o.unloading_date),
            Cell::Text(o.cargo_description.clone()),
            Cell::number(o.cargo_weight_kg),
            Cell::Flag(o.is_adr),
            Cell::Money(o.price_net),
            Cell::Text(o.currency.clone()),
        ]
    }
}

impl ExportRecord for Cost {
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("costDate", "Data"),
        ("category", "Kategoria"),
        ("description", "Opis"),
        ("amount", "Kwota"),
        ("currency", "Waluta"),
        ("vehicleId", "Pojazd"),
        ("driverId", "Kierowca"),
        ("orderId", "Zlecenie"),
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Date(self.cost_date),
            Cell::label(&self.category, self.category.label()),
            Cell::text(&self.description),
            Cell::Money(self.amount),
            Cell::Text(self.currency.clone()),
            Cell::id(self.vehicle_id),
            Cell::id(self.driver_id),
            Cell::id(self.order_id),
        ]
    }
}

impl ExportRecord for InvoiceListItem {
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("invoiceNumber", "Numer faktury"),
        ("status", "Status"),
        ("contractorName", "Kontrahent"),
        ("issueDate", "Data wystawienia"),
        ("saleDate", "Data sprzedaży"),
        ("dueDate", "Termin płatności"),
        ("totalNet", "Netto"),
        ("totalVat", "VAT"),
        ("totalGross", "Brutto"),
        ("currency", "Waluta"),
        ("paidAt", "Data zapłaty"),
    ];

    fn cells(&self) -> Vec<Cell> {
        let i = &self.invoice;
        vec![
            Cell::Text(i.invoice_number.clone()),
            Cell::label(&i.status, i.status.label()),
            Cell::Text(self.contractor_name.clone()),
            Cell::Date(i.issue_date),
            Cell::Date(i.sale_date),
            Cell::Date(i.due_date),
            Cell::Money(i.total_net),
            Cell::Money(i.total_vat),
            Cell::Money(i.total_gross),
            Cell::Text(i.currency.clone()),
            i.paid_at.map(Cell::Timestamp).unwrap_or(Cell::Empty),
        ]
    }
}

impl ExportRecord for Driver {
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("firstName", "Imię"),
        ("lastName", "Nazwisko"),
        ("email", "E-mail"),
        ("phone", "Telefon"),
        ("licenseNumber", "Nr prawa jazdy"),
        ("licenseExpiry", "Ważność prawa jazdy"),
        ("adrCertified", "ADR"),
        ("adrExpiry", "Ważność ADR"),
        ("medicalExamExpiry", "Badania lekarskie"),
        ("employedSince", "Zatrudniony od"),
        ("isActive", "Aktywny"),
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.first_name.clone()),
            Cell::Text(self.last_name.clone()),
            Cell::text(&self.email),
            Cell::text(&self.phone),
            Cell::Text(self.license_number.clone()),
            Cell::date(self.license_expiry),
            Cell::Flag(self.adr_certified),
            Cell::date(self.adr_expiry),
            Cell::date(self.medical_exam_expiry),
            Cell::date(self.employed_since),
            Cell::Flag(self.is_active),
        ]
    }
}

impl ExportRecord for Vehicle {
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("registrationNumber", "Nr rejestracyjny"),
        ("brand", "Marka"),
        ("model", "Model"),
        ("productionYear", "Rok produkcji"),
        ("vin", "VIN"),
        ("vehicleType", "Typ"),
        ("status", "Status"),
        ("mileageKm", "Przebieg (km)"),
        ("insuranceExpiry", "Ważność OC"),
        ("inspectionExpiry", "Przegląd techniczny"),
        ("isActive", "Aktywny"),
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.registration_number.clone()),
            Cell::Text(self.brand.clone()),
            Cell::Text(self.model.clone()),
            self.production_year.map(|y| Cell::Int(y.into())).unwrap_or(Cell::Empty),
            Cell::text(&self.vin),
            Cell::label(&self.vehicle_type, self.vehicle_type.label()),
            Cell::label(&self.status, self.status.label()),
            Cell::Int(self.mileage_km.into()),
            Cell::date(self.insurance_expiry),
            Cell::date(self.inspection_expiry),
            Cell::Flag(self.is_active),
        ]
    }
}

impl ExportRecord for Trailer {
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("registrationNumber", "Nr rejestracyjny"),
        ("trailerType", "Typ"),
        ("capacityKg", "Ładowność (kg)"),
        ("volumeM3", "Objętość (m3)"),
        ("insuranceExpiry", "Ważność OC"),
        ("inspectionExpiry", "Przegląd techniczny"),
        ("isActive", "Aktywny"),
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.registration_number.clone()),
            Cell::label(&self.trailer_type, self.trailer_type.label()),
            Cell::number(self.capacity_kg),
            Cell::number(self.volume_m3),
            Cell::date(self.insurance_expiry),
            Cell::date(self.inspection_expiry),
            Cell::Flag(self.is_active),
        ]
    }
}

impl ExportRecord for Contractor {
    const COLUMNS: &'static [(&'static str, &'static str)] = &[
        ("name", "Nazwa"),
        ("kind", "Rodzaj"),
        ("nip", "NIP"),
        ("address", "Adres"),
        ("postalCode", "Kod pocztowy"),
        ("city", "Miasto"),
        ("country", "Kraj"),
        ("email", "E-mail"),
        ("phone", "Telefon"),
        ("paymentTermDays", "Termin płatności (dni)"),
        ("isActive", "Aktywny"),
    ];

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.name.clone()),
            Cell::label(&self.kind, self.kind.label()),
            Cell::text(&self.nip),
            Cell::text(&self.address),
            Cell::text(&self.postal_code),
            Cell::text(&self.city),
            Cell::Text(self.country.clone()),
            Cell::text(&self.email),
            Cell::text(&self.phone),
            Cell::Int(self.payment_term_days.into()),
            Cell::Flag(self.is_active),
        ]
    }
}

fn render<T: ExportRecord>(entity: ExportEntity, format: ExportFormat, records: &[T]) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Xml => to_xml(entity, records),
        ExportFormat::Json => Ok(serde_json::to_vec_pretty(records).map_err(anyhow::Error::from)?),
    }
}

fn to_csv<T: ExportRecord>(records: &[T]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(T::COLUMNS.iter().map(|(_, header)| *header))?;
    for record in records {
        writer.write_record(record.cells().iter().map(Cell::csv))?;
    }

    writer.into_inner().map_err(|e| AppError::IoError(e.into_error()))
}

fn xml_error<E>(e: E) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    AppError::InternalServerError(e.into())
}

fn to_xml<T: ExportRecord>(entity: ExportEntity, records: &[T]) -> Result<Vec<u8>, AppError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new(entity.as_str())))
        .map_err(xml_error)?;

    for record in records {
        writer
            .write_event(Event::Start(BytesStart::new(entity.record_tag())))
            .map_err(xml_error)?;
        for ((key, _), cell) in T::COLUMNS.iter().zip(record.cells()) {
            match cell.xml() {
                Some(value) => {
                    writer.write_event(Event::Start(BytesStart::new(*key))).map_err(xml_error)?;
                    writer.write_event(Event::Text(BytesText::new(&value))).map_err(xml_error)?;
                    writer.write_event(Event::End(BytesEnd::new(*key))).map_err(xml_error)?;
                }
                None => writer.write_event(Event::Empty(BytesStart::new(*key))).map_err(xml_error)?,
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(entity.record_tag())))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(entity.as_str())))
        .map_err(xml_error)?;

    Ok(writer.into_inner())
}

#[derive(Clone)]
pub struct ExportService {
    order_repo: OrderRepository,
    cost_repo: CostRepository,
    invoice_repo: InvoiceRepository,
    driver_repo: DriverRepository,
    fleet_repo: FleetRepository,
    contractor_repo: ContractorRepository,
}

impl ExportService {
    pub fn new(
        order_repo: OrderRepository,
        cost_repo: CostRepository,
        invoice_repo: InvoiceRepository,
        driver_repo: DriverRepository,
        fleet_repo: FleetRepository,
        contractor_repo: ContractorRepository,
    ) -> Self {
        Self { order_repo, cost_repo, invoice_repo, driver_repo, fleet_repo, contractor_repo }
    }

    pub async fn export(
        &self,
        tenant_id: Uuid,
        entity: ExportEntity,
        query: &ExportQuery,
    ) -> Result<ExportFile, AppError> {
        let format = query.format.unwrap_or_default();
        let (from, to) = (query.date_from, query.date_to);
        check_range(from, to)?;

        let body = match entity {
            ExportEntity::Orders => {
                render(entity, format, &self.order_repo.list_for_export(tenant_id, from, to).await?)?
            }
            ExportEntity::Costs => {
                render(entity, format, &self.cost_repo.list_for_export(tenant_id, from, to).await?)?
            }
            ExportEntity::Invoices => {
                render(entity, format, &self.invoice_repo.list_for_export(tenant_id, from, to).await?)?
            }
            ExportEntity::Drivers => render(entity, format, &self.driver_repo.list_all(tenant_id).await?)?,
            ExportEntity::Vehicles => {
                render(entity, format, &self.fleet_repo.list_all_vehicles(tenant_id).await?)?
            }
            ExportEntity::Trailers => {
                render(entity, format, &self.fleet_repo.list_all_trailers(tenant_id).await?)?
            }
            ExportEntity::Contractors => {
                render(entity, format, &self.contractor_repo.list_all(tenant_id).await?)?
            }
        };

        tracing::debug!("Eksport {} ({}): {} bajtów", entity.as_str(), format.extension(), body.len());

        Ok(ExportFile {
            file_name: file_name(entity, format, Utc::now().date_naive()),
            content_type: format.content_type(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::costs::CostCategory;
    use std::str::FromStr;

    fn cost(day: u32, category: CostCategory, amount: &str, description: &str) -> Cost {
        Cost {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            category,
            description: Some(description.to_string()),
            amount: Decimal::from_str(amount).unwrap(),
            currency: "PLN".into(),
            cost_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            vehicle_id: None,
            driver_id: None,
            order_id: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn contractor() -> Contractor {
        Contractor {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: "Trans & Spedycja <Nord>".into(),
            kind: crate::models::contractors::ContractorKind::Client,
            nip: Some("5260001246".into()),
            address: None,
            city: Some("Gdańsk".into()),
            postal_code: None,
            country: "PL".into(),
            email: None,
            phone: None,
            payment_term_days: 14,
            notes: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn file_name_carries_entity_and_date() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        assert_eq!(file_name(ExportEntity::Costs, ExportFormat::Csv, today), "costs_20240507.csv");
        assert_eq!(file_name(ExportEntity::Orders, ExportFormat::Xml, today), "orders_20240507.xml");
    }

    #[test]
    fn csv_has_bom_polish_headers_and_comma_decimals() {
        let costs = vec![
            cost(1, CostCategory::Fuel, "1520.4", "Tankowanie; Stryków"),
            cost(15, CostCategory::Toll, "89", "A2"),
        ];
        let body = render(ExportEntity::Costs, ExportFormat::Csv, &costs).unwrap();

        assert!(body.starts_with(UTF8_BOM));
        let text = String::from_utf8(body[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Data;Kategoria;Opis;Kwota;Waluta;Pojazd;Kierowca;Zlecenie");
        assert_eq!(lines[1], "2024-03-01;Paliwo;\"Tankowanie; Stryków\";1520,40;PLN;;;");
        assert_eq!(lines[2], "2024-03-15;Opłaty drogowe;A2;89,00;PLN;;;");
    }

    #[test]
    fn csv_of_nothing_is_just_the_header() {
        let body = render::<Cost>(ExportEntity::Costs, ExportFormat::Csv, &[]).unwrap();
        let text = String::from_utf8(body[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn xml_uses_entity_root_and_camel_case_fields() {
        let body = render(ExportEntity::Contractors, ExportFormat::Xml, &[contractor()]).unwrap();
        let xml = String::from_utf8(body).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<contractors>"));
        assert!(xml.contains("<contractor>"));
        assert!(xml.contains("<paymentTermDays>14</paymentTermDays>"));
        assert!(xml.contains("<kind>CLIENT</kind>"));
        assert!(xml.contains("<name>Trans &amp; Spedycja &lt;Nord&gt;</name>"));
        assert!(xml.contains("<address/>"));
        assert!(xml.trim_end().ends_with("</contractors>"));
    }

    #[test]
    fn json_is_an_array_of_records() {
        let costs = vec![cost(2, CostCategory::Parking, "12.5", "Parking")];
        let body = render(ExportEntity::Costs, ExportFormat::Json, &costs).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["category"], "PARKING");
        assert_eq!(items[0]["costDate"], "2024-03-02");
    }

    #[test]
    fn labels_go_to_csv_and_codes_to_xml() {
        let cell = Cell::label(&CostCategory::Repair, CostCategory::Repair.label());
        assert_eq!(cell.csv(), "Naprawa");
        assert_eq!(cell.xml().as_deref(), Some("REPAIR"));
        assert_eq!(Cell::Flag(true).csv(), "Tak");
        assert_eq!(Cell::Number(Decimal::from_str("24000.50").unwrap()).csv(), "24000,5");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn cost_export_contains_only_the_requested_range(pool: sqlx::PgPool) {
        use crate::db::fixtures;

        let (tenant_id, _) = fixtures::tenant_with_admin(&pool).await;
        let (other_tenant, _) = fixtures::tenant_with_admin(&pool).await;
        let days = [
            (tenant_id, "2024-02-29"),
            (tenant_id, "2024-03-01"),
            (tenant_id, "2024-03-15"),
            (tenant_id, "2024-03-31"),
            (tenant_id, "2024-04-01"),
            (other_tenant, "2024-03-10"),
        ];
        for (tenant, day) in days {
            sqlx::query("INSERT INTO costs (tenant_id, category, amount, cost_date) VALUES ($1, 'FUEL', 100, $2)")
                .bind(tenant)
                .bind(NaiveDate::from_str(day).unwrap())
                .execute(&pool)
                .await
                .unwrap();
        }

        let exports = ExportService::new(
            OrderRepository::new(pool.clone()),
            CostRepository::new(pool.clone()),
            InvoiceRepository::new(pool.clone()),
            DriverRepository::new(pool.clone()),
            FleetRepository::new(pool.clone()),
            ContractorRepository::new(pool.clone()),
        );
        let query = ExportQuery {
            format: Some(ExportFormat::Csv),
            date_from: NaiveDate::from_ymd_opt(2024, 3, 1),
            date_to: NaiveDate::from_ymd_opt(2024, 3, 31),
        };
        let file = exports.export(tenant_id, ExportEntity::Costs, &query).await.unwrap();

        let text = String::from_utf8(file.body[UTF8_BOM.len()..].to_vec()).unwrap();
        let days: Vec<&str> = text.lines().skip(1).filter_map(|line| line.split(';').next()).collect();
        assert_eq!(days, ["2024-03-01", "2024-03-15", "2024-03-31"]);
    }
}
