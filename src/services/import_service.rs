// src/services/import_service.rs

use std::{borrow::Cow, collections::HashMap, str::FromStr};

use chrono::NaiveDate;
use csv::StringRecord;
use encoding_rs::WINDOWS_1250;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, i18n::I18nStore},
    db::{ContractorRepository, DriverRepository, FleetRepository},
    middleware::i18n::Locale,
    models::{
        contractors::{ContractorInput, ContractorKind},
        drivers::DriverInput,
        fleet::{TrailerInput, TrailerType, VehicleInput, VehicleType},
        transfer::{ImportEntity, ImportResult, ImportRowError},
    },
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// (campo, obrigatório, nomes aceitos no cabeçalho: polonês, inglês, camelCase)
type ColumnSpec = (&'static str, bool, &'static [&'static str]);

const DRIVER_COLUMNS: &[ColumnSpec] = &[
    ("first_name", true, &["Imię", "Imie", "First name", "firstName"]),
    ("last_name", true, &["Nazwisko", "Last name", "lastName"]),
    ("email", false, &["E-mail", "Email"]),
    ("phone", false, &["Telefon", "Phone"]),
    ("license_number", true, &["Nr prawa jazdy", "Numer prawa jazdy", "License number", "licenseNumber"]),
    ("license_expiry", false, &["Ważność prawa jazdy", "License expiry", "licenseExpiry"]),
    ("adr_certified", false, &["ADR", "ADR certified", "adrCertified"]),
    ("adr_expiry", false, &["Ważność ADR", "ADR expiry", "adrExpiry"]),
    ("medical_exam_expiry", false, &["Badania lekarskie", "Medical exam expiry", "medicalExamExpiry"]),
    ("employed_since", false, &["Zatrudniony od", "Employed since", "employedSince"]),
    ("notes", false, &["Uwagi", "Notes"]),
];

const VEHICLE_COLUMNS: &[ColumnSpec] = &[
    ("registration_number", true, &["Nr rejestracyjny", "Numer rejestracyjny", "Registration number", "registrationNumber"]),
    ("brand", true, &["Marka", "Brand"]),
    ("model", true, &["Model"]),
    ("production_year", false, &["Rok produkcji", "Production year", "productionYear"]),
    ("vin", false, &["VIN"]),
    ("vehicle_type", true, &["Typ", "Typ pojazdu", "Type", "Vehicle type", "vehicleType"]),
    ("mileage_km", false, &["Przebieg (km)", "Przebieg", "Mileage", "Mileage (km)", "mileageKm"]),
    ("insurance_expiry", false, &["Ważność OC", "Insurance expiry", "insuranceExpiry"]),
    ("inspection_expiry", false, &["Przegląd techniczny", "Przegląd", "Inspection expiry", "inspectionExpiry"]),
    ("notes", false, &["Uwagi", "Notes"]),
];

const TRAILER_COLUMNS: &[ColumnSpec] = &[
    ("registration_number", true, &["Nr rejestracyjny", "Numer rejestracyjny", "Registration number", "registrationNumber"]),
    ("trailer_type", true, &["Typ", "Typ naczepy", "Type", "Trailer type", "trailerType"]),
    ("capacity_kg", false, &["Ładowność (kg)", "Ładowność", "Capacity (kg)", "Capacity", "capacityKg"]),
    ("volume_m3", false, &["Objętość (m3)", "Objętość", "Volume (m3)", "Volume", "volumeM3"]),
    ("insurance_expiry", false, &["Ważność OC", "Insurance expiry", "insuranceExpiry"]),
    ("inspection_expiry", false, &["Przegląd techniczny", "Przegląd", "Inspection expiry", "inspectionExpiry"]),
    ("notes", false, &["Uwagi", "Notes"]),
];

const CONTRACTOR_COLUMNS: &[ColumnSpec] = &[
    ("name", true, &["Nazwa", "Name"]),
    ("kind", false, &["Rodzaj", "Typ", "Kind", "Type"]),
    ("nip", false, &["NIP", "Tax id", "VAT id"]),
    ("address", false, &["Adres", "Address"]),
    ("postal_code", false, &["Kod pocztowy", "Postal code", "postalCode"]),
    ("city", false, &["Miasto", "City"]),
    ("country", false, &["Kraj", "Country"]),
    ("email", false, &["E-mail", "Email"]),
    ("phone", false, &["Telefon", "Phone"]),
    ("payment_term_days", false, &["Termin płatności (dni)", "Termin płatności", "Payment term", "Payment term (days)", "paymentTermDays"]),
    ("notes", false, &["Uwagi", "Notes"]),
];

fn columns_for(entity: ImportEntity) -> &'static [ColumnSpec] {
    match entity {
        ImportEntity::Drivers => DRIVER_COLUMNS,
        ImportEntity::Vehicles => VEHICLE_COLUMNS,
        ImportEntity::Trailers => TRAILER_COLUMNS,
        ImportEntity::Contractors => CONTRACTOR_COLUMNS,
    }
}

/// "Nr prawa jazdy" / "nr_prawa_jazdy" / "NrPrawaJazdy" -> "nrprawajazdy"
fn normalize_header(value: &str) -> String {
    value.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

/// Separador: ';' quando aparece no cabeçalho, senão ','.
pub fn detect_delimiter(data: &[u8]) -> u8 {
    let first_line = data.split(|b| *b == b'\n').next().unwrap_or_default();
    if first_line.contains(&b';') { b';' } else { b',' }
}

/// Índice de coluna para cada campo reconhecido.
fn map_headers(
    spec: &'static [ColumnSpec],
    headers: &StringRecord,
) -> Result<HashMap<&'static str, usize>, AppError> {
    let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
    let mut columns = HashMap::new();

    for (field, required, aliases) in spec {
        let position = normalized.iter().position(|header| {
            *header == normalize_header(field) || aliases.iter().any(|alias| *header == normalize_header(alias))
        });
        match position {
            Some(idx) => {
                columns.insert(*field, idx);
            }
            None if *required => return Err(AppError::InvalidInput("missing_header")),
            None => {}
        }
    }
    Ok(columns)
}

/// Motivo de rejeição de uma linha.
#[derive(Debug)]
enum RowError {
    Field(&'static str),
    App(AppError),
}

impl From<validator::ValidationErrors> for RowError {
    fn from(e: validator::ValidationErrors) -> Self {
        RowError::App(AppError::ValidationError(e))
    }
}

struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a HashMap<&'static str, usize>,
}

impl Row<'_> {
    fn text(&self, field: &'static str) -> Option<String> {
        self.columns
            .get(field)
            .and_then(|idx| self.record.get(*idx))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn required(&self, field: &'static str) -> String {
        self.text(field).unwrap_or_default()
    }

    fn parsed<T>(&self, field: &'static str, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>, RowError> {
        match self.text(field) {
            Some(raw) => parse(&raw).map(Some).ok_or(RowError::Field(field)),
            None => Ok(None),
        }
    }

    fn date(&self, field: &'static str) -> Result<Option<NaiveDate>, RowError> {
        self.parsed(field, parse_date)
    }

    fn decimal(&self, field: &'static str) -> Result<Option<Decimal>, RowError> {
        self.parsed(field, parse_decimal)
    }

    fn int(&self, field: &'static str) -> Result<Option<i32>, RowError> {
        self.parsed(field, |raw| raw.replace([' ', '\u{a0}'], "").parse().ok())
    }

    fn flag(&self, field: &'static str) -> Result<bool, RowError> {
        Ok(self.parsed(field, parse_flag)?.unwrap_or(false))
    }
}

/// Aceita `2024-05-31` e `31.05.2024`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%Y"))
        .ok()
}

/// "24 000,50" -> 24000.50
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    Decimal::from_str(&cleaned.replace(',', ".")).ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "tak" | "t" | "true" | "yes" | "y" | "1" => Some(true),
        "nie" | "n" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Linha já convertida e validada, pronta para gravar.
#[derive(Debug)]
enum ImportRow {
    Driver(DriverInput),
    Vehicle(VehicleInput),
    Trailer(TrailerInput),
    Contractor(ContractorInput),
}

fn driver_row(row: &Row) -> Result<ImportRow, RowError> {
    let input = DriverInput {
        first_name: row.required("first_name"),
        last_name: row.required("last_name"),
        email: row.text("email"),
        phone: row.text("phone"),
        license_number: row.required("license_number"),
        license_expiry: row.date("license_expiry")?,
        adr_certified: row.flag("adr_certified")?,
        adr_expiry: row.date("adr_expiry")?,
        medical_exam_expiry: row.date("medical_exam_expiry")?,
        employed_since: row.date("employed_since")?,
        notes: row.text("notes"),
    };
    input.validate()?;
    Ok(ImportRow::Driver(input))
}

fn vehicle_row(row: &Row) -> Result<ImportRow, RowError> {
    let vehicle_type = row.parsed("vehicle_type", VehicleType::parse)?.ok_or(RowError::Field("vehicle_type"))?;
    let input = VehicleInput {
        registration_number: row.required("registration_number"),
        brand: row.required("brand"),
        model: row.required("model"),
        production_year: row.int("production_year")?,
        vin: row.text("vin"),
        vehicle_type,
        status: None,
        mileage_km: row.int("mileage_km")?,
        insurance_expiry: row.date("insurance_expiry")?,
        inspection_expiry: row.date("inspection_expiry")?,
        notes: row.text("notes"),
    };
    input.validate()?;
    Ok(ImportRow::Vehicle(input))
}

fn trailer_row(row: &Row) -> Result<ImportRow, RowError> {
    let trailer_type = row.parsed("trailer_type", TrailerType::parse)?.ok_or(RowError::Field("trailer_type"))?;
    let input = TrailerInput {
        registration_number: row.required("registration_number"),
        trailer_type,
        capacity_kg: row.decimal("capacity_kg")?,
        volume_m3: row.decimal("volume_m3")?,
        insurance_expiry: row.date("insurance_expiry")?,
        inspection_expiry: row.date("inspection_expiry")?,
        notes: row.text("notes"),
    };
    input.validate()?;
    Ok(ImportRow::Trailer(input))
}

fn contractor_row(row: &Row) -> Result<ImportRow, RowError> {
    let input = ContractorInput {
        name: row.required("name"),
        kind: row.parsed("kind", ContractorKind::parse)?.unwrap_or(ContractorKind::Client),
        nip: row.text("nip"),
        address: row.text("address"),
        city: row.text("city"),
        postal_code: row.text("postal_code"),
        country: row.text("country").map(|c| c.to_uppercase()),
        email: row.text("email"),
        phone: row.text("phone"),
        payment_term_days: row.int("payment_term_days")?,
        notes: row.text("notes"),
    };
    input.validate()?;
    Ok(ImportRow::Contractor(input))
}

/// UTF-8 (com ou sem BOM); fora disso, Windows-1250, que é o que o Excel polonês grava.
fn decode_text(data: &[u8]) -> Result<Cow<'_, str>, AppError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    if let Ok(text) = std::str::from_utf8(data) {
        return Ok(Cow::Borrowed(text));
    }
    WINDOWS_1250
        .decode_without_bom_handling_and_without_replacement(data)
        .ok_or(AppError::InvalidInput("invalid_encoding"))
}

/// Lê o CSV inteiro. Erros de arquivo (vazio, sem coluna obrigatória) abortam;
/// erros de linha ficam junto do número da linha (cabeçalho = 1).
fn parse_rows(entity: ImportEntity, data: &[u8]) -> Result<Vec<(usize, Result<ImportRow, RowError>)>, AppError> {
    let text = decode_text(data)?;
    if text.trim().is_empty() {
        return Err(AppError::InvalidInput("empty_file"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(text.as_bytes()))
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(|_| AppError::InvalidInput("invalid_csv"))?;
    let columns = map_headers(columns_for(entity), headers)?;
    let build: fn(&Row<'_>) -> Result<ImportRow, RowError> = match entity {
        ImportEntity::Drivers => driver_row,
        ImportEntity::Vehicles => vehicle_row,
        ImportEntity::Trailers => trailer_row,
        ImportEntity::Contractors => contractor_row,
    };

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let row_number = idx + 2;
        let parsed = match record {
            Ok(record) => build(&Row { record: &record, columns: &columns }),
            Err(_) => Err(RowError::App(AppError::InvalidInput("invalid_csv"))),
        };
        rows.push((row_number, parsed));
    }
    Ok(rows)
}

// Erros de linha que viram mensagem; o resto (banco fora do ar etc.) aborta a importação.
fn is_row_level(e: &AppError) -> bool {
    matches!(
        e,
        AppError::ValidationError(_)
            | AppError::InvalidInput(_)
            | AppError::UniqueConstraintViolation(_)
            | AppError::StateConflict(_)
    )
}

fn row_message(error: &RowError, locale: &Locale, store: &I18nStore) -> String {
    match error {
        RowError::Field(field) => format!("{field}: {}", store.translate(&locale.0, "input.invalid_field")),
        RowError::App(e) => {
            let api = e.to_api_error(locale, store);
            match api.details {
                Some(Value::Object(fields)) => fields
                    .iter()
                    .map(|(field, messages)| {
                        let text = messages
                            .as_array()
                            .map(|m| m.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(" "))
                            .unwrap_or_default();
                        format!("{field}: {text}")
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
                _ => api.error,
            }
        }
    }
}

#[derive(Clone)]
pub struct ImportService {
    driver_repo: DriverRepository,
    fleet_repo: FleetRepository,
    contractor_repo: ContractorRepository,
    pool: PgPool,
}

impl ImportService {
    pub fn new(
        driver_repo: DriverRepository,
        fleet_repo: FleetRepository,
        contractor_repo: ContractorRepository,
        pool: PgPool,
    ) -> Self {
        Self { driver_repo, fleet_repo, contractor_repo, pool }
    }

    /// Importa linha a linha: as válidas são gravadas, as outras vão para `errors`.
    pub async fn import(
        &self,
        tenant_id: Uuid,
        entity: ImportEntity,
        data: &[u8],
        locale: &Locale,
        store: &I18nStore,
    ) -> Result<ImportResult, AppError> {
        let rows = parse_rows(entity, data)?;
        let mut result = ImportResult::default();

        for (row, parsed) in rows {
            let outcome = match parsed {
                Ok(input) => self.insert(tenant_id, &input).await.map_err(RowError::App),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => result.imported += 1,
                Err(RowError::App(e)) if !is_row_level(&e) => return Err(e),
                Err(e) => {
                    result.failed += 1;
                    result.errors.push(ImportRowError { row, message: row_message(&e, locale, store) });
                }
            }
        }

        tracing::info!(
            "📥 Import dla firmy {}: {} zaimportowano, {} odrzucono",
            tenant_id,
            result.imported,
            result.failed
        );
        Ok(result)
    }

    async fn insert(&self, tenant_id: Uuid, row: &ImportRow) -> Result<(), AppError> {
        match row {
            ImportRow::Driver(input) => {
                self.driver_repo.create(&self.pool, tenant_id, input).await?;
            }
            ImportRow::Vehicle(input) => {
                self.fleet_repo.create_vehicle(&self.pool, tenant_id, input).await?;
            }
            ImportRow::Trailer(input) => {
                self.fleet_repo.create_trailer(&self.pool, tenant_id, input).await?;
            }
            ImportRow::Contractor(input) => {
                self.contractor_repo.create(&self.pool, tenant_id, input).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::new().unwrap()
    }

    fn pl() -> Locale {
        Locale("pl".into())
    }

    #[test]
    fn delimiter_is_detected_from_the_header() {
        assert_eq!(detect_delimiter(b"Imie;Nazwisko\nJan;Kowalski"), b';');
        assert_eq!(detect_delimiter(b"firstName,lastName\nJan,Kowalski"), b',');
    }

    #[test]
    fn headers_match_polish_and_english_names_case_insensitively() {
        let polish = StringRecord::from(vec!["IMIĘ", "nazwisko", "Nr prawa jazdy"]);
        let english = StringRecord::from(vec!["license number", "First Name", "LAST_NAME"]);

        let columns = map_headers(DRIVER_COLUMNS, &polish).unwrap();
        assert_eq!(columns["first_name"], 0);
        assert_eq!(columns["license_number"], 2);

        let columns = map_headers(DRIVER_COLUMNS, &english).unwrap();
        assert_eq!(columns["license_number"], 0);
        assert_eq!(columns["last_name"], 2);
    }

    #[test]
    fn missing_required_column_rejects_the_file() {
        let err = parse_rows(ImportEntity::Drivers, b"Imie;Nazwisko\nJan;Kowalski").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput("missing_header")));
    }

    #[test]
    fn empty_file_is_rejected() {
        let err = parse_rows(ImportEntity::Contractors, b"\xEF\xBB\xBF\n").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput("empty_file")));
    }

    #[test]
    fn rows_are_numbered_from_two_and_validated_one_by_one() {
        let csv = "\u{feff}Imię;Nazwisko;Nr prawa jazdy;E-mail;ADR;Ważność ADR\n\
                   Jan;Kowalski;00123/19/1465;jan@firma.pl;Tak;31.12.2025\n\
                   ;Nowak;00999/20/0001;;Nie;\n\
                   Anna;Zielińska;00555/21/7777;anna-at-firma;;\n\
                   Piotr;Wiśniewski;00777/22/1234;;tak;2025-13-01\n";

        let rows = parse_rows(ImportEntity::Drivers, csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![2, 3, 4, 5]);

        match &rows[0].1 {
            Ok(ImportRow::Driver(input)) => {
                assert_eq!(input.first_name, "Jan");
                assert!(input.adr_certified);
                assert_eq!(input.adr_expiry, NaiveDate::from_ymd_opt(2025, 12, 31));
            }
            other => panic!("expected a driver row, got {other:?}"),
        }

        let store = store();
        let message = |idx: usize| match &rows[idx].1 {
            Err(e) => row_message(e, &pl(), &store),
            Ok(_) => panic!("row {} should fail", rows[idx].0),
        };
        assert_eq!(message(1), "first_name: Pole jest wymagane.");
        assert_eq!(message(2), "email: Nieprawidłowy adres e-mail.");
        assert_eq!(message(3), "adr_expiry: Nieprawidłowa wartość pola.");
    }

    #[test]
    fn windows_1250_files_from_excel_are_transcoded() {
        // "Imię" e "Zielińska" gravados em cp1250 (ę = 0xEA, ń = 0xF1)
        let csv = b"Imi\xEA;Nazwisko;Nr prawa jazdy\nAnna;Zieli\xF1ska;00555/21/7777\n";

        let rows = parse_rows(ImportEntity::Drivers, csv).unwrap();
        assert_eq!(rows.len(), 1);
        match &rows[0].1 {
            Ok(ImportRow::Driver(input)) => {
                assert_eq!(input.first_name, "Anna");
                assert_eq!(input.last_name, "Zielińska");
            }
            other => panic!("expected a driver row, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_input_is_a_client_error() {
        let err = AppError::InvalidInput("invalid_encoding");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.to_api_error(&pl(), &store()).error, "Nie udało się odczytać kodowania pliku CSV.");
        assert_eq!(
            AppError::InvalidInput("invalid_csv").to_api_error(&pl(), &store()).error,
            "Nieprawidłowy format pliku CSV."
        );
    }

    #[test]
    fn vehicles_need_a_known_type() {
        let csv = "Registration number,Brand,Model,Type,Mileage (km)\n\
                   WX12345,Volvo,FH 500,Ciągnik siodłowy,250000\n\
                   WX54321,MAN,TGX,rakieta,\n";

        let rows = parse_rows(ImportEntity::Vehicles, csv.as_bytes()).unwrap();
        match &rows[0].1 {
            Ok(ImportRow::Vehicle(input)) => {
                assert_eq!(input.vehicle_type, VehicleType::Tractor);
                assert_eq!(input.mileage_km, Some(250000));
            }
            other => panic!("expected a vehicle row, got {other:?}"),
        }
        assert!(matches!(rows[1].1, Err(RowError::Field("vehicle_type"))));
    }

    #[test]
    fn trailer_capacity_accepts_polish_decimals() {
        let csv = "Nr rejestracyjny;Typ;Ładowność (kg);Objętość (m3)\nWX9876N;Firanka;24 000,50;90\n";
        let rows = parse_rows(ImportEntity::Trailers, csv.as_bytes()).unwrap();
        match &rows[0].1 {
            Ok(ImportRow::Trailer(input)) => {
                assert_eq!(input.capacity_kg, Decimal::from_str("24000.50").ok());
                assert_eq!(input.volume_m3, Some(Decimal::from(90)));
            }
            other => panic!("expected a trailer row, got {other:?}"),
        }
    }

    #[test]
    fn contractors_default_to_client_and_check_nip() {
        let csv = "Nazwa;NIP;Kraj\nLogistyka Nord;5260001246;pl\nZły NIP sp. z o.o.;1234567890;PL\n";
        let rows = parse_rows(ImportEntity::Contractors, csv.as_bytes()).unwrap();

        match &rows[0].1 {
            Ok(ImportRow::Contractor(input)) => {
                assert_eq!(input.kind, ContractorKind::Client);
                assert_eq!(input.country.as_deref(), Some("PL"));
            }
            other => panic!("expected a contractor row, got {other:?}"),
        }
        let err = rows[1].1.as_ref().unwrap_err();
        assert_eq!(row_message(err, &pl(), &store()), "nip: Nieprawidłowy numer NIP.");
    }

    #[test]
    fn conflicts_are_reported_as_row_errors() {
        let conflict = AppError::UniqueConstraintViolation("driver_license");
        assert!(is_row_level(&conflict));
        assert!(!is_row_level(&AppError::InternalServerError(anyhow::anyhow!("db down"))));

        let message = row_message(&RowError::App(conflict), &pl(), &store());
        assert_eq!(message, "Kierowca z tym numerem prawa jazdy już istnieje.");
    }

    #[test]
    fn flags_and_dates_accept_common_spellings() {
        assert_eq!(parse_flag("TAK"), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("może"), None);
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("01.03.2024"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("03/01/2024"), None);
    }
}
