// src/services/document_service.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        money::format_pl,
        pagination::{PageRequest, Paginated},
    },
    config::Config,
    db::{
        document_repo::NewDocument, ContractorRepository, DocumentRepository, DriverRepository, FleetRepository,
        InvoiceRepository, OrderRepository, SettingsRepository,
    },
    models::{
        contractors::Contractor,
        documents::{Document, DocumentListQuery, DocumentType, DocumentUpload},
        invoices::{Invoice, InvoiceItem},
        orders::{Order, ResourceKind},
        settings::TenantSettings,
    },
};

const ALLOWED_EXTENSIONS: [&str; 10] = ["pdf", "jpg", "jpeg", "png", "doc", "docx", "xls", "xlsx", "csv", "txt"];
const MAX_FILE_NAME: usize = 120;
const FONT_FAMILY: &str = "Roboto";

// =========================================================================
//  ARQUIVOS
// =========================================================================

/// Só o último segmento do nome, com caracteres fora de [A-Za-z0-9._-] trocados por '_'.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "plik".to_string();
    }
    if cleaned.len() <= MAX_FILE_NAME {
        return cleaned.to_string();
    }
    // Corta pelo início preservando a extensão
    let cut = cleaned.len() - MAX_FILE_NAME;
    cleaned[cut..].to_string()
}

pub fn file_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "csv" => "text/csv",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Valida nome, extensão e tamanho. Devolve (nome limpo, extensão).
pub fn check_upload(file_name: &str, size: usize, max_bytes: usize) -> Result<(String, String), AppError> {
    if size == 0 {
        return Err(AppError::InvalidInput("file_required"));
    }
    if size > max_bytes {
        return Err(AppError::InvalidInput("file_too_large"));
    }
    let name = sanitize_file_name(file_name);
    let ext = file_extension(&name)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or(AppError::InvalidInput("file_type_not_allowed"))?;
    Ok((name, ext))
}

// =========================================================================
//  CONTEÚDO DOS PDFs
// =========================================================================

pub fn contractor_address(contractor: &Contractor) -> String {
    let city_line = [contractor.postal_code.as_deref(), contractor.city.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    [contractor.address.clone(), Some(city_line), Some(contractor.country.clone())]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn company_block(settings: &TenantSettings) -> String {
    let mut parts = vec![settings.company_name.clone().unwrap_or_else(|| "-".to_string())];
    if let Some(address) = &settings.address {
        parts.push(address.clone());
    }
    if let Some(nip) = &settings.nip {
        parts.push(format!("NIP: {nip}"));
    }
    parts.join(", ")
}

/// Dados reunidos para o list przewozowy CMR.
pub struct CmrData {
    pub order: Order,
    pub settings: TenantSettings,
    pub consignee: Contractor,
    pub drivers: Vec<String>,
    pub vehicles: Vec<String>,
    pub trailers: Vec<String>,
}

/// Campos do CMR (número do campo, rótulo, valor) na ordem de impressão.
pub fn cmr_fields(data: &CmrData) -> Vec<(&'static str, String)> {
    let order = &data.order;
    let consignee = match &data.consignee.nip {
        Some(nip) => format!("{}, {}, NIP: {}", data.consignee.name, contractor_address(&data.consignee), nip),
        None => format!("{}, {}", data.consignee.name, contractor_address(&data.consignee)),
    };
    let weight = order
        .cargo_weight_kg
        .map(|w| format!("{} kg", format_pl(w)))
        .unwrap_or_else(|| "-".to_string());
    let goods = if order.is_adr {
        format!("{} [ADR - towar niebezpieczny]", order.cargo_description)
    } else {
        order.cargo_description.clone()
    };
    let join_or_dash = |values: &[String]| if values.is_empty() { "-".to_string() } else { values.join(", ") };

    vec![
        ("1. Nadawca", company_block(&data.settings)),
        ("2. Odbiorca", consignee),
        (
            "3. Miejsce przeznaczenia",
            format!("{} ({})", order.unloading_address, order.unloading_date.format("%d.%m.%Y")),
        ),
        (
            "4. Miejsce i data załadowania",
            format!("{} ({})", order.loading_address, order.loading_date.format("%d.%m.%Y")),
        ),
        ("6-9. Rodzaj towaru", goods),
        ("11. Waga brutto", weight),
        ("16. Przewoźnik", company_block(&data.settings)),
        ("Pojazd", join_or_dash(&data.vehicles)),
        ("Naczepa", join_or_dash(&data.trailers)),
        ("Kierowca", join_or_dash(&data.drivers)),
    ]
}

/// Texto do QR da fatura: número, valor bruto e conta para transferência.
pub fn invoice_payment_qr(invoice: &Invoice, settings: &TenantSettings) -> String {
    let mut parts = vec![
        invoice.invoice_number.clone(),
        format!("{} {}", format_pl(invoice.total_gross), invoice.currency),
    ];
    if let Some(account) = &settings.bank_account {
        parts.push(account.replace(' ', ""));
    }
    parts.join("|")
}

fn qr_image(payload: &str) -> Result<elements::Image, AppError> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

    let image_buffer = code.render::<Luma<u8>>().build();
    let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

    Ok(elements::Image::from_dynamic_image(dynamic_image)?.with_scale(genpdf::Scale::new(0.4, 0.4)))
}

fn new_pdf(fonts_dir: &Path, title: &str) -> Result<genpdf::Document, AppError> {
    let font_family = genpdf::fonts::from_files(fonts_dir, FONT_FAMILY, None)?;
    let mut doc = genpdf::Document::new(font_family);
    doc.set_title(title);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(10);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

fn render(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
    let mut buffer = Vec::new();
    doc.render(&mut buffer)?;
    Ok(buffer)
}

// =========================================================================
//  SERVIÇO
// =========================================================================

#[derive(Clone)]
pub struct DocumentService {
    document_repo: DocumentRepository,
    order_repo: OrderRepository,
    invoice_repo: InvoiceRepository,
    contractor_repo: ContractorRepository,
    driver_repo: DriverRepository,
    fleet_repo: FleetRepository,
    settings_repo: SettingsRepository,
    config: Arc<Config>,
    pool: PgPool,
}

impl DocumentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        document_repo: DocumentRepository,
        order_repo: OrderRepository,
        invoice_repo: InvoiceRepository,
        contractor_repo: ContractorRepository,
        driver_repo: DriverRepository,
        fleet_repo: FleetRepository,
        settings_repo: SettingsRepository,
        config: Arc<Config>,
        pool: PgPool,
    ) -> Self {
        Self {
            document_repo,
            order_repo,
            invoice_repo,
            contractor_repo,
            driver_repo,
            fleet_repo,
            settings_repo,
            config,
            pool,
        }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &DocumentListQuery) -> Result<Paginated<Document>, AppError> {
        let page = PageRequest::new(query.page, query.per_page);
        let today = Utc::now().date_naive();
        let (items, total) = self.document_repo.list(tenant_id, query, page, today).await?;
        Ok(Paginated::new(items, total, page))
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Document, AppError> {
        self.document_repo
            .find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("document"))
    }

    pub async fn upload(&self, tenant_id: Uuid, user_id: Uuid, upload: DocumentUpload) -> Result<Document, AppError> {
        let data = upload.data.as_deref().ok_or(AppError::InvalidInput("file_required"))?;
        let original_name = upload.file_name.as_deref().ok_or(AppError::InvalidInput("file_required"))?;
        let (file_name, ext) = check_upload(original_name, data.len(), self.config.max_upload_bytes())?;

        self.check_links(tenant_id, &upload).await?;

        let id = Uuid::new_v4();
        let dir = self.config.upload_dir.join(tenant_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        let path: PathBuf = dir.join(format!("{id}-{file_name}"));
        tokio::fs::write(&path, data).await?;

        let storage_path = path.to_string_lossy().to_string();
        let title = upload
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&file_name)
            .to_string();

        let created = self
            .document_repo
            .create(
                &self.pool,
                tenant_id,
                NewDocument {
                    id,
                    document_type: upload.document_type.unwrap_or(DocumentType::Other),
                    title: &title,
                    file_name: &file_name,
                    mime_type: mime_for_extension(&ext),
                    size_bytes: data.len() as i64,
                    storage_path: &storage_path,
                    order_id: upload.order_id,
                    driver_id: upload.driver_id,
                    vehicle_id: upload.vehicle_id,
                    trailer_id: upload.trailer_id,
                    expiry_date: upload.expiry_date,
                    uploaded_by: user_id,
                },
            )
            .await;

        match created {
            Ok(document) => {
                tracing::info!("📎 Documento {} enviado ({} bytes)", document.id, document.size_bytes);
                Ok(document)
            }
            Err(e) => {
                // Não deixa arquivo órfão no disco
                if let Err(io) = tokio::fs::remove_file(&path).await {
                    tracing::warn!("Falha ao remover arquivo órfão {}: {}", path.display(), io);
                }
                Err(e)
            }
        }
    }

    /// Foto ou skan CMR enviado pelo motorista para um pedido seu.
    pub async fn upload_for_driver(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        driver_id: Uuid,
        order_id: Uuid,
        mut upload: DocumentUpload,
    ) -> Result<Document, AppError> {
        if !self
            .order_repo
            .is_assigned_to_driver(&self.pool, tenant_id, order_id, driver_id)
            .await?
        {
            return Err(AppError::ResourceNotFound("order"));
        }

        let document_type = upload.document_type.unwrap_or(DocumentType::Photo);
        if !matches!(document_type, DocumentType::Photo | DocumentType::Cmr) {
            return Err(AppError::InvalidInput("invalid_field"));
        }

        upload.document_type = Some(document_type);
        upload.order_id = Some(order_id);
        upload.driver_id = Some(driver_id);
        upload.vehicle_id = None;
        upload.trailer_id = None;
        self.upload(tenant_id, user_id, upload).await
    }

    async fn check_links(&self, tenant_id: Uuid, upload: &DocumentUpload) -> Result<(), AppError> {
        if let Some(id) = upload.order_id {
            self.order_repo
                .find_by_id(&self.pool, tenant_id, id)
                .await?
                .ok_or(AppError::ResourceNotFound("order"))?;
        }
        if let Some(id) = upload.driver_id {
            self.driver_repo
                .find_by_id(&self.pool, tenant_id, id)
                .await?
                .ok_or(AppError::ResourceNotFound("driver"))?;
        }
        if let Some(id) = upload.vehicle_id {
            self.fleet_repo
                .find_vehicle(&self.pool, tenant_id, id)
                .await?
                .ok_or(AppError::ResourceNotFound("vehicle"))?;
        }
        if let Some(id) = upload.trailer_id {
            self.fleet_repo
                .find_trailer(&self.pool, tenant_id, id)
                .await?
                .ok_or(AppError::ResourceNotFound("trailer"))?;
        }
        Ok(())
    }

    pub async fn download(&self, tenant_id: Uuid, id: Uuid) -> Result<(Document, Vec<u8>), AppError> {
        let document = self.get(tenant_id, id).await?;
        let bytes = match tokio::fs::read(&document.storage_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Arquivo do documento {} ausente em disco", document.id);
                return Err(AppError::ResourceNotFound("document"));
            }
            Err(e) => return Err(e.into()),
        };
        Ok((document, bytes))
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let document = self
            .document_repo
            .delete(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("document"))?;

        if let Err(e) = tokio::fs::remove_file(&document.storage_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Falha ao remover {}: {}", document.storage_path, e);
            }
        }
        Ok(())
    }

    // =========================================================================
    //  PDF: CMR
    // =========================================================================

    pub async fn generate_cmr_pdf(&self, tenant_id: Uuid, order_id: Uuid) -> Result<(String, Vec<u8>), AppError> {
        let order = self
            .order_repo
            .find_by_id(&self.pool, tenant_id, order_id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))?;
        let consignee = self
            .contractor_repo
            .find_by_id(&self.pool, tenant_id, order.contractor_id)
            .await?
            .ok_or(AppError::ResourceNotFound("contractor"))?;
        let settings = self.settings_repo.get_settings(&self.pool, tenant_id).await?;
        let assignments = self.order_repo.list_assignments(&self.pool, tenant_id, order_id, true).await?;

        let labels = |kind: ResourceKind| -> Vec<String> {
            assignments
                .iter()
                .filter(|a| a.resource_kind == kind)
                .filter_map(|a| a.resource_label.clone())
                .collect()
        };
        let data = CmrData {
            drivers: labels(ResourceKind::Driver),
            vehicles: labels(ResourceKind::Vehicle),
            trailers: labels(ResourceKind::Trailer),
            order,
            settings,
            consignee,
        };

        let file_name = format!("CMR_{}.pdf", data.order.order_number.replace('/', "_"));
        let bytes = self.render_cmr(&data)?;
        Ok((file_name, bytes))
    }

    fn render_cmr(&self, data: &CmrData) -> Result<Vec<u8>, AppError> {
        let mut doc = new_pdf(&self.config.fonts_dir, &format!("CMR {}", data.order.order_number))?;

        doc.push(
            elements::Paragraph::new("MIĘDZYNARODOWY SAMOCHODOWY LIST PRZEWOZOWY CMR")
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(
            elements::Paragraph::new(format!("Zlecenie: {}", data.order.order_number))
                .styled(style::Style::new().with_font_size(11)),
        );
        doc.push(elements::Break::new(1.5));

        let mut table = elements::TableLayout::new(vec![2, 5]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        let bold = style::Style::new().bold();
        for (label, value) in cmr_fields(data) {
            table
                .row()
                .element(elements::Paragraph::new(label).styled(bold).padded(1))
                .element(elements::Paragraph::new(value).padded(1))
                .push()?;
        }
        doc.push(table);
        doc.push(elements::Break::new(2));

        let mut signatures = elements::TableLayout::new(vec![1, 1, 1]);
        signatures.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        signatures
            .row()
            .element(elements::Paragraph::new("22. Podpis nadawcy").padded(4))
            .element(elements::Paragraph::new("23. Podpis przewoźnika").padded(4))
            .element(elements::Paragraph::new("24. Przesyłkę otrzymano").padded(4))
            .push()?;
        doc.push(signatures);
        doc.push(elements::Break::new(1.5));

        doc.push(qr_image(&data.order.order_number)?);

        render(doc)
    }

    // =========================================================================
    //  PDF: FAKTURA
    // =========================================================================

    pub async fn generate_invoice_pdf(&self, tenant_id: Uuid, invoice_id: Uuid) -> Result<(String, Vec<u8>), AppError> {
        let invoice = self
            .invoice_repo
            .find_with_contractor(&self.pool, tenant_id, invoice_id)
            .await?
            .ok_or(AppError::ResourceNotFound("invoice"))?
            .invoice;
        let items = self.invoice_repo.list_items(&self.pool, tenant_id, invoice_id).await?;
        let buyer = self
            .contractor_repo
            .find_by_id(&self.pool, tenant_id, invoice.contractor_id)
            .await?
            .ok_or(AppError::ResourceNotFound("contractor"))?;
        let settings = self.settings_repo.get_settings(&self.pool, tenant_id).await?;

        let file_name = format!("Faktura_{}.pdf", invoice.invoice_number.replace('/', "_"));
        let bytes = self.render_invoice(&invoice, &items, &buyer, &settings)?;
        Ok((file_name, bytes))
    }

    fn render_invoice(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
        buyer: &Contractor,
        settings: &TenantSettings,
    ) -> Result<Vec<u8>, AppError> {
        let mut doc = new_pdf(&self.config.fonts_dir, &format!("Faktura {}", invoice.invoice_number))?;
        let bold = style::Style::new().bold();
        let small = style::Style::new().with_font_size(9);

        doc.push(
            elements::Paragraph::new(format!("FAKTURA VAT {}", invoice.invoice_number))
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        doc.push(
            elements::Paragraph::new(format!(
                "Data wystawienia: {}   Data sprzedaży: {}",
                invoice.issue_date.format("%d.%m.%Y"),
                invoice.sale_date.format("%d.%m.%Y")
            ))
            .styled(small),
        );
        doc.push(elements::Break::new(1.5));

        let mut parties = elements::TableLayout::new(vec![1, 1]);
        parties
            .row()
            .element(elements::Paragraph::new("Sprzedawca").styled(bold))
            .element(elements::Paragraph::new("Nabywca").styled(bold))
            .push()?;
        let buyer_block = match &buyer.nip {
            Some(nip) => format!("{}, {}, NIP: {}", buyer.name, contractor_address(buyer), nip),
            None => format!("{}, {}", buyer.name, contractor_address(buyer)),
        };
        parties
            .row()
            .element(elements::Paragraph::new(company_block(settings)))
            .element(elements::Paragraph::new(buyer_block))
            .push()?;
        doc.push(parties);
        doc.push(elements::Break::new(1.5));

        let mut table = elements::TableLayout::new(vec![1, 6, 2, 1, 2, 1, 2, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        let mut header = table.row();
        for title in ["Lp.", "Nazwa", "Ilość", "J.m.", "Cena netto", "VAT %", "Netto", "VAT", "Brutto"] {
            header.push_element(elements::Paragraph::new(title).styled(bold));
        }
        header.push()?;

        for item in items {
            table
                .row()
                .element(elements::Paragraph::new(item.position.to_string()))
                .element(elements::Paragraph::new(item.description.clone()))
                .element(elements::Paragraph::new(item.quantity.normalize().to_string().replace('.', ",")))
                .element(elements::Paragraph::new(item.unit.clone()))
                .element(elements::Paragraph::new(format_pl(item.unit_price_net)))
                .element(elements::Paragraph::new(item.vat_rate.normalize().to_string()))
                .element(elements::Paragraph::new(format_pl(item.net_amount)))
                .element(elements::Paragraph::new(format_pl(item.vat_amount)))
                .element(elements::Paragraph::new(format_pl(item.gross_amount)))
                .push()?;
        }
        doc.push(table);
        doc.push(elements::Break::new(1.5));

        for (label, value) in [
            ("Razem netto", invoice.total_net),
            ("Razem VAT", invoice.total_vat),
            ("Do zapłaty", invoice.total_gross),
        ] {
            let mut line = elements::Paragraph::new(format!("{label}: {} {}", format_pl(value), invoice.currency));
            line.set_alignment(genpdf::Alignment::Right);
            doc.push(line.styled(bold));
        }
        doc.push(elements::Break::new(1.5));

        doc.push(elements::Paragraph::new(format!(
            "Termin płatności: {}",
            invoice.due_date.format("%d.%m.%Y")
        )));
        if let Some(account) = &settings.bank_account {
            let bank = settings.bank_name.as_deref().unwrap_or_default();
            doc.push(elements::Paragraph::new(format!("Konto: {bank} {account}")));
        }
        if let Some(notes) = &invoice.notes {
            doc.push(elements::Paragraph::new(notes.clone()).styled(small));
        }
        doc.push(elements::Break::new(1.5));
        doc.push(qr_image(&invoice_payment_qr(invoice, settings))?);

        render(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::models::{contractors::ContractorKind, invoices::InvoiceStatus, orders::OrderStatus};

    #[test]
    fn file_names_lose_paths_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\jan\\skan CMR ż.pdf"), "skan_CMR__.pdf");
        assert_eq!(sanitize_file_name(".hidden.txt"), "hidden.txt");
        assert_eq!(sanitize_file_name("///"), "plik");
    }

    #[test]
    fn long_names_keep_their_extension() {
        let long = format!("{}.pdf", "a".repeat(300));
        let cleaned = sanitize_file_name(&long);
        assert_eq!(cleaned.len(), MAX_FILE_NAME);
        assert!(cleaned.ends_with(".pdf"));
    }

    #[test]
    fn upload_checks_extension_and_size() {
        assert_eq!(
            check_upload("Polisa.PDF", 10, 100).unwrap(),
            ("Polisa.PDF".to_string(), "pdf".to_string())
        );
        assert!(matches!(check_upload("run.exe", 10, 100), Err(AppError::InvalidInput("file_type_not_allowed"))));
        assert!(matches!(check_upload("noext", 10, 100), Err(AppError::InvalidInput("file_type_not_allowed"))));
        assert!(matches!(check_upload("a.pdf", 101, 100), Err(AppError::InvalidInput("file_too_large"))));
        assert!(matches!(check_upload("a.pdf", 0, 100), Err(AppError::InvalidInput("file_required"))));
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension("csv"), "text/csv");
    }

    fn contractor() -> Contractor {
        Contractor {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            name: "Logistyka Nord S.A.".into(),
            kind: ContractorKind::Client,
            nip: Some("5260001246".into()),
            address: Some("ul. Portowa 3".into()),
            city: Some("Gdańsk".into()),
            postal_code: Some("80-001".into()),
            country: "PL".into(),
            email: None,
            phone: None,
            payment_term_days: 30,
            notes: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(is_adr: bool) -> Order {
        Order {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            order_number: "ZL/0042/2024".into(),
            contractor_id: Uuid::new_v4(),
            status: OrderStatus::Confirmed,
            loading_address: "Poznań".into(),
            loading_date: Utc.with_ymd_and_hms(2024, 5, 6, 8, 0, 0).unwrap(),
            unloading_address: "Berlin".into(),
            unloading_date: Utc.with_ymd_and_hms(2024, 5, 7, 14, 0, 0).unwrap(),
            cargo_description: "33 palety".into(),
            cargo_weight_kg: Some(Decimal::from(18500)),
            is_adr,
            price_net: Decimal::from(4200),
            currency: "PLN".into(),
            notes: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn address_skips_missing_parts() {
        let mut c = contractor();
        assert_eq!(contractor_address(&c), "ul. Portowa 3, 80-001 Gdańsk, PL");
        c.address = None;
        c.postal_code = None;
        assert_eq!(contractor_address(&c), "Gdańsk, PL");
    }

    #[test]
    fn cmr_lists_crew_weight_and_adr_marker() {
        let data = CmrData {
            order: order(true),
            settings: TenantSettings::defaults(Uuid::nil()),
            consignee: contractor(),
            drivers: vec!["Piotr Nowak".into()],
            vehicles: vec!["WX12345".into()],
            trailers: vec![],
        };
        let fields = cmr_fields(&data);
        let value = |label: &str| fields.iter().find(|(l, _)| *l == label).map(|(_, v)| v.clone()).unwrap();

        assert!(value("6-9. Rodzaj towaru").contains("ADR"));
        assert_eq!(value("11. Waga brutto"), "18500,00 kg");
        assert_eq!(value("Pojazd"), "WX12345");
        assert_eq!(value("Naczepa"), "-");
        assert_eq!(value("4. Miejsce i data załadowania"), "Poznań (06.05.2024)");
        assert!(value("2. Odbiorca").contains("NIP: 5260001246"));
    }

    #[test]
    fn invoice_qr_carries_amount_and_account() {
        let mut settings = TenantSettings::defaults(Uuid::nil());
        settings.bank_account = Some("PL61 1090 1014".into());
        let invoice = Invoice {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            invoice_number: "FV/007/05/2024".into(),
            contractor_id: Uuid::new_v4(),
            order_id: None,
            status: InvoiceStatus::Issued,
            issue_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            sale_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 5, 24).unwrap(),
            currency: "PLN".into(),
            total_net: Decimal::from_str("4200").unwrap(),
            total_vat: Decimal::from_str("966").unwrap(),
            total_gross: Decimal::from_str("5166").unwrap(),
            paid_at: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(invoice_payment_qr(&invoice, &settings), "FV/007/05/2024|5166,00 PLN|PL6110901014");
    }
}
