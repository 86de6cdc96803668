// src/services/invoice_service.rs

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        money::round2,
        pagination::{PageRequest, Paginated},
    },
    db::{ContractorRepository, InvoiceRepository, OrderRepository, SettingsRepository, TenantRepository},
    models::invoices::{
        Invoice, InvoiceDetail, InvoiceFromOrderInput, InvoiceHeader, InvoiceInput, InvoiceItemInput, InvoiceLine,
        InvoiceListItem, InvoiceListQuery, InvoiceStatus, InvoiceTotals,
    },
    services::numbering,
};

const DEFAULT_UNIT: &str = "usł.";
const DEFAULT_CURRENCY: &str = "PLN";

/// Stawki VAT dopuszczone na fakturze.
pub const VAT_RATES: [u32; 4] = [23, 8, 5, 0];

pub fn is_allowed_vat_rate(rate: Decimal) -> bool {
    VAT_RATES.iter().any(|r| Decimal::from(*r) == rate)
}

pub fn compute_line(item: &InvoiceItemInput) -> Result<InvoiceLine, AppError> {
    if !is_allowed_vat_rate(item.vat_rate) {
        return Err(AppError::InvalidInput("invalid_vat_rate"));
    }
    if item.quantity <= Decimal::ZERO || item.unit_price_net < Decimal::ZERO {
        return Err(AppError::InvalidInput("invalid_field"));
    }

    let net_amount = round2(item.quantity * item.unit_price_net);
    let vat_amount = round2(net_amount * item.vat_rate / Decimal::ONE_HUNDRED);

    Ok(InvoiceLine {
        description: item.description.trim().to_string(),
        quantity: item.quantity,
        unit: item
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_UNIT)
            .to_string(),
        unit_price_net: item.unit_price_net,
        vat_rate: item.vat_rate,
        net_amount,
        vat_amount,
        gross_amount: net_amount + vat_amount,
    })
}

pub fn compute_totals(lines: &[InvoiceLine]) -> InvoiceTotals {
    lines.iter().fold(InvoiceTotals::default(), |acc, line| InvoiceTotals {
        net: acc.net + line.net_amount,
        vat: acc.vat + line.vat_amount,
        gross: acc.gross + line.gross_amount,
    })
}

pub fn compute_lines(items: &[InvoiceItemInput]) -> Result<Vec<InvoiceLine>, AppError> {
    if items.is_empty() {
        return Err(AppError::InvalidInput("items_required"));
    }
    items.iter().map(compute_line).collect()
}

#[derive(Clone)]
pub struct InvoiceService {
    invoice_repo: InvoiceRepository,
    order_repo: OrderRepository,
    contractor_repo: ContractorRepository,
    settings_repo: SettingsRepository,
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl InvoiceService {
    pub fn new(
        invoice_repo: InvoiceRepository,
        order_repo: OrderRepository,
        contractor_repo: ContractorRepository,
        settings_repo: SettingsRepository,
        tenant_repo: TenantRepository,
        pool: PgPool,
    ) -> Self {
        Self { invoice_repo, order_repo, contractor_repo, settings_repo, tenant_repo, pool }
    }

    pub async fn list(&self, tenant_id: Uuid, query: &InvoiceListQuery) -> Result<Paginated<InvoiceListItem>, AppError> {
        let today = Utc::now().date_naive();
        let page = PageRequest::new(query.page, query.per_page);
        let (mut items, total) = self.invoice_repo.list(tenant_id, query, page, today).await?;
        for item in &mut items {
            item.is_overdue = item.invoice.is_overdue(today);
        }
        Ok(Paginated::new(items, total, page))
    }

    pub async fn detail(&self, tenant_id: Uuid, id: Uuid) -> Result<InvoiceDetail, AppError> {
        let row = self
            .invoice_repo
            .find_with_contractor(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("invoice"))?;
        let items = self.invoice_repo.list_items(&self.pool, tenant_id, id).await?;
        let is_overdue = row.invoice.is_overdue(Utc::now().date_naive());

        Ok(InvoiceDetail { invoice: row.invoice, contractor_name: row.contractor_name, is_overdue, items })
    }

    /// Resolve datas e moeda do cabeçalho; vencimento padrão = emissão + prazo do contratante.
    async fn resolve_header(&self, tenant_id: Uuid, input: &InvoiceInput) -> Result<InvoiceHeader, AppError> {
        let contractor = self
            .contractor_repo
            .find_by_id(&self.pool, tenant_id, input.contractor_id)
            .await?
            .ok_or(AppError::ResourceNotFound("contractor"))?;

        if let Some(order_id) = input.order_id {
            self.order_repo
                .find_by_id(&self.pool, tenant_id, order_id)
                .await?
                .ok_or(AppError::ResourceNotFound("order"))?;
        }

        let due_date = input
            .due_date
            .unwrap_or_else(|| Self::due_date_for(input.issue_date, contractor.payment_term_days));
        if due_date < input.issue_date {
            return Err(AppError::InvalidInput("invalid_date_range"));
        }

        Ok(InvoiceHeader {
            contractor_id: contractor.id,
            order_id: input.order_id,
            issue_date: input.issue_date,
            sale_date: input.sale_date.unwrap_or(input.issue_date),
            due_date,
            currency: input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY).to_uppercase(),
            notes: input.notes.clone(),
        })
    }

    pub async fn create(&self, tenant_id: Uuid, input: &InvoiceInput) -> Result<InvoiceDetail, AppError> {
        let lines = compute_lines(&input.items)?;
        let header = self.resolve_header(tenant_id, input).await?;
        let id = self.insert(tenant_id, &header, &lines).await?;
        self.detail(tenant_id, id).await
    }

    async fn insert(&self, tenant_id: Uuid, header: &InvoiceHeader, lines: &[InvoiceLine]) -> Result<Uuid, AppError> {
        let totals = compute_totals(lines);
        let mut tx = self.pool.begin().await?;

        let settings = self.settings_repo.get_settings(&mut *tx, tenant_id).await?;
        let number = numbering::next_invoice_number(
            &self.tenant_repo,
            &mut *tx,
            tenant_id,
            &settings.invoice_prefix,
            header.issue_date,
        )
        .await?;

        let invoice = self.invoice_repo.create(&mut *tx, tenant_id, &number, header, totals).await?;
        self.invoice_repo.insert_items(&mut *tx, tenant_id, invoice.id, lines).await?;

        tx.commit().await?;

        tracing::info!("🧾 Fatura {} criada ({} brutto)", invoice.invoice_number, invoice.total_gross);
        Ok(invoice.id)
    }

    /// Uma linha com o frete do pedido; só para pedidos entregues ou concluídos.
    pub async fn create_from_order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        input: &InvoiceFromOrderInput,
    ) -> Result<InvoiceDetail, AppError> {
        let order = self
            .order_repo
            .find_by_id(&self.pool, tenant_id, order_id)
            .await?
            .ok_or(AppError::ResourceNotFound("order"))?;
        if !order.status.is_invoiceable() {
            return Err(AppError::StateConflict("order_not_invoiceable"));
        }

        let item = InvoiceItemInput {
            description: format!(
                "Usługa transportowa {}: {} - {}",
                order.order_number, order.loading_address, order.unloading_address
            ),
            quantity: Decimal::ONE,
            unit: Some(DEFAULT_UNIT.to_string()),
            unit_price_net: order.price_net,
            vat_rate: input.vat_rate.unwrap_or_else(|| Decimal::from(VAT_RATES[0])),
        };

        let invoice_input = InvoiceInput {
            contractor_id: order.contractor_id,
            order_id: Some(order.id),
            issue_date: input.issue_date.unwrap_or_else(|| Utc::now().date_naive()),
            sale_date: Some(order.unloading_date.date_naive()),
            due_date: None,
            currency: Some(order.currency.clone()),
            notes: None,
            items: vec![item],
        };

        self.create(tenant_id, &invoice_input).await
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, input: &InvoiceInput) -> Result<InvoiceDetail, AppError> {
        let lines = compute_lines(&input.items)?;
        let header = self.resolve_header(tenant_id, input).await?;
        let totals = compute_totals(&lines);

        let mut tx = self.pool.begin().await?;
        let current = self
            .invoice_repo
            .lock_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("invoice"))?;
        if current.status != InvoiceStatus::Draft {
            return Err(AppError::StateConflict("invoice_locked"));
        }

        self.invoice_repo.update(&mut *tx, tenant_id, id, &header, totals).await?;
        self.invoice_repo.delete_items(&mut *tx, tenant_id, id).await?;
        self.invoice_repo.insert_items(&mut *tx, tenant_id, id, &lines).await?;
        tx.commit().await?;

        self.detail(tenant_id, id).await
    }

    pub async fn change_status(&self, tenant_id: Uuid, id: Uuid, status: InvoiceStatus) -> Result<Invoice, AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .invoice_repo
            .lock_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("invoice"))?;

        if !current.status.can_transition_to(status) {
            return Err(AppError::InvalidStatusTransition { from: current.status.label(), to: status.label() });
        }

        let invoice = self.invoice_repo.set_status(&mut *tx, tenant_id, id, status).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let current = self
            .invoice_repo
            .lock_by_id(&mut *tx, tenant_id, id)
            .await?
            .ok_or(AppError::ResourceNotFound("invoice"))?;
        if current.status != InvoiceStatus::Draft {
            return Err(AppError::StateConflict("invoice_locked"));
        }

        self.invoice_repo.delete(&mut *tx, tenant_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    pub fn due_date_for(issue_date: NaiveDate, payment_term_days: i32) -> NaiveDate {
        issue_date + Duration::days(i64::from(payment_term_days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(qty: &str, price: &str, rate: &str) -> InvoiceItemInput {
        InvoiceItemInput {
            description: " Fracht ".into(),
            quantity: d(qty),
            unit: None,
            unit_price_net: d(price),
            vat_rate: d(rate),
        }
    }

    #[test]
    fn line_amounts_are_rounded_per_line() {
        let line = compute_line(&item("3", "33.333", "23")).unwrap();
        assert_eq!(line.net_amount, d("100.00"));
        assert_eq!(line.vat_amount, d("23.00"));
        assert_eq!(line.gross_amount, d("123.00"));
        assert_eq!(line.unit, "usł.");
        assert_eq!(line.description, "Fracht");
    }

    #[test]
    fn half_cent_vat_rounds_away_from_zero() {
        // 10.50 * 5% = 0.525
        let line = compute_line(&item("1", "10.50", "5")).unwrap();
        assert_eq!(line.vat_amount, d("0.53"));
    }

    #[test]
    fn totals_sum_the_lines() {
        let lines = compute_lines(&[item("1", "4200", "23"), item("2", "150", "8"), item("1", "99.99", "0")]).unwrap();
        let totals = compute_totals(&lines);
        assert_eq!(totals.net, d("4599.99"));
        assert_eq!(totals.vat, d("990.00"));
        assert_eq!(totals.gross, d("5589.99"));
    }

    #[test]
    fn unsupported_vat_rate_is_rejected() {
        assert!(matches!(
            compute_line(&item("1", "100", "7")),
            Err(AppError::InvalidInput("invalid_vat_rate"))
        ));
    }

    #[test]
    fn invoice_needs_at_least_one_item() {
        assert!(matches!(compute_lines(&[]), Err(AppError::InvalidInput("items_required"))));
    }

    #[test]
    fn due_date_adds_payment_term() {
        let issue = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        assert_eq!(
            InvoiceService::due_date_for(issue, 14),
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()
        );
    }
}
