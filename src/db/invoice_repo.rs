// src/db/invoice_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::{map_unique_violation, AppError}, pagination::PageRequest},
    db::Counted,
    models::invoices::{
        Invoice, InvoiceHeader, InvoiceItem, InvoiceLine, InvoiceListItem, InvoiceListQuery,
        InvoiceStatus, InvoiceTotals,
    },
};

const INVOICE_COLUMNS: &str = r#"
    i.id, i.tenant_id, i.invoice_number, i.contractor_id, i.order_id, i.status, i.issue_date,
    i.sale_date, i.due_date, i.currency, i.total_net, i.total_vat, i.total_gross, i.paid_at,
    i.notes, i.created_at, i.updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, tenant_id, invoice_id, position, description, quantity, unit, unit_price_net,
    vat_rate, net_amount, vat_amount, gross_amount
"#;

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_issue_range(qb: &mut QueryBuilder<'_, Postgres>, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        if let Some(from) = from {
            qb.push(" AND i.issue_date >= ").push_bind(from);
        }
        if let Some(to) = to {
            qb.push(" AND i.issue_date <= ").push_bind(to);
        }
    }

    pub async fn list(
        &self,
        tenant_id: Uuid,
        filter: &InvoiceListQuery,
        page: PageRequest,
        today: NaiveDate,
    ) -> Result<(Vec<InvoiceListItem>, i64), AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT {INVOICE_COLUMNS}, c.name AS contractor_name, COUNT(*) OVER() AS total_count
            FROM invoices i
            JOIN contractors c ON c.id = i.contractor_id
            WHERE "#
        ));
        Self::push_filters(&mut qb, tenant_id, filter, today);

        qb.push(" ORDER BY i.issue_date DESC, i.invoice_number DESC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = qb.build_query_as::<Counted<InvoiceListItem>>().fetch_all(&self.pool).await?;
        Counted::split_or_recount(rows, page, &self.pool, || {
            let mut count = QueryBuilder::<Postgres>::new(
                "SELECT COUNT(*) FROM invoices i JOIN contractors c ON c.id = i.contractor_id WHERE ",
            );
            Self::push_filters(&mut count, tenant_id, filter, today);
            count
        })
        .await
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        tenant_id: Uuid,
        filter: &InvoiceListQuery,
        today: NaiveDate,
    ) {
        qb.push("i.tenant_id = ").push_bind(tenant_id);

        if let Some(status) = filter.status {
            qb.push(" AND i.status = ").push_bind(status);
        }
        if let Some(contractor_id) = filter.contractor_id {
            qb.push(" AND i.contractor_id = ").push_bind(contractor_id);
        }
        Self::push_issue_range(qb, filter.date_from, filter.date_to);
        match filter.overdue {
            Some(true) => {
                qb.push(" AND i.status = 'ISSUED' AND i.due_date < ").push_bind(today);
            }
            Some(false) => {
                qb.push(" AND NOT (i.status = 'ISSUED' AND i.due_date < ").push_bind(today).push(")");
            }
            None => {}
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            qb.push(" AND (i.invoice_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    pub async fn list_for_export(
        &self,
        tenant_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<InvoiceListItem>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT {INVOICE_COLUMNS}, c.name AS contractor_name
            FROM invoices i
            JOIN contractors c ON c.id = i.contractor_id
            WHERE i.tenant_id = "#
        ));
        qb.push_bind(tenant_id);
        Self::push_issue_range(&mut qb, from, to);
        qb.push(" ORDER BY i.issue_date, i.invoice_number");

        let rows = qb.build_query_as::<InvoiceListItem>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn find_with_contractor<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<InvoiceListItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, InvoiceListItem>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}, c.name AS contractor_name
            FROM invoices i
            JOIN contractors c ON c.id = i.contractor_id
            WHERE i.tenant_id = $1 AND i.id = $2
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn lock_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.tenant_id = $1 AND i.id = $2 FOR UPDATE"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(invoice)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_number: &str,
        header: &InvoiceHeader,
        totals: InvoiceTotals,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Invoice>(&format!(
            r#"
            WITH i AS (
                INSERT INTO invoices (
                    tenant_id, invoice_number, contractor_id, order_id, status, issue_date,
                    sale_date, due_date, currency, total_net, total_vat, total_gross, notes
                )
                VALUES ($1, $2, $3, $4, 'DRAFT', $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING *
            )
            SELECT {INVOICE_COLUMNS} FROM i
            "#
        ))
        .bind(tenant_id)
        .bind(invoice_number)
        .bind(header.contractor_id)
        .bind(header.order_id)
        .bind(header.issue_date)
        .bind(header.sale_date)
        .bind(header.due_date)
        .bind(&header.currency)
        .bind(totals.net)
        .bind(totals.vat)
        .bind(totals.gross)
        .bind(&header.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |constraint| match constraint {
                "invoices_tenant_number_key" => Some(AppError::UniqueConstraintViolation("invoice_number")),
                _ => None,
            })
        })
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        header: &InvoiceHeader,
        totals: InvoiceTotals,
    ) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            WITH i AS (
                UPDATE invoices SET
                    contractor_id = $3, order_id = $4, issue_date = $5, sale_date = $6,
                    due_date = $7, currency = $8, total_net = $9, total_vat = $10,
                    total_gross = $11, notes = $12, updated_at = NOW()
                WHERE tenant_id = $1 AND id = $2
                RETURNING *
            )
            SELECT {INVOICE_COLUMNS} FROM i
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(header.contractor_id)
        .bind(header.order_id)
        .bind(header.issue_date)
        .bind(header.sale_date)
        .bind(header.due_date)
        .bind(&header.currency)
        .bind(totals.net)
        .bind(totals.vat)
        .bind(totals.gross)
        .bind(&header.notes)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    pub async fn set_status<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid, status: InvoiceStatus) -> Result<Invoice, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            WITH i AS (
                UPDATE invoices SET
                    status = $3,
                    paid_at = CASE WHEN $3 = 'PAID'::invoice_status THEN NOW() ELSE paid_at END,
                    updated_at = NOW()
                WHERE tenant_id = $1 AND id = $2
                RETURNING *
            )
            SELECT {INVOICE_COLUMNS} FROM i
            "#
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(invoice)
    }

    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM invoices WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  POZYCJE
    // =========================================================================

    pub async fn insert_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        invoice_id: Uuid,
        lines: &[InvoiceLine],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if lines.is_empty() {
            return Ok(());
        }
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO invoice_items (tenant_id, invoice_id, position, description, quantity, unit, \
             unit_price_net, vat_rate, net_amount, vat_amount, gross_amount) ",
        );
        qb.push_values(lines.iter().enumerate(), |mut row, (idx, line)| {
            row.push_bind(tenant_id)
                .push_bind(invoice_id)
                .push_bind(idx as i32 + 1)
                .push_bind(line.description.clone())
                .push_bind(line.quantity)
                .push_bind(line.unit.clone())
                .push_bind(line.unit_price_net)
                .push_bind(line.vat_rate)
                .push_bind(line.net_amount)
                .push_bind(line.vat_amount)
                .push_bind(line.gross_amount);
        });
        qb.build().execute(executor).await?;
        Ok(())
    }

    pub async fn delete_items<'e, E>(&self, executor: E, tenant_id: Uuid, invoice_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM invoice_items WHERE tenant_id = $1 AND invoice_id = $2")
            .bind(tenant_id)
            .bind(invoice_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list_items<'e, E>(&self, executor: E, tenant_id: Uuid, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE tenant_id = $1 AND invoice_id = $2 ORDER BY position"
        ))
        .bind(tenant_id)
        .bind(invoice_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }
}
