// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::dashboard::{AlertKind, AlertSource, DashboardSummary, ExpiryCandidate, MonthlyChartEntry},
};

#[derive(sqlx::FromRow)]
struct ExpiryRow {
    source: String,
    kind: String,
    entity_id: Uuid,
    entity_label: String,
    expiry_date: NaiveDate,
}

impl ExpiryRow {
    fn into_candidate(self) -> Option<ExpiryCandidate> {
        let source = match self.source.as_str() {
            "DRIVER" => AlertSource::Driver,
            "VEHICLE" => AlertSource::Vehicle,
            "TRAILER" => AlertSource::Trailer,
            "DOCUMENT" => AlertSource::Document,
            _ => return None,
        };
        let kind = match self.kind.as_str() {
            "DRIVER_LICENSE" => AlertKind::DriverLicense,
            "ADR" => AlertKind::Adr,
            "MEDICAL_EXAM" => AlertKind::MedicalExam,
            "INSURANCE" => AlertKind::Insurance,
            "INSPECTION" => AlertKind::Inspection,
            "DOCUMENT_EXPIRY" => AlertKind::DocumentExpiry,
            _ => return None,
        };
        Some(ExpiryCandidate {
            source,
            kind,
            entity_id: self.entity_id,
            entity_label: self.entity_label,
            expiry_date: self.expiry_date,
        })
    }
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Resumo geral. `month_start..next_month` é o mês corrente.
    pub async fn get_summary(
        &self,
        tenant_id: Uuid,
        today: NaiveDate,
        month_start: NaiveDate,
        next_month: NaiveDate,
    ) -> Result<DashboardSummary, AppError> {
        // Snapshot consistente dos números
        let mut tx = self.pool.begin().await?;

        let (active_orders, orders_this_month): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status NOT IN ('COMPLETED', 'CANCELLED')),
                COUNT(*) FILTER (WHERE created_at >= $2 AND created_at < $3)
            FROM orders
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .bind(month_start)
        .bind(next_month)
        .fetch_one(&mut *tx)
        .await?;

        let revenue_this_month: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(price_net), 0)
            FROM orders
            WHERE tenant_id = $1
              AND status IN ('DELIVERED', 'COMPLETED')
              AND unloading_date >= $2 AND unloading_date < $3
            "#,
        )
        .bind(tenant_id)
        .bind(month_start)
        .bind(next_month)
        .fetch_one(&mut *tx)
        .await?;

        let costs_this_month: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM costs WHERE tenant_id = $1 AND cost_date >= $2 AND cost_date < $3",
        )
        .bind(tenant_id)
        .bind(month_start)
        .bind(next_month)
        .fetch_one(&mut *tx)
        .await?;

        let (active_drivers, active_vehicles, active_trailers): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM drivers WHERE tenant_id = $1 AND is_active),
                (SELECT COUNT(*) FROM vehicles WHERE tenant_id = $1 AND is_active),
                (SELECT COUNT(*) FROM trailers WHERE tenant_id = $1 AND is_active)
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;

        let (unpaid_invoices_total, overdue_invoices): (Decimal, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(total_gross), 0),
                COUNT(*) FILTER (WHERE due_date < $2)
            FROM invoices
            WHERE tenant_id = $1 AND status = 'ISSUED'
            "#,
        )
        .bind(tenant_id)
        .bind(today)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            active_orders,
            orders_this_month,
            revenue_this_month,
            costs_this_month,
            active_drivers,
            active_vehicles,
            active_trailers,
            unpaid_invoices_total,
            overdue_invoices,
        })
    }

    // 2. Receita x custos, 12 meses terminando no mês de `today`
    pub async fn monthly_chart(&self, tenant_id: Uuid, today: NaiveDate) -> Result<Vec<MonthlyChartEntry>, AppError> {
        let rows = sqlx::query_as::<_, MonthlyChartEntry>(
            r#"
            WITH months AS (
                SELECT generate_series(
                    date_trunc('month', $2::date) - interval '11 months',
                    date_trunc('month', $2::date),
                    interval '1 month'
                )::date AS m
            )
            SELECT
                to_char(m, 'YYYY-MM') AS month,
                COALESCE((
                    SELECT SUM(o.price_net) FROM orders o
                    WHERE o.tenant_id = $1
                      AND o.status IN ('DELIVERED', 'COMPLETED')
                      AND o.unloading_date >= m
                      AND o.unloading_date < (m + interval '1 month')
                ), 0) AS revenue,
                COALESCE((
                    SELECT SUM(c.amount) FROM costs c
                    WHERE c.tenant_id = $1
                      AND c.cost_date >= m
                      AND c.cost_date < (m + interval '1 month')
                ), 0) AS costs
            FROM months
            ORDER BY m
            "#,
        )
        .bind(tenant_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // 3. Todas as datas de validade até `horizon` (inclui as vencidas)
    pub async fn expiry_candidates(&self, tenant_id: Uuid, horizon: NaiveDate) -> Result<Vec<ExpiryCandidate>, AppError> {
        let rows = sqlx::query_as::<_, ExpiryRow>(
            r#"
            SELECT * FROM (
                SELECT 'DRIVER' AS source, 'DRIVER_LICENSE' AS kind, id AS entity_id,
                       first_name || ' ' || last_name AS entity_label, license_expiry AS expiry_date
                FROM drivers WHERE tenant_id = $1 AND is_active
                UNION ALL
                SELECT 'DRIVER', 'ADR', id, first_name || ' ' || last_name, adr_expiry
                FROM drivers WHERE tenant_id = $1 AND is_active AND adr_certified
                UNION ALL
                SELECT 'DRIVER', 'MEDICAL_EXAM', id, first_name || ' ' || last_name, medical_exam_expiry
                FROM drivers WHERE tenant_id = $1 AND is_active
                UNION ALL
                SELECT 'VEHICLE', 'INSURANCE', id, registration_number, insurance_expiry
                FROM vehicles WHERE tenant_id = $1 AND is_active
                UNION ALL
                SELECT 'VEHICLE', 'INSPECTION', id, registration_number, inspection_expiry
                FROM vehicles WHERE tenant_id = $1 AND is_active
                UNION ALL
                SELECT 'TRAILER', 'INSURANCE', id, registration_number, insurance_expiry
                FROM trailers WHERE tenant_id = $1 AND is_active
                UNION ALL
                SELECT 'TRAILER', 'INSPECTION', id, registration_number, inspection_expiry
                FROM trailers WHERE tenant_id = $1 AND is_active
                UNION ALL
                SELECT 'DOCUMENT', 'DOCUMENT_EXPIRY', id, title, expiry_date
                FROM documents WHERE tenant_id = $1
            ) e
            WHERE e.expiry_date IS NOT NULL AND e.expiry_date <= $2
            "#,
        )
        .bind(tenant_id)
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(ExpiryRow::into_candidate).collect())
    }
}
