// src/services/numbering.rs

use chrono::{Datelike, NaiveDate};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, db::TenantRepository};

const ORDER_COUNTER: &str = "ORDER";
const INVOICE_COUNTER: &str = "INVOICE";

/// "ZL/0042/2024"
pub fn format_order_number(prefix: &str, seq: i32, year: i32) -> String {
    format!("{prefix}/{seq:04}/{year}")
}

/// "FV/007/05/2024"
pub fn format_invoice_number(prefix: &str, seq: i32, month: u32, year: i32) -> String {
    format!("{prefix}/{seq:03}/{month:02}/{year}")
}

/// Próximo número de pedido (contador anual por empresa).
pub async fn next_order_number<'e, E>(
    repo: &TenantRepository,
    executor: E,
    tenant_id: Uuid,
    prefix: &str,
    date: NaiveDate,
) -> Result<String, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let year = date.year();
    let seq = repo
        .next_counter_value(executor, tenant_id, ORDER_COUNTER, &year.to_string())
        .await?;
    Ok(format_order_number(prefix, seq, year))
}

/// Próximo número de fatura (contador mensal por empresa).
pub async fn next_invoice_number<'e, E>(
    repo: &TenantRepository,
    executor: E,
    tenant_id: Uuid,
    prefix: &str,
    issue_date: NaiveDate,
) -> Result<String, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let (year, month) = (issue_date.year(), issue_date.month());
    let period = format!("{year}-{month:02}");
    let seq = repo
        .next_counter_value(executor, tenant_id, INVOICE_COUNTER, &period)
        .await?;
    Ok(format_invoice_number(prefix, seq, month, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_is_zero_padded() {
        assert_eq!(format_order_number("ZL", 42, 2024), "ZL/0042/2024");
        assert_eq!(format_order_number("ZL", 12345, 2024), "ZL/12345/2024");
    }

    #[test]
    fn invoice_number_carries_month_and_year() {
        assert_eq!(format_invoice_number("FV", 7, 5, 2024), "FV/007/05/2024");
        assert_eq!(format_invoice_number("FA", 120, 12, 2023), "FA/120/12/2023");
    }
}
