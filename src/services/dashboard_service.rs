// src/services/dashboard_service.rs

use chrono::{Datelike, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::DashboardRepository,
    models::dashboard::{DashboardSummary, ExpiryAlert, ExpiryCandidate, MonthlyChartEntry},
};

pub const DEFAULT_ALERT_DAYS: i64 = 30;
const MAX_ALERT_DAYS: i64 = 365;

/// Primeiro dia do mês de `today` e primeiro dia do mês seguinte.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.with_day(1).unwrap_or(today);
    let next = if start.month() == 12 {
        NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
    };
    (start, next.unwrap_or(start + Duration::days(31)))
}

/// Filtra pelo prazo (vencidos sempre entram) e ordena por dias restantes.
pub fn collect_alerts(candidates: Vec<ExpiryCandidate>, today: NaiveDate, days: i64) -> Vec<ExpiryAlert> {
    let mut alerts: Vec<ExpiryAlert> = candidates
        .into_iter()
        .filter_map(|c| {
            let days_left = (c.expiry_date - today).num_days();
            (days_left <= days).then(|| ExpiryAlert {
                source: c.source,
                kind: c.kind,
                label: c.kind.label().to_string(),
                entity_id: c.entity_id,
                entity_label: c.entity_label,
                expiry_date: c.expiry_date,
                days_left,
                expired: days_left < 0,
            })
        })
        .collect();

    alerts.sort_by(|a, b| a.days_left.cmp(&b.days_left).then_with(|| a.entity_label.cmp(&b.entity_label)));
    alerts
}

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn summary(&self, tenant_id: Uuid) -> Result<DashboardSummary, AppError> {
        let today = Utc::now().date_naive();
        let (month_start, next_month) = month_bounds(today);
        self.repo.get_summary(tenant_id, today, month_start, next_month).await
    }

    pub async fn monthly_chart(&self, tenant_id: Uuid) -> Result<Vec<MonthlyChartEntry>, AppError> {
        self.repo.monthly_chart(tenant_id, Utc::now().date_naive()).await
    }

    pub async fn expiry_alerts(&self, tenant_id: Uuid, days: Option<i64>) -> Result<Vec<ExpiryAlert>, AppError> {
        let days = days.unwrap_or(DEFAULT_ALERT_DAYS).clamp(0, MAX_ALERT_DAYS);
        let today = Utc::now().date_naive();
        let candidates = self.repo.expiry_candidates(tenant_id, today + Duration::days(days)).await?;
        Ok(collect_alerts(candidates, today, days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dashboard::{AlertKind, AlertSource};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate(label: &str, expiry: NaiveDate) -> ExpiryCandidate {
        ExpiryCandidate {
            source: AlertSource::Vehicle,
            kind: AlertKind::Inspection,
            entity_id: Uuid::new_v4(),
            entity_label: label.into(),
            expiry_date: expiry,
        }
    }

    #[test]
    fn month_bounds_roll_over_the_year() {
        assert_eq!(month_bounds(date(2024, 12, 15)), (date(2024, 12, 1), date(2025, 1, 1)));
        assert_eq!(month_bounds(date(2024, 2, 29)), (date(2024, 2, 1), date(2024, 3, 1)));
    }

    #[test]
    fn alerts_include_expired_and_sort_by_days_left() {
        let today = date(2024, 6, 1);
        let alerts = collect_alerts(
            vec![
                candidate("WX3", date(2024, 6, 20)),
                candidate("WX1", date(2024, 5, 20)),
                candidate("WX2", date(2024, 6, 1)),
                candidate("WX4", date(2024, 8, 1)),
            ],
            today,
            30,
        );

        let labels: Vec<_> = alerts.iter().map(|a| a.entity_label.as_str()).collect();
        assert_eq!(labels, vec!["WX1", "WX2", "WX3"]);
        assert!(alerts[0].expired);
        assert_eq!(alerts[0].days_left, -12);
        assert!(!alerts[1].expired);
        assert_eq!(alerts[2].label, "Przegląd techniczny");
    }

    #[test]
    fn threshold_is_inclusive() {
        let today = date(2024, 6, 1);
        let alerts = collect_alerts(vec![candidate("WX9", date(2024, 7, 1))], today, 30);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].days_left, 30);
    }
}
