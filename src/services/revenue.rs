// src/services/revenue.rs

use rust_decimal::Decimal;

use crate::{
    common::{error::AppError, money::round2},
    models::orders::{OrderAssignment, ResourceKind, RevenueShareLine},
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Soma das participações explícitas de um tipo de recurso não pode passar de 100%.
pub fn check_shares<'a>(shares: impl IntoIterator<Item = &'a Option<Decimal>>) -> Result<(), AppError> {
    let mut total = Decimal::ZERO;
    for share in shares.into_iter().flatten() {
        if *share < Decimal::ZERO || *share > HUNDRED {
            return Err(AppError::InvalidInput("invalid_field"));
        }
        total += *share;
    }
    if total > HUNDRED {
        return Err(AppError::StateConflict("revenue_share_exceeded"));
    }
    Ok(())
}

/// Divide `price_net` entre as atribuições ativas, separadamente por tipo de recurso.
///
/// Participações explícitas valem como percentuais; quem não tem participação divide
/// igualmente o restante. Cada valor é arredondado a 2 casas, sem deixar a soma parcial
/// passar do alvo, e a diferença de arredondamento vai para o último recurso do tipo.
pub fn allocate(price_net: Decimal, assignments: &[OrderAssignment]) -> Result<Vec<RevenueShareLine>, AppError> {
    let mut lines = Vec::with_capacity(assignments.len());

    for kind in [ResourceKind::Driver, ResourceKind::Vehicle, ResourceKind::Trailer] {
        let group: Vec<&OrderAssignment> = assignments
            .iter()
            .filter(|a| a.resource_kind == kind && a.unassigned_at.is_none())
            .collect();
        if group.is_empty() {
            continue;
        }

        check_shares(group.iter().map(|a| &a.revenue_share))?;

        let explicit: Decimal = group.iter().filter_map(|a| a.revenue_share).sum();
        let implicit_count = group.iter().filter(|a| a.revenue_share.is_none()).count();
        let implicit_share = if implicit_count > 0 {
            (HUNDRED - explicit) / Decimal::from(implicit_count)
        } else {
            Decimal::ZERO
        };
        let covered = if implicit_count > 0 { HUNDRED } else { explicit };
        let target = round2(price_net * covered / HUNDRED);

        let mut allocated = Decimal::ZERO;
        for (idx, assignment) in group.iter().enumerate() {
            let percent = assignment.revenue_share.unwrap_or(implicit_share);
            // Arredondado sem passar do alvo; o último fica com o resto (>= 0)
            let amount = if idx + 1 == group.len() {
                target - allocated
            } else {
                round2(price_net * percent / HUNDRED).min(target - allocated)
            };
            allocated += amount;

            lines.push(RevenueShareLine {
                assignment_id: assignment.id,
                resource_kind: kind,
                resource_id: assignment.resource_id,
                resource_label: assignment.resource_label.clone(),
                share_percent: round2(percent),
                amount,
            });
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;
    use uuid::Uuid;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn assignment(kind: ResourceKind, share: Option<&str>) -> OrderAssignment {
        OrderAssignment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            order_id: Uuid::nil(),
            resource_kind: kind,
            resource_id: Uuid::new_v4(),
            revenue_share: share.map(d),
            assigned_at: Utc::now(),
            unassigned_at: None,
            resource_label: None,
        }
    }

    fn amounts(lines: &[RevenueShareLine], kind: ResourceKind) -> Vec<Decimal> {
        lines.iter().filter(|l| l.resource_kind == kind).map(|l| l.amount).collect()
    }

    #[test]
    fn equal_split_without_shares() {
        let lines = allocate(
            d("1000"),
            &[assignment(ResourceKind::Driver, None), assignment(ResourceKind::Driver, None)],
        )
        .unwrap();
        assert_eq!(amounts(&lines, ResourceKind::Driver), vec![d("500.00"), d("500.00")]);
        assert_eq!(lines[0].share_percent, d("50.00"));
    }

    #[test]
    fn rounding_remainder_goes_to_the_last_resource() {
        let drivers: Vec<_> = (0..3).map(|_| assignment(ResourceKind::Driver, None)).collect();
        let lines = allocate(d("1000"), &drivers).unwrap();
        assert_eq!(amounts(&lines, ResourceKind::Driver), vec![d("333.33"), d("333.33"), d("333.34")]);
        let total: Decimal = lines.iter().map(|l| l.amount).sum();
        assert_eq!(total, d("1000"));
    }

    #[test]
    fn tiny_price_never_yields_negative_amounts() {
        let drivers: Vec<_> = (0..7).map(|_| assignment(ResourceKind::Driver, None)).collect();
        let lines = allocate(d("0.05"), &drivers).unwrap();

        let split = amounts(&lines, ResourceKind::Driver);
        assert!(split.iter().all(|a| *a >= Decimal::ZERO), "{split:?}");
        assert_eq!(split.iter().copied().sum::<Decimal>(), d("0.05"));
    }

    #[test]
    fn explicit_share_and_remainder_split() {
        let lines = allocate(
            d("4200"),
            &[
                assignment(ResourceKind::Driver, Some("70")),
                assignment(ResourceKind::Driver, None),
            ],
        )
        .unwrap();
        assert_eq!(amounts(&lines, ResourceKind::Driver), vec![d("2940.00"), d("1260.00")]);
        assert_eq!(lines[1].share_percent, d("30.00"));
    }

    #[test]
    fn each_kind_sums_to_the_price_independently() {
        let lines = allocate(
            d("999.99"),
            &[
                assignment(ResourceKind::Driver, None),
                assignment(ResourceKind::Vehicle, Some("40")),
                assignment(ResourceKind::Vehicle, None),
                assignment(ResourceKind::Vehicle, None),
                assignment(ResourceKind::Trailer, None),
            ],
        )
        .unwrap();
        for kind in [ResourceKind::Driver, ResourceKind::Vehicle, ResourceKind::Trailer] {
            let sum: Decimal = amounts(&lines, kind).into_iter().sum();
            assert_eq!(sum, d("999.99"), "{kind:?}");
        }
    }

    #[test]
    fn shares_above_hundred_are_a_conflict() {
        let err = allocate(
            d("100"),
            &[
                assignment(ResourceKind::Vehicle, Some("60")),
                assignment(ResourceKind::Vehicle, Some("50")),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, AppError::StateConflict("revenue_share_exceeded")));
    }

    #[test]
    fn explicit_shares_below_hundred_leave_the_rest_unallocated() {
        let lines = allocate(d("1000"), &[assignment(ResourceKind::Trailer, Some("25"))]).unwrap();
        assert_eq!(amounts(&lines, ResourceKind::Trailer), vec![d("250.00")]);
    }

    #[test]
    fn removed_assignments_are_ignored() {
        let mut gone = assignment(ResourceKind::Driver, None);
        gone.unassigned_at = Some(Utc::now());
        let lines = allocate(d("300"), &[gone, assignment(ResourceKind::Driver, None)]).unwrap();
        assert_eq!(amounts(&lines, ResourceKind::Driver), vec![d("300.00")]);
    }

    #[test]
    fn negative_share_is_invalid_input() {
        let err = check_shares([&Some(d("-1"))]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
