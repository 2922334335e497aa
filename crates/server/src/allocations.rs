//! Allocation breakdown and audit API endpoints

use api_types::{
    allocation::{AllocationListResponse, AllocationView},
    audit::{AuditFindingView, AuditReport},
};
use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::MoneyCents;

pub async fn list(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AllocationListResponse>, ServerError> {
    // 404 on unknown expenses, not an empty list.
    state.engine.expense(id).await?;

    let breakdown = state.engine.allocation_breakdown(id).await?;
    let total = MoneyCents::new(breakdown.iter().map(|row| row.amount.cents()).sum());

    let allocations = breakdown
        .into_iter()
        .map(|row| AllocationView {
            unit_id: row.unit_id,
            unit_number: row.unit_number,
            building_name: row.building_name,
            amount: row.amount.to_string(),
        })
        .collect();

    Ok(Json(AllocationListResponse {
        expense_id: id,
        allocations,
        total: total.to_string(),
    }))
}

pub async fn audit(
    State(state): State<ServerState>,
) -> Result<Json<AuditReport>, ServerError> {
    let findings = state.engine.audit_allocations().await?;
    let clean = findings.is_empty();

    let findings = findings
        .into_iter()
        .map(|finding| AuditFindingView {
            expense_id: finding.expense_id,
            expected: finding.expected.to_string(),
            actual: finding.actual.to_string(),
            delta: finding.delta.to_string(),
        })
        .collect();

    Ok(Json(AuditReport { findings, clean }))
}
