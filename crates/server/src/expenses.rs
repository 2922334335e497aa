//! Expenses API endpoints

use api_types::expense::{
    DistributionType, ExpenseCategory as ApiCategory, ExpenseListResponse, ExpenseNew,
    ExpenseStatus as ApiStatus, ExpenseUpdate, ExpenseView, ExpenseWriteResponse, ScopeView,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{
    CreateExpenseCmd, ExpenseScope, MoneyCents, PeriodKey, ReallocationOutcome, UpdateExpenseCmd,
};

fn map_category_in(category: ApiCategory) -> engine::ExpenseCategory {
    match category {
        ApiCategory::Maintenance => engine::ExpenseCategory::Maintenance,
        ApiCategory::Utilities => engine::ExpenseCategory::Utilities,
        ApiCategory::Personnel => engine::ExpenseCategory::Personnel,
        ApiCategory::General => engine::ExpenseCategory::General,
        ApiCategory::Other => engine::ExpenseCategory::Other,
    }
}

fn map_category(category: engine::ExpenseCategory) -> ApiCategory {
    match category {
        engine::ExpenseCategory::Maintenance => ApiCategory::Maintenance,
        engine::ExpenseCategory::Utilities => ApiCategory::Utilities,
        engine::ExpenseCategory::Personnel => ApiCategory::Personnel,
        engine::ExpenseCategory::General => ApiCategory::General,
        engine::ExpenseCategory::Other => ApiCategory::Other,
    }
}

fn map_status_in(status: ApiStatus) -> engine::ExpenseStatus {
    match status {
        ApiStatus::Pending => engine::ExpenseStatus::Pending,
        ApiStatus::Paid => engine::ExpenseStatus::Paid,
    }
}

fn map_status(status: engine::ExpenseStatus) -> ApiStatus {
    match status {
        engine::ExpenseStatus::Pending => ApiStatus::Pending,
        engine::ExpenseStatus::Paid => ApiStatus::Paid,
    }
}

fn map_distribution_in(distribution: DistributionType) -> engine::DistributionKind {
    match distribution {
        DistributionType::Equal => engine::DistributionKind::Equal,
        DistributionType::AreaWeighted => engine::DistributionKind::AreaWeighted,
    }
}

fn map_distribution(distribution: engine::DistributionKind) -> DistributionType {
    match distribution {
        engine::DistributionKind::Equal => DistributionType::Equal,
        engine::DistributionKind::AreaWeighted => DistributionType::AreaWeighted,
    }
}

fn map_currency(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Try => api_types::Currency::Try,
    }
}

fn scope_from(site_id: String, building_id: Option<Uuid>) -> ExpenseScope {
    match building_id {
        Some(building_id) => ExpenseScope::Building {
            site_id,
            building_id,
        },
        None => ExpenseScope::Site { site_id },
    }
}

pub(crate) fn view(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        title: expense.title,
        category: map_category(expense.category),
        amount: expense.amount.to_string(),
        currency: map_currency(expense.currency),
        scope: ScopeView {
            site_id: expense.scope.site_id().to_string(),
            building_id: expense.scope.building_id(),
        },
        distribution: map_distribution(expense.distribution),
        status: map_status(expense.status),
        period: expense.period.to_string(),
        version: expense.version,
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

fn write_response(outcome: ReallocationOutcome) -> ExpenseWriteResponse {
    ExpenseWriteResponse {
        allocated_units: outcome.unit_count,
        degraded_to_equal: outcome.degraded_to_equal,
        expense: view(outcome.expense),
    }
}

/// Earliest period still open for edits: the current calendar month.
pub(crate) fn open_period() -> Result<PeriodKey, ServerError> {
    let now = Utc::now();
    let month = u8::try_from(now.month())
        .map_err(|_| ServerError::Generic("invalid current month".to_string()))?;
    Ok(PeriodKey::new(now.year(), month)?)
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseWriteResponse>), ServerError> {
    let amount: MoneyCents = payload.amount.parse()?;
    let period: PeriodKey = payload.period.parse()?;

    let cmd = CreateExpenseCmd::new(
        payload.title,
        amount,
        scope_from(payload.site_id, payload.building_id),
        period,
    )
    .category(map_category_in(payload.category))
    .distribution(map_distribution_in(payload.distribution));

    let outcome = state
        .engine
        .create_expense(cmd, open_period()?, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(write_response(outcome))))
}

#[derive(Debug, Deserialize)]
pub struct ExpenseListQuery {
    site_id: Option<String>,
    building_id: Option<Uuid>,
    period: Option<String>,
    status: Option<ApiStatus>,
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let period = query.period.map(|p| p.parse()).transpose()?;
    let filter = engine::ExpenseListFilter {
        site_id: query.site_id,
        building_id: query.building_id,
        period,
        status: query.status.map(map_status_in),
    };

    let expenses = state.engine.list_expenses(&filter).await?;
    Ok(Json(ExpenseListResponse {
        expenses: expenses.into_iter().map(view).collect(),
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(id).await?;
    Ok(Json(view(expense)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseWriteResponse>, ServerError> {
    let mut cmd = UpdateExpenseCmd::new(id, payload.version);

    if let Some(title) = payload.title {
        cmd = cmd.title(title);
    }
    if let Some(category) = payload.category {
        cmd = cmd.category(map_category_in(category));
    }
    if let Some(amount) = payload.amount {
        cmd = cmd.amount(amount.parse()?);
    }
    match (payload.site_id, payload.building_id) {
        (Some(site_id), building_id) => {
            cmd = cmd.scope(scope_from(site_id, building_id));
        }
        (None, Some(_)) => {
            return Err(ServerError::Generic(
                "site_id is required when changing building_id".to_string(),
            ));
        }
        (None, None) => {}
    }
    if let Some(distribution) = payload.distribution {
        cmd = cmd.distribution(map_distribution_in(distribution));
    }
    if let Some(status) = payload.status {
        cmd = cmd.status(map_status_in(status));
    }

    let outcome = state
        .engine
        .update_expense(cmd, open_period()?, Utc::now())
        .await?;
    Ok(Json(write_response(outcome)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(id, open_period()?).await?;
    Ok(StatusCode::NO_CONTENT)
}
