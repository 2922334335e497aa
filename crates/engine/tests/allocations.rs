use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection, Statement,
};
use uuid::Uuid;

use engine::{
    CreateExpenseCmd, DistributionKind, Engine, EngineError, ExpenseScope, ExpenseStatus,
    MoneyCents, PeriodKey, UpdateExpenseCmd, buildings, units,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn insert_building(db: &DatabaseConnection, site_id: &str, name: &str, active: bool) -> Uuid {
    let id = Uuid::new_v4();
    buildings::ActiveModel {
        id: Set(id.to_string()),
        site_id: Set(site_id.to_string()),
        name: Set(name.to_string()),
        active: Set(active),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

async fn insert_unit(
    db: &DatabaseConnection,
    building_id: Uuid,
    number: &str,
    floor_area_m2: Option<f64>,
    active: bool,
) -> Uuid {
    let id = Uuid::new_v4();
    units::ActiveModel {
        id: Set(id.to_string()),
        building_id: Set(building_id.to_string()),
        number: Set(number.to_string()),
        floor_area_m2: Set(floor_area_m2),
        active: Set(active),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

fn period(s: &str) -> PeriodKey {
    s.parse().unwrap()
}

/// Earliest open period used by most tests; expenses land in 2026-08.
fn open_from() -> PeriodKey {
    period("2026-01")
}

fn site_cmd(site_id: &str, cents: i64) -> CreateExpenseCmd {
    CreateExpenseCmd::new(
        "Elevator maintenance",
        MoneyCents::new(cents),
        ExpenseScope::Site {
            site_id: site_id.to_string(),
        },
        period("2026-08"),
    )
}

fn building_cmd(site_id: &str, building_id: Uuid, cents: i64) -> CreateExpenseCmd {
    CreateExpenseCmd::new(
        "Stairwell lighting",
        MoneyCents::new(cents),
        ExpenseScope::Building {
            site_id: site_id.to_string(),
            building_id,
        },
        period("2026-08"),
    )
}

async fn allocation_cents(engine: &Engine, expense_id: Uuid) -> Vec<i64> {
    engine
        .allocations(expense_id)
        .await
        .unwrap()
        .iter()
        .map(|a| a.amount.cents())
        .collect()
}

#[tokio::test]
async fn equal_split_sums_exactly_with_remainder_up_front() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    for number in ["1", "2", "3"] {
        insert_unit(&db, building, number, None, true).await;
    }

    let outcome = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();

    assert!(outcome.reallocated);
    assert_eq!(outcome.unit_count, 3);
    assert!(!outcome.degraded_to_equal);

    let cents = allocation_cents(&engine, outcome.expense.id).await;
    assert_eq!(cents, vec![33_34, 33_33, 33_33]);
    assert_eq!(cents.iter().sum::<i64>(), 100_00);
}

#[tokio::test]
async fn area_weighted_split_follows_floor_areas() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", Some(100.0), true).await;
    insert_unit(&db, building, "2", Some(200.0), true).await;
    insert_unit(&db, building, "3", Some(300.0), true).await;

    let outcome = engine
        .create_expense(
            site_cmd("yesilkent", 600_00).distribution(DistributionKind::AreaWeighted),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap();

    assert!(!outcome.degraded_to_equal);
    assert_eq!(
        allocation_cents(&engine, outcome.expense.id).await,
        vec![100_00, 200_00, 300_00]
    );
}

#[tokio::test]
async fn area_weighted_without_any_area_degrades_to_equal() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;
    insert_unit(&db, building, "2", Some(0.0), true).await;

    let outcome = engine
        .create_expense(
            site_cmd("yesilkent", 90_00).distribution(DistributionKind::AreaWeighted),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap();

    assert!(outcome.degraded_to_equal);
    assert_eq!(
        allocation_cents(&engine, outcome.expense.id).await,
        vec![45_00, 45_00]
    );
}

#[tokio::test]
async fn site_scope_covers_every_active_building() {
    let (engine, db) = engine_with_db().await;
    let block_a = insert_building(&db, "yesilkent", "A Blok", true).await;
    let block_b = insert_building(&db, "yesilkent", "B Blok", true).await;
    insert_unit(&db, block_a, "1", None, true).await;
    insert_unit(&db, block_a, "2", None, true).await;
    insert_unit(&db, block_b, "1", None, true).await;
    // Another site entirely; must never be touched.
    let other = insert_building(&db, "narlidere", "C Blok", true).await;
    insert_unit(&db, other, "1", None, true).await;

    let outcome = engine
        .create_expense(site_cmd("yesilkent", 300_00), open_from(), Utc::now())
        .await
        .unwrap();

    assert_eq!(outcome.unit_count, 3);
    assert_eq!(
        allocation_cents(&engine, outcome.expense.id).await,
        vec![100_00, 100_00, 100_00]
    );
}

#[tokio::test]
async fn building_scope_is_limited_to_that_building() {
    let (engine, db) = engine_with_db().await;
    let block_a = insert_building(&db, "yesilkent", "A Blok", true).await;
    let block_b = insert_building(&db, "yesilkent", "B Blok", true).await;
    let a1 = insert_unit(&db, block_a, "1", None, true).await;
    let a2 = insert_unit(&db, block_a, "2", None, true).await;
    insert_unit(&db, block_b, "1", None, true).await;

    let outcome = engine
        .create_expense(
            building_cmd("yesilkent", block_a, 100_00),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap();

    let allocations = engine.allocations(outcome.expense.id).await.unwrap();
    let unit_ids: Vec<Uuid> = allocations.iter().map(|a| a.unit_id).collect();
    assert_eq!(unit_ids, vec![a1, a2]);
}

#[tokio::test]
async fn inactive_units_and_buildings_are_excluded() {
    let (engine, db) = engine_with_db().await;
    let block_a = insert_building(&db, "yesilkent", "A Blok", true).await;
    let ghost = insert_building(&db, "yesilkent", "Eski Blok", false).await;
    let a1 = insert_unit(&db, block_a, "1", None, true).await;
    insert_unit(&db, block_a, "2", None, false).await;
    insert_unit(&db, ghost, "1", None, true).await;

    let outcome = engine
        .create_expense(site_cmd("yesilkent", 50_00), open_from(), Utc::now())
        .await
        .unwrap();

    let allocations = engine.allocations(outcome.expense.id).await.unwrap();
    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].unit_id, a1);
    assert_eq!(allocations[0].amount.cents(), 50_00);
}

#[tokio::test]
async fn empty_scope_rejects_create_and_writes_nothing() {
    let (engine, db) = engine_with_db().await;
    insert_building(&db, "yesilkent", "A Blok", true).await;

    let err = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyScope(_)));

    // The transaction rolled back: no expense row either.
    let expenses = engine.list_expenses(&Default::default()).await.unwrap();
    assert!(expenses.is_empty());
}

#[tokio::test]
async fn closed_period_rejects_create() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;

    let err = engine
        .create_expense(site_cmd("yesilkent", 100_00), period("2026-09"), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::PeriodClosed("2026-08".to_string()));
}

#[tokio::test]
async fn scope_outside_declared_site_is_rejected() {
    let (engine, db) = engine_with_db().await;
    let foreign = insert_building(&db, "narlidere", "C Blok", true).await;
    insert_unit(&db, foreign, "1", None, true).await;

    let err = engine
        .create_expense(
            building_cmd("yesilkent", foreign, 100_00),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidScope(_)));
}

#[tokio::test]
async fn amount_edit_replaces_the_full_allocation_set() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    for number in ["1", "2", "3"] {
        insert_unit(&db, building, number, None, true).await;
    }

    let created = engine
        .create_expense(site_cmd("yesilkent", 300_00), open_from(), Utc::now())
        .await
        .unwrap();
    assert_eq!(
        allocation_cents(&engine, created.expense.id).await,
        vec![100_00, 100_00, 100_00]
    );

    let updated = engine
        .update_expense(
            UpdateExpenseCmd::new(created.expense.id, 1).amount(MoneyCents::new(450_00)),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap();

    assert!(updated.reallocated);
    assert_eq!(updated.expense.version, 2);
    assert_eq!(
        allocation_cents(&engine, created.expense.id).await,
        vec![150_00, 150_00, 150_00]
    );
}

#[tokio::test]
async fn title_and_status_edits_leave_allocations_untouched() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;
    insert_unit(&db, building, "2", None, true).await;

    let created = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();
    let before = engine.allocations(created.expense.id).await.unwrap();

    let updated = engine
        .update_expense(
            UpdateExpenseCmd::new(created.expense.id, 1)
                .title("Elevator maintenance (invoice 1042)")
                .status(ExpenseStatus::Paid),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap();

    assert!(!updated.reallocated);
    assert_eq!(updated.expense.version, 2);
    assert_eq!(updated.expense.status, ExpenseStatus::Paid);

    // Same row ids, not just same amounts: the set was never rewritten.
    let after = engine.allocations(created.expense.id).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn stale_version_is_rejected_with_concurrent_modification() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;

    let created = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();

    engine
        .update_expense(
            UpdateExpenseCmd::new(created.expense.id, 1).amount(MoneyCents::new(120_00)),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap();

    // A second writer still holding version 1 loses.
    let err = engine
        .update_expense(
            UpdateExpenseCmd::new(created.expense.id, 1).amount(MoneyCents::new(90_00)),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ConcurrentModification(_)));

    // The first writer's allocation set survives.
    assert_eq!(
        allocation_cents(&engine, created.expense.id).await,
        vec![120_00]
    );
}

#[tokio::test]
async fn closed_period_rejects_update_and_keeps_rows() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;

    let created = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();

    // The period closed after creation.
    let err = engine
        .update_expense(
            UpdateExpenseCmd::new(created.expense.id, 1).amount(MoneyCents::new(200_00)),
            period("2026-09"),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::PeriodClosed("2026-08".to_string()));

    assert_eq!(
        allocation_cents(&engine, created.expense.id).await,
        vec![100_00]
    );
}

#[tokio::test]
async fn scope_change_moves_allocations_to_the_new_units() {
    let (engine, db) = engine_with_db().await;
    let block_a = insert_building(&db, "yesilkent", "A Blok", true).await;
    let block_b = insert_building(&db, "yesilkent", "B Blok", true).await;
    insert_unit(&db, block_a, "1", None, true).await;
    let b1 = insert_unit(&db, block_b, "1", None, true).await;
    let b2 = insert_unit(&db, block_b, "2", None, true).await;

    let created = engine
        .create_expense(
            building_cmd("yesilkent", block_a, 100_00),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap();

    let updated = engine
        .update_expense(
            UpdateExpenseCmd::new(created.expense.id, 1).scope(ExpenseScope::Building {
                site_id: "yesilkent".to_string(),
                building_id: block_b,
            }),
            open_from(),
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(updated.reallocated);

    let allocations = engine.allocations(created.expense.id).await.unwrap();
    let unit_ids: Vec<Uuid> = allocations.iter().map(|a| a.unit_id).collect();
    assert_eq!(unit_ids, vec![b1, b2]);
    assert_eq!(
        allocations.iter().map(|a| a.amount.cents()).sum::<i64>(),
        100_00
    );
}

#[tokio::test]
async fn delete_removes_expense_and_its_allocations() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;
    insert_unit(&db, building, "2", None, true).await;

    let created = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();

    engine
        .delete_expense(created.expense.id, open_from())
        .await
        .unwrap();

    let err = engine.expense(created.expense.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(engine.allocations(created.expense.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn closed_period_rejects_delete() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;

    let created = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();

    let err = engine
        .delete_expense(created.expense.id, period("2026-09"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::PeriodClosed("2026-08".to_string()));
    assert_eq!(
        allocation_cents(&engine, created.expense.id).await,
        vec![100_00]
    );
}

#[tokio::test]
async fn allocation_breakdown_carries_unit_and_building_labels() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;
    insert_unit(&db, building, "2", None, true).await;

    let created = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();

    let breakdown = engine.allocation_breakdown(created.expense.id).await.unwrap();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].unit_number, "1");
    assert_eq!(breakdown[0].building_name, "A Blok");
    assert_eq!(breakdown[0].amount.cents(), 50_00);
    assert_eq!(breakdown[1].unit_number, "2");
}

#[tokio::test]
async fn audit_flags_out_of_band_edits() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;
    insert_unit(&db, building, "2", None, true).await;

    let created = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();
    assert!(engine.audit_allocations().await.unwrap().is_empty());

    // Perturb the rows behind the engine's back.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE expense_allocations SET amount_minor = amount_minor + 5 \
         WHERE expense_id = ?",
        vec![created.expense.id.to_string().into()],
    ))
    .await
    .unwrap();

    let findings = engine.audit_allocations().await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].expense_id, created.expense.id);
    assert_eq!(findings[0].delta.cents(), 10);

    let err = engine
        .check_allocations(created.expense.id, created.expense.amount)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::AllocationMismatch {
            expected_minor: 100_00,
            actual_minor: 100_10,
        }
    );
}

#[tokio::test]
async fn list_expenses_filters_by_site_period_and_status() {
    let (engine, db) = engine_with_db().await;
    let building = insert_building(&db, "yesilkent", "A Blok", true).await;
    insert_unit(&db, building, "1", None, true).await;
    let other = insert_building(&db, "narlidere", "C Blok", true).await;
    insert_unit(&db, other, "1", None, true).await;

    let kept = engine
        .create_expense(site_cmd("yesilkent", 100_00), open_from(), Utc::now())
        .await
        .unwrap();
    engine
        .create_expense(site_cmd("narlidere", 70_00), open_from(), Utc::now())
        .await
        .unwrap();

    let filter = engine::ExpenseListFilter {
        site_id: Some("yesilkent".to_string()),
        period: Some(period("2026-08")),
        status: Some(ExpenseStatus::Pending),
        ..Default::default()
    };
    let listed = engine.list_expenses(&filter).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, kept.expense.id);

    let none = engine
        .list_expenses(&engine::ExpenseListFilter {
            period: Some(period("2026-07")),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}
