//! Initial schema migration - creates all tables from scratch.
//!
//! - `buildings`: directory read model, buildings of a site
//! - `units`: directory read model, residential units of a building
//! - `expenses`: recorded shared expenses with scope and distribution
//! - `expense_allocations`: per-unit share rows, one set per expense

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Buildings {
    Table,
    Id,
    SiteId,
    Name,
    Active,
}

#[derive(Iden)]
enum Units {
    Table,
    Id,
    BuildingId,
    Number,
    FloorAreaM2,
    Active,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    Title,
    Category,
    AmountMinor,
    Currency,
    SiteId,
    BuildingId,
    Distribution,
    Status,
    Period,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ExpenseAllocations {
    Table,
    Id,
    ExpenseId,
    UnitId,
    AmountMinor,
    Currency,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Buildings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Buildings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Buildings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Buildings::SiteId).string().not_null())
                    .col(ColumnDef::new(Buildings::Name).string().not_null())
                    .col(ColumnDef::new(Buildings::Active).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-buildings-site_id")
                    .table(Buildings::Table)
                    .col(Buildings::SiteId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Units
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Units::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Units::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Units::BuildingId).string().not_null())
                    .col(ColumnDef::new(Units::Number).string().not_null())
                    .col(ColumnDef::new(Units::FloorAreaM2).double())
                    .col(ColumnDef::new(Units::Active).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-units-building_id")
                            .from(Units::Table, Units::BuildingId)
                            .to(Buildings::Table, Buildings::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-units-building_id-number")
                    .table(Units::Table)
                    .col(Units::BuildingId)
                    .col(Units::Number)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Expenses
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenses::Title).string().not_null())
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(
                        ColumnDef::new(Expenses::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::Currency)
                            .string()
                            .not_null()
                            .default("TRY"),
                    )
                    .col(ColumnDef::new(Expenses::SiteId).string().not_null())
                    .col(ColumnDef::new(Expenses::BuildingId).string())
                    .col(ColumnDef::new(Expenses::Distribution).string().not_null())
                    .col(ColumnDef::new(Expenses::Status).string().not_null())
                    .col(ColumnDef::new(Expenses::Period).string().not_null())
                    .col(
                        ColumnDef::new(Expenses::Version)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Expenses::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-site_id-period")
                    .table(Expenses::Table)
                    .col(Expenses::SiteId)
                    .col(Expenses::Period)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Expense Allocations
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ExpenseAllocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseAllocations::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAllocations::ExpenseId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAllocations::UnitId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAllocations::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseAllocations::Currency)
                            .string()
                            .not_null()
                            .default("TRY"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_allocations-expense_id")
                            .from(ExpenseAllocations::Table, ExpenseAllocations::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_allocations-unit_id")
                            .from(ExpenseAllocations::Table, ExpenseAllocations::UnitId)
                            .to(Units::Table, Units::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One current allocation per (expense, unit).
        manager
            .create_index(
                Index::create()
                    .name("idx-expense_allocations-expense_id-unit_id-unique")
                    .table(ExpenseAllocations::Table)
                    .col(ExpenseAllocations::ExpenseId)
                    .col(ExpenseAllocations::UnitId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_allocations-unit_id")
                    .table(ExpenseAllocations::Table)
                    .col(ExpenseAllocations::UnitId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ExpenseAllocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Units::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Buildings::Table).to_owned())
            .await?;
        Ok(())
    }
}
