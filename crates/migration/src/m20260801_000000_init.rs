//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for tripool:
//!
//! - `users`: authentication
//! - `trips`: shared-trip pools owned by a user
//! - `trip_members`: per-trip roster with roles
//! - `contributions`: money paid into the pool
//! - `expenses`: money spent from the pool, with split metadata
//! - `settlements`: recorded member-to-member payments (append only)

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Uid,
    Username,
    Password,
    Name,
    Email,
}

#[derive(Iden)]
enum Trips {
    Table,
    Id,
    Name,
    Destination,
    JoinCode,
    OwnerUid,
    Status,
    StartDate,
    EndDate,
}

#[derive(Iden)]
enum TripMembers {
    Table,
    TripId,
    Uid,
    Name,
    Email,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum Contributions {
    Table,
    Id,
    TripId,
    Uid,
    Name,
    AmountCents,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    TripId,
    Title,
    AmountCents,
    PaidByUid,
    PaidByName,
    SplitBetweenUids,
    SplitType,
    SplitExactCents,
    SplitPercentBps,
    CreatedAt,
}

#[derive(Iden)]
enum Settlements {
    Table,
    Id,
    TripId,
    FromUid,
    FromName,
    ToUid,
    ToName,
    AmountCents,
    Note,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Uid).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-username-unique")
                    .table(Users::Table)
                    .col(Users::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Trips
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Trips::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trips::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Trips::Name).string().not_null())
                    .col(ColumnDef::new(Trips::Destination).string().not_null())
                    .col(ColumnDef::new(Trips::JoinCode).string().not_null())
                    .col(ColumnDef::new(Trips::OwnerUid).string().not_null())
                    .col(ColumnDef::new(Trips::Status).string().not_null())
                    .col(ColumnDef::new(Trips::StartDate).timestamp())
                    .col(ColumnDef::new(Trips::EndDate).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-trips-join_code-unique")
                    .table(Trips::Table)
                    .col(Trips::JoinCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-trips-owner_uid")
                    .table(Trips::Table)
                    .col(Trips::OwnerUid)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Trip members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TripMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TripMembers::TripId).string().not_null())
                    .col(ColumnDef::new(TripMembers::Uid).string().not_null())
                    .col(ColumnDef::new(TripMembers::Name).string().not_null())
                    .col(ColumnDef::new(TripMembers::Email).string().not_null())
                    .col(ColumnDef::new(TripMembers::Role).string().not_null())
                    .col(ColumnDef::new(TripMembers::JoinedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(TripMembers::TripId)
                            .col(TripMembers::Uid),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-trip_members-trip_id")
                            .from(TripMembers::Table, TripMembers::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-trip_members-uid")
                    .table(TripMembers::Table)
                    .col(TripMembers::Uid)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Contributions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Contributions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contributions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contributions::TripId).string().not_null())
                    .col(ColumnDef::new(Contributions::Uid).string().not_null())
                    .col(ColumnDef::new(Contributions::Name).string().not_null())
                    .col(
                        ColumnDef::new(Contributions::AmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Contributions::Note).string().not_null())
                    .col(
                        ColumnDef::new(Contributions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-contributions-trip_id")
                            .from(Contributions::Table, Contributions::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-contributions-trip_id-created_at")
                    .table(Contributions::Table)
                    .col(Contributions::TripId)
                    .col(Contributions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Expenses
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
                    .col(ColumnDef::new(Expenses::TripId).string().not_null())
                    .col(ColumnDef::new(Expenses::Title).string().not_null())
                    .col(
                        ColumnDef::new(Expenses::AmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::PaidByUid).string().not_null())
                    .col(ColumnDef::new(Expenses::PaidByName).string().not_null())
                    .col(
                        ColumnDef::new(Expenses::SplitBetweenUids)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::SplitType).string().not_null())
                    .col(
                        ColumnDef::new(Expenses::SplitExactCents)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::SplitPercentBps)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-trip_id")
                            .from(Expenses::Table, Expenses::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-trip_id-created_at")
                    .table(Expenses::Table)
                    .col(Expenses::TripId)
                    .col(Expenses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Settlements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Settlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settlements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settlements::TripId).string().not_null())
                    .col(ColumnDef::new(Settlements::FromUid).string().not_null())
                    .col(ColumnDef::new(Settlements::FromName).string().not_null())
                    .col(ColumnDef::new(Settlements::ToUid).string().not_null())
                    .col(ColumnDef::new(Settlements::ToName).string().not_null())
                    .col(
                        ColumnDef::new(Settlements::AmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Settlements::Note).string().not_null())
                    .col(
                        ColumnDef::new(Settlements::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-trip_id")
                            .from(Settlements::Table, Settlements::TripId)
                            .to(Trips::Table, Trips::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlements-trip_id-created_at")
                    .table(Settlements::Table)
                    .col(Settlements::TripId)
                    .col(Settlements::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contributions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TripMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Trips::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}
