use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241201_000001_create_catalog_tables::Migration),
            Box::new(m20241201_000002_create_day_ledgers_table::Migration),
            Box::new(m20241201_000003_create_unloading_tables::Migration),
            Box::new(m20241201_000004_create_attendance_tables::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Name,
    NameKey,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    NameKey,
    Category,
    UnitsPerLayer,
    LayersPerPallet,
    Active,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DayLedgers {
    Table,
    Id,
    LedgerDate,
    State,
    TotalPallets,
    ClosedAt,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UnloadingEvents {
    Table,
    Id,
    LedgerId,
    CompanyId,
    DriverName,
    DriverPhone,
    Plate,
    EventType,
    Note,
    Arrival,
    DurationMinutes,
    EstimatedEnd,
    CreatedAt,
}

#[derive(DeriveIden)]
enum LineItems {
    Table,
    Id,
    EventId,
    ProductId,
    LineNo,
    FullPallets,
    LooseUnits,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    NationalId,
    FirstNames,
    LastNames,
    Position,
    Phone,
    Email,
    HireDate,
    Active,
    RegisteredAt,
}

#[derive(DeriveIden)]
enum AttendanceRecords {
    Table,
    Id,
    EmployeeId,
    WorkDate,
    CheckIn,
    CheckOut,
    Notes,
    RegisteredAt,
}

mod m20241201_000001_create_catalog_tables {
    use super::{Companies, Products};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241201_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Companies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Companies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Companies::Name).string_len(120).not_null())
                        .col(
                            ColumnDef::new(Companies::NameKey)
                                .string_len(120)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Companies::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Companies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string_len(150).not_null())
                        .col(
                            ColumnDef::new(Products::NameKey)
                                .string_len(150)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Category)
                                .string_len(16)
                                .not_null()
                                .default("other"),
                        )
                        .col(
                            ColumnDef::new(Products::UnitsPerLayer)
                                .integer()
                                .not_null()
                                .default(8),
                        )
                        .col(
                            ColumnDef::new(Products::LayersPerPallet)
                                .integer()
                                .not_null()
                                .default(8),
                        )
                        .col(
                            ColumnDef::new(Products::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_name")
                        .table(Products::Table)
                        .col(Products::Category)
                        .col(Products::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Companies::Table).to_owned())
                .await
        }
    }
}

mod m20241201_000002_create_day_ledgers_table {
    use super::DayLedgers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241201_000002_create_day_ledgers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DayLedgers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(DayLedgers::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(DayLedgers::LedgerDate)
                                .date()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(DayLedgers::State)
                                .string_len(10)
                                .not_null()
                                .default("open"),
                        )
                        .col(
                            ColumnDef::new(DayLedgers::TotalPallets)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DayLedgers::ClosedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DayLedgers::Notes)
                                .text()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(DayLedgers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DayLedgers::Table).to_owned())
                .await
        }
    }
}

mod m20241201_000003_create_unloading_tables {
    use super::{Companies, DayLedgers, LineItems, Products, UnloadingEvents};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241201_000003_create_unloading_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(UnloadingEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UnloadingEvents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UnloadingEvents::LedgerId).uuid().not_null())
                        .col(ColumnDef::new(UnloadingEvents::CompanyId).uuid().null())
                        .col(
                            ColumnDef::new(UnloadingEvents::DriverName)
                                .string_len(100)
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(UnloadingEvents::DriverPhone)
                                .string_len(20)
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(UnloadingEvents::Plate)
                                .string_len(20)
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(UnloadingEvents::EventType)
                                .string_len(12)
                                .not_null()
                                .default("complete"),
                        )
                        .col(
                            ColumnDef::new(UnloadingEvents::Note)
                                .string_len(200)
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(UnloadingEvents::Arrival)
                                .date_time()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnloadingEvents::DurationMinutes)
                                .integer()
                                .not_null()
                                .default(30),
                        )
                        .col(
                            ColumnDef::new(UnloadingEvents::EstimatedEnd)
                                .date_time()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnloadingEvents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_unloading_events_ledger_id")
                                .from(UnloadingEvents::Table, UnloadingEvents::LedgerId)
                                .to(DayLedgers::Table, DayLedgers::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_unloading_events_company_id")
                                .from(UnloadingEvents::Table, UnloadingEvents::CompanyId)
                                .to(Companies::Table, Companies::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_unloading_events_ledger_arrival")
                        .table(UnloadingEvents::Table)
                        .col(UnloadingEvents::LedgerId)
                        .col(UnloadingEvents::Arrival)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LineItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(LineItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(LineItems::EventId).uuid().not_null())
                        .col(ColumnDef::new(LineItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(LineItems::LineNo).integer().not_null())
                        .col(
                            ColumnDef::new(LineItems::FullPallets)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(LineItems::LooseUnits)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_line_items_event_id")
                                .from(LineItems::Table, LineItems::EventId)
                                .to(UnloadingEvents::Table, UnloadingEvents::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_line_items_product_id")
                                .from(LineItems::Table, LineItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_line_items_event_id")
                        .table(LineItems::Table)
                        .col(LineItems::EventId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LineItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(UnloadingEvents::Table).to_owned())
                .await
        }
    }
}

mod m20241201_000004_create_attendance_tables {
    use super::{AttendanceRecords, Employees};
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241201_000004_create_attendance_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Employees::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Employees::NationalId)
                                .string_len(10)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Employees::FirstNames).string_len(100).not_null())
                        .col(ColumnDef::new(Employees::LastNames).string_len(100).not_null())
                        .col(ColumnDef::new(Employees::Position).string_len(100).not_null())
                        .col(ColumnDef::new(Employees::Phone).string_len(10).not_null())
                        .col(ColumnDef::new(Employees::Email).string_len(254).null())
                        .col(ColumnDef::new(Employees::HireDate).date().not_null())
                        .col(
                            ColumnDef::new(Employees::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Employees::RegisteredAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(AttendanceRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AttendanceRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(AttendanceRecords::EmployeeId).uuid().not_null())
                        .col(ColumnDef::new(AttendanceRecords::WorkDate).date().not_null())
                        .col(ColumnDef::new(AttendanceRecords::CheckIn).time().not_null())
                        .col(ColumnDef::new(AttendanceRecords::CheckOut).time().null())
                        .col(ColumnDef::new(AttendanceRecords::Notes).text().null())
                        .col(
                            ColumnDef::new(AttendanceRecords::RegisteredAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_attendance_records_employee_id")
                                .from(AttendanceRecords::Table, AttendanceRecords::EmployeeId)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_attendance_records_employee_date")
                        .table(AttendanceRecords::Table)
                        .col(AttendanceRecords::EmployeeId)
                        .col(AttendanceRecords::WorkDate)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AttendanceRecords::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await
        }
    }
}
