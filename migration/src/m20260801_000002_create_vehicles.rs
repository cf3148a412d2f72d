use sea_orm_migration::{prelude::*, schema::*};

use super::m20260801_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(uuid(Vehicle::OwnerId).not_null())
                    .col(string_len(Vehicle::Plate, 10).not_null().unique_key())
                    .col(string_len(Vehicle::Brand, 100).not_null())
                    .col(string_len(Vehicle::Model, 100).not_null())
                    .col(integer(Vehicle::Capacity).not_null())
                    .col(string_null(Vehicle::VehiclePhotoUrl))
                    .col(string_null(Vehicle::SoatPhotoUrl))
                    .col(timestamp_with_time_zone(Vehicle::SoatExpiration).not_null())
                    .col(string_len(Vehicle::LicenseNumber, 50).not_null())
                    .col(timestamp_with_time_zone(Vehicle::LicenseExpiration).not_null())
                    .col(
                        timestamp_with_time_zone(Vehicle::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_owner")
                            .from(Vehicle::Table, Vehicle::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Vehicle {
    Table,
    Id,
    OwnerId,
    Plate,
    Brand,
    Model,
    Capacity,
    VehiclePhotoUrl,
    SoatPhotoUrl,
    SoatExpiration,
    LicenseNumber,
    LicenseExpiration,
    CreatedAt,
}
