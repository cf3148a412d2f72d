use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260801_000001_create_users::User;
use super::m20260801_000002_create_vehicles::Vehicle;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create trip status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(TripStatus::Enum)
                    .values([
                        TripStatus::Scheduled,
                        TripStatus::Full,
                        TripStatus::Cancelled,
                        TripStatus::Completed,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Trip::Table)
                    .if_not_exists()
                    .col(uuid(Trip::Id).primary_key())
                    .col(uuid(Trip::DriverId).not_null())
                    .col(uuid(Trip::VehicleId).not_null())
                    .col(string_len(Trip::Origin, 255).not_null())
                    .col(string_len(Trip::Destination, 255).not_null())
                    .col(string_null(Trip::RouteDescription))
                    .col(timestamp_with_time_zone(Trip::DepartureAt).not_null())
                    .col(integer(Trip::SeatsTotal).not_null())
                    .col(integer(Trip::SeatsAvailable).not_null())
                    .col(big_integer(Trip::PricePerSeat).not_null())
                    .col(json_binary(Trip::PickupPoints).not_null())
                    .col(double_null(Trip::DistanceKm))
                    .col(integer_null(Trip::DurationMinutes))
                    .col(
                        ColumnDef::new(Trip::Status)
                            .custom(TripStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(Trip::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_driver")
                            .from(Trip::Table, Trip::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_vehicle")
                            .from(Trip::Table, Trip::VehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trip::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TripStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Trip {
    Table,
    Id,
    DriverId,
    VehicleId,
    Origin,
    Destination,
    RouteDescription,
    DepartureAt,
    SeatsTotal,
    SeatsAvailable,
    PricePerSeat,
    PickupPoints,
    DistanceKm,
    DurationMinutes,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum TripStatus {
    #[sea_orm(iden = "trip_status")]
    Enum,
    #[sea_orm(iden = "scheduled")]
    Scheduled,
    #[sea_orm(iden = "full")]
    Full,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
    #[sea_orm(iden = "completed")]
    Completed,
}
