pub use sea_orm_migration::prelude::*;

mod m20260801_000001_create_users;
mod m20260801_000002_create_vehicles;
mod m20260801_000003_create_trips;
mod m20260801_000004_create_reservations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_users::Migration),
            Box::new(m20260801_000002_create_vehicles::Migration),
            Box::new(m20260801_000003_create_trips::Migration),
            Box::new(m20260801_000004_create_reservations::Migration),
        ]
    }
}
