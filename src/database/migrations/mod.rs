pub use sea_orm_migration::prelude::*;

mod m20250410_000001_create_accounts;
mod m20250410_000002_create_tracker_schema;
mod m20250523_000003_create_job_leads;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250410_000001_create_accounts::Migration),
            Box::new(m20250410_000002_create_tracker_schema::Migration),
            Box::new(m20250523_000003_create_job_leads::Migration),
        ]
    }
}
