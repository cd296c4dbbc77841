use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::database::migrations::Migrator;

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Bring a fresh connection up to the current schema.
pub async fn setup_database(db: &DatabaseConnection) -> Result<(), DbErr> {
    Migrator::up(db, None).await
}

pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(path) if path == ":memory:" => "sqlite::memory:".to_string(),
        // mode=rwc lets the server create its own database file on first run
        Some(path) => format!("sqlite:{}?mode=rwc", path),
        None => "sqlite:jobtrail.db?mode=rwc".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_database_url() {
        assert_eq!(get_database_url(Some(":memory:")), "sqlite::memory:");
    }

    #[test]
    fn test_file_database_url() {
        assert_eq!(
            get_database_url(Some("tracker.db")),
            "sqlite:tracker.db?mode=rwc"
        );
    }

    #[test]
    fn test_default_database_url() {
        assert_eq!(get_database_url(None), "sqlite:jobtrail.db?mode=rwc");
    }
}
