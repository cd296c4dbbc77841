use std::path::PathBuf;

/// Runtime configuration for the HTTP server, collected from CLI flags.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: String,
    pub upload_dir: PathBuf,
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_path: "jobtrail.db".to_string(),
            upload_dir: PathBuf::from("uploads"),
            cors_origin: None,
        }
    }
}
