use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    /// Directory the mailbox sync pulls new messages from. Unset means the
    /// sync endpoint reports a configuration error.
    pub mail_drop_dir: Option<PathBuf>,
    /// The original system listed every user's leads on GET /api/leads.
    /// Flip this to scope the listing to the requesting user.
    pub lead_listing_scoped: bool,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub server: String,
    pub port: u32,
    pub database: String,
    pub url_override: Option<String>,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub session_ttl_days: i64,
    pub api_key_ttl_days: i64,
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env_str("SERVER_HOST", "0.0.0.0"),
                port: env_parse("SERVER_PORT", 8080),
            },
            database: DatabaseConfig {
                username: env_str("DB_USER", "crm"),
                password: env_str("DB_PASSWORD", ""),
                server: env_str("DB_HOST", "localhost"),
                port: env_parse("DB_PORT", 5432),
                database: env_str("DB_NAME", "crmserver"),
                url_override: std::env::var("DATABASE_URL").ok(),
            },
            security: SecurityConfig {
                session_ttl_days: env_parse("SESSION_TTL_DAYS", 7),
                api_key_ttl_days: env_parse("API_KEY_TTL_DAYS", 30),
            },
            mail_drop_dir: std::env::var("MAIL_DROP_DIR").ok().map(PathBuf::from),
            lead_listing_scoped: env_bool("LEAD_LISTING_SCOPED", false),
        }
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database.url_override {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.database.username,
            self.database.password,
            self.database.server,
            self.database.port,
            self.database.database
        )
    }
}
