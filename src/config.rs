use secrecy::SecretString;
use std::env;

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";

/// Product policy knobs for timing and aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct ExamPolicy {
    /// Timed practice budget, in minutes per question (rounded up overall).
    pub practice_minutes_per_item: f64,
    /// Cap each group's summed time-spent at its section duration.
    pub cap_time_at_section_duration: bool,
}

impl Default for ExamPolicy {
    fn default() -> Self {
        Self {
            practice_minutes_per_item: 1.5,
            cap_time_at_section_duration: true,
        }
    }
}

impl ExamPolicy {
    /// Time budget for a timed practice session, `ceil(items * minutes)` minutes.
    pub fn practice_time_limit_seconds(&self, item_count: usize) -> i64 {
        let minutes = (item_count as f64 * self.practice_minutes_per_item).ceil() as i64;
        minutes * 60
    }
}

/// Connection pool sizing for the attempt store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MongoPoolSettings {
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub timeout_seconds: u64,
}

impl Default for MongoPoolSettings {
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            min_pool_size: 2,
            timeout_seconds: 5,
        }
    }
}

impl MongoPoolSettings {
    fn from_env() -> Self {
        let defaults = Self::default();
        let max_pool_size = env::var("MONGO_MAX_POOL_SIZE")
            .ok()
            .and_then(|n| n.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(defaults.max_pool_size);

        Self {
            max_pool_size,
            // Never ask for more idle connections than the pool may hold.
            min_pool_size: env::var("MONGO_MIN_POOL_SIZE")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.min_pool_size)
                .min(max_pool_size),
            timeout_seconds: env::var("MONGO_TIMEOUT_SECS")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n: &u64| *n > 0)
                .unwrap_or(defaults.timeout_seconds),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub mongo: MongoPoolSettings,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub cors_allowed_origin: Option<String>,
    pub policy: ExamPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = ExamPolicy::default();

        Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "exam-sessions-local".to_string()),
            mongo: MongoPoolSettings::from_env(),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(24),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok(),
            policy: ExamPolicy {
                practice_minutes_per_item: env::var("PRACTICE_MINUTES_PER_ITEM")
                    .ok()
                    .and_then(|m| m.parse().ok())
                    .filter(|m: &f64| *m > 0.0)
                    .unwrap_or(defaults.practice_minutes_per_item),
                cap_time_at_section_duration: env::var("CAP_SECTION_TIME")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(defaults.cap_time_at_section_duration),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Validate that production-critical configuration is set
    /// Panics if required secrets are using default values
    pub fn validate_for_production(&self) {
        use secrecy::ExposeSecret;

        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            panic!(
                "FATAL: JWT_SECRET is using default value! Set JWT_SECRET environment variable to a secure random string."
            );
        }

        if jwt_secret.len() < 32 {
            panic!(
                "FATAL: JWT_SECRET is too short ({}). Must be at least 32 characters for security.",
                jwt_secret.len()
            );
        }
    }

    pub fn test_config() -> Self {
        Self {
            app_env: "test".to_string(),
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "exam-sessions-test".to_string(),
            mongo: MongoPoolSettings::default(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            cors_allowed_origin: None,
            policy: ExamPolicy::default(),
        }
    }
}
