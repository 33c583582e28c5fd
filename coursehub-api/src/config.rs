/// Configuration management for the API server
///
/// Configuration is read once at startup from environment variables (a `.env`
/// file is loaded first when present) into typed sections.
///
/// # Environment Variables
///
/// | Section | Variable | Default |
/// |---|---|---|
/// | api | `API_HOST` | `0.0.0.0` |
/// | api | `API_PORT` | `8080` |
/// | api | `CORS_ORIGINS` (comma separated) | `*` |
/// | api | `PRODUCTION` | `false` |
/// | database | `DATABASE_URL` | required |
/// | database | `DATABASE_MAX_CONNECTIONS` | `10` |
/// | database | `DATABASE_STATEMENT_TIMEOUT_SECONDS` | `10` |
/// | jwt | `JWT_SECRET` (at least 32 chars) | required |
/// | payments | `RAZORPAY_KEY_ID`, `RAZORPAY_KEY_SECRET`, `RAZORPAY_WEBHOOK_SECRET` | required |
/// | payments | `RAZORPAY_API_BASE` | `https://api.razorpay.com` |
/// | payments | `PAYMENT_CURRENCY` | `INR` |
/// | payments | `PAYMENT_REQUEST_TIMEOUT_SECONDS` | `10` |
/// | payments | `PAYMENT_CONFIRMATION_MODE` (`signature` or `gateway_poll`) | `signature` |
/// | entitlement | `ENTITLEMENT_ACCESS_DAYS` | `365` |
/// | storage | `AWS_BUCKET_NAME`, `AWS_BUCKET_REGION`, `AWS_ACCESS_KEY`, `AWS_SECRET_ACCESS_KEY` | required |
/// | storage | `UPLOAD_URL_TTL_SECONDS` | `60` |
/// | admin | `ADMIN_EMAILS` (comma separated) | empty |
///
/// # Example
///
/// ```no_run
/// use coursehub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use coursehub_shared::db::pool::DatabaseConfig;
use coursehub_shared::entitlement::DEFAULT_ACCESS_DAYS;
use coursehub_shared::payment::confirmation::ConfirmationMode;
use coursehub_shared::payment::orders::DEFAULT_CURRENCY;
use coursehub_shared::payment::razorpay::{RazorpayConfig, DEFAULT_API_BASE};
use coursehub_shared::uploads::{S3Settings, DEFAULT_URL_TTL};

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub payments: PaymentsConfig,
    pub entitlement: EntitlementConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Enables HSTS
    pub production: bool,
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// HS256 signing secret. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Payment gateway configuration
#[derive(Clone)]
pub struct PaymentsConfig {
    pub key_id: String,

    /// Signs client confirmations
    pub key_secret: String,

    /// Signs webhook deliveries; never equal to `key_secret`
    pub webhook_secret: String,

    pub api_base: String,
    pub currency: String,
    pub request_timeout_seconds: u64,
    pub confirmation_mode: ConfirmationMode,
}

#[derive(Debug, Clone, Copy)]
pub struct EntitlementConfig {
    pub access_days: i64,
}

/// Object storage for lesson media
#[derive(Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub access_key: String,
    pub secret_access_key: String,
    pub url_ttl_seconds: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    /// Lowercased emails allowed on `/v1/admin`
    pub emails: Vec<String>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("currency", &self.currency)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("confirmation_mode", &self.confirmation_mode)
            .finish()
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_access_key", &"[REDACTED]")
            .field("url_ttl_seconds", &self.url_ttl_seconds)
            .finish()
    }
}

impl PaymentsConfig {
    pub fn razorpay(&self) -> RazorpayConfig {
        RazorpayConfig {
            key_id: self.key_id.clone(),
            key_secret: self.key_secret.clone(),
            api_base: self.api_base.clone(),
            timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }
}

impl StorageConfig {
    pub fn s3(&self) -> S3Settings {
        S3Settings {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            access_key: self.access_key.clone(),
            secret_access_key: self.secret_access_key.clone(),
            url_ttl: Duration::from_secs(self.url_ttl_seconds),
        }
    }
}

impl AdminConfig {
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        self.emails.iter().any(|admin| *admin == email)
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or the secrets violate their constraints.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let api = ApiConfig {
            host: vars.or("API_HOST", "0.0.0.0"),
            port: vars.parse_or("API_PORT", 8080)?,
            cors_origins: split_list(&vars.or("CORS_ORIGINS", "*")),
            production: vars.parse_or("PRODUCTION", false)?,
        };

        let defaults = DatabaseConfig::default();
        let database = DatabaseConfig {
            url: vars.required("DATABASE_URL")?,
            max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            statement_timeout_seconds: vars.parse_or(
                "DATABASE_STATEMENT_TIMEOUT_SECONDS",
                defaults.statement_timeout_seconds,
            )?,
            ..defaults
        };

        let jwt = JwtConfig {
            secret: vars.required("JWT_SECRET")?,
        };
        if jwt.secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let payments = PaymentsConfig {
            key_id: vars.required("RAZORPAY_KEY_ID")?,
            key_secret: vars.required("RAZORPAY_KEY_SECRET")?,
            webhook_secret: vars.required("RAZORPAY_WEBHOOK_SECRET")?,
            api_base: vars.or("RAZORPAY_API_BASE", DEFAULT_API_BASE),
            currency: vars.or("PAYMENT_CURRENCY", DEFAULT_CURRENCY),
            request_timeout_seconds: vars.parse_or("PAYMENT_REQUEST_TIMEOUT_SECONDS", 10)?,
            confirmation_mode: match vars.get("PAYMENT_CONFIRMATION_MODE") {
                Some(raw) => ConfirmationMode::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("PAYMENT_CONFIRMATION_MODE: {}", e))?,
                None => ConfirmationMode::default(),
            },
        };
        if payments.key_secret == payments.webhook_secret {
            anyhow::bail!("RAZORPAY_WEBHOOK_SECRET must differ from RAZORPAY_KEY_SECRET");
        }

        let entitlement = EntitlementConfig {
            access_days: vars.parse_or("ENTITLEMENT_ACCESS_DAYS", DEFAULT_ACCESS_DAYS)?,
        };
        if entitlement.access_days <= 0 {
            anyhow::bail!("ENTITLEMENT_ACCESS_DAYS must be positive");
        }

        let storage = StorageConfig {
            bucket: vars.required("AWS_BUCKET_NAME")?,
            region: vars.required("AWS_BUCKET_REGION")?,
            access_key: vars.required("AWS_ACCESS_KEY")?,
            secret_access_key: vars.required("AWS_SECRET_ACCESS_KEY")?,
            url_ttl_seconds: vars.parse_or("UPLOAD_URL_TTL_SECONDS", DEFAULT_URL_TTL.as_secs())?,
        };

        let admin = AdminConfig {
            emails: split_list(&vars.or("ADMIN_EMAILS", ""))
                .into_iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        };

        Ok(Self {
            api,
            database,
            jwt,
            payments,
            entitlement,
            storage,
            admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Present and non-blank
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> anyhow::Result<String> {
        self.get(key)
            .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{} has an invalid value", key)),
            None => Ok(default),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
