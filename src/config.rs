use std::env;

/// Process configuration, read once at startup and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    pub stripe_secret_key: String,
    pub sendgrid_api_key: String,
    pub email_from: String,
    pub email_from_name: String,
    pub confirmation_template_id: String,
    pub shipping_standard_cents: i64,
    pub shipping_expedited_cents: i64,
    /// Force specific Stripe payment method types, e.g. "card,link,cashapp".
    pub payment_method_types: Option<Vec<String>>,
    /// Timeout applied to every outbound Stripe/SendGrid call.
    pub external_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(5050);

        let jwt_secret = env::var("JWT_SECRET")?;
        let admin_username = env::var("ADMIN_USERNAME")?;
        let admin_password = env::var("ADMIN_PASSWORD")?;
        let stripe_secret_key = env::var("STRIPE_SECRET_KEY")?;
        let sendgrid_api_key = env::var("SENDGRID_API_KEY")?;

        let email_from = env::var("EMAIL_FROM")?;
        let email_from_name =
            env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "HatForge".to_string());
        let confirmation_template_id = env::var("SENDGRID_CONFIRMATION_TEMPLATE_ID")?;

        let shipping_standard_cents = env_i64("SHIPPING_STANDARD_CENTS", 699);
        let shipping_expedited_cents = env_i64("SHIPPING_EXPEDITED_CENTS", 1599);

        let payment_method_types = env::var("PAYMENT_METHOD_TYPES")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty());

        let external_timeout_secs = env::var("EXTERNAL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            admin_username,
            admin_password,
            stripe_secret_key,
            sendgrid_api_key,
            email_from,
            email_from_name,
            confirmation_template_id,
            shipping_standard_cents,
            shipping_expedited_cents,
            payment_method_types,
            external_timeout_secs,
        })
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}
