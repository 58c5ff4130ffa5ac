use std::sync::Arc;

use crate::{
    clients::{sendgrid::EmailClient, stripe::PaymentClient},
    config::AppConfig,
    db::DbPool,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub payments: PaymentClient,
    pub mailer: EmailClient,
}
