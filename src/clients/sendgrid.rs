//! SendGrid v3 client for transactional order-confirmation email.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

const BASE_URL: &str = "https://api.sendgrid.com/v3";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SendGrid error: {status} - {message}")]
    Api { status: u16, message: String },
}

#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    api_key: String,
    from_email: String,
    from_name: String,
    template_id: String,
}

/// Placeholder values for the confirmation template.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmationData {
    pub customer_name: String,
    pub order_id: String,
    pub quote_id: String,
    pub shipping_name: String,
    pub shipping_address_line1: String,
    pub shipping_address_line2: String,
    pub shipping_city_state_zip: String,
    pub shipping_country: String,
}

#[derive(Serialize)]
struct MailSend<'a> {
    from: EmailAddress<'a>,
    personalizations: Vec<Personalization<'a>>,
    template_id: &'a str,
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Recipient<'a>>,
    subject: String,
    dynamic_template_data: &'a OrderConfirmationData,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

impl EmailClient {
    pub fn new(
        api_key: &str,
        from_email: &str,
        from_name: &str,
        template_id: &str,
        timeout_secs: u64,
    ) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            from_name: from_name.to_string(),
            template_id: template_id.to_string(),
        })
    }

    pub async fn send_order_confirmation(
        &self,
        recipient: &str,
        data: &OrderConfirmationData,
    ) -> Result<(), EmailError> {
        let subject = format!(
            "Your HatForge Order #{} is in the queue!",
            data.order_id
        );
        let body = MailSend {
            from: EmailAddress {
                email: &self.from_email,
                name: &self.from_name,
            },
            personalizations: vec![Personalization {
                to: vec![Recipient { email: recipient }],
                subject,
                dynamic_template_data: data,
            }],
            template_id: &self.template_id,
        };

        let response = self
            .client
            .post(format!("{BASE_URL}/mail/send"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(recipient, "confirmation email sent");
        Ok(())
    }
}

impl std::fmt::Debug for EmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailClient")
            .field("from_email", &self.from_email)
            .field("template_id", &self.template_id)
            .finish_non_exhaustive()
    }
}
