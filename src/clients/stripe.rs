//! Minimal Stripe API client covering the two calls checkout needs:
//! tax calculations and payment intents.
//!
//! Stripe speaks `application/x-www-form-urlencoded` with bracketed keys for
//! nested fields, so requests are built as flat key/value parameter lists.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const BASE_URL: &str = "https://api.stripe.com/v1";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl PaymentError {
    /// A forced payment method type that is not activated on the account.
    /// The caller retries once without forcing types.
    pub fn is_payment_method_config_error(&self) -> bool {
        match self {
            PaymentError::Api { message, .. } => {
                message.contains("payment method type")
                    || message.contains("is not activated for your account")
                    || message.contains("Invalid payment_method_types")
            }
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct TaxAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct TaxLineItem {
    /// Per-unit amount in cents.
    pub amount: i64,
    pub quantity: i64,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct TaxCalculationInput {
    pub currency: String,
    pub address: TaxAddress,
    pub line_items: Vec<TaxLineItem>,
    pub shipping_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct TaxCalculation {
    pub id: String,
    pub amount_total: Option<i64>,
    pub amount_tax: Option<i64>,
    pub shipping_cost: Option<TaxShippingCost>,
    pub tax_breakdown: Option<Vec<TaxBreakdownEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct TaxShippingCost {
    pub amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TaxBreakdownEntry {
    pub amount: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct IntentShipping {
    pub name: String,
    pub phone: Option<String>,
    pub address: TaxAddress,
}

#[derive(Debug, Clone)]
pub struct PaymentIntentParams {
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub metadata: Vec<(String, String)>,
    pub shipping: Option<IntentShipping>,
    pub payment_method_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: Option<StripeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl PaymentClient {
    pub fn new(secret_key: &str, timeout_secs: u64) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            secret_key: secret_key.to_string(),
            base_url: BASE_URL.to_string(),
        })
    }

    pub async fn create_tax_calculation(
        &self,
        input: &TaxCalculationInput,
    ) -> Result<TaxCalculation, PaymentError> {
        let params = tax_calculation_params(input);
        self.post_form("/tax/calculations", &params).await
    }

    pub async fn create_payment_intent(
        &self,
        params: &PaymentIntentParams,
    ) -> Result<PaymentIntent, PaymentError> {
        let form = payment_intent_params(params);
        self.post_form("/payment_intents", &form).await
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, PaymentError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| PaymentError::Parse(format!("Failed to parse response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .unwrap_or(body);

        Err(PaymentError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl std::fmt::Debug for PaymentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentClient").finish_non_exhaustive()
    }
}

fn push_address(params: &mut Vec<(String, String)>, prefix: &str, address: &TaxAddress) {
    params.push((format!("{prefix}[line1]"), address.line1.clone()));
    if let Some(line2) = &address.line2 {
        params.push((format!("{prefix}[line2]"), line2.clone()));
    }
    params.push((format!("{prefix}[city]"), address.city.clone()));
    params.push((format!("{prefix}[state]"), address.state.clone()));
    params.push((format!("{prefix}[postal_code]"), address.postal_code.clone()));
    params.push((format!("{prefix}[country]"), address.country.clone()));
}

fn tax_calculation_params(input: &TaxCalculationInput) -> Vec<(String, String)> {
    let mut params = vec![("currency".to_string(), input.currency.clone())];
    push_address(
        &mut params,
        "customer_details[address]",
        &input.address,
    );
    params.push((
        "customer_details[address_source]".to_string(),
        "shipping".to_string(),
    ));

    for (i, item) in input.line_items.iter().enumerate() {
        params.push((format!("line_items[{i}][amount]"), item.amount.to_string()));
        params.push((
            format!("line_items[{i}][quantity]"),
            item.quantity.to_string(),
        ));
        params.push((
            format!("line_items[{i}][reference]"),
            item.reference.clone(),
        ));
    }

    params.push((
        "shipping_cost[amount]".to_string(),
        input.shipping_cents.to_string(),
    ));
    params
}

fn payment_intent_params(input: &PaymentIntentParams) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), input.amount.to_string()),
        ("currency".to_string(), input.currency.clone()),
        ("description".to_string(), input.description.clone()),
    ];

    for (key, value) in &input.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }

    if let Some(shipping) = &input.shipping {
        params.push(("shipping[name]".to_string(), shipping.name.clone()));
        if let Some(phone) = &shipping.phone {
            params.push(("shipping[phone]".to_string(), phone.clone()));
        }
        push_address(&mut params, "shipping[address]", &shipping.address);
    }

    if let Some(types) = &input.payment_method_types {
        for (i, t) in types.iter().enumerate() {
            params.push((format!("payment_method_types[{i}]"), t.clone()));
        }
    }

    params
}
