use crate::{
    clients::stripe::{
        IntentShipping, PaymentIntentParams, TaxAddress, TaxCalculation, TaxCalculationInput,
        TaxLineItem,
    },
    dto::checkout::{CreateIntentRequest, CreateIntentResponse, IntentBreakdown, IntentLineItem},
    error::{AppError, AppResult},
    money::{cents_from_dollars, format_usd},
    response::{ApiResponse, Meta},
    state::AppState,
};

const METADATA_ITEMS_MAX_LEN: usize = 4500;

struct LeanItem {
    id: String,
    hat_type: String,
    color: String,
    qty: i64,
    unit_cents: i64,
    line_cents: i64,
}

/// Price the order, let Stripe Tax figure out the tax, then open a payment
/// intent for the resulting total.
pub async fn create_intent(
    state: &AppState,
    payload: CreateIntentRequest,
) -> AppResult<ApiResponse<CreateIntentResponse>> {
    let CreateIntentRequest {
        order_summary,
        shipping,
    } = payload;

    if order_summary.items.is_empty() {
        return Err(AppError::BadRequest("No items in order.".into()));
    }

    let (Some(address1), Some(city), Some(st), Some(postal)) = (
        shipping.address1.clone().filter(|s| !s.trim().is_empty()),
        shipping.city.clone().filter(|s| !s.trim().is_empty()),
        shipping.state.clone().filter(|s| !s.trim().is_empty()),
        shipping
            .postal_code
            .clone()
            .filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Shipping address incomplete for tax.".into(),
        ));
    };

    // Subtotal comes from our own item math, never from the client's breakdown.
    let items: Vec<LeanItem> = order_summary
        .items
        .iter()
        .map(|it| {
            let qty = it.quantity.filter(|q| *q > 0).unwrap_or(1);
            let unit_cents = cents_from_dollars(it.unit_price.unwrap_or(0.0));
            LeanItem {
                id: it.id.clone().unwrap_or_default(),
                hat_type: it.hat_type.clone().unwrap_or_else(|| "Hat".to_string()),
                color: it.hat_color.clone().unwrap_or_default(),
                qty,
                unit_cents,
                line_cents: unit_cents * qty,
            }
        })
        .collect();

    let subtotal_cents: i64 = items.iter().map(|it| it.line_cents).sum();

    let shipping_cents = if shipping.delivery_method.as_deref() == Some("expedited") {
        state.config.shipping_expedited_cents
    } else {
        state.config.shipping_standard_cents
    };

    let address = TaxAddress {
        line1: address1,
        line2: shipping.address2.clone().filter(|s| !s.trim().is_empty()),
        city,
        state: st,
        postal_code: postal,
        country: normalize_country(shipping.country.as_deref()),
    };

    let calculation = state
        .payments
        .create_tax_calculation(&TaxCalculationInput {
            currency: "usd".to_string(),
            address: address.clone(),
            line_items: items
                .iter()
                .map(|it| TaxLineItem {
                    amount: it.unit_cents,
                    quantity: it.qty,
                    reference: it.id.clone(),
                })
                .collect(),
            shipping_cents,
        })
        .await?;

    let calc_shipping_cents = calculation
        .shipping_cost
        .as_ref()
        .and_then(|s| s.amount)
        .unwrap_or(shipping_cents);
    let total_cents = calculation
        .amount_total
        .unwrap_or(subtotal_cents + calc_shipping_cents);
    let tax_cents = extract_tax(&calculation, subtotal_cents, calc_shipping_cents, total_cents);

    tracing::debug!(
        subtotal_cents,
        calc_shipping_cents,
        tax_cents,
        total_cents,
        calculation_id = %calculation.id,
        "tax calculation resolved"
    );

    let order_items_meta = serde_json::to_string(
        &items
            .iter()
            .map(|it| serde_json::json!({ "id": it.id, "qty": it.qty }))
            .collect::<Vec<_>>(),
    )
    .unwrap_or_default();
    let order_items_meta: String = order_items_meta
        .chars()
        .take(METADATA_ITEMS_MAX_LEN)
        .collect();

    let mut params = PaymentIntentParams {
        amount: total_cents,
        currency: "usd".to_string(),
        description: format!(
            "Hat order ({} item{})",
            items.len(),
            if items.len() > 1 { "s" } else { "" }
        ),
        metadata: vec![
            ("tax_calculation_id".to_string(), calculation.id.clone()),
            ("order_items".to_string(), order_items_meta),
        ],
        shipping: shipping
            .full_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .map(|name| IntentShipping {
                name,
                phone: shipping.phone.clone().filter(|s| !s.trim().is_empty()),
                address: address.clone(),
            }),
        payment_method_types: state.config.payment_method_types.clone(),
    };

    let intent = match state.payments.create_payment_intent(&params).await {
        Ok(intent) => intent,
        // A forced payment method type the account has not activated: retry
        // once letting Stripe pick the types.
        Err(err)
            if err.is_payment_method_config_error() && params.payment_method_types.is_some() =>
        {
            tracing::warn!(error = %err, "retrying payment intent without forced method types");
            params.payment_method_types = None;
            state.payments.create_payment_intent(&params).await?
        }
        Err(err) => return Err(err.into()),
    };

    let client_secret = intent
        .client_secret
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("payment intent has no client secret")))?;

    let breakdown = IntentBreakdown {
        items: items
            .iter()
            .map(|it| IntentLineItem {
                id: it.id.clone(),
                title: format!("{} Hat", it.hat_type),
                color: it.color.clone(),
                qty: it.qty,
                unit: format_usd(it.unit_cents),
                line_total: format_usd(it.line_cents),
            })
            .collect(),
        subtotal: format_usd(subtotal_cents),
        shipping: format_usd(calc_shipping_cents),
        tax: format_usd(tax_cents),
        total: format_usd(total_cents),
    };

    Ok(ApiResponse::success(
        "Payment intent created",
        CreateIntentResponse {
            client_secret,
            breakdown,
        },
        Some(Meta::empty()),
    ))
}

/// Tax amount with fallbacks for older calculation API shapes: explicit field,
/// then the breakdown sum, then total minus subtotal minus shipping.
fn extract_tax(
    calculation: &TaxCalculation,
    subtotal_cents: i64,
    shipping_cents: i64,
    total_cents: i64,
) -> i64 {
    if let Some(tax) = calculation.amount_tax {
        return tax;
    }
    if let Some(breakdown) = &calculation.tax_breakdown
        && !breakdown.is_empty()
    {
        return breakdown.iter().map(|row| row.amount.unwrap_or(0)).sum();
    }
    (total_cents - subtotal_cents - shipping_cents).max(0)
}

/// Two-letter uppercase country code; "United States" and empty map to US.
fn normalize_country(input: Option<&str>) -> String {
    let Some(v) = input.map(str::trim).filter(|v| !v.is_empty()) else {
        return "US".to_string();
    };
    if v.len() == 2 {
        return v.to_ascii_uppercase();
    }
    if v.eq_ignore_ascii_case("united states") {
        return "US".to_string();
    }
    v.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::stripe::{TaxBreakdownEntry, TaxShippingCost};

    fn calc(
        amount_tax: Option<i64>,
        breakdown: Option<Vec<i64>>,
        amount_total: Option<i64>,
    ) -> TaxCalculation {
        TaxCalculation {
            id: "taxcalc_test".into(),
            amount_total,
            amount_tax,
            shipping_cost: Some(TaxShippingCost { amount: Some(699) }),
            tax_breakdown: breakdown.map(|rows| {
                rows.into_iter()
                    .map(|amount| TaxBreakdownEntry {
                        amount: Some(amount),
                    })
                    .collect()
            }),
        }
    }

    #[test]
    fn explicit_tax_field_wins() {
        let c = calc(Some(512), Some(vec![100, 200]), Some(7207));
        assert_eq!(extract_tax(&c, 5996, 699, 7207), 512);
    }

    #[test]
    fn breakdown_sum_is_second_choice() {
        let c = calc(None, Some(vec![100, 200]), Some(7207));
        assert_eq!(extract_tax(&c, 5996, 699, 7207), 300);
    }

    #[test]
    fn difference_fallback_never_goes_negative() {
        let c = calc(None, None, Some(7207));
        assert_eq!(extract_tax(&c, 5996, 699, 7207), 512);

        let c = calc(None, Some(vec![]), Some(6000));
        assert_eq!(extract_tax(&c, 5996, 699, 6000), 0);
    }

    #[test]
    fn country_normalization() {
        assert_eq!(normalize_country(None), "US");
        assert_eq!(normalize_country(Some("  ")), "US");
        assert_eq!(normalize_country(Some("us")), "US");
        assert_eq!(normalize_country(Some("United States")), "US");
        assert_eq!(normalize_country(Some("Canada")), "Canada");
        assert_eq!(normalize_country(Some("ca")), "CA");
    }
}
