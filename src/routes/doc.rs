use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{AdminOrder, AdminOrderItem, AdminOrderList},
        auth::{
            AdminLoginRequest, AdminLoginResponse, AuthResponse, LoginRequest, RegisterRequest,
            UserSummary,
        },
        checkout::{CreateIntentRequest, CreateIntentResponse, IntentBreakdown, IntentLineItem},
        orders::{
            AssetEntry, AttachQuoteRequest, AttachQuoteResponse, Breakdown, CartRawEntry,
            CreateOrderRequest, CreateOrderResponse, OrderSummary, SendConfirmationRequest,
            ShippingInfo, SummaryItem, UploadAssetsRequest, UploadAssetsResponse,
            ViewScreenshots,
        },
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, checkout, health, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        admin::login,
        admin::list_all_orders,
        orders::create_order,
        orders::upload_assets,
        orders::attach_quote,
        orders::download_quote,
        orders::send_confirmation,
        checkout::create_intent,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AdminLoginRequest,
            AuthResponse,
            AdminLoginResponse,
            UserSummary,
            CreateOrderRequest,
            OrderSummary,
            SummaryItem,
            CartRawEntry,
            ShippingInfo,
            Breakdown,
            CreateOrderResponse,
            UploadAssetsRequest,
            AssetEntry,
            ViewScreenshots,
            UploadAssetsResponse,
            AttachQuoteRequest,
            AttachQuoteResponse,
            SendConfirmationRequest,
            CreateIntentRequest,
            CreateIntentResponse,
            IntentBreakdown,
            IntentLineItem,
            AdminOrder,
            AdminOrderItem,
            AdminOrderList,
            params::AdminOrderQuery,
            health::HealthData,
            Meta,
            ApiResponse<AuthResponse>,
            ApiResponse<AdminLoginResponse>,
            ApiResponse<CreateOrderResponse>,
            ApiResponse<UploadAssetsResponse>,
            ApiResponse<CreateIntentResponse>,
            ApiResponse<AdminOrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Customer registration and login"),
        (name = "Admin", description = "Admin login and order overview"),
        (name = "Orders", description = "Order creation, assets, quote PDF and confirmation email"),
        (name = "Checkout", description = "Tax calculation and payment intents"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
