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
        auth::{
            AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest,
            UpdateProfileRequest,
        },
        cart::{AddToCartRequest, UpdateCartItemRequest},
        contacts::{CreateContactRequest, UpdateContactRequest},
        orders::{CreateOrderRequest, UpdateOrderRequest},
        products::{CreateProductRequest, UpdateProductRequest},
    },
    models::{
        Cart, CartItem, Contact, ContactStatus, Material, Order, OrderCustomer, OrderItem,
        OrderStatus, PaymentMethod, Product, ProductType, PublicUser, Role, UserProfile,
    },
    response::Empty,
    routes::{auth, cart, contacts, health, orders, products},
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
    info(title = "Art Heaven API", description = "Handcrafted pottery storefront"),
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        auth::update_profile,
        auth::change_password,
        auth::list_users,
        auth::delete_user,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        contacts::create_contact,
        contacts::list_contacts,
        contacts::get_contact,
        contacts::update_contact,
        contacts::delete_contact
    ),
    components(
        schemas(
            Role,
            ProductType,
            Material,
            PaymentMethod,
            OrderStatus,
            ContactStatus,
            PublicUser,
            UserProfile,
            Product,
            Cart,
            CartItem,
            Order,
            OrderItem,
            OrderCustomer,
            Contact,
            Empty,
            health::HealthData,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UpdateProfileRequest,
            ChangePasswordRequest,
            CreateProductRequest,
            UpdateProductRequest,
            AddToCartRequest,
            UpdateCartItemRequest,
            CreateOrderRequest,
            UpdateOrderRequest,
            CreateContactRequest,
            UpdateContactRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, sessions and user management"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Per-user shopping cart"),
        (name = "Orders", description = "Order placement and lifecycle"),
        (name = "Contacts", description = "Contact form messages"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/login",
            "/api/auth/users/{id}",
            "/api/products/{id}",
            "/api/cart/{item_id}",
            "/api/orders",
            "/api/contacts/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
