//! Simulated demo store that drives the event recorder.
//!
//! Each public method corresponds to one user interaction. Page transitions
//! only happen through these calls, and every transition records a
//! `page_view` for the destination page.

use std::fmt;

use serde::Serialize;

use crate::{
    error::StorefrontError,
    session::Session,
    types::{EventProperties, EventType},
};

pub const CURRENCY: &str = "USD";
pub const UNIT_PRICE: f64 = 49.99;
pub const CATALOG: [&str; 4] = ["Classic Tee", "Urban Hoodie", "Pro Sneakers", "Cap"];
pub const FEATURED_PRODUCT: &str = "Classic Tee";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Page {
    Home,
    Products,
    ProductDetail,
    Cart,
    Checkout,
}

impl Page {
    pub fn name(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Products => "Products",
            Page::ProductDetail => "ProductDetail",
            Page::Cart => "Cart",
            Page::Checkout => "Checkout",
        }
    }

    pub fn location_hash(&self) -> String {
        format!("#/{}", self.name().to_lowercase())
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseReceipt {
    pub items: u32,
    pub value: f64,
}

/// Local UI state of the demo store. The event sequence itself lives in the
/// [`Session`] handed to each call.
#[derive(Debug)]
pub struct Storefront {
    page: Page,
    cart_count: u32,
}

impl Storefront {
    /// Land on the home page and record its page view.
    pub fn open(session: &mut Session) -> Self {
        let mut store = Self {
            page: Page::Home,
            cart_count: 0,
        };
        store.enter(session, Page::Home);
        store
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn cart_count(&self) -> u32 {
        self.cart_count
    }

    pub fn cart_total(&self) -> f64 {
        f64::from(self.cart_count) * UNIT_PRICE
    }

    pub fn navigate(&mut self, session: &mut Session, page: Page) {
        if page != self.page {
            self.enter(session, page);
        }
    }

    fn enter(&mut self, session: &mut Session, page: Page) {
        self.page = page;
        session.set_location(page.location_hash());
        session.record(
            EventType::PageView,
            page.name(),
            Some(EventProperties::new().with("title", format!("{} - Demo Store", page))),
        );
    }

    pub fn click_hero(&mut self, session: &mut Session) {
        session.record(EventType::Click, "hero_cta_clicked", None);
        self.navigate(session, Page::Products);
    }

    pub fn click_featured_collection(&mut self, session: &mut Session, collection: u32) {
        session.record(
            EventType::Click,
            format!("featured_collection_{}_clicked", collection),
            None,
        );
        self.navigate(session, Page::Products);
    }

    pub fn view_product(&mut self, session: &mut Session, product: &str) {
        session.record(
            EventType::Click,
            "product_image_click",
            Some(EventProperties::new().with("product", product)),
        );
        self.navigate(session, Page::ProductDetail);
    }

    pub fn add_to_cart(&mut self, session: &mut Session, product: &str, price: f64) {
        self.cart_count += 1;
        session.record(
            EventType::Custom,
            "add_to_cart",
            Some(
                EventProperties::new()
                    .with("product", product)
                    .with("price", price)
                    .with("currency", CURRENCY),
            ),
        );
    }

    pub fn add_to_wishlist(&mut self, session: &mut Session, product: &str) {
        session.record(
            EventType::Custom,
            "add_to_wishlist",
            Some(EventProperties::new().with("product", product)),
        );
    }

    pub fn click_related_product(&mut self, session: &mut Session, id: u32) {
        session.record(
            EventType::Click,
            "related_product_click",
            Some(EventProperties::new().with("id", id)),
        );
    }

    pub fn open_cart(&mut self, session: &mut Session) {
        session.record(EventType::Click, "nav_cart_icon", None);
        self.navigate(session, Page::Cart);
    }

    pub fn start_checkout(&mut self, session: &mut Session) {
        session.record(
            EventType::Click,
            "checkout_start",
            Some(EventProperties::new().with("cartItems", self.cart_count)),
        );
        self.navigate(session, Page::Checkout);
    }

    /// Complete the purchase. An empty cart records an `error` event and
    /// leaves the page and cart untouched.
    pub fn purchase(&mut self, session: &mut Session) -> Result<PurchaseReceipt, StorefrontError> {
        if self.cart_count == 0 {
            session.record(
                EventType::Error,
                "checkout_empty_cart",
                Some(EventProperties::new().with("message", "Attempted checkout with 0 items")),
            );
            tracing::warn!("Purchase attempted with an empty cart");
            return Err(StorefrontError::EmptyCart);
        }

        let receipt = PurchaseReceipt {
            items: self.cart_count,
            value: self.cart_total(),
        };
        session.record(
            EventType::Conversion,
            "purchase_complete",
            Some(
                EventProperties::new()
                    .with("value", receipt.value)
                    .with("items", receipt.items)
                    .with("currency", CURRENCY),
            ),
        );
        self.cart_count = 0;
        self.navigate(session, Page::Home);
        Ok(receipt)
    }
}
