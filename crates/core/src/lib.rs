//! InsightTrack Core Library
//!
//! In-memory interaction tracking for a simulated storefront: event
//! recording, minute-bucketed aggregation, text rendering and AI-powered
//! insight reports.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod format;
pub mod insight;
pub mod provider;
pub mod session;
pub mod storefront;
pub mod types;

// Re-export commonly used items at crate root
pub use aggregate::{Stats, StatsMemo, TimelineOrder, aggregate, aggregate_in};
pub use config::Config;
pub use error::{ConfigError, InsightError, StorefrontError};
pub use format::{format_dashboard, format_event_log};
pub use insight::{CompletionBackend, HttpBackend, InsightPanel, InsightRequester};
pub use provider::{Provider, ProviderConfig};
pub use session::Session;
pub use storefront::{Page, PurchaseReceipt, Storefront};
pub use types::{EventProperties, EventType, PropertyValue, TrackedEvent};
