//! Core conversion logic and abstractions

pub mod aggregator;
pub mod comparison;
pub mod config;
pub mod currency;
pub mod log;
pub mod notify;
pub mod rates;
pub mod request;
pub mod sampler;
pub mod series;
pub mod trend;

// Re-export main types for cleaner imports
pub use aggregator::{Conversion, ConversionSession, convert};
pub use notify::{Notification, NotificationKind, Notifier};
pub use rates::{DateRange, RateHistoryProvider, RatePoint, RateSeries, Resolution};
pub use request::{ConversionRequest, Source};
