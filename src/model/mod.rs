//! Data model for alerts, statistics, and preferences

pub mod alert;
pub mod preferences;
pub mod thresholds;

pub use alert::{AlertPoint, AlertRecord, DailyStats, GeoPoint, Severity, TrendData};
pub use preferences::{AlertPreference, LocationFilter, NotificationChannel, UserPreferences};
