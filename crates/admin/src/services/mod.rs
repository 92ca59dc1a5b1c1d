//! Business logic behind the admin routes.

pub mod cms;

pub use cms::{PgSettingsStore, SaveError, SettingsService, SettingsStore};
