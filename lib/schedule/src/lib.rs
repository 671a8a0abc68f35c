//! Schedule domain records for quiet-sentinel.
//!
//! This crate provides:
//!
//! - **Schedule records**: Validated schedule entries and their raw storage form
//! - **Dismissal log**: Append-only record of notification dismissals
//! - **Accounts**: Subscription tiers and capability flags
//! - **Importance classifier**: Pure predicate over (schedule, now)

pub mod account;
pub mod category;
pub mod dismissal;
pub mod error;
pub mod importance;
pub mod schedule;
pub mod store;

pub use account::{Account, AccountCapabilities, SubscriptionTier};
pub use category::ScheduleCategory;
pub use dismissal::{DismissalEvent, DismissalLog, NotificationChannel};
pub use error::{AccountStoreError, DismissalLogError, InvalidScheduleData, ScheduleStoreError};
pub use importance::{ImportanceThresholds, is_important};
pub use schedule::{Schedule, ScheduleRecord};
pub use store::{AccountStore, ScheduleStore};
