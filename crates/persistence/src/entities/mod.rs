//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod alert;
pub mod garage;
pub mod notification;
pub mod plan;
pub mod points;
pub mod subscription;
pub mod user;

pub use alert::AlertEntity;
pub use garage::GarageEntity;
pub use notification::NotificationEntity;
pub use plan::PlanEntity;
pub use points::PointsRecordEntity;
pub use subscription::SubscriptionEntity;
pub use user::UserProfileEntity;
