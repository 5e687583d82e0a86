//! Repository implementations for database operations.

pub mod alert;
pub mod garage;
pub mod notification;
pub mod plan;
pub mod points;
pub mod subscription;
pub mod user;

pub use alert::AlertRepository;
pub use garage::GarageRepository;
pub use notification::{NotificationInput, NotificationRepository};
pub use plan::PlanRepository;
pub use points::PointsRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
