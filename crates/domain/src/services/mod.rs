//! Domain services for SOS dispatch.
//!
//! Services contain business logic that operates on domain models.

pub mod dispatch;
pub mod entitlement;
pub mod memory;
pub mod notification;
pub mod store;
pub mod transition;
pub mod visibility;

pub use dispatch::{AlertCreated, DispatchService, DispatchSettings, StatusUpdated};
pub use entitlement::{resolve_entitlement, Resolution, ResolvedEntitlement};
pub use memory::InMemoryStore;
pub use notification::{
    DispatchEvent, DispatchEventType, NotificationError, NotificationSink,
    RecordingNotificationSink, SentNotification,
};
pub use store::{
    AccountDirectory, AlertStore, DispatchStores, EntitlementStore, PlanCatalog,
    ResponderDirectory, RewardsLedger, StoreError, Transition,
};
pub use transition::plan_transition;
pub use visibility::listing_filter;
