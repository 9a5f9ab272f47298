//! Ports for the Finalization Coordinator

pub mod inbound;
pub mod outbound;

pub use inbound::FinalizationApi;
pub use outbound::{DeliveryNotifier, DeliveryRepository, FinalizationNotice};
