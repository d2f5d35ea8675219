// Services module: the contact endpoint and the outbound forwarders it relies on.
pub mod contact_service;
pub mod forwarder;

pub use contact_service::{router, ContactService};
pub use forwarder::{Forwarder, ForwardFuture};
