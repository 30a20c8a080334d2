//! Network and broker session management.
//!
//! [`link`] defines the [`BrokerLink`](link::BrokerLink) capability the
//! transport must provide; the wire protocol behind it is out of scope here.
//! [`connectivity`] owns the association/session state machine and decides
//! when the node is allowed to publish. [`sim`] is an in-process transport so
//! the node runs end-to-end without a radio or broker.

pub mod connectivity;
pub mod link;
pub mod sim;

pub use connectivity::{ConnectionState, ConnectivityManager};
pub use link::{BrokerLink, Credentials, InboundMessage};
pub use sim::SimulatedLink;
