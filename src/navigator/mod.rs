//! Geometry, connection lookup and history: the host-independent core.

pub mod anchor;
pub mod connections;
pub mod coords;
pub mod history;
pub mod search;
pub mod slots;

pub use connections::{PortConnections, resolve, resolve_all};
pub use coords::{MapError, OffsetConvention, PointerSample, ViewState};
pub use history::NavigationHistory;
pub use slots::{SlotAnchor, SlotLocator};
