mod component;
mod state;

pub use component::QuickJumpPopup;
pub use state::{DragState, QuickJumpModel, QuickJumpRow};
