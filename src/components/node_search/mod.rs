mod component;

pub use component::NodeSearchDialog;
