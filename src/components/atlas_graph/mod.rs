mod component;
mod render;
mod state;

pub use component::AtlasCanvas;
pub use state::Selection;
