pub mod error;
pub mod overlay;
pub mod placement;
pub mod render;
pub mod replay;
pub mod session;
pub mod shapes;
pub mod tracking;
