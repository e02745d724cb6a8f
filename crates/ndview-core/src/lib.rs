pub mod color;
pub mod config;
pub mod consts;
pub mod error;
pub mod overlay;
pub mod process;
pub mod render;
pub mod sched;
pub mod source;
mod sync;
pub mod view;
pub mod viewer;
