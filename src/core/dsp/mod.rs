//! DSP primitives: window functions and the forward transform capability.

pub mod transform;
pub mod windows;

pub use transform::TransformAdapter;
pub use windows::{coherent_gain, create_window, WindowType};
