//! Randomized feature maps built from count sketches

pub mod count_sketch;
pub mod fft;
pub mod sampler;

pub use self::count_sketch::*;
pub use self::fft::*;
pub use self::sampler::*;
