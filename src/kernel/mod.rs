//! Exact kernel functions

pub mod polynomial;
pub mod traits;

pub use self::polynomial::*;
pub use self::traits::*;
