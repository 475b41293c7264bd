//! This module contains helper functionality.

mod comparison;
pub use self::comparison::*;

mod error;
pub use self::error::*;

mod parallel;
pub use self::parallel::*;

mod random;
pub use self::random::*;

mod timing;
pub use self::timing::*;

/// Alias to a scalar floating type used for scores.
pub type Float = f64;
