//! Contains the data model of an optimization run: the problem, candidates, generations and the
//! evolution state which ties them together.

mod candidate;
pub use self::candidate::*;

mod generation;
pub use self::generation::*;

mod problem;
pub use self::problem::*;

mod state;
pub use self::state::*;
