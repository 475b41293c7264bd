pub mod evaluation;

#[macro_use]
pub mod macros;
