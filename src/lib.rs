#[macro_use]
extern crate log;

pub mod formula;
pub mod prelude;
pub mod solver;
