pub mod generalized;

pub use generalized::*;
