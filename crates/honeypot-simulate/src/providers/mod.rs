pub mod anvil;

pub use anvil::*;
