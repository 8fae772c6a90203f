pub mod address;
pub mod contract;
pub mod error;

pub use address::*;
pub use contract::*;
pub use error::*;
