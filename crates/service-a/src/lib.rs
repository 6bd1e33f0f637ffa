pub mod error;
pub mod liveness;
pub mod price;
pub mod worker;

pub use error::{PriceError, Result};
