pub mod aggregate;
pub mod driver;
pub mod planner;
pub mod record;
pub mod reduce;
pub mod types;

pub use driver::*;
pub use types::*;
