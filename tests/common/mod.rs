pub mod builders;
pub mod fake_driver;
pub mod strategies;

pub use builders::*;
pub use fake_driver::*;
