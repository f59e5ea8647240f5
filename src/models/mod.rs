pub mod assignment;
pub mod name_pool;
pub mod person;
pub mod registration;

pub use assignment::*;
pub use name_pool::*;
pub use person::*;
pub use registration::*;
