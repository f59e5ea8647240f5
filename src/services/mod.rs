pub mod assignment_service;

pub use assignment_service::*;
