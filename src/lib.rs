pub mod backend;
pub mod driver;
pub mod error;
pub mod logger;
pub mod options;
