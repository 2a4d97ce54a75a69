pub mod jwt;
pub mod log;
pub mod response;
