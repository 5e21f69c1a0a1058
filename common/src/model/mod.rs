pub mod application;
pub mod lenient;
pub mod report;
pub mod response;
