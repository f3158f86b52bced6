pub mod attendance;
pub mod employee;
pub mod health_status;
pub mod project;
