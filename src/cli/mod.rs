//! CLI command implementations

pub mod graduation;
pub mod init;
pub mod learner;
pub mod resolve;
pub mod validate;
