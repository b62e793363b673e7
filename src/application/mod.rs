pub mod billing;
pub mod recorder;
pub mod registrar;
pub mod reports;
pub mod requests;
