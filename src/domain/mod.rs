pub mod commission;
pub mod ids;
pub mod meeting;
pub mod money;
pub mod payment;
pub mod ports;
pub mod roster;
pub mod session;
