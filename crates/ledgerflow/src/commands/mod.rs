pub mod contract;
pub mod init;
pub mod inspect;
pub mod lifecycle;
pub mod start;
