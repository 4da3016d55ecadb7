pub mod logging;
pub mod signature;
