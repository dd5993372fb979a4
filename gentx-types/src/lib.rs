pub mod constants;
pub mod error;
pub mod fee;
pub mod gentx;
pub mod result;
