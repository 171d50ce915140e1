pub mod exchange;
pub mod placeholder;
