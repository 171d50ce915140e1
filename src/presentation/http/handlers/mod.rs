pub mod health;
pub mod tryon;
