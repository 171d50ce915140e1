pub mod connection;
pub mod dispatch_tryon;
