pub mod adapters;
pub mod gradio;
pub mod imaging;
