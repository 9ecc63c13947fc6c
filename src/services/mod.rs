pub mod gemini;
pub mod image_converter;
pub mod text_converter;

pub use gemini::GeminiService;
