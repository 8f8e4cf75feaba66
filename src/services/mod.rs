pub mod classifier;
pub mod file_validator;
pub mod gemini;
pub mod mime_sniffer;
pub mod text_extractor;

pub use classifier::{classify_email_and_respond, ClassifierError, EmailClassifier};
pub use gemini::GeminiClassifier;
