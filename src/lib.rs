//! MailSense email classifier service
//!
//! Accepts an email as raw text or as an uploaded TXT/PDF file, extracts its
//! text and asks a Gemini model whether it is productive, together with a
//! suggested reply.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::create_router;
pub use state::AppState;
