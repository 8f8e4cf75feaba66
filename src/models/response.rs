use serde::{Deserialize, Serialize};
use std::fmt;

pub const CLASSIFICATION_ERROR_REPLY: &str =
    "Não foi possível processar o email no momento. Tente novamente.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Produtivo,
    Improdutivo,
    /// Produced locally when the classifier fails; never expected from the model.
    Erro,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Produtivo => "Produtivo",
            Category::Improdutivo => "Improdutivo",
            Category::Erro => "Erro",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub reply: String,
}

impl ClassificationResult {
    pub fn new(category: Category, reply: impl Into<String>) -> Self {
        Self {
            category,
            reply: reply.into(),
        }
    }

    /// The sentinel returned when the classifier could not be reached or answered garbage.
    pub fn error() -> Self {
        Self::new(Category::Erro, CLASSIFICATION_ERROR_REPLY)
    }

    pub fn is_error(&self) -> bool {
        self.category == Category::Erro
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub model: String,
    pub classifier_configured: bool,
    pub uptime_seconds: u64,
}
