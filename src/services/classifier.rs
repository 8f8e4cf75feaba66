use async_trait::async_trait;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

use crate::models::ClassificationResult;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response carried no candidate text")]
    MissingContent,

    #[error("invalid classification payload: {0}")]
    InvalidPayload(String),

    #[error("classifier not configured: {0}")]
    NotConfigured(String),
}

/// Turns email text into a category and a suggested reply.
#[async_trait]
pub trait EmailClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassifierError>;

    /// Whether the classifier has what it needs to reach its backend.
    fn is_configured(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str;
}

/// Builds the fixed triage prompt around the email content.
pub fn build_prompt(email_content: &str) -> String {
    format!(
        r#"Você é um assistente de IA especialista em classificar emails para uma empresa financeira.
Sua tarefa é analisar o conteúdo do email e retornar um objeto JSON com DUAS chaves:
1. "category": Classifique o email como "Produtivo" ou "Improdutivo".
   - "Produtivo": Emails que exigem uma ação, como solicitações, dúvidas sobre sistemas, atualizações de casos.
   - "Improdutivo": Emails que não exigem ação, como spam, felicitações, agradecimentos genéricos.
2. "reply": Crie uma resposta curta e profissional adequada à categoria.
   - Para emails "Produtivo", sugira uma resposta que indique que a solicitação foi recebida e será tratada.
   - Para emails "Improdutivo", sugira uma resposta curta e cordial de agradecimento.

Analise o conteúdo do email abaixo.

--- CONTEÚDO DO EMAIL ---
{}"#,
        email_content
    )
}

/// Classifies `text`, falling back to the `Erro` sentinel when the classifier fails.
///
/// The failure itself is logged but never leaks into the result.
pub async fn classify_email_and_respond(
    classifier: &dyn EmailClassifier,
    text: &str,
) -> ClassificationResult {
    let start = Instant::now();

    match classifier.classify(text).await {
        Ok(result) => {
            info!(
                category = %result.category,
                model = classifier.model_name(),
                processing_time_ms = start.elapsed().as_millis() as u64,
                "Email classified"
            );
            result
        }
        Err(e) => {
            error!(
                error = %e,
                model = classifier.model_name(),
                processing_time_ms = start.elapsed().as_millis() as u64,
                "Classification failed"
            );
            ClassificationResult::error()
        }
    }
}
