//! Portfolio advice from an external text-generation service.
//!
//! The advisor never fails: a missing credential, a provider error or an empty
//! answer each map to a fixed fallback message.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AdvisoryConfig;
use crate::errors::{LedgerError, Result};
use crate::portfolio::view::format_percentage;
use crate::portfolio::PortfolioSummary;

pub const MISSING_KEY_MESSAGE: &str =
    "Configura tu API_KEY en Vercel para activar el asesor inteligente.";
pub const SERVICE_BUSY_MESSAGE: &str =
    "El motor de IA está experimentando alta demanda. Intente más tarde.";
pub const EMPTY_ANSWER_MESSAGE: &str = "Análisis no disponible actualmente.";

/// outbound request to the text-generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub api_key: String,
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// transport to a text-generation service
pub trait AdvisoryClient {
    /// returns the generated text, `None` when the service answered with nothing
    fn generate(&self, request: &AdvisoryRequest) -> Result<Option<String>>;
}

/// where an advice text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdviceSource {
    Service,
    MissingCredentials,
    ServiceError,
    EmptyAnswer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub text: String,
    pub source: AdviceSource,
}

impl Advice {
    fn fallback(source: AdviceSource) -> Self {
        let text = match source {
            AdviceSource::MissingCredentials => MISSING_KEY_MESSAGE,
            AdviceSource::EmptyAnswer => EMPTY_ANSWER_MESSAGE,
            _ => SERVICE_BUSY_MESSAGE,
        };
        Self {
            text: text.to_string(),
            source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source != AdviceSource::Service
    }
}

pub struct Advisor<C: AdvisoryClient> {
    config: AdvisoryConfig,
    client: C,
}

impl<C: AdvisoryClient> Advisor<C> {
    pub fn new(config: AdvisoryConfig, client: C) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &AdvisoryConfig {
        &self.config
    }

    /// executive advice for the current portfolio, or a fallback message
    pub fn advise(&self, summary: &PortfolioSummary) -> Advice {
        match self.request_advice(summary) {
            Ok(Some(text)) => Advice {
                text,
                source: AdviceSource::Service,
            },
            Ok(None) => {
                debug!("advisory service returned an empty answer");
                Advice::fallback(AdviceSource::EmptyAnswer)
            }
            Err(LedgerError::AdvisoryUnavailable { message }) if !self.config.has_credentials() => {
                warn!(%message, "advisory credential not configured");
                Advice::fallback(AdviceSource::MissingCredentials)
            }
            Err(err) => {
                warn!(error = %err, "advisory service call failed");
                Advice::fallback(AdviceSource::ServiceError)
            }
        }
    }

    fn request_advice(&self, summary: &PortfolioSummary) -> Result<Option<String>> {
        let api_key = self
            .config
            .api_key
            .clone()
            .ok_or_else(|| LedgerError::AdvisoryUnavailable {
                message: format!("{} is not set", crate::config::API_KEY_ENV),
            })?;

        let request = AdvisoryRequest {
            api_key,
            model: self.config.model.clone(),
            prompt: build_prompt(summary),
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
        };

        debug!(model = %request.model, "requesting portfolio advice");
        let answer = self.client.generate(&request)?;
        Ok(answer.filter(|text| !text.trim().is_empty()))
    }
}

/// prompt carrying the four headline figures
pub fn build_prompt(summary: &PortfolioSummary) -> String {
    format!(
        "Actúa como un Consultor Senior de Riesgos Fintech. Analiza los siguientes datos de cartera:\n\
         - Cartera Total: {}\n\
         - Recaudo Hoy: {}\n\
         - En Mora: {}\n\
         - Eficiencia: {}\n\n\
         Proporciona 3 consejos ejecutivos breves para mejorar el recaudo hoy mismo. Responde en español.",
        summary.total_portfolio,
        summary.collected_today,
        summary.overdue,
        format_percentage(summary.efficiency),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use rust_decimal_macros::dec;
    use std::cell::Cell;

    struct FixedClient {
        answer: Option<&'static str>,
        fail: bool,
        calls: Cell<u32>,
    }

    impl FixedClient {
        fn answering(answer: Option<&'static str>) -> Self {
            Self { answer, fail: false, calls: Cell::new(0) }
        }

        fn failing() -> Self {
            Self { answer: None, fail: true, calls: Cell::new(0) }
        }
    }

    impl AdvisoryClient for FixedClient {
        fn generate(&self, request: &AdvisoryRequest) -> Result<Option<String>> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(request.api_key, "secret");
            if self.fail {
                return Err(LedgerError::AdvisoryUnavailable {
                    message: "503 from upstream".to_string(),
                });
            }
            Ok(self.answer.map(str::to_string))
        }
    }

    fn summary() -> PortfolioSummary {
        PortfolioSummary {
            total_portfolio: Money::from_major(600_000),
            collected_today: Money::from_major(25_000),
            overdue: Money::from_major(50_000),
            efficiency: dec!(84.2),
        }
    }

    fn keyed() -> AdvisoryConfig {
        AdvisoryConfig::default().with_api_key("secret")
    }

    #[test]
    fn test_service_answer() {
        let advisor = Advisor::new(keyed(), FixedClient::answering(Some("Priorice la mora.")));
        let advice = advisor.advise(&summary());
        assert_eq!(advice.source, AdviceSource::Service);
        assert_eq!(advice.text, "Priorice la mora.");
        assert!(!advice.is_fallback());
    }

    #[test]
    fn test_missing_key_skips_the_call() {
        let advisor = Advisor::new(AdvisoryConfig::default(), FixedClient::answering(Some("x")));
        let advice = advisor.advise(&summary());
        assert_eq!(advice.source, AdviceSource::MissingCredentials);
        assert_eq!(advice.text, MISSING_KEY_MESSAGE);
        assert_eq!(advisor.client.calls.get(), 0);
    }

    #[test]
    fn test_service_error_fallback() {
        let advisor = Advisor::new(keyed(), FixedClient::failing());
        let advice = advisor.advise(&summary());
        assert_eq!(advice.source, AdviceSource::ServiceError);
        assert_eq!(advice.text, SERVICE_BUSY_MESSAGE);
        assert!(advice.is_fallback());
    }

    #[test]
    fn test_blank_answer_fallback() {
        let advisor = Advisor::new(keyed(), FixedClient::answering(Some("  ")));
        assert_eq!(advisor.advise(&summary()).text, EMPTY_ANSWER_MESSAGE);

        let advisor = Advisor::new(keyed(), FixedClient::answering(None));
        assert_eq!(advisor.advise(&summary()).source, AdviceSource::EmptyAnswer);
    }

    #[test]
    fn test_prompt_carries_figures() {
        let prompt = build_prompt(&summary());
        assert!(prompt.contains("Cartera Total: 600000"));
        assert!(prompt.contains("Recaudo Hoy: 25000"));
        assert!(prompt.contains("En Mora: 50000"));
        assert!(prompt.contains("Eficiencia: 84.2%"));
    }
}
