//! Reasoner credentials and endpoint selection from the environment.

use anyhow::{Result, anyhow};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const AZURE_ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_DEPLOYMENT_VAR: &str = "AZURE_OPENAI_DEPLOYMENT";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const AZURE_API_VERSION: &str = "2024-06-01";

/// Where chat completion requests go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// OpenAI or any compatible server, bearer auth.
    OpenAi { base_url: String },
    /// Azure OpenAI deployment, `api-key` header auth.
    Azure {
        endpoint: String,
        deployment: Option<String>,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct ReasonerCredentials {
    pub api_key: String,
    pub endpoint: Endpoint,
}

impl std::fmt::Debug for ReasonerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasonerCredentials")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ReasonerCredentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`, treating blank values as unset.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = get(API_KEY_VAR)
            .ok_or_else(|| anyhow!("{API_KEY_VAR} environment variable not set"))?;
        let endpoint = match get(AZURE_ENDPOINT_VAR) {
            Some(endpoint) => Endpoint::Azure {
                endpoint,
                deployment: get(AZURE_DEPLOYMENT_VAR),
            },
            None => Endpoint::OpenAi {
                base_url: get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            },
        };
        Ok(Self { api_key, endpoint })
    }
}

impl Endpoint {
    /// Chat completions URL for `model`.
    pub fn completions_url(&self, model: &str) -> String {
        match self {
            Endpoint::OpenAi { base_url } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
            Endpoint::Azure {
                endpoint,
                deployment,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={AZURE_API_VERSION}",
                endpoint.trim_end_matches('/'),
                deployment.as_deref().unwrap_or(model),
            ),
        }
    }
}
