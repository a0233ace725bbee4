use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub openai_api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub tavily_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub s3_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub mode: String,
    pub max_jwt_expiration: i64,
}

/// Knobs for the report workflow itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Caps total plan/fan-out steps so a runaway plan cannot spawn
    /// unbounded work.
    pub recursion_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            llm: LLMConfig {
                openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                model: env::var("REPORT_LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            },
            search: SearchConfig {
                tavily_api_key: env::var("TAVILY_API_KEY").unwrap_or_default(),
            },
            storage: StorageConfig {
                s3_bucket: env::var("S3_BUCKET")
                    .unwrap_or_else(|_| "reportforge-reports".to_string()),
                s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                s3_access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
                s3_secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
                s3_endpoint: env::var("S3_ENDPOINT").ok(),
            },
            auth: AuthConfig {
                secret: env::var("REPORTFORGE_SECRET").unwrap_or_default(),
                mode: env::var("AUTH_MODE").unwrap_or_else(|_| "none".to_string()),
                max_jwt_expiration: env::var("MAX_JWT_EXPIRATION")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()?,
            },
            report: ReportConfig {
                recursion_limit: env::var("REPORT_RECURSION_LIMIT")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()?,
            },
        })
    }
}
