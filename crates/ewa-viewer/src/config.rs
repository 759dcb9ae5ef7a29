use ewa_backend::backend::BackendClientConfig;
use ewa_document::{DocumentTransformer, HeuristicSet, TransformOptions};

use crate::error::AppError;

const DEFAULT_CACHE_SIZE: usize = 16;

/// Which column heuristics tables get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicsMode {
    Standard,
    None,
}

/// Viewer configuration loaded explicitly from environment variables.
///
/// The backend URL has no default; everything else does.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, e.g. "http://localhost:3001".
    pub api_base: String,
    /// Run the report header pre-pass.
    pub extract_header: bool,
    pub heuristics: HeuristicsMode,
    /// Number of transformed documents kept in memory.
    pub cache_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `EWA_API_BASE`: backend base URL
    ///
    /// Optional:
    /// - `EWA_EXTRACT_HEADER`: `true`/`false` (default `true`)
    /// - `EWA_TABLE_HEURISTICS`: `standard`/`none` (default `standard`)
    /// - `EWA_DOCUMENT_CACHE_SIZE`: positive integer (default 16)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let api_base = get("EWA_API_BASE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::Config("EWA_API_BASE environment variable is required".to_string())
            })?;

        let extract_header = match get("EWA_EXTRACT_HEADER") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::Config(format!("EWA_EXTRACT_HEADER must be true or false, got {raw:?}"))
            })?,
            None => true,
        };

        let heuristics = match get("EWA_TABLE_HEURISTICS").as_deref().map(str::trim) {
            None | Some("standard") => HeuristicsMode::Standard,
            Some("none") => HeuristicsMode::None,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "EWA_TABLE_HEURISTICS must be standard or none, got {other:?}"
                )))
            }
        };

        let cache_size = match get("EWA_DOCUMENT_CACHE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "EWA_DOCUMENT_CACHE_SIZE must be a positive integer, got {raw:?}"
                    ))
                })?,
            None => DEFAULT_CACHE_SIZE,
        };

        Ok(Self {
            api_base,
            extract_header,
            heuristics,
            cache_size,
        })
    }

    /// Backend client settings; retry and timeout tuning comes from `EWA_*` variables.
    pub fn backend_config(&self) -> BackendClientConfig {
        BackendClientConfig::from_env(self.api_base.as_str())
    }

    pub fn transformer(&self) -> DocumentTransformer {
        let heuristics = match self.heuristics {
            HeuristicsMode::Standard => HeuristicSet::standard(),
            HeuristicsMode::None => HeuristicSet::none(),
        };
        DocumentTransformer::new(
            TransformOptions {
                extract_header: self.extract_header,
            },
            heuristics,
        )
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
