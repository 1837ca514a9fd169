use crate::app_config::{AppConfig, EmbedProvider, Environment, ScorerEngine};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        match raw.parse::<usize>() {
            Ok(0) => Err(invalid(var, "must be at least 1".to_string())),
            Ok(n) => Ok(n),
            Err(e) => Err(invalid(var, e.to_string())),
        }
    };

    let parse_flag = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("REVDASH_ENV", "development"))?;

    let bind_addr = parse_addr("REVDASH_BIND_ADDR", "0.0.0.0:5000")?;
    let log_level = or_default("REVDASH_LOG_LEVEL", "info");
    let data_path = PathBuf::from(or_default("REVDASH_DATA_PATH", "./reviews.csv"));
    let initial_load_count = parse_positive("REVDASH_INITIAL_LOAD", "10000")?;
    let reload_batch_size = parse_positive("REVDASH_RELOAD_BATCH_SIZE", "500")?;

    let scorer = parse_scorer(&or_default("REVDASH_SCORER", "lexicon"))?;
    let scorer_concurrency = parse_positive("REVDASH_SCORER_CONCURRENCY", "8")?;

    let tei_url = lookup("REVDASH_TEI_URL").ok().filter(|s| !s.trim().is_empty());
    // Unset provider: TEI when a URL is configured, otherwise embeddings are off.
    let embed_provider = match lookup("REVDASH_EMBED_PROVIDER") {
        Ok(raw) => parse_embed_provider(&raw)?,
        Err(_) if tei_url.is_some() => EmbedProvider::Tei,
        Err(_) => EmbedProvider::None,
    };
    let openai_api_key = lookup("OPENAI_API_KEY").ok().filter(|s| !s.trim().is_empty());
    let openai_base_url = or_default("REVDASH_OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_model = or_default("REVDASH_OPENAI_MODEL", "text-embedding-3-small");

    match embed_provider {
        EmbedProvider::Tei if tei_url.is_none() => {
            return Err(ConfigError::MissingEnvVar("REVDASH_TEI_URL".to_string()));
        }
        EmbedProvider::OpenAi if openai_api_key.is_none() => {
            return Err(ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()));
        }
        _ => {}
    }

    let embed_timeout_secs = parse_u64("REVDASH_EMBED_TIMEOUT_SECS", "30")?;
    let embed_concurrency = parse_positive("REVDASH_EMBED_CONCURRENCY", "4")?;
    let embedding_cache_path = PathBuf::from(or_default(
        "REVDASH_EMBEDDING_CACHE_PATH",
        "./embeddings_cache.json",
    ));
    let build_embeddings_on_start = parse_flag("REVDASH_BUILD_EMBEDDINGS_ON_START", "false")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        data_path,
        initial_load_count,
        reload_batch_size,
        scorer,
        scorer_concurrency,
        embed_provider,
        tei_url,
        openai_api_key,
        openai_base_url,
        openai_model,
        embed_timeout_secs,
        embed_concurrency,
        embedding_cache_path,
        build_embeddings_on_start,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVDASH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_scorer(s: &str) -> Result<ScorerEngine, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "lexicon" => Ok(ScorerEngine::Lexicon),
        "compound" => Ok(ScorerEngine::Compound),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVDASH_SCORER".to_string(),
            reason: format!("expected 'lexicon' or 'compound', got '{other}'"),
        }),
    }
}

fn parse_embed_provider(s: &str) -> Result<EmbedProvider, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "tei" => Ok(EmbedProvider::Tei),
        "openai" => Ok(EmbedProvider::OpenAi),
        "none" => Ok(EmbedProvider::None),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVDASH_EMBED_PROVIDER".to_string(),
            reason: format!("expected 'tei', 'openai' or 'none', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
