//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use http::HeaderMap;
use http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use url::Url;

use crate::apply::RetryPolicy;
use crate::coupling::{CoupledGroup, CouplingTable};
use crate::plan::{CoupledPacking, FreeOrder, PlannerPolicy};

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::paths::expand_tilde;
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Control plane base URL. Only required by commands that reach it.
    pub endpoint: Option<Url>,

    /// HTTP headers sent with every control plane request
    pub headers: HeaderMap,

    /// Per-call timeout
    pub timeout: Duration,

    /// Chunk planner tunables
    pub planner: PlannerPolicy,

    /// Retry policy for transient remote failures
    pub retry_policy: RetryPolicy,

    /// Coupling knowledge base
    pub coupling: CouplingTable,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let endpoint = self
            .endpoint
            .as_ref()
            .map_or_else(|| "none".to_string(), ToString::to_string);

        write!(
            f,
            "Config {{ endpoint: {}, timeout: {}s, max_chunk_size: {}, coupled_packing: {}, \
             free_order: {}, retry: {}x/{}ms, coupling: {} default group(s) + {} family(ies) }}",
            endpoint,
            self.timeout.as_secs(),
            self.planner.max_chunk_size,
            self.planner.coupled_packing,
            self.planner.free_order,
            self.retry_policy.max_attempts,
            self.retry_policy.initial_delay.as_millis(),
            self.coupling.common().len(),
            self.coupling.family_count(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values, which take
    /// precedence over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The endpoint is not a valid URL
    /// - A header is malformed
    /// - The timeout or chunk size is zero
    /// - The retry settings are inconsistent
    /// - A planner choice or coupling group is invalid
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let endpoint = Self::resolve_endpoint(cli, toml)?;
        let headers = Self::resolve_headers(cli, toml)?;
        let timeout = Self::resolve_timeout(cli, toml)?;
        let planner = Self::build_planner_policy(cli, toml)?;
        let retry_policy = Self::build_retry_policy(cli, toml)?;
        let coupling = Self::build_coupling_table(toml)?;

        Ok(Self {
            endpoint,
            headers,
            timeout,
            planner,
            retry_policy,
            coupling,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path
    /// (a leading `~` is expanded).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(&expand_tilde(path))?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Returns the endpoint, or an error naming how to provide one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequired`] if no endpoint was configured.
    pub fn require_endpoint(&self) -> Result<&Url, ConfigError> {
        self.endpoint.as_ref().ok_or_else(|| {
            ConfigError::missing(
                field::ENDPOINT,
                "Use --endpoint or set remote.endpoint in config file",
            )
        })
    }

    fn resolve_endpoint(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Option<Url>, ConfigError> {
        let Some(url_str) = cli
            .endpoint
            .as_deref()
            .or_else(|| toml.and_then(|t| t.remote.endpoint.as_deref()))
        else {
            return Ok(None);
        };

        let url = Url::parse(url_str).map_err(|e| ConfigError::InvalidUrl {
            url: url_str.to_string(),
            reason: e.to_string(),
        })?;

        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: url_str.to_string(),
                reason: "cannot be used as a base URL".to_string(),
            });
        }

        Ok(Some(url))
    }

    fn resolve_headers(cli: &Cli, toml: Option<&TomlConfig>) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();

        // TOML first so CLI can override
        if let Some(toml) = toml {
            for (name, value) in &toml.remote.headers {
                let header_name = parse_header_name(name)?;
                let header_value = parse_header_value(name, value)?;
                headers.insert(header_name, header_value);
            }
        }

        for header_str in &cli.headers {
            let (name, value) = parse_header_string(header_str)?;
            let header_name = parse_header_name(&name)?;
            let header_value = parse_header_value(&name, &value)?;
            headers.insert(header_name, header_value);
        }

        let bearer = cli
            .bearer
            .as_deref()
            .or_else(|| toml.and_then(|t| t.remote.bearer.as_deref()));

        if let Some(token) = bearer {
            let auth_value = format!("Bearer {token}");
            let header_value = parse_header_value("Authorization", &auth_value)?;
            headers.insert(AUTHORIZATION, header_value);
        }

        Ok(headers)
    }

    fn resolve_timeout(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        let seconds = cli
            .timeout
            .or_else(|| toml.and_then(|t| t.remote.timeout))
            .unwrap_or(defaults::TIMEOUT_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: "timeout",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Duration::from_secs(seconds))
    }

    fn build_planner_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<PlannerPolicy, ConfigError> {
        let planner = toml.map(|t| &t.planner);

        let max_chunk_size = cli
            .max_chunk_size
            .or_else(|| planner.and_then(|p| p.max_chunk_size))
            .unwrap_or(defaults::MAX_CHUNK_SIZE);

        if max_chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(max_chunk_size));
        }

        let coupled_packing = match cli.coupled_packing {
            Some(arg) => arg.into(),
            None => planner
                .and_then(|p| p.coupled_packing.as_deref())
                .map(parse_coupled_packing)
                .transpose()?
                .unwrap_or_default(),
        };

        let free_order = match cli.free_order {
            Some(arg) => arg.into(),
            None => planner
                .and_then(|p| p.free_order.as_deref())
                .map(parse_free_order)
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(PlannerPolicy::new()
            .with_max_chunk_size(max_chunk_size)
            .with_coupled_packing(coupled_packing)
            .with_free_order(free_order))
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let retry = toml.map(|t| &t.retry);

        let max_attempts = cli
            .retry_max
            .or_else(|| retry.and_then(|r| r.max_attempts))
            .unwrap_or(defaults::RETRY_MAX_ATTEMPTS);

        let initial_delay_ms = cli
            .retry_delay
            .or_else(|| retry.and_then(|r| r.initial_delay_ms))
            .unwrap_or(defaults::RETRY_INITIAL_DELAY_MS);

        let max_delay_ms = retry
            .and_then(|r| r.max_delay_ms)
            .unwrap_or(defaults::RETRY_MAX_DELAY_MS);

        let multiplier = retry
            .and_then(|r| r.multiplier)
            .unwrap_or(defaults::RETRY_MULTIPLIER);

        let jitter = retry
            .and_then(|r| r.jitter)
            .unwrap_or(defaults::RETRY_JITTER);

        if max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be greater than 0".to_string(),
            ));
        }

        if initial_delay_ms == 0 {
            return Err(ConfigError::InvalidRetry(
                "initial_delay_ms must be greater than 0".to_string(),
            ));
        }

        if multiplier <= 0.0 || !multiplier.is_finite() {
            return Err(ConfigError::InvalidRetry(
                "multiplier must be a positive finite number".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&jitter) {
            return Err(ConfigError::InvalidRetry(
                "jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        if max_delay_ms < initial_delay_ms {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_ms ({max_delay_ms}) must be >= initial_delay_ms ({initial_delay_ms})"
            )));
        }

        Ok(RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_initial_delay(Duration::from_millis(initial_delay_ms))
            .with_max_delay(Duration::from_millis(max_delay_ms))
            .with_multiplier(multiplier)
            .with_jitter(jitter))
    }

    fn build_coupling_table(toml: Option<&TomlConfig>) -> Result<CouplingTable, ConfigError> {
        let Some(coupling) = toml.map(|t| &t.coupling) else {
            return Ok(CouplingTable::builtin());
        };

        let mut table = match &coupling.groups {
            Some(groups) => {
                let mut table = CouplingTable::empty();
                for members in groups {
                    table = table.with_common_group(parse_group("default", members)?);
                }
                table
            }
            None => CouplingTable::builtin(),
        };

        for (family, groups) in &coupling.families {
            for members in groups {
                table = table.with_family_group(family, parse_group(family, members)?);
            }
        }

        Ok(table)
    }
}

/// Writes the default configuration template to a file.
///
/// An existing file is only replaced when `force` is set.
///
/// # Errors
///
/// Returns an error if the file exists and `force` is false, or if it
/// cannot be written.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    let path = expand_tilde(path);
    if !force && path.exists() {
        return Err(ConfigError::FileExists { path });
    }

    let template = super::toml::default_config_template();
    std::fs::write(&path, template).map_err(|e| ConfigError::FileWrite { path, source: e })
}

// Helper functions

fn parse_coupled_packing(s: &str) -> Result<CoupledPacking, ConfigError> {
    match s.to_lowercase().as_str() {
        "isolated" => Ok(CoupledPacking::Isolated),
        "fill" => Ok(CoupledPacking::Fill),
        _ => Err(ConfigError::InvalidChoice {
            field: "coupled_packing",
            value: s.to_string(),
            expected: "isolated or fill",
        }),
    }
}

fn parse_free_order(s: &str) -> Result<FreeOrder, ConfigError> {
    match s.to_lowercase().as_str() {
        "input" => Ok(FreeOrder::Input),
        "immediate-first" | "immediate_first" => Ok(FreeOrder::ImmediateFirst),
        _ => Err(ConfigError::InvalidChoice {
            field: "free_order",
            value: s.to_string(),
            expected: "input or immediate-first",
        }),
    }
}

fn parse_group(scope: &str, members: &[String]) -> Result<CoupledGroup, ConfigError> {
    CoupledGroup::new(members.iter().map(String::as_str)).map_err(|source| ConfigError::InvalidCoupling {
        scope: scope.to_string(),
        source,
    })
}

fn parse_header_string(s: &str) -> Result<(String, String), ConfigError> {
    // "Key=Value" first
    if let Some((name, value)) = s.split_once('=') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    if let Some((name, value)) = s.split_once(':') {
        return Ok((name.trim().to_string(), value.trim().to_string()));
    }

    Err(ConfigError::InvalidHeader {
        value: s.to_string(),
    })
}

fn parse_header_name(name: &str) -> Result<HeaderName, ConfigError> {
    name.parse::<HeaderName>()
        .map_err(|e| ConfigError::InvalidHeaderName {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

fn parse_header_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeaderValue {
        name: name.to_string(),
        reason: e.to_string(),
    })
}
