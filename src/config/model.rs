//! The nested configuration record (C0), loaded from TOML with
//! per-field defaults so even an empty file produces a usable [`Config`].

use crate::model::SimulatorMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub target_count: usize,
    pub temperature: f64,
    pub max_tokens: u32,
    pub retry_attempts: u32,
    pub workers: usize,
    pub batch_size: usize,
    pub rate_limit_delay_ms: u64,
    pub timeout_secs: u64,
    pub simulator_mode: String,
    pub sample_data_path: String,
}

fn default_target_count() -> usize {
    10
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            temperature: 1.0,
            max_tokens: 1000,
            retry_attempts: 3,
            workers: 8,
            batch_size: 20,
            rate_limit_delay_ms: 100,
            timeout_secs: 60,
            simulator_mode: "base".to_string(),
            sample_data_path: String::new(),
        }
    }
}

impl GenerationSettings {
    pub fn simulator_mode(&self) -> SimulatorMode {
        SimulatorMode::parse(&self.simulator_mode).unwrap_or(SimulatorMode::Base)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub output_dir: String,
    pub output_filename: String,
    pub backup_existing: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            output_filename: "generated_{timestamp}.json".to_string(),
            backup_existing: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallLogSettings {
    pub log_dir: String,
    pub log_filename: String,
}

impl Default for CallLogSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            log_filename: "gpt_calls_{timestamp}.jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_type: String,
    pub model: String,
    pub endpoint: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_type: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub call_log: CallLogSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
}

impl Config {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.generation.target_count == 0 {
            return Err(ConfigError::invalid("generation.target_count must be > 0"));
        }
        if self.generation.sample_data_path.is_empty() {
            return Err(ConfigError::missing_field("generation.sample_data_path"));
        }
        if !Path::new(&self.generation.sample_data_path).exists() {
            return Err(ConfigError::invalid(format!(
                "sample_data_path does not exist: {}",
                self.generation.sample_data_path
            )));
        }
        if SimulatorMode::parse(&self.generation.simulator_mode).is_none() {
            return Err(ConfigError::unknown_simulator_mode(
                self.generation.simulator_mode.clone(),
            ));
        }
        match self.provider.api_type.as_str() {
            "openai" | "azure" => {}
            other => {
                return Err(ConfigError::invalid(format!(
                    "unknown provider.api_type: {other}"
                )))
            }
        }
        Ok(())
    }

    /// The resume-gating fingerprint (§3): an 8-hex-char MD5 digest of
    /// `{temperature, max_tokens, model, sample_data_path, simulator_mode}`
    /// serialized with sorted keys, matching the source tool's on-disk
    /// convention exactly.
    pub fn fingerprint(&self) -> String {
        #[derive(Serialize)]
        struct FingerprintFields<'a> {
            max_tokens: u32,
            model: &'a str,
            sample_data_path: &'a str,
            simulator_mode: &'a str,
            temperature: f64,
        }
        let fields = FingerprintFields {
            max_tokens: self.generation.max_tokens,
            model: &self.provider.model,
            sample_data_path: &self.generation.sample_data_path,
            simulator_mode: &self.generation.simulator_mode,
            temperature: self.generation.temperature,
        };
        let json = serde_json::to_string(&fields).expect("fingerprint fields always serialize");
        let digest = md5::compute(json.as_bytes());
        format!("{digest:x}")[..8].to_string()
    }

    /// Dot-notation getters for ad-hoc lookups, mirroring the teacher's
    /// `get_string`/`get_u64`/`get_bool` surface.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match key {
            "generation.simulator_mode" => Some(self.generation.simulator_mode.clone()),
            "generation.sample_data_path" => Some(self.generation.sample_data_path.clone()),
            "output.output_dir" => Some(self.output.output_dir.clone()),
            "output.output_filename" => Some(self.output.output_filename.clone()),
            "call_log.log_dir" => Some(self.call_log.log_dir.clone()),
            "call_log.log_filename" => Some(self.call_log.log_filename.clone()),
            "provider.api_type" => Some(self.provider.api_type.clone()),
            "provider.model" => Some(self.provider.model.clone()),
            "provider.endpoint" => self.provider.endpoint.clone(),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match key {
            "generation.target_count" => Some(self.generation.target_count as u64),
            "generation.max_tokens" => Some(self.generation.max_tokens as u64),
            "generation.retry_attempts" => Some(self.generation.retry_attempts as u64),
            "generation.workers" => Some(self.generation.workers as u64),
            "generation.batch_size" => Some(self.generation.batch_size as u64),
            "generation.rate_limit_delay_ms" => Some(self.generation.rate_limit_delay_ms),
            "generation.timeout_secs" => Some(self.generation.timeout_secs),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            "output.backup_existing" => Some(self.output.backup_existing),
            _ => None,
        }
    }

    pub fn generation(&self) -> &GenerationSettings {
        &self.generation
    }

    pub fn output(&self) -> &OutputSettings {
        &self.output
    }

    pub fn call_log(&self) -> &CallLogSettings {
        &self.call_log
    }

    pub fn provider(&self) -> &ProviderSettings {
        &self.provider
    }
}
