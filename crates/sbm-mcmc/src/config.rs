use std::fs;
use std::path::Path;

use sbm_core::errors::{ErrorInfo, SbmError};
use serde::{Deserialize, Serialize};

use crate::block_state::EntropyArgs;
use crate::multicanonical::WangLandauSchedule;
use crate::proposal::MoveProposer;

/// YAML-configurable parameters governing a sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of sweeps per chain.
    #[serde(default = "default_sweeps")]
    pub sweeps: usize,
    /// Number of independent chains (ignored when a ladder is set).
    #[serde(default = "default_chains")]
    pub chains: usize,
    /// Inverse temperature of every chain without a ladder.
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Model variant.
    #[serde(default)]
    pub model: ModelConfig,
    /// Single-vertex proposal parameters.
    #[serde(default)]
    pub proposal: ProposalConfig,
    /// Sampler driving each chain.
    #[serde(default)]
    pub algorithm: AlgorithmConfig,
    /// Optional replica-exchange temperature ladder.
    #[serde(default)]
    pub ladder: Option<LadderConfig>,
    /// Master seed and substream policy.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
}

fn default_sweeps() -> usize {
    100
}

fn default_chains() -> usize {
    1
}

fn default_beta() -> f64 {
    1.0
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sweeps: default_sweeps(),
            chains: default_chains(),
            beta: default_beta(),
            model: ModelConfig::default(),
            proposal: ProposalConfig::default(),
            algorithm: AlgorithmConfig::default(),
            ladder: None,
            seed_policy: SeedPolicy::default(),
        }
    }
}

/// Block-model variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Use the degree-corrected likelihood.
    #[serde(default)]
    pub degree_corrected: bool,
    /// Terms of the description length, including the degree prior kind.
    #[serde(default)]
    pub entropy: EntropyArgs,
}

/// Parameters of the single-vertex move proposer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProposalConfig {
    /// Probability of a uniformly random occupied block.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Probability of a fresh block while below `max_blocks`.
    #[serde(default = "default_p_new_block")]
    pub p_new_block: f64,
    /// Upper bound on the number of occupied blocks.
    #[serde(default)]
    pub max_blocks: Option<usize>,
}

fn default_epsilon() -> f64 {
    0.1
}

fn default_p_new_block() -> f64 {
    0.05
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            p_new_block: default_p_new_block(),
            max_blocks: None,
        }
    }
}

impl ProposalConfig {
    /// Proposer with these parameters.
    pub fn proposer(&self) -> MoveProposer {
        MoveProposer {
            epsilon: self.epsilon,
            p_new: self.p_new_block,
            max_blocks: self.max_blocks,
        }
    }
}

/// Sampler selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AlgorithmConfig {
    /// Single-vertex Metropolis–Hastings.
    Metropolis,
    /// Heat-bath single-vertex sampler.
    Gibbs,
    /// Jain–Neal split–merge moves.
    MergeSplit {
        /// Restricted Gibbs sweeps before the final launch pass.
        #[serde(default = "default_launch_sweeps")]
        launch_sweeps: usize,
        /// Proposals per sweep; zero means one per vertex.
        #[serde(default)]
        split_merge_moves: usize,
    },
    /// Wang–Landau estimation of the density of states.
    Multicanonical {
        /// Lower end of the description-length range.
        s_min: f64,
        /// Upper end of the description-length range (exclusive).
        s_max: f64,
        /// Number of bins.
        #[serde(default = "default_bins")]
        bins: usize,
        /// Initial modification factor.
        #[serde(default = "default_f_initial")]
        f_initial: f64,
        /// Final modification factor.
        #[serde(default = "default_f_min")]
        f_min: f64,
        /// Flatness target (`max / min` of the histogram).
        #[serde(default = "default_flat_ratio")]
        flat_ratio: f64,
        /// Sweeps between flatness checks.
        #[serde(default = "default_check_interval")]
        check_interval: usize,
    },
}

fn default_launch_sweeps() -> usize {
    5
}

fn default_bins() -> usize {
    100
}

fn default_f_initial() -> f64 {
    WangLandauSchedule::default().f_initial
}

fn default_f_min() -> f64 {
    WangLandauSchedule::default().f_min
}

fn default_flat_ratio() -> f64 {
    WangLandauSchedule::default().flat_ratio
}

fn default_check_interval() -> usize {
    WangLandauSchedule::default().check_interval
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        AlgorithmConfig::Metropolis
    }
}

/// Replica ladder construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Number of replicas in the ladder.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
    /// Temperature of the coldest replica.
    #[serde(default = "default_base_temperature")]
    pub base_temperature: f64,
    /// Policy used to generate higher temperatures.
    #[serde(default)]
    pub policy: LadderPolicy,
    /// Sweeps between exchange rounds.
    #[serde(default = "default_exchange_interval")]
    pub exchange_interval: usize,
}

fn default_replicas() -> usize {
    3
}

fn default_base_temperature() -> f64 {
    1.0
}

fn default_exchange_interval() -> usize {
    1
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            base_temperature: default_base_temperature(),
            policy: LadderPolicy::default(),
            exchange_interval: default_exchange_interval(),
        }
    }
}

/// Supported ladder construction strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LadderPolicy {
    /// Geometric progression with a fixed ratio between neighbouring replicas.
    Geometric {
        /// Multiplicative spacing ratio between adjacent replicas.
        #[serde(default = "default_ratio")]
        ratio: f64,
    },
    /// Explicit list of temperatures (overrides `replicas`).
    Manual {
        /// Ordered list of temperatures assigned to replicas.
        temperatures: Vec<f64>,
    },
}

fn default_ratio() -> f64 {
    1.5
}

impl Default for LadderPolicy {
    fn default() -> Self {
        LadderPolicy::Geometric {
            ratio: default_ratio(),
        }
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Optional label recorded with the run summary.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            label: None,
        }
    }
}

fn config_error(code: &str, message: &str, field: &str, value: String) -> SbmError {
    SbmError::Config(
        ErrorInfo::new(code, message)
            .with_context("field", field)
            .with_context("value", value),
    )
}

impl RunConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SbmError> {
        let config: RunConfig = serde_yaml::from_str(yaml)
            .map_err(|err| SbmError::Serde(ErrorInfo::new("config-parse", err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn load(path: &Path) -> Result<Self, SbmError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            SbmError::Serde(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents)
            .map_err(|err| err.with_context("path", path.display().to_string()))
    }

    /// Serializes the configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, SbmError> {
        serde_yaml::to_string(self)
            .map_err(|err| SbmError::Serde(ErrorInfo::new("config-serialize", err.to_string())))
    }

    /// Schedule of the multicanonical sampler, if selected.
    pub fn wang_landau_schedule(&self) -> Option<WangLandauSchedule> {
        match self.algorithm {
            AlgorithmConfig::Multicanonical {
                f_initial,
                f_min,
                flat_ratio,
                check_interval,
                ..
            } => Some(WangLandauSchedule {
                f_initial,
                f_min,
                flat_ratio,
                check_interval,
            }),
            _ => None,
        }
    }

    /// Rejects values no sampler can run with.
    pub fn validate(&self) -> Result<(), SbmError> {
        if self.chains == 0 {
            return Err(config_error(
                "invalid-chains",
                "at least one chain is required",
                "chains",
                self.chains.to_string(),
            ));
        }
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(config_error(
                "invalid-beta",
                "beta must be finite and non-negative",
                "beta",
                self.beta.to_string(),
            ));
        }
        let p = &self.proposal;
        let probabilities = [
            ("proposal.epsilon", p.epsilon),
            ("proposal.p_new_block", p.p_new_block),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(config_error(
                    "invalid-probability",
                    "probabilities must lie in [0, 1]",
                    field,
                    value.to_string(),
                ));
            }
        }
        if p.max_blocks == Some(0) {
            return Err(config_error(
                "invalid-max-blocks",
                "max_blocks must be positive",
                "proposal.max_blocks",
                "0".to_string(),
            ));
        }
        if let AlgorithmConfig::Multicanonical {
            s_min,
            s_max,
            bins,
            f_initial,
            f_min,
            flat_ratio,
            ..
        } = self.algorithm
        {
            if !(s_min.is_finite() && s_max.is_finite() && s_max > s_min) || bins == 0 {
                return Err(SbmError::Config(
                    ErrorInfo::new("invalid-range", "density range must be finite and non-empty")
                        .with_context("s_min", s_min.to_string())
                        .with_context("s_max", s_max.to_string())
                        .with_context("bins", bins.to_string()),
                ));
            }
            if !(f_initial > 0.0 && f_min > 0.0 && f_min <= f_initial) {
                return Err(config_error(
                    "invalid-factor",
                    "modification factors must satisfy 0 < f_min <= f_initial",
                    "algorithm.f_min",
                    f_min.to_string(),
                ));
            }
            if !(flat_ratio > 1.0) {
                return Err(config_error(
                    "invalid-flatness",
                    "flat_ratio must exceed 1",
                    "algorithm.flat_ratio",
                    flat_ratio.to_string(),
                ));
            }
            if self.ladder.is_some() {
                return Err(SbmError::Config(
                    ErrorInfo::new(
                        "ladder-unsupported",
                        "replica exchange is not defined for the multicanonical sampler",
                    )
                    .with_hint("remove the ladder section or pick another algorithm"),
                ));
            }
        }
        if let Some(ladder) = &self.ladder {
            let temperatures_ok = match &ladder.policy {
                LadderPolicy::Geometric { ratio } => *ratio >= 1.0 && ladder.replicas > 0,
                LadderPolicy::Manual { temperatures } => {
                    temperatures.iter().all(|t| t.is_finite() && *t > 0.0)
                }
            };
            if !temperatures_ok || !(ladder.base_temperature > 0.0) {
                return Err(config_error(
                    "invalid-ladder",
                    "ladder temperatures must be positive",
                    "ladder",
                    format!("{:?}", ladder.policy),
                ));
            }
        }
        Ok(())
    }
}
