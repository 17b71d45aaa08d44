//! Run configuration for the cooperative-coevolution optimizer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config_error;
use crate::errors::{SaccError, SaccResult};

/// Smallest sub-population that still yields distinct DE donors.
pub const MIN_POPULATION: usize = 4;

/// Which approximation model assists the per-subcomponent optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurrogateKind {
    /// Plain CC-JADE: every trial is truly evaluated.
    None,
    GaussianProcess,
    /// Quadratic polynomial local approximation.
    Quadratic,
    /// Radial-basis-function network.
    Rbfn,
    /// Support-vector regression.
    Svr,
}

impl SurrogateKind {
    pub const ALL: [SurrogateKind; 5] = [
        SurrogateKind::None,
        SurrogateKind::GaussianProcess,
        SurrogateKind::Quadratic,
        SurrogateKind::Rbfn,
        SurrogateKind::Svr,
    ];

    /// Numeric code used by the command line (0 = none ... 4 = SVR).
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::GaussianProcess => 1,
            Self::Quadratic => 2,
            Self::Rbfn => 3,
            Self::Svr => 4,
        }
    }

    pub fn from_code(code: u8) -> SaccResult<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.code() == code)
            .ok_or_else(|| config_error!("unknown surrogate code: {code}"))
    }

    /// Tag used in result file names.
    pub fn tag(self) -> &'static str {
        match self {
            Self::None => "CCJADE",
            Self::GaussianProcess => "GP_SACCJADE",
            Self::Quadratic => "QPA_SACCJADE",
            Self::Rbfn => "RBFN_SACCJADE",
            Self::Svr => "SVR_SACCJADE",
        }
    }

    pub fn is_enabled(self) -> bool {
        self != Self::None
    }
}

impl Default for SurrogateKind {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for SurrogateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::GaussianProcess => "gp",
            Self::Quadratic => "qpa",
            Self::Rbfn => "rbfn",
            Self::Svr => "svr",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SurrogateKind {
    type Err = SaccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "0" => Ok(Self::None),
            "gp" | "gaussian_process" | "1" => Ok(Self::GaussianProcess),
            "qpa" | "quadratic" | "2" => Ok(Self::Quadratic),
            "rbfn" | "rbf" | "3" => Ok(Self::Rbfn),
            "svr" | "4" => Ok(Self::Svr),
            other => Err(config_error!("unknown surrogate kind: {other}")),
        }
    }
}

/// Control parameters of the JADE optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JadeParams {
    /// Adaptation rate of `mu_f` and `mu_cr`.
    pub c: f64,
    /// Fraction of the population eligible as the p-best donor.
    pub p: f64,
    /// Archive capacity as a multiple of the population size.
    pub archive_factor: f64,
}

impl Default for JadeParams {
    fn default() -> Self {
        Self {
            c: 0.1,
            p: 0.1,
            archive_factor: 1.0,
        }
    }
}

/// Top-level configuration for one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CcdeConfig {
    /// Ceiling on true fitness evaluations.
    pub max_evaluations: usize,

    /// Target number of coordinates per subcomponent (the last group may be smaller).
    pub subcomponent_size: usize,

    /// Individuals in every subcomponent's population.
    pub individuals_per_subcomponent: usize,

    pub seed: u64,

    pub surrogate: SurrogateKind,

    /// JADE generations each optimizer runs per cycle.
    pub generations_per_cycle: usize,

    pub jade: JadeParams,

    /// Shuffle coordinates at every decomposition (random grouping).
    pub random_grouping: bool,
}

impl Default for CcdeConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            subcomponent_size: 5,
            individuals_per_subcomponent: 10,
            seed: 0,
            surrogate: SurrogateKind::None,
            generations_per_cycle: 5,
            jade: JadeParams::default(),
            random_grouping: true,
        }
    }
}

impl CcdeConfig {
    pub fn new(max_evaluations: usize) -> Self {
        Self {
            max_evaluations,
            ..Self::default()
        }
    }

    pub fn with_subcomponent_size(mut self, n: usize) -> Self {
        self.subcomponent_size = n;
        self
    }

    pub fn with_population(mut self, n: usize) -> Self {
        self.individuals_per_subcomponent = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_surrogate(mut self, kind: SurrogateKind) -> Self {
        self.surrogate = kind;
        self
    }

    pub fn with_generations_per_cycle(mut self, n: usize) -> Self {
        self.generations_per_cycle = n;
        self
    }

    pub fn with_jade(mut self, params: JadeParams) -> Self {
        self.jade = params;
        self
    }

    pub fn with_random_grouping(mut self, enabled: bool) -> Self {
        self.random_grouping = enabled;
        self
    }

    /// Number of subcomponents a problem of `dimension` variables splits into.
    pub fn group_count(&self, dimension: usize) -> usize {
        dimension.div_ceil(self.subcomponent_size.max(1))
    }

    /// Check the configuration against a problem of `dimension` variables.
    pub fn validate(&self, dimension: usize) -> SaccResult<()> {
        if dimension == 0 {
            return Err(config_error!("problem dimension must be positive"));
        }
        if self.subcomponent_size == 0 || self.subcomponent_size > dimension {
            return Err(config_error!(
                "subcomponent size must be in [1..{dimension}], got {}",
                self.subcomponent_size
            ));
        }
        if self.individuals_per_subcomponent < MIN_POPULATION {
            return Err(config_error!(
                "population per subcomponent must be at least {MIN_POPULATION}, got {}",
                self.individuals_per_subcomponent
            ));
        }
        if self.generations_per_cycle == 0 {
            return Err(config_error!("generations per cycle must be positive"));
        }
        if self.max_evaluations == 0 {
            return Err(config_error!("evaluation budget must be positive"));
        }
        let in_unit = |v: f64| v > 0.0 && v <= 1.0;
        if !in_unit(self.jade.c) || !in_unit(self.jade.p) {
            return Err(config_error!(
                "JADE c and p must lie in (0, 1], got c={} p={}",
                self.jade.c, self.jade.p
            ));
        }
        if self.jade.archive_factor.is_nan() || self.jade.archive_factor < 0.0 {
            return Err(config_error!(
                "archive factor must be non-negative, got {}",
                self.jade.archive_factor
            ));
        }
        Ok(())
    }
}
