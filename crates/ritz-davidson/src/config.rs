//! Solver configuration.
//!
//! Every option can be set programmatically, from the short option strings
//! used by quantum-chemistry input files (`"DPR"`, `"safe"`, `"QR"`, ...),
//! or from a JSON document. Configuration is validated once, before the
//! first iteration, and never changes during a solve.

use crate::error::{DavidsonError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Named tolerance presets on the residual norm.
pub const TOLERANCE_PRESETS: [(&str, f64); 5] = [
    ("loose", 1e-3),
    ("normal", 1e-4),
    ("strict", 1e-5),
    ("tight", 1e-6),
    ("lapack", 1e-9),
];

/// Parse a tolerance given either as a preset name or as a positive number.
pub fn parse_tolerance(s: &str) -> Result<f64> {
    let key = s.trim().to_ascii_lowercase();
    if let Some(&(_, tol)) = TOLERANCE_PRESETS.iter().find(|(name, _)| *name == key) {
        return Ok(tol);
    }
    match key.parse::<f64>() {
        Ok(tol) if tol.is_finite() && tol > 0.0 => Ok(tol),
        _ => Err(DavidsonError::InvalidOption {
            option: "tolerance",
            value: s.to_string(),
        }),
    }
}

/// How correction vectors are built from residuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionScheme {
    /// Diagonal-preconditioned residual.
    #[default]
    Dpr,
    /// Olsen correction: DPR made orthogonal to the current Ritz vector.
    Olsen,
}

/// How many roots are tracked (and corrected) per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUpdate {
    /// Only the requested roots.
    Min,
    /// A moderate number of extra roots.
    #[default]
    Safe,
    /// Twice the requested roots.
    Max,
}

impl SizeUpdate {
    /// Number of tracked roots for `n_eigen` requested eigenpairs.
    pub fn tracked_roots(self, n_eigen: usize) -> usize {
        match self {
            Self::Min => n_eigen,
            Self::Safe if n_eigen < 20 => n_eigen * 3 / 2,
            Self::Safe => n_eigen + 10,
            Self::Max => 2 * n_eigen,
        }
    }
}

/// Orthogonalization applied to freshly appended search directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orthogonalization {
    /// Two-pass modified Gram-Schmidt against the frozen subspace.
    #[default]
    #[serde(rename = "gs")]
    GramSchmidt,
    /// Householder QR of the whole search space.
    #[serde(rename = "qr")]
    Qr,
}

/// Shape of the operator and the matching reduced eigenproblem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatrixType {
    /// Symmetric operator; plain Ritz pairs, lowest eigenvalues.
    #[default]
    #[serde(rename = "symm", alias = "symmetric")]
    Symmetric,
    /// Paired `[[A, B], [-B, -A]]` operator; harmonic Ritz pairs, lowest
    /// positive eigenvalues.
    #[serde(rename = "ham", alias = "hamiltonian")]
    Hamiltonian,
}

impl FromStr for CorrectionScheme {
    type Err = DavidsonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dpr" => Ok(Self::Dpr),
            "olsen" => Ok(Self::Olsen),
            _ => Err(DavidsonError::InvalidOption {
                option: "correction",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for SizeUpdate {
    type Err = DavidsonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "safe" => Ok(Self::Safe),
            "max" => Ok(Self::Max),
            _ => Err(DavidsonError::InvalidOption {
                option: "size_update",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for Orthogonalization {
    type Err = DavidsonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gs" | "mgs" | "gram-schmidt" => Ok(Self::GramSchmidt),
            "qr" => Ok(Self::Qr),
            _ => Err(DavidsonError::InvalidOption {
                option: "orthogonalization",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for MatrixType {
    type Err = DavidsonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symm" | "symmetric" => Ok(Self::Symmetric),
            "ham" | "hamiltonian" => Ok(Self::Hamiltonian),
            _ => Err(DavidsonError::InvalidOption {
                option: "matrix_type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for CorrectionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dpr => write!(f, "DPR"),
            Self::Olsen => write!(f, "Olsen"),
        }
    }
}

impl fmt::Display for SizeUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Min => write!(f, "min"),
            Self::Safe => write!(f, "safe"),
            Self::Max => write!(f, "max"),
        }
    }
}

impl fmt::Display for Orthogonalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GramSchmidt => write!(f, "Gram-Schmidt"),
            Self::Qr => write!(f, "QR"),
        }
    }
}

impl fmt::Display for MatrixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symmetric => write!(f, "symmetric"),
            Self::Hamiltonian => write!(f, "hamiltonian"),
        }
    }
}

/// Davidson solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DavidsonConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Search space size that triggers a restart. `None` means
    /// `5 × n_eigen`; values below `n_eigen` are raised to that as well.
    pub max_search_space: Option<usize>,
    /// Convergence threshold on each residual norm.
    #[serde(deserialize_with = "deserialize_tolerance")]
    pub tolerance: f64,
    pub correction: CorrectionScheme,
    pub size_update: SizeUpdate,
    pub orthogonalization: Orthogonalization,
    pub matrix_type: MatrixType,
    /// Amplitude of the uniform noise added to the initial guess (0 = none).
    pub guess_noise: f64,
    /// Seed for the initial guess noise.
    pub seed: u64,
}

impl Default for DavidsonConfig {
    fn default() -> Self {
        Self {
            max_iter: 50,
            max_search_space: None,
            tolerance: 1e-4,
            correction: CorrectionScheme::Dpr,
            size_update: SizeUpdate::Safe,
            orthogonalization: Orthogonalization::GramSchmidt,
            matrix_type: MatrixType::Symmetric,
            guess_noise: 0.0,
            seed: 0,
        }
    }
}

fn deserialize_tolerance<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Setting {
        Value(f64),
        Preset(String),
    }

    match Setting::deserialize(deserializer)? {
        Setting::Value(tol) => Ok(tol),
        Setting::Preset(name) => parse_tolerance(&name).map_err(serde::de::Error::custom),
    }
}

impl DavidsonConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings that cannot drive a solve.
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(DavidsonError::InvalidConfig(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(DavidsonError::InvalidConfig(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_search_space == Some(0) {
            return Err(DavidsonError::InvalidConfig(
                "max_search_space must be positive".to_string(),
            ));
        }
        if !(self.guess_noise.is_finite() && self.guess_noise >= 0.0) {
            return Err(DavidsonError::InvalidConfig(format!(
                "guess_noise must be non-negative and finite, got {}",
                self.guess_noise
            )));
        }
        Ok(())
    }

    pub fn set_iter_max(&mut self, n: usize) {
        self.max_iter = n;
    }

    pub fn set_max_search_space(&mut self, n: usize) {
        self.max_search_space = Some(n);
    }

    /// Tolerance preset (`loose`, `normal`, `strict`, `tight`, `lapack`) or number.
    pub fn set_tolerance(&mut self, tol: &str) -> Result<()> {
        self.tolerance = parse_tolerance(tol)?;
        Ok(())
    }

    /// `DPR` or `OLSEN`.
    pub fn set_correction(&mut self, method: &str) -> Result<()> {
        self.correction = method.parse()?;
        Ok(())
    }

    /// `min`, `safe` or `max`.
    pub fn set_size_update(&mut self, update_size: &str) -> Result<()> {
        self.size_update = update_size.parse()?;
        Ok(())
    }

    /// `GS` or `QR`.
    pub fn set_ortho(&mut self, method: &str) -> Result<()> {
        self.orthogonalization = method.parse()?;
        Ok(())
    }

    /// `SYMM` or `HAM`.
    pub fn set_matrix_type(&mut self, mt: &str) -> Result<()> {
        self.matrix_type = mt.parse()?;
        Ok(())
    }
}
