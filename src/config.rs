//! User-configurable defaults (spec §6, "Configuration surface").
//!
//! `Config` is TOML-loadable, mirroring the enumerated knobs: alignment
//! output, HSP/seeding, affine gap penalties, intron/NER bounds, splice
//! behaviour and PCR parameters. Penalties that the spec requires negative
//! are validated in [`Config::validate`], not at deserialization time, so a
//! caller can load a partial file and still get one combined error report.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub alignment_width: usize,
    pub forward_strand_coords: bool,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            alignment_width: 80,
            forward_strand_coords: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    pub hsp_filter_threshold: i32,
    pub use_wordhood_dropoff: bool,
    pub seed_repeat: usize,
    pub dna_word_length: usize,
    pub protein_word_length: usize,
    pub codon_word_length: usize,
    pub geneseed_threshold: i32,
    pub geneseed_repeat: usize,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            hsp_filter_threshold: 30,
            use_wordhood_dropoff: false,
            seed_repeat: 1,
            dna_word_length: 12,
            protein_word_length: 6,
            codon_word_length: 12,
            geneseed_threshold: 30,
            geneseed_repeat: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffineConfig {
    pub gap_open: i32,
    pub gap_extend: i32,
    pub codon_gap_open: i32,
    pub codon_gap_extend: i32,
}

impl Default for AffineConfig {
    fn default() -> Self {
        Self {
            gap_open: -12,
            gap_extend: -4,
            codon_gap_open: -18,
            codon_gap_extend: -8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntronConfig {
    pub min_intron: usize,
    pub max_intron: usize,
    pub intron_open_penalty: i32,
}

impl Default for IntronConfig {
    fn default() -> Self {
        Self {
            min_intron: 30,
            max_intron: 200_000,
            intron_open_penalty: -30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    pub min_ner: usize,
    pub max_ner: usize,
    pub ner_open_penalty: i32,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            min_ner: 10,
            max_ner: 50_000,
            ner_open_penalty: -20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpliceConfig {
    pub force_gtag: bool,
}

impl Default for SpliceConfig {
    fn default() -> Self {
        Self { force_gtag: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcrConfig {
    pub mismatches: usize,
    pub seed_length: usize,
    pub memory_limit_mb: usize,
    pub display_pretty: bool,
    pub display_products: bool,
}

impl Default for PcrConfig {
    fn default() -> Self {
        Self {
            mismatches: 0,
            seed_length: 0,
            memory_limit_mb: 256,
            display_pretty: true,
            display_products: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub alignment: AlignmentConfig,
    pub seeding: SeedingConfig,
    pub affine: AffineConfig,
    pub intron: IntronConfig,
    pub ner: NerConfig,
    pub splice: SpliceConfig,
    pub pcr: PcrConfig,
}

impl Config {
    /// Load and validate a config from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::InvalidConfig(format!("reading {}: {e}", path.as_ref().display())))?;
        let config: Config = toml::from_str(&text).map_err(|e| Error::InvalidConfig(format!("parsing {}: {e}", path.as_ref().display())))?;
        config.validate()?;
        Ok(config)
    }

    /// The per-user config file path (`$XDG_CONFIG_HOME/c4align/config.toml`
    /// or the platform equivalent via `dirs`), if one exists.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("c4align").join("config.toml"))
    }

    /// Load the user config file if present, else fall back to defaults.
    pub fn load_user_or_default() -> Result<Self> {
        match Self::user_config_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Check every penalty the spec requires negative, and every bound the
    /// spec requires ordered (spec §7, "Invalid configuration").
    pub fn validate(&self) -> Result<()> {
        let negatives = [
            ("affine.gap_open", self.affine.gap_open),
            ("affine.gap_extend", self.affine.gap_extend),
            ("affine.codon_gap_open", self.affine.codon_gap_open),
            ("affine.codon_gap_extend", self.affine.codon_gap_extend),
            ("intron.intron_open_penalty", self.intron.intron_open_penalty),
            ("ner.ner_open_penalty", self.ner.ner_open_penalty),
        ];
        for (name, value) in negatives {
            if value >= 0 {
                return Err(Error::InvalidConfig(format!("{name} must be negative, got {value}")));
            }
        }
        if self.intron.min_intron > self.intron.max_intron {
            return Err(Error::InvalidConfig(format!(
                "intron.min_intron ({}) exceeds intron.max_intron ({})",
                self.intron.min_intron, self.intron.max_intron
            )));
        }
        if self.ner.min_ner > self.ner.max_ner {
            return Err(Error::InvalidConfig(format!("ner.min_ner ({}) exceeds ner.max_ner ({})", self.ner.min_ner, self.ner.max_ner)));
        }
        if self.alignment.alignment_width == 0 {
            return Err(Error::InvalidConfig("alignment.alignment_width must be at least 1".into()));
        }
        Ok(())
    }
}
