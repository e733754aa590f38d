//! # Settings Module
//!
//! ## Purpose
//! Holds the knobs of the CHEMKIN reader that are not fixed by the file format:
//! Chebyshev default limits, the treatment of duplicate Arrhenius expressions,
//! the policy for non-finite rate parameters and the unit conventions assumed
//! when a `REACTIONS` header declares none.
//!
//! ## Configuration Format
//! ```json
//! {
//!   "cheb_tlim_default": [300.0, 2500.0],
//!   "cheb_plim_default": [0.001, 100.0],
//!   "duplicates": "Collapse",
//!   "bad_fits": "Keep",
//!   "ea_units": "CalMole",
//!   "a_units": "Moles",
//!   "low_pressure_collider": false
//! }
//! ```
//!
//! ## Usage Pattern
//! ```rust, ignore
//! use KiMech::settings::ChemkinSettings;
//!
//! let mut settings = ChemkinSettings::with_config_file("chemkin_config.json");
//! settings.bad_fits = BadFitPolicy::Skip;
//! settings.save_config("chemkin_config.json")?;
//! ```
use crate::Chemkin::chemkin_errors::ChemkinError;
use crate::Chemkin::units::{AUnits, EaUnits};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What to do with a repeated simple-Arrhenius expression whose A, n and Ea
/// all equal one already stored for the reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DuplicatePolicy {
    /// keep one copy
    #[default]
    Collapse,
    /// keep every copy
    Strict,
}

/// What to do with an entry carrying `nan` or `inf` in any rate parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BadFitPolicy {
    /// keep the entry and log a warning
    #[default]
    Keep,
    /// drop the entry from the parsed parameters; `parse_raw_entries`,
    /// `parse_raw_strings` and `parse_comments` still list it
    Skip,
    /// fail with `ChemkinError::BadFit`
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemkinSettings {
    /// Chebyshev temperature limits [K] used when TCHEB is absent
    pub cheb_tlim_default: (f64, f64),
    /// Chebyshev pressure limits [atm] used when PCHEB is absent
    pub cheb_plim_default: (f64, f64),
    pub duplicates: DuplicatePolicy,
    pub bad_fits: BadFitPolicy,
    pub ea_units: EaUnits,
    pub a_units: AUnits,
    /// count the collider in the molecularity of the `LOW` pre-exponential
    /// when converting from molecule units
    pub low_pressure_collider: bool,
}

impl Default for ChemkinSettings {
    fn default() -> Self {
        Self {
            cheb_tlim_default: (300.0, 2500.0),
            cheb_plim_default: (0.001, 100.0),
            duplicates: DuplicatePolicy::Collapse,
            bad_fits: BadFitPolicy::Keep,
            ea_units: EaUnits::CalMole,
            a_units: AUnits::Moles,
            low_pressure_collider: false,
        }
    }
}

impl ChemkinSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from a JSON file, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn with_config_file(config_file: &str) -> Self {
        match Self::load_config(config_file) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Could not load settings from '{}' ({}), using defaults",
                    config_file, e
                );
                Self::default()
            }
        }
    }

    pub fn load_config(config_file: &str) -> Result<Self, ChemkinError> {
        if !Path::new(config_file).exists() {
            return Err(ChemkinError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File '{}' does not exist", config_file),
            )));
        }
        let content = fs::read_to_string(config_file)?;
        let settings: ChemkinSettings = serde_json::from_str(&content)?;
        info!("Loaded CHEMKIN settings from '{}'", config_file);
        Ok(settings)
    }

    pub fn save_config(&self, config_file: &str) -> Result<(), ChemkinError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_file, content)?;
        info!("Saved CHEMKIN settings to '{}'", config_file);
        Ok(())
    }

    /// `remove_bad_fits` switch of the reader
    pub fn remove_bad_fits(mut self, remove: bool) -> Self {
        self.bad_fits = if remove {
            BadFitPolicy::Skip
        } else {
            BadFitPolicy::Keep
        };
        self
    }

    pub fn strict_duplicates(mut self, strict: bool) -> Self {
        self.duplicates = if strict {
            DuplicatePolicy::Strict
        } else {
            DuplicatePolicy::Collapse
        };
        self
    }
}
