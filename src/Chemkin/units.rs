//! Unit conventions of the `REACTIONS` header line and their conversion to the
//! canonical cal/mol (activation energy) and mole-based (pre-exponential) units.
use super::chemkin_errors::ChemkinError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Avogadro constant, 1/mol
pub const NA: f64 = 6.02214076e23;
/// gas constant in cal/(mol K)
pub const R_CAL: f64 = 1.98720425864083;
const CAL_TO_J: f64 = 4.184;

/// activation energy units allowed in a CHEMKIN reactions header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EaUnits {
    #[default]
    CalMole,
    KcalMole,
    JoulesMole,
    KjoulesMole,
    Kelvins,
}

/// units of concentration in the pre-exponential factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AUnits {
    #[default]
    Moles,
    Molecules,
}

impl EaUnits {
    /// multiplier bringing an activation energy to cal/mol
    pub fn to_cal_per_mole(&self) -> f64 {
        match self {
            EaUnits::CalMole => 1.0,
            EaUnits::KcalMole => 1000.0,
            EaUnits::JoulesMole => 1.0 / CAL_TO_J,
            EaUnits::KjoulesMole => 1000.0 / CAL_TO_J,
            EaUnits::Kelvins => R_CAL,
        }
    }
    pub fn as_chemkin(&self) -> &'static str {
        match self {
            EaUnits::CalMole => "CAL/MOLE",
            EaUnits::KcalMole => "KCAL/MOLE",
            EaUnits::JoulesMole => "JOULES/MOLE",
            EaUnits::KjoulesMole => "KJOULES/MOLE",
            EaUnits::Kelvins => "KELVINS",
        }
    }
}

impl AUnits {
    /// multiplier bringing a pre-exponential factor of the given molecularity to mole units
    pub fn to_moles(&self, molecularity: usize) -> f64 {
        match self {
            AUnits::Moles => 1.0,
            AUnits::Molecules => NA.powi(molecularity as i32 - 1),
        }
    }
    pub fn as_chemkin(&self) -> &'static str {
        match self {
            AUnits::Moles => "MOLES",
            AUnits::Molecules => "MOLECULES",
        }
    }
}

impl FromStr for EaUnits {
    type Err = ChemkinError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cal/mole" | "cal/mol" | "cal" => Ok(EaUnits::CalMole),
            "kcal/mole" | "kcal/mol" | "kcal" => Ok(EaUnits::KcalMole),
            "joules/mole" | "joules/mol" | "j/mol" => Ok(EaUnits::JoulesMole),
            "kjoules/mole" | "kjoules/mol" | "kj/mol" => Ok(EaUnits::KjoulesMole),
            "kelvins" | "kelvin" => Ok(EaUnits::Kelvins),
            _ => Err(ChemkinError::UnknownUnits(s.to_string())),
        }
    }
}

impl FromStr for AUnits {
    type Err = ChemkinError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "moles" | "mole" => Ok(AUnits::Moles),
            "molecules" | "molecule" => Ok(AUnits::Molecules),
            _ => Err(ChemkinError::UnknownUnits(s.to_string())),
        }
    }
}

impl fmt::Display for EaUnits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_chemkin())
    }
}

impl fmt::Display for AUnits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_chemkin())
    }
}

/// Reads the unit declaration from the `REACTIONS` header line of a block.
/// Units the header does not mention are `None`; a token that is neither an
/// energy nor a quantity unit is an error.
pub fn declared_units(block: &str) -> Result<(Option<EaUnits>, Option<AUnits>), ChemkinError> {
    let mut ea_units = None;
    let mut a_units = None;
    let header = block.lines().find(|line| {
        line.split_whitespace()
            .next()
            .map(|first| first.to_uppercase().starts_with("REAC"))
            .unwrap_or(false)
    });
    if let Some(header) = header {
        let code = header.split('!').next().unwrap_or("");
        for token in code.split_whitespace().skip(1) {
            if let Ok(ea) = token.parse::<EaUnits>() {
                ea_units = Some(ea);
            } else if let Ok(a) = token.parse::<AUnits>() {
                a_units = Some(a);
            } else {
                return Err(ChemkinError::UnknownUnits(token.to_string()));
            }
        }
    }
    Ok((ea_units, a_units))
}

/// Units of a block with CHEMKIN's defaults (cal/mole, moles) for the missing ones.
pub fn reaction_units(block: &str) -> Result<(EaUnits, AUnits), ChemkinError> {
    let (ea_units, a_units) = declared_units(block)?;
    Ok((ea_units.unwrap_or_default(), a_units.unwrap_or_default()))
}
