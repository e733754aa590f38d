//! Canonical reaction identity and the insertion-ordered map keyed by it.
//!
//! A reaction is identified by its reactants, its products (both as written,
//! multiplicities expanded) and its third body. Two entries of a mechanism are
//! duplicates exactly when their identities are equal.
use super::chemkin_errors::ChemkinError;
use super::grammar::{expand_multiplier, split_at_arrow, split_side, strip_falloff};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// third-body designator of a reaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThirdBody {
    /// no third body
    Absent,
    /// `(+M)` or `(+Name)`: falloff, does not count in the molecularity
    Falloff(String),
    /// `+M` on both sides: generic collision partner, counts in the molecularity
    Bath,
}

impl ThirdBody {
    pub fn is_absent(&self) -> bool {
        matches!(self, ThirdBody::Absent)
    }
}

impl fmt::Display for ThirdBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ThirdBody::Absent => Ok(()),
            ThirdBody::Falloff(name) => write!(f, "(+{})", name),
            ThirdBody::Bath => write!(f, "+M"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReactionId {
    pub reactants: Vec<String>,
    pub products: Vec<String>,
    pub third_body: ThirdBody,
}

impl ReactionId {
    pub fn new(reactants: Vec<&str>, products: Vec<&str>, third_body: ThirdBody) -> Self {
        Self {
            reactants: reactants.into_iter().map(|s| s.to_string()).collect(),
            products: products.into_iter().map(|s| s.to_string()).collect(),
            third_body,
        }
    }

    /// Builds the identity from the equation part of an equation line,
    /// e.g. `H+O2(+M)<=>HO2(+M)` or `2OH+M=H2O2+M`.
    pub fn from_equation(equation: &str) -> Result<Self, ChemkinError> {
        let malformed = |reason: &str| ChemkinError::MalformedEquation {
            line: equation.trim().to_string(),
            reason: reason.to_string(),
        };
        let (lhs, rhs) = split_at_arrow(equation).ok_or_else(|| malformed("no arrow"))?;
        let (lhs, lhs_falloff) = strip_falloff(lhs);
        let (rhs, rhs_falloff) = strip_falloff(rhs);
        let mut reactants = expand_side(lhs).ok_or_else(|| malformed("bad reactant token"))?;
        let mut products = expand_side(rhs).ok_or_else(|| malformed("bad product token"))?;
        if reactants.is_empty() || products.is_empty() {
            return Err(malformed("empty side"));
        }
        let third_body = match (lhs_falloff, rhs_falloff) {
            (Some(left), Some(right)) if left != right => {
                return Err(malformed("different falloff partners on the two sides"));
            }
            (Some(name), _) | (None, Some(name)) => ThirdBody::Falloff(name),
            (None, None) => {
                let m_left = reactants.iter().filter(|s| s.as_str() == "M").count();
                let m_right = products.iter().filter(|s| s.as_str() == "M").count();
                if m_left > 0 && m_left == m_right {
                    reactants.retain(|s| s != "M");
                    products.retain(|s| s != "M");
                    ThirdBody::Bath
                } else {
                    ThirdBody::Absent
                }
            }
        };
        Ok(Self {
            reactants,
            products,
            third_body,
        })
    }

    /// number of colliding partners used for pre-exponential unit conversion
    pub fn molecularity(&self) -> usize {
        match self.third_body {
            ThirdBody::Bath => self.reactants.len() + 1,
            _ => self.reactants.len(),
        }
    }

    /// the equation as written by the block writer: `H + O2 (+M) = HO2 (+M)`
    pub fn chemkin_name(&self) -> String {
        let mut lhs = self.reactants.join(" + ");
        let mut rhs = self.products.join(" + ");
        match &self.third_body {
            ThirdBody::Absent => {}
            ThirdBody::Falloff(_) => {
                lhs = format!("{} {}", lhs, self.third_body);
                rhs = format!("{} {}", rhs, self.third_body);
            }
            ThirdBody::Bath => {
                lhs.push_str(" + M");
                rhs.push_str(" + M");
            }
        }
        format!("{} = {}", lhs, rhs)
    }
}

fn expand_side(side: &str) -> Option<Vec<String>> {
    let mut species = Vec::new();
    for token in split_side(side) {
        species.extend(expand_multiplier(&token)?);
    }
    Some(species)
}

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.chemkin_name())
    }
}

/// Map keyed by reaction identity that remembers the order of first insertion,
/// which is the order reactions are written back in.
#[derive(Debug, Clone)]
pub struct ReactionMap<V> {
    entries: Vec<(ReactionId, V)>,
    index: HashMap<ReactionId, usize>,
}

impl<V> Default for ReactionMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> ReactionMap<V> {
    pub fn new() -> Self {
        Self::default()
    }
    /// Inserts or replaces; a replaced value keeps its original position.
    pub fn insert(&mut self, id: ReactionId, value: V) -> Option<V> {
        match self.index.get(&id) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push((id, value));
                None
            }
        }
    }
    pub fn get(&self, id: &ReactionId) -> Option<&V> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }
    pub fn get_mut(&mut self, id: &ReactionId) -> Option<&mut V> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.entries[i].1),
            None => None,
        }
    }
    pub fn contains_key(&self, id: &ReactionId) -> bool {
        self.index.contains_key(id)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn keys(&self) -> impl Iterator<Item = &ReactionId> {
        self.entries.iter().map(|(k, _)| k)
    }
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&ReactionId, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<V: PartialEq> PartialEq for ReactionMap<V> {
    /// same keys with equal values; insertion order is not compared
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map(|w| w == v).unwrap_or(false))
    }
}

impl<V> FromIterator<(ReactionId, V)> for ReactionMap<V> {
    fn from_iter<I: IntoIterator<Item = (ReactionId, V)>>(iter: I) -> Self {
        let mut map = ReactionMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V> IntoIterator for ReactionMap<V> {
    type Item = (ReactionId, V);
    type IntoIter = std::vec::IntoIter<(ReactionId, V)>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bath_third_body() {
        let id = ReactionId::from_equation("H+O2+M=OH+O+M").unwrap();
        assert_eq!(id, ReactionId::new(vec!["H", "O2"], vec!["OH", "O"], ThirdBody::Bath));
        assert_eq!(id.molecularity(), 3);
        assert_eq!(id.chemkin_name(), "H + O2 + M = OH + O + M");
    }

    #[test]
    fn test_falloff_third_body() {
        let id = ReactionId::from_equation("H + O2 (+M) <=> HO2 (+M)").unwrap();
        assert_eq!(
            id,
            ReactionId::new(vec!["H", "O2"], vec!["HO2"], ThirdBody::Falloff("M".to_string()))
        );
        assert_eq!(id.molecularity(), 2);
        let named = ReactionId::from_equation("CH3+CH3(+AR)=C2H6(+AR)").unwrap();
        assert_eq!(named.third_body, ThirdBody::Falloff("AR".to_string()));
        assert_eq!(named.reactants, vec!["CH3", "CH3"]);
        assert_eq!(named.chemkin_name(), "CH3 + CH3 (+AR) = C2H6 (+AR)");
    }

    #[test]
    fn test_multiplier_expansion() {
        let id = ReactionId::from_equation("2OH=H2O2").unwrap();
        assert_eq!(id.reactants, vec!["OH", "OH"]);
        assert_eq!(id.third_body, ThirdBody::Absent);
        assert_eq!(id.chemkin_name(), "OH + OH = H2O2");
    }

    #[test]
    fn test_unbalanced_m_is_a_species() {
        let id = ReactionId::from_equation("A+M=B").unwrap();
        assert_eq!(id.reactants, vec!["A", "M"]);
        assert_eq!(id.third_body, ThirdBody::Absent);
    }

    #[test]
    fn test_malformed_equations() {
        assert!(ReactionId::from_equation("H+O2 OH+O").is_err());
        assert!(ReactionId::from_equation("= OH").is_err());
        assert!(ReactionId::from_equation("H (+M) = OH (+N2)").is_err());
    }

    #[test]
    fn test_reaction_map_order_and_equality() {
        let r1 = ReactionId::from_equation("H+O2=OH+O").unwrap();
        let r2 = ReactionId::from_equation("O+H2=OH+H").unwrap();
        let mut map = ReactionMap::new();
        map.insert(r1.clone(), 1);
        map.insert(r2.clone(), 2);
        assert_eq!(map.insert(r1.clone(), 10), Some(1));
        let keys: Vec<&ReactionId> = map.keys().collect();
        assert_eq!(keys, vec![&r1, &r2]);
        assert_eq!(map.get(&r1), Some(&10));
        let reversed: ReactionMap<i32> = vec![(r2, 2), (r1, 10)].into_iter().collect();
        assert_eq!(map, reversed);
    }
}
