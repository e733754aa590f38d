//! Rate-parameter data model shared by the block parser and the block writer.
//!
//! A reaction carries exactly one primary rate form (Arrhenius, Lindemann,
//! Troe, Chebyshev or PLOG), optional collider efficiencies and a list of
//! additional whole-form expressions that were declared as duplicates.
//! Duplicate simple-Arrhenius expressions are the exception: they live in
//! the Arrhenius list itself.
use super::chemkin_errors::ChemkinError;
use super::reaction_id::{ReactionId, ReactionMap};
use crate::settings::DuplicatePolicy;
use enum_dispatch::enum_dispatch;
use linear_map::LinearMap;
use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// species -> third-body efficiency, in the order they were declared
pub type Colliders = LinearMap<String, f64>;

/// Arrhenius triple: A [cm3, mol, s], n [-], Ea [cal/mol]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct Arrhenius {
    pub A: f64,
    pub n: f64,
    pub Ea: f64,
}

impl Arrhenius {
    #[allow(non_snake_case)]
    pub fn new(A: f64, n: f64, Ea: f64) -> Self {
        Self { A, n, Ea }
    }
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
    pub fn is_zero(&self) -> bool {
        self.A == 0.0 && self.n == 0.0 && self.Ea == 0.0
    }
    pub fn is_finite(&self) -> bool {
        self.A.is_finite() && self.n.is_finite() && self.Ea.is_finite()
    }
    fn scale(&mut self, a_factor: f64, ea_factor: f64) {
        self.A *= a_factor;
        self.Ea *= ea_factor;
    }
}

impl From<[f64; 3]> for Arrhenius {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// f64 usable as an ordered map key (PLOG pressures)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct F64Wrapper(pub f64);

impl PartialEq for F64Wrapper {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for F64Wrapper {}

impl PartialOrd for F64Wrapper {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for F64Wrapper {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for F64Wrapper {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// multipliers applied while bringing parsed parameters to canonical units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    /// pre-exponential factor of the header, PLOG and Chebyshev reference triples
    pub a: f64,
    /// pre-exponential factor of the LOW triple (one more collision partner)
    pub a_low: f64,
    /// activation energy
    pub ea: f64,
}

/// names of the rate forms, also used as keys of duplicate counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormKind {
    Arr,
    Plog,
    Cheb,
    Troe,
    Lind,
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FormKind::Arr => "arr",
            FormKind::Plog => "plog",
            FormKind::Cheb => "cheb",
            FormKind::Troe => "troe",
            FormKind::Lind => "lind",
        };
        write!(f, "{}", name)
    }
}

/// behaviour every rate form provides
#[enum_dispatch]
pub trait RateExpression {
    fn kind(&self) -> FormKind;
    /// triple written on the equation line of the entry
    fn header_arr(&self) -> Arrhenius;
    fn scale_units(&mut self, scale: &UnitScale);
    /// false when any parameter is nan or infinite
    fn is_finite(&self) -> bool;
    fn requires_third_body(&self) -> bool {
        false
    }
}

/////////////////////////ELEMENTARY (ARRHENIUS)///////////////////////////////////////
/// one or more Arrhenius triples; more than one means duplicate expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusStruct {
    pub arr: Vec<Arrhenius>,
}

impl RateExpression for ArrheniusStruct {
    fn kind(&self) -> FormKind {
        FormKind::Arr
    }
    fn header_arr(&self) -> Arrhenius {
        self.arr.first().copied().unwrap_or_else(Arrhenius::zero)
    }
    fn scale_units(&mut self, scale: &UnitScale) {
        for triple in self.arr.iter_mut() {
            triple.scale(scale.a, scale.ea);
        }
    }
    fn is_finite(&self) -> bool {
        self.arr.iter().all(Arrhenius::is_finite)
    }
}

/////////////////////////FALLOFF KINETICS/////////////////////////////////////////////
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LindemannStruct {
    pub highp_arr: Arrhenius,
    pub lowp_arr: Arrhenius,
}

impl RateExpression for LindemannStruct {
    fn kind(&self) -> FormKind {
        FormKind::Lind
    }
    fn header_arr(&self) -> Arrhenius {
        self.highp_arr
    }
    fn scale_units(&mut self, scale: &UnitScale) {
        self.highp_arr.scale(scale.a, scale.ea);
        self.lowp_arr.scale(scale.a_low, scale.ea);
    }
    fn is_finite(&self) -> bool {
        self.highp_arr.is_finite() && self.lowp_arr.is_finite()
    }
    fn requires_third_body(&self) -> bool {
        true
    }
}

/// Troe shape parameters (alpha, T***, T*, T**), the last one optional
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TroeParams {
    pub alpha: f64,
    pub t3: f64,
    pub t1: f64,
    pub t2: Option<f64>,
}

impl TroeParams {
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [alpha, t3, t1] => Some(Self {
                alpha: *alpha,
                t3: *t3,
                t1: *t1,
                t2: None,
            }),
            [alpha, t3, t1, t2] => Some(Self {
                alpha: *alpha,
                t3: *t3,
                t1: *t1,
                t2: Some(*t2),
            }),
            _ => None,
        }
    }
    pub fn to_vec(&self) -> Vec<f64> {
        let mut v = vec![self.alpha, self.t3, self.t1];
        v.extend(self.t2);
        v
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroeStruct {
    pub highp_arr: Arrhenius,
    pub lowp_arr: Arrhenius,
    pub troe_params: TroeParams,
}

impl RateExpression for TroeStruct {
    fn kind(&self) -> FormKind {
        FormKind::Troe
    }
    fn header_arr(&self) -> Arrhenius {
        self.highp_arr
    }
    fn scale_units(&mut self, scale: &UnitScale) {
        self.highp_arr.scale(scale.a, scale.ea);
        self.lowp_arr.scale(scale.a_low, scale.ea);
    }
    fn is_finite(&self) -> bool {
        self.highp_arr.is_finite()
            && self.lowp_arr.is_finite()
            && self.troe_params.to_vec().iter().all(|v| v.is_finite())
    }
    fn requires_third_body(&self) -> bool {
        true
    }
}

/////////////////////////CHEBYSHEV////////////////////////////////////////////////////
/// Chebyshev expansion in reduced 1/T (rows) and log P (columns)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChebyshevStruct {
    pub tlim: (f64, f64),
    pub plim: (f64, f64),
    pub alpha: DMatrix<f64>,
    /// reference Arrhenius expression at one atmosphere, if the header carried one
    pub one_atm_arr: Option<Arrhenius>,
}

impl RateExpression for ChebyshevStruct {
    fn kind(&self) -> FormKind {
        FormKind::Cheb
    }
    fn header_arr(&self) -> Arrhenius {
        self.one_atm_arr.unwrap_or_else(Arrhenius::zero)
    }
    fn scale_units(&mut self, scale: &UnitScale) {
        if let Some(arr) = self.one_atm_arr.as_mut() {
            arr.scale(scale.a, scale.ea);
        }
    }
    fn is_finite(&self) -> bool {
        self.alpha.iter().all(|v| v.is_finite())
            && self.one_atm_arr.map(|a| a.is_finite()).unwrap_or(true)
            && [self.tlim.0, self.tlim.1, self.plim.0, self.plim.1]
                .iter()
                .all(|v| v.is_finite())
    }
}

/////////////////////////PRESSURE DEPENDENT KINETICS//////////////////////////////////
/// pressure [atm] -> Arrhenius triples; several triples at one pressure are duplicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlogStruct {
    #[serde(
        serialize_with = "serialize_pressure_map",
        deserialize_with = "deserialize_pressure_map"
    )]
    pub arr: BTreeMap<F64Wrapper, Vec<Arrhenius>>,
}

impl PlogStruct {
    pub fn new() -> Self {
        Self {
            arr: BTreeMap::new(),
        }
    }
    pub fn push(&mut self, pressure: f64, arr: Arrhenius) {
        self.arr.entry(F64Wrapper(pressure)).or_default().push(arr);
    }
    /// pressures in ascending order
    pub fn pressures(&self) -> Vec<f64> {
        self.arr.keys().map(|p| p.0).collect()
    }
    pub fn get(&self, pressure: f64) -> Option<&Vec<Arrhenius>> {
        self.arr.get(&F64Wrapper(pressure))
    }
}

impl Default for PlogStruct {
    fn default() -> Self {
        Self::new()
    }
}

impl RateExpression for PlogStruct {
    fn kind(&self) -> FormKind {
        FormKind::Plog
    }
    /// the first expression at the pressure closest to one atmosphere
    fn header_arr(&self) -> Arrhenius {
        self.arr
            .iter()
            .min_by(|(p1, _), (p2, _)| {
                let d1 = (p1.0.ln()).abs();
                let d2 = (p2.0.ln()).abs();
                d1.total_cmp(&d2)
            })
            .and_then(|(_, list)| list.first().copied())
            .unwrap_or_else(Arrhenius::zero)
    }
    fn scale_units(&mut self, scale: &UnitScale) {
        for list in self.arr.values_mut() {
            for triple in list.iter_mut() {
                triple.scale(scale.a, scale.ea);
            }
        }
    }
    fn is_finite(&self) -> bool {
        self.arr
            .iter()
            .all(|(p, list)| p.0.is_finite() && list.iter().all(Arrhenius::is_finite))
    }
}

fn serialize_pressure_map<S>(
    map: &BTreeMap<F64Wrapper, Vec<Arrhenius>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(map.iter().map(|(k, v)| (k.0.to_string(), v)))
}

fn deserialize_pressure_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<F64Wrapper, Vec<Arrhenius>>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = HashMap::<String, Vec<Arrhenius>>::deserialize(deserializer)?;
    map.into_iter()
        .map(|(k, v)| {
            k.parse::<f64>()
                .map(|p| (F64Wrapper(p), v))
                .map_err(|e| <D::Error as serde::de::Error>::custom(e))
        })
        .collect()
}

/// tagged sum of the five rate forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[enum_dispatch(RateExpression)]
pub enum RateForm {
    Arrhenius(ArrheniusStruct),
    Lindemann(LindemannStruct),
    Troe(TroeStruct),
    Chebyshev(ChebyshevStruct),
    Plog(PlogStruct),
}

/// rate information of one reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateParams {
    pub primary: RateForm,
    pub colliders: Option<Colliders>,
    /// whole-form duplicate expressions, in source order
    pub duplicates: Vec<RateForm>,
}

impl RateParams {
    pub fn new(primary: RateForm) -> Self {
        Self {
            primary,
            colliders: None,
            duplicates: Vec::new(),
        }
    }
    pub fn arrhenius(arr: Vec<Arrhenius>) -> Self {
        Self::new(RateForm::Arrhenius(ArrheniusStruct { arr }))
    }
    pub fn lindemann(highp_arr: Arrhenius, lowp_arr: Arrhenius) -> Self {
        Self::new(RateForm::Lindemann(LindemannStruct {
            highp_arr,
            lowp_arr,
        }))
    }
    pub fn troe(highp_arr: Arrhenius, lowp_arr: Arrhenius, troe_params: TroeParams) -> Self {
        Self::new(RateForm::Troe(TroeStruct {
            highp_arr,
            lowp_arr,
            troe_params,
        }))
    }
    pub fn chebyshev(
        tlim: (f64, f64),
        plim: (f64, f64),
        alpha: DMatrix<f64>,
        one_atm_arr: Option<Arrhenius>,
    ) -> Self {
        Self::new(RateForm::Chebyshev(ChebyshevStruct {
            tlim,
            plim,
            alpha,
            one_atm_arr,
        }))
    }
    pub fn plog(plog: PlogStruct) -> Self {
        Self::new(RateForm::Plog(plog))
    }
    pub fn with_colliders(mut self, colliders: Vec<(&str, f64)>) -> Self {
        self.colliders = Some(
            colliders
                .into_iter()
                .map(|(name, eff)| (name.to_string(), eff))
                .collect(),
        );
        self
    }

    /// populated forms: the primary one, plus `arr` when a Chebyshev expression
    /// carries its one-atmosphere reference
    pub fn existing_forms(&self) -> Vec<FormKind> {
        let mut forms = vec![self.primary.kind()];
        if let RateForm::Chebyshev(cheb) = &self.primary {
            if cheb.one_atm_arr.is_some() {
                forms.push(FormKind::Arr);
            }
        }
        forms
    }

    pub fn has_duplicates(&self) -> bool {
        let in_form = match &self.primary {
            RateForm::Arrhenius(a) => a.arr.len() > 1,
            RateForm::Plog(p) => p.arr.values().any(|list| list.len() > 1),
            _ => false,
        };
        in_form || !self.duplicates.is_empty()
    }

    /// number of whole-form duplicates per form
    pub fn duplicate_counts(&self) -> BTreeMap<FormKind, usize> {
        let mut counts = BTreeMap::new();
        for dup in &self.duplicates {
            *counts.entry(dup.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Folds `other` into `self` as a duplicate, collapsing identical Arrhenius triples.
    pub fn combine(&mut self, other: RateParams) {
        self.combine_with(other, DuplicatePolicy::Collapse)
    }

    /// Folds `other` into `self` as a duplicate. Two Arrhenius expressions are
    /// merged into one list; any other pairing appends `other`'s primary form to
    /// the duplicates. The colliders of the first occurrence win.
    pub fn combine_with(&mut self, other: RateParams, policy: DuplicatePolicy) {
        let RateParams {
            primary,
            colliders,
            duplicates,
        } = other;
        if self.colliders.is_none() {
            self.colliders = colliders;
        }
        match (&mut self.primary, primary) {
            (RateForm::Arrhenius(mine), RateForm::Arrhenius(theirs)) => {
                for triple in theirs.arr {
                    if policy == DuplicatePolicy::Strict || !mine.arr.contains(&triple) {
                        mine.arr.push(triple);
                    }
                }
            }
            (_, theirs) => self.duplicates.push(theirs),
        }
        self.duplicates.extend(duplicates);
    }

    pub fn is_finite(&self) -> bool {
        self.primary.is_finite()
            && self.duplicates.iter().all(|d| d.is_finite())
            && self
                .colliders
                .as_ref()
                .map(|c| c.values().all(|v| v.is_finite()))
                .unwrap_or(true)
    }

    pub fn scale_units(&mut self, scale: &UnitScale) {
        self.primary.scale_units(scale);
        for dup in self.duplicates.iter_mut() {
            dup.scale_units(scale);
        }
    }

    /// Checks the invariants that tie the rate forms to the reaction identity.
    pub fn validate(&self, id: &ReactionId) -> Result<(), ChemkinError> {
        for form in std::iter::once(&self.primary).chain(self.duplicates.iter()) {
            if form.requires_third_body() && id.third_body.is_absent() {
                return Err(ChemkinError::MissingThirdBody {
                    reaction: id.to_string(),
                    form: form.kind().to_string(),
                });
            }
            if let RateForm::Chebyshev(cheb) = form {
                if cheb.alpha.nrows() == 0 || cheb.alpha.ncols() == 0 {
                    return Err(ChemkinError::ChebyshevCoeffMismatch {
                        reaction: id.to_string(),
                        expected: 1,
                        found: 0,
                    });
                }
            }
        }
        Ok(())
    }
}

/// table summary of a parsed mechanism
pub fn pretty_print_mechanism(params: &ReactionMap<RateParams>) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Reaction"),
        Cell::new("Forms"),
        Cell::new("Duplicates"),
        Cell::new("Colliders"),
    ]));
    for (id, rate) in params.iter() {
        let forms: Vec<String> = rate.existing_forms().iter().map(|f| f.to_string()).collect();
        let dups: Vec<String> = rate
            .duplicate_counts()
            .iter()
            .map(|(k, v)| format!("{}:{}", k, v))
            .collect();
        let colliders = rate
            .colliders
            .as_ref()
            .map(|c| c.keys().cloned().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        table.add_row(Row::new(vec![
            Cell::new(&id.to_string()),
            Cell::new(&forms.join(", ")),
            Cell::new(&dups.join(", ")),
            Cell::new(&colliders),
        ]));
    }
    table.to_string()
}
