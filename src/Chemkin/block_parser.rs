//! # Reaction-block parser
//!
//! Reads the `REACTIONS ... END` section of a CHEMKIN mechanism into three
//! dictionaries keyed by [`ReactionId`] that always share the same keys:
//! rate parameters, comments and the verbatim text of every entry.
//!
//! ## Entry recognition
//! The block is scanned line by line. An *equation line* (reaction equation plus
//! A, n, Ea) opens an entry; keyword lines (`LOW`, `TROE`, `PLOG`, `CHEB`,
//! `TCHEB`, `PCHEB`), collider lines and `DUP` markers extend it; a blank line
//! closes it. Comment-only lines directly below an entry are its footer,
//! comment-only lines after a blank line are the header of the next entry.
//!
//! ## Usage
//! ```rust, ignore
//! use KiMech::Chemkin::block_parser::ChemkinParser;
//! use KiMech::settings::ChemkinSettings;
//!
//! let parser = ChemkinParser::for_block(block, ChemkinSettings::default())?;
//! let params = parser.parse_reactions(block)?;
//! for (id, rate) in params.iter() {
//!     println!("{} -> {:?}", id, rate.existing_forms());
//! }
//! ```
use super::chemkin_errors::ChemkinError;
use super::grammar::{
    ContinuationLine, Keyword, classify_continuation, is_equation_line, split_comment,
    split_equation_line,
};
use super::rate_params::{
    Arrhenius, Colliders, FormKind, PlogStruct, RateParams, TroeParams, UnitScale,
};
use super::reaction_id::{ReactionId, ReactionMap};
use super::units::{AUnits, EaUnits, declared_units};
use crate::settings::{BadFitPolicy, ChemkinSettings, DuplicatePolicy};
use linear_map::LinearMap;
use log::{info, warn};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::str::SplitInclusive;

/// header, inline and footer comments of one reaction; each keeps its `!`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Comments {
    pub header: String,
    pub inline: String,
    pub footer: String,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.inline.is_empty() && self.footer.is_empty()
    }
}

/// verbatim text of a reaction together with the byte ranges it occupies in the block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEntry {
    pub text: String,
    /// one range per occurrence (duplicates occupy several), in source order;
    /// each range starts at the equation line and ends after the last continuation line
    pub spans: Vec<Range<usize>>,
}

/////////////////////////ENTRY SCANNER//////////////////////////////////////////////////
/// one reaction entry as found in the text, before its continuation lines are interpreted
#[derive(Debug, Clone)]
pub(crate) struct ScannedEntry<'a> {
    pub id: ReactionId,
    pub numbers: [f64; 3],
    /// code part of every continuation line, trimmed
    pub continuation: Vec<&'a str>,
    pub span: Range<usize>,
    pub comments: Comments,
}

/// Line-oriented state machine over a reactions block.
/// `closed == false` with an open entry is the BODY state, everything else is INIT.
pub(crate) struct EntryScanner<'a> {
    lines: SplitInclusive<'a, char>,
    offset: usize,
    current: Option<ScannedEntry<'a>>,
    closed: bool,
    pending_header: Vec<&'a str>,
    pending_footer: Vec<&'a str>,
    done: bool,
}

impl<'a> EntryScanner<'a> {
    pub fn new(block: &'a str) -> Self {
        Self {
            lines: block.split_inclusive('\n'),
            offset: 0,
            current: None,
            closed: true,
            pending_header: Vec::new(),
            pending_footer: Vec::new(),
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<ScannedEntry<'a>>, ChemkinError> {
        loop {
            if self.done {
                return Ok(self.finish());
            }
            let Some(line) = self.lines.next() else {
                self.done = true;
                continue;
            };
            let start = self.offset;
            self.offset += line.len();
            let (code, comment) = split_comment(line);
            let code = code.trim();

            if code.is_empty() {
                match comment {
                    Some(comment) if self.current.is_some() && !self.closed => {
                        self.pending_footer.push(comment)
                    }
                    Some(comment) => self.pending_header.push(comment),
                    None => self.close_current(),
                }
                continue;
            }
            let first = code
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_uppercase();
            if first == "END" {
                self.done = true;
                continue;
            }
            if first.starts_with("REAC") && !is_equation_line(code) {
                continue;
            }
            if is_equation_line(code) {
                let (equation, numbers) = split_equation_line(code)?;
                let id = ReactionId::from_equation(equation)?;
                let entry = ScannedEntry {
                    id,
                    numbers,
                    continuation: Vec::new(),
                    span: start..start + line.len(),
                    comments: Comments {
                        header: std::mem::take(&mut self.pending_header).join("\n"),
                        inline: comment.unwrap_or("").to_string(),
                        footer: String::new(),
                    },
                };
                self.close_current();
                let previous = self.current.replace(entry);
                self.closed = false;
                if previous.is_some() {
                    return Ok(previous);
                }
                continue;
            }
            // continuation line
            let Some(entry) = self.current.as_mut() else {
                return Err(ChemkinError::OrphanContinuation(code.to_string()));
            };
            if self.closed {
                // a blank line inside the entry: the comments seen since belong to its body
                entry.comments.footer.clear();
                self.pending_header.clear();
                self.closed = false;
            }
            self.pending_footer.clear();
            entry.continuation.push(code);
            entry.span.end = start + line.len();
        }
    }

    /// BODY -> INIT: the comments collected since the last code line become the footer
    fn close_current(&mut self) {
        if self.closed {
            return;
        }
        if let Some(entry) = self.current.as_mut() {
            entry.comments.footer = std::mem::take(&mut self.pending_footer).join("\n");
        }
        self.closed = true;
    }

    /// end of block: trailing comments join the footer of the last entry
    fn finish(&mut self) -> Option<ScannedEntry<'a>> {
        self.close_current();
        let mut entry = self.current.take()?;
        if !self.pending_header.is_empty() {
            let trailing = std::mem::take(&mut self.pending_header).join("\n");
            if entry.comments.footer.is_empty() {
                entry.comments.footer = trailing;
            } else {
                entry.comments.footer = format!("{}\n{}", entry.comments.footer, trailing);
            }
        }
        Some(entry)
    }
}

impl<'a> Iterator for EntryScanner<'a> {
    type Item = Result<ScannedEntry<'a>, ChemkinError>;
    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                self.current = None;
                Some(Err(e))
            }
        }
    }
}

/////////////////////////PARSER/////////////////////////////////////////////////////////
/// Reads reaction blocks with a fixed set of settings and unit conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemkinParser {
    pub settings: ChemkinSettings,
    pub ea_units: EaUnits,
    pub a_units: AUnits,
}

impl Default for ChemkinParser {
    fn default() -> Self {
        Self::new(ChemkinSettings::default())
    }
}

impl ChemkinParser {
    /// parser using the units the settings assume
    pub fn new(settings: ChemkinSettings) -> Self {
        Self {
            ea_units: settings.ea_units,
            a_units: settings.a_units,
            settings,
        }
    }

    pub fn with_units(mut self, ea_units: EaUnits, a_units: AUnits) -> Self {
        self.ea_units = ea_units;
        self.a_units = a_units;
        self
    }

    /// parser using the units declared on the `REACTIONS` line of `block`,
    /// the settings' units for whatever the line leaves out
    pub fn for_block(block: &str, settings: ChemkinSettings) -> Result<Self, ChemkinError> {
        let (ea_units, a_units) = declared_units(block)?;
        let parser = Self::new(settings);
        let ea_units = ea_units.unwrap_or(parser.ea_units);
        let a_units = a_units.unwrap_or(parser.a_units);
        Ok(parser.with_units(ea_units, a_units))
    }

    /// Parses every entry of the block into canonical-unit rate parameters,
    /// merging repeated reactions in source order.
    /// Under `BadFitPolicy::Skip` the result can lack reactions that the raw
    /// entry and comment maps of the same block still hold.
    pub fn parse_reactions(&self, block: &str) -> Result<ReactionMap<RateParams>, ChemkinError> {
        let mut parsed: Vec<(ReactionId, RateParams)> = Vec::new();
        // reaction -> (occurrences, every occurrence carried DUP)
        let mut markers: HashMap<ReactionId, (usize, bool)> = HashMap::new();
        for entry in EntryScanner::new(block) {
            let entry = entry?;
            let (params, has_dup) = self.build_rate_params(&entry)?;
            let marker = markers.entry(entry.id.clone()).or_insert((0, true));
            marker.0 += 1;
            marker.1 &= has_dup;
            if !params.is_finite() {
                match self.settings.bad_fits {
                    BadFitPolicy::Keep => {
                        warn!("Reaction {} has non-finite rate parameters", entry.id)
                    }
                    BadFitPolicy::Skip => {
                        warn!("Reaction {} skipped: non-finite rate parameters", entry.id);
                        continue;
                    }
                    BadFitPolicy::Reject => {
                        return Err(ChemkinError::BadFit {
                            reaction: entry.id.to_string(),
                        });
                    }
                }
            }
            parsed.push((entry.id, params));
        }
        for (id, (count, all_marked)) in markers.iter() {
            if *count > 1 && !*all_marked {
                warn!("Reaction {} occurs {} times without DUP on every entry", id, count);
            } else if *count == 1 && *all_marked {
                warn!("Reaction {} is marked DUP but occurs once", id);
            }
        }
        let params = fix_duplicates(parsed, self.settings.duplicates);
        info!("Parsed {} reactions", params.len());
        Ok(params)
    }

    fn build_rate_params(&self, entry: &ScannedEntry) -> Result<(RateParams, bool), ChemkinError> {
        let reaction = entry.id.to_string();
        let mut low: Option<Arrhenius> = None;
        let mut troe: Option<TroeParams> = None;
        let mut plog: Option<PlogStruct> = None;
        let mut tcheb: Option<(f64, f64)> = None;
        let mut pcheb: Option<(f64, f64)> = None;
        let mut cheb_dims: Option<(usize, usize)> = None;
        let mut cheb_coeffs: Vec<f64> = Vec::new();
        let mut colliders: Option<Colliders> = None;
        let mut has_dup = false;

        for line in &entry.continuation {
            let unknown = || ChemkinError::UnknownKeyword {
                line: line.to_string(),
                reaction: reaction.clone(),
            };
            match classify_continuation(line).map_err(|_| unknown())? {
                ContinuationLine::Dup => has_dup = true,
                ContinuationLine::Colliders(pairs) => {
                    let map = colliders.get_or_insert_with(LinearMap::new);
                    for (name, eff) in pairs {
                        map.insert(name, eff);
                    }
                }
                ContinuationLine::Keyword(Keyword::Low, v) => low = Some(Arrhenius::new(v[0], v[1], v[2])),
                ContinuationLine::Keyword(Keyword::Troe, v) => troe = TroeParams::from_slice(&v),
                ContinuationLine::Keyword(Keyword::Plog, v) => plog
                    .get_or_insert_with(PlogStruct::new)
                    .push(v[0], Arrhenius::new(v[1], v[2], v[3])),
                ContinuationLine::Keyword(Keyword::Tcheb, v) => tcheb = Some((v[0], v[1])),
                ContinuationLine::Keyword(Keyword::Pcheb, v) => pcheb = Some((v[0], v[1])),
                ContinuationLine::Keyword(Keyword::Cheb, v) => match cheb_dims {
                    Some(_) => cheb_coeffs.extend(v),
                    None => {
                        let dims = chebyshev_dims(&v).ok_or_else(unknown)?;
                        cheb_dims = Some(dims);
                        cheb_coeffs.extend(&v[2..]);
                    }
                },
            }
        }

        let has_cheb = cheb_dims.is_some() || tcheb.is_some() || pcheb.is_some();
        let mut present: Vec<FormKind> = Vec::new();
        if plog.is_some() {
            present.push(FormKind::Plog);
        }
        if has_cheb {
            present.push(FormKind::Cheb);
        }
        if low.is_some() {
            present.push(if troe.is_some() {
                FormKind::Troe
            } else {
                FormKind::Lind
            });
        }
        if present.len() > 1 {
            return Err(ChemkinError::ConflictingForms {
                reaction,
                first: present[0].to_string(),
                second: present[1].to_string(),
            });
        }
        if troe.is_some() && low.is_none() {
            return Err(ChemkinError::InconsistentTroe { reaction });
        }

        let header = Arrhenius::from(entry.numbers);
        let mut params = if let Some(plog) = plog {
            RateParams::plog(plog)
        } else if has_cheb {
            let (rows, cols) = cheb_dims.ok_or(ChemkinError::ChebyshevCoeffMismatch {
                reaction: reaction.clone(),
                expected: 1,
                found: 0,
            })?;
            let needed = rows.checked_mul(cols).ok_or_else(|| ChemkinError::UnknownKeyword {
                line: format!("CHEB / {} {} /", rows, cols),
                reaction: reaction.clone(),
            })?;
            if cheb_coeffs.len() < needed {
                return Err(ChemkinError::ChebyshevCoeffMismatch {
                    reaction,
                    expected: needed,
                    found: cheb_coeffs.len(),
                });
            }
            let alpha = DMatrix::from_row_slice(rows, cols, &cheb_coeffs[..needed]);
            let tlim = tcheb.unwrap_or_else(|| {
                warn!("Reaction {}: no TCHEB line, using default temperature limits", reaction);
                self.settings.cheb_tlim_default
            });
            let plim = pcheb.unwrap_or_else(|| {
                warn!("Reaction {}: no PCHEB line, using default pressure limits", reaction);
                self.settings.cheb_plim_default
            });
            let one_atm_arr = if header.is_zero() { None } else { Some(header) };
            RateParams::chebyshev(tlim, plim, alpha, one_atm_arr)
        } else if let Some(low) = low {
            match troe {
                Some(troe) => RateParams::troe(header, low, troe),
                None => RateParams::lindemann(header, low),
            }
        } else {
            RateParams::arrhenius(vec![header])
        };
        params.colliders = colliders;
        params.validate(&entry.id)?;

        let molecularity = entry.id.molecularity();
        params.scale_units(&UnitScale {
            a: self.a_units.to_moles(molecularity),
            a_low: self
                .a_units
                .to_moles(molecularity + usize::from(self.settings.low_pressure_collider)),
            ea: self.ea_units.to_cal_per_mole(),
        });
        Ok((params, has_dup))
    }
}

/// largest Chebyshev basis size accepted along either axis
const MAX_CHEB_DIM: f64 = 64.0;

/// `CHEB / N M ... /`: the first two values are the positive integer dimensions
fn chebyshev_dims(values: &[f64]) -> Option<(usize, usize)> {
    if values.len() < 2 {
        return None;
    }
    let is_dim = |v: f64| (1.0..=MAX_CHEB_DIM).contains(&v) && v.fract() == 0.0;
    if is_dim(values[0]) && is_dim(values[1]) {
        Some((values[0] as usize, values[1] as usize))
    } else {
        None
    }
}

/// Folds repeated reactions into the first occurrence, in source order.
pub fn fix_duplicates<I>(entries: I, policy: DuplicatePolicy) -> ReactionMap<RateParams>
where
    I: IntoIterator<Item = (ReactionId, RateParams)>,
{
    let mut merged: ReactionMap<RateParams> = ReactionMap::new();
    for (id, params) in entries {
        match merged.get_mut(&id) {
            Some(first) => first.combine_with(params, policy),
            None => {
                merged.insert(id, params);
            }
        }
    }
    merged
}

/////////////////////////FREE FUNCTIONS/////////////////////////////////////////////////
/// Parses a reactions block whose numbers are in the given units
/// (e.g. `"kcal/mole"`, `"molecules"`), with default settings.
pub fn parse_reactions(
    block: &str,
    ea_units: &str,
    a_units: &str,
) -> Result<ReactionMap<RateParams>, ChemkinError> {
    let ea_units: EaUnits = ea_units.parse()?;
    let a_units: AUnits = a_units.parse()?;
    ChemkinParser::default()
        .with_units(ea_units, a_units)
        .parse_reactions(block)
}

/// Verbatim text and byte spans of every reaction entry.
pub fn parse_raw_entries(block: &str) -> Result<ReactionMap<RawEntry>, ChemkinError> {
    let mut raw: ReactionMap<RawEntry> = ReactionMap::new();
    for entry in EntryScanner::new(block) {
        let entry = entry?;
        let text = &block[entry.span.clone()];
        match raw.get_mut(&entry.id) {
            Some(existing) => {
                existing.text.push_str(text);
                existing.spans.push(entry.span);
            }
            None => {
                raw.insert(
                    entry.id,
                    RawEntry {
                        text: text.to_string(),
                        spans: vec![entry.span],
                    },
                );
            }
        }
    }
    Ok(raw)
}

pub fn parse_raw_strings(block: &str) -> Result<ReactionMap<String>, ChemkinError> {
    Ok(parse_raw_entries(block)?
        .into_iter()
        .map(|(id, raw)| (id, raw.text))
        .collect())
}

/// Comments of every reaction. A repeated reaction keeps the header and inline
/// comment of its first entry and the footers of all its entries.
pub fn parse_comments(block: &str) -> Result<ReactionMap<Comments>, ChemkinError> {
    let mut comments: ReactionMap<Comments> = ReactionMap::new();
    for entry in EntryScanner::new(block) {
        let entry = entry?;
        match comments.get_mut(&entry.id) {
            Some(first) => {
                let footer = entry.comments.footer;
                if first.footer.is_empty() {
                    first.footer = footer;
                } else if !footer.is_empty() {
                    first.footer = format!("{}\n{}", first.footer, footer);
                }
            }
            None => {
                comments.insert(entry.id, entry.comments);
            }
        }
    }
    Ok(comments)
}
