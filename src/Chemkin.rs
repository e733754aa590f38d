//! # CHEMKIN reaction blocks
//!
//! ## Aim
//! Reading, writing and editing the `REACTIONS` section of CHEMKIN mechanism files.
//!
//! ## Main structures
//! - `ReactionId`: canonical identity of a reaction (reactants, products, third body)
//! - `RateParams`: rate expression of a reaction (Arrhenius, Lindemann, Troe,
//!   Chebyshev or PLOG) with collider efficiencies and duplicate expressions
//! - `ChemkinParser`: block reader configured by `ChemkinSettings`
//!
//! ## Data flow
//! raw text -> `grammar` tokens -> `block_parser` -> (`ReactionMap<RateParams>`,
//! comments, raw entries) -> `block_writer` -> raw text.
//! Parsing the written block gives back the same rate parameters.
//!
//! ## Example
//! ```rust, ignore
//! use KiMech::Chemkin::block_parser::{parse_raw_entries, parse_reactions};
//! use KiMech::Chemkin::block_writer::replace_in_block;
//!
//! let params = parse_reactions(block, "cal/mole", "moles")?;
//! let raw = parse_raw_entries(block)?;
//! let new_block = replace_in_block(block, &raw, &replacements, None)?;
//! ```
pub mod block_parser;
pub mod block_writer;
pub mod chemkin_errors;
pub mod grammar;
pub mod pes_index;
pub mod rate_params;
pub mod reaction_id;
pub mod units;

mod block_parser_tests;
