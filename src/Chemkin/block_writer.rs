//! # Reaction-block writer
//!
//! Emits a CHEMKIN `REACTIONS` block from parsed rate parameters with a fixed
//! column layout, and edits an existing block in place by substituting only the
//! byte ranges of the reactions being replaced.
//!
//! Numbers follow the Fortran-friendly layout expected by CHEMKIN readers:
//! pre-exponential factors as `1.000E+15`, temperature exponents as fixed
//! point with three decimals and activation energies as whole cal/mol. All
//! values are written in the units they are stored in (cal/mol, moles).
use super::block_parser::{Comments, RawEntry};
use super::chemkin_errors::ChemkinError;
use super::grammar::split_comment;
use super::rate_params::{
    Arrhenius, ArrheniusStruct, ChebyshevStruct, Colliders, PlogStruct, RateExpression, RateForm,
    RateParams, TroeParams,
};
use super::reaction_id::{ReactionId, ReactionMap};
use log::info;
use std::ops::Range;

/// spaces between the longest reaction name and the numeric columns
pub const BUFFER: usize = 5;
pub const BLOCK_HEADER: &str = "REACTIONS     CAL/MOLE     MOLES";

/// Scientific notation with a signed exponent of at least two digits: `1.000E+15`.
pub fn sci(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let formatted = format!("{:.prec$E}", value, prec = precision);
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}E{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

/// width of the reaction-name column for a set of reactions
pub fn column_width<'a, I>(ids: I) -> usize
where
    I: IntoIterator<Item = &'a ReactionId>,
{
    ids.into_iter()
        .map(|id| id.chemkin_name().len())
        .max()
        .unwrap_or(0)
        + BUFFER
}

fn triple(arr: &Arrhenius) -> String {
    format!("{:<10}{:>9.3}{:>9.0}", sci(arr.A, 3), arr.n, arr.Ea)
}

fn equation_line(id: &ReactionId, arr: &Arrhenius, inline: Option<&str>, width: usize) -> String {
    let line = format!("{:<w$}{}", id.chemkin_name(), triple(arr), w = width);
    match inline {
        Some(comment) if !comment.is_empty() => format!("{}   {}\n", line, comment),
        _ => format!("{}\n", line),
    }
}

fn low_line(arr: &Arrhenius, width: usize) -> String {
    format!("{:<w$}{}  /\n", "  LOW  /", triple(arr), w = width)
}

fn troe_line(troe: &TroeParams) -> String {
    let values: String = troe
        .to_vec()
        .iter()
        .map(|v| format!("{:>12}", sci(*v, 3)))
        .collect();
    format!("  TROE /{} /\n", values)
}

fn plog_lines(plog: &PlogStruct, width: usize) -> String {
    let mut lines = String::new();
    // BTreeMap iteration: ascending pressure
    for (pressure, list) in plog.arr.iter() {
        for arr in list {
            lines.push_str(&format!(
                "{:<w$}{:<12}{:<12}{:>9.3}{:>9.0} /\n",
                "  PLOG /",
                sci(pressure.0, 3),
                sci(arr.A, 3),
                arr.n,
                arr.Ea,
                w = width
            ));
        }
    }
    lines
}

fn chebyshev_lines(cheb: &ChebyshevStruct) -> String {
    let mut lines = format!("  TCHEB /{:>12.2}{:>12.2} /\n", cheb.tlim.0, cheb.tlim.1);
    lines.push_str(&format!(
        "  PCHEB /{:>12}{:>12} /\n",
        sci(cheb.plim.0, 3),
        sci(cheb.plim.1, 3)
    ));
    lines.push_str(&format!(
        "  CHEB /{:>12.0}{:>12.0} /\n",
        cheb.alpha.nrows() as f64,
        cheb.alpha.ncols() as f64
    ));
    for row in cheb.alpha.row_iter() {
        let values: String = row.iter().map(|v| format!("{:>12}", sci(*v, 3))).collect();
        lines.push_str(&format!("  CHEB /{} /\n", values));
    }
    lines
}

fn collider_line(colliders: &Colliders) -> String {
    let pairs: String = colliders
        .iter()
        .map(|(name, eff)| format!("{}/{:.3}/   ", name, eff))
        .collect();
    format!("  {}\n", pairs)
}

/// equation line and continuation lines of one form, without `DUP`
fn form_lines(
    id: &ReactionId,
    form: &RateForm,
    colliders: Option<&Colliders>,
    inline: Option<&str>,
    width: usize,
) -> String {
    let mut lines = equation_line(id, &form.header_arr(), inline, width);
    match form {
        RateForm::Arrhenius(_) => {}
        RateForm::Lindemann(lind) => lines.push_str(&low_line(&lind.lowp_arr, width)),
        RateForm::Troe(troe) => {
            lines.push_str(&low_line(&troe.lowp_arr, width));
            lines.push_str(&troe_line(&troe.troe_params));
        }
        RateForm::Chebyshev(cheb) => lines.push_str(&chebyshev_lines(cheb)),
        RateForm::Plog(plog) => lines.push_str(&plog_lines(plog, width)),
    }
    if let Some(colliders) = colliders.filter(|c| !c.is_empty()) {
        lines.push_str(&collider_line(colliders));
    }
    lines
}

/// Lines of one reaction: every duplicate expression becomes its own
/// equation line followed by `DUP`. Comments other than `inline` are not written.
pub fn format_entry(
    id: &ReactionId,
    params: &RateParams,
    inline: Option<&str>,
    width: usize,
) -> String {
    let mut forms: Vec<RateForm> = match &params.primary {
        RateForm::Arrhenius(arr) if arr.arr.len() > 1 => arr
            .arr
            .iter()
            .map(|triple| RateForm::Arrhenius(ArrheniusStruct { arr: vec![*triple] }))
            .collect(),
        primary => vec![primary.clone()],
    };
    forms.extend(params.duplicates.iter().cloned());
    let needs_dup = forms.len() > 1;

    let mut lines = String::new();
    for (i, form) in forms.iter().enumerate() {
        let inline = if i == 0 { inline } else { None };
        lines.push_str(&form_lines(id, form, params.colliders.as_ref(), inline, width));
        if needs_dup {
            lines.push_str("  DUP\n");
        }
    }
    lines
}

fn push_comment(out: &mut String, comment: &str) {
    if !comment.is_empty() {
        out.push_str(comment);
        out.push('\n');
    }
}

/// header comment, entry lines, footer comment and the blank separator line
fn format_commented_entry(
    id: &ReactionId,
    params: &RateParams,
    comments: Option<&Comments>,
    width: usize,
) -> String {
    let mut out = String::new();
    if let Some(c) = comments {
        push_comment(&mut out, &c.header);
    }
    out.push_str(&format_entry(
        id,
        params,
        comments.map(|c| c.inline.as_str()),
        width,
    ));
    if let Some(c) = comments {
        push_comment(&mut out, &c.footer);
    }
    out.push('\n');
    out
}

/// Writes a complete `REACTIONS ... END` block in insertion order.
pub fn emit_reactions(
    params: &ReactionMap<RateParams>,
    comments: Option<&ReactionMap<Comments>>,
) -> String {
    let width = column_width(params.keys());
    let mut block = format!("{}\n\n", BLOCK_HEADER);
    for (id, rate) in params.iter() {
        let entry_comments = comments.and_then(|c| c.get(id));
        block.push_str(&format_commented_entry(id, rate, entry_comments, width));
    }
    block.push_str("END\n\n");
    block
}

/// Replaces the entries of `replacements` inside `block` and leaves every other
/// byte untouched. `raw` must come from `parse_raw_entries` on the same block.
/// A reaction occupying several entries (duplicates) is written at its first
/// entry and its later entries are removed. Reactions the block does not
/// contain are appended before `END`.
pub fn replace_in_block(
    block: &str,
    raw: &ReactionMap<RawEntry>,
    replacements: &ReactionMap<RateParams>,
    comments: Option<&ReactionMap<Comments>>,
) -> Result<String, ChemkinError> {
    let width = column_width(replacements.keys());
    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut appended = String::new();
    let mut appended_count = 0;

    for (id, params) in replacements.iter() {
        let entry_comments = comments.and_then(|c| c.get(id));
        let Some(entry) = raw.get(id) else {
            appended.push_str(&format_commented_entry(id, params, entry_comments, width));
            appended_count += 1;
            continue;
        };
        check_spans(block, id, entry)?;
        let inline = match entry_comments {
            Some(c) => Some(c.inline.clone()),
            None => entry
                .text
                .lines()
                .next()
                .and_then(|first| split_comment(first).1)
                .map(str::to_string),
        };
        let mut spans = entry.spans.iter();
        if let Some(first) = spans.next() {
            edits.push((
                first.clone(),
                format_entry(id, params, inline.as_deref(), width),
            ));
        }
        for later in spans {
            edits.push((later.clone(), String::new()));
        }
    }
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(block.len() + appended.len());
    let mut cursor = 0;
    for (range, text) in &edits {
        out.push_str(&block[cursor..range.start]);
        out.push_str(text);
        cursor = range.end;
    }
    if appended.is_empty() {
        out.push_str(&block[cursor..]);
    } else {
        let end = end_line_offset(block).unwrap_or(block.len()).max(cursor);
        out.push_str(&block[cursor..end]);
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(&appended);
        out.push_str(&block[end..]);
    }
    info!(
        "Replaced {} reaction entries, appended {} reactions",
        edits.len(),
        appended_count
    );
    Ok(out)
}

fn check_spans(block: &str, id: &ReactionId, entry: &RawEntry) -> Result<(), ChemkinError> {
    let stale = || ChemkinError::StaleRawText {
        reaction: id.to_string(),
    };
    let mut text = String::new();
    for span in &entry.spans {
        text.push_str(block.get(span.clone()).ok_or_else(stale)?);
    }
    if text != entry.text {
        return Err(stale());
    }
    Ok(())
}

/// byte offset of the line closing the block
fn end_line_offset(block: &str) -> Option<usize> {
    let mut offset = 0;
    for line in block.split_inclusive('\n') {
        let (code, _) = split_comment(line);
        if code
            .split_whitespace()
            .next()
            .map(|token| token.eq_ignore_ascii_case("END"))
            .unwrap_or(false)
        {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}
