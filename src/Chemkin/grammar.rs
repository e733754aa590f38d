//! Terminal tokens of CHEMKIN rate lines.
//!
//! Everything here works on a single line (or a single side of an equation)
//! and knows nothing about reactions as a whole: species names, arrows,
//! third-body notations, numbers in Fortran or C style, slash-delimited
//! parameter lists and `!` comments.
use super::chemkin_errors::ChemkinError;
use regex::Regex;
use std::sync::LazyLock;

/// signed decimal with optional E/D exponent, or a nan/inf sentinel
const NUMBER: &str = r"[+-]?(?:(?:\d+\.?\d*|\.\d+)(?:[eEdD][+-]?\d+)?|(?i:nan|inf(?:inity)?))";

static SPECIES_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9#,()_*\[\]][A-Za-z0-9#,()\-_*\[\]]*\+?$").unwrap()
});
static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^{}$", NUMBER)).unwrap());
static EQUATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?P<eq>.*?\S)\s+(?P<a>{n})\s+(?P<n>{n})\s+(?P<ea>{n})\s*$",
        n = NUMBER
    ))
    .unwrap()
});
static ARROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*(<=>|=>|=)\s*").unwrap());
static FALLOFF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\+\s*(?P<name>[^()\s]+)\s*\)\s*$").unwrap());
static MULTIPLIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<count>\d+)\s*(?P<name>[A-Za-z(\[].*)$").unwrap());
static KEYWORD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<kw>[A-Za-z]+)\s*/(?P<body>[^/]*)/\s*$").unwrap()
});
static COLLIDER_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<name>[^\s/]+)\s*/\s*(?P<val>[^/]*?)\s*/").unwrap()
});

/// auxiliary keywords that carry a slash list of numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Low,
    Troe,
    Plog,
    Cheb,
    Tcheb,
    Pcheb,
}

impl Keyword {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_uppercase().as_str() {
            "LOW" => Some(Keyword::Low),
            "TROE" => Some(Keyword::Troe),
            "PLOG" => Some(Keyword::Plog),
            "CHEB" => Some(Keyword::Cheb),
            "TCHEB" => Some(Keyword::Tcheb),
            "PCHEB" => Some(Keyword::Pcheb),
            _ => None,
        }
    }
    /// admissible counts of values between the slashes; empty means any
    fn arity(&self) -> &'static [usize] {
        match self {
            Keyword::Low => &[3],
            Keyword::Troe => &[3, 4],
            Keyword::Plog => &[4],
            Keyword::Tcheb | Keyword::Pcheb => &[2],
            Keyword::Cheb => &[],
        }
    }
}

/// a classified continuation line (comment already stripped)
#[derive(Debug, Clone, PartialEq)]
pub enum ContinuationLine {
    Keyword(Keyword, Vec<f64>),
    Colliders(Vec<(String, f64)>),
    Dup,
}

/// Splits a line into its code part and its `!` comment (kept with the `!`,
/// trailing whitespace removed).
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.find('!') {
        Some(pos) => (&line[..pos], Some(line[pos..].trim_end())),
        None => (line, None),
    }
}

pub fn is_species_name(token: &str) -> bool {
    SPECIES_NAME.is_match(token)
}

pub fn is_number(token: &str) -> bool {
    NUMBER_TOKEN.is_match(token)
}

/// Parses a CHEMKIN number: Fortran `D` exponents and `nan`/`inf` sentinels
/// are accepted.
pub fn parse_number(token: &str) -> Result<f64, ChemkinError> {
    let token = token.trim();
    if !is_number(token) {
        return Err(ChemkinError::MalformedNumber(token.to_string()));
    }
    let normalized = token.replace(['D', 'd'], "E");
    normalized
        .parse::<f64>()
        .map_err(|_| ChemkinError::MalformedNumber(token.to_string()))
}

/// true when the line carries a reaction equation (it has an arrow outside the comment)
pub fn is_equation_line(code: &str) -> bool {
    code.contains('=')
}

/// Splits an equation line into the equation text and its A, n, Ea tokens.
pub fn split_equation_line(code: &str) -> Result<(&str, [f64; 3]), ChemkinError> {
    let caps = EQUATION_LINE
        .captures(code)
        .ok_or_else(|| ChemkinError::MalformedEquation {
            line: code.trim().to_string(),
            reason: "expected the equation followed by exactly three numbers".to_string(),
        })?;
    let eq = caps.name("eq").map(|m| m.as_str()).unwrap_or("");
    let mut numbers = [0.0; 3];
    for (slot, name) in numbers.iter_mut().zip(["a", "n", "ea"]) {
        let token = caps.name(name).map(|m| m.as_str()).unwrap_or("");
        *slot = parse_number(token)?;
    }
    Ok((eq, numbers))
}

/// Splits equation text at the arrow into (reactant side, product side).
pub fn split_at_arrow(equation: &str) -> Option<(&str, &str)> {
    let m = ARROW.find(equation)?;
    Some((&equation[..m.start()], &equation[m.end()..]))
}

/// Removes a trailing `(+M)` / `(+Name)` from one side of an equation and
/// returns the remaining text together with the name inside the parentheses.
pub fn strip_falloff(side: &str) -> (&str, Option<String>) {
    match FALLOFF.captures(side) {
        Some(caps) => {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(side.len());
            let name = caps.name("name").map(|m| m.as_str().to_string());
            (side[..start].trim_end(), name)
        }
        None => (side, None),
    }
}

/// Splits one side of an equation on the species separator `+`.
/// A `+` belongs to the species name when it is immediately followed by another
/// `+` or when it ends the side (ions such as `H3O+`); a `+` inside parentheses
/// is never a separator.
pub fn split_side(side: &str) -> Vec<String> {
    let chars: Vec<char> = side.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            '+' if depth == 0 => {
                let rest = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                let glued = i > 0 && !chars[i - 1].is_whitespace();
                match rest {
                    Some('+') if glued => current.push(c),
                    None if glued => current.push(c),
                    _ => {
                        tokens.push(current.trim().to_string());
                        current.clear();
                    }
                }
            }
            _ => current.push(c),
        }
    }
    tokens.push(current.trim().to_string());
    tokens.into_iter().filter(|t| !t.is_empty()).collect()
}

/// Expands a leading integer multiplier: `2OH` -> `["OH", "OH"]`.
pub fn expand_multiplier(token: &str) -> Option<Vec<String>> {
    if let Some(caps) = MULTIPLIER.captures(token) {
        let count: usize = caps["count"].parse().ok()?;
        let name = caps["name"].trim();
        if count == 0 || !is_species_name(name) {
            return None;
        }
        return Some(vec![name.to_string(); count]);
    }
    if is_species_name(token) {
        Some(vec![token.to_string()])
    } else {
        None
    }
}

fn slash_values(body: &str) -> Result<Vec<f64>, ChemkinError> {
    body.split_whitespace().map(parse_number).collect()
}

/// Classifies a continuation line: `LOW`/`TROE`/`PLOG`/`CHEB`/`TCHEB`/`PCHEB`
/// lists, `DUP` markers and `Name/eff/` collider lists. `Err` carries the
/// offending text and is turned into `UnknownKeyword` by the caller.
pub fn classify_continuation(code: &str) -> Result<ContinuationLine, String> {
    let trimmed = code.trim();
    let upper = trimmed.to_uppercase();
    if upper == "DUP" || upper == "DUPLICATE" {
        return Ok(ContinuationLine::Dup);
    }
    if let Some(caps) = KEYWORD_LINE.captures(trimmed) {
        if let Some(keyword) = Keyword::from_token(&caps["kw"]) {
            let values = slash_values(&caps["body"]).map_err(|_| trimmed.to_string())?;
            let allowed = keyword.arity();
            let arity_ok = if allowed.is_empty() {
                !values.is_empty()
            } else {
                allowed.contains(&values.len())
            };
            if !arity_ok {
                return Err(trimmed.to_string());
            }
            return Ok(ContinuationLine::Keyword(keyword, values));
        }
    }
    parse_colliders(trimmed)
        .map(ContinuationLine::Colliders)
        .ok_or_else(|| trimmed.to_string())
}

/// Parses `Name/eff/ Name/eff/ ...`; every byte outside the pairs must be whitespace.
pub fn parse_colliders(code: &str) -> Option<Vec<(String, f64)>> {
    let mut pairs = Vec::new();
    let mut cursor = 0;
    for caps in COLLIDER_PAIR.captures_iter(code) {
        let whole = caps.get(0)?;
        if !code[cursor..whole.start()].trim().is_empty() {
            return None;
        }
        cursor = whole.end();
        let name = caps["name"].to_string();
        if Keyword::from_token(&name).is_some() {
            return None;
        }
        let value = parse_number(&caps["val"]).ok()?;
        pairs.push((name, value));
    }
    if pairs.is_empty() || !code[cursor..].trim().is_empty() {
        return None;
    }
    Some(pairs)
}
