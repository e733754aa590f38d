use crate::Chemkin::block_parser::ChemkinParser;
use crate::Chemkin::chemkin_errors::ChemkinError;
use crate::Chemkin::grammar::split_comment;
use crate::Chemkin::rate_params::RateParams;
use crate::Chemkin::reaction_id::ReactionMap;
use crate::Chemkin::units::{AUnits, EaUnits, reaction_units};
use crate::settings::ChemkinSettings;
use log::{info, warn};
use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::Path;

/// keyword sections of a CHEMKIN mechanism file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Elements,
    Species,
    Thermo,
    Reactions,
}

impl Section {
    pub fn keyword(&self) -> &'static str {
        match self {
            Section::Elements => "ELEMENTS",
            Section::Species => "SPECIES",
            Section::Thermo => "THERMO",
            Section::Reactions => "REACTIONS",
        }
    }
    /// the full keyword or any prefix of it of at least four letters (`ELEM`, `REAC`, ...)
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.to_uppercase();
        if token.len() < 4 {
            return None;
        }
        [
            Section::Elements,
            Section::Species,
            Section::Thermo,
            Section::Reactions,
        ]
        .into_iter()
        .find(|section| section.keyword().starts_with(&token))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// A whole mechanism file held in memory. Sections are located by their
/// keyword line and the first `END` line after it.
pub struct MechanismFile {
    pub file_name: String,
    pub content: String,
    sections: Vec<(Section, Range<usize>)>,
}

impl MechanismFile {
    pub fn new(file_name: String, content: String) -> Self {
        let sections = locate_sections(&content);
        MechanismFile {
            file_name,
            content,
            sections,
        }
    }

    pub fn from_file(file_name: &str) -> Result<Self, ChemkinError> {
        let path = Path::new(file_name);
        if !path.exists() {
            return Err(ChemkinError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File '{}' does not exist", file_name),
            )));
        }
        let content = fs::read_to_string(path)?;
        let mechanism = Self::new(file_name.to_string(), content);
        info!(
            "Loaded mechanism file '{}' with sections {:?}",
            file_name,
            mechanism
                .sections
                .iter()
                .map(|(s, _)| s.keyword())
                .collect::<Vec<_>>()
        );
        Ok(mechanism)
    }

    /// byte range of a section from its keyword line through its `END` line
    pub fn section_range(&self, section: Section) -> Option<Range<usize>> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, range)| range.clone())
    }

    pub fn section(&self, section: Section) -> Result<&str, ChemkinError> {
        let range = self
            .section_range(section)
            .ok_or_else(|| ChemkinError::MissingSection(section.keyword().to_string()))?;
        Ok(&self.content[range])
    }

    pub fn reaction_block(&self) -> Result<&str, ChemkinError> {
        self.section(Section::Reactions)
    }

    pub fn elements(&self) -> Result<Vec<String>, ChemkinError> {
        Ok(section_tokens(self.section(Section::Elements)?))
    }

    pub fn species(&self) -> Result<Vec<String>, ChemkinError> {
        Ok(section_tokens(self.section(Section::Species)?))
    }

    pub fn reaction_units(&self) -> Result<(EaUnits, AUnits), ChemkinError> {
        reaction_units(self.reaction_block()?)
    }

    /// rate parameters of the reactions section, in the units its header declares
    pub fn parse_reactions(
        &self,
        settings: ChemkinSettings,
    ) -> Result<ReactionMap<RateParams>, ChemkinError> {
        let block = self.reaction_block()?;
        ChemkinParser::for_block(block, settings)?.parse_reactions(block)
    }

    /// File content with the reactions section replaced by `block`; every byte
    /// outside the section is kept.
    pub fn with_reaction_block(&self, block: &str) -> Result<String, ChemkinError> {
        let range = self
            .section_range(Section::Reactions)
            .ok_or_else(|| ChemkinError::MissingSection(Section::Reactions.keyword().to_string()))?;
        let mut out = String::with_capacity(self.content.len() + block.len());
        out.push_str(&self.content[..range.start]);
        out.push_str(block);
        if !block.ends_with('\n') && range.end < self.content.len() {
            out.push('\n');
        }
        out.push_str(&self.content[range.end..]);
        Ok(out)
    }

    pub fn save_with_reaction_block(&self, block: &str, file_name: &str) -> Result<(), ChemkinError> {
        let content = self.with_reaction_block(block)?;
        fs::write(file_name, content)?;
        info!("Saved mechanism to '{}'", file_name);
        Ok(())
    }
}

fn locate_sections(content: &str) -> Vec<(Section, Range<usize>)> {
    let mut found = Vec::new();
    let mut open: Option<(Section, usize)> = None;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let (code, _) = split_comment(line);
        let tokens: Vec<&str> = code.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            continue;
        };
        match open {
            None => {
                if let Some(section) = Section::from_token(first) {
                    // one-line sections: `ELEMENTS H O N AR END`
                    if tokens[1..].iter().any(|t| t.eq_ignore_ascii_case("END")) {
                        found.push((section, start..offset));
                    } else {
                        open = Some((section, start));
                    }
                }
            }
            Some((section, begin)) => {
                if first.eq_ignore_ascii_case("END") {
                    found.push((section, begin..offset));
                    open = None;
                }
            }
        }
    }
    if let Some((section, begin)) = open {
        warn!("Section {} is not closed by END", section);
        found.push((section, begin..content.len()));
    }
    found
}

/// names listed in an ELEMENTS or SPECIES section
fn section_tokens(section: &str) -> Vec<String> {
    let mut names = Vec::new();
    for (i, line) in section.lines().enumerate() {
        let (code, _) = split_comment(line);
        let mut tokens = code.split_whitespace();
        if i == 0 {
            tokens.next();
        }
        for token in tokens {
            if token.eq_ignore_ascii_case("END") {
                return names;
            }
            names.push(token.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Chemkin::reaction_id::ReactionId;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MECHANISM: &str = "! toy hydrogen mechanism
ELEM H O N AR END
SPECIES
H2 O2 H O ! radicals
OH HO2 N2 AR
END
THERMO ALL
   300.000  1000.000  5000.000
END
REACTIONS   KCAL/MOLE   MOLES
H+O2=OH+O   3.547E+15   -0.406   16.6

H+O2(+M)=HO2(+M)   4.650E+12   0.440   0
  LOW  /  5.750E+19   -1.400   0 /
END
";

    fn mechanism_file() -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", MECHANISM).unwrap();
        temp_file
    }

    #[test]
    fn test_sections_and_lists() {
        let temp_file = mechanism_file();
        let mechanism = MechanismFile::from_file(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(mechanism.elements().unwrap(), vec!["H", "O", "N", "AR"]);
        assert_eq!(
            mechanism.species().unwrap(),
            vec!["H2", "O2", "H", "O", "OH", "HO2", "N2", "AR"]
        );
        assert!(mechanism.section(Section::Thermo).unwrap().starts_with("THERMO ALL"));
        let block = mechanism.reaction_block().unwrap();
        assert!(block.starts_with("REACTIONS"));
        assert!(block.ends_with("END\n"));
        assert_eq!(
            mechanism.reaction_units().unwrap(),
            (EaUnits::KcalMole, AUnits::Moles)
        );
    }

    #[test]
    fn test_parse_reactions_in_declared_units() {
        let mechanism = MechanismFile::new("inline".to_string(), MECHANISM.to_string());
        let params = mechanism.parse_reactions(ChemkinSettings::default()).unwrap();
        assert_eq!(params.len(), 2);
        let rate = params
            .get(&ReactionId::from_equation("H+O2=OH+O").unwrap())
            .unwrap();
        if let crate::Chemkin::rate_params::RateForm::Arrhenius(arr) = &rate.primary {
            assert_relative_eq!(arr.arr[0].Ea, 16600.0, max_relative = 1e-12);
        } else {
            panic!("expected an Arrhenius expression");
        }
    }

    #[test]
    fn test_splice_keeps_other_sections() {
        let temp_file = mechanism_file();
        let mechanism = MechanismFile::from_file(temp_file.path().to_str().unwrap()).unwrap();
        let new_block = "REACTIONS\nO+H2=OH+H   5.000E+04   2.670   6290\nEND\n";
        let spliced = mechanism.with_reaction_block(new_block).unwrap();
        let range = mechanism.section_range(Section::Reactions).unwrap();
        assert!(spliced.starts_with(&MECHANISM[..range.start]));
        assert!(spliced.ends_with(new_block));

        let out_file = NamedTempFile::new().unwrap();
        let out_path = out_file.path().to_str().unwrap();
        mechanism.save_with_reaction_block(new_block, out_path).unwrap();
        let reloaded = MechanismFile::from_file(out_path).unwrap();
        assert_eq!(reloaded.reaction_block().unwrap(), new_block);
        assert_eq!(reloaded.elements().unwrap(), mechanism.elements().unwrap());
    }

    #[test]
    fn test_missing_file_and_section() {
        assert!(matches!(
            MechanismFile::from_file("no_such_mechanism.inp"),
            Err(ChemkinError::Io(_))
        ));
        let mechanism = MechanismFile::new("inline".to_string(), "ELEMENTS H O END\n".to_string());
        assert!(matches!(
            mechanism.reaction_block(),
            Err(ChemkinError::MissingSection(_))
        ));
        assert_eq!(Section::from_token("reac"), Some(Section::Reactions));
        assert_eq!(Section::from_token("THE"), None);
    }
}
