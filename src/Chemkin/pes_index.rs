//! PES side-channel: comment tags of the form `! pes.subpes.channel  1.2.3`
//! that place every reaction of a block on a potential energy surface.
use super::block_parser::EntryScanner;
use super::chemkin_errors::ChemkinError;
use super::reaction_id::ReactionId;
use log::warn;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static PES_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pes\.subpes\.channel\s+(?P<pes>\d+)\.(?P<sub>\d+)\.(?P<chn>\d+)").unwrap()
});

/// (pes index, sub-pes index) -> channels in source order, all indices zero based
pub type PesIndex = BTreeMap<(usize, usize), Vec<(usize, ReactionId)>>;

fn find_tag(text: &str) -> Option<(usize, usize, usize)> {
    let caps = PES_TAG.captures(text)?;
    let index = |name: &str| -> Option<usize> {
        let value: usize = caps.name(name)?.as_str().parse().ok()?;
        value.checked_sub(1)
    };
    Some((index("pes")?, index("sub")?, index("chn")?))
}

/// Collects the PES tags of a block. Returns `Ok(None)` as soon as one reaction
/// carries no tag; the tag is looked up in the header comment first, then inline.
pub fn parse_pes_index(block: &str) -> Result<Option<PesIndex>, ChemkinError> {
    let mut index = PesIndex::new();
    for entry in EntryScanner::new(block) {
        let entry = entry?;
        let tag = find_tag(&entry.comments.header).or_else(|| find_tag(&entry.comments.inline));
        match tag {
            Some((pes, subpes, channel)) => index
                .entry((pes, subpes))
                .or_default()
                .push((channel, entry.id)),
            None => {
                warn!(
                    "Reaction {} has no pes.subpes.channel tag, PES index not built",
                    entry.id
                );
                return Ok(None);
            }
        }
    }
    Ok(Some(index))
}
