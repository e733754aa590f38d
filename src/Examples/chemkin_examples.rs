use crate::Chemkin::block_parser::{
    ChemkinParser, parse_comments, parse_raw_entries, parse_reactions,
};
use crate::Chemkin::block_writer::{emit_reactions, replace_in_block};
use crate::Chemkin::pes_index::parse_pes_index;
use crate::Chemkin::rate_params::{Arrhenius, RateParams, pretty_print_mechanism};
use crate::Chemkin::reaction_id::{ReactionId, ReactionMap};
use crate::settings::ChemkinSettings;
use log::{error, info};

const H2_BLOCK: &str = "REACTIONS     CAL/MOLE     MOLES
! pes.subpes.channel  1.1.1
H+O2=OH+O   3.547E+15   -0.406   16599   ! Hong et al.

! pes.subpes.channel  1.1.2
H+O2(+M)=HO2(+M)   4.650E+12   0.440   0
  LOW  /  5.750E+19   -1.400   0 /
  TROE /  0.5  1.0E-30  1.0E+30 /
  H2/1.300/   H2O/10.000/   AR/0.670/

! pes.subpes.channel  2.1.1
2OH(+M)=H2O2(+M)   7.400E+13   -0.370   0
  LOW  /  2.300E+18   -0.900   -1700 /
  TROE /  0.7346  94.0  1756.0  5182.0 /

! pes.subpes.channel  3.1.1
CH3OH=CH3+OH   1.000E+00   0.000   0
  PLOG /  0.1   1.500E+43   -9.000   101000 /
  PLOG /  1.0   2.000E+41   -8.000   99000 /
  PLOG /  10.0  1.200E+38   -7.000   95000 /

! pes.subpes.channel  3.1.2
HCO+M=H+CO+M   4.750E+11   0.660   14870
  H2/2.000/   H2O/12.000/   CO/1.500/   CO2/2.000/
END
";

pub fn chemkin_examples(task: usize) {
    match task {
        0 => {
            // parse a block and print a summary table
            match parse_reactions(H2_BLOCK, "cal/mole", "moles") {
                Ok(params) => {
                    println!("{}", pretty_print_mechanism(&params));
                    for (id, rate) in params.iter() {
                        println!("{}: {:?}", id, rate.existing_forms());
                    }
                }
                Err(e) => error!("{}", e),
            }
        }
        1 => {
            // parse, then write the block back with its comments
            let settings = ChemkinSettings::default();
            let result = ChemkinParser::for_block(H2_BLOCK, settings).and_then(|parser| {
                let params = parser.parse_reactions(H2_BLOCK)?;
                let comments = parse_comments(H2_BLOCK)?;
                Ok(emit_reactions(&params, Some(&comments)))
            });
            match result {
                Ok(block) => println!("{}", block),
                Err(e) => error!("{}", e),
            }
        }
        2 => {
            // replace one reaction in place, keep every other byte
            let result = parse_raw_entries(H2_BLOCK).and_then(|raw| {
                let mut replacements = ReactionMap::new();
                replacements.insert(
                    ReactionId::from_equation("H+O2=OH+O")?,
                    RateParams::arrhenius(vec![Arrhenius::new(1.04e14, 0.0, 15286.0)]),
                );
                replace_in_block(H2_BLOCK, &raw, &replacements, None)
            });
            match result {
                Ok(block) => println!("{}", block),
                Err(e) => error!("{}", e),
            }
        }
        3 => {
            // PES side-channel
            match parse_pes_index(H2_BLOCK) {
                Ok(Some(index)) => {
                    for ((pes, subpes), channels) in index.iter() {
                        for (channel, id) in channels {
                            println!("PES {} sub-PES {} channel {}: {}", pes, subpes, channel, id);
                        }
                    }
                }
                Ok(None) => info!("block carries no complete PES index"),
                Err(e) => error!("{}", e),
            }
        }
        4 => {
            // rate parameters as JSON
            match parse_reactions(H2_BLOCK, "cal/mole", "moles") {
                Ok(params) => {
                    for (id, rate) in params.iter() {
                        match serde_json::to_string_pretty(rate) {
                            Ok(json) => println!("{}\n{}", id, json),
                            Err(e) => error!("{}", e),
                        }
                    }
                }
                Err(e) => error!("{}", e),
            }
        }
        _ => {
            println!("no such example: {}", task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_block_parses() {
        let params = parse_reactions(H2_BLOCK, "cal/mole", "moles").unwrap();
        assert_eq!(params.len(), 5);
        let index = parse_pes_index(H2_BLOCK).unwrap().unwrap();
        assert_eq!(index.len(), 3);
        for task in 0..5 {
            chemkin_examples(task);
        }
    }
}
