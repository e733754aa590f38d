#[cfg(test)]
mod tests {
    use crate::Chemkin::block_parser::*;
    use crate::Chemkin::chemkin_errors::ChemkinError;
    use crate::Chemkin::rate_params::{Arrhenius, PlogStruct, RateForm, RateParams};
    use crate::Chemkin::reaction_id::{ReactionId, ThirdBody};
    use crate::Chemkin::units::NA;
    use crate::settings::{BadFitPolicy, ChemkinSettings, DuplicatePolicy};
    use approx::assert_relative_eq;

    fn id(equation: &str) -> ReactionId {
        ReactionId::from_equation(equation).unwrap()
    }

    fn t() -> Arrhenius {
        Arrhenius::new(1e15, 0.0, 25000.0)
    }

    const MIXED_BLOCK: &str = "REACTIONS     CAL/MOLE     MOLES
! header of first
H+O2=OH+O   1.0E+15  0.0  25000   ! inline one
! footer of first

! header of second
H+O2(+M)=HO2(+M)   4.650E+12   0.440   0
  LOW  /  5.750E+19   -1.400   0 /
  TROE /  0.5  1.0E-30  1.0E+30 /
  H2O/10.0/   H2/2.0/

2OH=H2O2   7.4E+13  -0.37  0

! trailing
END
";

    #[test]
    fn test_simple_arrhenius_with_colliders() {
        let block = "REACTIONS     CAL/MOLE     MOLES
H+O2+M=OH+O+M   1.000E+15   0.000   25000
     N2/1.400/   AR/1.000/
END
";
        let params = parse_reactions(block, "cal/mole", "moles").unwrap();
        assert_eq!(params.len(), 1);
        let key = ReactionId::new(vec!["H", "O2"], vec!["OH", "O"], ThirdBody::Bath);
        let expected = RateParams::arrhenius(vec![t()]).with_colliders(vec![("N2", 1.4), ("AR", 1.0)]);
        assert_eq!(params.get(&key), Some(&expected));
    }

    #[test]
    fn test_identical_duplicates_collapse() {
        let same = "H+O2=OH+O   1.000E+15   0.000   25000
  DUP
H+O2=OH+O   1.000E+15   0.000   25000
  DUP
";
        let params = parse_reactions(same, "cal/mole", "moles").unwrap();
        assert_eq!(params.get(&id("H+O2=OH+O")), Some(&RateParams::arrhenius(vec![t()])));

        let different = "H+O2=OH+O   1.000E+15   0.000   25000
  DUP
H+O2=OH+O   1.000E+15   0.000   27000
  DUP
";
        let params = parse_reactions(different, "cal/mole", "moles").unwrap();
        let rate = params.get(&id("H+O2=OH+O")).unwrap();
        assert_eq!(
            rate,
            &RateParams::arrhenius(vec![t(), Arrhenius::new(1e15, 0.0, 27000.0)])
        );
        assert!(rate.has_duplicates());
    }

    #[test]
    fn test_strict_duplicates_keep_every_triple() {
        let same = "H+O2=OH+O   1.000E+15   0.000   25000
  DUP
H+O2=OH+O   1.000E+15   0.000   25000
  DUP
";
        let parser = ChemkinParser::new(ChemkinSettings::default().strict_duplicates(true));
        let params = parser.parse_reactions(same).unwrap();
        assert_eq!(
            params.get(&id("H+O2=OH+O")),
            Some(&RateParams::arrhenius(vec![t(), t()]))
        );
    }

    #[test]
    fn test_plog_with_duplicate_pressure() {
        let block = "REACTIONS
H+O2=OH+O   1.000E+15   0.000   25000
  PLOG /  0.1   1.000E+15   0.000   25000 /
  PLOG /  1.0   1.000E+15   0.000   25000 /
  PLOG /  1.0   1.000E+15   0.000   25000 /
  PLOG /  100.0 1.000E+15   0.000   25000 /
END
";
        let params = parse_reactions(block, "cal/mole", "moles").unwrap();
        let mut expected = PlogStruct::new();
        expected.push(0.1, t());
        expected.push(1.0, t());
        expected.push(1.0, t());
        expected.push(100.0, t());
        let rate = params.get(&id("H+O2=OH+O")).unwrap();
        assert_eq!(rate.primary, RateForm::Plog(expected));
        if let RateForm::Plog(plog) = &rate.primary {
            assert_eq!(plog.pressures(), vec![0.1, 1.0, 100.0]);
            assert_eq!(plog.get(1.0).unwrap().len(), 2);
        }
        assert!(rate.has_duplicates());
    }

    #[test]
    fn test_chebyshev_6x4() {
        let block = "REACTIONS
CH3+OH=CH2OH+H   0.0   0.0   0.0
  TCHEB/ 500 2000 /
  PCHEB/ 0.03 100 /
  CHEB/ 6 4 /
  CHEB/ 1.0  2.0  3.0  4.0 /
  CHEB/ 5.0  6.0  7.0  8.0 /
  CHEB/ 9.0  10.0 11.0 12.0 /
  CHEB/ 13.0 14.0 15.0 16.0 /
  CHEB/ 17.0 18.0 19.0 20.0 /
  CHEB/ 21.0 22.0 23.0 24.0 /
END
";
        let params = parse_reactions(block, "cal/mole", "moles").unwrap();
        let rate = params.get(&id("CH3+OH=CH2OH+H")).unwrap();
        let RateForm::Chebyshev(cheb) = &rate.primary else {
            panic!("expected a Chebyshev expression");
        };
        assert_eq!(cheb.alpha.shape(), (6, 4));
        assert_eq!(cheb.tlim, (500.0, 2000.0));
        assert_eq!(cheb.plim, (0.03, 100.0));
        assert_eq!(cheb.alpha[(1, 2)], 7.0);
        assert_eq!(cheb.alpha[(5, 3)], 24.0);
        assert!(cheb.one_atm_arr.is_none());
    }

    #[test]
    fn test_chebyshev_defaults_surplus_and_reference() {
        let block = "CH3+OH=CH2OH+H   1.0E+10   0.5   100.0
  CHEB/ 2 2  1.0 2.0 /
  CHEB/ 3.0 4.0 5.0 6.0 /
";
        let params = parse_reactions(block, "cal/mole", "moles").unwrap();
        let rate = params.get(&id("CH3+OH=CH2OH+H")).unwrap();
        let RateForm::Chebyshev(cheb) = &rate.primary else {
            panic!("expected a Chebyshev expression");
        };
        assert_eq!(cheb.tlim, (300.0, 2500.0));
        assert_eq!(cheb.plim, (0.001, 100.0));
        assert_eq!(cheb.alpha.shape(), (2, 2));
        assert_eq!(cheb.alpha[(1, 1)], 4.0);
        assert_eq!(cheb.one_atm_arr, Some(Arrhenius::new(1e10, 0.5, 100.0)));
    }

    #[test]
    fn test_chebyshev_deficit_is_fatal() {
        let block = "CH3+OH=CH2OH+H   0.0   0.0   0.0
  CHEB/ 2 2 /
  CHEB/ 1.0 2.0 3.0 /
";
        let result = parse_reactions(block, "cal/mole", "moles");
        assert!(matches!(
            result,
            Err(ChemkinError::ChebyshevCoeffMismatch {
                expected: 4,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_oversized_chebyshev_dims_are_rejected() {
        let huge = "REACTIONS\nA=B 0 0 0\n CHEB/ 1e10 1e10 /\n CHEB/ 1 2 3 /\nEND\n";
        assert!(matches!(
            parse_reactions(huge, "cal/mole", "moles"),
            Err(ChemkinError::UnknownKeyword { .. })
        ));
        let above_limit = "CH3+OH=CH2OH+H   0.0   0.0   0.0
  CHEB/ 65 1 /
";
        assert!(matches!(
            parse_reactions(above_limit, "cal/mole", "moles"),
            Err(ChemkinError::UnknownKeyword { .. })
        ));
    }

    #[test]
    fn test_troe_four_parameters() {
        let block = "H+O2(+M)=HO2(+M)   4.650E+12   0.440   0
  LOW/1e12 1.5 50000/
  TROE/1.5 8000 100 1000/
  AR/1.4/ N2/1.7/
";
        let params = parse_reactions(block, "cal/mole", "moles").unwrap();
        let rate = params.get(&id("H+O2(+M)=HO2(+M)")).unwrap();
        let RateForm::Troe(troe) = &rate.primary else {
            panic!("expected a Troe expression");
        };
        assert_eq!(troe.highp_arr, Arrhenius::new(4.65e12, 0.44, 0.0));
        assert_eq!(troe.lowp_arr, Arrhenius::new(1e12, 1.5, 50000.0));
        assert_eq!(troe.troe_params.to_vec(), vec![1.5, 8000.0, 100.0, 1000.0]);
        let colliders = rate.colliders.as_ref().unwrap();
        assert_eq!(colliders.get("AR"), Some(&1.4));
        assert_eq!(colliders.get("N2"), Some(&1.7));
    }

    #[test]
    fn test_lindemann_and_form_errors() {
        let lind = "H+O2(+N2)=HO2(+N2)   4.650E+12   0.440   0
  LOW/1e16 0 0/
";
        let params = parse_reactions(lind, "cal/mole", "moles").unwrap();
        let rate = params.get(&id("H+O2(+N2)=HO2(+N2)")).unwrap();
        assert!(matches!(rate.primary, RateForm::Lindemann(_)));

        let troe_without_low = "H+O2(+M)=HO2(+M)   4.650E+12   0.440   0
  TROE/0.5 100 1000/
";
        assert!(matches!(
            parse_reactions(troe_without_low, "cal/mole", "moles"),
            Err(ChemkinError::InconsistentTroe { .. })
        ));

        let no_third_body = "H+O2=HO2   4.650E+12   0.440   0
  LOW/1e16 0 0/
";
        assert!(matches!(
            parse_reactions(no_third_body, "cal/mole", "moles"),
            Err(ChemkinError::MissingThirdBody { .. })
        ));

        let two_forms = "H+O2(+M)=HO2(+M)   4.650E+12   0.440   0
  LOW/1e16 0 0/
  PLOG/1.0 1e12 0 0/
";
        assert!(matches!(
            parse_reactions(two_forms, "cal/mole", "moles"),
            Err(ChemkinError::ConflictingForms { .. })
        ));
    }

    #[test]
    fn test_malformed_input() {
        let unknown = "H+O2=OH+O   1.0E+15   0.0   25000
  REV / 1.0 2.0 3.0 /
";
        assert!(matches!(
            parse_reactions(unknown, "cal/mole", "moles"),
            Err(ChemkinError::UnknownKeyword { .. })
        ));
        let two_numbers = "H+O2=OH+O   1.0E+15   0.0\n";
        assert!(matches!(
            parse_reactions(two_numbers, "cal/mole", "moles"),
            Err(ChemkinError::MalformedEquation { .. })
        ));
        let orphan = "REACTIONS\n  LOW/1e16 0 0/\nH+O2=OH+O 1.0 0.0 0.0\n";
        assert!(matches!(
            parse_reactions(orphan, "cal/mole", "moles"),
            Err(ChemkinError::OrphanContinuation(_))
        ));
        assert!(matches!(
            parse_reactions("H+O2=OH+O 1.0 0.0 0.0\n", "evolts", "moles"),
            Err(ChemkinError::UnknownUnits(_))
        ));
    }

    #[test]
    fn test_unit_conversion_and_molecularity() {
        let block = "REACTIONS   KJOULES/MOLE   MOLECULES
H+O2+M=HO2+M   1.0   0.0   4.184
H+O2(+M)=HO2(+M)   1.0   0.0   0.0
  LOW / 1.0 0.0 0.0 /
END
";
        let parser = ChemkinParser::for_block(block, ChemkinSettings::default()).unwrap();
        let params = parser.parse_reactions(block).unwrap();

        let RateForm::Arrhenius(bath) = &params.get(&id("H+O2+M=HO2+M")).unwrap().primary else {
            panic!("expected an Arrhenius expression");
        };
        assert_relative_eq!(bath.arr[0].A, NA * NA, max_relative = 1e-12);
        assert_relative_eq!(bath.arr[0].Ea, 1000.0, max_relative = 1e-12);

        let RateForm::Lindemann(falloff) = &params.get(&id("H+O2(+M)=HO2(+M)")).unwrap().primary
        else {
            panic!("expected a Lindemann expression");
        };
        assert_relative_eq!(falloff.highp_arr.A, NA, max_relative = 1e-12);
        assert_relative_eq!(falloff.lowp_arr.A, NA, max_relative = 1e-12);

        let mut settings = ChemkinSettings::default();
        settings.low_pressure_collider = true;
        let params = ChemkinParser::for_block(block, settings)
            .unwrap()
            .parse_reactions(block)
            .unwrap();
        let RateForm::Lindemann(falloff) = &params.get(&id("H+O2(+M)=HO2(+M)")).unwrap().primary
        else {
            panic!("expected a Lindemann expression");
        };
        assert_relative_eq!(falloff.highp_arr.A, NA, max_relative = 1e-12);
        assert_relative_eq!(falloff.lowp_arr.A, NA * NA, max_relative = 1e-12);
    }

    #[test]
    fn test_bad_fit_policies() {
        let block = "H+O2=OH+O   nan   0.0   25000
O+H2=OH+H   5.0E+04   2.67   6290
";
        let keep = parse_reactions(block, "cal/mole", "moles").unwrap();
        assert_eq!(keep.len(), 2);
        assert!(!keep.get(&id("H+O2=OH+O")).unwrap().is_finite());

        let skip = ChemkinParser::new(ChemkinSettings::default().remove_bad_fits(true))
            .parse_reactions(block)
            .unwrap();
        assert_eq!(skip.len(), 1);
        assert!(skip.contains_key(&id("O+H2=OH+H")));

        let mut settings = ChemkinSettings::default();
        settings.bad_fits = BadFitPolicy::Reject;
        assert!(matches!(
            ChemkinParser::new(settings).parse_reactions(block),
            Err(ChemkinError::BadFit { .. })
        ));
    }

    #[test]
    fn test_skipped_bad_fit_stays_in_raw_and_comments() {
        let block = "H+O2=OH+O   nan   0.0   25000   ! unfitted
O+H2=OH+H   5.0E+04   2.67   6290
";
        let skip = ChemkinParser::new(ChemkinSettings::default().remove_bad_fits(true))
            .parse_reactions(block)
            .unwrap();
        assert!(!skip.contains_key(&id("H+O2=OH+O")));
        let raw = parse_raw_entries(block).unwrap();
        assert!(raw.contains_key(&id("H+O2=OH+O")));
        let comments = parse_comments(block).unwrap();
        assert_eq!(comments.get(&id("H+O2=OH+O")).unwrap().inline, "! unfitted");
    }

    #[test]
    fn test_comment_attribution() {
        let comments = parse_comments(MIXED_BLOCK).unwrap();
        let first = comments.get(&id("H+O2=OH+O")).unwrap();
        assert_eq!(first.header, "! header of first");
        assert_eq!(first.inline, "! inline one");
        assert_eq!(first.footer, "! footer of first");
        let second = comments.get(&id("H+O2(+M)=HO2(+M)")).unwrap();
        assert_eq!(second.header, "! header of second");
        assert!(second.inline.is_empty());
        assert!(second.footer.is_empty());
        let third = comments.get(&id("OH+OH=H2O2")).unwrap();
        assert!(third.header.is_empty());
        assert_eq!(third.footer, "! trailing");
    }

    #[test]
    fn test_dictionaries_share_keys() {
        let params = parse_reactions(MIXED_BLOCK, "cal/mole", "moles").unwrap();
        let raw = parse_raw_strings(MIXED_BLOCK).unwrap();
        let comments = parse_comments(MIXED_BLOCK).unwrap();
        let keys: Vec<&ReactionId> = params.keys().collect();
        assert_eq!(keys, raw.keys().collect::<Vec<_>>());
        assert_eq!(keys, comments.keys().collect::<Vec<_>>());
        assert_eq!(keys.len(), 3);
        assert_eq!(
            keys[2],
            &ReactionId::new(vec!["OH", "OH"], vec!["H2O2"], ThirdBody::Absent)
        );
    }

    #[test]
    fn test_raw_entries_and_spans() {
        let raw = parse_raw_entries(MIXED_BLOCK).unwrap();
        let first = raw.get(&id("H+O2=OH+O")).unwrap();
        assert_eq!(first.text, "H+O2=OH+O   1.0E+15  0.0  25000   ! inline one\n");
        assert_eq!(first.spans.len(), 1);
        assert_eq!(&MIXED_BLOCK[first.spans[0].clone()], first.text);

        let troe = raw.get(&id("H+O2(+M)=HO2(+M)")).unwrap();
        assert!(troe.text.starts_with("H+O2(+M)=HO2(+M)"));
        assert!(troe.text.ends_with("H2/2.0/\n"));
        assert_eq!(&MIXED_BLOCK[troe.spans[0].clone()], troe.text);

        let dup = "H+O2=OH+O 1.0 0.0 0.0\n  DUP\n\nH+O2=OH+O 2.0 0.0 0.0\n  DUP\n";
        let raw = parse_raw_entries(dup).unwrap();
        let entry = raw.get(&id("H+O2=OH+O")).unwrap();
        assert_eq!(entry.spans, vec![0..28, 29..57]);
        assert_eq!(entry.text, "H+O2=OH+O 1.0 0.0 0.0\n  DUP\nH+O2=OH+O 2.0 0.0 0.0\n  DUP\n");
    }

    #[test]
    fn test_fix_duplicates_keeps_first_slot() {
        let r1 = id("H+O2=OH+O");
        let r2 = id("O+H2=OH+H");
        let merged = fix_duplicates(
            vec![
                (r1.clone(), RateParams::arrhenius(vec![t()])),
                (r2.clone(), RateParams::arrhenius(vec![t()])),
                (r1.clone(), RateParams::lindemann(t(), t())),
            ],
            DuplicatePolicy::Collapse,
        );
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec![&r1, &r2]);
        let first = merged.get(&r1).unwrap();
        assert_eq!(first.duplicates.len(), 1);
        assert!(matches!(first.duplicates[0], RateForm::Lindemann(_)));
    }
}
