use super::*;
use crate::modifications::{ModificationTally, Reconciler};
use crate::spectrum::{Modification, SpectrumBuilder};
use crate::unimod::ModificationDatabase;
use std::io::Cursor;

const TWO_ENTRIES: &str = "\
Name: IQVR/2
MW: 500.3158
Comment: Parent=251.16518 Mods=0 Fullname=K.IQVR.A/2 RetentionTime=750.0000 Score=0.01 ScoreType=\"PERCOLATOR QVALUE\" Protein=sp|TRYP_PIG| Nreps=3/5
Num peaks: 3
175.11900\t1000
274.18700\t500 \"y2/0.01\"
402.24600\t250.5

Name: MLQGR/2_1(0,M,Oxidation)
MW: 605.2933
Comment: Parent=303.65390 Mods=1(0,M,Oxidation) Protein=sp|P1|,sp|P2| MultiProtein=1
Num peaks: 2
232.14\t20
175.119\t10

";

fn read_all(text: &str) -> Vec<Result<RawEntry, MspError>> {
    MspReader::new(Cursor::new(text.as_bytes())).collect()
}

#[test]
fn test_reader_splits_entries() {
    let entries: Vec<RawEntry> = read_all(TWO_ENTRIES)
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(entries.len(), 2);

    let first = &entries[0];
    assert_eq!(first.name, "IQVR/2");
    assert_eq!(first.line, 1);
    assert_eq!(first.num_peaks, Some(3));
    assert_eq!(first.peaks.len(), 3);
    assert_eq!(first.comment_value("ScoreType"), Some("PERCOLATOR QVALUE"));
    assert_eq!(first.comment_value("Nreps"), Some("3/5"));

    assert_eq!(entries[1].name, "MLQGR/2_1(0,M,Oxidation)");
    assert_eq!(entries[1].peaks.mz, vec![232.14, 175.119]);
}

#[test]
fn test_reader_without_blank_separator_or_trailing_newline() {
    let text = "Name: AAAAK/1\nMW: 100\nNum peaks: 1\n100 1\nName: CCCCK/2\nNum peaks: 1\n200 2";
    let entries: Vec<RawEntry> = read_all(text).into_iter().map(Result::unwrap).collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].name, "CCCCK/2");
    assert_eq!(entries[1].line, 5);
    assert_eq!(entries[1].peaks.intensity, vec![2.0]);
}

#[test]
fn test_reader_recovers_after_malformed_peak() {
    let text = "Name: AAAAK/1\nNum peaks: 2\n100 1\nbogus line\n\nName: CCCCK/2\nNum peaks: 1\n200 2\n\n";
    let results = read_all(text);
    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0],
        Err(MspError::MalformedPeakLine { line: 4, .. })
    ));
    assert_eq!(results[1].as_ref().unwrap().name, "CCCCK/2");
}

#[test]
fn test_reader_rejects_bad_mw() {
    let results = read_all("Name: AAAAK/1\nMW: abc\n\n");
    assert!(matches!(results[0], Err(MspError::MalformedHeader { line: 2, .. })));
}

#[test]
fn test_parse_comment_quoted_values() {
    let pairs = parse_comment("A=1 B=\"two words\" C= D=x=y lonely");
    assert_eq!(
        pairs,
        vec![
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "two words".to_string()),
            ("C".to_string(), "".to_string()),
            ("D".to_string(), "x=y".to_string()),
        ]
    );
}

#[test]
fn test_quotes_in_values_survive_tokenizing() {
    let spectrum = SpectrumBuilder::new("PEPTIDEK", 450.0, 2)
        .score(0.5, "MY \"SCORE\"")
        .add_peak(100.0, 1.0)
        .build();
    let text = format_entry(&spectrum, &[]);
    assert!(text.contains("ScoreType=\"MY 'SCORE'\""));

    let comment = [format_pair("Note", "a\"b"), format_pair("Next", "1")].join(" ");
    let pairs = parse_comment(&comment);
    assert_eq!(pairs[0], ("Note".to_string(), "a'b".to_string()));
    assert_eq!(pairs[1], ("Next".to_string(), "1".to_string()));

    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);
    let read = read_all(&text)
        .remove(0)
        .unwrap()
        .into_spectrum(&reconciler)
        .unwrap();
    assert_eq!(read.score_type.as_deref(), Some("MY 'SCORE'"));
    assert_eq!(read.score, Some(0.5));
}

#[test]
fn test_protein_grammar() {
    assert_eq!(parse_proteins("sp|TRYP_PIG|"), vec!["TRYP_PIG"]);
    assert_eq!(parse_proteins("sp|P1|,sp|P2|ENTRY_HUMAN,P1"), vec!["P1", "P2"]);
    assert_eq!(parse_proteins("\"BARE\""), vec!["BARE"]);
    assert_eq!(
        format_proteins(&["P1".to_string(), "P2".to_string()]),
        "sp|P1|,sp|P2|"
    );
}

#[test]
fn test_entry_name_parsing() {
    let name = EntryName::parse("SCRSYR/3_2(0,S,Acetyl)(1,C,Carbamidomethyl)").unwrap();
    assert_eq!(name.sequence, "SCRSYR");
    assert_eq!(name.charge, Some(3));
    assert_eq!(
        name.annotation.as_deref(),
        Some("2(0,S,Acetyl)(1,C,Carbamidomethyl)")
    );

    assert_eq!(EntryName::parse("IQVR").unwrap().charge, None);
    assert!(matches!(EntryName::parse("IQVR/x"), Err(MspError::InvalidName(_))));
    assert!(matches!(EntryName::parse("/2"), Err(MspError::InvalidName(_))));
}

#[test]
fn test_into_spectrum() {
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);
    let mut entries = read_all(TWO_ENTRIES).into_iter().map(Result::unwrap);

    let iqvr = entries.next().unwrap().into_spectrum(&reconciler).unwrap();
    assert_eq!(iqvr.sequence, "IQVR");
    assert_eq!(iqvr.charge, 2);
    assert!((iqvr.precursor_mz - 251.16518).abs() < 1e-9);
    assert_eq!(iqvr.retention_time, Some(12.5));
    assert_eq!(iqvr.score, Some(0.01));
    assert_eq!(iqvr.score_type.as_deref(), Some("PERCOLATOR QVALUE"));
    assert_eq!((iqvr.prev_aa, iqvr.next_aa), ('K', 'A'));
    assert_eq!(iqvr.proteins, vec!["TRYP_PIG"]);
    assert_eq!(iqvr.extra, vec![("Nreps".to_string(), "3/5".to_string())]);
    assert!(iqvr.modifications.is_empty());

    let mlqgr = entries.next().unwrap().into_spectrum(&reconciler).unwrap();
    assert_eq!(mlqgr.modifications.len(), 1);
    assert_eq!(mlqgr.modifications[0].position, 1);
    assert!((mlqgr.modifications[0].mass - 15.994915).abs() < 1e-3);
    assert_eq!(mlqgr.modified_sequence, "M[+16.0]LQGR");
    assert_eq!(mlqgr.proteins, vec!["P1", "P2"]);
}

#[test]
fn test_name_charge_overrides_and_mw_fallback() {
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);
    let text = "Name: PEPTIDEK/2\nMW: 925.4500\nComment: Charge=3\nNum peaks: 1\n100 1\n\n";
    let spectrum = read_all(text)
        .remove(0)
        .unwrap()
        .into_spectrum(&reconciler)
        .unwrap();
    assert_eq!(spectrum.charge, 2);
    assert!((spectrum.neutral_mass() - 925.45).abs() < 1e-6);
}

#[test]
fn test_name_annotation_wins_over_mods_field() {
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);
    let text = "Name: MCAK/2_1(0,M,Oxidation)\nComment: Parent=250.0 Mods=2/0,M,Acetyl/1,C,CAM\nNum peaks: 1\n100 1\n\n";
    let spectrum = read_all(text)
        .remove(0)
        .unwrap()
        .into_spectrum(&reconciler)
        .unwrap();
    assert_eq!(spectrum.modifications.len(), 2);
    assert_eq!(spectrum.modifications[0].name.as_deref(), Some("Oxidation"));
    assert_eq!(spectrum.modifications[1].name.as_deref(), Some("Carbamidomethyl"));
}

#[test]
fn test_extreme_modification_values_do_not_abort() {
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);
    let text = "Name: AAAAK/2\nComment: Parent=300.0 Mods=1(0,A,1e300)\nNum peaks: 1\n100 1\n\n\
                Name: AAAAK/2\nComment: Parent=300.0 Mods=1(18446744073709551615,A,Oxidation)\nNum peaks: 1\n100 1\n\n";
    let spectra: Vec<_> = read_all(text)
        .into_iter()
        .map(|entry| entry.unwrap().into_spectrum(&reconciler).unwrap())
        .collect();
    assert_eq!(spectra.len(), 2);
    assert_eq!(spectra[0].modifications.len(), 1);
    assert_eq!(spectra[0].modifications[0].name, None);
    assert!(spectra[1].modifications.is_empty());
}

#[test]
fn test_missing_precursor_is_an_error() {
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);
    let entry = read_all("Name: PEPTIDEK/2\nNum peaks: 1\n100 1\n\n").remove(0).unwrap();
    assert!(matches!(
        entry.into_spectrum(&reconciler),
        Err(MspError::MissingPrecursor(_))
    ));
}

#[test]
fn test_format_entry() {
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);
    let mut tally = ModificationTally::default();

    let spectrum = SpectrumBuilder::new("MLQGR", 303.6539, 2)
        .modification(Modification::new(1, 15.994915))
        .retention_time(12.5)
        .protein("P1")
        .protein("P2")
        .add_peak(232.14, 20.0)
        .add_peak(175.119, 10.5)
        .build();
    let tags = reconciler.tags_for(&spectrum, &mut tally);
    let text = format_entry(&spectrum, &tags);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "Name: MLQGR/2_1(0,M,Oxidation)");
    assert_eq!(lines[1], "MW: 605.2932");
    assert!(lines[2].starts_with("Comment: Parent=303.65390 Mods=1(0,M,Oxidation) Fullname=-.MLQGR.-/2"));
    assert!(lines[2].contains("RetentionTime=750.0000"));
    assert!(lines[2].contains("Protein=sp|P1|,sp|P2| MultiProtein=1"));
    assert_eq!(lines[3], "Num peaks: 2");
    assert_eq!(lines[4], "175.11900\t10.5");
    assert_eq!(lines[5], "232.14000\t20");
    assert!(text.ends_with("\n\n"));
}

#[test]
fn test_unmodified_name_has_no_annotation() {
    let spectrum = SpectrumBuilder::new("IQVR", 251.1652, 2)
        .add_peak(175.119, 1.0)
        .build();
    let text = format_entry(&spectrum, &[]);
    assert!(text.starts_with("Name: IQVR/2\n"));
    assert!(text.contains("Mods=0"));
    assert!(!text.contains("Protein="));
}

#[test]
fn test_writer_output_reads_back() {
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);
    let mut tally = ModificationTally::default();

    let spectrum = SpectrumBuilder::new("SCRSYR", 267.7901, 3)
        .modification(Modification::new(1, 42.010565))
        .modification(Modification::new(2, 57.021464))
        .score(3.5, "MY SCORE")
        .flanking('R', '-')
        .add_peak(300.1, 5.0)
        .add_peak(200.2, 7.0)
        .build();

    let mut writer = MspWriter::new(Vec::new());
    let tags = reconciler.tags_for(&spectrum, &mut tally);
    writer.write_spectrum(&spectrum, &tags).unwrap();
    writer.write_spectrum(&spectrum, &tags).unwrap();
    assert_eq!(writer.entries_written(), 2);
    let bytes = writer.finish().unwrap();

    let entries: Vec<RawEntry> = MspReader::new(Cursor::new(bytes))
        .map(Result::unwrap)
        .collect();
    assert_eq!(entries.len(), 2);

    let back = entries[0].clone().into_spectrum(&reconciler).unwrap();
    assert_eq!(back.sequence, "SCRSYR");
    assert_eq!(back.charge, 3);
    assert!((back.precursor_mz - 267.7901).abs() < 1e-3);
    assert_eq!(back.score_type.as_deref(), Some("MY SCORE"));
    assert_eq!(back.prev_aa, 'R');
    let positions: Vec<usize> = back.modifications.iter().map(|m| m.position).collect();
    assert_eq!(positions, vec![1, 2]);
    assert_eq!(back.peaks.mz, vec![200.2, 300.1]);
}
