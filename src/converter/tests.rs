use super::*;
use crate::library::{LibraryReader, LibraryWriter, LibraryWriterConfig};
use crate::spectrum::{Modification, SpectrumBuilder};
use tempfile::tempdir;

fn write_fixture(path: &Path) {
    let mut writer = LibraryWriter::create(path, LibraryWriterConfig::default()).unwrap();
    let spectra = vec![
        SpectrumBuilder::new("IQVRLGEHNIDVLEG", 500.0, 2)
            .add_peak(100.0, 1.0)
            .add_peak(200.0, 2.0)
            .add_peak(300.0, 3.0)
            .build(),
        SpectrumBuilder::new("MLQGR", 303.65, 2)
            .modification(Modification::new(1, 15.994915))
            .add_peak(100.0, 1.0)
            .build(),
        SpectrumBuilder::new("PEPTIDEK", 450.0, 2)
            .modification(Modification::new(3, 123.4567))
            .add_peak(100.0, 1.0)
            .add_peak(150.0, 1.0)
            .protein("SOURCE_PROT")
            .build(),
    ];
    for spectrum in &spectra {
        writer.write(spectrum).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn test_format_inference() {
    assert_eq!(LibraryFormat::from_path(Path::new("a.blib")), Some(LibraryFormat::Library));
    assert_eq!(LibraryFormat::from_path(Path::new("a.SQLite")), Some(LibraryFormat::Library));
    assert_eq!(LibraryFormat::from_path(Path::new("a.db")), Some(LibraryFormat::Library));
    assert_eq!(LibraryFormat::from_path(Path::new("a.MSP")), Some(LibraryFormat::Text));
    assert_eq!(LibraryFormat::from_path(Path::new("a.sptxt")), Some(LibraryFormat::Text));
    assert_eq!(LibraryFormat::from_path(Path::new("a.mzML")), None);
    assert_eq!(LibraryFormat::from_path(Path::new("noext")), None);

    assert_eq!(
        LibraryFormat::Library.default_output(Path::new("dir/lib.blib")),
        PathBuf::from("dir/lib.msp")
    );
    assert_eq!(
        LibraryFormat::Text.default_output(Path::new("lib.sptxt")),
        PathBuf::from("lib.blib")
    );
}

#[test]
fn test_config_defaults() {
    let config = ConversionConfig::default();
    assert_eq!(config.min_peaks, 1);
    assert_eq!(config.limit, None);
    assert_eq!(config.commit_interval, 1000);
    assert!(config.parallel_search);
    assert!(config.fasta_dir.is_none());
}

#[test]
fn test_preflight_failures_create_no_output() {
    let dir = tempdir().unwrap();
    let converter = SpectralLibraryConverter::new();

    let missing = dir.path().join("missing.blib");
    assert!(matches!(
        converter.convert(&missing, None),
        Err(ConversionError::InputNotFound(_))
    ));
    assert!(!dir.path().join("missing.msp").exists());

    let unknown = dir.path().join("input.xyz");
    std::fs::write(&unknown, "x").unwrap();
    assert!(matches!(
        converter.convert(&unknown, None),
        Err(ConversionError::UnknownFormat(_))
    ));

    let input = dir.path().join("lib.blib");
    write_fixture(&input);

    let same = dir.path().join("copy.sqlite");
    assert!(matches!(
        converter.convert(&input, Some(same.as_path())),
        Err(ConversionError::SameFormat { .. })
    ));
    assert!(!same.exists());

    let unwritable = dir.path().join("no_such_dir").join("out.msp");
    assert!(matches!(
        converter.convert(&input, Some(unwritable.as_path())),
        Err(ConversionError::OutputNotWritable { .. })
    ));

    #[cfg(feature = "unimod-xml")]
    {
        let config = ConversionConfig {
            unimod_xml: Some(dir.path().join("absent_unimod.xml")),
            ..Default::default()
        };
        let result = SpectralLibraryConverter::with_config(config).convert(&input, None);
        assert!(matches!(result, Err(ConversionError::InputNotFound(_))));
        assert!(!dir.path().join("lib.msp").exists());
    }
}

#[test]
fn test_library_to_text_stats_and_filters() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("lib.blib");
    write_fixture(&input);

    let config = ConversionConfig {
        min_peaks: 2,
        ..Default::default()
    };
    let stats = SpectralLibraryConverter::with_config(config)
        .convert(&input, None)
        .unwrap();
    assert_eq!(stats.seen, 3);
    assert_eq!(stats.written, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.peaks_written, 5);
    assert_eq!(stats.with_protein_matches, 1);
    assert_eq!(stats.with_unique_protein_match, 1);
    assert_eq!(stats.modifications.unknown_total(), 1);

    let text = std::fs::read_to_string(dir.path().join("lib.msp")).unwrap();
    assert_eq!(text.matches("Name: ").count(), 2);
    assert!(text.contains("Name: PEPTIDEK/2_1(2,P,123.4567)"));
    assert!(text.contains("Protein=sp|SOURCE_PROT|"));
    assert!(stats.to_string().contains("Converted 2 of 3 spectra"));
}

#[test]
fn test_limit_stops_after_written_count() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("lib.blib");
    write_fixture(&input);

    let config = ConversionConfig {
        limit: Some(2),
        ..Default::default()
    };
    let output = dir.path().join("limited.msp");
    let stats = SpectralLibraryConverter::with_config(config)
        .convert(&input, Some(output.as_path()))
        .unwrap();
    assert_eq!(stats.written, 2);
    assert_eq!(stats.seen, 2);
}

#[test]
fn test_fasta_mapping_replaces_source_proteins() {
    let dir = tempdir().unwrap();
    let fasta_dir = dir.path().join("fasta");
    std::fs::create_dir(&fasta_dir).unwrap();
    std::fs::write(
        fasta_dir.join("db.fasta"),
        ">TRYP_PIG Trypsin\nKSRIQVRLGEHNIDVLEGNEQFINAAK\n>OTHER Other\nAAIQVRLGEHNIDVLEGAA\n",
    )
    .unwrap();

    let input = dir.path().join("lib.blib");
    write_fixture(&input);

    let config = ConversionConfig {
        fasta_dir: Some(fasta_dir.clone()),
        parallel_search: false,
        ..Default::default()
    };
    let stats = SpectralLibraryConverter::with_config(config)
        .convert(&input, None)
        .unwrap();
    assert_eq!(stats.written, 3);
    assert_eq!(stats.with_protein_matches, 1);
    assert_eq!(stats.with_unique_protein_match, 0);

    let text = std::fs::read_to_string(dir.path().join("lib.msp")).unwrap();
    assert!(text.contains("MultiProtein=1"));
    assert!(!text.contains("SOURCE_PROT"));

    let caches: Vec<_> = std::fs::read_dir(&fasta_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("peptide_protein_cache_"))
        .collect();
    assert_eq!(caches.len(), 1);
}

#[test]
fn test_text_to_library_skips_bad_entries() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.msp");
    std::fs::write(
        &input,
        "Name: AAAAK/2\nComment: Parent=300.0\nNum peaks: 1\n100\t1\n\n\
         Name: /2\nComment: Parent=300.0\nNum peaks: 1\n100\t1\n\n\
         Name: CCCCK/2\nComment: Parent=300.0\nNum peaks: 1\n100\tbad\n\n\
         Name: DDDDK/2\nComment: Parent=310.0 Mods=1(0,D,Bogus)\nNum peaks: 1\n100\t1\n\n",
    )
    .unwrap();

    let stats = SpectralLibraryConverter::new().convert(&input, None).unwrap();
    assert_eq!(stats.seen, 4);
    assert_eq!(stats.written, 2);
    assert_eq!(stats.skipped, 2);

    let reader = LibraryReader::open(dir.path().join("input.blib")).unwrap();
    assert_eq!(reader.spectrum_count().unwrap(), 2);
    assert!(reader.info().unwrap().lsid.ends_with(":input"));
    let records = reader.read_all().unwrap();
    assert!(records[1].spectrum.modifications.is_empty());
}

#[test]
fn test_inspect() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("lib.blib");
    write_fixture(&input);

    match inspect(&input).unwrap() {
        FileSummary::Library {
            spectra, proteins, ..
        } => {
            assert_eq!(spectra, 3);
            assert_eq!(proteins, 1);
        }
        other => panic!("unexpected summary {:?}", other),
    }

    SpectralLibraryConverter::new().convert(&input, None).unwrap();
    let summary = inspect(dir.path().join("lib.msp")).unwrap();
    assert_eq!(
        summary,
        FileSummary::Text {
            entries: 3,
            malformed: 0,
            peaks: 6
        }
    );
    assert!(summary.to_string().contains("Entries: 3"));
}
