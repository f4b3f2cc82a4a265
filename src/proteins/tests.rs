use super::*;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Cursor, Write};
use tempfile::tempdir;

const TRYPSIN: &str = "\
>TRYP_PIG Trypsin OS=Sus scrofa
FPTDDDDKIVGGYTCAANSIPYQVSLNSGSHFCGGSLINSQWVVSAAHCYKSRIQVRLGEHNIDVLEGNEQFINAAKIITHPNFNGNTLDNDIMLIKLSSPATLNSRVATVSLPRSCAAAGTECLISGWGNTKSSGSSYPSLLQCLKAPVLSDSSCKSSYPGQITGNMICVGFLEGGKDSCQGDSGGPVVCNGQLQGIVSWGYGCAQKNKPGVYTKVCNYVNWIQQTIAAN
>sp|P02769|ALBU_BOVIN Serum albumin
MKWVTFISLLLLFSSAYSRGVFRRDTHKSEIAHRFKDLGEEHFKGLVLIAFSQYLQQCPFDEHVKLVNELTEFAKTCVADESHAGCEKSLHTLFGDELCKVASLRETYGDMADCCEKQEPERNECFLSHKDDSPDLPKLKPDPNTLCDEFKADEKKFWGKYLYEIARRHPYFYAPELLYYANKYNGVFQECCQAEDKGACLLPKIETMREKVLASSARQRLRCASIQKFGERALKAWSVARLSQKFPKAEFVEVTKLVTDLTKVHKECCHGDLLECADDRADLAKYICDNQDTISSKLKECCDKPLLEKSHCIAEVEKDAIPENLPPLTADFAEDKDVCKNYQEAKDAFLGSFLYEYSRRHPEYAVSVLLRLAKEYEATLEECCAKDDPHACYSTVFDKLKHLVDEPQNLIKQNCDQFEKLGEYGFQNALIVRYTRKVPQVSTPTLVEVSRSLGKVGTRCCTKPESERMPCTEDYLSLILNRLCVLHEKTPVSEKVTKCCTESLVNRRPCFSALTPDETYVPKAFDEKLFTFHADICTLPDTEKQIKKQTALVELLKHKPKATEEQLKTVMENFVAFVDKCCAADDKEACFAVEGPKLVVSTQTALA
>sp|Q00001|DUPE_TEST Shares a peptide with trypsin
AAAAALGEHNIDVLEGAAAA
";

fn write_fasta(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn trypsin_index() -> ProteinSequenceIndex {
    let mut index = ProteinSequenceIndex::new();
    read_fasta(Cursor::new(TRYPSIN), &mut index).unwrap();
    index
}

#[test]
fn test_accession_from_header() {
    assert_eq!(accession_from_header(">TRYP_PIG Trypsin").as_deref(), Some("TRYP_PIG"));
    assert_eq!(accession_from_header(">sp|P02769|ALBU_BOVIN Serum").as_deref(), Some("P02769"));
    assert_eq!(accession_from_header(">gene||rest").as_deref(), Some("gene"));
    assert_eq!(accession_from_header(">"), None);
}

#[test]
fn test_read_fasta() {
    let index = trypsin_index();
    assert_eq!(index.len(), 3);
    assert!(index.get("TRYP_PIG").unwrap().starts_with("FPTDDDDKIVGG"));
    assert!(index.get("P02769").is_some());
    assert!(index.get("Q00001").is_some());
}

#[test]
fn test_search_single_peptide() {
    let index = trypsin_index();
    assert_eq!(search("IQVR", &index), vec!["TRYP_PIG"]);
    assert!(search("WWWWWWWW", &index).is_empty());
    assert!(search("", &index).is_empty());
}

#[test]
fn test_map_peptides_sequential_and_parallel_agree() {
    let index = trypsin_index();
    let peptides: Vec<String> = ["LGEHNIDVLEG", "IQVR", "LVNELTEFAK", "NOTPRESENT", "LGEHNIDVLEG"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let sequential = map_peptides(&peptides, &index, false);
    let parallel = map_peptides(&peptides, &index, true);

    // IQVR is below the minimum length
    assert!(sequential.get("IQVR").is_empty());
    assert!(sequential.get("NOTPRESENT").is_empty());
    assert_eq!(sequential.get("LVNELTEFAK"), ["P02769".to_string()]);

    let mut shared = sequential.get("LGEHNIDVLEG").to_vec();
    shared.sort();
    assert_eq!(shared, vec!["Q00001", "TRYP_PIG"]);

    for (peptide, accessions) in sequential.iter() {
        let mut a = accessions.to_vec();
        let mut b = parallel.get(peptide).to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
    assert_eq!(sequential.len(), parallel.len());
}

#[test]
fn test_map_merge_deduplicates() {
    let mut a = PeptideProteinMap::new();
    a.add("PEPTIDE", "P1");
    let mut b = PeptideProteinMap::new();
    b.add("PEPTIDE", "P1");
    b.add("PEPTIDE", "P2");
    b.add("OTHERPEP", "P3");
    a.merge(b);
    assert_eq!(a.get("PEPTIDE"), ["P1".to_string(), "P2".to_string()]);
    assert_eq!(a.len(), 2);
}

#[test]
fn test_find_fasta_files_recursive_and_gzip() {
    let dir = tempdir().unwrap();
    write_fasta(dir.path(), "a.fasta", TRYPSIN);
    write_fasta(dir.path(), "notes.txt", "not a fasta");
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let gz_path = dir.path().join("nested").join("b.fa.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&gz_path).unwrap(), Compression::default());
    encoder
        .write_all(b">GZ_PROT compressed\nMKLVNELTEFAKQQ\n")
        .unwrap();
    encoder.finish().unwrap();

    let files = find_fasta_files(dir.path()).unwrap();
    assert_eq!(files.len(), 2);

    let index = build_index(&files).unwrap();
    assert_eq!(index.len(), 4);
    assert_eq!(index.get("GZ_PROT"), Some("MKLVNELTEFAKQQ"));
}

#[test]
fn test_invalid_directory_gives_empty_results() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    assert!(index_directory(&missing).is_empty());
    let map = build_or_load_map(&missing, &["LGEHNIDVLEG".to_string()], true).unwrap();
    assert!(map.is_empty());
    assert!(search("IQVR", &index_directory(&missing)).is_empty());
}

#[test]
fn test_cache_key_stability() {
    let dir = tempdir().unwrap();
    let fasta = write_fasta(dir.path(), "db.fasta", TRYPSIN);
    let files = vec![fasta];
    let peptides = vec!["LGEHNIDVLEG".to_string(), "LVNELTEFAK".to_string()];

    let first = cache_key(&files, &peptides).unwrap();
    let second = cache_key(&files, &peptides).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 32);

    // Order and duplicates do not matter
    let reordered = vec![
        "LVNELTEFAK".to_string(),
        "LGEHNIDVLEG".to_string(),
        "LVNELTEFAK".to_string(),
    ];
    assert_eq!(cache_key(&files, &reordered).unwrap(), first);

    let changed = vec!["LGEHNIDVLEG".to_string()];
    assert_ne!(cache_key(&files, &changed).unwrap(), first);
}

#[test]
fn test_build_or_load_map_writes_and_reuses_cache() {
    let dir = tempdir().unwrap();
    let fasta = write_fasta(dir.path(), "db.fasta", TRYPSIN);
    let peptides = vec!["LGEHNIDVLEG".to_string(), "LVNELTEFAK".to_string()];

    let built = build_or_load_map(dir.path(), &peptides, false).unwrap();
    let key = cache_key(&[fasta], &peptides).unwrap();
    let path = cache_path(dir.path(), &key);
    assert!(path.exists());
    assert!(path
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with(CACHE_PREFIX));

    let cached = load_cache(&path, &key).unwrap();
    assert_eq!(cached, built);
    assert!(load_cache(&path, "other-key").is_none());

    let loaded = build_or_load_map(dir.path(), &peptides, true).unwrap();
    assert_eq!(loaded, built);
}

#[test]
fn test_corrupt_cache_is_a_miss() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(load_cache(&path, "key").is_none());
}
