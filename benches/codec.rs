use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use speclib::modifications::Reconciler;
use speclib::msp::{format_entry, MspReader};
use speclib::peaks::PeakCodec;
use speclib::proteins::{map_peptides, ProteinSequenceIndex};
use speclib::spectrum::{Modification, PeakList, Spectrum, SpectrumBuilder};
use speclib::unimod::ModificationDatabase;
use std::io::Cursor;

const RESIDUES: &[u8] = b"ACDEFGHIKLMNPQRSTVWY";

/// Deterministic pseudo-random protein sequence
fn protein_sequence(seed: usize, length: usize) -> String {
    let mut state = seed as u64 * 6364136223846793005 + 1442695040888963407;
    (0..length)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            RESIDUES[(state >> 33) as usize % RESIDUES.len()] as char
        })
        .collect()
}

fn peak_list(num_peaks: usize) -> PeakList {
    let mz = (0..num_peaks).map(|i| 150.0 + i as f64 * 7.123).collect();
    let intensity = (0..num_peaks)
        .map(|i| ((i * 37) % 1000) as f32 + 0.5)
        .collect();
    PeakList::new(mz, intensity)
}

fn test_spectrum(i: usize, num_peaks: usize) -> Spectrum {
    SpectrumBuilder::new(protein_sequence(i, 12), 600.0 + i as f64 * 0.01, 2)
        .retention_time(i as f64 * 0.1)
        .modification(Modification::new(1, 15.994915))
        .peaks(peak_list(num_peaks))
        .build()
}

fn bench_peak_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("peak_codec");

    for num_peaks in [50, 500, 5000] {
        let peaks = peak_list(num_peaks);
        let blobs = PeakCodec::encode_peaks(&peaks).unwrap();
        group.throughput(Throughput::Elements(num_peaks as u64));

        group.bench_with_input(BenchmarkId::new("encode", num_peaks), &peaks, |b, peaks| {
            b.iter(|| PeakCodec::encode_peaks(peaks).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decode", num_peaks), &blobs, |b, blobs| {
            b.iter(|| PeakCodec::decode(&blobs.mz, &blobs.intensity, num_peaks).unwrap())
        });
    }

    group.finish();
}

fn bench_text_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectral_text");
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);

    let num_spectra = 1000;
    let spectra: Vec<_> = (0..num_spectra).map(|i| test_spectrum(i, 100)).collect();
    let mut text = String::new();
    for spectrum in &spectra {
        let tags = reconciler.tags_for(spectrum, &mut Default::default());
        text.push_str(&format_entry(spectrum, &tags));
    }
    group.throughput(Throughput::Elements(num_spectra as u64));

    group.bench_function("format", |b| {
        b.iter(|| {
            let mut tally = Default::default();
            spectra
                .iter()
                .map(|s| format_entry(s, &reconciler.tags_for(s, &mut tally)).len())
                .sum::<usize>()
        })
    });
    group.bench_function("parse", |b| {
        b.iter(|| {
            MspReader::new(Cursor::new(text.as_bytes()))
                .filter_map(Result::ok)
                .filter_map(|entry| entry.into_spectrum(&reconciler).ok())
                .count()
        })
    });

    group.finish();
}

fn bench_protein_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("protein_search");

    let mut index = ProteinSequenceIndex::new();
    for i in 0..2000 {
        index.insert(format!("PROT_{:05}", i), protein_sequence(i, 400));
    }
    let peptides: Vec<String> = (0..5000)
        .map(|i| {
            let protein = protein_sequence(i % 2000, 400);
            let start = (i * 13) % 380;
            protein[start..start + 8 + i % 10].to_string()
        })
        .collect();
    group.throughput(Throughput::Elements(peptides.len() as u64));

    for parallel in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("map_peptides", if parallel { "parallel" } else { "serial" }),
            &parallel,
            |b, &parallel| b.iter(|| map_peptides(&peptides, &index, parallel).len()),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_peak_codec,
    bench_text_codec,
    bench_protein_search
);
criterion_main!(benches);
