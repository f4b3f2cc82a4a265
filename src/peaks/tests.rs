use super::*;
use proptest::prelude::*;

#[test]
fn test_encode_decode_roundtrip() {
    let mz = vec![100.1, 200.2, 300.3, 400.4, 500.5];
    let intensity = vec![10.0, 20.0, 30.0, 40.0, 50.0];

    let blobs = PeakCodec::encode(&mz, &intensity).unwrap();
    let peaks = PeakCodec::decode(&blobs.mz, &blobs.intensity, 5).unwrap();

    assert_eq!(peaks.mz, mz);
    assert_eq!(peaks.intensity, intensity);
}

#[test]
fn test_compressed_only_when_smaller() {
    // A single value never compresses below its packed size
    let blobs = PeakCodec::encode(&[123.456], &[7.0]).unwrap();
    assert_eq!(blobs.mz, 123.456f64.to_le_bytes().to_vec());
    assert_eq!(blobs.intensity, 7.0f32.to_le_bytes().to_vec());

    // Highly repetitive arrays do
    let mz = vec![500.0; 256];
    let intensity = vec![1.0; 256];
    let blobs = PeakCodec::encode(&mz, &intensity).unwrap();
    assert!(blobs.mz.len() < 256 * 8);
    assert!(blobs.intensity.len() < 256 * 4);
}

#[test]
fn test_decode_raw_packed_bytes() {
    let mz: Vec<u8> = [150.5f64, 250.5].iter().flat_map(|v| v.to_le_bytes()).collect();
    let intensity: Vec<u8> = [3.0f32, 4.0].iter().flat_map(|v| v.to_le_bytes()).collect();

    let peaks = PeakCodec::decode(&mz, &intensity, 2).unwrap();
    assert_eq!(peaks.mz, vec![150.5, 250.5]);
    assert_eq!(peaks.intensity, vec![3.0, 4.0]);
}

#[test]
fn test_count_mismatch_is_not_fatal() {
    let blobs = PeakCodec::encode(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
    let peaks = PeakCodec::decode(&blobs.mz, &blobs.intensity, 10).unwrap();
    assert_eq!(peaks.len(), 3);
}

#[test]
fn test_unequal_arrays_truncate_to_shorter() {
    let blobs = PeakCodec::encode(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0]).unwrap();
    let peaks = PeakCodec::decode(&blobs.mz, &blobs.intensity, 4).unwrap();
    assert_eq!(peaks.mz, vec![1.0, 2.0]);
    assert_eq!(peaks.intensity, vec![5.0, 6.0]);
}

#[test]
fn test_ragged_blob_is_an_error() {
    let result = PeakCodec::decode(&[0u8; 7], &[0u8; 4], 1);
    assert!(matches!(
        result,
        Err(PeakCodecError::InvalidLength { array: "m/z", .. })
    ));
}

#[test]
fn test_empty_peaks() {
    let blobs = PeakCodec::encode(&[], &[]).unwrap();
    let peaks = PeakCodec::decode(&blobs.mz, &blobs.intensity, 0).unwrap();
    assert!(peaks.is_empty());
}

proptest! {
    #[test]
    fn test_peak_roundtrip_within_tolerance(
        pairs in prop::collection::vec((50.0f64..4000.0, 0.0f32..1e7), 0..300)
    ) {
        let mz: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let intensity: Vec<f32> = pairs.iter().map(|p| p.1).collect();

        let blobs = PeakCodec::encode(&mz, &intensity).unwrap();
        let peaks = PeakCodec::decode(&blobs.mz, &blobs.intensity, mz.len()).unwrap();

        prop_assert_eq!(peaks.len(), mz.len());
        for (a, b) in mz.iter().zip(peaks.mz.iter()) {
            prop_assert!((a - b).abs() < 1e-3);
        }
        for (a, b) in intensity.iter().zip(peaks.intensity.iter()) {
            prop_assert!((a - b).abs() < 1e-2);
        }
    }
}
