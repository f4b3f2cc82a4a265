#![no_main]

use libfuzzer_sys::fuzz_target;
use speclib::peaks::PeakCodec;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let split = data[0] as usize % data.len();
    let (mz, intensity) = data[1..].split_at(split.min(data.len() - 1));
    let _ = PeakCodec::decode(mz, intensity, data[0] as usize);
});
