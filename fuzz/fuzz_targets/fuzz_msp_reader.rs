#![no_main]

use libfuzzer_sys::fuzz_target;
use speclib::modifications::Reconciler;
use speclib::msp::MspReader;
use speclib::unimod::ModificationDatabase;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let db = ModificationDatabase::builtin();
    let reconciler = Reconciler::new(&db);

    // Malformed entries must surface as errors, never as panics
    for entry in MspReader::new(Cursor::new(data)).take(1000) {
        if let Ok(entry) = entry {
            let _ = entry.into_spectrum(&reconciler);
        }
    }
});
