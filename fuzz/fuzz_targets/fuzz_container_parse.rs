#![no_main]

use libfuzzer_sys::fuzz_target;
use mfs_rs::{ContainerReader, HEADER_SIZE};

fuzz_target!(|data: &[u8]| {
    // Still exercise the magic/truncation path on short inputs, but cheaply
    if data.len() < HEADER_SIZE {
        let _ = ContainerReader::parse(data.to_vec(), ".");
        return;
    }

    // Parse must never panic
    let reader = match ContainerReader::parse(data.to_vec(), ".") {
        Ok(r) => r,
        Err(_) => return, // Expected for invalid data
    };

    let _ = reader.custom_property();
    let _ = reader.list_files();

    // Embedded payloads only; external ones would hit the real filesystem
    for entry in reader.entries() {
        let _ = entry.custom_data();
        if !entry.is_external() {
            let _ = entry.read_payload();
        }
    }

    // Lookups with odd names - should never panic
    let _ = reader.contains("");
    let _ = reader.read_file("test.txt");
    let _ = reader.entry("../../../etc/passwd");
});
