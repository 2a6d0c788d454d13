//! Generate seed corpus for fuzzing

use mfs_rs::{CompressionMethod, ContainerWriter, ExternalFileConfig};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_container_parse";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    let mut seeds: Vec<(&str, ContainerWriter)> = Vec::new();

    // Seed 1: Empty container (no files)
    seeds.push(("seed_empty.mfs", ContainerWriter::new()));

    // Seed 2: Single small file
    let mut writer = ContainerWriter::new();
    writer.add_file("test.txt", b"Hello, World!", "", CompressionMethod::None);
    seeds.push(("seed_single_small.mfs", writer));

    // Seed 3: One file per compression method, compressed custom data
    let mut writer = ContainerWriter::new();
    writer.set_custom_data_compression(CompressionMethod::Zstd);
    let text = b"This is test data for compression. ".repeat(100);
    writer.add_file("none.txt", &text, "none", CompressionMethod::None);
    writer.add_file("zstd.txt", &text, "zstd", CompressionMethod::Zstd);
    writer.add_file("lz4.txt", &text, "lz4", CompressionMethod::Lz4);
    seeds.push(("seed_methods.mfs", writer));

    // Seed 4: External entries sharing a linked filename
    let mut writer = ContainerWriter::new();
    writer.set_custom_property("This is a MFS, or Meepso File System file!");
    writer.add_external_file("baller.txt", ExternalFileConfig::new("baller.txt", 0, 26), "This is a file about a baller!", CompressionMethod::None);
    writer.add_external_file("second", ExternalFileConfig::new("baller.txt", 4, 8), "", CompressionMethod::Lz4);
    seeds.push(("seed_external.mfs", writer));

    // Seed 5: Zero-length payload and custom data
    let mut writer = ContainerWriter::new();
    writer.add_file("empty.txt", b"", "", CompressionMethod::Lz4);
    seeds.push(("seed_zero_length.mfs", writer));

    for (name, writer) in &seeds {
        let path = format!("{}/{}", corpus_dir, name);
        writer.save(&path)?;
        println!("✓ Generated: {}", path);
    }

    println!("\nGenerated {} seed files in {}", seeds.len(), corpus_dir);
    Ok(())
}
