
use anyhow::Context;
use std::io::{BufWriter, Write};
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

/// Helper function that loads a JSON file into some type.
/// Files ending in `.gz` are transparently decompressed.
/// # Arguments
/// * `filename` - the file path to open and parse
/// # Errors
/// * if the file does not open properly
/// * if the deserialization throws errors
pub fn load_json<T: serde::de::DeserializeOwned>(filename: &Path) -> anyhow::Result<T> {
    let fp: Box<dyn std::io::Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(
            flate2::read::MultiGzDecoder::new(
                File::open(filename)
                    .with_context(|| format!("Error while opening {filename:?}:"))?
            )
        )
    } else {
        Box::new(
            File::open(filename)
                .with_context(|| format!("Error while opening {filename:?}:"))?
        )
    };
    let result: T = serde_json::from_reader(std::io::BufReader::new(fp))
        .with_context(|| format!("Error while deserializing {filename:?}:"))?;
    Ok(result)
}

/// Saves a serializable value as pretty-printed JSON, replacing any existing file.
/// The data is written to a temporary file next to `out_filename` and renamed over it, so an existing
/// file is either fully replaced or left as it was.
/// # Arguments
/// * `data` - the data in memory
/// * `out_filename` - path to write to, `.gz` enables compression
/// # Errors
/// * if the temporary file cannot be created, written, or renamed
/// * if JSON serialization throws errors
pub fn save_json<T: serde::Serialize>(data: &T, out_filename: &Path) -> anyhow::Result<()> {
    let parent = match out_filename.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new(".")
    };
    let tmp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Error while creating temporary file for {out_filename:?}:"))?;

    {
        let file: Box<dyn std::io::Write + '_> = if out_filename.extension().unwrap_or_default() == "gz" {
            Box::new(flate2::write::GzEncoder::new(tmp_file.as_file(), flate2::Compression::best()))
        } else {
            Box::new(tmp_file.as_file())
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)
            .with_context(|| format!("Error while serializing {out_filename:?}:"))?;
        writer.flush()
            .with_context(|| format!("Error while flushing output to {out_filename:?}:"))?;
    }

    tmp_file.persist(out_filename)
        .with_context(|| format!("Error while replacing {out_filename:?}:"))?;
    Ok(())
}
