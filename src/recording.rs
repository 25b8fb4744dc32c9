//! Skeleton recordings: one JSON `SkeletonFrame` per line, optionally gzipped.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{RecognizerError, Result};
use crate::frame::SkeletonFrame;

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

pub fn load_recording(path: &Path) -> Result<Vec<SkeletonFrame>> {
    let file = File::open(path)?;
    if is_gzip(path) {
        parse_frames(BufReader::new(GzDecoder::new(file)))
    } else {
        parse_frames(BufReader::new(file))
    }
}

/// Blank lines and lines starting with `#` are skipped.
pub fn parse_frames<R: Read>(reader: BufReader<R>) -> Result<Vec<SkeletonFrame>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let frame = serde_json::from_str(trimmed).map_err(|source| RecognizerError::RecordingParse {
            line: index + 1,
            source,
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

pub fn save_recording(path: &Path, frames: &[SkeletonFrame]) -> Result<()> {
    let file = File::create(path)?;
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_frames(&mut encoder, frames)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_frames(&mut writer, frames)?;
        writer.flush()?;
    }
    Ok(())
}

fn write_frames<W: Write>(writer: &mut W, frames: &[SkeletonFrame]) -> Result<()> {
    for frame in frames {
        serde_json::to_writer(&mut *writer, frame)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
