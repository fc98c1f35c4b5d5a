//! Duration extraction for video files.
//!
//! Container headers are parsed directly, reading only as much of the file
//! as needed. When the container is not understood, `ffprobe` is asked
//! instead.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::config::ThumbnailConfig;
use crate::error::{MediaError, Result};

/// Upper bound on how much of a `moov` box is loaded when looking for `mvhd`.
const MAX_MOOV_BYTES: u64 = 4 * 1024 * 1024;

/// Matroska `Info` lives near the start of the file.
const MATROSKA_SCAN_BYTES: u64 = 64 * 1024;

const AVI_SCAN_BYTES: u64 = 64 * 1024;

const PROBE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default Matroska TimecodeScale, in nanoseconds.
const DEFAULT_TIMECODE_SCALE: u64 = 1_000_000;

const EBML_TIMECODE_SCALE: [u8; 3] = [0x2A, 0xD7, 0xB1];
const EBML_DURATION: [u8; 2] = [0x44, 0x89];

pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Returns the playback length of a video in seconds.
    ///
    /// Returns `None` for unreadable or undecodable files. The result is
    /// always finite and non-negative.
    ///
    /// Blocking: when the container is not understood this waits on
    /// `ffprobe` for up to `config.probe_timeout`.
    pub fn video_duration(path: &Path, config: &ThumbnailConfig) -> Option<f64> {
        if !path.is_file() {
            debug!(?path, "No video file to probe");
            return None;
        }

        let parsed = match Self::parse_container_duration(path) {
            Ok(duration) => duration,
            Err(e) => {
                warn!(?path, error = %e, "Failed to parse video container");
                None
            }
        };

        parsed
            .or_else(|| Self::probe_duration(path, &config.ffprobe, config.probe_timeout))
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
    }

    fn parse_container_duration(path: &Path) -> Result<Option<f64>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let duration = match ext.as_str() {
            "mp4" | "mov" | "m4v" | "3gp" => Self::parse_mp4_duration(path)?,
            "webm" | "mkv" => Self::parse_matroska_duration(path)?,
            "avi" => Self::parse_avi_duration(path)?,
            _ => {
                debug!("No container parser for video format: {}", ext);
                None
            }
        };

        trace!(?path, ?duration, "Container duration");
        Ok(duration)
    }

    /// Walks the top-level MP4/QuickTime boxes to find `moov/mvhd`.
    ///
    /// `moov` may sit after `mdat`, so boxes are skipped by size rather than
    /// scanning a fixed prefix.
    fn parse_mp4_duration(path: &Path) -> Result<Option<f64>> {
        let mut file = File::open(path).map_err(|e| MediaError::io(path, e))?;
        let file_len = file.metadata().map_err(|e| MediaError::io(path, e))?.len();

        let mut offset = 0u64;
        while offset + 8 <= file_len {
            let header = Self::read_box_header(&mut file, offset, file_len)
                .map_err(|e| MediaError::io(path, e))?;
            let Some((kind, box_size, header_len)) = header else {
                break;
            };

            if &kind == b"moov" {
                let body_len = (box_size - header_len).min(MAX_MOOV_BYTES);
                let mut body = Vec::with_capacity(body_len as usize);
                (&mut file)
                    .take(body_len)
                    .read_to_end(&mut body)
                    .map_err(|e| MediaError::io(path, e))?;
                return Ok(Self::find_mvhd_duration(&body));
            }

            offset = offset.saturating_add(box_size);
        }

        Ok(None)
    }

    /// Reads a box header at `offset`: (type, total size, header length).
    fn read_box_header(
        file: &mut File,
        offset: u64,
        file_len: u64,
    ) -> std::io::Result<Option<([u8; 4], u64, u64)>> {
        file.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;

        let size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let kind = [header[4], header[5], header[6], header[7]];

        let (box_size, header_len) = match size {
            // Box extends to the end of the file
            0 => (file_len - offset, 8),
            // 64-bit largesize follows the type
            1 => {
                let mut large = [0u8; 8];
                file.read_exact(&mut large)?;
                (u64::from_be_bytes(large), 16)
            }
            n => (n as u64, 8),
        };

        if box_size < header_len {
            return Ok(None);
        }
        Ok(Some((kind, box_size, header_len)))
    }

    /// Reads duration/timescale from an `mvhd` box inside `moov`.
    fn find_mvhd_duration(moov: &[u8]) -> Option<f64> {
        let i = moov.windows(4).position(|w| w == b"mvhd")?;
        let version = *moov.get(i + 4)?;

        // Offsets are relative to the box type; version/flags take 4 bytes,
        // then creation and modification times (4 or 8 bytes each).
        let (timescale, duration) = if version == 1 {
            (be_u32(moov, i + 24)?, be_u64(moov, i + 28)?)
        } else {
            let duration = be_u32(moov, i + 20)?;
            if duration == u32::MAX {
                return None;
            }
            (be_u32(moov, i + 16)?, duration as u64)
        };

        if timescale == 0 {
            return None;
        }
        Some(duration as f64 / timescale as f64)
    }

    /// Scans the head of a Matroska/WebM file for `TimecodeScale` and
    /// `Duration`. Not a full EBML parser, but `Info` is reliably early.
    fn parse_matroska_duration(path: &Path) -> Result<Option<f64>> {
        let buffer = Self::read_head(path, MATROSKA_SCAN_BYTES)?;

        let scale = find_element(&buffer, &EBML_TIMECODE_SCALE)
            .and_then(|value| {
                (1..=8)
                    .contains(&value.len())
                    .then(|| value.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
            })
            .filter(|&scale| scale > 0)
            .unwrap_or(DEFAULT_TIMECODE_SCALE);

        let duration = find_element(&buffer, &EBML_DURATION).and_then(|value| match value.len() {
            4 => Some(f32::from_be_bytes(value.try_into().ok()?) as f64),
            8 => Some(f64::from_be_bytes(value.try_into().ok()?)),
            _ => None,
        });

        Ok(duration.map(|ticks| ticks * scale as f64 / 1e9))
    }

    /// Reads the AVI main header (`avih`): frame count times frame period.
    fn parse_avi_duration(path: &Path) -> Result<Option<f64>> {
        let buffer = Self::read_head(path, AVI_SCAN_BYTES)?;

        let Some(i) = buffer.windows(4).position(|w| w == b"avih") else {
            return Ok(None);
        };
        // Chunk size follows the tag, then dwMicroSecPerFrame and, four
        // fields later, dwTotalFrames.
        let micro_sec_per_frame = le_u32(&buffer, i + 8);
        let total_frames = le_u32(&buffer, i + 24);

        Ok(match (micro_sec_per_frame, total_frames) {
            (Some(us), Some(frames)) if us > 0 && frames > 0 => {
                Some(frames as f64 * us as f64 / 1e6)
            }
            _ => None,
        })
    }

    fn read_head(path: &Path, limit: u64) -> Result<Vec<u8>> {
        let file = File::open(path).map_err(|e| MediaError::io(path, e))?;
        let mut buffer = Vec::new();
        BufReader::new(file)
            .take(limit)
            .read_to_end(&mut buffer)
            .map_err(|e| MediaError::io(path, e))?;
        Ok(buffer)
    }

    /// Asks ffprobe for the container duration, giving up after `timeout`.
    fn probe_duration(path: &Path, ffprobe: &Path, timeout: Duration) -> Option<f64> {
        let mut child = match Command::new(ffprobe)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                debug!(?ffprobe, error = %e, "ffprobe unavailable");
                return None;
            }
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() >= deadline => {
                    warn!(?path, ?timeout, "ffprobe timed out");
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                Ok(None) => std::thread::sleep(PROBE_POLL_INTERVAL),
                Err(e) => {
                    warn!(?path, error = %e, "Failed to wait for ffprobe");
                    let _ = child.kill();
                    return None;
                }
            }
        }

        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            debug!(?path, status = ?output.status, "ffprobe could not read duration");
            return None;
        }

        String::from_utf8_lossy(&output.stdout).trim().parse().ok()
    }
}

/// Finds an EBML element by ID and returns its payload.
fn find_element<'a>(buffer: &'a [u8], id: &[u8]) -> Option<&'a [u8]> {
    let mut start = 0;
    while let Some(pos) = buffer[start..].windows(id.len()).position(|w| w == id) {
        let at = start + pos + id.len();
        if let Some((size, size_len)) = read_vint(&buffer[at..]) {
            let payload_start = at + size_len;
            if let Some(payload) = usize::try_from(size)
                .ok()
                .and_then(|size| buffer.get(payload_start..payload_start.checked_add(size)?))
            {
                return Some(payload);
            }
        }
        start += pos + 1;
    }
    None
}

/// Reads an EBML variable-length integer: (value, encoded length).
fn read_vint(data: &[u8]) -> Option<(u64, usize)> {
    let first = *data.first()?;
    if first == 0 {
        return None;
    }

    // EBML VINT: leading zeros indicate byte count
    let len = first.leading_zeros() as usize + 1;
    let bytes = data.get(..len)?;

    let marker_mask = if len == 8 { 0 } else { 0xFFu8 >> len };
    let value = bytes[1..]
        .iter()
        .fold((first & marker_mask) as u64, |acc, &b| (acc << 8) | b as u64);
    Some((value, len))
}

fn be_u32(buf: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(buf.get(at..at + 4)?.try_into().ok()?))
}

fn be_u64(buf: &[u8], at: usize) -> Option<u64> {
    Some(u64::from_be_bytes(buf.get(at..at + 8)?.try_into().ok()?))
}

fn le_u32(buf: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(buf.get(at..at + 4)?.try_into().ok()?))
}
