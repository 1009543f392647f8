//! Audio file loading and decoding

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey};
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during track loading
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Unsupported format")]
    UnsupportedFormat,
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Track metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub duration_secs: f64,
    /// Rate of the file before resampling
    pub source_sample_rate: u32,
    /// Channel count of the file before stereo conversion
    pub source_channels: u16,
}

impl TrackMetadata {
    /// "Artist - Title", or just the title when the artist is unknown
    pub fn display_name(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.artist, self.title)
        }
    }
}

/// A decoded track, ready for the sample player
pub struct LoadedTrack {
    pub path: PathBuf,
    /// Interleaved stereo samples (f32, -1.0 to 1.0)
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
    pub metadata: TrackMetadata,
}

impl LoadedTrack {
    pub fn duration(&self) -> f64 {
        (self.samples.len() / 2) as f64 / self.sample_rate.max(1) as f64
    }
}

/// Audio file loader using Symphonia
#[derive(Debug, Clone, Copy)]
pub struct TrackLoader {
    target_sample_rate: u32,
}

impl Default for TrackLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackLoader {
    /// Loader producing 48kHz output
    pub fn new() -> Self {
        Self::with_sample_rate(48000)
    }

    /// Loader producing output at the given rate
    pub fn with_sample_rate(target_sample_rate: u32) -> Self {
        Self {
            target_sample_rate: target_sample_rate.max(1),
        }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Decode on a background thread. The receiver yields exactly one result.
    pub fn spawn_load(
        &self,
        path: PathBuf,
    ) -> crossbeam_channel::Receiver<Result<LoadedTrack, LoadError>> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let loader = *self;
        thread::spawn(move || {
            let result = loader.load(&path);
            if let Err(ref e) = result {
                warn!(path = %path.display(), error = %e, "track load failed");
            }
            let _ = tx.send(result);
        });
        rx
    }

    /// Load and decode an audio file
    pub fn load(&self, path: &Path) -> Result<LoadedTrack, LoadError> {
        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|_| LoadError::UnsupportedFormat)?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let source_sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(2)
            .max(1);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut metadata = extract_metadata(&mut format, path);
        metadata.source_sample_rate = source_sample_rate;
        metadata.source_channels = channels;

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "stopping decode");
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(_) => continue,
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity() as u64;
            let mut sample_buf = SampleBuffer::<f32>::new(capacity, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        if samples.is_empty() {
            return Err(LoadError::Decode("no audio frames decoded".into()));
        }

        let stereo = to_stereo(&samples, channels);
        let stereo = if source_sample_rate != self.target_sample_rate {
            resample_stereo(&stereo, source_sample_rate, self.target_sample_rate)?
        } else {
            stereo
        };

        metadata.duration_secs = (stereo.len() / 2) as f64 / self.target_sample_rate as f64;
        let track = LoadedTrack {
            path: path.to_path_buf(),
            samples: Arc::new(stereo),
            sample_rate: self.target_sample_rate,
            metadata,
        };
        info!(
            title = %track.metadata.title,
            duration = track.metadata.duration_secs,
            sample_rate = track.sample_rate,
            "track decoded"
        );
        Ok(track)
    }
}

/// Fold any channel layout into interleaved stereo.
///
/// Mono is duplicated; extra channels beyond the first two are dropped.
pub fn to_stereo(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 | 2 => samples.to_vec(),
        1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        n => samples
            .chunks_exact(n as usize)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

/// Resample interleaved stereo between rates
pub fn resample_stereo(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, LoadError> {
    use rubato::{FftFixedInOut, Resampler};

    const CHANNELS: usize = 2;
    let frames = samples.len() / CHANNELS;

    let mut resampler = FftFixedInOut::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024,
        CHANNELS,
    )
    .map_err(|e| LoadError::Decode(e.to_string()))?;

    let deinterleaved: Vec<Vec<f32>> = (0..CHANNELS)
        .map(|ch| (0..frames).map(|f| samples[f * CHANNELS + ch]).collect())
        .collect();

    let chunk_size = resampler.input_frames_next();
    let mut output: Vec<Vec<f32>> = vec![Vec::new(); CHANNELS];

    let mut pos = 0;
    while pos + chunk_size <= frames {
        let input_refs: Vec<&[f32]> = deinterleaved
            .iter()
            .map(|ch| &ch[pos..pos + chunk_size])
            .collect();

        let resampled = resampler
            .process(&input_refs, None)
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        for (ch, data) in resampled.into_iter().enumerate() {
            output[ch].extend(data);
        }
        pos += chunk_size;
    }

    // Tail: pad to a full chunk and keep the proportional share
    if pos < frames {
        let remaining = frames - pos;
        let padded: Vec<Vec<f32>> = deinterleaved
            .iter()
            .map(|ch| {
                let mut v = ch[pos..].to_vec();
                v.resize(chunk_size, 0.0);
                v
            })
            .collect();
        let input_refs: Vec<&[f32]> = padded.iter().map(|v| v.as_slice()).collect();

        let resampled = resampler
            .process(&input_refs, None)
            .map_err(|e| LoadError::Decode(e.to_string()))?;
        let keep = remaining * target_rate as usize / source_rate as usize;
        for (ch, data) in resampled.into_iter().enumerate() {
            output[ch].extend(&data[..keep.min(data.len())]);
        }
    }

    let output_frames = output[0].len().min(output[1].len());
    let mut interleaved = Vec::with_capacity(output_frames * CHANNELS);
    for i in 0..output_frames {
        interleaved.push(output[0][i]);
        interleaved.push(output[1][i]);
    }
    Ok(interleaved)
}

/// Title and artist from tags, falling back to the file name
fn extract_metadata(format: &mut Box<dyn FormatReader>, path: &Path) -> TrackMetadata {
    let mut metadata = TrackMetadata {
        title: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string(),
        ..Default::default()
    };

    if let Some(meta) = format.metadata().current() {
        for tag in meta.tags() {
            match tag.std_key {
                Some(StandardTagKey::TrackTitle) => metadata.title = tag.value.to_string(),
                Some(StandardTagKey::Artist) => metadata.artist = tag.value.to_string(),
                _ => {}
            }
        }
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Minimal 16-bit PCM WAV
    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
        let data_len = (frames * channels as usize * 2) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * channels as u32 * 2).to_le_bytes());
        bytes.extend_from_slice(&(channels * 2).to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for i in 0..frames {
            let v = ((i as f32 * 0.01).sin() * 8000.0) as i16;
            for _ in 0..channels {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(&bytes).unwrap();
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("spindle-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_to_stereo_layouts() {
        assert_eq!(to_stereo(&[0.1, 0.2], 1), vec![0.1, 0.1, 0.2, 0.2]);
        assert_eq!(to_stereo(&[0.1, 0.2], 2), vec![0.1, 0.2]);
        assert_eq!(
            to_stereo(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], 3),
            vec![0.1, 0.2, 0.4, 0.5]
        );
    }

    #[test]
    fn test_resample_length() {
        let input = vec![0.0f32; 44100 * 2];
        let output = resample_stereo(&input, 44100, 48000).unwrap();
        let frames = output.len() / 2;
        assert!((frames as i64 - 48000).abs() < 1100, "got {} frames", frames);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let loader = TrackLoader::new();
        let result = loader.load(Path::new("/definitely/not/here.wav"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_garbage_is_unsupported() {
        let path = temp_path("garbage.bin");
        std::fs::write(&path, b"not audio at all, just text").unwrap();
        let result = TrackLoader::new().load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(LoadError::UnsupportedFormat)));
    }

    #[test]
    fn test_load_mono_wav() {
        let path = temp_path("mono.wav");
        write_wav(&path, 8000, 1, 4000);
        let track = TrackLoader::with_sample_rate(8000).load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(track.sample_rate, 8000);
        assert_eq!(track.metadata.source_channels, 1);
        assert!((track.duration() - 0.5).abs() < 1e-6);
        assert_eq!(track.metadata.duration_secs, track.duration());
        assert!(track.metadata.title.ends_with("mono"));
        // Mono duplicated into both channels
        assert_eq!(track.samples[200], track.samples[201]);
    }

    #[test]
    fn test_spawn_load_reports_once() {
        let loader = TrackLoader::new();
        let rx = loader.spawn_load(PathBuf::from("/definitely/not/here.flac"));
        let result = rx.recv().unwrap();
        assert!(result.is_err());
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_display_name() {
        let mut meta = TrackMetadata {
            title: "Blue Monday".into(),
            ..Default::default()
        };
        assert_eq!(meta.display_name(), "Blue Monday");
        meta.artist = "New Order".into();
        assert_eq!(meta.display_name(), "New Order - Blue Monday");
    }
}
