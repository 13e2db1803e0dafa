//! Microphone recording state machine and WAV finalization.

use std::io::Cursor;

use crate::error::{Error, Result};
use crate::media::{MediaDescriptor, MediaKind};
use crate::util::unix_timestamp_millis_now;

/// MIME type produced by the recording encoder.
pub const RECORDING_MIME: &str = "audio/wav";

/// Recorder control state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// Recorder is idle and ready for a new capture.
    #[default]
    Idle,
    /// Start has been requested and the microphone is initializing.
    Starting,
    /// Recorder is actively capturing microphone input.
    Recording,
    /// Stop has been requested and the payload is being finalized.
    Stopping,
}

/// Discrete state-machine events for recorder transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderEvent {
    StartRequested,
    StartSucceeded,
    StartFailed,
    StopRequested,
    StopSucceeded,
    StopFailed,
    DiscardRequested,
}

/// Deterministic recorder state transition helper.
///
/// Invalid pairs leave the state unchanged, so a start request while a
/// capture is active cannot produce a second pipeline.
#[must_use]
pub const fn transition_recorder_state(
    state: RecorderState,
    event: RecorderEvent,
) -> RecorderState {
    match (state, event) {
        (RecorderState::Idle, RecorderEvent::StartRequested) => RecorderState::Starting,
        (RecorderState::Starting, RecorderEvent::StartSucceeded) => RecorderState::Recording,
        (RecorderState::Starting, RecorderEvent::StartFailed)
        | (
            RecorderState::Stopping,
            RecorderEvent::StopSucceeded | RecorderEvent::StopFailed,
        )
        | (_, RecorderEvent::DiscardRequested) => RecorderState::Idle,
        (RecorderState::Recording, RecorderEvent::StopRequested) => RecorderState::Stopping,
        _ => state,
    }
}

/// Reject a start request unless the recorder is idle.
pub fn ensure_recorder_idle(state: RecorderState) -> Result<()> {
    if state == RecorderState::Idle {
        Ok(())
    } else {
        Err(Error::InvalidInput(
            "a recording is already in progress".to_string(),
        ))
    }
}

/// Recording WAV encoding options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingOptions {
    /// PCM sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Number of interleaved audio channels.
    pub channels: u16,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            channels: 1,
        }
    }
}

impl RecordingOptions {
    fn validate(self) -> Result<Self> {
        if self.sample_rate_hz == 0 {
            return Err(Error::InvalidInput(
                "Recording sample_rate_hz must be greater than zero".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(Error::InvalidInput(
                "Recording channels must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Encode interleaved PCM16 samples as a WAV byte buffer.
pub fn encode_recording_wav(samples_pcm16: &[i16], options: RecordingOptions) -> Result<Vec<u8>> {
    let options = options.validate()?;

    let spec = hound::WavSpec {
        channels: options.channels,
        sample_rate: options.sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(|error| {
            Error::InvalidInput(format!("Failed to initialize WAV writer: {error}"))
        })?;

        for &sample in samples_pcm16 {
            writer.write_sample(sample).map_err(|error| {
                Error::InvalidInput(format!("Failed to write WAV sample: {error}"))
            })?;
        }

        writer.finalize().map_err(|error| {
            Error::InvalidInput(format!("Failed to finalize WAV data: {error}"))
        })?;
    }

    Ok(cursor.into_inner())
}

/// Convert normalized `f32` samples to PCM16, clamping out-of-range values.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn pcm16_from_f32(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|sample| (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
        .collect()
}

/// Estimate capture duration in milliseconds for interleaved PCM samples.
pub fn estimate_recording_duration_ms(
    sample_count: usize,
    options: RecordingOptions,
) -> Result<u64> {
    let options = options.validate()?;
    let channels = usize::from(options.channels);

    let frame_count = sample_count / channels;
    let duration_ms = (frame_count as u128)
        .saturating_mul(1_000)
        .saturating_div(u128::from(options.sample_rate_hz));

    Ok(u64::try_from(duration_ms).unwrap_or(u64::MAX))
}

/// Completed microphone capture payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedAudio {
    /// Generated file name, `recording-<unix millis>.wav`.
    pub file_name: String,
    /// Always [`RECORDING_MIME`].
    pub mime_type: String,
    /// Encoded WAV bytes.
    pub bytes: Vec<u8>,
    /// Estimated duration.
    pub duration_ms: u64,
}

impl RecordedAudio {
    /// Finalize interleaved PCM16 samples into an uploadable WAV payload.
    pub fn from_pcm16(samples: &[i16], options: RecordingOptions) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::InvalidInput(
                "Recording contains no audio samples".to_string(),
            ));
        }

        let bytes = encode_recording_wav(samples, options)?;
        let duration_ms = estimate_recording_duration_ms(samples.len(), options)?;

        Ok(Self {
            file_name: build_recording_file_name(),
            mime_type: RECORDING_MIME.to_string(),
            bytes,
            duration_ms,
        })
    }

    /// Hand the capture over for submission.
    #[must_use]
    pub fn into_descriptor(self) -> MediaDescriptor {
        MediaDescriptor::with_mime(
            MediaKind::Audio,
            Some(&self.file_name),
            &self.mime_type,
            self.bytes,
        )
    }
}

fn build_recording_file_name() -> String {
    format!("recording-{}.wav", unix_timestamp_millis_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_covers_start_stop_and_discard() {
        let state = transition_recorder_state(RecorderState::Idle, RecorderEvent::StartRequested);
        assert_eq!(state, RecorderState::Starting);

        let state = transition_recorder_state(state, RecorderEvent::StartSucceeded);
        assert_eq!(state, RecorderState::Recording);

        let state = transition_recorder_state(state, RecorderEvent::StopRequested);
        assert_eq!(state, RecorderState::Stopping);

        let state = transition_recorder_state(state, RecorderEvent::StopSucceeded);
        assert_eq!(state, RecorderState::Idle);

        let state =
            transition_recorder_state(RecorderState::Recording, RecorderEvent::DiscardRequested);
        assert_eq!(state, RecorderState::Idle);
    }

    #[test]
    fn double_start_is_rejected() {
        let state = transition_recorder_state(RecorderState::Idle, RecorderEvent::StartRequested);
        let state = transition_recorder_state(state, RecorderEvent::StartSucceeded);

        // The machine ignores a second start and the guard refuses it.
        assert_eq!(
            transition_recorder_state(state, RecorderEvent::StartRequested),
            RecorderState::Recording
        );
        assert!(matches!(
            ensure_recorder_idle(state),
            Err(Error::InvalidInput(_))
        ));
        assert!(ensure_recorder_idle(RecorderState::Idle).is_ok());
    }

    #[test]
    fn wav_encoding_round_trips_header_and_samples() {
        let samples = vec![0_i16, 1200, -1200, 300, -300];

        let bytes = encode_recording_wav(
            &samples,
            RecordingOptions {
                sample_rate_hz: 16_000,
                channels: 1,
            },
        )
        .unwrap();
        assert!(!bytes.is_empty());

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader
            .samples::<i16>()
            .map(std::result::Result::unwrap)
            .collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn pcm_conversion_clamps_out_of_range_samples() {
        let samples = pcm16_from_f32(&[0.0, 1.0, -1.0, 2.5, -2.5]);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[1], i16::MAX);
        assert_eq!(samples[3], i16::MAX);
        assert_eq!(samples[4], -i16::MAX);
    }

    #[test]
    fn finalized_recording_is_named_and_typed() {
        let audio = RecordedAudio::from_pcm16(&[100, -100, 200], RecordingOptions::default())
            .unwrap();
        assert!(audio.file_name.starts_with("recording-"));
        assert!(audio.file_name.ends_with(".wav"));
        assert_eq!(audio.mime_type, RECORDING_MIME);

        let descriptor = audio.into_descriptor();
        assert_eq!(descriptor.kind, MediaKind::Audio);
        assert_eq!(descriptor.mime_type, RECORDING_MIME);
    }

    #[test]
    fn empty_capture_and_invalid_options_are_rejected() {
        let err = RecordedAudio::from_pcm16(&[], RecordingOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = encode_recording_wav(
            &[1, 2, 3],
            RecordingOptions {
                sample_rate_hz: 0,
                channels: 1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn duration_estimation_handles_mono_and_stereo() {
        let mono = estimate_recording_duration_ms(
            16_000,
            RecordingOptions {
                sample_rate_hz: 16_000,
                channels: 1,
            },
        )
        .unwrap();
        assert_eq!(mono, 1_000);

        // 2 channels interleaved: 32_000 samples = 16_000 frames = 1 second
        let stereo = estimate_recording_duration_ms(
            32_000,
            RecordingOptions {
                sample_rate_hz: 16_000,
                channels: 2,
            },
        )
        .unwrap();
        assert_eq!(stereo, 1_000);
    }
}
