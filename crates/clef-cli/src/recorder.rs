//! Microphone capture for the `record` command.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use clef_core::media::recorder::{
    ensure_recorder_idle, pcm16_from_f32, transition_recorder_state, RecordedAudio, RecorderEvent,
    RecorderState, RecordingOptions,
};
use clef_core::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

/// Capture microphone input until the user presses Enter, then finalize
/// the take as a WAV payload.
pub fn record_until_enter(requested_device_name: Option<&str>) -> Result<RecordedAudio> {
    let mut state = RecorderState::default();
    ensure_recorder_idle(state)?;
    state = transition_recorder_state(state, RecorderEvent::StartRequested);

    let host = cpal::default_host();
    let device = select_input_device(&host, requested_device_name)?;
    let supported_config = device.default_input_config().map_err(|error| {
        Error::PermissionDenied(format!(
            "could not open the microphone: {error}; check the system microphone permission"
        ))
    })?;

    let options = RecordingOptions {
        sample_rate_hz: supported_config.sample_rate().0,
        channels: supported_config.channels(),
    };
    let sample_format = supported_config.sample_format();
    let stream_config: StreamConfig = supported_config.into();

    let (audio_tx, audio_rx) = mpsc::channel::<Vec<f32>>();
    let (error_tx, error_rx) = mpsc::channel::<String>();

    let stream = build_input_stream(&device, &stream_config, sample_format, audio_tx, error_tx)?;
    stream.play().map_err(|error| {
        Error::PermissionDenied(format!(
            "could not start the microphone stream: {error}; check the system microphone permission"
        ))
    })?;
    state = transition_recorder_state(state, RecorderEvent::StartSucceeded);

    println!("Recording... press Enter to stop.");
    let stop_rx = spawn_enter_listener();

    let mut samples: Vec<f32> = Vec::new();
    while state == RecorderState::Recording {
        if stop_rx.try_recv().is_ok() {
            state = transition_recorder_state(state, RecorderEvent::StopRequested);
            continue;
        }
        if let Ok(stream_error) = error_rx.try_recv() {
            return Err(Error::InvalidInput(format!(
                "Failed to capture audio: {stream_error}"
            )));
        }
        match audio_rx.recv_timeout(Duration::from_millis(10)) {
            Ok(chunk) => samples.extend(chunk),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                state = transition_recorder_state(state, RecorderEvent::StopRequested);
            }
        }
    }

    // Stop the stream, then drain whatever the callback queued before it died.
    drop(stream);
    while let Ok(chunk) = audio_rx.try_recv() {
        samples.extend(chunk);
    }

    RecordedAudio::from_pcm16(&pcm16_from_f32(&samples), options)
}

fn select_input_device(
    host: &cpal::Host,
    requested_device_name: Option<&str>,
) -> Result<cpal::Device> {
    if let Some(name) = requested_device_name {
        let devices = host.input_devices().map_err(|error| {
            Error::PermissionDenied(format!(
                "could not list input devices: {error}; check the system microphone permission"
            ))
        })?;
        for device in devices {
            if let Ok(device_name) = device.name() {
                if device_name == name {
                    return Ok(device);
                }
            }
        }
        if let Some(default_device) = host.default_input_device() {
            eprintln!(
                "clef: input device '{name}' not found; falling back to the default input device"
            );
            return Ok(default_device);
        }
        return Err(Error::PermissionDenied(format!(
            "input device '{name}' was not found and no default microphone is available"
        )));
    }

    host.default_input_device().ok_or_else(|| {
        Error::PermissionDenied(
            "no microphone is available; check the system microphone permission".to_string(),
        )
    })
}

fn build_input_stream(
    device: &cpal::Device,
    stream_config: &StreamConfig,
    sample_format: SampleFormat,
    audio_tx: Sender<Vec<f32>>,
    error_tx: Sender<String>,
) -> Result<Stream> {
    let built = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            stream_config,
            move |data: &[f32], _| {
                let _ = audio_tx.send(data.to_vec());
            },
            move |err| {
                let _ = error_tx.send(err.to_string());
            },
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            stream_config,
            move |data: &[i16], _| {
                let converted = data
                    .iter()
                    .map(|sample| f32::from(*sample) / f32::from(i16::MAX))
                    .collect::<Vec<_>>();
                let _ = audio_tx.send(converted);
            },
            move |err| {
                let _ = error_tx.send(err.to_string());
            },
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            stream_config,
            move |data: &[u16], _| {
                let converted = data
                    .iter()
                    .map(|sample| (f32::from(*sample) / f32::from(u16::MAX)) * 2.0 - 1.0)
                    .collect::<Vec<_>>();
                let _ = audio_tx.send(converted);
            },
            move |err| {
                let _ = error_tx.send(err.to_string());
            },
            None,
        ),
        other => {
            return Err(Error::UnsupportedPlatform(format!(
                "unsupported microphone sample format: {other:?}"
            )))
        }
    };

    built.map_err(|error| {
        Error::PermissionDenied(format!(
            "could not open the microphone: {error}; check the system microphone permission"
        ))
    })
}

fn spawn_enter_listener() -> Receiver<()> {
    let (stop_tx, stop_rx) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().read_line(&mut line);
        let _ = stop_tx.send(());
    });
    stop_rx
}
