//! Audio device lookup and enumeration on the default host

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{SampleFormat, SupportedBufferSize, SupportedStreamConfigRange};

use crate::config::StreamSettings;
use crate::error::{AudioError, AudioResult, Direction};

/// Information about an audio device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    pub name: String,
    pub direction: Direction,
    /// Whether this is the host default for its direction
    pub is_default: bool,
    /// Whether any config accepts `f32` samples at 44.1 or 48kHz
    pub supports_f32: bool,
    pub max_channels: u16,
}

impl std::fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.is_default { " (default)" } else { "" };
        write!(f, "[{}] {}{}", self.direction, self.name, marker)
    }
}

/// Enumerate input and output devices of the default host
pub fn list_devices() -> AudioResult<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let default_input = host.default_input_device().and_then(|d| d.name().ok());
    let inputs = host
        .input_devices()
        .map_err(|e| AudioError::Enumeration(e.to_string()))?;
    for device in inputs {
        let Ok(name) = device.name() else { continue };
        let configs: Vec<_> = match device.supported_input_configs() {
            Ok(c) => c.collect(),
            Err(e) => {
                log::debug!("Skipping input device {}: {}", name, e);
                continue;
            }
        };
        devices.push(describe(name.clone(), Direction::Input, default_input.as_ref() == Some(&name), &configs));
    }

    let default_output = host.default_output_device().and_then(|d| d.name().ok());
    let outputs = host
        .output_devices()
        .map_err(|e| AudioError::Enumeration(e.to_string()))?;
    for device in outputs {
        let Ok(name) = device.name() else { continue };
        let configs: Vec<_> = match device.supported_output_configs() {
            Ok(c) => c.collect(),
            Err(e) => {
                log::debug!("Skipping output device {}: {}", name, e);
                continue;
            }
        };
        devices.push(describe(name.clone(), Direction::Output, default_output.as_ref() == Some(&name), &configs));
    }

    log::info!("Enumerated {} audio devices on {:?}", devices.len(), host.id());
    Ok(devices)
}

fn describe(
    name: String,
    direction: Direction,
    is_default: bool,
    configs: &[SupportedStreamConfigRange],
) -> AudioDevice {
    let supports_f32 = configs.iter().any(|c| {
        c.sample_format() == SampleFormat::F32
            && [44_100, 48_000]
                .iter()
                .any(|&rate| rate >= c.min_sample_rate().0 && rate <= c.max_sample_rate().0)
    });
    AudioDevice {
        name,
        direction,
        is_default,
        supports_f32,
        max_channels: configs.iter().map(|c| c.channels()).max().unwrap_or(0),
    }
}

/// Find a device by name, or the host default when `name` is `None`
pub fn find_device(host: &cpal::Host, direction: Direction, name: Option<&str>) -> AudioResult<cpal::Device> {
    let Some(name) = name else {
        let device = match direction {
            Direction::Input => host.default_input_device(),
            Direction::Output => host.default_output_device(),
        };
        return device.ok_or(AudioError::NoDefaultDevice(direction));
    };

    let matches = |d: &cpal::Device| d.name().ok().as_deref() == Some(name);
    let found = match direction {
        Direction::Input => host
            .input_devices()
            .map_err(|e| AudioError::Enumeration(e.to_string()))?
            .find(matches),
        Direction::Output => host
            .output_devices()
            .map_err(|e| AudioError::Enumeration(e.to_string()))?
            .find(matches),
    };

    found.ok_or_else(|| AudioError::DeviceNotFound {
        direction,
        name: name.to_string(),
    })
}

/// Pick a mono-most `f32` config at the requested rate and period size
pub fn select_config(
    device: &cpal::Device,
    direction: Direction,
    settings: &StreamSettings,
) -> AudioResult<cpal::StreamConfig> {
    let supported: Vec<SupportedStreamConfigRange> = match direction {
        Direction::Input => device.supported_input_configs().map(|c| c.collect::<Vec<_>>()),
        Direction::Output => device.supported_output_configs().map(|c| c.collect::<Vec<_>>()),
    }
    .map_err(|e| AudioError::UnsupportedConfig {
        direction,
        message: e.to_string(),
    })?;

    let rate = settings.sample_rate;
    let best = supported
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| rate >= c.min_sample_rate().0 && rate <= c.max_sample_rate().0)
        .min_by_key(|c| c.channels())
        .ok_or_else(|| AudioError::UnsupportedConfig {
            direction,
            message: format!("no f32 config at {}Hz", rate),
        })?;

    let frames = settings.chunk_size as u32;
    let buffer_size = match best.buffer_size() {
        SupportedBufferSize::Range { min, max } if frames < *min || frames > *max => {
            log::warn!(
                "{} device cannot use {} frame periods ({}..={}), using its default",
                direction,
                frames,
                min,
                max
            );
            cpal::BufferSize::Default
        }
        _ => cpal::BufferSize::Fixed(frames),
    };

    let config = cpal::StreamConfig {
        channels: best.channels(),
        sample_rate: cpal::SampleRate(rate),
        buffer_size,
    };
    log::debug!("Selected {} config: {:?}", direction, config);
    Ok(config)
}
