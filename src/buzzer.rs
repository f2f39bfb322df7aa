use anyhow::anyhow;
use sdl2::Sdl;
use sdl2::audio::{AudioCallback, AudioSpecDesired, AudioDevice, AudioStatus};

const TONE_HZ: f32 = 440.0;
const VOLUME: f32 = 0.25;

/// Beeps while the sound timer is running.
pub struct Buzzer {
    device: AudioDevice<SquareWave>,
}

impl Buzzer {
    pub fn from_sdl_context(sdl_context: &Sdl) -> anyhow::Result<Self> {
        let audio_subsystem = sdl_context.audio().map_err(|e| anyhow!(e))?;

        let desired_spec = AudioSpecDesired {
            freq: Some(44100),
            channels: Some(1),  // mono
            samples: None       // default sample size
        };

        let device = audio_subsystem.open_playback(None, &desired_spec, |spec| {
            SquareWave {
                phase_inc: TONE_HZ / spec.freq as f32,
                phase: 0.0,
                volume: VOLUME
            }
        }).map_err(|e| anyhow!(e))?;

        Ok(Buzzer { device })
    }

    pub fn is_on(&self) -> bool {
        self.device.status() == AudioStatus::Playing
    }

    /// Starts or stops the tone, doing nothing if it is already in that state.
    pub fn set_tone(&self, on: bool) {
        if on && !self.is_on() {
            self.device.resume();
        } else if !on && self.is_on() {
            self.device.pause();
        }
    }
}

pub struct SquareWave {
    phase_inc: f32,
    phase: f32,
    volume: f32
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for x in out.iter_mut() {
            *x = if self.phase <= 0.5 {
                self.volume
            } else {
                -self.volume
            };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}
