// Mutes the recognizer's own start tone so it is not captured as speech.
use crate::errors::DonnaResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStream {
    Notification,
    Music,
}

/// Platform volume control.
pub trait AudioControl: Send {
    fn volume(&self, stream: AudioStream) -> DonnaResult<u32>;
    fn max_volume(&self, stream: AudioStream) -> DonnaResult<u32>;
    fn set_volume(&mut self, stream: AudioStream, level: u32) -> DonnaResult<()>;
}

pub struct BeepSuppressor {
    audio: Option<Box<dyn AudioControl>>,
    saved_notification: u32,
}

impl BeepSuppressor {
    pub fn new(audio: Option<Box<dyn AudioControl>>) -> Self {
        Self {
            audio,
            saved_notification: 0,
        }
    }

    /// Remember the notification level, then silence notification + media.
    /// The level is kept even when a later write fails, so `restore` never
    /// leaves notifications at zero.
    pub fn mute(&mut self) {
        let Some(audio) = self.audio.as_mut() else { return };
        match audio.volume(AudioStream::Notification) {
            Ok(level) => self.saved_notification = level,
            Err(e) => {
                tracing::debug!(error = %e, "could not read notification volume; not muting");
                return;
            }
        }
        if let Err(e) = silence(audio.as_mut()) {
            tracing::debug!(error = %e, "mute failed");
        }
    }

    /// Notification back to the saved level, media to a third of max.
    pub fn restore(&mut self) {
        let saved = self.saved_notification;
        let Some(audio) = self.audio.as_mut() else { return };
        if let Err(e) = unsilence(audio.as_mut(), saved) {
            tracing::debug!(error = %e, "unmute failed");
        }
    }
}

fn silence(audio: &mut dyn AudioControl) -> DonnaResult<()> {
    audio.set_volume(AudioStream::Notification, 0)?;
    audio.set_volume(AudioStream::Music, 0)
}

fn unsilence(audio: &mut dyn AudioControl, notification: u32) -> DonnaResult<()> {
    audio.set_volume(AudioStream::Notification, notification)?;
    let music = audio.max_volume(AudioStream::Music)? / 3;
    audio.set_volume(AudioStream::Music, music)
}
