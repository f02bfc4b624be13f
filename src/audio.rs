//! Audio cue for timer start and completion.
//!
//! With the `audio` feature a two-tone chime is generated through rodio.
//! Without it the terminal bell is rung.

#[cfg(feature = "audio")]
pub use chime::AudioPlayer;

#[cfg(not(feature = "audio"))]
pub use bell::AudioPlayer;

#[cfg(feature = "audio")]
mod chime {
    use rodio::source::{SineWave, Source};
    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use std::time::Duration;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum AudioError {
        #[error("Failed to initialize audio output: {0}")]
        Stream(#[from] rodio::StreamError),
        #[error("Failed to play audio: {0}")]
        Play(#[from] rodio::PlayError),
    }

    pub struct AudioPlayer {
        // Dropping the stream silences the sink.
        _stream: Option<OutputStream>,
        handle: Option<OutputStreamHandle>,
    }

    impl AudioPlayer {
        /// Opens the default output device; without one the player stays silent.
        pub fn new() -> Self {
            match OutputStream::try_default() {
                Ok((stream, handle)) => Self {
                    _stream: Some(stream),
                    handle: Some(handle),
                },
                Err(e) => {
                    tracing::warn!(error = %e, "no audio output, chime disabled");
                    Self {
                        _stream: None,
                        handle: None,
                    }
                }
            }
        }

        /// Plays the chime.
        pub fn play_chime(&self) {
            if let Err(e) = self.play_generated_tone() {
                tracing::warn!(error = %e, "failed to play chime");
            }
        }

        fn play_generated_tone(&self) -> Result<(), AudioError> {
            let Some(handle) = self.handle.as_ref() else {
                return Ok(());
            };
            let sink = Sink::try_new(handle)?;

            // 880 Hz (A5) then 1046.5 Hz (C6)
            let tone1 = SineWave::new(880.0)
                .take_duration(Duration::from_millis(150))
                .amplify(0.3);
            let silence =
                rodio::source::Zero::<f32>::new(1, 44100).take_duration(Duration::from_millis(50));
            let tone2 = SineWave::new(1046.5)
                .take_duration(Duration::from_millis(200))
                .amplify(0.3);

            sink.append(tone1);
            sink.append(silence);
            sink.append(tone2);
            sink.detach();

            Ok(())
        }
    }
}

#[cfg(not(feature = "audio"))]
mod bell {
    use std::io::{self, Write};

    pub struct AudioPlayer;

    impl AudioPlayer {
        pub fn new() -> Self {
            Self
        }

        /// Rings the terminal bell.
        pub fn play_chime(&self) {
            let mut out = io::stdout();
            if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
                tracing::debug!(error = %e, "failed to ring bell");
            }
        }
    }
}
