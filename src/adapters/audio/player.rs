use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::application::ports::AudioPlayerPort;
use crate::domain::errors::{DomainError, DomainResult};

/// Reproductor basado en un proceso externo (ffplay, mpv, mpg123...).
/// La referencia de audio se pasa como último argumento sin inspeccionarla.
#[derive(Debug, Clone)]
pub struct CommandAudioPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandAudioPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }
}

#[async_trait]
impl AudioPlayerPort for CommandAudioPlayer {
    async fn play(&self, audio_ref: &str) -> DomainResult<()> {
        // kill_on_drop: si la reproducción se cancela, el proceso muere con el futuro.
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(audio_ref)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DomainError::Playback(format!("failed to start {}: {e}", self.program)))?;

        let status = child
            .wait()
            .await
            .map_err(|e| DomainError::Playback(e.to_string()))?;
        debug!(program = %self.program, %status, "player exited");

        if status.success() {
            Ok(())
        } else {
            Err(DomainError::Playback(format!("{} exited with {status}", self.program)))
        }
    }
}
