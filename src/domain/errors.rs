use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
    /// Conectividad, timeout o E/S durante la petición al servidor.
    #[error("Error de transporte: {0}")]
    Transport(String),
    /// El servidor respondió con un estado HTTP no exitoso.
    #[error("Error del servidor: HTTP {status}")]
    Server { status: u16 },
    /// Cuerpo de respuesta mal formado.
    #[error("Respuesta inválida: {0}")]
    Parse(String),
    #[error("Error de reproducción: {0}")]
    Playback(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
