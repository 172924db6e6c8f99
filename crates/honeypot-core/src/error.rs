use thiserror::Error;

/// Erros comuns da workspace Honeypot
#[derive(Error, Debug)]
pub enum Error {
    /// Erro ao carregar ou validar configuração
    #[error("Erro de configuração: {0}")]
    ConfigError(String),

    /// Erro de decodificação de dados
    #[error("Erro de decodificação: {0}")]
    DecodeError(String),

    /// Recurso não encontrado
    #[error("Não encontrado: {0}")]
    NotFound(String),

    /// Erro de leitura de arquivo
    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Tipo de resultado usado em toda a biblioteca
pub type Result<T> = std::result::Result<T, Error>;
