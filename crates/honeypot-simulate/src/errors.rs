use ethers::types::H256;
use honeypot_bytecode::ScanError;
use thiserror::Error;

/// Erros que podem ocorrer durante a simulação
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Falha ao iniciar o processo do Anvil
    #[error("falha ao iniciar anvil: {0}")]
    AnvilSpawn(String),

    /// Falha ao criar provider conectado ao Anvil
    #[error("falha ao criar provider do anvil: {0}")]
    ProviderCreation(String),

    /// Sandbox não pôde ser provisionado; não é um veredito sobre o token
    #[error("ambiente de simulação indisponível: {0}")]
    EnvironmentUnavailable(String),

    /// Erro genérico de RPC contra o sandbox
    #[error("falha de rpc: {0}")]
    Rpc(String),

    /// Erro ao enviar transação
    #[error("falha ao enviar transação: {0}")]
    SendTransaction(String),

    /// Erro ao aguardar resultado da transação
    #[error("falha ao aguardar transação: {0}")]
    AwaitTransaction(String),

    /// Transação minerada com status de falha
    #[error("transação revertida: {0:?}")]
    TransactionReverted(H256),

    /// Erro ao obter ou interpretar o trace de uma transação
    #[error("falha no trace: {0}")]
    Trace(String),

    /// Erro de codificação/decodificação ABI
    #[error("erro de abi: {0}")]
    Abi(String),

    /// Bytecode do alvo não pôde ser analisado
    #[error("falha na análise de bytecode: {0}")]
    Scan(#[from] ScanError),

    /// Falha ao preparar liquidez para o token
    #[error("falha no bootstrap de liquidez: {0}")]
    Bootstrap(String),

    /// Parâmetro inválido (supply zero, configuração ausente, ...)
    #[error("entrada inválida: {0}")]
    InvalidInput(String),

    /// Operação realizada após o encerramento da sessão
    #[error("sessao ja encerrada")]
    SessionClosed,
}

impl From<ethers::abi::Error> for SimulationError {
    fn from(e: ethers::abi::Error) -> Self {
        Self::Abi(e.to_string())
    }
}

impl From<ethers::abi::ParseError> for SimulationError {
    fn from(e: ethers::abi::ParseError) -> Self {
        Self::Abi(e.to_string())
    }
}

/// Resultado padrão da crate
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Extrai a mensagem de um payload de pânico
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "pânico sem mensagem".to_string())
}
