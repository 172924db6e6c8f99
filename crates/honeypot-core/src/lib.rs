/*!
 * Honeypot Core
 *
 * Tipos, perfis de rede e utilitários compartilhados para a workspace Honeypot
 */

pub mod error;
pub mod network;
pub mod types;
pub mod utils;

// Re-exportações públicas
pub use error::Error;
pub use network::*;
pub use types::*;
