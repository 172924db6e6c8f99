//! Conversão entre unidades do token e unidades refletidas.
//!
//! Tokens de reflexão guardam saldos em uma unidade interna escalada por
//! `rTotal / tTotal`, onde `rTotal` é o maior múltiplo de `tTotal` que cabe em
//! 256 bits.

use ethers::types::U256;

use crate::errors::{Result, SimulationError};

/// Taxa `rTotal / tTotal` para um supply `total_supply`
pub fn reflection_rate(total_supply: U256) -> Result<U256> {
    if total_supply.is_zero() {
        return Err(SimulationError::InvalidInput(
            "supply zero não define taxa de reflexão".into(),
        ));
    }
    let r_total = U256::MAX - (U256::MAX % total_supply);
    Ok(r_total / total_supply)
}

/// Converte unidades do token em unidades refletidas
pub fn reflection_from_token(amount: U256, total_supply: U256) -> Result<U256> {
    let rate = reflection_rate(total_supply)?;
    amount
        .checked_mul(rate)
        .ok_or_else(|| SimulationError::InvalidInput(format!("{} excede o supply", amount)))
}

/// Converte unidades refletidas em unidades do token (arredonda para baixo)
pub fn token_from_reflection(reflected: U256, total_supply: U256) -> Result<U256> {
    Ok(reflected / reflection_rate(total_supply)?)
}
