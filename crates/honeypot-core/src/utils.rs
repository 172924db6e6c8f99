/*!
 * Honeypot Utils
 *
 * Utilitários comuns usados em toda a workspace Honeypot
 */

use ethereum_types::{Address, H256, U256};
use std::str::FromStr;
use tiny_keccak::{Hasher, Keccak};

/// Converte uma string hexadecimal para Address
pub fn hex_to_address(hex: &str) -> Option<Address> {
    Address::from_str(hex.trim_start_matches("0x")).ok()
}

/// Converte uma string hexadecimal para H256, aceitando chaves sem zeros à esquerda
pub fn hex_to_h256(hex: &str) -> Option<H256> {
    let hex_str = hex.trim_start_matches("0x");
    if hex_str.len() > 64 {
        return None;
    }
    H256::from_str(&format!("{:0>64}", hex_str)).ok()
}

/// Formata um H256 para exibição
pub fn format_h256(hash: &H256) -> String {
    format!("0x{:x}", hash)
}

/// Converte um U256 para a palavra de 32 bytes big-endian
pub fn u256_to_h256(value: U256) -> H256 {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    H256(buf)
}

/// Converte uma palavra de 32 bytes big-endian para U256
pub fn h256_to_u256(value: H256) -> U256 {
    U256::from_big_endian(value.as_bytes())
}

/// Calcula o hash Keccak-256 de dados
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut result = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut result);
    result
}

/// Converte um U256 para f64 (com perda de precisão acima de 2^53)
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .enumerate()
        .map(|(i, limb)| (*limb as f64) * 2f64.powi(64 * i as i32))
        .sum()
}

/// Arredonda `value` para `places` casas decimais
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Calcula `part / whole * 100` com `decimals` casas decimais.
///
/// Usa aritmética inteira enquanto couber em 256 bits.
pub fn percentage(part: U256, whole: U256, decimals: u32) -> Option<f64> {
    if whole.is_zero() {
        return None;
    }
    let scale = U256::exp10(decimals as usize) * U256::from(100u64);
    let exact = part
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(whole / 2))
        .map(|scaled| scaled / whole);
    Some(match exact {
        Some(rounded) => u256_to_f64(rounded) / 10f64.powi(decimals as i32),
        None => round_to(u256_to_f64(part) / u256_to_f64(whole) * 100.0, decimals),
    })
}

/// Converte um valor inteiro em unidades do token para f64 com `places` casas
pub fn format_units_f64(amount: U256, decimals: u8, places: u32) -> f64 {
    round_to(u256_to_f64(amount) / 10f64.powi(decimals as i32), places)
}

/// Formata um valor com decimais para exibição
pub fn format_token_amount(amount: &U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }

    let divisor = U256::exp10(decimals as usize);
    let integer_part = amount / divisor;
    let fractional_part = amount % divisor;

    let fractional = format!("{:0>width$}", fractional_part.to_string(), width = decimals as usize);
    let fractional = fractional.trim_end_matches('0');

    if fractional.is_empty() {
        integer_part.to_string()
    } else {
        format!("{}.{}", integer_part, fractional)
    }
}
