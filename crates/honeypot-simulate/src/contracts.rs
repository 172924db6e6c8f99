//! Codificação das chamadas aos contratos externos (ERC20, WETH, factory,
//! roteador e roteador de trânsito).

use ethers::abi::{AbiParser, Function, Token as AbiToken};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, NameOrAddress, TransactionReceipt,
    TransactionRequest, U256,
};
use honeypot_core::Token;

use crate::errors::{Result, SimulationError};
use crate::traits::ChainClient;

/// Interpreta a assinatura legível de uma função
pub fn function(signature: &str) -> Result<Function> {
    Ok(AbiParser::default().parse_function(signature)?)
}

/// Monta uma transação legada
pub fn build_tx(
    from: Option<Address>,
    to: Option<Address>,
    data: Vec<u8>,
    value: Option<U256>,
    gas: Option<U256>,
) -> TypedTransaction {
    let mut req = TransactionRequest::new().data(Bytes::from(data));
    if let Some(from) = from {
        req = req.from(from);
    }
    if let Some(to) = to {
        req = req.to(NameOrAddress::Address(to));
    }
    if let Some(value) = value {
        req = req.value(value);
    }
    if let Some(gas) = gas {
        req = req.gas(gas);
    }
    req.into()
}

/// Executa uma chamada somente leitura e decodifica o retorno
pub async fn read<C>(
    client: &C,
    to: Address,
    signature: &str,
    args: &[AbiToken],
) -> Result<Vec<AbiToken>>
where
    C: ChainClient + ?Sized,
{
    let abi = function(signature)?;
    let data = abi.encode_input(args)?;
    let out = client.call(&build_tx(None, Some(to), data, None, None)).await?;
    Ok(abi.decode_output(&out)?)
}

/// Parâmetros de envio de uma transação
#[derive(Debug, Clone, Copy)]
pub struct TxOpts {
    pub from: Address,
    pub value: Option<U256>,
    pub gas: Option<U256>,
}

impl TxOpts {
    pub fn from(from: Address) -> Self {
        Self { from, value: None, gas: None }
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn gas(mut self, gas: U256) -> Self {
        self.gas = Some(gas);
        self
    }
}

/// Envia uma transação codificada a partir da assinatura
pub async fn write<C>(
    client: &C,
    opts: TxOpts,
    to: Address,
    signature: &str,
    args: &[AbiToken],
) -> Result<TransactionReceipt>
where
    C: ChainClient + ?Sized,
{
    let data = function(signature)?.encode_input(args)?;
    client
        .send_transaction(&build_tx(Some(opts.from), Some(to), data, opts.value, opts.gas))
        .await
}

fn uint_at(tokens: Vec<AbiToken>, what: &str) -> Result<U256> {
    tokens
        .into_iter()
        .next()
        .and_then(AbiToken::into_uint)
        .ok_or_else(|| SimulationError::Abi(format!("{} sem retorno uint", what)))
}

fn address_at(tokens: Vec<AbiToken>, what: &str) -> Result<Address> {
    tokens
        .into_iter()
        .next()
        .and_then(AbiToken::into_address)
        .ok_or_else(|| SimulationError::Abi(format!("{} sem retorno address", what)))
}

/// Decodifica um retorno textual que pode ser `string` ou `bytes32`
pub fn decode_text(raw: &[u8]) -> Option<String> {
    if let Ok(mut tokens) = ethers::abi::decode(&[ethers::abi::ParamType::String], raw) {
        if let Some(AbiToken::String(s)) = tokens.pop() {
            return Some(s);
        }
    }
    if raw.len() == 32 {
        let end = raw.iter().position(|b| *b == 0).unwrap_or(32);
        return std::str::from_utf8(&raw[..end]).ok().map(str::to_string);
    }
    None
}

pub mod erc20 {
    use super::*;

    pub async fn balance_of<C>(client: &C, token: Address, owner: Address) -> Result<U256>
    where
        C: ChainClient + ?Sized,
    {
        let out = read(
            client,
            token,
            "balanceOf(address) view returns (uint256)",
            &[AbiToken::Address(owner)],
        )
        .await?;
        uint_at(out, "balanceOf")
    }

    pub async fn total_supply<C>(client: &C, token: Address) -> Result<U256>
    where
        C: ChainClient + ?Sized,
    {
        let out = read(client, token, "totalSupply() view returns (uint256)", &[]).await?;
        uint_at(out, "totalSupply")
    }

    pub async fn decimals<C>(client: &C, token: Address) -> Result<u8>
    where
        C: ChainClient + ?Sized,
    {
        let out = read(client, token, "decimals() view returns (uint8)", &[]).await?;
        decimals_from_word(uint_at(out, "decimals")?)
    }

    /// A palavra inteira é validada antes da conversão
    pub(crate) fn decimals_from_word(value: U256) -> Result<u8> {
        if value > U256::from(u8::MAX) {
            return Err(SimulationError::Abi(format!(
                "decimals fora do intervalo: {}",
                value
            )));
        }
        Ok(value.low_u32() as u8)
    }

    async fn text<C>(client: &C, token: Address, signature: &str) -> Result<Option<String>>
    where
        C: ChainClient + ?Sized,
    {
        let data = function(signature)?.encode_input(&[])?;
        let raw = client.call(&build_tx(None, Some(token), data, None, None)).await?;
        Ok(decode_text(&raw))
    }

    /// Resolve a identidade de um token a partir do contrato
    pub async fn resolve<C>(client: &C, token: Address) -> Result<Token>
    where
        C: ChainClient + ?Sized,
    {
        let decimals = decimals(client, token).await?;
        let symbol = text(client, token, "symbol() view returns (string)")
            .await
            .ok()
            .flatten()
            .unwrap_or_default();
        let name = text(client, token, "name() view returns (string)")
            .await
            .ok()
            .flatten();
        Ok(Token { address: token, symbol, name, decimals })
    }

    pub async fn allowance<C>(
        client: &C,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256>
    where
        C: ChainClient + ?Sized,
    {
        let out = read(
            client,
            token,
            "allowance(address,address) view returns (uint256)",
            &[AbiToken::Address(owner), AbiToken::Address(spender)],
        )
        .await?;
        uint_at(out, "allowance")
    }

    pub async fn approve<C>(
        client: &C,
        opts: TxOpts,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        write(
            client,
            opts,
            token,
            "approve(address,uint256) returns (bool)",
            &[AbiToken::Address(spender), AbiToken::Uint(amount)],
        )
        .await
    }

    pub async fn transfer<C>(
        client: &C,
        opts: TxOpts,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        write(
            client,
            opts,
            token,
            "transfer(address,uint256) returns (bool)",
            &[AbiToken::Address(to), AbiToken::Uint(amount)],
        )
        .await
    }
}

pub mod weth {
    use super::*;

    /// Embrulha `amount` do ativo nativo
    pub async fn deposit<C>(
        client: &C,
        opts: TxOpts,
        weth: Address,
        amount: U256,
    ) -> Result<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        write(client, opts.value(amount), weth, "deposit()", &[]).await
    }
}

pub mod factory {
    use super::*;

    pub async fn get_pair<C>(
        client: &C,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address>
    where
        C: ChainClient + ?Sized,
    {
        let out = read(
            client,
            factory,
            "getPair(address,address) view returns (address)",
            &[AbiToken::Address(token_a), AbiToken::Address(token_b)],
        )
        .await?;
        address_at(out, "getPair")
    }
}

pub mod router {
    use super::*;

    pub fn path_token(path: &[Address]) -> AbiToken {
        AbiToken::Array(path.iter().copied().map(AbiToken::Address).collect())
    }

    /// Saída cotada pelo roteador para o último elemento do caminho
    pub async fn get_amounts_out<C>(
        client: &C,
        router: Address,
        amount_in: U256,
        path: &[Address],
    ) -> Result<U256>
    where
        C: ChainClient + ?Sized,
    {
        let out = read(
            client,
            router,
            "getAmountsOut(uint256,address[]) view returns (uint256[])",
            &[AbiToken::Uint(amount_in), path_token(path)],
        )
        .await?;
        out.into_iter()
            .next()
            .and_then(AbiToken::into_array)
            .and_then(|amounts| amounts.into_iter().last())
            .and_then(AbiToken::into_uint)
            .ok_or_else(|| SimulationError::Abi("getAmountsOut sem retorno".into()))
    }

    pub async fn swap_exact_tokens_for_tokens<C>(
        client: &C,
        opts: TxOpts,
        router: Address,
        amount_in: U256,
        path: &[Address],
        to: Address,
        deadline: U256,
    ) -> Result<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        write(
            client,
            opts,
            router,
            "swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)",
            &[
                AbiToken::Uint(amount_in),
                AbiToken::Uint(U256::zero()),
                path_token(path),
                AbiToken::Address(to),
                AbiToken::Uint(deadline),
            ],
        )
        .await
    }

    pub async fn add_liquidity_eth<C>(
        client: &C,
        opts: TxOpts,
        router: Address,
        token: Address,
        amount: U256,
        to: Address,
        deadline: U256,
    ) -> Result<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        write(
            client,
            opts,
            router,
            "addLiquidityETH(address,uint256,uint256,uint256,address,uint256) payable returns (uint256,uint256,uint256)",
            &[
                AbiToken::Address(token),
                AbiToken::Uint(amount),
                AbiToken::Uint(U256::zero()),
                AbiToken::Uint(U256::zero()),
                AbiToken::Address(to),
                AbiToken::Uint(deadline),
            ],
        )
        .await
    }
}

pub mod transit {
    use super::*;

    /// Implanta o roteador de trânsito com construtor `(factory, wrappedNative)`
    pub async fn deploy<C>(
        client: &C,
        opts: TxOpts,
        creation_code: &Bytes,
        factory: Address,
        wrapped_native: Address,
    ) -> Result<Address>
    where
        C: ChainClient + ?Sized,
    {
        let mut data = creation_code.to_vec();
        data.extend(ethers::abi::encode(&[
            AbiToken::Address(factory),
            AbiToken::Address(wrapped_native),
        ]));
        let receipt = client
            .send_transaction(&build_tx(Some(opts.from), None, data, opts.value, opts.gas))
            .await?;
        receipt
            .contract_address
            .ok_or_else(|| SimulationError::Abi("deploy sem endereço de contrato".into()))
    }

    pub async fn buy<C>(
        client: &C,
        opts: TxOpts,
        router: Address,
        path: &[Address],
        pair: Address,
    ) -> Result<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        write(
            client,
            opts,
            router,
            "buy(address[],address) payable",
            &[super::router::path_token(path), AbiToken::Address(pair)],
        )
        .await
    }

    pub async fn sell<C>(
        client: &C,
        opts: TxOpts,
        router: Address,
        path: &[Address],
        pair: Address,
        amount: U256,
    ) -> Result<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        write(
            client,
            opts,
            router,
            "sell(address[],address,uint256)",
            &[
                super::router::path_token(path),
                AbiToken::Address(pair),
                AbiToken::Uint(amount),
            ],
        )
        .await
    }

    pub async fn transfer_check<C>(
        client: &C,
        opts: TxOpts,
        router: Address,
        token: Address,
        transit: Address,
    ) -> Result<TransactionReceipt>
    where
        C: ChainClient + ?Sized,
    {
        write(
            client,
            opts,
            router,
            "transitTransferCheck(address,address)",
            &[AbiToken::Address(token), AbiToken::Address(transit)],
        )
        .await
    }
}
