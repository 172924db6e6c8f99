//! Backend em memória para os testes de integração.
//!
//! Modela um token ERC20 (simples ou de reflexão, com impostos e reverts
//! configuráveis), WETH, factory, um par Uniswap V2, o roteador público e o
//! roteador de trânsito. Cada transação roda sobre uma cópia do estado, que
//! só é confirmada quando não há revert.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Token as AbiToken;
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, Log, TransactionReceipt, H256, U256,
    U64,
};
use ethers::utils::keccak256;
use honeypot_core::NetworkProfile;
use honeypot_simulate::contracts::function;
use honeypot_simulate::reflection::reflection_rate;
use honeypot_simulate::slots::mapping_slot;
use honeypot_simulate::swap::{TRANSIT_BALANCE_TOPIC, TRANSIT_SWAP_TOPIC};
use honeypot_simulate::{
    ChainClient, ExecutionTrace, Result, SandboxBackend, SandboxProvider, SimulationError,
};
use parking_lot::Mutex;
use serde_json::json;

pub const WETH: Address = addr(0xc0);
pub const FACTORY: Address = addr(0xfa);
pub const ROUTER: Address = addr(0x70);
pub const TOKEN: Address = addr(0x7e);
pub const PAIR: Address = addr(0x9a);
pub const MAIN: Address = addr(0xa1);
pub const TRANSIT: Address = addr(0xb2);
pub const TRANSIT_ROUTER: Address = addr(0xee);
pub const DEAD: Address = addr(0xdead);
/// Ativo de cotação intermediário; o hop por ele é neutro (1:1)
pub const USD: Address = addr(0x5d);

/// Dono do token gravado no slot 1
pub const OWNER: Address = ethers::types::H160([0x5a; 20]);

/// Slot do mapping de saldos de um token simples
pub const PLAIN_BALANCE_SLOT: u64 = 0;
/// Slot de `_isExcluded` em um token de reflexão
pub const EXCLUDED_SLOT: u64 = 4;
/// Slot de `_rOwned` em um token de reflexão
pub const R_OWNED_SLOT: u64 = 3;

pub const GAS_USED: u64 = 100_000;
pub const GAS_PRICE: u64 = 1_000_000_000;

const fn addr(low: u64) -> Address {
    let mut bytes = [0u8; 20];
    let be = low.to_be_bytes();
    let mut i = 0;
    while i < 8 {
        bytes[12 + i] = be[i];
        i += 1;
    }
    ethers::types::H160(bytes)
}

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn profile() -> NetworkProfile {
    NetworkProfile {
        name: "fakenet".into(),
        chain_id: 1337,
        rpc: "http://fake.invalid".into(),
        wrapped_native: WETH,
        router: ROUTER,
        factory: FACTORY,
        burn_addresses: vec![DEAD],
        lockers: Default::default(),
    }
}

/// Comportamento do token simulado
#[derive(Debug, Clone)]
pub struct TokenSetup {
    pub decimals: u8,
    /// Valor devolvido por `totalSupply()`
    pub total_supply: U256,
    pub buy_tax_pct: u64,
    pub sell_tax_pct: u64,
    /// Motivo do revert em qualquer venda de carteira para o par
    pub sell_revert: Option<String>,
    /// Motivo do revert em transferências entre carteiras
    pub transfer_revert: Option<String>,
    pub reflection: bool,
    /// Liquidez inicial (tokens inteiros, ether) quando há par
    pub liquidity: Option<(u64, u64)>,
    /// Saldo inicial do sentinela, em tokens inteiros
    pub dead_balance: u64,
}

impl TokenSetup {
    pub fn standard() -> Self {
        Self {
            decimals: 18,
            total_supply: ether(2_000_000),
            buy_tax_pct: 0,
            sell_tax_pct: 0,
            sell_revert: None,
            transfer_revert: None,
            reflection: false,
            liquidity: Some((1_000_000, 100)),
            dead_balance: 500_000,
        }
    }

    fn unit(&self) -> U256 {
        U256::exp10(self.decimals as usize)
    }

    fn balance_slot(&self) -> u64 {
        if self.reflection {
            R_OWNED_SLOT
        } else {
            PLAIN_BALANCE_SLOT
        }
    }

    /// Bytecode com as constantes de slot na ordem em que o contrato as usa
    fn code(&self) -> Vec<u8> {
        let mut code = if self.reflection {
            vec![0x60, EXCLUDED_SLOT as u8, 0x60, R_OWNED_SLOT as u8, 0x60, 0x01]
        } else {
            vec![0x60, PLAIN_BALANCE_SLOT as u8, 0x60, 0x01, 0x60, 0x02]
        };
        code.push(0x63);
        code.extend_from_slice(&function("balanceOf(address)").map(|f| f.short_signature()).unwrap_or_default());
        code.push(0x00);
        code
    }
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    raw: HashMap<Address, U256>,
    allowance: HashMap<(Address, Address), U256>,
}

impl Ledger {
    fn get(&self, owner: Address) -> U256 {
        self.raw.get(&owner).copied().unwrap_or_default()
    }

    fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowance.insert((owner, spender), amount);
    }

    fn spend(&mut self, owner: Address, spender: Address, amount: U256) -> std::result::Result<(), String> {
        let current = self.allowance.get(&(owner, spender)).copied().unwrap_or_default();
        if current < amount {
            return Err("TransferHelper: TRANSFER_FROM_FAILED".into());
        }
        if current != U256::MAX {
            self.allowance.insert((owner, spender), current - amount);
        }
        Ok(())
    }

    fn debit(&mut self, owner: Address, amount: U256) -> std::result::Result<(), String> {
        let current = self.get(owner);
        if current < amount {
            return Err("ds-math-sub-underflow".into());
        }
        self.raw.insert(owner, current - amount);
        Ok(())
    }

    fn credit(&mut self, owner: Address, amount: U256) {
        let current = self.get(owner);
        self.raw.insert(owner, current + amount);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Buy,
    Sell,
    Transfer,
    Plain,
}

fn kind(from: Address, to: Address) -> Kind {
    if from == PAIR {
        Kind::Buy
    } else if to == PAIR && from != DEAD {
        Kind::Sell
    } else if from == DEAD || to == DEAD {
        Kind::Plain
    } else {
        Kind::Transfer
    }
}

#[derive(Debug, Default)]
struct Ctx {
    logs: Vec<Log>,
    sloads: Vec<H256>,
    created: Option<Address>,
}

#[derive(Debug, Clone)]
struct State {
    setup: TokenSetup,
    token: Ledger,
    weth: Ledger,
    native: HashMap<Address, U256>,
    pair_exists: bool,
    transit_router: Option<Address>,
    storage: HashMap<H256, H256>,
    swap_routes: Vec<Vec<Address>>,
}

type Revert = std::result::Result<Vec<u8>, String>;

/// Remove o hop neutro por `USD`
fn direct(route: &[Address]) -> Vec<Address> {
    route.iter().copied().filter(|a| *a != USD).collect()
}

fn args(data: &[u8], signature: &str) -> Option<Vec<AbiToken>> {
    let f = function(signature).ok()?;
    if data.len() >= 4 && data[..4] == f.short_signature() {
        f.decode_input(&data[4..]).ok()
    } else {
        None
    }
}

fn uint(tokens: &[AbiToken], i: usize) -> U256 {
    tokens[i].clone().into_uint().unwrap_or_default()
}

fn address(tokens: &[AbiToken], i: usize) -> Address {
    tokens[i].clone().into_address().unwrap_or_default()
}

fn path(tokens: &[AbiToken], i: usize) -> Vec<Address> {
    tokens[i]
        .clone()
        .into_array()
        .unwrap_or_default()
        .into_iter()
        .filter_map(AbiToken::into_address)
        .collect()
}

fn word(value: U256) -> Vec<u8> {
    ethers::abi::encode(&[AbiToken::Uint(value)])
}

fn yes() -> Vec<u8> {
    ethers::abi::encode(&[AbiToken::Bool(true)])
}

fn amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    let with_fee = amount_in * 997;
    with_fee * reserve_out / (reserve_in * 1000 + with_fee)
}

fn pair_swap_topic() -> H256 {
    H256(keccak256("Swap(address,uint256,uint256,uint256,uint256,address)"))
}

impl State {
    fn new(setup: TokenSetup) -> Self {
        let mut state = Self {
            token: Ledger::default(),
            weth: Ledger::default(),
            native: HashMap::new(),
            pair_exists: false,
            transit_router: None,
            storage: HashMap::new(),
            swap_routes: Vec::new(),
            setup,
        };
        for account in [MAIN, TRANSIT, DEAD] {
            state.native.insert(account, ether(10_000));
        }
        state
            .storage
            .insert(H256::from_low_u64_be(1), H256::from(OWNER));
        let unit = state.setup.unit();
        if state.setup.dead_balance > 0 {
            let raw = state.to_raw(U256::from(state.setup.dead_balance) * unit);
            state.token.credit(DEAD, raw);
        }
        if let Some((tokens, native)) = state.setup.liquidity {
            let raw = state.to_raw(U256::from(tokens) * unit);
            state.token.credit(PAIR, raw);
            state.weth.credit(PAIR, ether(native));
            state.pair_exists = true;
        }
        state
    }

    fn rate(&self) -> Option<U256> {
        if self.setup.reflection {
            reflection_rate(self.setup.total_supply).ok()
        } else {
            None
        }
    }

    fn to_raw(&self, amount: U256) -> U256 {
        match self.rate() {
            Some(rate) => amount * rate,
            None => amount,
        }
    }

    fn balance(&self, owner: Address) -> U256 {
        let raw = self.token.get(owner);
        match self.rate() {
            Some(rate) => raw / rate,
            None => raw,
        }
    }

    fn balance_key(&self, owner: Address) -> H256 {
        mapping_slot(owner, H256::from_low_u64_be(self.setup.balance_slot()))
    }

    fn known_accounts() -> [Address; 7] {
        [DEAD, MAIN, TRANSIT, PAIR, ROUTER, TRANSIT_ROUTER, TOKEN]
    }

    fn read_storage(&self, slot: H256) -> H256 {
        for account in Self::known_accounts() {
            if self.balance_key(account) == slot {
                let mut out = [0u8; 32];
                self.token.get(account).to_big_endian(&mut out);
                return H256(out);
            }
        }
        if slot == H256::from_low_u64_be(2) {
            let mut out = [0u8; 32];
            self.setup.total_supply.to_big_endian(&mut out);
            return H256(out);
        }
        self.storage.get(&slot).copied().unwrap_or_default()
    }

    fn write_storage(&mut self, slot: H256, value: U256) {
        for account in Self::known_accounts() {
            if self.balance_key(account) == slot {
                self.token.raw.insert(account, value);
                return;
            }
        }
        let mut out = [0u8; 32];
        value.to_big_endian(&mut out);
        self.storage.insert(slot, H256(out));
    }

    fn record_balance_read(&self, ctx: &mut Ctx, owner: Address) {
        if self.setup.reflection {
            ctx.sloads
                .push(mapping_slot(owner, H256::from_low_u64_be(EXCLUDED_SLOT)));
        }
        ctx.sloads.push(self.balance_key(owner));
        ctx.sloads.push(H256::from_low_u64_be(9));
    }

    /// Move tokens aplicando imposto ou revert conforme o tipo de transferência
    fn move_token(&mut self, from: Address, to: Address, amount: U256) -> std::result::Result<U256, String> {
        let kind = kind(from, to);
        if kind == Kind::Sell {
            if let Some(reason) = &self.setup.sell_revert {
                return Err(reason.clone());
            }
        }
        if kind == Kind::Transfer {
            if let Some(reason) = &self.setup.transfer_revert {
                return Err(reason.clone());
            }
        }
        if self.balance(from) < amount {
            return Err("ERC20: transfer amount exceeds balance".into());
        }
        let pct = match kind {
            Kind::Buy => self.setup.buy_tax_pct,
            Kind::Sell => self.setup.sell_tax_pct,
            _ => 0,
        };
        let fee = amount * pct / 100;
        let received = amount - fee;
        let (raw_amount, raw_received, raw_fee) =
            (self.to_raw(amount), self.to_raw(received), self.to_raw(fee));
        self.token.debit(from, raw_amount)?;
        self.token.credit(to, raw_received);
        if !fee.is_zero() {
            self.token.credit(TOKEN, raw_fee);
        }
        Ok(received)
    }

    fn pair_log(&self, ctx: &mut Ctx, to: Address, token_out: U256, weth_out: U256) {
        // token0 é o menor endereço
        let (out0, out1) = if TOKEN < WETH {
            (token_out, weth_out)
        } else {
            (weth_out, token_out)
        };
        ctx.logs.push(Log {
            address: PAIR,
            topics: vec![pair_swap_topic(), H256::from(ROUTER), H256::from(to)],
            data: Bytes::from(ethers::abi::encode(&[
                AbiToken::Uint(U256::zero()),
                AbiToken::Uint(U256::zero()),
                AbiToken::Uint(out0),
                AbiToken::Uint(out1),
            ])),
            ..Default::default()
        });
    }

    fn reserves(&self) -> std::result::Result<(U256, U256), String> {
        if !self.pair_exists {
            return Err("UniswapV2Library: INSUFFICIENT_LIQUIDITY".into());
        }
        Ok((self.balance(PAIR), self.weth.get(PAIR)))
    }

    fn quote(&self, amount: U256, route: &[Address]) -> std::result::Result<U256, String> {
        let (token_reserve, weth_reserve) = self.reserves()?;
        match direct(route).as_slice() {
            [a, b] if *a == WETH && *b == TOKEN => Ok(amount_out(amount, weth_reserve, token_reserve)),
            [a, b] if *a == TOKEN && *b == WETH => Ok(amount_out(amount, token_reserve, weth_reserve)),
            _ => Err("UniswapV2Library: INVALID_PATH".into()),
        }
    }

    fn pay_native(&mut self, from: Address, value: U256) -> std::result::Result<(), String> {
        let current = self.native.get(&from).copied().unwrap_or_default();
        if current < value {
            return Err("insufficient funds for gas * price + value".into());
        }
        self.native.insert(from, current - value);
        Ok(())
    }

    fn dispatch(&mut self, ctx: &mut Ctx, from: Address, to: Address, value: U256, data: &[u8]) -> Revert {
        match to {
            t if t == TOKEN => self.token_call(ctx, from, data),
            t if t == WETH => self.weth_call(from, value, data),
            t if t == USD => Self::usd_call(data),
            t if t == FACTORY => {
                let a = args(data, "getPair(address,address)").ok_or_else(String::new)?;
                let pair_of = [address(&a, 0), address(&a, 1)];
                let found = self.pair_exists && pair_of.contains(&TOKEN) && pair_of.contains(&WETH);
                Ok(ethers::abi::encode(&[AbiToken::Address(if found { PAIR } else { Address::zero() })]))
            }
            t if t == ROUTER => self.router_call(ctx, from, value, data),
            t if Some(t) == self.transit_router => self.transit_call(ctx, from, value, data),
            _ => Err(String::new()),
        }
    }

    fn token_call(&mut self, ctx: &mut Ctx, from: Address, data: &[u8]) -> Revert {
        if args(data, "name()").is_some() {
            return Ok(ethers::abi::encode(&[AbiToken::String("Fake Token".into())]));
        }
        if args(data, "symbol()").is_some() {
            return Ok(ethers::abi::encode(&[AbiToken::String("FAKE".into())]));
        }
        if args(data, "decimals()").is_some() {
            return Ok(word(U256::from(self.setup.decimals)));
        }
        if args(data, "totalSupply()").is_some() {
            return Ok(word(self.setup.total_supply));
        }
        if let Some(a) = args(data, "balanceOf(address)") {
            let owner = address(&a, 0);
            self.record_balance_read(ctx, owner);
            return Ok(word(self.balance(owner)));
        }
        if let Some(a) = args(data, "allowance(address,address)") {
            let key = (address(&a, 0), address(&a, 1));
            return Ok(word(self.token.allowance.get(&key).copied().unwrap_or_default()));
        }
        if let Some(a) = args(data, "approve(address,uint256)") {
            self.token.approve(from, address(&a, 0), uint(&a, 1));
            return Ok(yes());
        }
        if let Some(a) = args(data, "transfer(address,uint256)") {
            self.move_token(from, address(&a, 0), uint(&a, 1))?;
            return Ok(yes());
        }
        Err(String::new())
    }

    fn usd_call(data: &[u8]) -> Revert {
        if args(data, "name()").is_some() {
            return Ok(ethers::abi::encode(&[AbiToken::String("USD Coin".into())]));
        }
        if args(data, "symbol()").is_some() {
            return Ok(ethers::abi::encode(&[AbiToken::String("USD".into())]));
        }
        if args(data, "decimals()").is_some() {
            return Ok(word(U256::from(18u64)));
        }
        if args(data, "allowance(address,address)").is_some() {
            return Ok(word(U256::zero()));
        }
        if args(data, "approve(address,uint256)").is_some() {
            return Ok(yes());
        }
        Err(String::new())
    }

    fn weth_call(&mut self, from: Address, value: U256, data: &[u8]) -> Revert {
        if args(data, "name()").is_some() {
            return Ok(ethers::abi::encode(&[AbiToken::String("Wrapped Ether".into())]));
        }
        if args(data, "symbol()").is_some() {
            return Ok(ethers::abi::encode(&[AbiToken::String("WETH".into())]));
        }
        if args(data, "decimals()").is_some() {
            return Ok(word(U256::from(18u64)));
        }
        if args(data, "deposit()").is_some() {
            self.pay_native(from, value)?;
            self.weth.credit(from, value);
            return Ok(Vec::new());
        }
        if let Some(a) = args(data, "balanceOf(address)") {
            return Ok(word(self.weth.get(address(&a, 0))));
        }
        if let Some(a) = args(data, "allowance(address,address)") {
            let key = (address(&a, 0), address(&a, 1));
            return Ok(word(self.weth.allowance.get(&key).copied().unwrap_or_default()));
        }
        if let Some(a) = args(data, "approve(address,uint256)") {
            self.weth.approve(from, address(&a, 0), uint(&a, 1));
            return Ok(yes());
        }
        Err(String::new())
    }

    fn router_call(&mut self, ctx: &mut Ctx, from: Address, value: U256, data: &[u8]) -> Revert {
        if let Some(a) = args(data, "getAmountsOut(uint256,address[])") {
            let amount = uint(&a, 0);
            let out = self.quote(amount, &path(&a, 1))?;
            return Ok(ethers::abi::encode(&[AbiToken::Array(vec![
                AbiToken::Uint(amount),
                AbiToken::Uint(out),
            ])]));
        }
        if let Some(a) = args(
            data,
            "swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)",
        ) {
            let amount = uint(&a, 0);
            let route = path(&a, 2);
            let to = address(&a, 3);
            let (token_reserve, weth_reserve) = self.reserves()?;
            self.swap_routes.push(route.clone());
            let route = direct(&route);
            if route == [WETH, TOKEN] {
                self.weth.spend(from, ROUTER, amount)?;
                self.weth.debit(from, amount)?;
                self.weth.credit(PAIR, amount);
                let out = amount_out(amount, weth_reserve, token_reserve);
                self.move_token(PAIR, to, out)?;
                self.pair_log(ctx, to, out, U256::zero());
            } else if route == [TOKEN, WETH] {
                self.token.spend(from, ROUTER, amount)?;
                self.move_token(from, PAIR, amount)?;
                let received = self.balance(PAIR) - token_reserve;
                let out = amount_out(received, token_reserve, weth_reserve);
                self.weth.debit(PAIR, out)?;
                self.weth.credit(to, out);
                self.pair_log(ctx, to, U256::zero(), out);
            } else {
                return Err("UniswapV2Library: INVALID_PATH".into());
            }
            return Ok(Vec::new());
        }
        if let Some(a) = args(
            data,
            "addLiquidityETH(address,uint256,uint256,uint256,address,uint256)",
        ) {
            if address(&a, 0) != TOKEN {
                return Err(String::new());
            }
            let amount = uint(&a, 1);
            self.token.spend(from, ROUTER, amount)?;
            self.pay_native(from, value)?;
            self.pair_exists = true;
            self.move_token(from, PAIR, amount)?;
            self.weth.credit(PAIR, value);
            return Ok(ethers::abi::encode(&[
                AbiToken::Uint(amount),
                AbiToken::Uint(value),
                AbiToken::Uint(value),
            ]));
        }
        Err(String::new())
    }

    fn router_logs(ctx: &mut Ctx, calculated: U256, output: U256, before: U256, after: U256) {
        for (topic, a, b) in [
            (*TRANSIT_SWAP_TOPIC, calculated, output),
            (*TRANSIT_BALANCE_TOPIC, before, after),
        ] {
            ctx.logs.push(Log {
                address: TRANSIT_ROUTER,
                topics: vec![topic],
                data: Bytes::from(ethers::abi::encode(&[AbiToken::Uint(a), AbiToken::Uint(b)])),
                ..Default::default()
            });
        }
    }

    fn transit_call(&mut self, ctx: &mut Ctx, from: Address, value: U256, data: &[u8]) -> Revert {
        if args(data, "buy(address[],address)").is_some() {
            let (token_reserve, weth_reserve) = self.reserves()?;
            self.pay_native(from, value)?;
            self.weth.credit(PAIR, value);
            let calculated = amount_out(value, weth_reserve, token_reserve);
            let before = self.balance(from);
            self.move_token(PAIR, from, calculated)?;
            let after = self.balance(from);
            Self::router_logs(ctx, calculated, after - before, before, after);
            return Ok(Vec::new());
        }
        if let Some(a) = args(data, "sell(address[],address,uint256)") {
            let amount = uint(&a, 2);
            let (token_reserve, weth_reserve) = self.reserves()?;
            self.token.spend(from, TRANSIT_ROUTER, amount)?;
            let calculated = amount_out(amount, token_reserve, weth_reserve);
            self.move_token(from, PAIR, amount)?;
            let received = self.balance(PAIR) - token_reserve;
            let output = amount_out(received, token_reserve, weth_reserve);
            self.weth.debit(PAIR, output)?;
            let before = self.native.get(&from).copied().unwrap_or_default();
            self.native.insert(from, before + output);
            Self::router_logs(ctx, calculated, output, before, before + output);
            return Ok(Vec::new());
        }
        if let Some(a) = args(data, "transitTransferCheck(address,address)") {
            let transit = address(&a, 1);
            let amount = self.balance(from);
            self.token.spend(from, TRANSIT_ROUTER, amount)?;
            let received = self.move_token(from, transit, amount)?;
            self.token.spend(transit, TRANSIT_ROUTER, received)?;
            self.move_token(transit, from, received)?;
            return Ok(Vec::new());
        }
        Err(String::new())
    }

    fn deploy(&mut self, ctx: &mut Ctx) -> Revert {
        if self.transit_router.is_some() {
            return Err("contract already deployed".into());
        }
        self.transit_router = Some(TRANSIT_ROUTER);
        ctx.created = Some(TRANSIT_ROUTER);
        Ok(Vec::new())
    }
}

#[derive(Debug)]
struct Inner {
    state: State,
    destroyed: bool,
    destroy_calls: usize,
    mine_calls: usize,
    mined_blocks: u64,
    unlocked: HashSet<Address>,
    unlock_calls: usize,
    lock_calls: usize,
    writes: Vec<(Address, H256, U256)>,
    traces: HashMap<H256, serde_json::Value>,
    sent: u64,
    panic_on_mine: Option<usize>,
}

/// Sandbox em memória compartilhável entre o teste e a simulação
#[derive(Debug, Clone)]
pub struct FakeChain {
    inner: Arc<Mutex<Inner>>,
}

impl FakeChain {
    pub fn new(setup: TokenSetup) -> Self {
        let mut unlocked = HashSet::new();
        unlocked.insert(DEAD);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: State::new(setup),
                destroyed: false,
                destroy_calls: 0,
                mine_calls: 0,
                mined_blocks: 0,
                unlocked,
                unlock_calls: 0,
                lock_calls: 0,
                writes: Vec::new(),
                traces: HashMap::new(),
                sent: 0,
                panic_on_mine: None,
            })),
        }
    }

    /// Faz a `n`-ésima chamada a `mine` entrar em pânico
    pub fn panic_on_mine(self, n: usize) -> Self {
        self.inner.lock().panic_on_mine = Some(n);
        self
    }

    pub fn destroy_calls(&self) -> usize {
        self.inner.lock().destroy_calls
    }

    pub fn mined_blocks(&self) -> u64 {
        self.inner.lock().mined_blocks
    }

    pub fn lock_calls(&self) -> usize {
        self.inner.lock().lock_calls
    }

    pub fn unlock_calls(&self) -> usize {
        self.inner.lock().unlock_calls
    }

    /// Caminhos recebidos pelo roteador em swaps confirmados
    pub fn swap_routes(&self) -> Vec<Vec<Address>> {
        self.inner.lock().state.swap_routes.clone()
    }

    pub fn storage_writes(&self) -> Vec<(Address, H256, U256)> {
        self.inner.lock().writes.clone()
    }

    pub fn has_pair(&self) -> bool {
        self.inner.lock().state.pair_exists
    }

    fn execute(&self, tx: &TypedTransaction, commit: bool) -> Result<(Vec<u8>, Ctx)> {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            return Err(SimulationError::SessionClosed);
        }
        let from = tx.from().copied().unwrap_or_default();
        let value = tx.value().copied().unwrap_or_default();
        let data = tx.data().map(|d| d.to_vec()).unwrap_or_default();

        let fail = |reason: String| {
            let message = if reason.is_empty() {
                "execution reverted".to_string()
            } else {
                format!("execution reverted: {}", reason)
            };
            if commit {
                SimulationError::SendTransaction(message)
            } else {
                SimulationError::Rpc(message)
            }
        };

        if commit && from == DEAD && !inner.unlocked.contains(&DEAD) {
            return Err(SimulationError::SendTransaction(
                "No Signer available for sender".into(),
            ));
        }

        let mut scratch = inner.state.clone();
        let mut ctx = Ctx::default();
        let out = match tx.to_addr() {
            Some(to) => scratch.dispatch(&mut ctx, from, *to, value, &data),
            None => scratch.deploy(&mut ctx),
        };
        match out {
            Ok(ret) => {
                if commit {
                    inner.state = scratch;
                }
                Ok((ret, ctx))
            }
            Err(reason) => Err(fail(reason)),
        }
    }
}

fn trace_json(keys: &[H256]) -> serde_json::Value {
    let mut steps = vec![json!({"pc": 0, "op": "PUSH1", "depth": 1})];
    let mut storage = serde_json::Map::new();
    for (i, key) in keys.iter().enumerate() {
        storage.insert(format!("{:x}", key), json!("0".repeat(64)));
        steps.push(json!({
            "pc": 10 + i,
            "op": "SLOAD",
            "depth": 1,
            "storage": storage.clone(),
        }));
    }
    steps.push(json!({"pc": 99, "op": "RETURN", "depth": 1, "storage": storage}));
    json!({"gas": GAS_USED, "failed": false, "returnValue": "", "structLogs": steps})
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        let (ret, _) = self.execute(tx, false)?;
        Ok(Bytes::from(ret))
    }

    async fn send_transaction(&self, tx: &TypedTransaction) -> Result<TransactionReceipt> {
        let (_, ctx) = self.execute(tx, true)?;
        let mut inner = self.inner.lock();
        inner.sent += 1;
        let hash = H256::from_low_u64_be(inner.sent);
        inner.traces.insert(hash, trace_json(&ctx.sloads));
        Ok(TransactionReceipt {
            transaction_hash: hash,
            status: Some(U64::one()),
            gas_used: Some(U256::from(GAS_USED)),
            effective_gas_price: Some(U256::from(GAS_PRICE)),
            contract_address: ctx.created,
            logs: ctx.logs,
            ..Default::default()
        })
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        let inner = self.inner.lock();
        if inner.destroyed {
            return Err(SimulationError::SessionClosed);
        }
        if address == TOKEN {
            Ok(Bytes::from(inner.state.setup.code()))
        } else {
            Ok(Bytes::default())
        }
    }

    async fn get_storage_at(&self, address: Address, slot: H256) -> Result<H256> {
        let inner = self.inner.lock();
        if inner.destroyed {
            return Err(SimulationError::SessionClosed);
        }
        if address == TOKEN {
            Ok(inner.state.read_storage(slot))
        } else {
            Ok(H256::zero())
        }
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        let inner = self.inner.lock();
        Ok(inner.state.native.get(&address).copied().unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<U256> {
        Ok(U256::from(GAS_PRICE))
    }
}

#[async_trait]
impl SandboxBackend for FakeChain {
    fn id(&self) -> String {
        "fake".into()
    }

    fn wallets(&self) -> (Address, Address) {
        (MAIN, TRANSIT)
    }

    fn sentinel(&self) -> Address {
        DEAD
    }

    async fn mine(&self, blocks: u64) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            return Err(SimulationError::SessionClosed);
        }
        inner.mine_calls += 1;
        if inner.panic_on_mine == Some(inner.mine_calls) {
            drop(inner);
            panic!("backend crashed while mining");
        }
        inner.mined_blocks += blocks;
        Ok(())
    }

    async fn set_storage(&self, address: Address, slot: H256, value: U256) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            return Err(SimulationError::SessionClosed);
        }
        inner.writes.push((address, slot, value));
        if address == TOKEN {
            inner.state.write_storage(slot, value);
        }
        Ok(())
    }

    async fn unlock_account(&self, address: Address) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.unlock_calls += 1;
        inner.unlocked.insert(address);
        Ok(())
    }

    async fn lock_account(&self, address: Address) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.lock_calls += 1;
        inner.unlocked.remove(&address);
        Ok(())
    }

    async fn trace_transaction(&self, tx_hash: H256) -> Result<ExecutionTrace> {
        let raw = self
            .inner
            .lock()
            .traces
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| SimulationError::Trace(format!("transação desconhecida {:?}", tx_hash)))?;
        ExecutionTrace::from_value(raw)
    }

    async fn destroy(&self) {
        let mut inner = self.inner.lock();
        inner.destroy_calls += 1;
        inner.destroyed = true;
    }
}

/// Provedor que entrega sempre o mesmo `FakeChain`
pub struct FakeProvider {
    pub chain: FakeChain,
    pub fail: bool,
}

#[async_trait]
impl SandboxProvider for FakeProvider {
    type Sandbox = FakeChain;

    async fn create_sandbox(&self, _profile: &NetworkProfile) -> Result<FakeChain> {
        if self.fail {
            return Err(SimulationError::AnvilSpawn("fork indisponível".into()));
        }
        Ok(self.chain.clone())
    }
}
