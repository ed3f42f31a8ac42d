//! Contract names, pool variants and call encoding.

use alloy::{sol, sol_types::SolCall};
use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes},
};

use crate::ConfigError;

/// Artifact name of the upgradeable proxy placed in front of the token.
pub const PROXY_CONTRACT_NAME: &str = "ERC1967Proxy";

sol! {
    function initialize(address defaultAdmin);
    function grantMintAndBurnRoles(address burnAndMinter);
}

/// Token implementations that can be deployed behind the proxy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum TokenContract {
    #[default]
    AstarToken,
    ShibuyaToken,
}

/// Token pool artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum TokenPoolContract {
    BurnMintTokenPool,
    LockReleaseTokenPool,
}

/// The kind of token pool to deploy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum PoolType {
    #[default]
    BurnMint,
    LockRelease,
}

impl PoolType {
    /// Parse a pool type as given on the command line.
    pub fn parse(pool_type: &str) -> Result<Self, ConfigError> {
        pool_type
            .parse()
            .map_err(|_| ConfigError::InvalidPoolType {
                pool_type: pool_type.to_string(),
            })
    }

    pub fn contract(&self) -> TokenPoolContract {
        match self {
            PoolType::BurnMint => TokenPoolContract::BurnMintTokenPool,
            PoolType::LockRelease => TokenPoolContract::LockReleaseTokenPool,
        }
    }

    /// Name used in logs and verification messages, e.g. `burnMintTokenPool`.
    pub fn display_name(&self) -> String {
        format!("{self}TokenPool")
    }
}

/// A pool variant together with the settings only that variant takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolConfig {
    BurnMint,
    LockRelease { accept_liquidity: bool },
}

impl PoolConfig {
    /// Build the pool settings. The liquidity flag is only read for lock/release pools and
    /// defaults to `false`.
    pub fn new(pool_type: PoolType, accept_liquidity: Option<bool>) -> Self {
        match pool_type {
            PoolType::BurnMint => PoolConfig::BurnMint,
            PoolType::LockRelease => PoolConfig::LockRelease {
                accept_liquidity: accept_liquidity.unwrap_or(false),
            },
        }
    }

    pub fn pool_type(&self) -> PoolType {
        match self {
            PoolConfig::BurnMint => PoolType::BurnMint,
            PoolConfig::LockRelease { .. } => PoolType::LockRelease,
        }
    }

    /// Whether the pool has to be granted the mint and burn roles on the token.
    pub fn needs_mint_and_burn_roles(&self) -> bool {
        matches!(self, PoolConfig::BurnMint)
    }

    /// Pool constructor arguments. The allowlist is always empty.
    pub fn constructor_args(
        &self,
        token: Address,
        rmn_proxy: Address,
        router: Address,
    ) -> Vec<DynSolValue> {
        let allowlist = DynSolValue::Array(vec![]);

        match *self {
            PoolConfig::BurnMint => vec![
                DynSolValue::Address(token),
                allowlist,
                DynSolValue::Address(rmn_proxy),
                DynSolValue::Address(router),
            ],
            PoolConfig::LockRelease { accept_liquidity } => vec![
                DynSolValue::Address(token),
                allowlist,
                DynSolValue::Address(rmn_proxy),
                DynSolValue::Bool(accept_liquidity),
                DynSolValue::Address(router),
            ],
        }
    }
}

/// Calldata for the token's `initialize(address)` initializer.
pub fn encode_initialize(default_admin: Address) -> Bytes {
    initializeCall {
        defaultAdmin: default_admin,
    }
    .abi_encode()
    .into()
}

/// Calldata for `grantMintAndBurnRoles(address)` on the token.
pub fn encode_grant_mint_and_burn_roles(burn_and_minter: Address) -> Bytes {
    grantMintAndBurnRolesCall {
        burnAndMinter: burn_and_minter,
    }
    .abi_encode()
    .into()
}

/// ABI-encode constructor arguments, as appended to creation bytecode.
pub fn encode_constructor_args(args: &[DynSolValue]) -> Vec<u8> {
    if args.is_empty() {
        return Vec::new();
    }

    DynSolValue::Tuple(args.to_vec()).abi_encode_params()
}
