use std::sync::Arc;

use counter_dapp::{
    abi, Address, ChainReader, ContractBinding, CounterDisplay, MockChain, RpcClient, Session,
    TransactionSender,
};

use crate::{
    config::Settings,
    error::{CliError, Result},
    ui,
};

/// Where the in-memory chain deploys the counter when no address is given.
pub const SIMULATED_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
/// Account connected to the in-memory chain when none is given.
pub const SIMULATED_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

#[derive(Debug, Clone)]
enum Chain {
    Rpc(Arc<RpcClient>),
    Simulated(Arc<MockChain>),
}

/// A bound contract plus the chain and wallet session it talks to.
#[derive(Debug, Clone)]
pub struct Backend {
    pub binding: ContractBinding,
    pub session: Session,
    chain: Chain,
}

impl Backend {
    /// Connects without resolving a wallet account.
    pub fn read_only(settings: &Settings) -> Result<Self> {
        match settings.simulation {
            Some(initial) => {
                let binding = simulated_binding(settings)?;
                let chain = Arc::new(MockChain::new(&binding, initial));
                Ok(Self {
                    binding,
                    session: Session::new(),
                    chain: Chain::Simulated(chain),
                })
            }
            None => {
                let address = settings
                    .contract_address
                    .as_deref()
                    .ok_or(CliError::MissingSetting("contract_address"))?;
                let binding = ContractBinding::simple_contract_at(address)?;
                let client = RpcClient::new(&settings.rpc_url, settings.rpc)?;
                Ok(Self {
                    binding,
                    session: Session::new(),
                    chain: Chain::Rpc(Arc::new(client)),
                })
            }
        }
    }

    /// Connects and signs in the sending account.
    ///
    /// Without an explicit account the node's first unlocked account is
    /// used. The session stays disconnected when the node offers none.
    pub async fn with_wallet(settings: &Settings) -> Result<Self> {
        let backend = Self::read_only(settings)?;

        let account = match (&settings.account, &backend.chain) {
            (Some(text), _) => Some(parse_account(text)?),
            (None, Chain::Simulated(_)) => Some(parse_account(SIMULATED_ACCOUNT)?),
            (None, Chain::Rpc(client)) => client
                .accounts()
                .await
                .map_err(counter_dapp::Error::from)?
                .first()
                .copied(),
        };

        match account {
            Some(account) => {
                log::debug!("sending from {}", abi::format_address(&account));
                backend.session.connect(account);
            }
            None => ui::warn("node exposes no accounts; transactions will be refused"),
        }
        Ok(backend)
    }

    pub fn reader(&self) -> Arc<dyn ChainReader> {
        match &self.chain {
            Chain::Rpc(client) => client.clone(),
            Chain::Simulated(chain) => chain.clone(),
        }
    }

    pub fn sender(&self) -> Arc<dyn TransactionSender> {
        match &self.chain {
            Chain::Rpc(client) => client.clone(),
            Chain::Simulated(chain) => chain.clone(),
        }
    }

    pub fn mount_display(&self, settings: &Settings) -> Result<CounterDisplay> {
        let display = match &self.chain {
            Chain::Rpc(client) => {
                CounterDisplay::mount(&self.binding, client.clone(), &self.session, settings.read)
            }
            Chain::Simulated(chain) => {
                CounterDisplay::mount(&self.binding, chain.clone(), &self.session, settings.read)
            }
        }?;
        Ok(display)
    }

    /// Human-readable description of the endpoint.
    pub fn describe(&self) -> String {
        let contract = abi::format_address(&self.binding.address());
        match &self.chain {
            Chain::Rpc(client) => format!("{contract} via {}", client.url()),
            Chain::Simulated(_) => format!("{contract} on the in-memory chain"),
        }
    }
}

fn simulated_binding(settings: &Settings) -> Result<ContractBinding> {
    let address = settings
        .contract_address
        .as_deref()
        .unwrap_or(SIMULATED_CONTRACT);
    Ok(ContractBinding::simple_contract_at(address)?)
}

fn parse_account(text: &str) -> Result<Address> {
    abi::parse_address(text).map_err(|err| CliError::InvalidArgument {
        what: "account",
        input: text.to_string(),
        reason: err.to_string(),
    })
}
