use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use xabi_domain::ChainId;

/// Read from and write to any deployed EVM contract from its ABI.
#[derive(Debug, Parser)]
#[command(name = "xabi-engine", version, about)]
pub(crate) struct Cli {
    /// Custom config file (.toml), merged over config.toml
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// List known chains
    Chains,

    /// Manage RPC endpoints
    Endpoints {
        #[command(subcommand)]
        command: EndpointsCommand,
    },

    /// Inspect ABI documents
    Abi {
        #[command(subcommand)]
        command: AbiCommand,
    },

    /// Load, read from and write to a contract
    Contract {
        #[command(subcommand)]
        command: ContractCommand,
    },

    /// Signing agent account and balance
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },

    /// Saved contract projects
    Projects {
        #[command(subcommand)]
        command: ProjectsCommand,
    },

    /// Transactions broadcast from this installation
    Transactions {
        #[command(subcommand)]
        command: TransactionsCommand,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum EndpointsCommand {
    /// Default and custom endpoints of a chain, in probing order
    List {
        #[arg(long)]
        chain: Option<ChainId>,
    },
    /// Probe endpoints in order and report the selected one
    Select {
        #[arg(long)]
        chain: Option<ChainId>,
    },
    /// Probe a single URL
    Test { url: String },
    /// Add a custom endpoint after probing it
    Add {
        url: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        chain: Option<ChainId>,
        /// Make it the active endpoint of its chain
        #[arg(long)]
        active: bool,
    },
    /// Rename or re-point a custom endpoint
    Update {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        active: bool,
    },
    /// Remove a custom endpoint
    Remove { id: String },
    /// Make a custom endpoint the active one of its chain
    Use { id: String },
}

#[derive(Debug, Subcommand)]
pub(crate) enum AbiCommand {
    /// Partition the functions of an ABI file into read and write groups
    Classify { file: PathBuf },
}

/// Where a contract lives and how to reach it.
#[derive(Debug, Args)]
pub(crate) struct ContractTarget {
    pub address: String,

    #[arg(long)]
    pub chain: Option<ChainId>,

    /// ABI file; defaults to a saved project, then the verified source
    #[arg(long, value_name = "FILE")]
    pub abi: Option<PathBuf>,

    /// Use this RPC URL instead of selecting one
    #[arg(long, value_name = "URL")]
    pub rpc: Option<String>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ContractCommand {
    /// Classify the contract and run its automatic reads
    Load {
        #[command(flatten)]
        target: ContractTarget,
        /// Account for `balanceOf(address)`-style reads; defaults to the signing agent's
        #[arg(long)]
        account: Option<String>,
    },
    /// Call a read-only function
    Read {
        #[command(flatten)]
        target: ContractTarget,
        /// Function name or full signature, e.g. `balanceOf(address)`
        function: String,
        /// Arguments as `name=value`, or positional values in declared order
        arguments: Vec<String>,
    },
    /// Send a state-changing function through the signing agent
    Write {
        #[command(flatten)]
        target: ContractTarget,
        function: String,
        arguments: Vec<String>,
        /// Wei sent along with payable functions
        #[arg(long, value_name = "WEI")]
        value: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum WalletCommand {
    /// Connect to the signing agent, switching it to the chain if needed
    Connect {
        #[arg(long)]
        chain: Option<ChainId>,
    },
    /// Native balance of an account
    Balance {
        address: String,
        #[arg(long)]
        chain: Option<ChainId>,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum ProjectsCommand {
    List,
    /// Save a contract and its ABI, replacing any project for the same contract
    Save {
        address: String,
        #[arg(long)]
        chain: Option<ChainId>,
        /// ABI file; fetched from the verified source when omitted
        #[arg(long, value_name = "FILE")]
        abi: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub(crate) enum TransactionsCommand {
    List {
        #[arg(long)]
        chain: Option<ChainId>,
    },
}
