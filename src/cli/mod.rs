//! Command-line interface handlers

pub mod commands;

pub use commands::{
    cmd_balance, cmd_cancel, cmd_keygen, cmd_payload_fee, cmd_send, cmd_verify, load_transaction,
    load_utxos, parse_key_pairs, CliResult,
};
