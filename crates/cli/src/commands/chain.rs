use keel_core::{
    provider::{ChainProvider, LogFilter, ResilientProvider},
    utils::BlockId,
};
use std::time::Duration;

use super::utils::{print_info, print_json, CliError, CliResult};

pub async fn height(provider: &ResilientProvider) -> CliResult<()> {
    let height = provider.block_number().await?;
    println!("{height}");
    Ok(())
}

pub async fn block(provider: &ResilientProvider, id: &str, full: bool) -> CliResult<()> {
    let id: BlockId = id.parse().map_err(|e| CliError::General(format!("{e}")))?;
    let block = provider.block(id, full).await?;
    print_json(&block)
}

pub async fn logs(
    provider: &ResilientProvider,
    from: &str,
    to: &str,
    addresses: Vec<String>,
) -> CliResult<()> {
    let from: BlockId = from.parse().map_err(|e| CliError::General(format!("{e}")))?;
    let to: BlockId = to.parse().map_err(|e| CliError::General(format!("{e}")))?;

    let filter = addresses.into_iter().fold(LogFilter::range(from, to), LogFilter::address);
    let logs = provider.logs(&filter).await?;

    print_info(&format!("{} logs", logs.len()));
    print_json(&logs)
}

pub async fn receipt(
    provider: &ResilientProvider,
    hash: &str,
    confirmations: Option<u64>,
    timeout: Duration,
) -> CliResult<()> {
    let receipt = match confirmations {
        Some(confirmations) => provider.wait_for_confirmation(hash, confirmations, timeout).await?,
        None => provider.receipt(hash).await?,
    };
    print_json(&receipt)
}
