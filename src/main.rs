//! Atomic transfer runner.
//!
//! Runs an asset sale as one all-or-nothing group against a ledger node.
//!
//! # Flow
//!
//! ```text
//!   creator (ATOMIC_CREATOR_SEED)
//!      │
//!      ├─▶ fund buyer, fund artist            (single payments)
//!      ├─▶ create one-unit asset              (asset index from confirmation)
//!      │
//!      └─▶ atomic group, one params snapshot
//!            0. buyer   → creator   payment of the price
//!            1. buyer   → buyer     asset opt-in
//!            2. creator → buyer     one unit of the asset
//!            3. creator → artist    royalty share of the price
//!                 │
//!                 ▼
//!          assemble → sign → submit → await confirmation → report accounts
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;

use atomic_transfer::ledger::{
    assemble_group, percent_of, AssetParams, ConfirmationResult, ConfirmationWaiter,
    NetworkParams, SignedTransaction, Submitter, TransactionBuilder, Wallet,
};
use atomic_transfer::lifecycle::{signals::spawn_ctrl_c_handler, start, AppContext};
use atomic_transfer::resilience::{cancellable, RetryPolicy};

#[derive(Parser)]
#[command(name = "atomic-transfer")]
#[command(about = "Run an atomic asset sale against a ledger node", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rounds to wait for each confirmation.
    #[arg(long)]
    max_rounds: Option<u64>,
}

type RunResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> RunResult<()> {
    let cli = Cli::parse();
    let ctx = start(cli.config.as_deref())?;
    let _signals = spawn_ctrl_c_handler(ctx.shutdown.clone());

    let max_rounds = cli
        .max_rounds
        .unwrap_or(ctx.config.confirmation.max_rounds);
    let mut submitter = Submitter::new(ctx.client.clone(), RetryPolicy::from(&ctx.config.retries))
        .with_shutdown(ctx.shutdown.clone());
    if let Some(limit) = time_limit(&ctx) {
        submitter = submitter.with_timeout(limit);
    }
    let sale = ctx.config.sale.clone();

    let creator = Wallet::from_env()?;
    let buyer = Wallet::generate();
    let artist = Wallet::generate();

    tracing::info!(
        creator = %creator.address(),
        buyer = %buyer.address(),
        artist = %artist.address(),
        "Accounts ready"
    );

    // Funding
    let params = fetch_params(&ctx).await?;
    for (label, account, amount) in [
        ("buyer", &buyer, sale.buyer_funding),
        ("artist", &artist, sale.artist_funding),
    ] {
        let tx = TransactionBuilder::payment(&params, creator.address(), account.address(), amount)
            .build()?;
        let result = submit_and_wait(&ctx, &submitter, &[creator.sign(&tx)], max_rounds).await?;
        tracing::info!(account = label, amount, round = ?result.confirmed_round(), "Account funded");
    }

    // Asset creation
    let params = fetch_params(&ctx).await?;
    let asset = AssetParams {
        total: 1,
        decimals: 0,
        unit_name: sale.unit_name.clone(),
        asset_name: sale.asset_name.clone(),
        url: sale.asset_url.clone(),
        manager: Some(creator.address()),
        reserve: Some(creator.address()),
        freeze: Some(creator.address()),
        clawback: Some(creator.address()),
        ..AssetParams::default()
    };
    let tx = TransactionBuilder::asset_create(&params, creator.address(), asset).build()?;
    let result = submit_and_wait(&ctx, &submitter, &[creator.sign(&tx)], max_rounds).await?;
    let asset_index = result
        .asset_index()
        .ok_or("asset creation confirmed without an asset index")?;
    tracing::info!(asset_index, "Asset created");

    // Atomic sale
    let params = fetch_params(&ctx).await?;
    let royalty = percent_of(sale.price, sale.royalty_bps)?;
    let records = vec![
        TransactionBuilder::payment(&params, buyer.address(), creator.address(), sale.price)
            .build()?,
        TransactionBuilder::asset_opt_in(&params, buyer.address(), asset_index).build()?,
        TransactionBuilder::asset_transfer(
            &params,
            creator.address(),
            buyer.address(),
            asset_index,
            1,
        )
        .build()?,
        TransactionBuilder::payment(&params, creator.address(), artist.address(), royalty)
            .build()?,
    ];

    let group = assemble_group(records)?;
    let signers = [&buyer, &buyer, &creator, &creator];
    let bundle: Vec<SignedTransaction> = group
        .iter()
        .zip(signers)
        .map(|(tx, wallet)| wallet.sign(tx))
        .collect();

    let result = submit_and_wait(&ctx, &submitter, &bundle, max_rounds).await?;
    tracing::info!(
        txid = %result.txid,
        round = ?result.confirmed_round(),
        price = sale.price,
        royalty,
        "Atomic sale confirmed"
    );
    println!("{}", result);

    for (label, account) in [("creator", &creator), ("buyer", &buyer), ("artist", &artist)] {
        let info = ctx.client.account_information(&account.address()).await?;
        println!("{}: {}", label, serde_json::to_string_pretty(&info)?);
    }

    Ok(())
}

/// Per-call wall-clock limit from the confirmation settings.
fn time_limit(ctx: &AppContext) -> Option<Duration> {
    ctx.config.confirmation.deadline_secs.map(Duration::from_secs)
}

/// Fetch a parameter snapshot, abandoning it at the time limit or on shutdown.
async fn fetch_params(ctx: &AppContext) -> RunResult<NetworkParams> {
    let deadline = time_limit(ctx).map(|limit| Instant::now() + limit);
    let mut stop = ctx.shutdown.subscribe();
    Ok(cancellable(ctx.client.suggested_params(), deadline, Some(&mut stop)).await?)
}

/// Submit `bundle` and wait for it to confirm; any other outcome is an error.
async fn submit_and_wait(
    ctx: &AppContext,
    submitter: &Submitter,
    bundle: &[SignedTransaction],
    max_rounds: u64,
) -> RunResult<ConfirmationResult> {
    let txid = submitter.submit(bundle).await?;

    let mut waiter = ConfirmationWaiter::new(ctx.client.clone())
        .with_retry(RetryPolicy::from(&ctx.config.retries))
        .with_shutdown(ctx.shutdown.subscribe());
    if let Some(limit) = time_limit(ctx) {
        waiter = waiter.with_timeout(limit);
    }

    let result = waiter.await_confirmation(&txid, max_rounds).await;
    if !result.is_confirmed() {
        return Err(result.to_string().into());
    }
    Ok(result)
}
