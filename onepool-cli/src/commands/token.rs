use super::state::{parse_amount, Deployment};
use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, Table};
use onepool_core::{format_units, Address, FeeToken, StakeToken, Storage};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TokenKind {
    /// 1POOL, the token bets are placed in
    Stake,
    /// BOG, the token fees are paid in
    Fee,
}

pub async fn faucet(storage: &Storage, account: &str, amount: &str) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let account = Address::new(account);
    let amount = parse_amount(amount)?;

    deployment.fee.mint(&account, &account, amount)?;
    deployment.save(storage).await?;

    println!(
        "Minted {} {} to {}",
        format_units(amount),
        deployment.fee.symbol(),
        account
    );
    Ok(())
}

pub async fn transfer(storage: &Storage, from: &str, to: &str, amount: &str) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let amount = parse_amount(amount)?;

    let received = deployment
        .stake
        .transfer(&Address::new(from), &Address::new(to), amount)?;
    deployment.save(storage).await?;

    println!("Sent {} 1POOL from {} to {}", format_units(amount), from, to);
    if received != amount {
        println!("  Received after tax: {}", format_units(received));
    }
    Ok(())
}

pub async fn approve(storage: &Storage, owner: &str, token: TokenKind, amount: &str) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let owner = Address::new(owner);
    let spender = deployment.pool.address().clone();
    let amount = parse_amount(amount)?;

    let ledger = match token {
        TokenKind::Stake => &deployment.stake,
        TokenKind::Fee => &deployment.fee,
    };
    ledger.approve(&owner, &spender, amount);
    let symbol = ledger.symbol();
    deployment.save(storage).await?;

    println!(
        "{} approved {} {} for the pool",
        owner,
        format_units(amount),
        symbol
    );
    Ok(())
}

pub async fn fund(storage: &Storage, from: &str, amount: &str) -> Result<()> {
    let mut deployment = Deployment::load(storage).await?;
    let pool_address = deployment.pool.address().clone();
    let amount = parse_amount(amount)?;

    let received = deployment
        .stake
        .transfer(&Address::new(from), &pool_address, amount)?;
    deployment.save(storage).await?;

    println!("Lottery fund topped up by {} 1POOL", format_units(received));
    println!("  Fund: {}", format_units(deployment.pool.fund_balance()));
    println!("  Next reward: {}", format_units(deployment.pool.next_reward()));
    Ok(())
}

pub async fn balance(storage: &Storage, account: &str) -> Result<()> {
    let deployment = Deployment::load(storage).await?;
    let account = Address::new(account);
    let pool_address = deployment.pool.address();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Token", "Balance", "Allowance (pool)"]);

    for ledger in [&deployment.stake, &deployment.fee] {
        table.add_row(vec![
            format!("{} ({})", ledger.name(), ledger.symbol()),
            format_units(ledger.balance_of(&account)),
            format_units(ledger.allowance(&account, pool_address)),
        ]);
    }

    println!("Balances for {}:", account);
    println!("{}", table);
    Ok(())
}
