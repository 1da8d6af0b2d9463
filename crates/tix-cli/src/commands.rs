use chrono::DateTime;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;
use tix_ledger::{
    LedgerError, LedgerReader, LedgerWriter, ProjectionBuilder, TicketLedger, ValidationReport,
};
use tix_types::{TicketDetails, TicketId, Timestamp, Transaction};

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::resolve(cli.config.as_deref(), cli.journal.clone())?;
    let ledger = TicketLedger::new(config.ledger.clone())?;
    let out = Output { format: cli.format };

    match cli.command {
        Command::Buy(args) => cmd_buy(&ledger, &config, &out, args),
        Command::Commit(args) => cmd_commit(&ledger, &out, args),
        Command::Verify(args) => cmd_verify(&ledger, &out, args),
        Command::Scan(args) => cmd_scan(&ledger, &config, &out, args),
        Command::Validate(_) => cmd_validate(&ledger, &out),
        Command::Stats(args) => cmd_stats(&ledger, &config, &out, args),
        Command::Explorer(args) => cmd_explorer(&ledger, &out, args),
        Command::Events => cmd_events(&ledger, &config, &out),
    }
}

struct Output {
    format: OutputFormat,
}

impl Output {
    fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn format_time(ts: Timestamp) -> String {
    DateTime::from_timestamp_millis(ts.as_millis() as i64)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn cmd_buy(
    ledger: &TicketLedger,
    config: &CliConfig,
    out: &Output,
    args: BuyArgs,
) -> anyhow::Result<()> {
    let capacity = config.ensure_known_event(&args.event)?;
    let issued = ProjectionBuilder::event_stats(ledger, &args.event)?.issued;
    let requested = args.names.len() as u64;
    if issued + requested > capacity {
        anyhow::bail!(
            "{} is sold out: {} of {} tickets issued, {} requested",
            args.event,
            issued,
            capacity,
            requested
        );
    }

    let mut ids = Vec::with_capacity(args.names.len());
    for name in &args.names {
        let mut details = TicketDetails::new(args.event.clone()).with_buyer(name.clone());
        details.phone = args.phone.clone();
        details.uid = args.uid.clone();
        ids.push((name.clone(), ledger.stage_transaction(details)?));
    }
    let block = ledger.commit()?;

    if out.is_json() {
        let tickets: Vec<_> = ids
            .iter()
            .map(|(name, id)| json!({ "buyer": name, "ticket_id": id }))
            .collect();
        return out.json(&json!({
            "event": args.event,
            "block": block.index,
            "hash": block.hash,
            "tickets": tickets,
        }));
    }

    println!(
        "{} {} ticket(s) purchased for {}",
        "✓".green().bold(),
        ids.len(),
        args.event.bold()
    );
    for (name, id) in &ids {
        println!("  {}  {}", id.to_string().yellow().bold(), name);
    }
    println!(
        "  Block: {} {}",
        format!("#{}", block.index).cyan(),
        block.hash.short().dimmed()
    );
    Ok(())
}

fn cmd_commit(ledger: &TicketLedger, out: &Output, args: CommitArgs) -> anyhow::Result<()> {
    let block = match args.proof {
        Some(proof) => ledger.commit_with_proof(proof)?,
        None => ledger.commit()?,
    };

    if out.is_json() {
        return out.json(&block);
    }
    println!(
        "{} Sealed block {} ({} ticket(s))",
        "✓".green().bold(),
        format!("#{}", block.index).cyan(),
        block.transactions.len()
    );
    println!("  Hash: {}", block.hash.to_string().dimmed());
    Ok(())
}

fn cmd_verify(ledger: &TicketLedger, out: &Output, args: VerifyArgs) -> anyhow::Result<()> {
    let id = TicketId::parse(&args.ticket_id)?;
    let status = ledger.ticket_status(&id)?;
    let ticket = ledger.find_ticket(&id)?;

    if out.is_json() {
        return out.json(&json!({
            "ticket_id": id,
            "status": status,
            "ticket": ticket,
        }));
    }

    match (status, ticket) {
        (Some(status), Some(tx)) => {
            println!("{} Ticket {} is valid", "✓".green().bold(), id.to_string().yellow());
            print_ticket(&tx);
            let label = if status.is_admissible() {
                "not yet scanned".green()
            } else {
                "already scanned".red()
            };
            println!("  Status: {label}");
        }
        (Some(_), None) => {
            println!(
                "{} Ticket {} is pending and not yet sealed into a block",
                "…".yellow().bold(),
                id.to_string().yellow()
            );
        }
        _ => println!("{} Ticket {} not found", "✗".red().bold(), id),
    }
    Ok(())
}

fn print_ticket(tx: &Transaction) {
    println!("  Event: {}", tx.event_name.bold());
    if let Some(holder) = tx.holder() {
        println!("  Holder: {holder}");
    }
    if let Some(phone) = &tx.phone {
        println!("  Phone: {phone}");
    }
    if let Some(uid) = &tx.uid {
        println!("  UID: {uid}");
    }
    println!("  Issued: {}", format_time(tx.timestamp));
}

fn cmd_scan(
    ledger: &TicketLedger,
    config: &CliConfig,
    out: &Output,
    args: ScanArgs,
) -> anyhow::Result<()> {
    let id = TicketId::parse(&args.ticket_id)?;
    let result = match &args.event {
        Some(event) => {
            config.ensure_known_event(event)?;
            ledger.mark_scanned_for_event(&id, event)
        }
        None => ledger.mark_scanned(&id),
    };

    let message = match result {
        Ok(tx) => {
            let scanned = ledger.scanned_count(&tx.event_name)?;
            let remaining = config
                .capacity(&tx.event_name)
                .map(|capacity| capacity.saturating_sub(scanned));
            if out.is_json() {
                return out.json(&json!({
                    "admitted": true,
                    "ticket": tx,
                    "scanned": scanned,
                    "remaining_capacity": remaining,
                }));
            }
            println!(
                "{} Ticket verified! Welcome to {}",
                "✓".green().bold(),
                tx.event_name.bold()
            );
            if let Some(remaining) = remaining {
                println!("  Admitted: {scanned}, remaining capacity: {remaining}");
            }
            return Ok(());
        }
        Err(LedgerError::NotFound(_)) => match &args.event {
            Some(event) => format!("ticket {id} not found for {event}"),
            None => format!("ticket {id} not found"),
        },
        Err(LedgerError::AlreadyScanned(_)) => format!("ticket {id} has already been scanned"),
        Err(e) => return Err(e.into()),
    };

    if out.is_json() {
        return out.json(&json!({ "admitted": false, "error": message }));
    }
    println!("{} {}", "✗".red().bold(), message);
    Ok(())
}

fn cmd_validate(ledger: &TicketLedger, out: &Output) -> anyhow::Result<()> {
    let report: ValidationReport = ledger.validate()?;
    if out.is_json() {
        return out.json(&report);
    }

    let mark = |ok: bool| if ok { "valid".green() } else { "INVALID".red().bold() };
    if report.is_valid() {
        println!("{} Chain integrity verified", "✓".green().bold());
    } else {
        println!("{} Chain integrity violated", "✗".red().bold());
    }
    println!("  Blocks: {}", report.block_count.to_string().bold());
    println!("  Links: {}", mark(report.links_valid));
    println!("  Hashes: {}", mark(report.hashes_valid));
    println!("  Indices: {}", mark(report.indices_sequential));
    for violation in &report.violations {
        println!(
            "  {} block #{}: {}",
            "!".red(),
            violation.index,
            violation.description
        );
    }
    Ok(())
}

fn cmd_stats(
    ledger: &TicketLedger,
    config: &CliConfig,
    out: &Output,
    args: StatsArgs,
) -> anyhow::Result<()> {
    if let Some(event) = args.event {
        let capacity = config.ensure_known_event(&event)?;
        let stats = ProjectionBuilder::event_stats(ledger, &event)?;
        if out.is_json() {
            return out.json(&json!({
                "stats": stats,
                "capacity": capacity,
                "remaining_capacity": capacity.saturating_sub(stats.scanned),
            }));
        }
        println!("Event: {}", event.bold());
        println!("  Capacity: {capacity}");
        println!("  Tickets issued: {}", stats.issued);
        println!("  Tickets scanned: {}", stats.scanned.to_string().green());
        println!("  Remaining capacity: {}", capacity.saturating_sub(stats.scanned));
        return Ok(());
    }

    let summary = ProjectionBuilder::summary(ledger)?;
    if out.is_json() {
        return out.json(&summary);
    }
    println!(
        "Blocks: {}  Tickets: {}  Scanned: {}  Pending: {}",
        summary.block_count.to_string().bold(),
        summary.committed_tickets,
        summary.scanned_tickets.to_string().green(),
        summary.pending_tickets
    );
    for stats in &summary.events {
        println!(
            "  {:<20} issued {:>4}  scanned {:>4}",
            stats.event_name, stats.issued, stats.scanned
        );
    }
    Ok(())
}

fn cmd_explorer(ledger: &TicketLedger, out: &Output, args: ExplorerArgs) -> anyhow::Result<()> {
    if args.full {
        let mut chain = ledger.chain_snapshot()?;
        chain.reverse();
        chain.truncate(args.limit);
        if out.is_json() {
            return out.json(&chain);
        }
        for block in &chain {
            println!(
                "{}  {}",
                format!("Block #{}", block.index).cyan().bold(),
                format_time(block.timestamp).dimmed()
            );
            println!("  Previous hash: {}", block.previous_hash);
            println!("  Hash: {}", block.hash);
            println!("  Proof: {}", block.proof);
            for tx in &block.transactions {
                let state = if tx.scanned { "scanned".red() } else { "valid".green() };
                println!(
                    "    {} {} [{}] {}",
                    tx.ticket_id.to_string().yellow(),
                    tx.event_name,
                    state,
                    tx.holder().unwrap_or("-")
                );
            }
        }
        return Ok(());
    }

    let mut rows = ProjectionBuilder::explorer(ledger)?;
    rows.truncate(args.limit);
    if out.is_json() {
        return out.json(&rows);
    }
    for row in &rows {
        println!(
            "{}  {}  prev {}  {} ticket(s)  {}",
            format!("#{}", row.index).cyan().bold(),
            row.hash.short().yellow(),
            row.previous_hash.short().dimmed(),
            row.ticket_count,
            format_time(row.timestamp).dimmed()
        );
    }
    Ok(())
}

fn cmd_events(ledger: &TicketLedger, config: &CliConfig, out: &Output) -> anyhow::Result<()> {
    let mut rows = Vec::with_capacity(config.events.len());
    for (name, capacity) in &config.events {
        let stats = ProjectionBuilder::event_stats(ledger, name)?;
        rows.push(json!({
            "event": name,
            "capacity": capacity,
            "issued": stats.issued,
            "scanned": stats.scanned,
        }));
        if !out.is_json() {
            println!(
                "  {:<20} capacity {:>4}  issued {:>4}  scanned {:>4}",
                name.bold(),
                capacity,
                stats.issued,
                stats.scanned
            );
        }
    }
    if out.is_json() {
        return out.json(&rows);
    }
    Ok(())
}
