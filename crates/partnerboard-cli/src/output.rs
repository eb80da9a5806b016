//! Terminal rendering for slots, cards, and notices.

use std::io::IsTerminal;

use anyhow::Result;
use serde_json::Value;

use partnerboard_core::ad_block::AdBlock;
use partnerboard_core::error::PersistenceError;
use partnerboard_core::events::BoardEvent;
use partnerboard_core::website::Website;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";

/// Wrap `text` in `style` when stdout is a terminal.
fn paint(style: &str, text: &str) -> String {
    if std::io::stdout().is_terminal() {
        format!("{style}{text}{RESET}")
    } else {
        text.to_owned()
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Ad blocks ────────────────────────────────────────────────────────

pub fn print_ad_blocks(blocks: &[AdBlock], json: bool) -> Result<()> {
    if json {
        // Status and preview are derived fields; include them for scripts.
        let rows: Vec<Value> = blocks
            .iter()
            .map(|b| {
                serde_json::json!({
                    "id": b.id,
                    "position": b.position,
                    "configured": b.is_configured(),
                    "preview": b.preview(),
                })
            })
            .collect();
        return print_json(&rows);
    }

    for block in blocks {
        let status = if block.is_configured() {
            paint(GREEN, "● Код добавлен")
        } else {
            paint(DIM, "○ Код не добавлен")
        };
        println!("{:>3}  {:<18} {status}", block.id, block.position);
        if block.is_configured() {
            println!("     {}", paint(DIM, &block.preview().replace('\n', " ")));
        }
    }
    Ok(())
}

pub fn print_ad_block(block: &AdBlock, json: bool) -> Result<()> {
    if json {
        return print_json(block);
    }
    println!("{}", paint(BOLD, &format!("{} — {}", block.id, block.position)));
    if block.is_configured() {
        println!("{}", block.code);
    } else {
        println!("{}", paint(DIM, "Код не добавлен"));
    }
    Ok(())
}

// ── Websites ─────────────────────────────────────────────────────────

pub fn print_websites(sites: &[Website], json: bool) -> Result<()> {
    if json {
        return print_json(sites);
    }
    if sites.is_empty() {
        println!("{}", paint(DIM, "Список партнеров пуст"));
    }
    for site in sites {
        println!("{:>3}  {}  {}", site.id, paint(BOLD, &site.title), site.url);
    }
    Ok(())
}

pub fn print_website(site: &Website, json: bool) -> Result<()> {
    if json {
        return print_json(site);
    }
    println!("{}", paint(BOLD, &format!("{} — {}", site.id, site.title)));
    println!("  url:         {}", site.url);
    println!("  description: {}", site.description);
    println!("  image:       {}", site.image);
    Ok(())
}

// ── Notices ──────────────────────────────────────────────────────────

/// Show the toast for a store event. Warnings go to stderr; confirmations
/// go to stdout unless it carries JSON.
pub fn print_notice(event: &BoardEvent, json: bool) {
    let notice = event.notice();
    if event.is_warning() {
        eprintln!("warning: {}: {}", notice.title, notice.description);
    } else if !json {
        println!("{}: {}", paint(GREEN, &notice.title), notice.description);
    }
}

/// Report a collection that was rejected at open. The next change to it
/// replaces whatever is stored.
pub fn print_load_error(key: &str, err: &PersistenceError) {
    eprintln!("warning: stored '{key}' was not loaded, using defaults: {err}");
}
