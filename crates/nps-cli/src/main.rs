//! NoPageSpeed CLI
//!
//! CLI tool for inspecting and driving the settings store outside the browser.

mod file_store;
mod logging;

use clap::{Parser, Subcommand};

use nps_core::options::OptionsSummary;
use nps_core::{Background, Header, Message, Mode, Tab, UiCommand};

use crate::file_store::JsonFileStorage;

#[derive(Parser)]
#[command(name = "nps-cli")]
#[command(about = "NoPageSpeed settings inspector and request simulator")]
struct Cli {
    /// Settings store (JSON object, same layout as the extension's storage)
    #[arg(short, long, global = true, default_value = "nopagespeed-store.json")]
    store: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current mode and flags
    Status,

    /// Toggle the flag governing a URL under the current mode
    Toggle {
        /// Page URL (the site that would be in the active tab)
        #[arg(short, long, default_value = "")]
        url: String,
    },

    /// Switch the operating mode
    Mode {
        /// "global" or "persite"
        mode: String,
    },

    /// Print the headers an outgoing request would carry
    Inject {
        /// Request URL
        #[arg(short, long)]
        url: String,

        /// Request header as "Name: Value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },

    /// Upgrade the store to the latest schema
    Migrate,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);
    tracing::debug!("(cli) using store {}", cli.store);

    let background = Background::new(JsonFileStorage::new(&cli.store));

    let result = match cli.command {
        Commands::Status => cmd_status(background),
        Commands::Toggle { url } => cmd_toggle(background, &url, cli.verbose),
        Commands::Mode { mode } => cmd_mode(background, &mode, cli.verbose),
        Commands::Inject { url, headers } => cmd_inject(background, &url, &headers),
        Commands::Migrate => cmd_migrate(background),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

type Cmd = Background<JsonFileStorage>;

fn cmd_status(mut background: Cmd) -> Result<(), String> {
    let settings = background.settings();

    println!("Store: {}", background.store().backend().path().display());
    println!("  Version:        {}", settings.version);
    println!("  Mode:           {}", settings.mode);
    println!("  Global flag:    {}", settings.global_disabled);
    println!();

    match background.options_summary() {
        OptionsSummary::Global { state } => println!("Global state: {state}"),
        OptionsSummary::PerSite { disabled_sites } => {
            println!("Sites requesting no PageSpeed:");
            if disabled_sites.is_empty() {
                println!("  (none)");
            }
            for site in disabled_sites {
                println!("  {site}");
            }
        }
    }
    Ok(())
}

fn print_effects(ui: &[UiCommand], messages: &[Message]) {
    for command in ui {
        println!("  ui:      {}", serde_json::to_string(command).unwrap_or_default());
    }
    for message in messages {
        println!("  message: {}", serde_json::to_string(message).unwrap_or_default());
    }
}

fn cmd_toggle(mut background: Cmd, url: &str, verbose: bool) -> Result<(), String> {
    let tab = Tab {
        id: 1,
        url: Some(url.to_string()),
        active: true,
        window_id: 1,
    };
    let tabs = vec![tab.clone()];
    let mut ui: Vec<UiCommand> = Vec::new();
    let mut messages: Vec<Message> = Vec::new();

    let disabled = background.on_toggle(&tab, &tabs, &mut ui, &mut messages);

    if messages.is_empty() {
        println!("Nothing to toggle for '{url}' (no site)");
    } else {
        println!(
            "{}: {}",
            if url.is_empty() { "all sites" } else { url },
            nps_core::icon_for(disabled).title
        );
    }
    if verbose {
        print_effects(&ui, &messages);
    }
    Ok(())
}

fn cmd_mode(mut background: Cmd, mode: &str, verbose: bool) -> Result<(), String> {
    let mode: Mode = mode.parse().map_err(|e| format!("{e}"))?;
    let tabs: Vec<Tab> = Vec::new();
    let mut ui: Vec<UiCommand> = Vec::new();
    let mut messages: Vec<Message> = Vec::new();

    background.on_mode_change(mode, &tabs, &mut ui, &mut messages);

    println!("Mode set to {mode}");
    if verbose {
        print_effects(&ui, &messages);
    }
    Ok(())
}

fn parse_header(raw: &str) -> Result<Header, String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("Header '{raw}' is not 'Name: Value'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Header '{raw}' has no name"));
    }
    Ok(Header::new(name, value.trim()))
}

fn cmd_inject(mut background: Cmd, url: &str, raw_headers: &[String]) -> Result<(), String> {
    let headers = raw_headers
        .iter()
        .map(|raw| parse_header(raw))
        .collect::<Result<Vec<_>, _>>()?;

    for header in background.on_request(url, headers) {
        match (&header.value, &header.binary_value) {
            (Some(value), _) => println!("{}: {}", header.name, value),
            (None, Some(bytes)) => println!("{}: <{} bytes>", header.name, bytes.len()),
            (None, None) => println!("{}:", header.name),
        }
    }
    Ok(())
}

fn cmd_migrate(mut background: Cmd) -> Result<(), String> {
    let settings = background
        .store_mut()
        .load()
        .map_err(|e| format!("Failed to migrate: {e}"))?;

    if settings.version > nps_core::LATEST_VERSION {
        return Err(format!(
            "Store schema {} is newer than this build ({})",
            settings.version,
            nps_core::LATEST_VERSION
        ));
    }
    println!("Store is at schema {}", settings.version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header("Accept: */*"), Ok(Header::new("Accept", "*/*")));
        assert_eq!(parse_header("X-Empty:"), Ok(Header::new("X-Empty", "")));
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["nps-cli", "inject", "-u", "https://a.com/", "-H", "Accept: */*"]).unwrap();
        assert_eq!(cli.store, "nopagespeed-store.json");
        assert!(matches!(cli.command, Commands::Inject { ref headers, .. } if headers.len() == 1));

        let cli = Cli::try_parse_from(["nps-cli", "mode", "global", "--store", "x.json"]).unwrap();
        assert_eq!(cli.store, "x.json");
    }
}
