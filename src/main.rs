use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gridswitch::actor::hotkeys;
use gridswitch::common::config::{Config, config_file};
use gridswitch::common::log;
use gridswitch::layout_engine::{Direction, GridLayout};
use serde::Serialize;
use strum::IntoEnumIterator;

/// Virtual desktops arranged as a grid, with focus that follows you around.
#[derive(Parser)]
#[command(name = "gridswitch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the one in the config directory
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate the config file
    CheckConfig,
    /// Print the effective configuration as TOML
    PrintConfig,
    /// Print where each navigation key leads on the configured grid
    Neighbors {
        /// Only show this desktop (1-based)
        #[arg(long, value_name = "N")]
        index: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Print the hotkeys that would be registered
    Bindings,
}

#[derive(Serialize)]
struct NeighborRow {
    desktop: usize,
    row: usize,
    column: usize,
    left: usize,
    right: usize,
    up: usize,
    down: usize,
}

impl NeighborRow {
    fn new(grid: &GridLayout, index: usize) -> NeighborRow {
        // Shown 1-based, like the number hotkeys.
        let step = |direction| grid.neighbor(index, direction) + 1;
        NeighborRow {
            desktop: index + 1,
            row: grid.row_of(index as isize),
            column: grid.column_of(index as isize),
            left: step(Direction::Left),
            right: step(Direction::Right),
            up: step(Direction::Up),
            down: step(Direction::Down),
        }
    }
}

fn main() -> ExitCode {
    log::init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let path = cli.config.unwrap_or_else(config_file);

    match cli.command {
        Commands::CheckConfig => {
            let config = Config::read(&path)?;
            let issues = config.validate();
            if issues.is_empty() {
                println!("{}: ok", path.display());
                return Ok(ExitCode::SUCCESS);
            }
            for issue in &issues {
                println!("{}: {issue}", path.display());
            }
            Ok(ExitCode::FAILURE)
        }
        Commands::PrintConfig => {
            let mut config = Config::load(&path)?;
            config.auto_fix_values();
            println!("# {}", path.display());
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Neighbors { index, json } => {
            let config = Config::load(&path)?;
            let grid = GridLayout::from_settings(&config.settings);
            let rows: Vec<NeighborRow> = match index {
                Some(n) => {
                    anyhow::ensure!(
                        n >= 1 && grid.contains(n - 1),
                        "desktop {n} is not on the {}x{} grid",
                        grid.rows,
                        grid.columns
                    );
                    vec![NeighborRow::new(&grid, n - 1)]
                }
                None => (0..grid.len()).map(|i| NeighborRow::new(&grid, i)).collect(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&rows).context("serializing table")?);
            } else {
                let header: Vec<String> = Direction::iter().map(|d| d.to_string()).collect();
                println!("desktop  row  column  {}", header.join("  "));
                for r in &rows {
                    println!(
                        "{:>7}  {:>3}  {:>6}  {:>4}  {:>5}  {:>2}  {:>4}",
                        r.desktop, r.row, r.column, r.left, r.right, r.up, r.down
                    );
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Bindings => {
            let config = Config::load(&path)?;
            for (hotkey, action) in hotkeys::bindings(&config.keys, config.settings.desktop_count()) {
                println!("{:<28} {action}", hotkey.to_string());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
