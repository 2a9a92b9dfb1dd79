//! Console front-end for the liftoff crash table.
//!
//! Subscribes to the engine's event stream and renders it as text, placing a
//! scripted wager each betting window. The engine never knows this is a
//! terminal; any other subscriber could replace it.

use clap::Parser;
use liftoff::{CrashEngine, GameConfig, GameEvent, Multiplier, PlayerStatus, RoundPhase};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "liftoff", about = "Multiplier crash table demo")]
struct Args {
    /// Starting balance in demo coins
    #[arg(long, default_value_t = 10_000)]
    balance: u64,

    /// Wager placed automatically each betting window (0 to just watch)
    #[arg(long, default_value_t = 100)]
    bet: u64,

    /// Auto cash-out threshold, e.g. 2.0 (values <= 1.0 disable it)
    #[arg(long, default_value_t = 0.0)]
    auto_cash_out: f64,

    /// Seed for deterministic rounds
    #[arg(long)]
    seed: Option<u64>,

    /// Rounds to play before exiting
    #[arg(long, default_value_t = 5)]
    rounds: u32,

    /// Run with shortened phase timings
    #[arg(long)]
    fast: bool,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print raw events as JSON lines instead of formatted text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => GameConfig::from_toml_file(path)?,
        None if args.fast => GameConfig::accelerated(),
        None => GameConfig::default(),
    };
    config.starting_balance = args.balance;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let auto_cash_out = (args.auto_cash_out > 1.0).then(|| Multiplier::from_f64(args.auto_cash_out));
    let engine = CrashEngine::spawn(config)?;
    let mut events = engine.subscribe();

    println!("🛫 liftoff crash table");
    println!("   balance {} | bet {} | auto cash-out {}", args.balance, args.bet, match auto_cash_out {
        Some(threshold) => threshold.to_string(),
        None => "off".to_string(),
    });

    let mut completed = 0;
    while completed < args.rounds {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("event stream lagged; skipped {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            render(&event);
        }

        match event {
            GameEvent::PhaseChanged {
                phase: RoundPhase::Betting,
                ..
            } if args.bet > 0 => {
                match engine.place_bet(args.bet, auto_cash_out).await {
                    Ok(balance) => println!("   bet {} placed, balance {}", args.bet, balance),
                    Err(err) => println!("   bet rejected: {err}"),
                }
            }
            GameEvent::PhaseChanged {
                phase: RoundPhase::Crashed,
                ..
            } => completed += 1,
            _ => {}
        }
    }

    if let Ok(history) = engine.round_history().await {
        println!("\nlast rounds:");
        for record in history {
            println!("   {}", record.crash_point);
        }
    }
    if let Ok(balance) = engine.balance().await {
        println!("final balance: {balance}");
    }
    engine.shutdown().await;
    Ok(())
}

fn render(event: &GameEvent) {
    match event {
        GameEvent::PhaseChanged { phase, .. } => match phase {
            RoundPhase::Betting => println!("\n🎰 betting open"),
            RoundPhase::Ascending => println!("🛫 taking off"),
            RoundPhase::Crashed => println!(),
            RoundPhase::Idle => {}
        },
        GameEvent::MultiplierTick { multiplier, .. } => {
            print!("\r   {multiplier} ");
            let _ = io::stdout().flush();
        }
        GameEvent::RoundHistoryAppended { crash_point } => {
            println!("💥 crashed at {crash_point}");
        }
        GameEvent::UserOutcomeLogged { summary, .. } => println!("\n   {summary}"),
        GameEvent::BalanceChanged { .. } => {}
        GameEvent::SimulatedPlayerUpdated {
            name,
            status,
            multiplier,
            bet_amount,
        } => match (status, multiplier) {
            (PlayerStatus::Betting, _) => println!("   {name} bets {bet_amount}"),
            (_, Some(realized)) => println!("\n   {name} {status} @ {realized}"),
            _ => println!("\n   {name} {status}"),
        },
    }
}
