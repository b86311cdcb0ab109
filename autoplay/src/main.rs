use clap::{Parser, ValueEnum};
use log::info;
use serde::Serialize;
use tilemerge::{
    solvers::{self, GameSummary},
    Advisor, AdvisorConfig, GameState,
};

/// Play whole games by always taking the advisor's recommendation.
#[derive(Parser, Debug)]
#[command(name = "autoplay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Search depth per move
    #[arg(short, long, default_value = "3")]
    depth: u32,

    /// Number of games to play
    #[arg(short, long, default_value = "1")]
    games: u32,

    /// Base seed; game i uses seed + i (default: from the OS)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop each game after this many moves
    #[arg(long)]
    max_moves: Option<u32>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Search without spawns at max nodes, weighting spawns by their odds
    #[arg(long)]
    canonical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Final board and a line per game.
    Text,
    /// One JSON object per game, then the aggregate.
    Json,
}

#[derive(Debug, Serialize)]
struct Aggregate {
    games: u32,
    wins: u32,
    mean_score: f64,
    /// Geometric mean of the largest tile of each game.
    mean_max_tile: f64,
}

fn aggregate(summaries: &[GameSummary]) -> Aggregate {
    let n = summaries.len().max(1) as f64;
    let wins = summaries.iter().filter(|s| s.terminal.flags().1).count() as u32;
    let mean_score = summaries.iter().map(|s| f64::from(s.score)).sum::<f64>() / n;
    let log_sum: u32 = summaries.iter().map(|s| s.max_tile.max(1).ilog2()).sum();
    Aggregate {
        games: summaries.len() as u32,
        wins,
        mean_score,
        mean_max_tile: 2.0_f64.powf(f64::from(log_sum) / n),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if args.canonical {
        AdvisorConfig::canonical()
    } else {
        AdvisorConfig::default()
    };
    let mut advisor = Advisor::with_config(config);
    let mut summaries = Vec::new();

    for i in 0..args.games {
        let mut game = match args.seed {
            Some(seed) => GameState::new_from_seed(seed.wrapping_add(u64::from(i))),
            None => GameState::new_from_entropy(),
        };

        let summary = solvers::solver_expectimax(&mut game, &mut advisor, args.depth, args.max_moves);
        info!("game {i}: {summary:?}");

        match args.format {
            OutputFormat::Text => {
                game.print();
                println!(
                    "game {}: {:?} score {} max tile {} in {} moves ({} nodes)\n",
                    i + 1,
                    summary.terminal,
                    summary.score,
                    summary.max_tile,
                    summary.moves,
                    summary.nodes
                );
            }
            OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        }
        summaries.push(summary);
    }

    let total = aggregate(&summaries);
    match args.format {
        OutputFormat::Text => println!(
            "{} games, {} won, mean score {:.1}, mean max tile {:.1}",
            total.games, total.wins, total.mean_score, total.mean_max_tile
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string(&total)?),
    }
    Ok(())
}
