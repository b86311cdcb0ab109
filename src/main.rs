use std::{
    fmt,
    io::{stdout, Stdout},
};

use clap::Parser;
use crossterm::{
    cursor::MoveTo,
    event::{read, Event, KeyCode, KeyEventKind, KeyModifiers},
    style::{Color, Print, Stylize},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    Command, ExecutableCommand,
};
use log::info;
use tilemerge::{Advisor, Checkpoint, Direction, GameState, Snapshot, Tile};

/// Play the sliding-tile puzzle in the terminal.
///
/// Arrows move, `h` asks for a hint, `u` undoes the last move,
/// Ctrl+Q starts over once the game is finished, Ctrl+C quits.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Random seed (default: from the OS)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Search depth used for hints
    #[arg(short, long, default_value = "3")]
    depth: u32,
}

struct View<'a> {
    snapshot: &'a Snapshot,
    hint: Option<Direction>,
}

impl<'a> Command for View<'a> {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "Score : {}\r\n\r\n", self.snapshot.score)?;
        for row in self.snapshot.board.iter() {
            for &value in row.iter() {
                match Tile::from_value(value) {
                    Some(tile) => write!(f, "|{}", styled(tile))?,
                    None => write!(f, "|{: ^6}", " ")?,
                }
            }
            write!(f, "|\r\n")?;
        }
        write!(f, "\r\n")?;

        if let Some(dir) = self.hint {
            write!(f, "hint: {}\r\n", arrow(dir).with(Color::Red))?;
        }
        if self.snapshot.is_over() {
            let message = if self.snapshot.is_won() {
                "2048 Completed. Ctrl + q to reset"
            } else {
                "No moves left. Ctrl + q to reset"
            };
            write!(f, "{message}\r\n")?;
        }
        Ok(())
    }
}

fn arrow(dir: Direction) -> &'static str {
    match dir {
        Direction::Left => "\u{2190} left",
        Direction::Right => "\u{2192} right",
        Direction::Up => "\u{2191} up",
        Direction::Down => "\u{2193} down",
    }
}

fn styled(t: Tile) -> impl fmt::Display {
    format!("{: ^6}", t.as_u32()).with(match t.as_u32() {
        2 => Color::White,
        4 => Color::Rgb {
            r: 255,
            g: 215,
            b: 0,
        }, // orange
        8 => Color::DarkYellow,
        16 => Color::Magenta,
        32 => Color::Green,
        64 => Color::Blue,
        128..=512 => Color::Cyan,
        1024 | 2048 => Color::Red,
        _ => Color::White,
    })
}

enum Action {
    Move(Direction),
    Hint,
    Undo,
    Reset,
    Quit,
}

fn action(code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    match (code, modifiers) {
        (KeyCode::Left, KeyModifiers::NONE) => Some(Action::Move(Direction::Left)),
        (KeyCode::Right, KeyModifiers::NONE) => Some(Action::Move(Direction::Right)),
        (KeyCode::Up, KeyModifiers::NONE) => Some(Action::Move(Direction::Up)),
        (KeyCode::Down, KeyModifiers::NONE) => Some(Action::Move(Direction::Down)),
        (KeyCode::Char('h'), KeyModifiers::NONE) => Some(Action::Hint),
        (KeyCode::Char('u'), KeyModifiers::NONE) => Some(Action::Undo),
        (KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(Action::Reset),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),
        _ => None,
    }
}

fn play(stdout: &mut Stdout, args: &Args) -> anyhow::Result<()> {
    let mut game = match args.seed {
        Some(seed) => GameState::new_from_seed(seed),
        None => GameState::new_from_entropy(),
    };
    let mut advisor = Advisor::new();
    let mut prev_state: Option<Checkpoint> = None;
    let mut hint = None;

    'gameloop: loop {
        let snapshot = game.snapshot();
        stdout.execute(Clear(ClearType::All))?;
        stdout.execute(MoveTo(0, 0))?;
        stdout.execute(View {
            snapshot: &snapshot,
            hint,
        })?;

        let (code, modifiers) = match read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => (k.code, k.modifiers),
            _ => continue 'gameloop,
        };

        match action(code, modifiers) {
            Some(Action::Move(dir)) => {
                let checkpoint = game.checkpoint();
                if game.apply_move(dir) {
                    prev_state = Some(checkpoint);
                    hint = None;
                }
            }
            Some(Action::Hint) if !game.terminal().is_over() => {
                hint = advisor.recommend(&mut game, args.depth);
                info!("hint {hint:?} after {} nodes", advisor.last_stats().nodes);
            }
            Some(Action::Undo) => {
                if let Some(prev) = prev_state.take() {
                    game.restore(prev);
                    hint = None;
                }
            }
            Some(Action::Reset) if game.terminal().is_over() => {
                info!("reset at score {}", game.score());
                game.reset();
                prev_state = None;
                hint = None;
            }
            Some(Action::Quit) => break 'gameloop,
            _ => {}
        }
    }

    stdout.execute(Print("\r\n"))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    enable_raw_mode()?;
    let mut stdout = stdout();
    let result = play(&mut stdout, &args);
    disable_raw_mode()?;
    result
}
