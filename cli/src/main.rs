use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use jigsnap::{render_board, SvgOptions};
use jigsnap_core::{settle, Board, BuildRequest, ConfigError};
use tracing_subscriber::EnvFilter;

mod bot;

#[derive(Parser)]
#[command(name = "jigsnap-cli", version, about = "Generate, render and auto-play jigsaw boards")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SVG path of one piece outline.
    Outline {
        #[command(flatten)]
        board: BoardArgs,
        #[arg(long)]
        row: u32,
        #[arg(long)]
        col: u32,
    },
    /// Write the whole board as an SVG document.
    Render {
        #[command(flatten)]
        board: BoardArgs,
        /// Place every piece on its target instead of the scatter.
        #[arg(long)]
        solved: bool,
        #[arg(long, default_value_t = 1.0)]
        inflate: f64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Solve a board through the pointer protocol and print a JSON summary.
    Play(bot::PlayArgs),
}

#[derive(Args, Clone, Debug)]
pub(crate) struct BoardArgs {
    #[arg(long, env = "JIGSNAP_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    rows: Option<u32>,
    #[arg(long)]
    cols: Option<u32>,
    #[arg(long)]
    cell_size: Option<f64>,
    #[arg(long)]
    snap_threshold: Option<f64>,
    #[arg(long, env = "JIGSNAP_SEED")]
    seed: Option<u64>,
}

impl BoardArgs {
    /// TOML file first, then flag overrides.
    pub(crate) fn request(&self) -> Result<BuildRequest, ConfigError> {
        let mut request = match &self.config {
            Some(path) => BuildRequest::load(path)?,
            None => BuildRequest::default(),
        };
        if let Some(rows) = self.rows {
            request.rows = rows;
        }
        if let Some(cols) = self.cols {
            request.cols = cols;
        }
        if let Some(cell_size) = self.cell_size {
            request.cell_size = cell_size;
        }
        if let Some(snap_threshold) = self.snap_threshold {
            request.snap_threshold = snap_threshold;
        }
        if self.seed.is_some() {
            request.seed = self.seed;
        }
        request.validate()?;
        Ok(request)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Outline { board, row, col } => {
            let request = board.request()?;
            let board = Board::build(&request)?;
            let Some(piece) = board.piece_at(row, col) else {
                return Err(format!(
                    "cell ({row}, {col}) is outside the {}x{} grid",
                    board.rows(),
                    board.cols()
                )
                .into());
            };
            println!("{}", piece.outline().to_svg_path());
        }
        Commands::Render {
            board,
            solved,
            inflate,
            out,
        } => {
            let request = board.request()?;
            let mut board = Board::build(&request)?;
            if solved {
                board = settle(&board);
            }
            let options = SvgOptions {
                inflate,
                ..SvgOptions::default()
            };
            let svg = render_board(&board, &[], &options);
            match out {
                Some(path) => {
                    fs::write(&path, svg)?;
                    tracing::info!(path = %path.display(), pieces = board.len(), "board rendered");
                }
                None => print!("{svg}"),
            }
        }
        Commands::Play(args) => bot::run(args)?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
