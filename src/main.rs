//! tetratui — classic falling-block puzzle game in the terminal.

mod app;
mod audio;
mod game;
mod input;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut app = App::new(&args, theme);
    app.run()?;
    Ok(())
}

/// Classic falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tetratui",
    version,
    about = "Classic falling-block puzzle in the terminal. Stack tetrominoes and clear full lines to score.",
    long_about = "Tetratui is a terminal rendition of the classic falling-block puzzle.\n\n\
        Steer falling tetrominoes on a 10×20 board. Full rows clear and score; every ten \
        cleared lines raises the level and the drop speed, until the stack reaches the top.\n\n\
        CONTROLS (normal):\n  Left/Right  Move       Up         Rotate      Down       Soft drop\n  Enter/Space Hard drop  P          Pause       Q / Esc    Quit\n\n\
        CONTROLS (vim):\n  h/l         Move       k          Rotate      j          Soft drop\n\n\
        M toggles music, X toggles sound effects. Hold a movement key to keep the piece \
        moving. Use --theme to load a btop-style theme file."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses built-in neon colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Start with background music off (toggle in game with M).
    #[arg(long)]
    pub no_bgm: bool,

    /// Start with sound effects off (toggle in game with X).
    #[arg(long)]
    pub no_sfx: bool,

    /// Skip the title screen and start playing immediately.
    #[arg(long)]
    pub no_menu: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
