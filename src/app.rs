//! App: terminal init, main loop, tick and key handling.

use crate::Args;
use crate::audio::{AudioPlayer, SoundEvent};
use crate::game::{DropOutcome, GameState};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Event poll timeout; also caps the render rate at roughly 60 FPS.
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Title,
    Playing,
    GameOver,
}

pub struct App {
    theme: Theme,
    state: GameState,
    audio: AudioPlayer,
    screen: Screen,
    /// Wall-clock anchor for gravity deltas; updated every frame.
    last_frame: Instant,
    /// TachyonFX fade for the game-over popup (created on first draw after).
    game_over_effect: Option<Effect>,
    game_over_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: &Args, theme: Theme) -> Self {
        let mut app = Self {
            theme,
            state: GameState::new(),
            audio: AudioPlayer::new(!args.no_sfx, !args.no_bgm),
            screen: Screen::Title,
            last_frame: Instant::now(),
            game_over_effect: None,
            game_over_effect_process_time: None,
        };
        if args.no_menu {
            app.start_game();
        }
        app
    }

    /// Begin a fresh game from the title or game-over screen.
    fn start_game(&mut self) {
        self.state.start();
        self.screen = Screen::Playing;
        self.game_over_effect = None;
        self.game_over_effect_process_time = None;
        self.last_frame = Instant::now();
        self.audio.start_bgm();
    }

    fn toggle_pause(&mut self) {
        if !self.state.running {
            return;
        }
        self.state.toggle_pause();
        if self.state.paused {
            self.audio.stop_bgm();
        } else {
            self.audio.start_bgm();
        }
    }

    /// Flip the background track. Switching it on mid-pause or outside a
    /// game only arms it; playback starts with the next resume or start.
    fn toggle_bgm(&mut self) {
        self.audio.bgm_enabled = !self.audio.bgm_enabled;
        if !self.audio.bgm_enabled {
            self.audio.stop_bgm();
        } else if self.screen == Screen::Playing && self.state.running && !self.state.paused {
            self.audio.start_bgm();
        }
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::MoveLeft => {
                if self.state.move_piece(-1) {
                    self.audio.notify(SoundEvent::Move);
                }
            }
            Action::MoveRight => {
                if self.state.move_piece(1) {
                    self.audio.notify(SoundEvent::Move);
                }
            }
            Action::Rotate => {
                if self.state.rotate() {
                    self.audio.notify(SoundEvent::Rotate);
                }
            }
            Action::SoftDrop => {
                let outcome = self.state.soft_drop();
                self.handle_outcome(outcome);
            }
            Action::HardDrop => {
                let outcome = self.state.hard_drop();
                self.handle_outcome(outcome);
            }
            _ => {}
        }
    }

    /// Sounds and screen changes for a finished drop step.
    fn handle_outcome(&mut self, outcome: Option<DropOutcome>) {
        match outcome {
            Some(DropOutcome::Locked { cleared }) => {
                if cleared > 0 {
                    self.audio.notify(SoundEvent::LineClear);
                }
                self.audio.notify(SoundEvent::Drop);
            }
            Some(DropOutcome::GameOver { cleared }) => {
                if cleared > 0 {
                    self.audio.notify(SoundEvent::LineClear);
                }
                self.audio.stop_bgm();
                self.audio.notify(SoundEvent::GameOver);
                self.screen = Screen::GameOver;
                self.game_over_effect = None;
                self.game_over_effect_process_time = None;
            }
            Some(DropOutcome::Descended) | None => {}
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.audio.bgm_enabled,
                    self.audio.sfx_enabled,
                    f.area(),
                    &mut self.game_over_effect,
                    &mut self.game_over_effect_process_time,
                    now,
                )
            })?;

            if event::poll(Duration::from_millis(FRAME_MS))? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        // OS key repeat arrives as fresh Press events, which
                        // is exactly the hold-to-move behaviour we want.
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        let action = key_to_action(key);
                        match self.screen {
                            Screen::Title => match action {
                                Action::Quit => return Ok(()),
                                Action::HardDrop => self.start_game(),
                                Action::ToggleBgm => self.toggle_bgm(),
                                Action::ToggleSfx => {
                                    self.audio.sfx_enabled = !self.audio.sfx_enabled;
                                }
                                _ => {}
                            },
                            Screen::Playing => match action {
                                Action::Quit => return Ok(()),
                                Action::Pause => self.toggle_pause(),
                                Action::ToggleBgm => self.toggle_bgm(),
                                Action::ToggleSfx => {
                                    self.audio.sfx_enabled = !self.audio.sfx_enabled;
                                }
                                _ => self.apply_action(action),
                            },
                            Screen::GameOver => {
                                if action == Action::Quit {
                                    return Ok(());
                                }
                                if matches!(
                                    key.code,
                                    KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Enter
                                ) {
                                    self.start_game();
                                }
                            }
                        }
                    }
                }
            }

            let frame_now = Instant::now();
            if self.screen == Screen::Playing && self.state.running && !self.state.paused {
                let outcome = self.state.tick(frame_now.duration_since(self.last_frame));
                self.handle_outcome(outcome);
            }
            self.last_frame = frame_now;
        }
    }
}
