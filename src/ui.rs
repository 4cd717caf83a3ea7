//! Layout and drawing: title screen, playfield, sidebar, pause and game over popups.

use crate::app::Screen;
use crate::game::{COLS, GameState, Piece, PieceKind, ROWS};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each board cell is two terminal columns wide so cells come out square-ish.
const CELL_W: u16 = 2;
const SIDEBAR_WIDTH: u16 = 16;

/// Duration of the game-over popup fade-in (TachyonFX).
const GAME_OVER_FADE_MS: u32 = 600;

/// Playfield size in terminal cells (grid + border).
fn playfield_pixel_size() -> (u16, u16) {
    (COLS as u16 * CELL_W + 2, ROWS as u16 + 2)
}

/// Draw the current screen. On game over the popup fades in over the final
/// board; `game_over_effect` / `effect_process_time` carry the animation
/// between frames.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    bgm_on: bool,
    sfx_on: bool,
    area: Rect,
    game_over_effect: &mut Option<Effect>,
    effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    match screen {
        Screen::Title => draw_title(frame, theme, area),
        Screen::Playing => {
            draw_game(frame, state, theme, bgm_on, sfx_on, area);
            if state.paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::GameOver => {
            draw_game(frame, state, theme, bgm_on, sfx_on, area);
            let popup = draw_game_over(frame, state, theme, area);
            apply_game_over_fade(frame, theme, popup, game_over_effect, effect_process_time, now);
        }
    }
}

fn draw_title(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 44u16;
    let popup_h = 17u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let title = Line::from(vec![
        Span::styled(" tetra ", Style::default().fg(theme.pieces[0]).bold()),
        Span::styled(" tui ", Style::default().fg(theme.main_fg).bold()),
    ]);

    let key_style = Style::default().fg(theme.pieces[1]);
    let label_style = Style::default().fg(theme.main_fg);
    let start_style = Style::default().fg(Color::Black).bg(theme.title).bold();

    let key_line = |key: &'static str, label: &'static str| {
        Line::from(vec![
            Span::styled(key, key_style),
            Span::styled(label, label_style),
        ])
    };

    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(""),
        key_line(" ← → / h l ", "Move"),
        key_line(" ↑ / k     ", "Rotate"),
        key_line(" ↓ / j     ", "Soft drop"),
        key_line(" Space     ", "Hard drop"),
        key_line(" P         ", "Pause"),
        key_line(" M / X     ", "Music / Sound"),
        Line::from(""),
        Line::from(Span::styled(" [ ENTER — START ] ", start_style)),
        Line::from(""),
        Line::from(Span::styled(
            " Q — Quit ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Draw the game-over popup over the final board; returns the popup rect so
/// the fade effect can target it.
fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) -> Rect {
    let popup_w = 30u16;
    let popup_h = 11u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", state.score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Lines: {} ", state.lines),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Level: {} ", state.level),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R — Restart    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" tetratui ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
    popup
}

/// Create the fade-in on first render after game over, then advance it by
/// wall-clock time each frame.
fn apply_game_over_fade(
    frame: &mut Frame,
    theme: &Theme,
    popup: Rect,
    game_over_effect: &mut Option<Effect>,
    effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = effect_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *effect_process_time = Some(now);

    if game_over_effect.is_none() {
        let bg = theme.bg;
        let effect =
            fx::fade_from(bg, bg, (GAME_OVER_FADE_MS, Interpolation::Linear)).with_area(popup);
        *game_over_effect = Some(effect);
    }

    if let Some(effect) = game_over_effect {
        frame.render_effect(effect, popup, tfx_delta);
    }
}

/// Draw game: playfield + sidebar, centred in the full area.
fn draw_game(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    bgm_on: bool,
    sfx_on: bool,
    area: Rect,
) {
    let (pw, ph) = playfield_pixel_size();
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);

    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let active_area = vert_chunks[1];

    let (playfield_area, sidebar_area) = {
        let inner = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
            .split(active_area);
        (inner[0], inner[1])
    };

    draw_playfield(frame, state, theme, playfield_area);
    draw_sidebar(frame, state, theme, bgm_on, sfx_on, sidebar_area);
}

/// Colour index of the falling piece at board position (x, y), if any.
fn piece_cell_at(piece: &Piece, x: usize, y: usize) -> Option<u8> {
    let dx = x as i32 - piece.x;
    let dy = y as i32 - piece.y;
    if dx < 0 || dy < 0 || dy as usize >= piece.height() || dx as usize >= piece.width() {
        return None;
    }
    let cell = piece.shape[dy as usize][dx as usize];
    (cell != 0).then_some(cell)
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" tetratui ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for y in 0..ROWS {
        for x in 0..COLS {
            // Falling piece overdraws settled cells.
            let idx = state
                .current
                .as_ref()
                .and_then(|p| piece_cell_at(p, x, y))
                .unwrap_or_else(|| state.board.get(x, y));

            let rx = inner.x + x as u16 * CELL_W;
            let ry = inner.y + y as u16;
            if rx + 1 >= inner.x + inner.width || ry >= inner.y + inner.height {
                continue;
            }
            if idx != 0 {
                let c = theme.piece_color(idx);
                let style = Style::default().fg(c).bg(c);
                buf[(rx, ry)].set_symbol("█").set_style(style);
                buf[(rx + 1, ry)].set_symbol("█").set_style(style);
            } else {
                let style = Style::default().bg(theme.bg);
                buf[(rx, ry)].set_symbol(" ").set_style(style);
                buf[(rx + 1, ry)].set_symbol(" ").set_style(style);
            }
        }
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    bgm_on: bool,
    sfx_on: bool,
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let off_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    // Free-floating sections with their own borders; vertical layout with small gaps
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Next (border + title + preview)
            Constraint::Length(1), // gap
            Constraint::Length(5), // Stats (border + score, lines, level)
            Constraint::Length(1), // gap
            Constraint::Length(4), // Audio (border + music, sound)
        ])
        .split(area);

    // --- Next (own border) ---
    let next_outer = chunks[0];
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let next_inner = next_block.inner(next_outer);
    next_block.render(next_outer, frame.buffer_mut());
    let next_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(4)])
        .split(next_inner);
    Paragraph::new(Line::from(Span::styled("Next", title_style)))
        .render(next_layout[0], frame.buffer_mut());
    if let Some(next) = state.next.as_ref() {
        draw_piece_preview(frame, theme, next_layout[1], next.kind);
    }

    // --- Stats (own border): Score, Lines, Level ---
    let stats_outer = chunks[2];
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(stats_outer);
    stats_block.render(stats_outer, frame.buffer_mut());
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(state.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lines: ", title_style),
            Span::styled(state.lines.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Level: ", title_style),
            Span::styled(state.level.to_string(), fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Audio (own border): toggle states ---
    let audio_outer = chunks[4];
    let audio_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let audio_inner = audio_block.inner(audio_outer);
    audio_block.render(audio_outer, frame.buffer_mut());
    let on_off = |on: bool| {
        if on {
            Span::styled("on", fg_style)
        } else {
            Span::styled("off", off_style)
        }
    };
    let audio_lines = vec![
        Line::from(vec![Span::styled("Music [M]: ", title_style), on_off(bgm_on)]),
        Line::from(vec![Span::styled("Sound [X]: ", title_style), on_off(sfx_on)]),
    ];
    Paragraph::new(ratatui::text::Text::from(audio_lines)).render(audio_inner, frame.buffer_mut());
}

/// Draw the next piece, centred in a 4×4 cell box.
fn draw_piece_preview(frame: &mut Frame, theme: &Theme, area: Rect, kind: PieceKind) {
    let template = kind.template();
    let bw = template.first().map_or(0, |row| row.len()) as u16;
    let bh = template.len() as u16;
    let off_x = area.width.saturating_sub(bw * CELL_W) / 2;
    let off_y = area.height.saturating_sub(bh) / 2;

    let color = theme.piece_color(kind.color_index());
    for (dy, row) in template.iter().enumerate() {
        for (dx, &cell) in row.iter().enumerate() {
            if cell == 0 {
                continue;
            }
            let r = Rect {
                x: area.x + off_x + dx as u16 * CELL_W,
                y: area.y + off_y + dy as u16,
                width: CELL_W,
                height: 1,
            };
            if r.x + r.width > area.x + area.width || r.y >= area.y + area.height {
                continue;
            }
            let p = Paragraph::new("██").style(Style::default().fg(color).bg(color));
            p.render(r, frame.buffer_mut());
        }
    }
}
