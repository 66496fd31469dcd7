//! Terminal UI rendering with ratatui

use crate::grid::Cell;
use crate::layout::{PlayLayout, CELL_W};
use crate::menu::{Menu, MenuItemType};
use crate::session::Session;
use crate::settings::Settings;
use crate::shape::Shape;
use crate::theme::Theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Menu box size; the mouse handler in main.rs relies on the same numbers.
pub const MENU_WIDTH: u16 = 53;
pub const MENU_HEIGHT: u16 = 24;
/// Rows taken by the title above the bordered item list.
const MENU_TITLE_HEIGHT: u16 = 7;

const EMPTY_CELL: &str = " ·";
const BLOCK: &str = "  ";

/// Render the main menu with the high-score table underneath
pub fn render_menu(frame: &mut Frame, menu: &Menu, settings: &Settings) {
    let area = frame.area();
    let menu_area = center_rect(area, MENU_WIDTH, MENU_HEIGHT);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(MENU_TITLE_HEIGHT), Constraint::Min(8)])
        .split(menu_area);

    let title_lines = vec![
        Line::styled("██████╗ ██╗      ██████╗ ██╗  ██╗██████╗ ███████╗", Style::default().fg(Color::Cyan)),
        Line::styled("██╔══██╗██║     ██╔═══██╗██║ ██╔╝██╔══██╗██╔════╝", Style::default().fg(Color::Cyan)),
        Line::styled("██████╔╝██║     ██║   ██║█████╔╝ ██████╔╝███████╗", Style::default().fg(Color::Cyan)),
        Line::styled("██╔══██╗██║     ██║   ██║██╔═██╗ ██╔══██╗╚════██║", Style::default().fg(Color::Cyan)),
        Line::styled("██████╔╝███████╗╚██████╔╝██║  ██╗██║  ██║███████║", Style::default().fg(Color::Cyan)),
        Line::styled("╚═════╝ ╚══════╝ ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝╚══════╝", Style::default().fg(Color::Cyan)),
    ];
    let title = Paragraph::new(title_lines).alignment(Alignment::Center);
    frame.render_widget(title, layout[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(layout[1]);
    frame.render_widget(block, layout[1]);

    let mut lines = Vec::new();
    lines.push(Line::raw(""));
    for (i, item) in menu.items.iter().enumerate() {
        lines.push(render_menu_item(item, i == menu.selected));
        lines.push(Line::raw(""));
    }
    lines.push(Line::styled(
        "↑↓ Select  ←→ Adjust  Enter Confirm  Q Quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);

    render_score_table(
        frame,
        Rect::new(
            menu_area.x,
            (menu_area.y + MENU_HEIGHT).min(area.y + area.height.saturating_sub(1)),
            MENU_WIDTH,
            (settings.high_scores.len() as u16 + 3).min(area.height),
        ),
        settings,
    );
}

fn render_menu_item(item: &crate::menu::MenuItem, is_selected: bool) -> Line<'static> {
    let prefix = if is_selected { "▶ " } else { "  " };
    let base_style = if is_selected {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White)
    };

    match &item.item_type {
        MenuItemType::Button(_) => Line::styled(format!("{}{}", prefix, item.label), base_style),
        MenuItemType::Toggle { value, .. } => {
            let value_str = if *value { "ON" } else { "OFF" };
            let value_color = if *value { Color::Green } else { Color::Red };
            Line::from(vec![
                Span::styled(format!("{}{}: ", prefix, item.label), base_style),
                Span::styled(format!("< {} >", value_str), Style::default().fg(value_color).bold()),
            ])
        }
        MenuItemType::Cycle { options, current, .. } => Line::from(vec![
            Span::styled(format!("{}{}: ", prefix, item.label), base_style),
            Span::styled(format!("< {} >", options[*current]), Style::default().fg(Color::Cyan)),
        ]),
    }
}

/// Which menu item a terminal position lands on. Mirrors render_menu's row
/// layout: one spacing row, then two rows per item.
pub fn menu_item_at(area: Rect, col: u16, row: u16, item_count: usize) -> Option<usize> {
    let menu_area = center_rect(area, MENU_WIDTH, MENU_HEIGHT);
    let inner_x = menu_area.x + 1;
    let inner_y = menu_area.y + MENU_TITLE_HEIGHT + 1;
    let inner_w = MENU_WIDTH - 2;

    if col < inner_x || col >= inner_x + inner_w || row <= inner_y {
        return None;
    }
    let index = ((row - inner_y - 1) / 2) as usize;
    (index < item_count).then_some(index)
}

/// Render one frame of play: grid, tray, score panel, then the effect
/// overlays on top.
pub fn render_game(frame: &mut Frame, session: &Session) {
    let base = PlayLayout::new(&session.config, frame.area());
    let (cam_x, cam_y) = session.anim.camera();
    let layout = base.offset(
        (cam_x * CELL_W as f32).round() as i32,
        cam_y.round() as i32,
    );

    render_grid(frame, &layout, session);
    render_tray(frame, &layout, session);
    render_panel(frame, &layout, session);
    render_effects(frame, &layout, session);
    render_drag(frame, &layout, session);
}

fn render_grid(frame: &mut Frame, layout: &PlayLayout, session: &Session) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    frame.render_widget(block, layout.grid);

    let n = session.grid.size();
    let preview = session.preview();
    let pending = session.pending_clear();
    let flash = session
        .anim
        .clear_flash_remaining()
        .map(|t| 1.0 - t / session.config.effects.clear_flash_time);

    // The dragged shape's footprint at the snapped origin, when droppable.
    let ghost: Option<(&'static Shape, Theme, i32, i32)> = session.drag().and_then(|d| {
        let piece = session.tray.slot(d.slot)?;
        let (gx, gy) = preview.cell.filter(|_| preview.can_drop)?;
        Some((piece.shape(), piece.theme, gx, gy))
    });
    let ghost_covers = |x: usize, y: usize| {
        ghost.is_some_and(|(shape, _, gx, gy)| {
            let (sx, sy) = (x as i32 - gx, y as i32 - gy);
            sx >= 0 && sy >= 0 && shape.cell(sx as usize, sy as usize)
        })
    };
    let predicted_covers = |x: usize, y: usize| {
        preview
            .predicted
            .as_ref()
            .is_some_and(|(rows, cols)| rows[y] || cols[x])
    };

    let mut lines = Vec::with_capacity(n);
    for y in 0..n {
        let mut spans = Vec::with_capacity(n);
        for x in 0..n {
            let cell = session.grid.get(x as i32, y as i32).unwrap_or(Cell::Empty);
            let span = match cell {
                Cell::Filled(theme) => {
                    if let (Some(f), Some(mask)) = (flash, pending) {
                        if mask.contains(x, y) {
                            let c = blend(theme.fill, Color::Rgb(255, 255, 255), 0.35 + 0.6 * f);
                            Span::styled(BLOCK, Style::default().bg(c))
                        } else {
                            Span::styled(BLOCK, Style::default().bg(theme.fill))
                        }
                    } else if session.anim.pop_timer(x, y) > 0.0 {
                        let c = blend(theme.fill, Color::Rgb(255, 255, 255), 0.4);
                        Span::styled(BLOCK, Style::default().bg(c))
                    } else {
                        Span::styled(BLOCK, Style::default().bg(theme.fill))
                    }
                }
                Cell::Empty => {
                    if ghost_covers(x, y) {
                        let (_, theme, _, _) = ghost.unwrap();
                        Span::styled(BLOCK, Style::default().bg(fade(theme.fill, 0.45)))
                    } else if predicted_covers(x, y) {
                        Span::styled(BLOCK, Style::default().bg(Color::Rgb(60, 72, 96)))
                    } else {
                        Span::styled(EMPTY_CELL, Style::default().fg(Color::Rgb(60, 60, 70)))
                    }
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), layout.grid_inner);
}

fn render_tray(frame: &mut Frame, layout: &PlayLayout, session: &Session) {
    let dragging = session.drag().map(|d| d.slot);
    for (i, slot_rect) in layout.slots.iter().enumerate() {
        let Some(piece) = session.tray.slot(i) else {
            continue;
        };
        let border = if piece.used {
            Style::default().fg(Color::Rgb(50, 50, 58))
        } else {
            Style::default().fg(Color::Gray)
        };
        frame.render_widget(Block::default().borders(Borders::ALL).border_style(border), *slot_rect);

        // A used, dragged or homeward-bound piece is not sitting in its box.
        if piece.used || dragging == Some(i) || session.anim.is_returning(i) {
            continue;
        }
        let shape = piece.shape();
        let (ox, oy) = layout.shape_origin_in_slot(i, shape);
        for (sx, sy) in shape.filled_cells() {
            draw_cell_block(
                frame,
                (ox + sx as u16 * CELL_W) as i32,
                (oy + sy as u16) as i32,
                piece.theme.fill,
            );
        }
    }
}

fn render_panel(frame: &mut Frame, layout: &PlayLayout, session: &Session) {
    let block = Block::default()
        .title(" SCORE ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(layout.panel);
    frame.render_widget(block, layout.panel);

    let stats = &session.stats;
    let mult = stats.last_move_mult;
    let lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::styled(" Score  ", Style::default().fg(Color::Gray)),
            Span::styled(stats.score.to_string(), Style::default().fg(Color::White).bold()),
        ]),
        Line::from(vec![
            Span::styled(" Best   ", Style::default().fg(Color::Gray)),
            Span::styled(stats.high_score.to_string(), Style::default().fg(Color::Cyan)),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled(" Combo  ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}  (x{:.0})", stats.combo, mult),
                if stats.combo > 0 {
                    Style::default().fg(Color::Yellow).bold()
                } else {
                    Style::default().fg(Color::DarkGray)
                },
            ),
        ]),
        Line::from(vec![
            Span::styled(" Peak   ", Style::default().fg(Color::Gray)),
            Span::styled(stats.highest_combo.to_string(), Style::default().fg(Color::Magenta)),
        ]),
        Line::raw(""),
        Line::raw(""),
        Line::styled(" mouse  drag & drop", Style::default().fg(Color::DarkGray)),
        Line::styled(" esc    menu", Style::default().fg(Color::DarkGray)),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_effects(frame: &mut Frame, layout: &PlayLayout, session: &Session) {
    use crate::effects::Effect;

    for effect in session.anim.effects() {
        match effect {
            Effect::Particle { x, y, life, life0, size, color, .. } => {
                let (sx, sy) = layout.to_screen(*x, *y);
                let symbol = if *size > 0.14 { "•" } else { "·" };
                draw_text(frame, sx, sy, symbol, Style::default().fg(fade(*color, life / life0)));
            }
            Effect::BonusPopup { x, y, life, life0, points, mult, theme, .. } => {
                let text = if *mult > 1.05 {
                    format!("+{} x{:.0}", points, mult)
                } else {
                    format!("+{}", points)
                };
                let (sx, sy) = layout.to_screen(*x, *y);
                let style = Style::default().fg(fade(theme.fill, life / life0)).bold();
                draw_text(frame, sx - text.len() as i32, sy, &text, style);
            }
            Effect::ComboPopup { x, y, scale, text, theme, .. } => {
                let (sx, sy) = layout.to_screen(*x, *y);
                let style = if *scale > 0.9 {
                    Style::default().fg(theme.fill).bold()
                } else {
                    Style::default().fg(fade(theme.fill, *scale))
                };
                draw_text(frame, sx, sy, text, style);
            }
            Effect::Return { slot, from, t } => {
                render_returning(frame, layout, session, *slot, *from, *t);
            }
            Effect::ClearFlash { .. } | Effect::Shake { .. } => {}
        }
    }
}

/// The rejected piece on its way home, interpolated from the release point
/// to its tray slot center.
fn render_returning(
    frame: &mut Frame,
    layout: &PlayLayout,
    session: &Session,
    slot: usize,
    from: (f32, f32),
    t: f32,
) {
    let Some(piece) = session.tray.slot(slot) else {
        return;
    };
    let shape = piece.shape();
    let p = (1.0 - t / session.config.effects.return_time).clamp(0.0, 1.0);
    let (tx, ty) = layout.slot_center_grid(slot);
    let cx = from.0 + (tx - from.0) * p;
    let cy = from.1 + (ty - from.1) * p;
    draw_shape_at(
        frame,
        layout,
        shape,
        cx - shape.w as f32 * 0.5,
        cy - shape.h as f32 * 0.5,
        fade(piece.theme.fill, 0.75),
    );
}

fn render_drag(frame: &mut Frame, layout: &PlayLayout, session: &Session) {
    let Some(drag) = session.drag() else {
        return;
    };
    let Some(piece) = session.tray.slot(drag.slot) else {
        return;
    };
    let (px, py) = session.pointer();
    let color = if session.preview().can_drop {
        piece.theme.fill
    } else {
        fade(piece.theme.fill, 0.45)
    };
    // The grabbed cell's center rides under the pointer.
    draw_shape_at(
        frame,
        layout,
        piece.shape(),
        px - drag.grab.0 as f32 - 0.5,
        py - drag.grab.1 as f32 - 0.5,
        color,
    );
}

/// Game-over card with name entry and the persisted table, over the frozen
/// play field.
pub fn render_game_over(frame: &mut Frame, session: &Session, name: &str, settings: &Settings) {
    let area = frame.area();
    let height = 12 + settings.high_scores.len() as u16;
    let card = center_rect(area, 44, height);
    frame.render_widget(Clear, card);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let mut lines = vec![
        Line::raw(""),
        Line::styled("GAME OVER", Style::default().fg(Color::Red).bold()),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Score ", Style::default().fg(Color::Gray)),
            Span::styled(session.stats.score.to_string(), Style::default().fg(Color::White).bold()),
            Span::styled("   Best combo ", Style::default().fg(Color::Gray)),
            Span::styled(
                session.stats.highest_combo.to_string(),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Name: ", Style::default().fg(Color::Gray)),
            Span::styled(name.to_string(), Style::default().fg(Color::Green).bold()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ]),
        Line::styled("Enter Save   Esc Skip", Style::default().fg(Color::DarkGray)),
        Line::raw(""),
    ];
    lines.extend(score_table_lines(settings));
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_score_table(frame: &mut Frame, area: Rect, settings: &Settings) {
    if settings.high_scores.is_empty() || area.height < 4 {
        return;
    }
    let block = Block::default()
        .title(" BEST GAMES ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(score_table_lines(settings)).alignment(Alignment::Center),
        inner,
    );
}

fn score_table_lines(settings: &Settings) -> Vec<Line<'static>> {
    settings
        .high_scores
        .iter()
        .enumerate()
        .map(|(i, e)| {
            Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:<5} ", e.name), Style::default().fg(Color::White)),
                Span::styled(format!("{:>7} ", e.score), Style::default().fg(Color::Cyan)),
                Span::styled(format!("c{:<3}", e.highest_combo), Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!(" {}x{}/{}", e.grid_size, e.grid_size, e.tray_count),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect()
}

/// Draw a shape with its origin at fractional grid-cell coordinates.
fn draw_shape_at(frame: &mut Frame, layout: &PlayLayout, shape: &Shape, x: f32, y: f32, color: Color) {
    for (sx, sy) in shape.filled_cells() {
        let (col, row) = layout.to_screen(x + sx as f32, y + sy as f32);
        draw_cell_block(frame, col, row, color);
    }
}

/// One grid cell as a 2-column block painted straight into the buffer.
fn draw_cell_block(frame: &mut Frame, col: i32, row: i32, color: Color) {
    let area = frame.area();
    let buf = frame.buffer_mut();
    for dx in 0..CELL_W as i32 {
        let (x, y) = (col + dx, row);
        if x >= area.x as i32
            && x < (area.x + area.width) as i32
            && y >= area.y as i32
            && y < (area.y + area.height) as i32
        {
            if let Some(cell) = buf.cell_mut((x as u16, y as u16)) {
                cell.set_symbol(" ");
                cell.set_bg(color);
            }
        }
    }
}

/// Free-position text, clipped to the frame.
fn draw_text(frame: &mut Frame, col: i32, row: i32, text: &str, style: Style) {
    let area = frame.area();
    if row < area.y as i32 || row >= (area.y + area.height) as i32 {
        return;
    }
    let buf = frame.buffer_mut();
    let mut x = col;
    for ch in text.chars() {
        if x >= area.x as i32 && x < (area.x + area.width) as i32 {
            if let Some(cell) = buf.cell_mut((x as u16, row as u16)) {
                cell.set_char(ch);
                cell.set_style(style);
            }
        }
        x += 1;
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Linear blend from `a` toward `b`; passes non-RGB colors through.
fn blend(a: Color, b: Color, f: f32) -> Color {
    match (a, b) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * f) as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ => a,
    }
}

fn fade(color: Color, f: f32) -> Color {
    blend(Color::Rgb(0, 0, 0), color, f.clamp(0.0, 1.0))
}
