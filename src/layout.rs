//! Pure screen geometry for the play view.
//!
//! Everything here is a function of the session configuration and the
//! terminal area; nothing is cached or mutated. One grid cell maps to a
//! 2x1 block of terminal cells.

use crate::config::SessionConfig;
use crate::shape::{Shape, SHAPE_MAX};
use ratatui::layout::Rect;

/// Terminal columns per grid cell.
pub const CELL_W: u16 = 2;
/// Outer tray slot box, sized for the largest footprint plus a border.
pub const TRAY_BOX_W: u16 = SHAPE_MAX as u16 * CELL_W + 2;
pub const TRAY_BOX_H: u16 = SHAPE_MAX as u16 + 2;
pub const TRAY_GAP: u16 = 2;
/// Score panel to the right of the grid.
pub const PANEL_W: u16 = 24;

/// Where everything sits on screen for one frame.
#[derive(Debug, Clone)]
pub struct PlayLayout {
    /// Grid including its border.
    pub grid: Rect,
    /// Grid cells only.
    pub grid_inner: Rect,
    pub panel: Rect,
    /// Outer tray slot boxes, left to right.
    pub slots: Vec<Rect>,
}

impl PlayLayout {
    pub fn new(config: &SessionConfig, area: Rect) -> Self {
        let n = config.grid_size as u16;
        let tray = config.tray_count as u16;
        let grid_w = n * CELL_W + 2;
        let grid_h = n + 2;
        let tray_w = tray * TRAY_BOX_W + tray.saturating_sub(1) * TRAY_GAP;

        let total_w = grid_w.max(tray_w) + 1 + PANEL_W;
        let total_h = grid_h + 1 + TRAY_BOX_H;
        let x0 = area.x + area.width.saturating_sub(total_w) / 2;
        let y0 = area.y + area.height.saturating_sub(total_h) / 2;

        let tray_y = y0 + grid_h + 1;
        let slots = (0..tray)
            .map(|i| Rect::new(x0 + i * (TRAY_BOX_W + TRAY_GAP), tray_y, TRAY_BOX_W, TRAY_BOX_H))
            .collect();

        Self {
            grid: Rect::new(x0, y0, grid_w, grid_h),
            grid_inner: Rect::new(x0 + 1, y0 + 1, n * CELL_W, n),
            panel: Rect::new(x0 + grid_w.max(tray_w) + 1, y0, PANEL_W, grid_h),
            slots,
        }
    }

    /// The same layout nudged by a camera shake offset.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self {
            grid: shift(self.grid, dx, dy),
            grid_inner: shift(self.grid_inner, dx, dy),
            panel: shift(self.panel, dx, dy),
            slots: self.slots.iter().map(|r| shift(*r, dx, dy)).collect(),
        }
    }

    /// Terminal position to fractional grid-cell coordinates. The result can
    /// lie outside `[0, grid_size)`; callers clip as needed.
    pub fn to_grid(&self, col: u16, row: u16) -> (f32, f32) {
        let x = (col as f32 - self.grid_inner.x as f32 + 0.5) / CELL_W as f32;
        let y = row as f32 - self.grid_inner.y as f32 + 0.5;
        (x, y)
    }

    /// Fractional grid-cell coordinates to the terminal column/row of the
    /// cell's left character.
    pub fn to_screen(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (self.grid_inner.x as f32 + x * CELL_W as f32).round() as i32,
            (self.grid_inner.y as f32 + y).round() as i32,
        )
    }

    /// Which tray slot the position falls in, with the click offset local to
    /// the slot's interior.
    pub fn slot_at(&self, col: u16, row: u16) -> Option<(usize, u16, u16)> {
        self.slots.iter().enumerate().find_map(|(i, r)| {
            let inner = inner_rect(*r);
            (col >= inner.x
                && col < inner.x + inner.width
                && row >= inner.y
                && row < inner.y + inner.height)
                .then(|| (i, col - inner.x, row - inner.y))
        })
    }

    /// Top-left terminal position of a shape drawn centered in a slot box.
    pub fn shape_origin_in_slot(&self, slot: usize, shape: &Shape) -> (u16, u16) {
        let inner = inner_rect(self.slots[slot]);
        (
            inner.x + (SHAPE_MAX - shape.w) as u16,
            inner.y + ((SHAPE_MAX - shape.h) / 2) as u16,
        )
    }

    /// Center of a tray slot in grid-cell coordinates; the target of the
    /// return-to-tray animation.
    pub fn slot_center_grid(&self, slot: usize) -> (f32, f32) {
        let r = self.slots[slot];
        self.to_grid(r.x + r.width / 2, r.y + r.height / 2)
    }
}

fn shift(r: Rect, dx: i32, dy: i32) -> Rect {
    Rect::new(
        (r.x as i32 + dx).max(0) as u16,
        (r.y as i32 + dy).max(0) as u16,
        r.width,
        r.height,
    )
}

fn inner_rect(r: Rect) -> Rect {
    Rect::new(r.x + 1, r.y + 1, r.width.saturating_sub(2), r.height.saturating_sub(2))
}

/// Which shape cell a click inside a tray slot grabbed.
///
/// The click lands on a filled cell of the centered footprint when it can;
/// otherwise the nearest filled cell wins (squared distance in terminal
/// columns, rows weighted double to stay square).
pub fn grab_cell(shape: &Shape, local_x: u16, local_y: u16) -> (usize, usize) {
    let ox = (SHAPE_MAX - shape.w) as i32;
    let oy = ((SHAPE_MAX - shape.h) / 2) as i32;

    let sx = (local_x as i32 - ox).div_euclid(CELL_W as i32);
    let sy = local_y as i32 - oy;
    if sx >= 0 && sy >= 0 && shape.cell(sx as usize, sy as usize) {
        return (sx as usize, sy as usize);
    }

    let mut best = (0, 0);
    let mut best_d2 = i32::MAX;
    for (x, y) in shape.filled_cells() {
        let cx = ox + x as i32 * CELL_W as i32 + 1;
        let cy = oy + y as i32;
        let dx = cx - local_x as i32;
        let dy = (cy - local_y as i32) * CELL_W as i32;
        let d2 = dx * dx + dy * dy;
        if d2 < best_d2 {
            best_d2 = d2;
            best = (x, y);
        }
    }
    best
}
