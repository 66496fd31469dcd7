//! Main menu with settings configuration

use crate::config::{GRID_SIZES, TRAY_MAX};
use crate::session::StartMode;
use crate::settings::Settings;

/// Menu state
#[derive(Debug, Clone)]
pub struct Menu {
    pub selected: usize,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone)]
pub struct MenuItem {
    pub label: String,
    pub item_type: MenuItemType,
}

#[derive(Debug, Clone)]
pub enum MenuItemType {
    /// Simple button that triggers an action
    Button(MenuAction),
    /// Toggle boolean setting
    Toggle { key: SettingKey, value: bool },
    /// Cycle through options
    Cycle { key: SettingKey, options: Vec<String>, current: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    StartGame(StartMode),
    Quit,
}

/// Setting keys for identifying which setting to modify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    TrayCount,
    GridSize,
    Sound,
}

impl Menu {
    /// Build the menu with value labels read from the live settings.
    pub fn new(settings: &Settings) -> Self {
        let tray_options: Vec<String> = (1..=TRAY_MAX).map(|n| n.to_string()).collect();
        let grid_options: Vec<String> = GRID_SIZES.iter().map(|n| format!("{n}x{n}")).collect();
        let grid_current = GRID_SIZES
            .iter()
            .position(|&n| n == settings.grid_size)
            .unwrap_or(0);

        Self {
            selected: 0,
            items: vec![
                MenuItem {
                    label: "New Game".to_string(),
                    item_type: MenuItemType::Button(MenuAction::StartGame(StartMode::Empty)),
                },
                MenuItem {
                    label: "New Game - Scramble".to_string(),
                    item_type: MenuItemType::Button(MenuAction::StartGame(StartMode::Scramble)),
                },
                MenuItem {
                    label: "Tray Pieces".to_string(),
                    item_type: MenuItemType::Cycle {
                        key: SettingKey::TrayCount,
                        options: tray_options,
                        current: settings.tray_count.saturating_sub(1),
                    },
                },
                MenuItem {
                    label: "Grid Size".to_string(),
                    item_type: MenuItemType::Cycle {
                        key: SettingKey::GridSize,
                        options: grid_options,
                        current: grid_current,
                    },
                },
                MenuItem {
                    label: "Sound".to_string(),
                    item_type: MenuItemType::Toggle {
                        key: SettingKey::Sound,
                        value: settings.sound_on,
                    },
                },
                MenuItem {
                    label: "Quit".to_string(),
                    item_type: MenuItemType::Button(MenuAction::Quit),
                },
            ],
        }
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    pub fn move_down(&mut self) {
        if self.selected < self.items.len() - 1 {
            self.selected += 1;
        } else {
            self.selected = 0;
        }
    }

    /// Handle left for cycling options backwards
    pub fn adjust_left(&mut self, settings: &mut Settings) {
        if let Some(item) = self.items.get_mut(self.selected) {
            match &mut item.item_type {
                MenuItemType::Toggle { key, value } => {
                    *value = !*value;
                    apply_setting(settings, *key, *value as usize);
                }
                MenuItemType::Cycle { key, options, current } => {
                    *current = if *current == 0 { options.len() - 1 } else { *current - 1 };
                    apply_setting(settings, *key, *current);
                }
                _ => {}
            }
        }
    }

    pub fn adjust_right(&mut self, settings: &mut Settings) {
        if let Some(item) = self.items.get_mut(self.selected) {
            match &mut item.item_type {
                MenuItemType::Toggle { key, value } => {
                    *value = !*value;
                    apply_setting(settings, *key, *value as usize);
                }
                MenuItemType::Cycle { key, options, current } => {
                    *current = (*current + 1) % options.len();
                    apply_setting(settings, *key, *current);
                }
                _ => {}
            }
        }
    }

    /// Get the action for the current selection (for Button types)
    pub fn select(&self) -> Option<MenuAction> {
        if let Some(item) = self.items.get(self.selected) {
            if let MenuItemType::Button(action) = &item.item_type {
                return Some(*action);
            }
        }
        None
    }
}

/// Apply a setting change; `value` is the new cycle index or toggle state.
fn apply_setting(settings: &mut Settings, key: SettingKey, value: usize) {
    match key {
        SettingKey::TrayCount => settings.tray_count = value + 1,
        SettingKey::GridSize => settings.grid_size = GRID_SIZES[value],
        SettingKey::Sound => settings.sound_on = value != 0,
    }
}
