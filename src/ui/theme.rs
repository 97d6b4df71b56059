//! Theme selection

use iced::Theme;

use crate::settings::ThemeMode;

/// Whether the given mode ends up dark, asking the OS for [`ThemeMode::System`]
pub fn is_dark(mode: ThemeMode) -> bool {
    match mode {
        ThemeMode::Light => false,
        ThemeMode::Dark => true,
        // Detection errors fall back to light, matching most desktops
        ThemeMode::System => matches!(dark_light::detect(), Ok(dark_light::Mode::Dark)),
    }
}

pub fn iced_theme(mode: ThemeMode) -> Theme {
    if is_dark(mode) {
        Theme::Dark
    } else {
        Theme::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_modes_ignore_system() {
        assert!(!is_dark(ThemeMode::Light));
        assert!(is_dark(ThemeMode::Dark));
    }
}
