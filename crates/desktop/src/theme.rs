use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use crate::settings::Appearance;

/// Resolve the iced Theme from appearance + high_contrast settings.
pub fn resolve_theme(appearance: Appearance, high_contrast: bool) -> Theme {
    let palette = palette_for(is_dark(appearance), high_contrast);
    Theme::custom("FaceLens", palette)
}

fn is_dark(appearance: Appearance) -> bool {
    match appearance {
        Appearance::Dark => true,
        Appearance::Light => false,
        Appearance::System => detect_system_dark_mode(),
    }
}

fn palette_for(is_dark: bool, high_contrast: bool) -> Palette {
    match (is_dark, high_contrast) {
        (true, false) => dark_palette(),
        (false, false) => light_palette(),
        (true, true) => high_contrast_dark_palette(),
        (false, true) => high_contrast_light_palette(),
    }
}

/// Secondary text: the palette's text color at reduced opacity.
pub fn muted_color(theme: &Theme) -> Color {
    Color {
        a: 0.65,
        ..theme.palette().text
    }
}

/// Background of panels drawn over the window background.
pub fn surface_color(theme: &Theme) -> Color {
    let bg = theme.palette().background;
    let shift = if luma(bg) > 0.5 { -0.04 } else { 0.08 };
    Color {
        r: (bg.r + shift).clamp(0.0, 1.0),
        g: (bg.g + shift).clamp(0.0, 1.0),
        b: (bg.b + shift).clamp(0.0, 1.0),
        a: 1.0,
    }
}

fn luma(c: Color) -> f32 {
    c.r * 0.299 + c.g * 0.587 + c.b * 0.114
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x1c, 0x1c, 0x1e),
        text: color!(0xcc, 0xcc, 0xcc),
        primary: color!(0x5e, 0x9f, 0xf5),
        success: color!(0x30, 0xd1, 0x58),
        warning: color!(0xff, 0xcc, 0x00),
        danger: color!(0xff, 0x45, 0x3a),
    }
}

fn light_palette() -> Palette {
    Palette {
        background: color!(0xf5, 0xf5, 0xf7),
        text: color!(0x1d, 0x1d, 0x1f),
        primary: color!(0x34, 0x78, 0xf6),
        success: color!(0x34, 0xc7, 0x59),
        warning: color!(0xff, 0x9f, 0x0a),
        danger: color!(0xff, 0x3b, 0x30),
    }
}

fn high_contrast_dark_palette() -> Palette {
    Palette {
        background: color!(0x00, 0x00, 0x00),
        text: color!(0xff, 0xff, 0xff),
        primary: color!(0x6c, 0xb4, 0xff),
        success: color!(0x30, 0xd1, 0x58),
        warning: color!(0xff, 0xd6, 0x0a),
        danger: color!(0xff, 0x45, 0x3a),
    }
}

fn high_contrast_light_palette() -> Palette {
    Palette {
        background: color!(0xff, 0xff, 0xff),
        text: color!(0x00, 0x00, 0x00),
        primary: color!(0x00, 0x50, 0xd0),
        success: color!(0x24, 0x8a, 0x3d),
        warning: color!(0xb2, 0x5c, 0x00),
        danger: color!(0xd7, 0x00, 0x15),
    }
}

fn detect_system_dark_mode() -> bool {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .map(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .trim()
                    .eq_ignore_ascii_case("dark")
            })
            .unwrap_or(true)
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_appearance_ignores_system() {
        assert!(is_dark(Appearance::Dark));
        assert!(!is_dark(Appearance::Light));
    }

    #[test]
    fn test_high_contrast_uses_pure_background() {
        assert_eq!(palette_for(true, true).background, Color::BLACK);
        assert_eq!(palette_for(false, true).background, Color::WHITE);
    }

    #[test]
    fn test_surface_is_lifted_on_dark_and_lowered_on_light() {
        let dark = resolve_theme(Appearance::Dark, false);
        assert!(luma(surface_color(&dark)) > luma(dark.palette().background));

        let light = resolve_theme(Appearance::Light, false);
        assert!(luma(surface_color(&light)) < luma(light.palette().background));
    }
}
