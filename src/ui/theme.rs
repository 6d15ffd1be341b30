use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for CLI output. Every field is unstyled when color is off.
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub muted: Style,
    /// Tag names in listings
    pub tag: Style,
    /// Resource paths in listings
    pub path: Style,
}

impl Theme {
    /// Color only when stdout is a terminal and `NO_COLOR` is unset
    pub fn detect() -> Self {
        let colored = std::env::var_os("NO_COLOR").is_none() && console::Term::stdout().is_term();
        Self::new(colored)
    }

    pub fn new(colored: bool) -> Self {
        let pick = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: pick(Style::new().cyan().bold()),
            success: pick(Style::new().green().bold()),
            error: pick(Style::new().red().bold()),
            warn: pick(Style::new().yellow().bold()),
            info: pick(Style::new().magenta()),
            dim: pick(Style::new().white().dimmed()),
            muted: pick(Style::new().bright_black()),
            tag: pick(Style::new().yellow()),
            path: pick(Style::new().blue().underline()),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
