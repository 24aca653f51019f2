use clap::builder::styling::{AnsiColor, Effects, Styles};
use console::{style, StyledObject};

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Terminal styles shared by the help output and the command handlers.
pub trait AnsiStyles {
    /// Styles a literal such as a command, flag or value.
    fn literal(&self) -> StyledObject<&str>;

    /// Styles a section header.
    fn header(&self) -> StyledObject<&str>;

    /// Styles a placeholder or secondary detail.
    fn placeholder(&self) -> StyledObject<&str>;
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl AnsiStyles for str {
    fn literal(&self) -> StyledObject<&str> {
        style(self).bold()
    }

    fn header(&self) -> StyledObject<&str> {
        style(self).yellow().bold().underlined()
    }

    fn placeholder(&self) -> StyledObject<&str> {
        style(self).dim()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Help styles for the `execbox` command.
pub fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD | Effects::UNDERLINE)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD | Effects::UNDERLINE)
        .literal(Effects::BOLD.into())
        .placeholder(Effects::DIMMED.into())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}
