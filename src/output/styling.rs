use std::fmt::Display;

use console::{style, StyledObject};

/// A target still being fetched.
pub fn pending(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

/// A target fully drained.
pub fn done(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn dim(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

/// Section title on stderr reports.
pub fn heading(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().underlined()
}

pub fn brand(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}
