pub mod calendar;
pub mod config;
pub mod exercise;
pub mod history;
pub mod session;
pub mod template;

use colored::Colorize;

/// Converts a 1-based index from the command line into a position in a list
/// of `len` items, printing an error when it is out of range.
pub(crate) fn resolve_index(what: &str, idx: usize, len: usize) -> Option<usize> {
    if idx == 0 || idx > len {
        println!("{} no {} at index {}", "error:".red().bold(), what, idx);
        return None;
    }
    Some(idx - 1)
}

pub(crate) fn no_session() {
    println!(
        "{} no active workout, start one with `curls session start`",
        "error:".red().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_one_based() {
        assert_eq!(resolve_index("set", 1, 3), Some(0));
        assert_eq!(resolve_index("set", 3, 3), Some(2));
        assert_eq!(resolve_index("set", 0, 3), None);
        assert_eq!(resolve_index("set", 4, 3), None);
        assert_eq!(resolve_index("set", 1, 0), None);
    }
}
