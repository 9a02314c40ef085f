//! Interactive yes/no confirmation.

use std::io::{self, BufRead, Write};

pub trait Confirm {
    /// Ask `question` and return whether the answer was affirmative.
    fn confirm(&self, question: &str) -> io::Result<bool>;
}

/// Reads a single answer line from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        print!("{question} (y/n): ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(is_affirmative(&input))
    }
}

/// Accepts every prompt without reading input (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, question: &str) -> io::Result<bool> {
        println!("{question} (y/n): y");
        Ok(true)
    }
}

/// Only a lone `y` (either case) counts as consent.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
