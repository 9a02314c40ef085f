//! Symbol-prefixed status lines printed to stdout.
//!
//! These are the human-facing progress lines of both subcommands. Structured
//! diagnostics go through `tracing` instead.

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

const RULE_WIDTH: usize = 70;

pub fn ok(msg: impl AsRef<str>) {
    println!("{GREEN}✓ {}{RESET}", msg.as_ref());
}

pub fn fail(msg: impl AsRef<str>) {
    println!("{RED}✗ {}{RESET}", msg.as_ref());
}

pub fn warn(msg: impl AsRef<str>) {
    println!("{YELLOW}⚠ {}{RESET}", msg.as_ref());
}

pub fn step(msg: impl AsRef<str>) {
    println!("{CYAN}→ {}{RESET}", msg.as_ref());
}

/// Indented detail line under a status line.
pub fn detail(msg: impl AsRef<str>) {
    println!("  {}", msg.as_ref());
}

pub fn rule() {
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Title framed by two rules.
pub fn banner(title: impl AsRef<str>) {
    rule();
    println!("{}", title.as_ref());
    rule();
}
