use colored::Colorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);
static VERBOSE: AtomicBool = AtomicBool::new(false);
static DEBUG: AtomicBool = AtomicBool::new(false);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Initialize color handling. Must run before any output.
pub fn init_colors() {
    if std::env::var_os("NO_COLOR").is_some() || !atty::is(atty::Stream::Stdout) {
        colored::control::set_override(false);
    }
}

pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn set_debug(debug: bool) {
    DEBUG.store(debug, Ordering::Relaxed);
}

pub fn is_debug() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

pub fn mark_interrupted() {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

pub fn header(title: &str) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    println!("\n{}", title.bold().underline());
}

pub fn success(msg: &str) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn info(msg: &str) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    println!("{} {}", "ℹ".blue().bold(), msg);
}

/// Verbose-only detail line.
pub fn verbose(msg: &str) {
    if VERBOSE.load(Ordering::Relaxed) && !QUIET.load(Ordering::Relaxed) {
        println!("{} {}", "→".bright_black(), msg.bright_black());
    }
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

pub fn hint(msg: &str) {
    eprintln!("{} {}", "↳".cyan().bold(), msg);
}

pub fn separator() {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    let width = terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| (w as usize).min(72))
        .unwrap_or(60);
    println!("{}", "─".repeat(width).bright_black());
}

pub fn keyval(key: &str, val: &str) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    println!("{}: {}", key.bold(), val);
}

pub fn indent(msg: &str, level: usize) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    let spaces = " ".repeat(level * 2);
    println!("{}{}", spaces, msg);
}

pub fn prompt_yes_no(question: &str) -> bool {
    print!("{} {} [Y/n] ", "?".yellow().bold(), question);

    // Attempt to flush stdout, default to true if terminal is broken
    if let Err(e) = io::stdout().flush() {
        eprintln!("\nWarning: Failed to flush terminal: {}", e);
        return true;
    }

    let mut input = String::new();

    match io::stdin().read_line(&mut input) {
        Ok(_) => {
            let input = input.trim().to_lowercase();

            if input.is_empty() {
                return true;
            }

            input == "y" || input == "yes"
        }
        Err(e) => {
            eprintln!("\nWarning: Failed to read input: {}", e);
            true // Fail-open for non-interactive use
        }
    }
}
