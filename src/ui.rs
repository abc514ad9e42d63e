use console::{style, StyledObject, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// ── Terminal helpers ──────────────────────────────────────────────────────────

fn term_width() -> usize {
    Term::stdout().size().1.max(60) as usize
}

fn rule() {
    println!("{}", style("─".repeat(term_width().min(52))).dim());
}

pub fn clear_screen() {
    let _ = Term::stdout().clear_screen();
}

// ── Banner ────────────────────────────────────────────────────────────────────

pub fn print_banner() {
    clear_screen();

    let logo = [
        r"      /\       ",
        r"     /  \      ",
        r"    /\   \     ",
        r"   /  __  \    ",
        r"  /  (  )  \   ",
        r" / __|  |__\  ",
    ];

    println!();
    for line in &logo {
        println!("   {}", style(line).cyan().bold());
    }
    println!();
    println!(
        "{}",
        style(concat!("   Arch Linux Installer  ·  v", env!("CARGO_PKG_VERSION")))
            .dim()
            .italic()
    );
    println!();
    rule();
    println!();
}

// ── Step header ───────────────────────────────────────────────────────────────

/// Prints a visually distinct numbered step header.
pub fn print_step(step: usize, total: usize, title: &str) {
    println!();
    let tag = style(format!(" {}/{} ", step, total)).black().on_cyan().bold();
    let heading = style(format!("  {}", title)).white().bold();
    println!("{}{}", tag, heading);
    rule();
}

/// Prints a section heading without a step counter.
pub fn print_heading(title: &str) {
    println!();
    println!("  {}", style(title).white().bold());
    rule();
}

// ── Feedback messages ─────────────────────────────────────────────────────────

fn marked(mark: StyledObject<&str>, msg: impl std::fmt::Display) -> String {
    format!("  {}  {}", mark.bold(), msg)
}

pub fn print_success(msg: &str) {
    println!("{}", marked(style("✓").green(), style(msg).green()));
}

pub fn print_info(msg: &str) {
    println!("{}", marked(style("→").blue(), msg));
}

/// Non-fatal notice.
pub fn print_warning(msg: &str) {
    println!("{}", marked(style("⚠").yellow(), style(msg).yellow()));
}

/// Written to stderr so it survives `> /dev/null`.
pub fn print_error(msg: &str) {
    eprintln!("{}", marked(style("✗").red(), style(msg).red()));
}

/// Dimmed, indented block for captured command output.
pub fn print_detail(text: &str) {
    for line in text.lines() {
        eprintln!("     {}", style(line).dim());
    }
}

// ── Summary box ───────────────────────────────────────────────────────────────

/// Renders a titled key/value box; keys are padded to the longest one.
///
/// ```text
/// ┌─ Partition Layout ─────────────────────┐
/// │  EFI (FAT32)   /dev/sda1  1MiB → 513MiB
/// │  Swap          /dev/sda2  8192 MiB
/// │  Root          /dev/sda3  8705MiB → 100%
/// └────────────────────────────────────────┘
/// ```
pub fn print_kv_box(title: &str, rows: &[(&str, &str)]) {
    const INNER: usize = 40;

    let key_width = rows
        .iter()
        .map(|(k, _)| k.chars().count())
        .max()
        .unwrap_or(0)
        + 2;
    let fill = INNER.saturating_sub(title.chars().count() + 3);

    println!("  ┌─ {} {}┐", style(title).white().bold(), style("─".repeat(fill)).dim());
    for &(key, val) in rows {
        println!(
            "  │  {}{}",
            style(format!("{:<width$}", key, width = key_width)).dim(),
            style(val).white().bold()
        );
    }
    println!("  └{}┘", style("─".repeat(INNER)).dim());
}

// ── Spinner ───────────────────────────────────────────────────────────────────

/// Returns a running braille spinner. Call `pb.finish_and_clear()` when done.
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("  {spinner:.cyan.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
