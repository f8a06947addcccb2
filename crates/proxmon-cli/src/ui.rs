use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::InquireError;

// ---------------------------------------------------------------------------
// Colored message helpers
// ---------------------------------------------------------------------------

fn prefix() -> String {
    "[proxmon]".bold().cyan().to_string()
}

/// Print an informational message: [proxmon] message
pub fn info(msg: &str) {
    println!("{} {}", prefix(), msg);
}

/// Print a success message: [proxmon] message (in green)
pub fn success(msg: &str) {
    println!("{} {}", prefix(), msg.green());
}

/// Print an error message: [proxmon] message (in red)
pub fn error(msg: &str) {
    eprintln!("{} {}", "[proxmon]".bold().red(), msg.red());
}

/// Print a warning message: [proxmon] message (in yellow)
pub fn warn(msg: &str) {
    println!("{} {}", prefix(), msg.yellow());
}

/// Print a bold section title above a table.
pub fn title(text: &str) {
    println!("{}", text.bold());
}

/// Clear the terminal and move the cursor home.
pub fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
}

// ---------------------------------------------------------------------------
// Interactive prompts
// ---------------------------------------------------------------------------

/// Read one console command. `None` when the user hits Ctrl-C / Esc.
pub fn prompt_command() -> Option<String> {
    match inquire::Text::new(":").prompt() {
        Ok(line) => Some(line),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => None,
        Err(e) => {
            error(&format!("Prompt failed: {}", e));
            None
        }
    }
}

/// Free-text input; an interrupted prompt reads as empty.
pub fn prompt_text(msg: &str) -> String {
    inquire::Text::new(msg)
        .prompt()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Free-text input pre-filled with `current`.
pub fn prompt_text_with_default(msg: &str, current: &str) -> Option<String> {
    inquire::Text::new(msg)
        .with_default(current)
        .prompt()
        .ok()
        .map(|s| s.trim().to_string())
}

/// Hidden single-entry password input.
pub fn prompt_password(msg: &str) -> Option<String> {
    inquire::Password::new(msg)
        .without_confirmation()
        .prompt()
        .ok()
}

/// Numeric input with a default.
pub fn prompt_number(msg: &str, current: u32) -> Option<u32> {
    inquire::CustomType::<u32>::new(msg)
        .with_default(current)
        .with_error_message("Please enter a whole number")
        .prompt()
        .ok()
}

/// Show an interactive confirmation prompt. Returns true if confirmed.
pub fn confirm(msg: &str) -> bool {
    inquire::Confirm::new(msg)
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Spinners
// ---------------------------------------------------------------------------

/// Create and start a spinner with the given message.
/// Call `.finish_with_message()` or `.finish_and_clear()` when done.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .expect("invalid spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
