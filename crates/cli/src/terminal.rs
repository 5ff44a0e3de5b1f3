//! Terminal rendering of notices and confirmation prompts.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use storefront::notice::{Confirm, Notice, Notifier, Severity};
use storefront_core::Product;

/// Tag printed in front of a notice title.
const fn tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "[ok]",
        Severity::Error => "[error]",
        Severity::Warning => "[warning]",
    }
}

/// Render a notice as one or two lines of text.
#[must_use]
pub fn render(notice: &Notice) -> String {
    let mut out = format!("{} {}", tag(notice.severity()), notice.title());
    if let Some(text) = notice.text() {
        out.push_str("\n    ");
        out.push_str(&text);
    }
    out
}

/// Render a product as a listing row.
#[must_use]
pub fn product_line(product: &Product) -> String {
    format!(
        "{:>4}  {:<28} {:>10}  [{}]",
        product.id,
        product.title,
        product.price.display_inr(),
        product.category
    )
}

/// Parse a y/N answer. Anything but an explicit yes is a no.
#[must_use]
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prints notices to stdout.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    #[allow(clippy::print_stdout)]
    fn notify(&self, notice: &Notice) {
        println!("{}", render(notice));
    }
}

/// Asks questions on stdout and reads the answer from stdin.
pub struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, question: &Notice) -> bool {
        let (yes, no) = question.buttons().unwrap_or(("Yes", "No"));
        let prompt = format!("{}\n    {yes} [y] / {no} [N]: ", render(question));

        let answer = tokio::task::spawn_blocking(move || read_answer(&prompt)).await;
        matches!(answer, Ok(Ok(line)) if is_yes(&line))
    }
}

/// Prompt on stdout and read one line from stdin.
///
/// # Errors
///
/// Returns an I/O error if the terminal cannot be written or read.
pub fn read_answer(prompt: &str) -> io::Result<String> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;
    drop(stdout);

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}

/// Prompt for a password without echoing it.
///
/// # Errors
///
/// Returns an I/O error if there is no terminal to read from.
pub async fn read_password(prompt: &'static str) -> io::Result<String> {
    tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt))
        .await
        .map_err(io::Error::other)?
}
