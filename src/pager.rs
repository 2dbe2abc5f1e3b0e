use std::io::Write;
use std::process::{Command, Stdio};

/// Show text through the user's pager, falling back to plain stdout.
///
/// Paging only happens when requested and when stdout is a terminal;
/// a pager that cannot be spawned degrades to plain output.
pub fn page(text: &str, enabled: bool) {
    if enabled && console::Term::stdout().is_term() && page_through(text).is_ok() {
        return;
    }
    println!("{}", text);
}

fn page_through(text: &str) -> std::io::Result<()> {
    let pager = std::env::var("PAGER").unwrap_or_default();
    let mut parts = pager.split_whitespace();
    let program = parts.next().unwrap_or("less");
    let args: Vec<&str> = parts.collect();

    let mut child = Command::new(program)
        .args(&args)
        .stdin(Stdio::piped())
        .spawn()?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(text.as_bytes())?;
        stdin.write_all(b"\n")?;
    }
    child.wait()?;
    Ok(())
}
