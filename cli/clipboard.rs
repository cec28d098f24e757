use std::io::Write;
use std::process::{Command, Stdio};

/// Candidate clipboard commands for this platform, tried in order.
#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[&[&str]] = &[&["pbcopy"]];
#[cfg(windows)]
const CLIPBOARD_COMMANDS: &[&[&str]] = &[&["clip"]];
#[cfg(not(any(target_os = "macos", windows)))]
const CLIPBOARD_COMMANDS: &[&[&str]] = &[
    &["xclip", "-selection", "clipboard"],
    &["xsel", "-ib"],
    &["wl-copy"],
];

/// Pipe `text` into the first clipboard command that works. On total failure
/// the text is saved to `~/codepick_output.txt` instead and `false` comes
/// back; callers treat that as a warning, never an error.
pub fn copy_to_clipboard(text: &str) -> bool {
    for args in CLIPBOARD_COMMANDS {
        match pipe_through(args, text) {
            Ok(()) => {
                log::debug!("Copied {} bytes via {}", text.len(), args[0]);
                return true;
            }
            Err(err) => {
                log::debug!("Clipboard command {} failed: {}", args[0], err);
            }
        }
    }

    let fallback = shellexpand::tilde("~/codepick_output.txt").into_owned();
    match std::fs::write(&fallback, text) {
        Ok(()) => eprintln!("Clipboard unavailable. Output saved to: {}", fallback),
        Err(_) => eprintln!("Clipboard unavailable and could not write to fallback file."),
    }
    false
}

fn pipe_through(args: &[&str], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(args[0])
        .args(&args[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("exit status {}", status)))
    }
}
