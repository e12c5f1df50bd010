use crate::commands::share::ShareTarget;
use crate::error::{Result, TodoError};
use std::env;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// A clipboard command that reads the text on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCommand {
    program: &'static str,
    args: &'static [&'static str],
}

/// Candidates per platform, in preference order.
/// - macOS: pbcopy
/// - Linux: xclip, then xsel
/// - Windows: clip.exe
fn candidates() -> &'static [ClipboardCommand] {
    #[cfg(target_os = "macos")]
    {
        &[ClipboardCommand {
            program: "pbcopy",
            args: &[],
        }]
    }

    #[cfg(target_os = "linux")]
    {
        &[
            ClipboardCommand {
                program: "xclip",
                args: &["-selection", "clipboard"],
            },
            ClipboardCommand {
                program: "xsel",
                args: &["--clipboard", "--input"],
            },
        ]
    }

    #[cfg(target_os = "windows")]
    {
        &[ClipboardCommand {
            program: "clip",
            args: &[],
        }]
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        &[]
    }
}

impl ClipboardCommand {
    /// The first clipboard command found on `PATH`, if any.
    pub fn detect() -> Option<Self> {
        let path = env::var_os("PATH")?;
        let dirs: Vec<_> = env::split_paths(&path).collect();
        candidates()
            .iter()
            .find(|c| dirs.iter().any(|dir| is_program_in(dir, c.program)))
            .cloned()
    }

    pub fn copy(&self, text: &str) -> Result<()> {
        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| clipboard_error(format!("failed to spawn {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| clipboard_error(format!("failed to write to {}: {}", self.program, e)))?;
        }

        let status = child
            .wait()
            .map_err(|e| clipboard_error(format!("failed to wait for {}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(clipboard_error(format!("{} exited with {}", self.program, status)))
        }
    }
}

impl ShareTarget for ClipboardCommand {
    fn deliver(&self, _title: &str, text: &str) -> Result<()> {
        self.copy(text)
    }
}

fn is_program_in(dir: &Path, program: &str) -> bool {
    let plain = dir.join(program);
    if plain.is_file() {
        return true;
    }
    cfg!(windows) && dir.join(format!("{}.exe", program)).is_file()
}

fn clipboard_error(message: String) -> TodoError {
    TodoError::Clipboard(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_program_in() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("xclip"), "").unwrap();
        assert!(is_program_in(dir.path(), "xclip"));
        assert!(!is_program_in(dir.path(), "xsel"));
    }

    #[test]
    fn test_missing_program_fails_to_copy() {
        let cmd = ClipboardCommand {
            program: "todoz-definitely-not-a-clipboard",
            args: &[],
        };
        assert!(matches!(cmd.copy("x"), Err(TodoError::Clipboard(_))));
    }
}
