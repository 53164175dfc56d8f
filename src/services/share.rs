use std::io::Write;
use std::process::{Command, Stdio};
use crate::error::CapabilityError;

/// Copies text to the platform clipboard
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), CapabilityError>;
}

/// Opens a URL with the platform's default handler
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), CapabilityError>;
}

/// Build a share link by URL-encoding `text` onto `base_url`
pub fn share_url(base_url: &str, text: &str) -> String {
    format!("{}{}", base_url, urlencoding::encode(text))
}

/// Clipboard backed by the platform's command-line tools
pub struct SystemClipboard {
    candidates: Vec<(&'static str, Vec<&'static str>)>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let candidates = if cfg!(target_os = "macos") {
            vec![("pbcopy", vec![])]
        } else if cfg!(target_os = "windows") {
            vec![("clip", vec![])]
        } else {
            vec![
                ("wl-copy", vec![]),
                ("xclip", vec!["-selection", "clipboard"]),
                ("xsel", vec!["--clipboard", "--input"]),
            ]
        };
        Self { candidates }
    }

    fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<(), CapabilityError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CapabilityError::Failed {
                tool: program.to_string(),
                message: e.to_string(),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(|e| CapabilityError::Failed {
                tool: program.to_string(),
                message: format!("failed to write to stdin: {}", e),
            })?;
        }

        let status = child.wait().map_err(|e| CapabilityError::Failed {
            tool: program.to_string(),
            message: e.to_string(),
        })?;

        if !status.success() {
            return Err(CapabilityError::Failed {
                tool: program.to_string(),
                message: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<(), CapabilityError> {
        for (program, args) in &self.candidates {
            match Self::pipe_to(program, args, text) {
                Ok(()) => {
                    tracing::debug!(tool = program, "Copied text to clipboard");
                    return Ok(());
                }
                Err(e) => tracing::debug!(tool = program, error = %e, "Clipboard tool failed"),
            }
        }

        Err(CapabilityError::Unavailable {
            capability: "clipboard",
            tried: self
                .candidates
                .iter()
                .map(|(p, _)| *p)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Opens links with the system default viewer
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), CapabilityError> {
        let (program, args): (&str, Vec<&str>) = if cfg!(target_os = "macos") {
            ("open", vec![url])
        } else if cfg!(target_os = "windows") {
            ("cmd", vec!["/C", "start", "", url])
        } else {
            ("xdg-open", vec![url])
        };

        Command::new(program)
            .args(&args)
            .spawn()
            .map_err(|e| CapabilityError::Failed {
                tool: program.to_string(),
                message: format!("Failed to open link: {}", e),
            })?;

        Ok(())
    }
}
