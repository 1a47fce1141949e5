use std::error::Error;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Plain-text transcript of an interactive chat.
///
/// User lines carry the display-name prefix, companion replies are written
/// as-is and client notes are prefixed with `## `.
pub struct TranscriptLog {
    file_path: Option<PathBuf>,
    is_active: bool,
}

impl TranscriptLog {
    pub fn new(log_file: Option<PathBuf>) -> Result<Self, Box<dyn Error>> {
        let mut log = TranscriptLog {
            file_path: None,
            is_active: false,
        };
        if let Some(path) = log_file {
            log.set_log_file(path)?;
        }
        Ok(log)
    }

    pub fn set_log_file(&mut self, path: PathBuf) -> Result<String, Box<dyn Error>> {
        // Fail early if the file cannot be created
        OpenOptions::new().create(true).append(true).open(&path)?;

        let message = format!("Logging enabled to: {}", path.display());
        self.file_path = Some(path);
        self.is_active = true;
        Ok(message)
    }

    pub fn toggle_logging(&mut self, pause_message: &str) -> Result<String, Box<dyn Error>> {
        let Some(path) = self.file_path.clone() else {
            return Err("No log file specified. Use /log <filename> to enable logging first.".into());
        };

        if self.is_active {
            self.log_note(pause_message)?;
            self.is_active = false;
            Ok(format!("Logging paused (file: {})", path.display()))
        } else {
            self.is_active = true;
            Ok(format!("Logging resumed to: {}", path.display()))
        }
    }

    pub fn log_user(&self, display_name: &str, content: &str) -> Result<(), Box<dyn Error>> {
        self.log_message(&format!("{display_name}: {content}"))
    }

    pub fn log_reply(&self, content: &str) -> Result<(), Box<dyn Error>> {
        if content.is_empty() {
            return Ok(());
        }
        self.log_message(content)
    }

    pub fn log_note(&self, content: &str) -> Result<(), Box<dyn Error>> {
        self.log_message(&format!("## {content}"))
    }

    fn log_message(&self, content: &str) -> Result<(), Box<dyn Error>> {
        match (&self.file_path, self.is_active) {
            (Some(path), true) => write_block(path, content),
            _ => Ok(()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn status_string(&self) -> String {
        let file_name = |path: &Path| {
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned()
        };
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!("active ({})", file_name(path)),
            (Some(path), false) => format!("paused ({})", file_name(path)),
        }
    }
}

fn write_block(path: &Path, content: &str) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);

    for line in content.lines() {
        writeln!(writer, "{line}")?;
    }
    // Blank line between entries
    writeln!(writer)?;

    writer.flush()?;
    Ok(())
}
