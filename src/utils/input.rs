//! Line input for the command-line client.

use std::io::{self, BufRead, Write};

/// Normalize typed text before it is sent or logged.
///
/// Tabs become four spaces, carriage returns become newlines and other
/// control characters are dropped.
pub fn sanitize_text_input(text: &str) -> String {
    let mut sanitized = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\t' => sanitized.push_str("    "),
            '\r' => sanitized.push('\n'),
            '\n' => sanitized.push(c),
            _ if !c.is_control() => sanitized.push(c),
            _ => {}
        }
    }

    sanitized
}

/// Print `prompt` and read one line. `None` means end of input.
pub fn prompt_line<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    prompt: &str,
) -> io::Result<Option<String>> {
    write!(writer, "{prompt}")?;
    writer.flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim_end_matches(['\n', '\r']);
    Ok(Some(sanitize_text_input(line)))
}

/// [`prompt_line`] on the process's stdin and stdout.
pub fn prompt_stdin(prompt: &str) -> io::Result<Option<String>> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    prompt_line(&mut reader, &mut io::stdout(), prompt)
}
