use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{PromptError, Result};

/// Ask `prompt` until `parse` accepts the answer.
///
/// There is no retry limit. End of input is the only way out without a valid
/// answer and is reported as [`PromptError::InputClosed`].
pub fn prompt_until<R, W, T, F>(
    reader: &mut R,
    writer: &mut W,
    prompt: &str,
    parse: F,
) -> Result<T>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> Option<T>,
{
    let mut line = String::new();
    loop {
        write!(writer, "{}", prompt)?;
        writer.flush()?;

        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PromptError::InputClosed {
                prompt: prompt.trim().to_string(),
            }.into());
        }

        match parse(&line) {
            Some(value) => return Ok(value),
            None => debug!("Rejected answer {:?} for {:?}", line.trim(), prompt.trim()),
        }
    }
}
