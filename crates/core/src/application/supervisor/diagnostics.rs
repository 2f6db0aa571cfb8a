// Diagnostic stream handling - accumulates renderer stderr and derives
// the user-facing error text on failure.

use tracing::warn;

/// Progress-bar redraws, not real diagnostics: anything carrying a
/// carriage return or the bar glyph.
fn is_progress_noise(text: &str) -> bool {
    text.contains('\r') || text.contains('|')
}

/// Verbatim accumulator for the renderer's diagnostic stream.
///
/// Noise is still buffered (it proves the process was alive); it is only
/// dropped from live logging and from the final error text.
#[derive(Default)]
pub struct DiagnosticBuffer {
    raw: String,
}

impl DiagnosticBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, job_id: &str, chunk: &str) {
        self.raw.push_str(chunk);
        if !is_progress_noise(chunk) {
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                warn!(job_id = %job_id, stderr = %trimmed, "renderer diagnostics");
            }
        }
    }

    /// Final error text for a failed exit: noise and blank lines are
    /// stripped; an empty result falls back to a generic exit message.
    pub fn final_error(&self, exit_code: Option<i32>) -> String {
        let joined = self
            .raw
            .lines()
            .filter(|line| !is_progress_noise(line) && !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let cleaned = joined.trim();

        if !cleaned.is_empty() {
            return cleaned.to_string();
        }

        match exit_code {
            Some(code) => format!("Render process exited with code {}", code),
            None => "Render process terminated by signal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_lines_are_stripped_from_final_error() {
        let mut buffer = DiagnosticBuffer::new();
        buffer.push_chunk("job-1", " 45%|████████        | 45/100\n");
        buffer.push_chunk("job-1", "\rretrying download\n");
        buffer.push_chunk("job-1", "Traceback (most recent call last):\n");
        buffer.push_chunk("job-1", "ValueError: city not found\n");

        let error = buffer.final_error(Some(1));
        assert_eq!(
            error,
            "Traceback (most recent call last):\nValueError: city not found"
        );
        assert!(!error.contains('\r'));
        assert!(!error.contains('|'));
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let mut buffer = DiagnosticBuffer::new();
        buffer.push_chunk("job-1", "\n\n   \nout of memory\n\n");
        assert_eq!(buffer.final_error(Some(137)), "out of memory");
    }

    #[test]
    fn test_fallback_to_exit_code_message() {
        let buffer = DiagnosticBuffer::new();
        assert_eq!(
            buffer.final_error(Some(3)),
            "Render process exited with code 3"
        );
    }

    #[test]
    fn test_noise_only_buffer_still_falls_back() {
        let mut buffer = DiagnosticBuffer::new();
        buffer.push_chunk("job-1", " 99%|█████| 99/100\r");
        assert_eq!(
            buffer.final_error(Some(1)),
            "Render process exited with code 1"
        );
    }

    #[test]
    fn test_fallback_for_signal_death() {
        let buffer = DiagnosticBuffer::new();
        assert_eq!(
            buffer.final_error(None),
            "Render process terminated by signal"
        );
    }
}
