//! Result collection from a finished execution unit.

use crate::runtime::{SandboxRuntime, UnitHandle};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Output reported when a unit printed nothing or its logs could not be read
pub const NO_OUTPUT_SENTINEL: &str = "No output returned.";

/// Appended to output cut at the configured limit
pub const TRUNCATION_MARKER: &str = "[output truncated]";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Output drained from a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    /// The text to report; the sentinel when nothing was produced
    pub output: String,

    /// Whether the unit produced any output at all
    pub produced_output: bool,

    /// Whether the output was cut at the limit
    pub truncated: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Collected {
    /// Normalizes raw log bytes: lossy UTF-8, cut at `max_output_bytes` on a character boundary,
    /// sentinel when empty.
    pub fn from_bytes(bytes: &[u8], max_output_bytes: usize) -> Self {
        if bytes.is_empty() {
            return Self::nothing();
        }

        let text = String::from_utf8_lossy(bytes);
        if text.len() <= max_output_bytes {
            return Self {
                output: text.into_owned(),
                produced_output: true,
                truncated: false,
            };
        }

        let mut end = max_output_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        let mut output = text[..end].to_string();
        if !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(TRUNCATION_MARKER);

        Self {
            output,
            produced_output: true,
            truncated: true,
        }
    }

    /// The collection result of a unit that produced nothing.
    pub fn nothing() -> Self {
        Self {
            output: NO_OUTPUT_SENTINEL.to_string(),
            produced_output: false,
            truncated: false,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Reads the combined stdout/stderr of a unit that reached a terminal state.
///
/// Collection is best effort: a unit killed mid-write yields whatever it managed to print, and
/// a failed log read is logged and reported as the no-output sentinel instead of failing the
/// request.
pub async fn collect(
    runtime: &dyn SandboxRuntime,
    handle: &UnitHandle,
    max_output_bytes: usize,
) -> Collected {
    match runtime.logs(handle).await {
        Ok(bytes) => Collected::from_bytes(&bytes, max_output_bytes),
        Err(e) => {
            tracing::warn!("failed to collect output of unit {}: {}", handle.get_name(), e);
            Collected::nothing()
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockLogs, MockRuntime, MockScript, UnitSpec};

    fn spec() -> UnitSpec {
        UnitSpec::builder()
            .name("execbox-test")
            .image("python:3.12-slim")
            .command(vec!["sh".to_string()])
            .working_dir("/sandbox")
            .memory_bytes(128 * 1024 * 1024)
            .pids_limit(64)
            .build()
    }

    #[test]
    fn test_empty_output_yields_sentinel() {
        let collected = Collected::from_bytes(b"", 1024);
        assert_eq!(collected.output, NO_OUTPUT_SENTINEL);
        assert!(!collected.produced_output);
    }

    #[test]
    fn test_output_is_kept_verbatim_under_limit() {
        let collected = Collected::from_bytes(b"hi\n", 1024);
        assert_eq!(collected.output, "hi\n");
        assert!(collected.produced_output);
        assert!(!collected.truncated);
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let collected = Collected::from_bytes(&[b'o', b'k', 0xff, b'\n'], 1024);
        assert_eq!(collected.output, "ok\u{fffd}\n");
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        // "é" is two bytes; a limit of 2 falls inside the second one
        let collected = Collected::from_bytes("aéé".as_bytes(), 2);
        assert!(collected.truncated);
        assert_eq!(collected.output, format!("a\n{}", TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_failed_log_read_yields_sentinel() {
        let runtime = MockRuntime::new(MockScript {
            logs: MockLogs::Fail("log driver gone".to_string()),
            ..Default::default()
        });
        let handle = runtime.create(&spec()).await.unwrap();

        let collected = collect(&runtime, &handle, 1024).await;
        assert_eq!(collected.output, NO_OUTPUT_SENTINEL);
        assert!(!collected.produced_output);
    }
}
