use crate::{detect_format, TextExtractor};
use feedscribe_core::{OcrConfig, OcrError};
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Runs the Tesseract CLI once per image, piping the image through stdin.
#[derive(Debug, Clone)]
pub struct TesseractExtractor {
    config: OcrConfig,
}

impl TesseractExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Arguments passed to the binary: read from stdin, write to stdout.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = vec!["stdin".to_string(), "stdout".to_string()];
        args.extend(self.config.engine_args());
        args
    }

    /// Returns the first line of `<binary> --version`.
    pub async fn check_available(&self) -> Result<String, OcrError> {
        let output = Command::new(&self.config.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // Older releases print the version banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        Ok(String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    fn spawn_error(&self, e: std::io::Error) -> OcrError {
        if e.kind() == ErrorKind::NotFound {
            OcrError::EngineUnavailable {
                binary: self.config.binary.clone(),
            }
        } else {
            OcrError::Io(e)
        }
    }
}

impl TextExtractor for TesseractExtractor {
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let format = detect_format(image).ok_or_else(|| OcrError::UnreadableImage {
            reason: if image.is_empty() {
                "empty payload".to_string()
            } else {
                "unrecognized image format".to_string()
            },
        })?;
        debug!(
            "Running {} on {} bytes of {}",
            self.config.binary,
            image.len(),
            format.extension()
        );

        let mut child = Command::new(&self.config.binary)
            .args(self.command_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            OcrError::Io(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "engine stdin was not captured",
            ))
        })?;
        let feed = async move {
            stdin.write_all(image).await?;
            stdin.shutdown().await
        };

        let timeout = self.config.timeout();
        let (written, output) =
            tokio::time::timeout(timeout, async { tokio::join!(feed, child.wait_with_output()) })
                .await
                .map_err(|_| OcrError::Timeout {
                    seconds: timeout.as_secs(),
                })?;
        let output = output?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written?;

        String::from_utf8(output.stdout).map_err(|_| OcrError::InvalidOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

    fn extractor_with_binary(binary: &str) -> TesseractExtractor {
        TesseractExtractor::new(OcrConfig {
            binary: binary.to_string(),
            ..OcrConfig::default()
        })
    }

    #[test]
    fn test_command_args() {
        let extractor = TesseractExtractor::new(OcrConfig::default());
        assert_eq!(
            extractor.command_args(),
            vec!["stdin", "stdout", "--oem", "3", "--psm", "6", "-l", "eng"]
        );
    }

    #[tokio::test]
    async fn test_rejects_non_image_payload() {
        let extractor = extractor_with_binary("feedscribe-missing-tesseract");

        let result = extractor.extract_text(b"<html>not an image</html>").await;
        assert!(matches!(result, Err(OcrError::UnreadableImage { .. })));

        let result = extractor.extract_text(b"").await;
        match result {
            Err(OcrError::UnreadableImage { reason }) => assert_eq!(reason, "empty payload"),
            other => panic!("Expected UnreadableImage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_engine_unavailable() {
        let extractor = extractor_with_binary("feedscribe-missing-tesseract");

        match extractor.extract_text(PNG_HEADER).await {
            Err(OcrError::EngineUnavailable { binary }) => {
                assert_eq!(binary, "feedscribe-missing-tesseract")
            }
            other => panic!("Expected EngineUnavailable, got {:?}", other),
        }
        assert!(matches!(
            extractor.check_available().await,
            Err(OcrError::EngineUnavailable { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_engine_reports_status() {
        // `sh stdin stdout ...` tries to run a script named "stdin" and exits non-zero.
        let extractor = extractor_with_binary("sh");

        let result = extractor.extract_text(PNG_HEADER).await;
        assert!(matches!(result, Err(OcrError::EngineFailed { .. })));
    }
}
