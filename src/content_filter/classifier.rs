//! Image classifier backends
//!
//! A classifier turns image bytes into a score in `[0, 1]`; higher means
//! more likely disallowed. The actual model lives outside this crate and is
//! reached either over HTTP or through an external program.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifierError {
    /// The backend could not be set up at startup
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classifier request failed: {0}")]
    Request(String),

    #[error("Classifier returned an invalid score: {0}")]
    InvalidResponse(String),

    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),
}

/// Capability to score one image.
pub trait ImageClassifier: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Score image bytes; `Ok` values are always within `[0, 1]`.
    fn classify<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<f32, ClassifierError>>;
}

fn checked_score(score: f32) -> Result<f32, ClassifierError> {
    if (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ClassifierError::InvalidResponse(format!(
            "score {score} outside [0, 1]"
        )))
    }
}

#[derive(Debug, Deserialize)]
struct ScoreReply {
    score: f32,
}

/// POSTs raw image bytes and expects `{"score": <f32>}`.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpClassifier {
    pub fn new(client: Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    async fn score(&self, image: &[u8]) -> Result<f32, ClassifierError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout(self.timeout)
                } else {
                    ClassifierError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ClassifierError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let reply: ScoreReply = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;
        checked_score(reply.score)
    }
}

impl ImageClassifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    fn classify<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<f32, ClassifierError>> {
        Box::pin(self.score(image))
    }
}

/// Runs an external program per image: bytes on stdin, a float on stdout.
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandClassifier {
    /// Resolve the program now so a missing binary is reported at startup
    /// rather than once per image.
    pub fn new(argv: &[String], timeout: Duration) -> Result<Self, ClassifierError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ClassifierError::Unavailable("empty command".to_string()))?;
        let program = find_program(program).ok_or_else(|| {
            ClassifierError::Unavailable(format!("command '{program}' not found"))
        })?;
        Ok(Self {
            program,
            args: args.to_vec(),
            timeout,
        })
    }

    async fn score(&self, image: &[u8]) -> Result<f32, ClassifierError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClassifierError::Request(format!("spawn failed: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClassifierError::Request("stdin not captured".to_string()))?;

        let run = async move {
            stdin
                .write_all(image)
                .await
                .map_err(|e| ClassifierError::Request(format!("write failed: {e}")))?;
            drop(stdin);
            child
                .wait_with_output()
                .await
                .map_err(|e| ClassifierError::Request(format!("wait failed: {e}")))
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ClassifierError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(ClassifierError::Request(format!(
                "exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let score = stdout
            .trim()
            .parse::<f32>()
            .map_err(|_| ClassifierError::InvalidResponse(stdout.trim().to_string()))?;
        checked_score(score)
    }
}

impl ImageClassifier for CommandClassifier {
    fn name(&self) -> &str {
        "command"
    }

    fn classify<'a>(&'a self, image: &'a [u8]) -> BoxFuture<'a, Result<f32, ClassifierError>> {
        Box::pin(self.score(image))
    }
}

/// Locate a program by explicit path or on `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}
