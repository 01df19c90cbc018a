//! Concurrent scrubbing of `.eml` files.
//!
//! Each file is an independent unit of work: it is read, scrubbed on the
//! blocking pool and written out, with at most `limit` files in flight.

use std::{
    collections::HashSet,
    error::Error,
    fmt::Display,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use mailscrub_utils::{HeaderScrubber, ScrubReport};
use tokio::{fs, sync::Semaphore, task::JoinSet};
use tracing::{debug, info, warn};

/// Extension accepted for input files.
pub const EML_EXTENSION: &str = "eml";

/// Errors that can occur while scrubbing a single file.
#[derive(Debug)]
pub enum BatchError {
    /// The input does not carry the `.eml` extension.
    UnsupportedExtension(PathBuf),
    /// The input holds nothing but whitespace.
    Empty(PathBuf),
    /// An I/O error occurred reading or writing the file.
    Io(PathBuf, io::Error),
    /// The scrubbing task panicked or was cancelled.
    Task(String),
}

impl Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::UnsupportedExtension(path) => {
                write!(f, "Unsupported file (expected .eml): {}", path.display())
            }
            BatchError::Empty(path) => write!(f, "Empty email content: {}", path.display()),
            BatchError::Io(path, e) => write!(f, "I/O error on {}: {e}", path.display()),
            BatchError::Task(msg) => write!(f, "Task error: {msg}"),
        }
    }
}

impl Error for BatchError {}

/// Outcome of scrubbing one input file.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<ScrubbedFile, BatchError>,
}

/// A successfully scrubbed file.
#[derive(Debug)]
pub struct ScrubbedFile {
    pub report: ScrubReport,
    /// Where the output was written, `None` when it is left to the caller.
    pub output: Option<PathBuf>,
}

/// Returns the output path for `input` inside `output_dir`.
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("processed-{}.{EML_EXTENSION}", output_stem(input)))
}

/// Returns one output path per input, numbering inputs that share a file
/// stem (`processed-news.eml`, `processed-news-2.eml`, ...).
pub fn output_paths(inputs: &[PathBuf], output_dir: &Path) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let stem = output_stem(input);
            let mut path = output_path(input, output_dir);
            let mut counter = 2;
            while !taken.insert(path.clone()) {
                path = output_dir.join(format!("processed-{stem}-{counter}.{EML_EXTENSION}"));
                counter += 1;
            }
            path
        })
        .collect()
}

fn output_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "email".to_string())
}

/// Validates and scrubs the content of one message.
pub async fn scrub_content(
    scrubber: Arc<HeaderScrubber>,
    input: &Path,
    content: String,
) -> Result<ScrubReport, BatchError> {
    if content.trim().is_empty() {
        return Err(BatchError::Empty(input.to_path_buf()));
    }
    tokio::task::spawn_blocking(move || scrubber.scrub_report(&content))
        .await
        .map_err(|e| BatchError::Task(e.to_string()))
}

/// Reads, scrubs and (optionally) writes a single `.eml` file to `output`.
pub async fn scrub_file(
    scrubber: Arc<HeaderScrubber>,
    input: &Path,
    output: Option<PathBuf>,
) -> Result<ScrubbedFile, BatchError> {
    if input.extension().and_then(|ext| ext.to_str()) != Some(EML_EXTENSION) {
        return Err(BatchError::UnsupportedExtension(input.to_path_buf()));
    }
    let content = fs::read_to_string(input)
        .await
        .map_err(|e| BatchError::Io(input.to_path_buf(), e))?;
    debug!(path = %input.display(), bytes = content.len(), "Read email file");

    let report = scrub_content(scrubber, input, content).await?;

    if let Some(path) = &output {
        fs::write(path, &report.output)
            .await
            .map_err(|e| BatchError::Io(path.clone(), e))?;
    }
    Ok(ScrubbedFile { report, output })
}

/// Scrubs every input concurrently, at most `limit` at a time.
///
/// Outcomes are returned in input order, a failing file never stops the
/// rest of the batch.
pub async fn scrub_files(
    scrubber: Arc<HeaderScrubber>,
    inputs: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    limit: usize,
) -> Vec<FileOutcome> {
    if let Some(dir) = &output_dir {
        if let Err(e) = fs::create_dir_all(dir).await {
            warn!(path = %dir.display(), error = %e, "Failed to create output directory");
        }
    }

    let outputs: Vec<Option<PathBuf>> = match &output_dir {
        Some(dir) => output_paths(&inputs, dir).into_iter().map(Some).collect(),
        None => vec![None; inputs.len()],
    };

    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for (index, (input, output)) in inputs.iter().cloned().zip(outputs).enumerate() {
        let scrubber = scrubber.clone();
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => scrub_file(scrubber, &input, output).await,
                Err(e) => Err(BatchError::Task(e.to_string())),
            };
            (index, FileOutcome { input, result })
        });
    }

    let mut outcomes: Vec<Option<FileOutcome>> = inputs.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                match &outcome.result {
                    Ok(file) => info!(
                        path = %outcome.input.display(),
                        stats = %file.report,
                        "Scrubbed email"
                    ),
                    Err(e) => warn!(path = %outcome.input.display(), error = %e, "Skipped email"),
                }
                outcomes[index] = Some(outcome);
            }
            Err(e) => warn!(error = %e, "Scrub task failed"),
        }
    }

    outcomes
        .into_iter()
        .zip(inputs)
        .map(|(outcome, input)| {
            outcome.unwrap_or_else(|| FileOutcome {
                input,
                result: Err(BatchError::Task("task did not complete".to_string())),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use mailscrub_utils::{Placeholders, Preset};

    use super::*;

    fn scrubber() -> Arc<HeaderScrubber> {
        Arc::new(HeaderScrubber::new(
            Preset::Standard.policy(),
            Placeholders::default(),
        ))
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("inbox/newsletter.eml"), Path::new("out")),
            PathBuf::from("out/processed-newsletter.eml")
        );
    }

    #[test]
    fn test_output_paths_numbers_shared_stems() {
        let inputs = [
            "a/news.eml",
            "b/news.eml",
            "c/news-2.eml",
            "news.eml",
            "digest.eml",
        ]
        .map(PathBuf::from);
        assert_eq!(
            output_paths(&inputs, Path::new("out")),
            [
                "out/processed-news.eml",
                "out/processed-news-2.eml",
                "out/processed-news-2-2.eml",
                "out/processed-news-3.eml",
                "out/processed-digest.eml",
            ]
            .map(PathBuf::from)
        );
    }

    #[tokio::test]
    async fn test_scrub_file_rejects_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message.txt");
        std::fs::write(&path, "Subject: hi\n\nbody").unwrap();

        let result = scrub_file(scrubber(), &path, None).await;

        assert!(matches!(result, Err(BatchError::UnsupportedExtension(_))));
    }

    #[tokio::test]
    async fn test_scrub_file_rejects_blank_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.eml");
        std::fs::write(&path, " \n\t\n").unwrap();

        let result = scrub_file(scrubber(), &path, None).await;

        assert!(matches!(result, Err(BatchError::Empty(_))));
    }

    #[tokio::test]
    async fn test_scrub_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.eml");

        let result = scrub_file(scrubber(), &path, None).await;

        assert!(matches!(result, Err(BatchError::Io(_, _))));
    }

    #[tokio::test]
    async fn test_scrub_file_writes_output() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        let path = input_dir.path().join("news.eml");
        std::fs::write(&path, "To: a@b.com\nX-Mailer: x\n\nbody").unwrap();

        let file = scrub_file(
            scrubber(),
            &path,
            Some(output_path(&path, output_dir.path())),
        )
        .await
        .unwrap();

        let written = file.output.unwrap();
        assert_eq!(written, output_dir.path().join("processed-news.eml"));
        let content = std::fs::read_to_string(written).unwrap();
        assert_eq!(content, file.report.output);
        assert!(content.starts_with("To: [*to]\n"));
        assert!(content.ends_with("\n\nbody"));
    }

    #[tokio::test]
    async fn test_scrub_files_keeps_input_order() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = input_dir.path().join("out");
        let mut inputs = Vec::new();
        for index in 0..5 {
            let path = input_dir.path().join(format!("m{index}.eml"));
            std::fs::write(&path, format!("Subject: {index}\n\nbody")).unwrap();
            inputs.push(path);
        }
        inputs.push(input_dir.path().join("notes.txt"));

        let outcomes = scrub_files(scrubber(), inputs.clone(), Some(output_dir.clone()), 2).await;

        assert_eq!(outcomes.len(), 6);
        for (index, outcome) in outcomes.iter().take(5).enumerate() {
            assert_eq!(outcome.input, inputs[index]);
            let file = outcome.result.as_ref().unwrap();
            assert!(file
                .report
                .output
                .starts_with(&format!("Subject: {index}\n")));
        }
        assert!(matches!(
            outcomes[5].result,
            Err(BatchError::UnsupportedExtension(_))
        ));
        assert!(output_dir.join("processed-m4.eml").exists());
    }

    #[tokio::test]
    async fn test_scrub_files_same_stem_keeps_both_outputs() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = input_dir.path().join("out");
        let mut inputs = Vec::new();
        for folder in ["a", "b"] {
            let dir = input_dir.path().join(folder);
            std::fs::create_dir(&dir).unwrap();
            let path = dir.join("news.eml");
            std::fs::write(&path, format!("Subject: from {folder}\n\nbody")).unwrap();
            inputs.push(path);
        }

        let outcomes = scrub_files(scrubber(), inputs, Some(output_dir.clone()), 2).await;

        let written: Vec<PathBuf> = outcomes
            .iter()
            .map(|outcome| outcome.result.as_ref().unwrap().output.clone().unwrap())
            .collect();
        assert_eq!(
            written,
            vec![
                output_dir.join("processed-news.eml"),
                output_dir.join("processed-news-2.eml")
            ]
        );
        let first = std::fs::read_to_string(&written[0]).unwrap();
        let second = std::fs::read_to_string(&written[1]).unwrap();
        assert!(first.starts_with("Subject: from a\n"));
        assert!(second.starts_with("Subject: from b\n"));
    }
}
