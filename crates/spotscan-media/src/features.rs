//! Feature-file reading and reference library loading.
//!
//! A feature file holds one video, one frame per line:
//!
//! ```text
//! <time> <v1> <v2> ... <vn>
//! ```
//!
//! Fields are whitespace separated. The video (or clip) name is the file
//! stem, so `refs/adA.txt` yields a clip named `adA`.

use std::path::{Path, PathBuf};

use spotscan_models::{parse_seconds, BroadcastFrame, FeatureVector, ReferenceClip, ReferenceLibrary};
use tracing::{debug, info};

use crate::error::{LineError, MediaError, MediaResult};

/// Every frame of one video, with its name.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFile {
    pub name: String,
    pub frames: Vec<BroadcastFrame>,
}

impl FeatureFile {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sample count of the first frame, or `None` for an empty file.
    pub fn dimension(&self) -> Option<usize> {
        self.frames.first().map(|frame| frame.feature.dim())
    }

    /// Drop the timestamps and keep the frames as a reference clip.
    pub fn into_reference_clip(self) -> ReferenceClip {
        let frames = self.frames.into_iter().map(|frame| frame.feature).collect();
        ReferenceClip::new(self.name, frames)
    }
}

/// Parse a single `<time> <v1> ... <vn>` line.
pub fn parse_feature_line(line: &str) -> Result<BroadcastFrame, LineError> {
    let mut fields = line.split_whitespace();
    let timestamp = parse_seconds(fields.next().unwrap_or_default())?;

    let samples = fields
        .map(|field| match field.parse::<f32>() {
            Ok(sample) if sample.is_finite() => Ok(sample),
            _ => Err(LineError::InvalidSample(field.to_string())),
        })
        .collect::<Result<Vec<f32>, _>>()?;
    if samples.is_empty() {
        return Err(LineError::NoSamples);
    }

    Ok(BroadcastFrame::new(timestamp, FeatureVector::new(samples)))
}

/// Name a video after its file stem.
pub fn video_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Read a whole feature file. Blank lines are skipped; every frame must have
/// the same number of samples as the first.
pub async fn read_feature_file(path: impl AsRef<Path>) -> MediaResult<FeatureFile> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MediaError::on_read(path, e))?;

    let mut frames: Vec<BroadcastFrame> = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let frame =
            parse_feature_line(line).map_err(|e| MediaError::at_line(path, number + 1, e))?;

        if let Some(expected) = frames.first().map(|first| first.feature.dim()) {
            if frame.feature.dim() != expected {
                return Err(MediaError::at_line(
                    path,
                    number + 1,
                    LineError::SampleCount {
                        expected,
                        found: frame.feature.dim(),
                    },
                ));
            }
        }
        frames.push(frame);
    }

    let file = FeatureFile {
        name: video_name(path),
        frames,
    };
    debug!(
        path = %path.display(),
        video = %file.name,
        frames = file.len(),
        "Read feature file"
    );
    Ok(file)
}

/// Load every regular file in `dir` as a reference clip.
///
/// Files are read in file-name order, which fixes the library's iteration
/// order and with it the matcher's tie-breaking.
pub async fn load_reference_library(dir: impl AsRef<Path>) -> MediaResult<ReferenceLibrary> {
    let dir = dir.as_ref();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| MediaError::on_read(dir, e))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut clips = Vec::with_capacity(paths.len());
    for path in &paths {
        clips.push(read_feature_file(path).await?.into_reference_clip());
    }

    let library = ReferenceLibrary::new(clips)?;
    info!(
        dir = %dir.display(),
        clips = library.len(),
        frames = library.total_frames(),
        dimension = library.dimension(),
        "Loaded reference library"
    );
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotscan_models::ModelError;
    use tempfile::TempDir;

    #[test]
    fn test_parse_feature_line() {
        let frame = parse_feature_line("12.04 3 4 5.5").unwrap();
        assert_eq!(frame.timestamp, 12.04);
        assert_eq!(frame.feature.as_slice(), &[3.0f32, 4.0, 5.5]);

        let frame = parse_feature_line("  0.0\t1   2 ").unwrap();
        assert_eq!(frame.feature.dim(), 2);
    }

    #[test]
    fn test_parse_feature_line_errors() {
        assert_eq!(parse_feature_line("1.0").unwrap_err(), LineError::NoSamples);
        assert_eq!(
            parse_feature_line("1.0 3 x").unwrap_err(),
            LineError::InvalidSample("x".to_string())
        );
        assert_eq!(
            parse_feature_line("1.0 3 NaN").unwrap_err(),
            LineError::InvalidSample("NaN".to_string())
        );
        assert!(matches!(
            parse_feature_line("abc 1 2").unwrap_err(),
            LineError::Timestamp(_)
        ));
    }

    #[test]
    fn test_video_name_is_file_stem() {
        assert_eq!(video_name(Path::new("/data/tv/mega-2014_04_11.txt")), "mega-2014_04_11");
        assert_eq!(video_name(Path::new("adA")), "adA");
    }

    #[tokio::test]
    async fn test_read_feature_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mega.txt");
        tokio::fs::write(&path, "0.0 1 2\n\n0.5 3 4\n").await.unwrap();

        let file = read_feature_file(&path).await.unwrap();
        assert_eq!(file.name, "mega");
        assert_eq!(file.len(), 2);
        assert_eq!(file.dimension(), Some(2));
        assert_eq!(file.frames[1].timestamp, 0.5);
    }

    #[tokio::test]
    async fn test_inconsistent_dimension_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.txt");
        tokio::fs::write(&path, "0.0 1 2\n0.5 3\n").await.unwrap();

        match read_feature_file(&path).await.unwrap_err() {
            MediaError::MalformedLine { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("expected 2 samples, found 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = read_feature_file("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_load_library_sorted_by_file_name() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("zeta.txt"), "0.0 1 1\n").await.unwrap();
        tokio::fs::write(dir.path().join("alpha.txt"), "0.0 0 0\n0.04 2 2\n")
            .await
            .unwrap();
        tokio::fs::create_dir(dir.path().join("nested")).await.unwrap();

        let library = load_reference_library(dir.path()).await.unwrap();
        let names: Vec<_> = library.iter().map(ReferenceClip::name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(library.get("alpha").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_load_empty_library() {
        let dir = TempDir::new().unwrap();
        let err = load_reference_library(dir.path()).await.unwrap_err();
        assert!(matches!(err, MediaError::Library(ModelError::EmptyLibrary)));
    }

    #[tokio::test]
    async fn test_load_library_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("a.txt"), "0.0 1 1\n").await.unwrap();
        tokio::fs::write(dir.path().join("b.txt"), "0.0 1 1 1\n").await.unwrap();

        let err = load_reference_library(dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            MediaError::Library(ModelError::DimensionMismatch { .. })
        ));
    }
}
