//! Background PDF generation
//!
//! A [`Job`] is a list of PDFs to write. [`spawn`] runs it on a dedicated
//! worker thread and streams [`JobEvent`]s back over an unbounded channel,
//! which the GUI turns into a subscription-like task stream.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;

use futures::channel::mpsc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::format::sanitize_filename;
use crate::layout::PageSize;
use crate::pdf::{assemble_pdf, AssembleOptions, AssemblyProgress, DEFAULT_QUALITY};
use crate::sequence::{Sequence, Workspace};

/// Output settings shared by every target of a job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSettings {
    pub page_size: PageSize,
    pub quality: u8,
    pub margin_mm: f32,
    pub skip_unreadable: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            page_size: PageSize::Original,
            quality: DEFAULT_QUALITY,
            margin_mm: 0.0,
            skip_unreadable: false,
        }
    }
}

/// One PDF to write
#[derive(Debug, Clone, PartialEq)]
pub struct JobTarget {
    pub name: String,
    pub pages: Vec<PathBuf>,
    pub output: PathBuf,
}

/// A generation request, snapshotted from the workspace when it starts
#[derive(Debug, Clone)]
pub struct Job {
    pub targets: Vec<JobTarget>,
    pub settings: OutputSettings,
}

impl Job {
    /// Write one sequence to `output`
    pub fn single(
        sequence: &Sequence,
        output: PathBuf,
        default_trailer: Option<&Path>,
        settings: OutputSettings,
    ) -> Result<Self> {
        if sequence.is_empty() {
            return Err(Error::NoImages);
        }
        Ok(Self {
            targets: vec![JobTarget {
                name: sequence.name().to_string(),
                pages: sequence.pages(default_trailer),
                output,
            }],
            settings,
        })
    }

    /// Write every non-empty sequence into `dir`, one PDF each
    ///
    /// File names come from the sequence names. Names that sanitize to the
    /// same file get a ` (2)`, ` (3)`... suffix.
    pub fn batch(
        workspace: &Workspace,
        dir: &Path,
        default_trailer: Option<&Path>,
        settings: OutputSettings,
    ) -> Result<Self> {
        let mut used = HashSet::new();
        let targets: Vec<JobTarget> = workspace
            .non_empty()
            .map(|sequence| {
                let stem = unique_stem(file_stem_for(sequence), &mut used);
                JobTarget {
                    name: sequence.name().to_string(),
                    pages: sequence.pages(default_trailer),
                    output: dir.join(format!("{stem}.pdf")),
                }
            })
            .collect();

        if targets.is_empty() {
            return Err(Error::NoImages);
        }
        Ok(Self { targets, settings })
    }

    pub fn total_pages(&self) -> usize {
        self.targets.iter().map(|t| t.pages.len()).sum()
    }
}

fn file_stem_for(sequence: &Sequence) -> String {
    let stem = sanitize_filename(sequence.name().trim());
    if stem.is_empty() {
        format!("Collection {}", sequence.id())
    } else {
        stem
    }
}

fn unique_stem(stem: String, used: &mut HashSet<String>) -> String {
    let mut candidate = stem.clone();
    let mut n = 2;
    while !used.insert(candidate.to_lowercase()) {
        candidate = format!("{stem} ({n})");
        n += 1;
    }
    candidate
}

/// Events sent from the worker thread
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// About to process `page` of `total` for target `target`
    Progress {
        target: usize,
        target_count: usize,
        page: usize,
        total: usize,
    },
    TargetDone {
        target: usize,
        output: PathBuf,
        pages: usize,
        skipped: usize,
    },
    TargetFailed {
        target: usize,
        name: String,
        error: String,
    },
    Finished(JobSummary),
}

/// Totals reported once every target was attempted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, String)>,
}

impl JobSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.written.is_empty()
    }
}

/// A running job
pub struct JobHandle {
    pub events: mpsc::UnboundedReceiver<JobEvent>,
    pub thread: thread::JoinHandle<()>,
}

/// Forwards assembler progress into the job channel
struct ChannelProgress<'a> {
    sender: &'a mpsc::UnboundedSender<JobEvent>,
    target: usize,
    target_count: usize,
}

impl AssemblyProgress for ChannelProgress<'_> {
    fn on_page(&self, current: usize, total: usize, _path: &Path) {
        // A closed receiver only means nobody is watching any more
        let _ = self.sender.unbounded_send(JobEvent::Progress {
            target: self.target,
            target_count: self.target_count,
            page: current,
            total,
        });
    }
}

/// Run every target of `job` synchronously, reporting through `sender`
pub fn run(job: &Job, sender: &mpsc::UnboundedSender<JobEvent>) -> JobSummary {
    let target_count = job.targets.len();
    let mut summary = JobSummary::default();
    info!(
        "Starting job: {} target(s), {} page(s)",
        target_count,
        job.total_pages()
    );

    for (index, target) in job.targets.iter().enumerate() {
        let options = AssembleOptions {
            image_paths: target.pages.clone(),
            output_path: target.output.clone(),
            page_size: job.settings.page_size,
            quality: job.settings.quality,
            margin_mm: job.settings.margin_mm,
            skip_unreadable: job.settings.skip_unreadable,
            title: Some(target.name.clone()),
        };
        let progress = ChannelProgress {
            sender,
            target: index,
            target_count,
        };

        let event = match assemble_pdf(&options, &progress) {
            Ok(report) => {
                summary.written.push(report.output_path.clone());
                JobEvent::TargetDone {
                    target: index,
                    output: report.output_path,
                    pages: report.page_count,
                    skipped: report.skipped.len(),
                }
            }
            Err(e) => {
                warn!("Failed to write {}: {}", target.output.display(), e);
                summary.failed.push((target.name.clone(), e.to_string()));
                JobEvent::TargetFailed {
                    target: index,
                    name: target.name.clone(),
                    error: e.to_string(),
                }
            }
        };
        let _ = sender.unbounded_send(event);
    }

    info!(
        "Job finished: {} written, {} failed",
        summary.written.len(),
        summary.failed.len()
    );
    summary
}

/// Start `job` on its own worker thread
pub fn spawn(job: Job) -> Result<JobHandle> {
    let (sender, events) = mpsc::unbounded();
    let thread = thread::Builder::new()
        .name("pdf-worker".to_string())
        .spawn(move || {
            let summary = run(&job, &sender);
            let _ = sender.unbounded_send(JobEvent::Finished(summary));
        })?;

    Ok(JobHandle { events, thread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Workspace;
    use futures::StreamExt;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_jpg(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(12, 18, Rgb([40, 80, 120]))
            .save(&path)
            .expect("failed to write jpg");
        path
    }

    #[test]
    fn test_unique_stem_suffixes_duplicates() {
        let mut used = HashSet::new();
        assert_eq!(unique_stem("Vol".into(), &mut used), "Vol");
        assert_eq!(unique_stem("vol".into(), &mut used), "vol (2)");
        assert_eq!(unique_stem("Vol".into(), &mut used), "Vol (3)");
    }

    #[test]
    fn test_batch_skips_empty_sequences_and_sanitizes() {
        let dir = TempDir::new().unwrap();
        let image = write_jpg(dir.path(), "a.jpg");

        let mut workspace = Workspace::new();
        let first = workspace.current_id();
        workspace.rename(first, "Vol: 1?").unwrap();
        workspace.add_images(first, &[image.clone()], None).unwrap();
        workspace.add_sequence().unwrap();
        let third = workspace.add_sequence().unwrap();
        workspace.add_images(third, &[image], None).unwrap();

        let job = Job::batch(&workspace, dir.path(), None, OutputSettings::default()).unwrap();
        let outputs: Vec<PathBuf> = job.targets.iter().map(|t| t.output.clone()).collect();
        assert_eq!(
            outputs,
            vec![
                dir.path().join("Vol_ 1_.pdf"),
                dir.path().join("Collection 3.pdf")
            ]
        );
    }

    #[test]
    fn test_batch_of_empty_workspace_fails() {
        let workspace = Workspace::new();
        let result = Job::batch(&workspace, Path::new("."), None, OutputSettings::default());
        assert!(matches!(result, Err(Error::NoImages)));
    }

    #[test]
    fn test_spawn_reports_failure_and_continues() {
        let dir = TempDir::new().unwrap();
        let image = write_jpg(dir.path(), "page.jpg");

        let job = Job {
            targets: vec![
                JobTarget {
                    name: "broken".into(),
                    pages: vec![dir.path().join("missing.jpg")],
                    output: dir.path().join("broken.pdf"),
                },
                JobTarget {
                    name: "good".into(),
                    pages: vec![image],
                    output: dir.path().join("good.pdf"),
                },
            ],
            settings: OutputSettings::default(),
        };

        let handle = spawn(job).unwrap();
        let events: Vec<JobEvent> = futures::executor::block_on(handle.events.collect());
        handle.thread.join().unwrap();

        assert!(matches!(events[1], JobEvent::TargetFailed { target: 0, .. }));
        match events.last() {
            Some(JobEvent::Finished(summary)) => {
                assert_eq!(summary.written, vec![dir.path().join("good.pdf")]);
                assert_eq!(summary.failed.len(), 1);
                assert!(!summary.is_success());
            }
            other => panic!("unexpected last event {:?}", other),
        }
        assert!(dir.path().join("good.pdf").exists());
    }
}
