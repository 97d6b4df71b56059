use std::path::PathBuf;

use crate::imaging::ProbedImage;
use crate::job::JobEvent;
use crate::layout::PageSize;
use crate::sequence::{ImageId, SequenceId};
use crate::settings::ThemeMode;

/// Startup options passed from the command line
#[derive(Debug, Clone, Default)]
pub struct Flags {
    /// Images to preload into the first sequence
    pub files: Vec<PathBuf>,
}

/// Outcome of probing a batch of files off the UI thread
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    pub probed: Vec<ProbedImage>,
    pub rejected: Vec<(PathBuf, String)>,
}

/// Identifies one batch of files being probed
///
/// Tickets are never reused within a session, unlike sequence ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeTicket(pub(crate) u64);

#[derive(Debug, Clone)]
pub enum Message {
    // Toolbar
    ThemeSelected(ThemeMode),
    TailPageToggled(bool),
    ChooseTailPage,
    TailPageChosen(Option<PathBuf>),
    ToggleAbout,

    // Sequence tabs
    SelectSequence(SequenceId),
    AddSequence,
    RemoveSequence(SequenceId),
    RemoveSequenceConfirmed(SequenceId, bool),

    // Adding images
    PickImages,
    ImagesPicked(Option<Vec<PathBuf>>),
    FileDropped(PathBuf),
    ImagesProbed(ProbeTicket, ProbeOutcome),

    // Grid
    MoveImage(ImageId, isize),
    RemoveImage(ImageId),
    SortByName,
    ClearAll,
    ClearConfirmed(SequenceId, bool),

    // Output settings
    PageSizeSelected(PageSize),
    MarginChanged(f32),
    QualityChanged(f32),
    NameChanged(String),
    ChooseSequenceTrailer,
    SequenceTrailerChosen(SequenceId, Option<PathBuf>),
    ClearSequenceTrailer,

    // Generation
    GenerateCurrent,
    GenerateAll,
    SavePathChosen(SequenceId, Option<PathBuf>),
    BatchDirChosen(Option<PathBuf>),
    Job(JobEvent),
    OpenOutput(Option<PathBuf>),

    /// A message dialog was dismissed, nothing to do
    DialogClosed,
}
