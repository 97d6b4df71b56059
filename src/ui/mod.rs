//! Desktop GUI built on iced
//!
//! The [`App`] owns the session [`Workspace`] and the persisted [`Settings`].
//! Decoding and PDF generation never run in `update`: probing is a
//! `Task::perform` and generation streams [`JobEvent`]s back from the
//! `job` worker thread through `Task::run`.

mod dialogs;
mod message;
mod theme;
mod view;

pub use message::{Flags, Message, ProbeOutcome, ProbeTicket};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use iced::widget::image::Handle;
use iced::{event, window, Element, Subscription, Task, Theme};
use tracing::{info, warn};

use crate::format::{format_file_size, is_image_file, sanitize_filename};
use crate::imaging::{self, THUMBNAIL_WIDTH};
use crate::job::{self, Job, JobEvent, JobSummary};
use crate::sequence::{ImageId, SequenceId, Workspace};
use crate::settings::{self, Settings, MAX_MARGIN_MM, MAX_QUALITY, MIN_QUALITY};
use crate::system;

pub const WINDOW_DEFAULT_WIDTH: f32 = 1200.0;
pub const WINDOW_DEFAULT_HEIGHT: f32 = 800.0;
pub const MIN_WINDOW_WIDTH: f32 = 900.0;
pub const MIN_WINDOW_HEIGHT: f32 = 600.0;

/// Progress of the running generation job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Generation {
    /// Overall completion in `0.0..=1.0`
    pub fraction: f32,
    pub target: usize,
    pub target_count: usize,
}

pub struct App {
    workspace: Workspace,
    settings: Settings,
    thumbnails: HashMap<ImageId, Handle>,
    /// Probe tasks still in flight and the sequence each one feeds
    probes: HashMap<ProbeTicket, SequenceId>,
    next_probe: u64,
    generation: Option<Generation>,
    status: String,
    show_about: bool,
    /// Text in the output-name field, which may be empty while typing
    name_draft: Option<(SequenceId, String)>,
}

pub fn window_settings() -> window::Settings {
    window::Settings {
        size: iced::Size::new(WINDOW_DEFAULT_WIDTH, WINDOW_DEFAULT_HEIGHT),
        min_size: Some(iced::Size::new(MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT)),
        ..window::Settings::default()
    }
}

/// Entry point used by the binary to launch the iced application loop
pub fn run(flags: Flags) -> iced::Result {
    use std::cell::RefCell;

    // iced 0.14 requires Fn for boot while the flags may only be consumed once
    let boot_state = RefCell::new(Some(flags));
    let boot = move || {
        let flags = boot_state
            .borrow_mut()
            .take()
            .expect("Boot function called more than once");
        App::new(flags)
    };

    iced::application(boot, App::update, App::view)
        .title(App::title)
        .theme(App::theme)
        .window(window_settings())
        .subscription(App::subscription)
        .run()
}

impl App {
    fn new(flags: Flags) -> (Self, Task<Message>) {
        let (settings, warning) = settings::load();
        let mut app = App {
            workspace: Workspace::new(),
            settings,
            thumbnails: HashMap::new(),
            probes: HashMap::new(),
            next_probe: 0,
            generation: None,
            status: "Ready".to_string(),
            show_about: false,
            name_draft: None,
        };

        let mut tasks = Vec::new();
        if let Some(warning) = warning {
            tasks.push(show_error("Settings".to_string(), warning));
        }
        if !flags.files.is_empty() {
            let id = app.workspace.current_id();
            tasks.push(app.probe_files(id, flags.files));
        }
        (app, Task::batch(tasks))
    }

    fn title(&self) -> String {
        match &self.generation {
            Some(g) => format!("MangaPDF ({:.0}%)", g.fraction * 100.0),
            None => "MangaPDF".to_string(),
        }
    }

    fn theme(&self) -> Theme {
        theme::iced_theme(self.settings.general.theme)
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            event::Event::Window(window::Event::FileDropped(path)) => {
                Some(Message::FileDropped(path))
            }
            _ => None,
        })
    }

    pub fn is_generating(&self) -> bool {
        self.generation.is_some()
    }

    fn is_loading(&self) -> bool {
        !self.probes.is_empty()
    }

    /// Pages the current sequence would produce, trailer included
    fn page_count(&self) -> usize {
        self.workspace
            .current()
            .page_count(self.settings.default_trailer())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ThemeSelected(mode) => {
                self.settings.general.theme = mode;
                self.persist();
                Task::none()
            }
            Message::TailPageToggled(enabled) => {
                self.settings.tail_page.enabled = enabled;
                self.persist();
                if enabled && self.settings.tail_page.path.is_none() {
                    return self.update(Message::ChooseTailPage);
                }
                Task::none()
            }
            Message::ChooseTailPage => {
                let dir = self.settings.paths.last_open_directory.clone();
                Task::perform(dialogs::pick_tail_page(dir), Message::TailPageChosen)
            }
            Message::TailPageChosen(Some(path)) => {
                if !is_image_file(&path) {
                    return show_error(
                        "Tail page".to_string(),
                        format!("{} is not a supported image", path.display()),
                    );
                }
                self.status = format!("Tail page: {}", display_file_name(&path));
                self.settings.tail_page.path = Some(path);
                self.settings.tail_page.enabled = true;
                self.persist();
                Task::none()
            }
            Message::TailPageChosen(None) => {
                if self.settings.tail_page.path.is_none() {
                    self.settings.tail_page.enabled = false;
                    self.persist();
                }
                Task::none()
            }
            Message::ToggleAbout => {
                self.show_about = !self.show_about;
                Task::none()
            }

            Message::SelectSequence(id) => {
                self.name_draft = None;
                if let Err(e) = self.workspace.select(id) {
                    warn!("{}", e);
                }
                Task::none()
            }
            Message::AddSequence => {
                self.name_draft = None;
                match self.workspace.add_sequence() {
                    Ok(id) => self.status = format!("Created {}", self.sequence_name(id)),
                    Err(e) => self.status = e.to_string(),
                }
                Task::none()
            }
            Message::RemoveSequence(id) => {
                let name = self.sequence_name(id);
                Task::perform(
                    dialogs::confirm(
                        "Delete sequence".to_string(),
                        format!("Delete \"{name}\" and all of its images?"),
                    ),
                    move |yes| Message::RemoveSequenceConfirmed(id, yes),
                )
            }
            Message::RemoveSequenceConfirmed(id, true) => {
                let images: Vec<ImageId> = self
                    .workspace
                    .get(id)
                    .map(|s| s.images().iter().map(|e| e.id).collect())
                    .unwrap_or_default();
                match self.workspace.remove_sequence(id) {
                    Ok(()) => {
                        for image in images {
                            self.thumbnails.remove(&image);
                        }
                        // a new sequence may reuse this id
                        self.probes.retain(|_, target| *target != id);
                        self.name_draft = None;
                        self.status = "Sequence deleted".to_string();
                    }
                    Err(e) => self.status = e.to_string(),
                }
                Task::none()
            }
            Message::RemoveSequenceConfirmed(_, false) => Task::none(),

            Message::PickImages => {
                let dir = self.settings.paths.last_open_directory.clone();
                Task::perform(dialogs::pick_images(dir), Message::ImagesPicked)
            }
            Message::ImagesPicked(Some(paths)) if !paths.is_empty() => {
                if let Some(dir) = paths[0].parent() {
                    self.settings.paths.last_open_directory = Some(dir.to_path_buf());
                    self.persist();
                }
                let id = self.workspace.current_id();
                self.probe_files(id, paths)
            }
            Message::ImagesPicked(_) => Task::none(),
            Message::FileDropped(path) => {
                if self.is_generating() {
                    return Task::none();
                }
                let id = self.workspace.current_id();
                self.probe_files(id, vec![path])
            }
            Message::ImagesProbed(ticket, outcome) => match self.probes.remove(&ticket) {
                Some(id) => self.insert_probed(id, outcome),
                None => {
                    info!(
                        "Dropping {} probed image(s) for a deleted sequence",
                        outcome.probed.len()
                    );
                    Task::none()
                }
            },

            Message::MoveImage(image, delta) => {
                let id = self.workspace.current_id();
                if let Err(e) = self.workspace.move_image_by(id, image, delta) {
                    warn!("{}", e);
                }
                Task::none()
            }
            Message::RemoveImage(image) => {
                let id = self.workspace.current_id();
                match self.workspace.remove_image(id, image) {
                    Ok(entry) => {
                        self.thumbnails.remove(&entry.id);
                        self.status = format!("Removed {}", entry.file_name());
                    }
                    Err(e) => warn!("{}", e),
                }
                Task::none()
            }
            Message::SortByName => {
                let id = self.workspace.current_id();
                if let Err(e) = self.workspace.sort_by_name(id) {
                    warn!("{}", e);
                }
                Task::none()
            }
            Message::ClearAll => {
                let sequence = self.workspace.current();
                if sequence.is_empty() {
                    return Task::none();
                }
                let id = sequence.id();
                let description = format!(
                    "Remove all {} images from \"{}\"?",
                    sequence.len(),
                    sequence.name()
                );
                Task::perform(
                    dialogs::confirm("Clear sequence".to_string(), description),
                    move |yes| Message::ClearConfirmed(id, yes),
                )
            }
            Message::ClearConfirmed(id, true) => {
                if let Ok(sequence) = self.workspace.get(id) {
                    for entry in sequence.images() {
                        self.thumbnails.remove(&entry.id);
                    }
                }
                match self.workspace.clear(id) {
                    Ok(removed) => self.status = format!("Removed {removed} images"),
                    Err(e) => warn!("{}", e),
                }
                Task::none()
            }
            Message::ClearConfirmed(_, false) => Task::none(),

            Message::PageSizeSelected(page_size) => {
                self.settings.output.page_size = page_size;
                self.persist();
                Task::none()
            }
            Message::MarginChanged(margin) => {
                self.settings.output.margin_mm = margin.clamp(0.0, MAX_MARGIN_MM).round();
                self.persist();
                Task::none()
            }
            Message::QualityChanged(quality) => {
                self.settings.output.quality =
                    (quality.round() as u8).clamp(MIN_QUALITY, MAX_QUALITY);
                self.persist();
                Task::none()
            }
            Message::NameChanged(name) => {
                let id = self.workspace.current_id();
                if let Err(e) = self.workspace.rename(id, &name) {
                    warn!("{}", e);
                }
                self.name_draft = Some((id, name));
                Task::none()
            }
            Message::ChooseSequenceTrailer => {
                let id = self.workspace.current_id();
                let dir = self.settings.paths.last_open_directory.clone();
                Task::perform(dialogs::pick_tail_page(dir), move |path| {
                    Message::SequenceTrailerChosen(id, path)
                })
            }
            Message::SequenceTrailerChosen(id, Some(path)) => {
                let name = display_file_name(&path);
                match self.workspace.set_trailer(id, Some(path)) {
                    Ok(()) => {
                        self.status = format!("{} ends with {}", self.sequence_name(id), name);
                        Task::none()
                    }
                    Err(e) => show_error("Tail page".to_string(), e.to_string()),
                }
            }
            Message::SequenceTrailerChosen(_, None) => Task::none(),
            Message::ClearSequenceTrailer => {
                let id = self.workspace.current_id();
                if let Err(e) = self.workspace.set_trailer(id, None) {
                    warn!("{}", e);
                }
                Task::none()
            }

            Message::GenerateCurrent => {
                let sequence = self.workspace.current();
                if sequence.is_empty() {
                    self.status = "Add images before generating a PDF".to_string();
                    return Task::none();
                }
                let id = sequence.id();
                let file_name = format!("{}.pdf", sanitize_filename(sequence.name().trim()));
                let dir = self.settings.paths.last_save_directory.clone();
                Task::perform(dialogs::save_pdf(dir, file_name), move |path| {
                    Message::SavePathChosen(id, path)
                })
            }
            Message::SavePathChosen(id, Some(path)) => {
                let output = with_pdf_extension(path);
                self.remember_save_directory(&output);
                let sequence = match self.workspace.get(id) {
                    Ok(sequence) => sequence,
                    Err(e) => return show_error("Generate".to_string(), e.to_string()),
                };
                let settings = self.settings.output_settings(false);
                match Job::single(sequence, output, self.settings.default_trailer(), settings) {
                    Ok(job) => self.start_job(job),
                    Err(e) => show_error("Generate".to_string(), e.to_string()),
                }
            }
            Message::SavePathChosen(_, None) => Task::none(),
            Message::GenerateAll => {
                if self.workspace.non_empty().next().is_none() {
                    self.status = "Add images before generating a PDF".to_string();
                    return Task::none();
                }
                let dir = self.settings.paths.last_save_directory.clone();
                Task::perform(dialogs::pick_output_folder(dir), Message::BatchDirChosen)
            }
            Message::BatchDirChosen(Some(dir)) => {
                self.settings.paths.last_save_directory = Some(dir.clone());
                self.persist();
                let settings = self.settings.output_settings(false);
                match Job::batch(
                    &self.workspace,
                    &dir,
                    self.settings.default_trailer(),
                    settings,
                ) {
                    Ok(job) => self.start_job(job),
                    Err(e) => show_error("Generate".to_string(), e.to_string()),
                }
            }
            Message::BatchDirChosen(None) => Task::none(),
            Message::Job(event) => self.handle_job_event(event),
            Message::OpenOutput(Some(path)) => {
                let result = if path.is_dir() {
                    system::open_path(&path)
                } else {
                    system::open_containing_folder(&path)
                };
                if let Err(e) = result {
                    warn!("Could not open {}: {}", path.display(), e);
                }
                Task::none()
            }
            Message::OpenOutput(None) | Message::DialogClosed => Task::none(),
        }
    }

    fn view(&self) -> Element<'_, Message> {
        view::view(self)
    }

    /// Current contents of the output-name field
    fn name_field(&self) -> &str {
        let sequence = self.workspace.current();
        match &self.name_draft {
            Some((id, draft)) if *id == sequence.id() => draft,
            _ => sequence.name(),
        }
    }

    fn sequence_name(&self, id: SequenceId) -> String {
        self.workspace
            .get(id)
            .map(|s| s.name().to_string())
            .unwrap_or_default()
    }

    fn persist(&self) {
        if let Err(e) = settings::save(&self.settings) {
            warn!("Failed to save settings: {}", e);
        }
    }

    fn remember_save_directory(&mut self, output: &Path) {
        if let Some(dir) = output.parent() {
            self.settings.paths.last_save_directory = Some(dir.to_path_buf());
            self.persist();
        }
    }

    /// Probe files on a background task, thumbnails included
    fn probe_files(&mut self, id: SequenceId, paths: Vec<PathBuf>) -> Task<Message> {
        let ticket = self.start_probe(id);
        self.status = format!("Loading {} file(s)...", paths.len());
        Task::perform(
            async move {
                let mut sorted = paths;
                crate::format::sort_naturally(&mut sorted);
                let mut outcome = ProbeOutcome::default();
                for path in sorted {
                    match imaging::probe(&path, Some(THUMBNAIL_WIDTH)) {
                        Ok(image) => outcome.probed.push(image),
                        Err(e) => outcome.rejected.push((path, e.to_string())),
                    }
                }
                outcome
            },
            move |outcome| Message::ImagesProbed(ticket, outcome),
        )
    }

    /// Register a probe batch headed for `id`
    fn start_probe(&mut self, id: SequenceId) -> ProbeTicket {
        self.next_probe += 1;
        let ticket = ProbeTicket(self.next_probe);
        self.probes.insert(ticket, id);
        ticket
    }

    fn insert_probed(&mut self, id: SequenceId, outcome: ProbeOutcome) -> Task<Message> {
        let before: usize = self.workspace.get(id).map(|s| s.len()).unwrap_or(0);
        match self.workspace.insert_probed(id, outcome.probed) {
            Ok(added) => {
                self.status = format!("Added {added} image(s)");
                if let Ok(sequence) = self.workspace.get(id) {
                    for entry in &sequence.images()[before..] {
                        if let Some(thumb) = &entry.thumbnail {
                            self.thumbnails.insert(
                                entry.id,
                                Handle::from_rgba(thumb.width, thumb.height, thumb.pixels.clone()),
                            );
                        }
                    }
                }
            }
            Err(e) => warn!("Dropping probed images: {}", e),
        }

        if outcome.rejected.is_empty() {
            return Task::none();
        }
        for (path, reason) in &outcome.rejected {
            warn!("Rejected {}: {}", path.display(), reason);
        }
        let lines: Vec<String> = outcome
            .rejected
            .iter()
            .map(|(path, reason)| format!("{}: {}", display_file_name(path), reason))
            .collect();
        show_error(
            "Some files were not added".to_string(),
            format!(
                "Only JPG, PNG and WEBP images (plus BMP and GIF) can be added.\n\n{}",
                lines.join("\n")
            ),
        )
    }

    fn start_job(&mut self, job: Job) -> Task<Message> {
        info!("Generating {} PDF(s)", job.targets.len());
        let target_count = job.targets.len();
        match job::spawn(job) {
            Ok(handle) => {
                self.generation = Some(Generation {
                    fraction: 0.0,
                    target: 0,
                    target_count,
                });
                self.status = "Generating...".to_string();
                // The worker finishes on its own; its events are the only handle we need
                drop(handle.thread);
                Task::run(handle.events, Message::Job)
            }
            Err(e) => show_error("Generate".to_string(), e.to_string()),
        }
    }

    fn handle_job_event(&mut self, event: JobEvent) -> Task<Message> {
        match event {
            JobEvent::Progress {
                target,
                target_count,
                page,
                total,
            } => {
                let per_target = page as f32 / total.max(1) as f32;
                self.generation = Some(Generation {
                    fraction: (target as f32 + per_target) / target_count.max(1) as f32,
                    target,
                    target_count,
                });
                self.status = if target_count > 1 {
                    format!(
                        "PDF {}/{}: processing image {}/{}",
                        target + 1,
                        target_count,
                        page,
                        total
                    )
                } else {
                    format!("Processing image {page}/{total}")
                };
                Task::none()
            }
            JobEvent::TargetDone {
                output,
                pages,
                skipped,
                ..
            } => {
                let size = std::fs::metadata(&output)
                    .map(|m| format_file_size(m.len()))
                    .unwrap_or_default();
                self.status = format!("Wrote {} ({pages} pages, {size})", display_file_name(&output));
                if skipped > 0 {
                    self.status.push_str(&format!(", {skipped} skipped"));
                }
                Task::none()
            }
            JobEvent::TargetFailed { name, error, .. } => {
                self.status = format!("Failed to generate {name}: {error}");
                Task::none()
            }
            JobEvent::Finished(summary) => {
                self.generation = None;
                self.finish_job(summary)
            }
        }
    }

    fn finish_job(&mut self, summary: JobSummary) -> Task<Message> {
        if !summary.failed.is_empty() {
            let lines: Vec<String> = summary
                .failed
                .iter()
                .map(|(name, error)| format!("{name}: {error}"))
                .collect();
            self.status = format!("{} PDF(s) failed", summary.failed.len());
            let mut description = lines.join("\n");
            if !summary.written.is_empty() {
                description.push_str(&format!("\n\n{} PDF(s) were written.", summary.written.len()));
            }
            return show_error("PDF generation failed".to_string(), description);
        }

        let Some(first) = summary.written.first().cloned() else {
            return Task::none();
        };
        self.status = if summary.written.len() == 1 {
            format!("Saved {}", first.display())
        } else {
            format!("Saved {} PDFs", summary.written.len())
        };
        let description = summary
            .written
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Task::perform(dialogs::ask_open_output(description), move |yes| {
            Message::OpenOutput(yes.then(|| first.clone()))
        })
    }
}

fn show_error(title: String, description: String) -> Task<Message> {
    Task::perform(dialogs::error(title, description), |()| Message::DialogClosed)
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn with_pdf_extension(path: PathBuf) -> PathBuf {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        path
    } else {
        let mut name = path.clone().into_os_string();
        name.push(".pdf");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app() -> App {
        App {
            workspace: Workspace::new(),
            settings: Settings::default(),
            thumbnails: HashMap::new(),
            probes: HashMap::new(),
            next_probe: 0,
            generation: None,
            status: String::new(),
            show_about: false,
            name_draft: None,
        }
    }

    #[test]
    fn with_pdf_extension_appends_once() {
        assert_eq!(with_pdf_extension("out".into()), PathBuf::from("out.pdf"));
        assert_eq!(with_pdf_extension("out.PDF".into()), PathBuf::from("out.PDF"));
        assert_eq!(with_pdf_extension("vol.1".into()), PathBuf::from("vol.1.pdf"));
    }

    #[test]
    fn job_progress_updates_fraction_and_title() {
        let mut app = test_app();
        let _ = app.handle_job_event(JobEvent::Progress {
            target: 1,
            target_count: 2,
            page: 5,
            total: 10,
        });
        let generation = app.generation.expect("generation should be running");
        assert!((generation.fraction - 0.75).abs() < f32::EPSILON);
        assert_eq!(app.title(), "MangaPDF (75%)");
    }

    #[test]
    fn sequence_tabs_stop_at_five() {
        let mut app = test_app();
        for _ in 0..10 {
            let _ = app.update(Message::AddSequence);
        }
        assert_eq!(app.workspace.len(), crate::sequence::MAX_SEQUENCES);
    }

    #[test]
    fn probed_rejections_do_not_enter_sequence() {
        let mut app = test_app();
        let id = app.workspace.current_id();
        let outcome = ProbeOutcome {
            probed: Vec::new(),
            rejected: vec![(PathBuf::from("notes.txt"), "unsupported".to_string())],
        };
        let _ = app.insert_probed(id, outcome);
        assert!(app.workspace.current().is_empty());
    }

    fn probed(name: &str) -> ProbeOutcome {
        ProbeOutcome {
            probed: vec![imaging::ProbedImage {
                path: PathBuf::from(name),
                width: 10,
                height: 10,
                thumbnail: None,
            }],
            rejected: Vec::new(),
        }
    }

    #[test]
    fn view_builds_with_tail_page_enabled() {
        let mut app = test_app();
        app.settings.tail_page.enabled = true;
        app.settings.tail_page.path = Some(PathBuf::from("credits.png"));
        let _ = app.update(Message::AddSequence);
        let _element = app.view();
        // the missing credits.png is not counted
        assert_eq!(app.page_count(), 0);
    }

    #[test]
    fn stale_images_for_deleted_sequence_are_dropped() {
        let mut app = test_app();
        let _ = app.update(Message::AddSequence);
        let old = app.workspace.current_id();
        let ticket = app.start_probe(old);
        assert!(app.is_loading());

        let _ = app.update(Message::RemoveSequenceConfirmed(old, true));
        let _ = app.update(Message::AddSequence);
        let new = app.workspace.current_id();
        assert_eq!(new, old, "the freed id is reused");

        let _ = app.update(Message::ImagesProbed(ticket, probed("stale.png")));
        assert!(app.workspace.get(new).unwrap().is_empty());
        assert!(!app.is_loading());
    }

    #[test]
    fn loaded_images_land_in_their_original_sequence() {
        let mut app = test_app();
        let first = app.workspace.current_id();
        let ticket = app.start_probe(first);
        let _ = app.update(Message::AddSequence);

        let _ = app.update(Message::ImagesProbed(ticket, probed("page.png")));
        assert_eq!(app.workspace.get(first).unwrap().len(), 1);
        assert!(app.workspace.current().is_empty());
        assert!(!app.is_loading());
    }
}
