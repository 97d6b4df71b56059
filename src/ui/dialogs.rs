//! Native dialogs, wrapped as async functions for `Task::perform`

use std::path::PathBuf;

use rfd::{AsyncFileDialog, AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};

use crate::format::SUPPORTED_EXTENSIONS;

fn image_dialog(directory: Option<PathBuf>) -> AsyncFileDialog {
    let mut dialog = AsyncFileDialog::new().add_filter("Images", SUPPORTED_EXTENSIONS);
    if let Some(dir) = directory.filter(|d| d.is_dir()) {
        dialog = dialog.set_directory(dir);
    }
    dialog
}

pub async fn pick_images(directory: Option<PathBuf>) -> Option<Vec<PathBuf>> {
    image_dialog(directory)
        .set_title("Add images")
        .pick_files()
        .await
        .map(|handles| handles.iter().map(|h| h.path().to_path_buf()).collect())
}

pub async fn pick_tail_page(directory: Option<PathBuf>) -> Option<PathBuf> {
    image_dialog(directory)
        .set_title("Choose tail page")
        .pick_file()
        .await
        .map(|h| h.path().to_path_buf())
}

pub async fn save_pdf(directory: Option<PathBuf>, file_name: String) -> Option<PathBuf> {
    let mut dialog = AsyncFileDialog::new()
        .set_title("Save PDF")
        .set_file_name(&file_name)
        .add_filter("PDF", &["pdf"]);
    if let Some(dir) = directory.filter(|d| d.is_dir()) {
        dialog = dialog.set_directory(dir);
    }
    dialog.save_file().await.map(|h| h.path().to_path_buf())
}

pub async fn pick_output_folder(directory: Option<PathBuf>) -> Option<PathBuf> {
    let mut dialog = AsyncFileDialog::new().set_title("Choose output folder");
    if let Some(dir) = directory.filter(|d| d.is_dir()) {
        dialog = dialog.set_directory(dir);
    }
    dialog.pick_folder().await.map(|h| h.path().to_path_buf())
}

/// Yes/No question, `true` when the user answered yes
pub async fn confirm(title: String, description: String) -> bool {
    let result = AsyncMessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::YesNo)
        .show()
        .await;
    matches!(result, MessageDialogResult::Yes)
}

pub async fn error(title: String, description: String) {
    AsyncMessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show()
        .await;
}

/// Report a finished job and offer to open the output location
pub async fn ask_open_output(description: String) -> bool {
    let result = AsyncMessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title("PDF created")
        .set_description(format!("{description}\n\nOpen the output folder?"))
        .set_buttons(MessageButtons::YesNo)
        .show()
        .await;
    matches!(result, MessageDialogResult::Yes)
}
