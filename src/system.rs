//! Handing files and folders to the operating system

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::Result;

/// Open a file or folder with the system default application
pub fn open_path(path: &Path) -> Result<()> {
    debug!("Opening {}", path.display());

    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(path).spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Command::new("xdg-open").arg(path).spawn()?;
    }
    Ok(())
}

/// Open the folder that contains `path`
pub fn open_containing_folder(path: &Path) -> Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => open_path(parent),
        None => open_path(Path::new(".")),
    }
}
