use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "mediactl";

pub fn data_dir() -> PathBuf {
    // Same XDG layout on macOS and Linux
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_NAME)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
    }
}

pub fn config_dir() -> PathBuf {
    // On Windows, a config.toml next to the executable wins (portable install)
    #[cfg(windows)]
    {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                if exe_dir.join("config.toml").exists() {
                    return exe_dir.to_path_buf();
                }
            }
        }
    }

    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_NAME)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
    }
}

pub fn cache_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".cache")
            .join(APP_NAME)
    }
    #[cfg(windows)]
    {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_NAME)
    }
}

/// Location of the player's IPC endpoint. On Unix this is a socket file
/// inside the cache directory; on Windows a named pipe.
#[cfg(unix)]
pub fn mpv_socket_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("mpv.sock")
}

#[cfg(windows)]
pub fn mpv_socket_path(_cache_dir: &Path) -> PathBuf {
    PathBuf::from(r"\\.\pipe\mediactl-mpv")
}

#[cfg(unix)]
pub fn mpv_binary_name() -> &'static str {
    "mpv"
}

#[cfg(windows)]
pub fn mpv_binary_name() -> &'static str {
    "mpv.exe"
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|p| p.is_file())
}

/// Find the mpv binary. An explicit override is used as-is when it exists;
/// bare names are looked up on PATH.
pub fn find_mpv_binary(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = override_path {
        if p.is_file() {
            return Some(p.to_path_buf());
        }
        if p.components().count() == 1 {
            return find_on_path(&p.to_string_lossy());
        }
        return None;
    }

    // Beside the current exe (bundled builds)
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let local = dir.join(mpv_binary_name());
            if local.is_file() {
                return Some(local);
            }
        }
    }

    find_on_path(mpv_binary_name())
}
