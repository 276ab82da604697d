use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::info;

use mediactl_proto::platform;

use crate::command::Precondition;

/// Starts player processes. Split out so tests can stand in a fake player.
pub trait Launcher: Send + Sync {
    /// Fails with `Precondition::PlayerMissing` when there is nothing to run.
    fn ensure_available(&self) -> anyhow::Result<()>;

    /// Start a detached player listening on `socket`. Must not wait for the
    /// socket to appear.
    fn launch(&self, socket: &Path, compact: bool) -> anyhow::Result<()>;
}

pub struct MpvLauncher {
    binary: Option<PathBuf>,
    log_path: PathBuf,
}

impl MpvLauncher {
    pub fn new(binary: Option<PathBuf>, log_path: PathBuf) -> Self {
        Self { binary, log_path }
    }

    fn binary(&self) -> anyhow::Result<PathBuf> {
        platform::find_mpv_binary(self.binary.as_deref()).ok_or_else(|| {
            let name = self
                .binary
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| platform::mpv_binary_name().to_string());
            anyhow::Error::new(Precondition::PlayerMissing(name))
        })
    }

    pub fn args(socket: &Path, compact: bool) -> Vec<String> {
        let mut args = vec![
            "--idle".to_string(),
            "--no-resume-playback".to_string(),
            "--no-input-terminal".to_string(),
            format!("--input-ipc-server={}", socket.display()),
        ];
        if compact {
            args.extend(
                ["-vo", "tct", "--really-quiet", "--vo-tct-buffering=frame", "--vo-tct-height=40"]
                    .map(String::from),
            );
        } else {
            args.push("--force-window=yes".to_string());
        }
        args
    }
}

impl Launcher for MpvLauncher {
    fn ensure_available(&self) -> anyhow::Result<()> {
        self.binary().map(|_| ())
    }

    fn launch(&self, socket: &Path, compact: bool) -> anyhow::Result<()> {
        let binary = self.binary()?;
        let mut cmd = tokio::process::Command::new(&binary);
        cmd.args(Self::args(socket, compact)).stdin(Stdio::null());

        if compact {
            // Terminal video draws on our stdout.
            cmd.stdout(Stdio::inherit()).stderr(Stdio::null());
        } else {
            if let Some(parent) = self.log_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let stderr_file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)?;
            cmd.stdout(Stdio::null()).stderr(stderr_file);
        }

        let child = cmd.spawn()?;
        info!(
            "mpv: spawned {} pid={:?} compact={}",
            binary.display(),
            child.id(),
            compact
        );
        // The player outlives us unless told to quit.
        drop(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windowed_args() {
        let args = MpvLauncher::args(Path::new("/tmp/x.sock"), false);
        assert!(args.contains(&"--idle".to_string()));
        assert!(args.contains(&"--input-ipc-server=/tmp/x.sock".to_string()));
        assert!(args.contains(&"--force-window=yes".to_string()));
        assert!(!args.contains(&"tct".to_string()));
    }

    #[test]
    fn compact_args_render_to_terminal() {
        let args = MpvLauncher::args(Path::new("/tmp/x.sock"), true);
        let vo = args.iter().position(|a| a == "-vo").unwrap();
        assert_eq!(args[vo + 1], "tct");
        assert!(args.contains(&"--vo-tct-height=40".to_string()));
        assert!(!args.contains(&"--force-window=yes".to_string()));
    }

    #[test]
    fn missing_binary_is_a_precondition() {
        let launcher = MpvLauncher::new(
            Some(PathBuf::from("/no/such/dir/mpv")),
            PathBuf::from("/tmp/mpv.log"),
        );
        let err = launcher.ensure_available().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Precondition>(),
            Some(Precondition::PlayerMissing(_))
        ));
    }
}
