use crate::progress::Progress;
use cargo_metadata::MetadataCommand;
use eyre::{eyre, WrapErr};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// The two deployable functions of the pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Role {
    Collector,
    Worker,
}

impl Role {
    pub(crate) const BOTH: [Role; 2] = [Role::Collector, Role::Worker];

    /// Binary name inside the functions crate
    pub(crate) fn bin_name(&self) -> &'static str {
        match self {
            Role::Collector => "collector",
            Role::Worker => "worker",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.bin_name())
    }
}

/// A built and compressed function, ready for upload
pub(crate) struct Bundle {
    pub(crate) role: Role,
    pub(crate) archive_path: PathBuf,
    pub(crate) archive: Vec<u8>,
    pub(crate) sha256_hex: String,
}

/// Builds function binaries and compresses them under `dist/`
pub(crate) struct Packager {
    dist_dir: PathBuf,
    target: String,
}

impl Packager {
    pub(crate) fn new(target: &str) -> Self {
        Self {
            dist_dir: PathBuf::from("dist"),
            target: target.to_string(),
        }
    }

    /// Package one function: a fresh staging directory, a locked release
    /// build, the binary staged as `bootstrap`, and the archive next to it
    ///
    /// The staging directory is removed once the archive exists
    pub(crate) async fn package(&self, role: Role, progress: &Progress) -> eyre::Result<Bundle> {
        let staging = self.staging_dir(role);
        fresh_dir(&staging).await?;

        self.build(role, progress).await?;

        let binary = self.built_binary(role)?;

        tokio::fs::copy(&binary, staging.join("bootstrap"))
            .await
            .wrap_err(format!("Could not stage {}", binary.display()))?;

        let archive_path = self.archive_path(role);
        compress(staging.clone(), archive_path.clone()).await?;

        tokio::fs::remove_dir_all(&staging)
            .await
            .wrap_err("Could not remove the staging directory")?;

        let archive = tokio::fs::read(&archive_path)
            .await
            .wrap_err("Could not read the archive back")?;

        let sha256_hex = sha256::digest(archive.as_slice());

        Ok(Bundle {
            role,
            archive_path,
            archive,
            sha256_hex,
        })
    }

    /// Remove the archives and anything else left under `dist/`
    pub(crate) async fn cleanup(&self) -> eyre::Result<()> {
        if self.dist_dir.exists() {
            tokio::fs::remove_dir_all(&self.dist_dir)
                .await
                .wrap_err("Could not clean up the dist directory")?;
        }

        Ok(())
    }

    pub(crate) fn staging_dir(&self, role: Role) -> PathBuf {
        self.dist_dir.join(role.bin_name())
    }

    pub(crate) fn archive_path(&self, role: Role) -> PathBuf {
        self.dist_dir.join(format!("{}.zip", role.bin_name()))
    }

    async fn build(&self, role: Role, progress: &Progress) -> eyre::Result<()> {
        let mut cmd = tokio::process::Command::new("cargo")
            .arg("build")
            .arg("--release")
            .arg("--locked")
            .arg("--package")
            .arg("functions")
            .arg("--bin")
            .arg(role.bin_name())
            .arg("--target")
            .arg(&self.target)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .wrap_err("Failed to execute cargo")?;

        let mut is_failed = false;
        let mut error_message_lines = Vec::new();

        if let Some(stderr) = cmd.stderr.take() {
            let mut reader = BufReader::new(stderr).lines();

            while let Some(line) = reader.next_line().await? {
                // Everything after the first error line belongs to the error
                if line.trim().starts_with("error") || is_failed {
                    is_failed = true;
                    error_message_lines.push(line);
                    continue;
                }

                progress.building(line.trim());
            }
        }

        let status = cmd.wait().await?;

        if !status.success() {
            return Err(eyre!(
                "Build of {role} failed\n{}",
                error_message_lines.join("\n")
            ));
        }

        Ok(())
    }

    /// Where cargo left the binary for the configured target
    fn built_binary(&self, role: Role) -> eyre::Result<PathBuf> {
        let metadata = MetadataCommand::new()
            .no_deps()
            .exec()
            .wrap_err("Could not read cargo metadata")?;

        Ok(metadata
            .target_directory
            .join(&self.target)
            .join("release")
            .join(role.bin_name())
            .into_std_path_buf())
    }
}

/// Recreate a directory empty, dropping leftovers of earlier runs
async fn fresh_dir(path: &Path) -> eyre::Result<()> {
    if path.exists() {
        tokio::fs::remove_dir_all(path)
            .await
            .wrap_err(format!("Could not clear {}", path.display()))?;
    }

    tokio::fs::create_dir_all(path)
        .await
        .wrap_err(format!("Could not create {}", path.display()))?;

    Ok(())
}

/// Compress the staging directory into the archive, entries executable
///
/// The zip writer is synchronous, so it runs on a blocking task
async fn compress(staging: PathBuf, archive_path: PathBuf) -> eyre::Result<()> {
    tokio::task::spawn_blocking(move || -> eyre::Result<()> {
        let file =
            std::fs::File::create(&archive_path).wrap_err("Could not create the archive file")?;

        let mut zip = zip::ZipWriter::new(file);

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o755);

        for entry in walkdir::WalkDir::new(&staging) {
            let entry = entry.wrap_err("Could not walk the staging directory")?;

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry
                .path()
                .strip_prefix(&staging)
                .wrap_err("Entry outside the staging directory")?
                .to_string_lossy()
                .into_owned();

            zip.start_file(name, options)
                .wrap_err("Could not open a ZIP entry")?;

            let contents = std::fs::read(entry.path()).wrap_err("Could not read a staged file")?;

            zip.write_all(&contents)
                .wrap_err("Could not write to the ZIP file")?;
        }

        zip.finish().wrap_err("Could not close the ZIP file")?;
        Ok(())
    })
    .await
    .wrap_err("Failed to spawn the blocking task")?
    .wrap_err("Failed to create a ZIP archive")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gdelt-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn fresh_dir_drops_leftovers() {
        let dir = scratch("fresh");

        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("stale.zip"), b"old").await.unwrap();

        fresh_dir(&dir).await.unwrap();

        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn archive_carries_an_executable_bootstrap() {
        let dir = scratch("archive");
        let staging = dir.join("staging");

        tokio::fs::create_dir_all(&staging).await.unwrap();
        tokio::fs::write(staging.join("bootstrap"), b"fake binary")
            .await
            .unwrap();

        let archive_path = dir.join("worker.zip");
        compress(staging, archive_path.clone()).await.unwrap();

        let file = std::fs::File::open(&archive_path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name("bootstrap").unwrap();

        assert_eq!(entry.unix_mode().unwrap() & 0o777, 0o755);

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"fake binary");

        drop(entry);
        drop(archive);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn paths_are_per_role() {
        let packager = Packager::new("x86_64-unknown-linux-musl");

        assert_eq!(packager.staging_dir(Role::Collector), Path::new("dist/collector"));
        assert_eq!(packager.archive_path(Role::Worker), Path::new("dist/worker.zip"));
    }
}
