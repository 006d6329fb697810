use eyre::Context as _;
use rand::Rng as _;
use std::{
    fs::{self, OpenOptions},
    io::Write as _,
    path::{Path, PathBuf},
};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt as _, PermissionsExt as _};

#[cfg(unix)]
const MODE_DIR_PRIVATE: u32 = 0o700;
#[cfg(unix)]
const MODE_FILE_PRIVATE: u32 = 0o600;

fn is_symlink(p: &Path) -> eyre::Result<bool> {
    let md = fs::symlink_metadata(p).with_context(|| format!("stat {}", p.display()))?;
    Ok(md.file_type().is_symlink())
}

/// Create `dir` if needed and make sure it is a real, owner-only directory.
pub fn ensure_private_dir(dir: &Path) -> eyre::Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    } else if is_symlink(dir)? {
        eyre::bail!("refusing to use symlinked directory: {}", dir.display());
    } else if !dir.is_dir() {
        eyre::bail!("expected directory at {}", dir.display());
    }

    #[cfg(unix)]
    {
        let mode = fs::metadata(dir)
            .with_context(|| format!("stat {}", dir.display()))?
            .permissions()
            .mode();
        if mode & 0o077 != 0 {
            fs::set_permissions(dir, fs::Permissions::from_mode(MODE_DIR_PRIVATE))
                .with_context(|| format!("chmod {MODE_DIR_PRIVATE:o} {}", dir.display()))?;
        }
    }
    Ok(())
}

fn temp_sibling(path: &Path, parent: &Path) -> PathBuf {
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let mut suffix = [0_u8; 8];
    rand::rng().fill_bytes(&mut suffix);
    parent.join(format!(".{base}.tmp.{}", hex::encode(suffix)))
}

/// Replace `path` with `contents` via a private temp file and a rename.
pub fn write_string_atomic(path: &Path, contents: &str) -> eyre::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| eyre::eyre!("missing parent for {}", path.display()))?;
    ensure_private_dir(parent)?;
    if path.exists() && is_symlink(path)? {
        eyre::bail!("refusing to write to symlink: {}", path.display());
    }

    let tmp = temp_sibling(path, parent);
    let mut oo = OpenOptions::new();
    oo.create_new(true).write(true);
    #[cfg(unix)]
    {
        oo.mode(MODE_FILE_PRIVATE);
    }
    let mut f = oo
        .open(&tmp)
        .with_context(|| format!("open temp {}", tmp.display()))?;
    f.write_all(contents.as_bytes())
        .and_then(|()| f.sync_all())
        .with_context(|| format!("write {}", tmp.display()))?;
    drop(f);

    // `rename` will not replace an existing file on Windows.
    #[cfg(windows)]
    {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("remove existing {}", path.display()))?;
        }
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_and_leaves_no_temp() -> eyre::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("nested").join("config.toml");
        write_string_atomic(&path, "a = 1\n")?;
        write_string_atomic(&path, "a = 2\n")?;
        assert_eq!(fs::read_to_string(&path)?, "a = 2\n");
        let leftovers = fs::read_dir(path.parent().unwrap_or(tmp.path()))?
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn refuses_symlinked_target() -> eyre::Result<()> {
        let tmp = tempfile::tempdir()?;
        let real = tmp.path().join("real.toml");
        fs::write(&real, "x")?;
        let link = tmp.path().join("link.toml");
        std::os::unix::fs::symlink(&real, &link)?;
        assert!(write_string_atomic(&link, "y").is_err());
        assert_eq!(fs::read_to_string(&real)?, "x");
        Ok(())
    }
}
