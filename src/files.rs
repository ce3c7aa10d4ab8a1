use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the file holding share `index` for `prefix`, e.g. `mysecret-3`.
pub fn share_file_name(prefix: &str, index: usize) -> String {
    format!("{prefix}-{index}")
}

/// Fails if `path` exists and overwriting was not requested.
pub fn ensure_writable(path: &Path, overwrite: bool) -> io::Result<()> {
    if !overwrite && path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "File {} already exists. To force overwrite use --overwrite",
                path.display()
            ),
        ));
    }
    Ok(())
}

/// Writes `contents` to a file readable and writable by the owner only.
///
/// Refuses to replace an existing file unless `overwrite` is set.
pub fn write_private(path: &Path, contents: &[u8], overwrite: bool) -> io::Result<()> {
    let mut file = open_private(path, overwrite)?;
    file.write_all(contents)?;

    debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Opens `path` empty with owner-only permissions.
///
/// An existing file is restricted to 0600 before it is truncated, so nothing
/// written afterwards is ever readable under its old mode.
fn open_private(path: &Path, overwrite: bool) -> io::Result<File> {
    ensure_writable(path, overwrite)?;

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(false);
    } else {
        options.create_new(true);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.set_len(0)?;

    Ok(file)
}

/// Finds the files named `<prefix>-<n>` in `dir`, ordered by `n`.
///
/// A directory matching the pattern is an error, since a file is expected.
pub fn find_share_files(dir: &Path, prefix: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(index) = share_index(name, prefix) else {
            continue;
        };

        let path = entry.path();
        if path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory, file expected", path.display()),
            ));
        }
        found.push((index, path));
    }

    found.sort();
    debug!("found {} share files for prefix {}", found.len(), prefix);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

fn share_index(name: &str, prefix: &str) -> Option<u64> {
    let suffix = name.strip_prefix(prefix)?.strip_prefix('-')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Reads lines from `input`, prompting on `prompt`, until an empty line or end of input.
pub fn read_lines<R: BufRead, W: Write>(input: R, mut prompt: W) -> io::Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut input = input.lines();

    loop {
        write!(prompt, ": ")?;
        prompt.flush()?;

        match input.next() {
            Some(line) => {
                let line = line?;
                let line = line.trim_end_matches('\r');
                if line.is_empty() {
                    break;
                }
                lines.push(line.to_string());
            }
            None => break,
        }
    }

    Ok(lines)
}
