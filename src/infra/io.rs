use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Replace `path` with `data` through a temp file in the same directory.
///
/// Permissions of an existing destination are kept. Falls back to a temp file
/// in the OS temp dir, and to a copy when a rename across filesystems fails.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let tmp = match tempfile::NamedTempFile::new_in(dir) {
        Ok(t) => t,
        Err(_) => tempfile::NamedTempFile::new()?,
    };

    let mut file = tmp.as_file();
    file.write_all(data)?;
    file.sync_all()?;

    if let Some(perms) = perms {
        fs::set_permissions(tmp.path(), perms)?;
    }

    #[cfg(unix)]
    {
        if let Ok(parent) = fs::File::open(dir) {
            let _ = parent.sync_all();
        }
    }

    if let Err(e) = tmp.persist(path) {
        fs::copy(e.file.path(), path)?;
    }
    Ok(())
}

/// `<dir>/<stem><suffix>.<ext>` next to `input`, e.g. `informe_tc.docx`
pub fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    input.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_path() {
        assert_eq!(sibling_path(Path::new("docs/informe.docx"), "_tc"), Path::new("docs/informe_tc.docx"));
        assert_eq!(sibling_path(Path::new("informe"), "_limpio"), Path::new("informe_limpio"));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        write_atomic(&path, b"uno").unwrap();
        write_atomic(&path, b"dos").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"dos");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
