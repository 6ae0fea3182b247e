use std::fs;
use std::io;
use std::path::{Component, Path};

use crate::pattern::C_SEPARATOR;
use crate::spec::EnumCopyErrorKind;

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Render a relative path with the canonical `/` separator.
///
/// Non-normal components (`.`, prefixes, root) are dropped; names that are not
/// valid UTF-8 are converted lossily.
pub(crate) fn to_path_rel_text(path_rel: &Path) -> String {
    let mut txt = String::new();
    for part in path_rel.components() {
        if let Component::Normal(name) = part {
            if !txt.is_empty() {
                txt.push(C_SEPARATOR);
            }
            txt.push_str(&name.to_string_lossy());
        }
    }
    txt
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ErrorClassification

/// Stage at which a per-item IO failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnumCopyStage {
    /// Reading or inspecting the source entry.
    Source,
    /// Creating or writing the destination entry.
    Destination,
}

pub(crate) fn classify_io_error(err: &io::Error, stage: EnumCopyStage) -> EnumCopyErrorKind {
    match stage {
        EnumCopyStage::Source => match err.kind() {
            io::ErrorKind::NotFound => EnumCopyErrorKind::NotFound,
            _ => EnumCopyErrorKind::AccessDenied,
        },
        EnumCopyStage::Destination => EnumCopyErrorKind::DestinationWriteFailure,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Copy bytes, permission bits and timestamps of one file.
///
/// The source is stat'ed first so failures can be attributed to the right side.
/// Both handles are scoped to this call.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), (EnumCopyStage, io::Error)> {
    let stat_src = fs::metadata(path_file_src).map_err(|e| (EnumCopyStage::Source, e))?;
    if stat_src.is_dir() {
        return Err((
            EnumCopyStage::Source,
            io::Error::other(format!(
                "Source became a directory: {}",
                path_file_src.display()
            )),
        ));
    }
    let mut file_src = fs::File::open(path_file_src).map_err(|e| (EnumCopyStage::Source, e))?;

    // Replace rather than write through: a previous run may have left a
    // read-only copy, and a destination symlink must not be followed.
    if let Ok(meta_dst) = fs::symlink_metadata(path_file_dst)
        && !meta_dst.is_dir()
    {
        fs::remove_file(path_file_dst).map_err(|e| (EnumCopyStage::Destination, e))?;
    }
    let mut file_dst =
        fs::File::create(path_file_dst).map_err(|e| (EnumCopyStage::Destination, e))?;
    io::copy(&mut file_src, &mut file_dst).map_err(|e| (EnumCopyStage::Destination, e))?;
    drop(file_dst);
    drop(file_src);

    apply_metadata(path_file_src, path_file_dst, &stat_src)
        .map_err(|e| (EnumCopyStage::Destination, e))
}

fn apply_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    stat_src: &fs::Metadata,
) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(stat_src);
    let file_time_modify = FileTime::from_last_modification_time(stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    #[cfg(not(target_os = "linux"))]
    let _ = path_file_src;
    Ok(())
}

/// Best effort: filesystems without xattr support are silently skipped.
#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
