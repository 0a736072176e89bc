//! Utility functions for staging paths and remote storage locations

use crate::error::{Error, Result};
use crate::types::CourseInfo;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Reduce an untrusted name to a single file-name component
///
/// Anything up to the last `/` or `\` is dropped and control characters are replaced,
/// so a name can never climb out of the directory it is joined onto.
///
/// # Examples
///
/// ```
/// use lms_migrate::utils::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("essay.docx").unwrap(), "essay.docx");
/// assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
/// assert!(sanitize_file_name("..").is_err());
/// ```
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().to_string();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(Error::InvalidPath {
            path: PathBuf::from(name),
            reason: "name has no usable file-name component".to_string(),
        });
    }
    Ok(cleaned)
}

/// Sanitize `names` and make them distinct, ignoring case
///
/// A repeated name gets ` (2)`, ` (3)`, ... inserted before its extension.
///
/// # Examples
///
/// ```
/// use lms_migrate::utils::unique_file_names;
///
/// let names = unique_file_names(["x.pdf", "x.pdf", "notes"]).unwrap();
/// assert_eq!(names, ["x.pdf", "x (2).pdf", "notes"]);
/// ```
pub fn unique_file_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>> {
    let mut taken = HashSet::new();
    let mut unique = Vec::new();
    for name in names {
        let cleaned = sanitize_file_name(name)?;
        let (stem, ext) = match cleaned.rfind('.') {
            Some(dot) if dot > 0 => cleaned.split_at(dot),
            _ => (cleaned.as_str(), ""),
        };

        let mut candidate = cleaned.clone();
        let mut n = 2;
        while !taken.insert(candidate.to_lowercase()) {
            candidate = format!("{stem} ({n}){ext}");
            n += 1;
        }
        unique.push(candidate);
    }
    Ok(unique)
}

/// Local staging location for one attachment: `{working_root}/{guid}/{name}`
///
/// # Examples
///
/// ```
/// use lms_migrate::utils::staging_path;
/// use std::path::Path;
///
/// let path = staging_path(Path::new("staging"), "G1", "essay.docx").unwrap();
/// assert_eq!(path, Path::new("staging").join("G1").join("essay.docx"));
/// ```
pub fn staging_path(working_root: &Path, guid: &str, attachment_name: &str) -> Result<PathBuf> {
    Ok(working_root
        .join(sanitize_file_name(guid)?)
        .join(sanitize_file_name(attachment_name)?))
}

/// Storage folder name for a target course: `{code}-{ouid}`
pub fn course_folder(course: &CourseInfo, ouid: &str) -> String {
    format!("{}-{}", course.code.trim(), ouid.trim())
}

/// Path segments, relative to the WebDAV root, under which one assignment's files live
pub fn assignment_folder_segments(
    dav_root: &str,
    course: &CourseInfo,
    ouid: &str,
    assignment_id: &str,
) -> Result<Vec<String>> {
    let mut segments: Vec<String> = dav_root
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    segments.push(sanitize_file_name(&course_folder(course, ouid))?);
    segments.push(sanitize_file_name(assignment_id)?);
    Ok(segments)
}

/// Absolute storage path for display and linking, e.g. `/content/enforced/RUST101-6606/a1/essay.docx`
pub fn remote_path(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

/// URL of a storage location on `host`, with each segment percent-encoded
pub fn remote_url(host: &str, segments: &[String]) -> Result<Url> {
    let mut url = Url::parse(host)?;
    {
        let mut path = url.path_segments_mut().map_err(|_| Error::Config {
            message: format!("'{}' cannot be used as a base URL", host),
            key: Some("webdav.host".to_string()),
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Derive an attachment name from its retrieval URL
///
/// Used when the source metadata omits a name. Returns the percent-decoded last path
/// segment, or "attachment" as a last resort.
pub fn file_name_from_locator(locator: &str) -> String {
    if let Ok(parsed) = Url::parse(locator)
        && let Some(mut segments) = parsed.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        return match urlencoding::decode(last) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => last.to_string(),
        };
    }
    "attachment".to_string()
}

/// Strip the query string from a URL before it is logged or put in an error
pub fn redact_query(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}
