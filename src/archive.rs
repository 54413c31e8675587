//! Rewriting an EPUB archive with extra CSS appended to its stylesheet.
//!
//! The source is unpacked in full into a temporary directory, the stylesheet is
//! patched on disk, and a new archive is packed from that directory. Because the
//! source has been completely read before the destination is created, the
//! destination may be the source itself (overwrite mode).
//!
//! Packing keeps the EPUB container convention: a root `mimetype` entry is
//! written first and stored without compression. Everything else is deflated.

use crate::error::{Result, UpgradeError};
use crate::stylesheet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the entry that identifies the archive as an EPUB.
pub const MIMETYPE: &str = "mimetype";

/// What a single transform did.
#[derive(Debug, Clone)]
pub struct TransformReport {
    pub destination: PathBuf,
    /// Archive entry name of the stylesheet that was patched.
    pub stylesheet: String,
    pub created_stylesheet: bool,
    pub entries_written: usize,
    pub bytes_written: u64,
}

/// Append `fragment` to the stylesheet of the EPUB at `source`, writing the
/// result to `destination`.
pub fn transform(source: &Path, fragment: &str, destination: &Path) -> Result<TransformReport> {
    let scratch = TempDir::new().map_err(|e| UpgradeError::Extract {
        path: source.to_path_buf(),
        source: ZipError::Io(e),
    })?;
    log::debug!(
        "extracting '{}' into '{}'",
        source.display(),
        scratch.path().display()
    );
    extract(source, scratch.path())?;

    let sheet = stylesheet::locate_or_create(scratch.path())?;
    stylesheet::append(&sheet, fragment)?;

    let entries_written = pack(scratch.path(), destination)?;
    let bytes_written = std::fs::metadata(destination)
        .map(|m| m.len())
        .map_err(|e| UpgradeError::write(destination, e))?;

    log::info!(
        "wrote '{}' ({} entries, stylesheet {})",
        destination.display(),
        entries_written,
        sheet.entry
    );

    Ok(TransformReport {
        destination: destination.to_path_buf(),
        stylesheet: sheet.entry,
        created_stylesheet: sheet.created,
        entries_written,
        bytes_written,
    })
    // `scratch` is dropped here and on every early return above
}

/// Unpack every entry of the archive at `source` into `root`.
fn extract(source: &Path, root: &Path) -> Result<()> {
    let invalid = |source_err: ZipError| UpgradeError::InvalidArchive {
        path: source.to_path_buf(),
        source: source_err,
    };

    let file = File::open(source).map_err(|e| invalid(ZipError::Io(e)))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(invalid)?;
    archive.extract(root).map_err(|e| UpgradeError::Extract {
        path: source.to_path_buf(),
        source: e,
    })
}

/// Pack the contents of `root` into a new archive at `destination`.
///
/// Returns the number of entries written.
fn pack(root: &Path, destination: &Path) -> Result<usize> {
    let write_err = |e: std::io::Error| UpgradeError::write(destination, e);
    let zip_err = |e: ZipError| UpgradeError::write(destination, e);

    let file = File::create(destination).map_err(write_err)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = 0;

    let mimetype = root.join(MIMETYPE);
    if mimetype.is_file() {
        let bytes = std::fs::read(&mimetype).map_err(write_err)?;
        writer.start_file(MIMETYPE, stored).map_err(zip_err)?;
        writer.write_all(&bytes).map_err(write_err)?;
        written += 1;
    }

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| write_err(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry_name(root, entry.path());
        if name == MIMETYPE {
            continue;
        }

        log::debug!("packing {name}");
        let bytes = std::fs::read(entry.path()).map_err(write_err)?;
        writer.start_file(name, deflated).map_err(zip_err)?;
        writer.write_all(&bytes).map_err(write_err)?;
        written += 1;
    }

    let mut out = writer.finish().map_err(zip_err)?;
    out.flush().map_err(write_err)?;
    Ok(written)
}

/// Archive entry name for `path`: relative to `root`, joined with `/`.
fn entry_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::css;
    use std::io::Read;

    pub(crate) const MIMETYPE_BYTES: &[u8] = b"application/epub+zip";

    /// Build a small EPUB at `path` from `(name, contents)` pairs, with a stored
    /// `mimetype` entry first.
    pub(crate) fn write_epub(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).expect("can create fixture");
        let mut writer = ZipWriter::new(file);
        writer
            .start_file(
                MIMETYPE,
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
            )
            .unwrap();
        writer.write_all(MIMETYPE_BYTES).unwrap();
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().expect("can finish fixture");
    }

    pub(crate) fn read_entry(path: &Path, name: &str) -> Vec<u8> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entry = archive.by_name(name).expect("entry exists");
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        bytes
    }

    fn sample_entries() -> Vec<(&'static str, &'static str)> {
        vec![
            ("META-INF/container.xml", "<container/>"),
            ("OEBPS/content.opf", "<package/>"),
            ("OEBPS/chapter1.xhtml", "<html><body><p>Hi</p></body></html>"),
            ("OEBPS/style.css", "p { text-indent: 1em; }\n"),
        ]
    }

    #[test]
    fn appends_fragment_to_existing_stylesheet() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("book.epub");
        let dst = dir.path().join("book-upgrade.epub");
        write_epub(&src, &sample_entries());

        let fragment = css::margins(20);
        let report = transform(&src, &fragment, &dst).expect("can transform");

        assert_eq!(report.stylesheet, "OEBPS/style.css");
        assert!(!report.created_stylesheet);
        assert_eq!(report.entries_written, 5);

        let stylesheet = String::from_utf8(read_entry(&dst, "OEBPS/style.css")).unwrap();
        assert_eq!(stylesheet, format!("p {{ text-indent: 1em; }}\n{fragment}"));
        assert!(stylesheet.contains("margin-left: -20px"));
    }

    #[test]
    fn other_entries_are_unchanged() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("book.epub");
        let dst = dir.path().join("out.epub");
        write_epub(&src, &sample_entries());

        transform(&src, &css::hyphens(), &dst).expect("can transform");

        for (name, contents) in sample_entries() {
            if name == "OEBPS/style.css" {
                continue;
            }
            assert_eq!(read_entry(&dst, name), contents.as_bytes(), "{name}");
        }
        // the source is left alone
        assert_eq!(
            read_entry(&src, "OEBPS/style.css"),
            b"p { text-indent: 1em; }\n"
        );
    }

    #[test]
    fn mimetype_is_first_and_stored() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("book.epub");
        let dst = dir.path().join("out.epub");
        write_epub(&src, &sample_entries());

        transform(&src, &css::both(10), &dst).expect("can transform");

        let mut archive = ZipArchive::new(File::open(&dst).unwrap()).unwrap();
        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), MIMETYPE);
        assert_eq!(first.compression(), CompressionMethod::Stored);
        drop(first);
        assert_eq!(read_entry(&dst, MIMETYPE), MIMETYPE_BYTES);

        let chapter = archive.by_name("OEBPS/chapter1.xhtml").unwrap();
        assert_eq!(chapter.compression(), CompressionMethod::Deflated);
    }

    #[test]
    fn creates_stylesheet_when_missing() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("book.epub");
        let dst = dir.path().join("out.epub");
        write_epub(&src, &[("OEBPS/Styles/main.css", "body {}")]);

        let report = transform(&src, &css::margins(5), &dst).expect("can transform");

        assert!(report.created_stylesheet);
        assert_eq!(report.stylesheet, "OPS/style.css");
        let created = String::from_utf8(read_entry(&dst, "OPS/style.css")).unwrap();
        assert_eq!(
            created,
            format!("{}{}", stylesheet::PLACEHOLDER, css::margins(5))
        );
        // the real stylesheet is untouched
        assert_eq!(read_entry(&dst, "OEBPS/Styles/main.css"), b"body {}");
    }

    #[test]
    fn archives_without_mimetype_are_still_packed() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("bare.epub");
        let dst = dir.path().join("out.epub");
        {
            let mut writer = ZipWriter::new(File::create(&src).unwrap());
            writer
                .start_file("css/style.css", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(b"h1 {}").unwrap();
            writer.finish().unwrap();
        }

        let report = transform(&src, &css::hyphens(), &dst).expect("can transform");
        assert_eq!(report.entries_written, 1);

        let archive = ZipArchive::new(File::open(&dst).unwrap()).unwrap();
        assert!(archive.file_names().all(|name| name != MIMETYPE));
    }

    #[test]
    fn overwrite_in_place() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.epub");
        write_epub(&src, &sample_entries());

        transform(&src, &css::margins(20), &src).expect("can overwrite");

        let stylesheet = String::from_utf8(read_entry(&src, "OEBPS/style.css")).unwrap();
        assert!(stylesheet.contains("margin-right: -20px !important;"));
        assert_eq!(read_entry(&src, MIMETYPE), MIMETYPE_BYTES);
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1, "no backup is left behind: {names:?}");
    }

    #[test]
    fn applying_twice_duplicates_the_fragment() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.epub");
        write_epub(&src, &sample_entries());

        transform(&src, &css::margins(20), &src).unwrap();
        transform(&src, &css::margins(20), &src).unwrap();

        let stylesheet = String::from_utf8(read_entry(&src, "OEBPS/style.css")).unwrap();
        assert_eq!(stylesheet.matches("margin-left: -20px").count(), 2);
    }

    #[test]
    fn rejects_non_zip_input() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("broken.epub");
        let dst = dir.path().join("out.epub");
        std::fs::write(&src, b"definitely not a zip file").unwrap();

        let err = transform(&src, &css::hyphens(), &dst).unwrap_err();
        assert!(matches!(err, UpgradeError::InvalidArchive { .. }), "{err}");
        assert!(!dst.exists());
    }

    #[test]
    fn unpack_failure_is_an_extract_error() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("book.epub");
        write_epub(&src, &sample_entries());
        let blocker = dir.path().join("plain-file");
        std::fs::write(&blocker, b"").unwrap();

        let err = extract(&src, &blocker.join("scratch")).unwrap_err();
        assert!(matches!(err, UpgradeError::Extract { .. }), "{err}");
    }

    #[test]
    fn reports_unwritable_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("book.epub");
        write_epub(&src, &sample_entries());
        let dst = dir.path().join("missing-dir").join("out.epub");

        let err = transform(&src, &css::hyphens(), &dst).unwrap_err();
        assert!(matches!(err, UpgradeError::WriteFailure { .. }), "{err}");
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let root = Path::new("/tmp/scratch");
        let path = root.join("OEBPS").join("Text").join("c1.xhtml");
        assert_eq!(entry_name(root, &path), "OEBPS/Text/c1.xhtml");
    }
}
