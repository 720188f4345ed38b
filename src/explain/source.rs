//! Loading code from files and stdin.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Language;
use crate::consts::MAX_CODE_BYTES;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported file type: {0} (expected one of: {exts})", exts = ACCEPTED_EXTENSIONS.join(", "))]
    UnsupportedType(String),

    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to read the file. Please ensure it's a text-based code file.")]
    NotText,

    #[error("the file is empty")]
    Empty,

    #[error("no code was given on standard input")]
    EmptyInput,

    #[error("the file is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(u64, usize),
}

/// Extensions accepted for code uploads.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "py", "js", "java", "cpp", "c", "html", "css", "go", "rb", "php", "ts", "sh", "sql", "r",
    "swift",
];

/// A code file loaded into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeFile {
    pub code: String,
    pub language: Language,
}

/// Read a code file as UTF-8, inferring the language from its extension.
pub fn read_code_file(path: &Path) -> Result<CodeFile, SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let language = Language::from_extension(ext)
        .ok_or_else(|| SourceError::UnsupportedType(path.display().to_string()))?;

    let unreadable = |source| SourceError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(unreadable)?.len();
    if size > MAX_CODE_BYTES as u64 {
        return Err(SourceError::TooLarge(size, MAX_CODE_BYTES));
    }

    let bytes = std::fs::read(path).map_err(unreadable)?;
    let code = decode_text(bytes)?;
    Ok(CodeFile { code, language })
}

/// Read pasted code from any reader (stdin in practice).
pub fn read_code(reader: impl Read) -> Result<String, SourceError> {
    let mut bytes = Vec::new();
    reader
        .take(MAX_CODE_BYTES as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|source| SourceError::Unreadable {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    if bytes.len() > MAX_CODE_BYTES {
        return Err(SourceError::TooLarge(bytes.len() as u64, MAX_CODE_BYTES));
    }
    decode_text(bytes).map_err(|e| match e {
        SourceError::Empty => SourceError::EmptyInput,
        e => e,
    })
}

fn decode_text(bytes: Vec<u8>) -> Result<String, SourceError> {
    if bytes.contains(&0) {
        return Err(SourceError::NotText);
    }
    let code = String::from_utf8(bytes).map_err(|_| SourceError::NotText)?;
    if code.trim().is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(bytes)
            .unwrap();
        path
    }

    #[test]
    fn reads_python_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "hello.py", b"print(\"hi\")\n");
        let file = read_code_file(&path).unwrap();
        assert_eq!(file.code, "print(\"hi\")\n");
        assert_eq!(file.language, Language::Python);
    }

    #[test]
    fn rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "notes.txt", b"hello");
        assert!(matches!(
            read_code_file(&path),
            Err(SourceError::UnsupportedType(_))
        ));
    }

    #[test]
    fn rejects_binary_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "blob.c", &[0xff, 0xfe, 0x00, 0x41]);
        let err = read_code_file(&path).unwrap_err();
        assert!(matches!(err, SourceError::NotText));
        assert!(err.to_string().contains("text-based code file"));
    }

    #[test]
    fn rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "latin.sql", &[b'S', b'E', 0xe9, b'L']);
        assert!(matches!(read_code_file(&path), Err(SourceError::NotText)));
    }

    #[test]
    fn rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.go", b"  \n");
        assert!(matches!(read_code_file(&path), Err(SourceError::Empty)));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = read_code_file(Path::new("/definitely/not/here.rb")).unwrap_err();
        assert!(matches!(err, SourceError::Unreadable { .. }));
    }

    #[test]
    fn rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "big.js", &vec![b'a'; MAX_CODE_BYTES + 1]);
        assert!(matches!(
            read_code_file(&path),
            Err(SourceError::TooLarge(_, _))
        ));
    }

    #[test]
    fn read_code_from_reader() {
        let code = read_code("SELECT 1;\n".as_bytes()).unwrap();
        assert_eq!(code, "SELECT 1;\n");
    }

    #[test]
    fn empty_stdin_is_not_called_a_file() {
        let err = read_code(&b" \n\t"[..]).unwrap_err();
        assert!(matches!(err, SourceError::EmptyInput));
        assert!(err.to_string().contains("standard input"));
        assert!(!err.to_string().contains("file"));
    }
}
