use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufRead;

use anyhow::{Context, Result};

pub const DEFAULT_MIME_TYPE: &str = "text/plain";

// Types served without a --mimetypes file. Anything more exotic can come
// from a map file.
const DEFAULT_EXTENSIONS_MAP: &[&str] = &[
    "text/html    html htm",
    "image/gif    gif",
    "image/png    png",
    "image/jpeg   jpg jpeg",
];

#[derive(Debug)]
pub struct MimeMap {
    mimetypes: HashMap<String, String>,
    pub default_mimetype: String,
}

impl MimeMap {
    /// Add extension map from a file.
    pub fn parse_extension_map_file(&mut self, filename: &OsStr) -> Result<()> {
        let file = File::open(filename)
            .with_context(|| format!("failed to open {}", filename.to_string_lossy()))?;
        for line in std::io::BufReader::new(file).lines() {
            let line =
                line.with_context(|| format!("failed to read {}", filename.to_string_lossy()))?;
            self.add_mimetype_line(&line);
        }
        Ok(())
    }

    /// Add line from an extension map.
    fn add_mimetype_line(&mut self, line: &str) {
        let mut fields = line
            .split(|c| matches!(c, ' ' | '\t'))
            .filter(|field| !field.is_empty());
        let mimetype = match fields.next() {
            Some(mimetype) => mimetype,
            None => return, // empty line
        };
        if mimetype.starts_with('#') {
            return; // comment
        }
        for extension in fields {
            self.mimetypes
                .insert(extension.to_string(), mimetype.to_string());
        }
    }

    /// Content type for a filesystem path, by extension.
    pub fn content_type(&self, path: &str) -> &str {
        path.rsplit('.')
            .next()
            .and_then(|extension| self.mimetypes.get(extension))
            .map(|mimetype| mimetype.as_str())
            .unwrap_or(&self.default_mimetype)
    }
}

impl Default for MimeMap {
    /// Create MimeMap using the default extension map.
    fn default() -> Self {
        let mut mime_map = Self {
            mimetypes: HashMap::new(),
            default_mimetype: DEFAULT_MIME_TYPE.to_string(),
        };
        for line in DEFAULT_EXTENSIONS_MAP {
            mime_map.add_mimetype_line(line);
        }
        mime_map
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use test_case::test_case;

    #[test_case("./index.html", "text/html" ; "html")]
    #[test_case("./pic.gif", "image/gif" ; "gif")]
    #[test_case("./pic.png", "image/png" ; "png")]
    #[test_case("./photo.jpg", "image/jpeg" ; "jpg")]
    #[test_case("./photo.jpeg", "image/jpeg" ; "jpeg")]
    #[test_case("./notes.xyz", "text/plain" ; "unknown extension")]
    #[test_case("./README", "text/plain" ; "no extension")]
    fn content_type_works(path: &str, mimetype: &str) {
        assert_eq!(MimeMap::default().content_type(path), mimetype);
    }

    #[test]
    fn map_lines_skip_comments_and_blanks() {
        let mut mime_map = MimeMap::default();
        mime_map.add_mimetype_line("# a comment");
        mime_map.add_mimetype_line("");
        mime_map.add_mimetype_line("application/pdf\tpdf");
        assert_eq!(mime_map.content_type("doc.pdf"), "application/pdf");
        assert_eq!(mime_map.content_type("doc.#"), "text/plain");
    }
}
