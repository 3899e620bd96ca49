use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::core::capability::Capability;

/// Search-and-replace inside a file.
#[derive(Debug, Clone)]
pub struct FileEditor {
    workdir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Args {
    dir_path: String,
    file_name: String,
    #[serde(default)]
    search_text: String,
    #[serde(default)]
    replace_text: String,
}

impl FileEditor {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
        }
    }
}

impl Capability for FileEditor {
    fn name(&self) -> &str {
        "file_editor"
    }

    fn description(&self) -> &str {
        "Edit a file by replacing every occurrence of 'search_text' with 'replace_text'. \
         With an empty 'search_text' a missing file is created holding 'replace_text'. \
         Arguments: 'dir_path', 'file_name', 'search_text' and 'replace_text'."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "dir_path": {"type": "string"},
                "file_name": {"type": "string", "minLength": 1},
                "search_text": {"type": "string"},
                "replace_text": {"type": "string"}
            },
            "required": ["dir_path", "file_name", "search_text", "replace_text"]
        })
    }

    #[instrument(skip_all, fields(capability = "file_editor"))]
    fn invoke(&self, arguments: &Value) -> Result<String> {
        let args: Args = super::parse_args(&self.schema(), arguments)?;
        let path = super::resolve(&self.workdir, &args.dir_path).join(&args.file_name);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound && args.search_text.is_empty() => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("create {}", parent.display()))?;
                }
                fs::write(&path, &args.replace_text)
                    .with_context(|| format!("create {}", path.display()))?;
                debug!(path = %path.display(), "file created");
                return Ok(format!("Successfully created file: {}", path.display()));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("read {}", path.display()));
            }
        };

        if args.search_text.is_empty() || !content.contains(&args.search_text) {
            return Ok(format!(
                "Search text not found in {}. File not modified.",
                path.display()
            ));
        }

        let updated = content.replace(&args.search_text, &args.replace_text);
        fs::write(&path, &updated).with_context(|| format!("write {}", path.display()))?;
        debug!(path = %path.display(), "file modified");
        Ok(format!("Successfully modified file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(editor: &FileEditor, search: &str, replace: &str) -> Result<String> {
        editor.invoke(&json!({
            "dir_path": ".",
            "file_name": "notes.txt",
            "search_text": search,
            "replace_text": replace,
        }))
    }

    #[test]
    fn replaces_every_occurrence() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("notes.txt");
        fs::write(&path, "a-b-a").expect("write");

        let observation = edit(&FileEditor::new(temp.path()), "a", "x").expect("edit");
        assert!(observation.starts_with("Successfully modified file"));
        assert_eq!(fs::read_to_string(&path).expect("read"), "x-b-x");
    }

    #[test]
    fn missing_text_leaves_file_alone() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("notes.txt");
        fs::write(&path, "hello").expect("write");

        let observation = edit(&FileEditor::new(temp.path()), "absent", "x").expect("edit");
        assert!(observation.contains("File not modified"));
        assert_eq!(fs::read_to_string(&path).expect("read"), "hello");
    }

    #[test]
    fn empty_search_creates_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let observation = edit(&FileEditor::new(temp.path()), "", "fresh").expect("create");
        assert!(observation.starts_with("Successfully created file"));
        assert_eq!(
            fs::read_to_string(temp.path().join("notes.txt")).expect("read"),
            "fresh"
        );
    }

    #[test]
    fn missing_file_with_search_text_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = edit(&FileEditor::new(temp.path()), "x", "y").expect_err("missing");
        assert!(format!("{err:#}").contains("read"));
    }
}
