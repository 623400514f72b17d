//! Description text that may live in a file.

use std::path::Path;

use tracing::warn;

/// Resolve a description: if `text` names an existing file its contents are
/// returned verbatim, otherwise `text` itself.
///
/// A file that exists but cannot be read yields an empty description and a
/// warning.
#[must_use]
pub fn load_description(text: &str) -> String {
    if text.is_empty() || text.contains('\n') {
        return text.to_string();
    }

    let path = Path::new(text);
    if !path.is_file() {
        return text.to_string();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(path = %path.display(), %err, "failed to read description file");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_text_is_copied() {
        assert_eq!(load_description("Units per second"), "Units per second");
        assert_eq!(load_description(""), "");
    }

    #[test]
    fn test_file_is_loaded_verbatim() {
        let path = std::env::temp_dir().join(format!(
            "engine_component_description_{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, "Line one\nLine two\n").unwrap();

        let loaded = load_description(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, "Line one\nLine two\n");
    }
}
