//! Template files loaded from directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Recognized template file extensions, in priority order.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".jinja", ".j2", ".html", ".txt"];

/// A template file found under a template directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Relative path with forward slashes and without extension (`shop/cart`).
    pub name: String,
    /// Relative path with extension (`shop/cart.html`).
    pub name_with_ext: String,
    pub path: PathBuf,
}

impl TemplateFile {
    fn extension_priority(&self) -> usize {
        TEMPLATE_EXTENSIONS
            .iter()
            .position(|ext| self.name_with_ext.ends_with(ext))
            .unwrap_or(usize::MAX)
    }

    pub fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Walks `root` recursively and collects template files.
///
/// Files are sorted by name, then by extension priority, so when `cart.html`
/// and `cart.txt` both exist the extension-less name `cart` resolves to the
/// first one.
pub fn walk_template_dir(root: impl AsRef<Path>) -> io::Result<Vec<TemplateFile>> {
    let root = root.as_ref().canonicalize()?;
    let mut files = Vec::new();
    walk(&root, &root, &mut files)?;
    files.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then(a.extension_priority().cmp(&b.extension_priority()))
    });
    Ok(files)
}

fn walk(current: &Path, root: &Path, files: &mut Vec<TemplateFile>) -> io::Result<()> {
    for entry in fs::read_dir(current)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, root, files)?;
        } else if let Some(file) = parse_file(&path, root) {
            files.push(file);
        }
    }
    Ok(())
}

fn parse_file(path: &Path, root: &Path) -> Option<TemplateFile> {
    let relative = path.strip_prefix(root).ok()?;
    let name_with_ext = relative
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/");
    let extension = TEMPLATE_EXTENSIONS
        .iter()
        .find(|ext| name_with_ext.ends_with(*ext))?;
    let name = name_with_ext.strip_suffix(extension)?.to_string();

    Some(TemplateFile {
        name,
        name_with_ext,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_finds_nested_templates() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("shop")).unwrap();
        fs::write(dir.path().join("home.html"), "home").unwrap();
        fs::write(dir.path().join("shop/cart.j2"), "cart").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let files = walk_template_dir(dir.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["home", "shop/cart"]);
        assert_eq!(files[1].name_with_ext, "shop/cart.j2");
        assert_eq!(files[1].read().unwrap(), "cart");
    }

    #[test]
    fn test_extension_priority_orders_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cart.txt"), "txt").unwrap();
        fs::write(dir.path().join("cart.jinja"), "jinja").unwrap();

        let files = walk_template_dir(dir.path()).unwrap();
        assert_eq!(files[0].name_with_ext, "cart.jinja");
        assert_eq!(files[1].name_with_ext, "cart.txt");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        assert!(walk_template_dir("/definitely/not/here").is_err());
    }
}
