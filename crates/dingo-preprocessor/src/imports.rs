//! Small textual helper for injecting an import speculatively. Good
//! enough for the single-package stdlib imports the preprocessor needs
//! to add (`fmt` for wrapped error propagation); the type-check bridge
//! disables unused-import errors precisely so a speculative injection
//! like this one is never fatal if it turns out unneeded.

use once_cell::sync::Lazy;
use regex::Regex;

static IMPORT_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^import\s*\("#).unwrap());
static IMPORT_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^import\s+"([^"]+)"\s*$"#).unwrap());
static PACKAGE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^package\s+\w+\s*$"#).unwrap());

/// Ensures `source` imports `pkg`, returning the (possibly unchanged)
/// source. Idempotent: calling it twice with the same package is a no-op
/// the second time.
pub fn ensure_import(source: &str, pkg: &str) -> String {
    if already_imports(source, pkg) {
        return source.to_string();
    }

    if let Some(m) = IMPORT_BLOCK.find(source) {
        let insert_at = m.end();
        let mut out = String::with_capacity(source.len() + pkg.len() + 8);
        out.push_str(&source[..insert_at]);
        out.push_str(&format!("\n\t\"{pkg}\""));
        out.push_str(&source[insert_at..]);
        return out;
    }

    if let Some(m) = IMPORT_SINGLE.find(source) {
        let existing = &source[m.start()..m.end()];
        let block = format!("import (\n\t{}\n\t\"{pkg}\"\n)", existing.trim_start_matches("import").trim());
        let mut out = String::with_capacity(source.len() + block.len());
        out.push_str(&source[..m.start()]);
        out.push_str(&block);
        out.push_str(&source[m.end()..]);
        return out;
    }

    if let Some(m) = PACKAGE_LINE.find(source) {
        let insert_at = m.end();
        let mut out = String::with_capacity(source.len() + pkg.len() + 16);
        out.push_str(&source[..insert_at]);
        out.push_str(&format!("\n\nimport \"{pkg}\""));
        out.push_str(&source[insert_at..]);
        return out;
    }

    format!("import \"{pkg}\"\n{source}")
}

fn already_imports(source: &str, pkg: &str) -> bool {
    let needle = format!("\"{pkg}\"");
    source.contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_into_existing_block() {
        let src = "package p\n\nimport (\n\t\"os\"\n)\n";
        let out = ensure_import(src, "fmt");
        assert!(out.contains("\"fmt\""));
        assert!(out.contains("\"os\""));
    }

    #[test]
    fn converts_single_import_to_block() {
        let src = "package p\n\nimport \"os\"\n";
        let out = ensure_import(src, "fmt");
        assert!(out.contains("import ("));
        assert!(out.contains("\"fmt\""));
        assert!(out.contains("\"os\""));
    }

    #[test]
    fn inserts_after_package_when_no_imports_exist() {
        let src = "package p\n\nfunc main() {}\n";
        let out = ensure_import(src, "fmt");
        assert!(out.contains("import \"fmt\""));
    }

    #[test]
    fn is_idempotent() {
        let src = "package p\n\nimport \"fmt\"\n";
        assert_eq!(ensure_import(src, "fmt"), src);
    }
}
