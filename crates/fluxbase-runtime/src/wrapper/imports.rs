use regex_lite::Regex;

/// Splits user source into (hoisted import/export-from lines, remaining
/// body) via a line-oriented regex pass — matches the teacher's
/// `regex`-based text-processing style rather than a full parser (spec
/// §4.C: "Hoists import statements... a line-oriented regex pass").
pub fn hoist_imports(source: &str) -> (Vec<String>, String) {
    let import_re = Regex::new(r#"^\s*(import\s+.+from\s+['"].+['"];?|export\s+.+from\s+['"].+['"];?)\s*$"#)
        .expect("static import regex is valid");

    let mut imports = Vec::new();
    let mut body_lines = Vec::new();

    for line in source.lines() {
        if import_re.is_match(line) {
            imports.push(line.trim_end().to_string());
        } else {
            body_lines.push(line);
        }
    }

    (imports, body_lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hoists_leading_import_lines() {
        let source = "import { foo } from \"bar\";\nexport function handler() { return 1; }";
        let (imports, body) = hoist_imports(source);
        assert_eq!(imports, vec!["import { foo } from \"bar\";".to_string()]);
        assert!(body.contains("function handler"));
    }

    #[test]
    fn leaves_non_import_lines_untouched() {
        let source = "const x = 1;\nfunction handler() { return x; }";
        let (imports, body) = hoist_imports(source);
        assert!(imports.is_empty());
        assert_eq!(body, source);
    }

    #[test]
    fn hoists_scattered_imports_mid_file() {
        let source = "const a = 1;\nimport { bar } from \"baz\";\nconst b = 2;";
        let (imports, body) = hoist_imports(source);
        assert_eq!(imports.len(), 1);
        assert!(!body.contains("import"));
        assert!(body.contains("const a = 1;"));
        assert!(body.contains("const b = 2;"));
    }
}
