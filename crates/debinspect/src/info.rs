//! Field lookup over `dpkg-deb --info` output.

use serde::Serialize;

/// Text printed by `dpkg-deb --info`, with control field lookup.
///
/// The tool indents every line by one space. A field starts on a line of the
/// form ` Name: value` and continues over each following line indented by at
/// least two spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoRecord {
    text: String,
}

impl InfoRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Raw info text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Gets the value of a control field such as `Package` or `Depends`.
    ///
    /// Lookup is exact and case-sensitive. Continuation lines are joined to
    /// the first line with single spaces.
    pub fn value(&self, field: &str) -> Option<String> {
        let prefix = format!(" {}:", field);
        let mut lines = self.text.lines();

        let first = lines.find_map(|line| line.strip_prefix(prefix.as_str()))?;
        let mut value = first.trim_start().to_string();

        for line in lines.take_while(|line| line.starts_with("  ")) {
            value.push(' ');
            value.push_str(line.trim_start());
        }

        Some(value)
    }

    /// Names of the control fields present, in order of appearance.
    pub fn field_names(&self) -> Vec<&str> {
        self.text
            .lines()
            .filter_map(|line| {
                let rest = line.strip_prefix(' ')?;
                let (name, _) = rest.split_once(':')?;
                let is_field = !name.is_empty()
                    && !rest.starts_with(' ')
                    && !name.contains(char::is_whitespace);
                is_field.then_some(name)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    // Leading spaces are part of the format, so each line is spelled out
    const MULTIMODULE_INFO: &str = concat!(
        " new Debian package, version 2.0.\n",
        " size 267648 bytes: control archive=9012 bytes.\n",
        "     370 bytes,    12 lines      control              \n",
        "   40147 bytes,   303 lines      md5sums              \n",
        " Package: example-multimodule-deb\n",
        " Version: 3.0+202010221611\n",
        " Section: contrib/utils\n",
        " Priority: optional\n",
        " Architecture: all\n",
        " Depends: default-jre-headless\n",
        " Build-Depends: build-essential, some, other,\n",
        "  dependency, packages\n",
        " Installed-Size: 1069\n",
        " Maintainer: Jane Doe <jane@doe.com>\n",
        " Homepage: https://example.com/\n",
        " Description: Example Multimodule Project\n",
        "  This is an example of a multimodule project\n",
    );

    #[test]
    fn test_simple_values() {
        let info = InfoRecord::new(MULTIMODULE_INFO);
        assert_eq!(info.value("Package").as_deref(), Some("example-multimodule-deb"));
        assert_eq!(info.value("Version").as_deref(), Some("3.0+202010221611"));
        assert_eq!(info.value("Homepage").as_deref(), Some("https://example.com/"));
        assert_eq!(info.value("Maintainer").as_deref(), Some("Jane Doe <jane@doe.com>"));
    }

    #[test]
    fn test_continuation_lines_are_joined() {
        let info = InfoRecord::new(MULTIMODULE_INFO);
        assert_eq!(
            info.value("Build-Depends").as_deref(),
            Some("build-essential, some, other, dependency, packages")
        );
        assert_eq!(
            info.value("Description").as_deref(),
            Some("Example Multimodule Project This is an example of a multimodule project")
        );
    }

    #[test]
    fn test_missing_field_is_absent() {
        let info = InfoRecord::new(MULTIMODULE_INFO);
        assert_eq!(info.value("Nonexistent"), None);
        assert_eq!(info.value("package"), None);
        // "Depends" must not match "Build-Depends"
        assert_eq!(info.value("Depends").as_deref(), Some("default-jre-headless"));
    }

    #[test]
    fn test_field_names() {
        let info = InfoRecord::new(MULTIMODULE_INFO);
        let names = info.field_names();
        assert_eq!(names.first(), Some(&"Package"));
        assert!(names.contains(&"Build-Depends"));
        assert!(!names.iter().any(|n| n.starts_with("size")));
        assert_eq!(names.len(), 11);
    }

    #[test]
    fn test_single_space_line_ends_continuation() {
        let text = indoc! {"
            header
             Description: first
              second
             Homepage: https://example.com/
        "};
        let info = InfoRecord::new(text);
        assert_eq!(info.value("Description").as_deref(), Some("first second"));
    }
}
