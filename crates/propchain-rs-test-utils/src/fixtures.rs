use propchain_rs_config::FileSystemFetcher;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURE_DIR: &str = "conf";

const JUST: &[(&str, &str)] = &[
    ("member.name", "KwonNam Son"),
    ("member.email", "kwon37xi@gmail.com"),
    ("test.override", "original"),
    ("test.override.triple", "original"),
    ("test.placeholder.parent", "parent value"),
    ("test.placeholder.grand_parent", "grandparent"),
    ("project.home", "${TMPDIR}/project"),
];

const CHILD: &[(&str, &str)] = &[
    ("member.id", "kwon37xi"),
    ("project.name", "Spring Properties Inheritance"),
    ("test.override", "overridden"),
    ("test.override.triple", "overridden by child"),
    ("test.placeholder.parent", "${test.placeholder.parent}/child value"),
    ("LANG", "KOREAN!!"),
];

const GRAND_CHILD: &[(&str, &str)] = &[
    ("test.override.triple", "overridden by grand child"),
    (
        "test.placeholder.parent",
        "${test.placeholder.parent}/grand child value",
    ),
    (
        "test.placeholder.grand_parent",
        "${test.placeholder.grand_parent}/grandchild",
    ),
    (
        "test.placeholder.member.info",
        "${member.id}-${member.name}-${member.email}-${project.name}",
    ),
    ("test.placeholder.parent.system", "${TMPDIR}/${member.id}"),
    ("test.placeholder.parent.override.system", "${LANG}"),
];

/// Ambient values the fixture placeholders expect.
pub fn fixture_ambient() -> HashMap<String, String> {
    HashMap::from([
        ("TMPDIR".to_string(), "/tmp/propchain".to_string()),
        ("LANG".to_string(), "en_US.UTF-8".to_string()),
    ])
}

/// A three-level chain (just <- child <- grand-child) written to a temp
/// directory in both the text and the XML encoding.
///
/// Files live under `conf/`; the temp root doubles as the only classpath
/// root, and `__extends__` values use `classpath:` locations.
pub struct FixtureTree {
    temp: TempDir,
}

impl FixtureTree {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join(FIXTURE_DIR);
        fs::create_dir_all(&dir).expect("fixture dir");

        let layers = [
            ("just", None, JUST),
            ("child", Some("just"), CHILD),
            ("grand-child", Some("child"), GRAND_CHILD),
        ];
        for (name, parent, entries) in layers {
            let text_parent = parent.map(|parent| format!("classpath:/{FIXTURE_DIR}/{parent}.properties"));
            fs::write(
                dir.join(format!("{name}.properties")),
                render_text(text_parent.as_deref(), entries),
            )
            .expect("write properties");

            let xml_parent =
                parent.map(|parent| format!("classpath:/{FIXTURE_DIR}/{parent}-properties.xml"));
            fs::write(
                dir.join(format!("{name}-properties.xml")),
                render_xml(xml_parent.as_deref(), entries),
            )
            .expect("write xml");
        }

        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Absolute path of a fixture file.
    pub fn path(&self, file: &str) -> PathBuf {
        self.root().join(FIXTURE_DIR).join(file)
    }

    /// `classpath:` location of a fixture file.
    pub fn classpath(&self, file: &str) -> String {
        format!("classpath:/{FIXTURE_DIR}/{file}")
    }

    /// Filesystem fetcher rooted at the fixture directory.
    pub fn fetcher(&self) -> FileSystemFetcher {
        FileSystemFetcher::new(self.root()).with_classpath_root(self.root())
    }

    /// Write an extra file next to the fixtures and return its path.
    pub fn write(&self, file: &str, contents: &str) -> PathBuf {
        let path = self.path(file);
        fs::write(&path, contents).expect("write fixture");
        path
    }
}

impl Default for FixtureTree {
    fn default() -> Self {
        Self::new()
    }
}

fn render_text(parent: Option<&str>, entries: &[(&str, &str)]) -> String {
    let mut out = String::from("# generated fixture\n");
    if let Some(parent) = parent {
        out.push_str(&format!("__extends__={parent}\n"));
    }
    for (key, value) in entries {
        out.push_str(&format!("{key}={value}\n"));
    }
    out
}

fn render_xml(parent: Option<&str>, entries: &[(&str, &str)]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE properties SYSTEM \"http://java.sun.com/dtd/properties.dtd\">\n\
         <properties>\n    <comment>generated fixture</comment>\n",
    );
    if let Some(parent) = parent {
        out.push_str(&format!(
            "    <entry key=\"__extends__\">{}</entry>\n",
            escape_xml(parent)
        ));
    }
    for (key, value) in entries {
        out.push_str(&format!(
            "    <entry key=\"{}\">{}</entry>\n",
            escape_xml(key),
            escape_xml(value)
        ));
    }
    out.push_str("</properties>\n");
    out
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
