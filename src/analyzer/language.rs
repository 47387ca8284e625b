//! Language detection by file extension.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source language of a file.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Rust,
    Go,
    Java,
    Kotlin,
    Scala,
    CSharp,
    C,
    Cpp,
    Swift,
    Php,
    Ruby,
    Shell,
    Sql,
    Html,
    Css,
    Markdown,
    Json,
    Yaml,
    Toml,
    Xml,
    #[default]
    Unknown,
}

/// Supported extensions and their languages.
const EXTENSIONS: &[(&str, Language)] = &[
    ("ts", Language::TypeScript),
    ("tsx", Language::TypeScript),
    ("mts", Language::TypeScript),
    ("cts", Language::TypeScript),
    ("js", Language::JavaScript),
    ("jsx", Language::JavaScript),
    ("mjs", Language::JavaScript),
    ("cjs", Language::JavaScript),
    ("py", Language::Python),
    ("pyi", Language::Python),
    ("rs", Language::Rust),
    ("go", Language::Go),
    ("java", Language::Java),
    ("kt", Language::Kotlin),
    ("kts", Language::Kotlin),
    ("scala", Language::Scala),
    ("cs", Language::CSharp),
    ("c", Language::C),
    ("h", Language::C),
    ("cpp", Language::Cpp),
    ("cc", Language::Cpp),
    ("cxx", Language::Cpp),
    ("hpp", Language::Cpp),
    ("swift", Language::Swift),
    ("php", Language::Php),
    ("rb", Language::Ruby),
    ("sh", Language::Shell),
    ("bash", Language::Shell),
    ("zsh", Language::Shell),
    ("sql", Language::Sql),
    ("html", Language::Html),
    ("htm", Language::Html),
    ("vue", Language::Html),
    ("svelte", Language::Html),
    ("css", Language::Css),
    ("scss", Language::Css),
    ("less", Language::Css),
    ("md", Language::Markdown),
    ("json", Language::Json),
    ("yaml", Language::Yaml),
    ("yml", Language::Yaml),
    ("toml", Language::Toml),
    ("xml", Language::Xml),
];

/// Extensions treated as binary content.
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "tiff", "psd", "pdf", "zip", "gz", "tgz",
    "bz2", "xz", "7z", "rar", "tar", "jar", "war", "exe", "dll", "so", "dylib", "a", "o", "obj",
    "lib", "bin", "class", "pyc", "pyo", "wasm", "woff", "woff2", "ttf", "otf", "eot", "mp3",
    "mp4", "wav", "ogg", "flac", "avi", "mov", "mkv", "webm", "sqlite", "db", "dat", "iso",
];

/// Comment syntax of a language.
#[derive(Debug, Clone, Copy)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: Option<(&'static str, &'static str)>,
}

/// Groups of languages sharing declaration and import syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// JavaScript and TypeScript.
    Script,
    Python,
    Rust,
    Go,
    /// Brace languages with modifier-prefixed declarations (Java, C#, Kotlin, C, ...).
    Braced,
    Ruby,
    /// Markup, data and shell files: lines and complexity only.
    Other,
}

impl Language {
    /// Detect language from a path's extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Unknown, |ext| Self::from_extension(ext))
    }

    /// Detect language from an extension without the leading dot.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map_or(Self::Unknown, |(_, lang)| *lang)
    }

    /// Lowercase name used in serialized output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
            Self::CSharp => "csharp",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Swift => "swift",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Shell => "shell",
            Self::Sql => "sql",
            Self::Html => "html",
            Self::Css => "css",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Xml => "xml",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a serialized name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let name = name.to_lowercase();
        ALL.iter()
            .copied()
            .find(|l| l.as_str() == name)
            .unwrap_or(Self::Unknown)
    }

    #[must_use]
    pub const fn family(self) -> Family {
        match self {
            Self::TypeScript | Self::JavaScript => Family::Script,
            Self::Python => Family::Python,
            Self::Rust => Family::Rust,
            Self::Go => Family::Go,
            Self::Java
            | Self::Kotlin
            | Self::Scala
            | Self::CSharp
            | Self::C
            | Self::Cpp
            | Self::Swift
            | Self::Php => Family::Braced,
            Self::Ruby => Family::Ruby,
            _ => Family::Other,
        }
    }

    #[must_use]
    pub const fn comment_syntax(self) -> CommentSyntax {
        const C_STYLE: CommentSyntax = CommentSyntax {
            line: &["//"],
            block: Some(("/*", "*/")),
        };
        const HASH: CommentSyntax = CommentSyntax {
            line: &["#"],
            block: None,
        };
        match self {
            Self::Python => CommentSyntax {
                line: &["#"],
                block: Some(("\"\"\"", "\"\"\"")),
            },
            Self::Ruby => CommentSyntax {
                line: &["#"],
                block: Some(("=begin", "=end")),
            },
            Self::Php => CommentSyntax {
                line: &["//", "#"],
                block: Some(("/*", "*/")),
            },
            Self::Shell | Self::Yaml | Self::Toml => HASH,
            Self::Sql => CommentSyntax {
                line: &["--"],
                block: Some(("/*", "*/")),
            },
            Self::Html | Self::Xml | Self::Markdown => CommentSyntax {
                line: &[],
                block: Some(("<!--", "-->")),
            },
            Self::Css => CommentSyntax {
                line: &[],
                block: Some(("/*", "*/")),
            },
            Self::Json | Self::Unknown => CommentSyntax {
                line: &[],
                block: None,
            },
            _ => C_STYLE,
        }
    }
}

const ALL: &[Language] = &[
    Language::TypeScript,
    Language::JavaScript,
    Language::Python,
    Language::Rust,
    Language::Go,
    Language::Java,
    Language::Kotlin,
    Language::Scala,
    Language::CSharp,
    Language::C,
    Language::Cpp,
    Language::Swift,
    Language::Php,
    Language::Ruby,
    Language::Shell,
    Language::Sql,
    Language::Html,
    Language::Css,
    Language::Markdown,
    Language::Json,
    Language::Yaml,
    Language::Toml,
    Language::Xml,
    Language::Unknown,
];

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether a path has a binary extension.
#[must_use]
pub fn is_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_lowercase();
            BINARY_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Extensions known to hold source code, used when resolving module references.
#[must_use]
pub fn source_extensions(language: Language) -> &'static [&'static str] {
    match language {
        Language::TypeScript | Language::JavaScript => {
            &["ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts"]
        }
        Language::Python => &["py", "pyi"],
        Language::Rust => &["rs"],
        Language::C | Language::Cpp => &["h", "hpp", "c", "cc", "cpp", "cxx"],
        _ => &[],
    }
}
