use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How the critiqued material is read: as prose or as source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lens {
    #[default]
    Writing,
    Code,
}

impl std::fmt::Display for Lens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lens::Writing => write!(f, "writing"),
            Lens::Code => write!(f, "code"),
        }
    }
}

impl std::str::FromStr for Lens {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "writing" | "prose" => Ok(Lens::Writing),
            "code" => Ok(Lens::Code),
            _ => Err(format!("Unknown lens: {}", s)),
        }
    }
}

const CODE_EXTENSIONS: &[&str] = &[
    // Languages
    "ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs", "py", "pyi", "rs", "go", "java", "kt",
    "kts", "scala", "swift", "c", "h", "cc", "cpp", "cxx", "hh", "hpp", "hxx", "m", "mm", "cs",
    "fs", "vb", "rb", "php", "pl", "pm", "lua", "r", "jl", "dart", "ex", "exs", "erl", "hrl",
    "hs", "ml", "mli", "clj", "cljs", "elm", "zig", "nim", "v", "sol", "groovy", "sql",
    // Shell
    "sh", "bash", "zsh", "fish", "ps1", "bat", "cmd",
    // Markup and styles
    "html", "htm", "xml", "svg", "vue", "svelte", "astro", "css", "scss", "sass", "less",
    // Config and data
    "json", "jsonc", "json5", "yaml", "yml", "toml", "ini", "cfg", "conf", "env", "properties",
    "proto", "graphql", "gql", "tf", "hcl", "nix",
    // Build files
    "gradle", "cmake", "mk", "bazel", "bzl", "dockerfile", "lock",
];

const WRITING_EXTENSIONS: &[&str] = &[
    "md", "markdown", "mdx", "txt", "text", "tex", "latex", "rst", "adoc", "asciidoc", "org",
    "wiki",
];

/// Extensionless files that are always code, compared lower-cased
const CODE_FILENAMES: &[&str] = &[
    "dockerfile",
    "containerfile",
    "makefile",
    "gnumakefile",
    "justfile",
    "rakefile",
    "gemfile",
    "podfile",
    "brewfile",
    "vagrantfile",
    "procfile",
    "jenkinsfile",
    "build",
    "workspace",
];

/// Pick a lens for a file path. Anything unrecognized reads as writing.
pub fn classify(file_path: Option<&str>) -> Lens {
    let Some(file_path) = file_path else {
        return Lens::Writing;
    };

    let path = Path::new(file_path);
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);
    let (lens, reason) = match extension.as_deref() {
        Some(ext) if CODE_EXTENSIONS.contains(&ext) => (Lens::Code, "code extension"),
        Some(ext) if is_writing_extension(ext) => (Lens::Writing, "writing extension"),
        Some(_) => (Lens::Writing, "unknown extension"),
        None if is_code_filename(path) => (Lens::Code, "build filename"),
        None => (Lens::Writing, "no extension"),
    };

    debug!(path = file_path, %lens, reason, "Classified file");
    lens
}

fn is_writing_extension(ext: &str) -> bool {
    WRITING_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

fn is_code_filename(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| CODE_FILENAMES.contains(&n.to_lowercase().as_str()))
        .unwrap_or(false)
}
