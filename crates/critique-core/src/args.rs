use critique_prompts::Lens;

/// Options parsed from the `/critique` argument string.
///
/// Parsing runs over every token even after a problem is found, so the other
/// fields may be partially filled when `error` is set. Check `error` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    pub file: Option<String>,
    pub edit: bool,
    pub inline: bool,
    pub lens: Option<Lens>,
    pub help: bool,
    pub error: Option<String>,
}

impl Default for ParsedArgs {
    fn default() -> Self {
        Self {
            file: None,
            edit: false,
            inline: true,
            lens: None,
            help: false,
            error: None,
        }
    }
}

/// Split an argument string into tokens.
///
/// A token that starts with `"` or `'` runs verbatim to the matching quote
/// (or the end of input) and loses its quotes. There are no escapes, and a
/// quote in the middle of a token is an ordinary character.
pub fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = raw.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let Some(&first) = chars.peek() else {
            break;
        };

        let mut token = String::new();
        if first == '"' || first == '\'' {
            chars.next();
            for c in chars.by_ref() {
                if c == first {
                    break;
                }
                token.push(c);
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                token.push(c);
            }
        }
        tokens.push(token);
    }

    tokens
}

pub fn parse_args(raw: &str) -> ParsedArgs {
    let mut args = ParsedArgs::default();

    for token in tokenize(raw) {
        match token.as_str() {
            "--help" | "-h" => args.help = true,
            "--edit" | "-e" => args.edit = true,
            "--no-inline" => args.inline = false,
            "--code" => set_lens(&mut args, Lens::Code),
            "--writing" => set_lens(&mut args, Lens::Writing),
            flag if flag.starts_with('-') => {
                args.error = Some(format!("Unknown flag: {}", flag));
            }
            positional => {
                if args.file.is_none() {
                    args.file = Some(positional.to_string());
                } else {
                    args.error = Some(format!("Unexpected argument: {}", positional));
                }
            }
        }
    }

    args
}

fn set_lens(args: &mut ParsedArgs, lens: Lens) {
    if args.lens.is_some_and(|current| current != lens) {
        args.error = Some("--code and --writing cannot be used together".to_string());
    }
    args.lens = Some(lens);
}

/// Help text shown for `--help` and after usage errors
pub fn usage() -> &'static str {
    r#"Usage: /critique [path] [--code | --writing] [--no-inline] [--edit] [--help]

Critique a file, or the model's last response when no path is given.

Options:
  path           File to critique. Quote paths containing spaces. @path is accepted.
  --code         Use the code lens regardless of file type
  --writing      Use the writing lens regardless of file type
  --no-inline    Skip the annotated reproduction of the document to save tokens
  -e, --edit     Put the prompt in the editor instead of sending it
  -h, --help     Show this help

Files longer than 500 lines are critiqued by reference: the model reads the file
itself and writes an annotated copy next to it (report.md -> report.critique.md)."#
}
