//! Structural view of a shell command line.
//!
//! Rules never look at a command as one opaque string. The line is split on
//! unquoted control operators (`;`, `&&`, `||`, `|`, `&`, newlines) into
//! segments, each segment is tokenized with `shell_words`, and output
//! redirections are pulled out so their targets can be checked like any
//! other path the command writes to.
//!
//! `sh -c '...'` style invocations are parsed recursively so a destructive
//! command cannot hide inside a nested shell string.

use std::fmt;

/// Nested `sh -c` strings deeper than this are refused as unparsable.
const MAX_NESTING: usize = 3;

/// Programs that run another program given as their arguments.
const WRAPPERS: &[&str] = &[
    "env", "nice", "nohup", "command", "exec", "time", "sudo", "doas", "xargs",
];

/// Shells whose `-c` argument is itself a command line.
const SHELLS: &[&str] = &["sh", "bash", "zsh", "dash", "ksh", "fish"];

/// Programs whose positional arguments are removed.
const REMOVERS: &[&str] = &["rm", "rmdir", "unlink", "shred", "srm"];

/// Redirect targets that discard output instead of writing a file.
const NULL_SINKS: &[&str] = &["/dev/null", "/dev/stdout", "/dev/stderr"];

/// Why a command line could not be given a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeError(String);

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ShapeError {}

/// One simple command, with its redirections separated out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    /// Words of the command after quote removal.
    pub argv: Vec<String>,
    /// Files written by `>`, `>>` or `&>`.
    pub output_targets: Vec<String>,
    /// Whether the segment reads from a `<` redirection.
    pub reads_input: bool,
    /// Whether the segment contains `$(...)` or backticks outside single quotes.
    pub has_substitution: bool,
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandShape {
    pub segments: Vec<Segment>,
}

impl CommandShape {
    /// Split and tokenize a command line.
    pub fn parse(command: &str) -> Result<Self, ShapeError> {
        let mut segments = Vec::new();
        collect_segments(command, 0, &mut segments)?;
        Ok(Self { segments })
    }

    /// Every word in every segment, including redirect targets.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flat_map(|s| {
            s.argv
                .iter()
                .chain(s.output_targets.iter())
                .map(String::as_str)
        })
    }

    /// Paths the command may delete, overwrite, or change metadata of.
    pub fn mutation_targets(&self) -> Vec<String> {
        self.segments
            .iter()
            .flat_map(Segment::mutation_targets)
            .collect()
    }

    /// Paths the command removes outright.
    pub fn deletion_targets(&self) -> Vec<String> {
        self.segments
            .iter()
            .flat_map(Segment::deletion_targets)
            .collect()
    }
}

impl Segment {
    /// Index in `argv` of the program that actually runs, skipping
    /// `VAR=value` assignments and wrappers such as `sudo` or `env`.
    pub fn program_index(&self) -> Option<usize> {
        let mut i = 0;
        while i < self.argv.len() {
            let word = &self.argv[i];
            if is_assignment(word) {
                i += 1;
                continue;
            }
            let name = basename(word);
            if !WRAPPERS.contains(&name) {
                return Some(i);
            }
            i += 1;
            // Wrapper options, including the few that take a value.
            while i < self.argv.len() {
                let opt = self.argv[i].as_str();
                if opt == "--" {
                    i += 1;
                    break;
                }
                if is_assignment(opt) && name == "env" {
                    i += 1;
                    continue;
                }
                if !opt.starts_with('-') || opt == "-" {
                    break;
                }
                let takes_value = matches!(
                    (name, opt),
                    ("nice", "-n") | ("sudo", "-u") | ("sudo", "-g") | ("doas", "-u")
                        | ("xargs", "-n") | ("xargs", "-I") | ("xargs", "-P")
                        | ("env", "-u")
                );
                i += if takes_value { 2 } else { 1 };
            }
        }
        None
    }

    /// Whether the program is launched by `xargs`, which appends words read
    /// from standard input to its arguments.
    pub fn runs_under_xargs(&self) -> bool {
        let end = self.program_index().unwrap_or(self.argv.len());
        self.argv[..end].iter().any(|w| basename(w) == "xargs")
    }

    /// Basename of the effective program, if any.
    pub fn program(&self) -> Option<&str> {
        self.program_index().map(|i| basename(&self.argv[i]))
    }

    /// Arguments following the effective program.
    pub fn args(&self) -> &[String] {
        match self.program_index() {
            Some(i) => &self.argv[i + 1..],
            None => &[],
        }
    }

    /// Arguments that are not options, honoring `--`.
    pub fn positional_args(&self) -> Vec<&str> {
        positional(self.args())
    }

    /// Option arguments appearing before `--`.
    pub fn flags(&self) -> Vec<&str> {
        self.args()
            .iter()
            .map(String::as_str)
            .take_while(|a| *a != "--")
            .filter(|a| a.starts_with('-') && *a != "-")
            .collect()
    }

    /// Whether every redirection in this segment discards its output.
    pub fn writes_only_to_null(&self) -> bool {
        self.output_targets
            .iter()
            .all(|t| NULL_SINKS.contains(&t.as_str()))
    }

    /// Paths this segment removes.
    pub fn deletion_targets(&self) -> Vec<String> {
        let Some(program) = self.program() else {
            return Vec::new();
        };
        let args = self.args();

        if REMOVERS.contains(&program) {
            return owned(positional(args));
        }

        match program {
            "mv" => {
                let mut paths = positional(args);
                paths.pop();
                owned(paths)
            }
            "find" if find_deletes(args) => find_roots(args),
            "truncate" => owned(positional_skipping_values(args, &["-s", "-r"])),
            _ => Vec::new(),
        }
    }

    /// Paths this segment deletes, overwrites, or changes ownership or mode of.
    pub fn mutation_targets(&self) -> Vec<String> {
        let mut targets = self.deletion_targets();

        if let Some(program) = self.program() {
            let args = self.args();
            match program {
                "mv" | "cp" | "ln" | "rsync" | "install" => {
                    if let Some(dest) = positional(args).last() {
                        targets.push((*dest).to_string());
                    }
                }
                "chmod" | "chown" | "chgrp" => {
                    // First positional is the mode or owner.
                    targets.extend(positional(args).into_iter().skip(1).map(str::to_string));
                }
                "dd" => {
                    targets.extend(
                        args.iter()
                            .filter_map(|a| a.strip_prefix("of="))
                            .map(str::to_string),
                    );
                }
                _ => {}
            }
        }

        targets.extend(
            self.output_targets
                .iter()
                .filter(|t| !NULL_SINKS.contains(&t.as_str()))
                .cloned(),
        );
        targets
    }
}

/// Normalize a path word so equivalent spellings compare equal.
///
/// `$HOME`, `${HOME}`, the caller's home directory and any
/// `/Users/<name>` or `/home/<name>` prefix all become `~`. Repeated
/// slashes collapse and a trailing slash is dropped.
pub fn normalize_path(word: &str, home: Option<&str>) -> String {
    let mut path = word.trim().to_string();

    for var in ["${HOME}", "$HOME"] {
        if let Some(rest) = path.strip_prefix(var)
            && (rest.is_empty() || rest.starts_with('/'))
        {
            path = format!("~{}", rest);
        }
    }

    if let Some(home) = home.map(|h| h.trim_end_matches('/'))
        && !home.is_empty()
        && let Some(rest) = path.strip_prefix(home)
        && (rest.is_empty() || rest.starts_with('/'))
    {
        path = format!("~{}", rest);
    }

    for users_root in ["/Users/", "/home/"] {
        if let Some(rest) = path.strip_prefix(users_root)
            && !rest.is_empty()
            && !rest.starts_with("Shared")
        {
            let tail = rest.find('/').map(|i| &rest[i..]).unwrap_or("");
            path = format!("~{}", tail);
        }
    }

    let mut collapsed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && collapsed.ends_with('/') {
            continue;
        }
        collapsed.push(c);
    }
    if collapsed.len() > 1 && collapsed.ends_with('/') {
        collapsed.pop();
    }
    collapsed
}

/// Replace a leading `~` with the home directory.
pub fn expand_home(path: &str, home: Option<&str>) -> Option<String> {
    let home = home?.trim_end_matches('/');
    let rest = path.strip_prefix('~')?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(format!("{}{}", home, rest))
    } else {
        None
    }
}

/// Whether a path has a `..` component.
pub fn has_parent_component(path: &str) -> bool {
    path.split('/').any(|c| c == "..")
}

/// Whether a word contains glob metacharacters.
pub fn is_glob(word: &str) -> bool {
    word.contains(['*', '?', '['])
}

/// The directory part of a path that precedes its first glob component.
pub fn literal_prefix(path: &str) -> &str {
    match path.find(['*', '?', '[']) {
        Some(i) => match path[..i].rfind('/') {
            Some(0) => "/",
            Some(slash) => &path[..slash],
            None => "",
        },
        None => path,
    }
}

fn basename(word: &str) -> &str {
    word.rsplit('/').next().unwrap_or(word)
}

fn is_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !name.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}

fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut options_done = false;
    for arg in args {
        if !options_done && arg == "--" {
            options_done = true;
            continue;
        }
        if !options_done && arg.starts_with('-') && arg != "-" {
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn positional_skipping_values<'a>(args: &'a [String], valued: &[&str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if valued.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with('-') {
            out.push(arg.as_str());
        }
    }
    out
}

fn owned(words: Vec<&str>) -> Vec<String> {
    words.into_iter().map(str::to_string).collect()
}

fn find_deletes(args: &[String]) -> bool {
    args.iter().enumerate().any(|(i, a)| {
        a == "-delete"
            || ((a == "-exec" || a == "-execdir" || a == "-ok")
                && args
                    .get(i + 1)
                    .is_some_and(|p| REMOVERS.contains(&basename(p))))
    })
}

/// Starting points of a `find` invocation; `.` when none are given.
fn find_roots(args: &[String]) -> Vec<String> {
    let roots: Vec<String> = args
        .iter()
        .skip_while(|a| matches!(a.as_str(), "-H" | "-L" | "-P" | "-x" | "-E" | "-X"))
        .take_while(|a| !a.starts_with('-') && *a != "(" && *a != "!")
        .cloned()
        .collect();
    if roots.is_empty() {
        vec![".".to_string()]
    } else {
        roots
    }
}

/// Raw text of one segment before tokenizing.
#[derive(Default)]
struct RawSegment {
    text: String,
    output_targets: Vec<String>,
    reads_input: bool,
    has_substitution: bool,
}

fn collect_segments(line: &str, depth: usize, out: &mut Vec<Segment>) -> Result<(), ShapeError> {
    if depth > MAX_NESTING {
        return Err(ShapeError("shell commands are nested too deeply".to_string()));
    }

    for raw in split_raw(line)? {
        let argv = shell_words::split(&raw.text)
            .map_err(|e| ShapeError(format!("cannot tokenize '{}': {}", raw.text.trim(), e)))?;
        if argv.is_empty() && raw.output_targets.is_empty() {
            continue;
        }

        let segment = Segment {
            argv,
            output_targets: raw.output_targets,
            reads_input: raw.reads_input,
            has_substitution: raw.has_substitution,
        };

        let nested = nested_script(&segment).map(str::to_string);
        out.push(segment);
        if let Some(script) = nested {
            collect_segments(&script, depth + 1, out)?;
        }
    }
    Ok(())
}

fn nested_script(segment: &Segment) -> Option<&str> {
    if !SHELLS.contains(&segment.program()?) {
        return None;
    }
    let args = segment.args();
    let flag = args
        .iter()
        .position(|a| a.starts_with('-') && !a.starts_with("--") && a.contains('c'))?;
    args.get(flag + 1).map(String::as_str)
}

/// Split on unquoted control operators and extract redirections.
fn split_raw(line: &str) -> Result<Vec<RawSegment>, ShapeError> {
    #[derive(PartialEq)]
    enum Quote {
        None,
        Single,
        Double,
    }

    let chars: Vec<char> = line.chars().collect();
    let mut segments = Vec::new();
    let mut current = RawSegment::default();
    let mut quote = Quote::None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                }
                current.text.push(c);
                i += 1;
                continue;
            }
            Quote::Double => {
                match c {
                    '"' => quote = Quote::None,
                    '\\' if i + 1 < chars.len() => {
                        current.text.push(c);
                        current.text.push(chars[i + 1]);
                        i += 2;
                        continue;
                    }
                    '`' => current.has_substitution = true,
                    '$' if chars.get(i + 1) == Some(&'(') => current.has_substitution = true,
                    _ => {}
                }
                current.text.push(c);
                i += 1;
                continue;
            }
            Quote::None => {}
        }

        match c {
            '\\' if i + 1 < chars.len() => {
                current.text.push(c);
                current.text.push(chars[i + 1]);
                i += 2;
            }
            '\'' => {
                quote = Quote::Single;
                current.text.push(c);
                i += 1;
            }
            '"' => {
                quote = Quote::Double;
                current.text.push(c);
                i += 1;
            }
            '`' => {
                current.has_substitution = true;
                current.text.push(c);
                i += 1;
            }
            '$' if chars.get(i + 1) == Some(&'(') => {
                current.has_substitution = true;
                current.text.push(c);
                i += 1;
            }
            '&' if chars.get(i + 1) == Some(&'>') => {
                // `&>file` and `&>>file` redirect both streams.
                i += 1;
                i = read_redirect(&chars, i, &mut current)?;
            }
            ';' | '\n' | '|' | '&' => {
                segments.push(std::mem::take(&mut current));
                while i < chars.len() && matches!(chars[i], ';' | '\n' | '|' | '&') {
                    i += 1;
                }
            }
            '>' => {
                drop_fd_prefix(&mut current.text);
                i = read_redirect(&chars, i, &mut current)?;
            }
            '<' => {
                drop_fd_prefix(&mut current.text);
                current.reads_input = true;
                i += 1;
                while i < chars.len() && chars[i] == '<' {
                    i += 1;
                }
            }
            _ => {
                current.text.push(c);
                i += 1;
            }
        }
    }

    if quote != Quote::None {
        return Err(ShapeError("unterminated quote".to_string()));
    }
    segments.push(current);
    Ok(segments)
}

/// Remove a file-descriptor number such as the `2` in `2>`.
fn drop_fd_prefix(text: &mut String) {
    let digits = text
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .count();
    if digits == 0 {
        return;
    }
    let cut = text.len() - digits;
    let boundary = text[..cut].chars().last().is_none_or(char::is_whitespace);
    if boundary {
        text.truncate(cut);
    }
}

/// Consume a `>` redirection starting at `i` and record its target.
fn read_redirect(chars: &[char], mut i: usize, current: &mut RawSegment) -> Result<usize, ShapeError> {
    // Skip `>`, `>>`, `>|`.
    while i < chars.len() && matches!(chars[i], '>' | '|') {
        i += 1;
    }

    // `>&2` duplicates a descriptor rather than naming a file.
    let duplicates = chars.get(i) == Some(&'&');
    if duplicates {
        i += 1;
    }

    while chars.get(i).is_some_and(|c| *c == ' ' || *c == '\t') {
        i += 1;
    }

    let start = i;
    let mut quote: Option<char> = None;
    while i < chars.len() {
        let c = chars[i];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c.is_whitespace() || matches!(c, ';' | '|' | '&' | '<' | '>') => break,
            None => {}
        }
        i += 1;
    }
    if quote.is_some() {
        return Err(ShapeError("unterminated quote in redirection".to_string()));
    }

    let word: String = chars[start..i].iter().collect();
    if word.is_empty() {
        return Err(ShapeError("redirection without a target".to_string()));
    }
    let is_descriptor = word.chars().all(|c| c.is_ascii_digit()) || word == "-";
    if !(duplicates && is_descriptor) {
        let target = shell_words::split(&word)
            .ok()
            .and_then(|mut w| w.pop())
            .unwrap_or(word);
        current.output_targets.push(target);
    }
    // Keep words on either side of the redirection separate.
    current.text.push(' ');
    Ok(i)
}
