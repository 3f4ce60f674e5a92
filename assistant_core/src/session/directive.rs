/// What a single input line asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `exit`
    Exit,
    /// `>token`: embed files whose path contains `token` verbatim.
    Embed(&'a str),
    /// `/forget...`
    Forget,
    /// Anything else goes to the backend.
    Ask(&'a str),
}

impl<'a> Directive<'a> {
    /// Classify a line with its line ending already removed.
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        if line == "exit" {
            Self::Exit
        } else if let Some(token) = line.strip_prefix('>') {
            Self::Embed(token)
        } else if line.starts_with("/forget") {
            Self::Forget
        } else {
            Self::Ask(line)
        }
    }
}

/// Strip one trailing `\n` or `\r\n`.
pub(crate) fn trim_line_ending(line: &str) -> &str {
    line.strip_suffix('\n')
        .map_or(line, |l| l.strip_suffix('\r').unwrap_or(l))
}
