/*!
 * Operator input: numbered menus and selection parsing
 */

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::utils::expand_home;

/// Why a selection could not be interpreted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Index outside `1..=len`
    #[error("{index} is not between 1 and {len}")]
    OutOfRange { index: usize, len: usize },

    /// Index given while there is nothing to choose from
    #[error("{0} was given but there is nothing to choose from")]
    NothingToChoose(usize),

    /// File type name that was not discovered
    #[error("unknown file type '{0}'")]
    UnknownFileType(String),
}

/// What empty input selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyMeans {
    All,
    Nothing,
}

/// Parse a file type selection against the discovered `options`
///
/// Accepts comma-separated 1-based indices, names with or without the
/// leading dot, or `all`. Empty input selects everything.
pub fn parse_file_types(input: &str, options: &[String]) -> Result<Vec<String>, SelectionError> {
    parse_selection(input, options, EmptyMeans::All, |token| {
        let name = if token.starts_with('.') {
            token.to_string()
        } else {
            format!(".{}", token)
        };
        options
            .iter()
            .find(|option| option.to_lowercase() == name)
            .cloned()
            .ok_or_else(|| SelectionError::UnknownFileType(token.to_string()))
    })
}

/// Parse a library selection against the detected `options`
///
/// Accepts comma-separated 1-based indices, literal names (detected or
/// not), or `all`. Empty input selects nothing.
pub fn parse_libraries(input: &str, options: &[String]) -> Result<Vec<String>, SelectionError> {
    parse_selection(input, options, EmptyMeans::Nothing, |token| {
        Ok(options
            .iter()
            .find(|option| option.to_lowercase() == token)
            .cloned()
            .unwrap_or_else(|| token.to_string()))
    })
}

fn parse_selection<F>(
    input: &str,
    options: &[String],
    empty: EmptyMeans,
    mut by_name: F,
) -> Result<Vec<String>, SelectionError>
where
    F: FnMut(&str) -> Result<String, SelectionError>,
{
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Ok(match empty {
            EmptyMeans::All => options.to_vec(),
            EmptyMeans::Nothing => Vec::new(),
        });
    }
    if input == "all" {
        return Ok(options.to_vec());
    }

    let mut selected: Vec<String> = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let choice = match token.parse::<usize>() {
            Ok(index) => pick(options, index)?,
            Err(_) => by_name(token)?,
        };
        if !selected.contains(&choice) {
            selected.push(choice);
        }
    }

    Ok(selected)
}

fn pick(options: &[String], index: usize) -> Result<String, SelectionError> {
    if options.is_empty() {
        return Err(SelectionError::NothingToChoose(index));
    }
    index
        .checked_sub(1)
        .and_then(|i| options.get(i))
        .cloned()
        .ok_or(SelectionError::OutOfRange {
            index,
            len: options.len(),
        })
}

/// Line-oriented prompts over any reader and writer
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process terminal
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask `question`, returning the trimmed answer
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Ask for a directory, offering `default` when the answer is empty
    pub fn ask_directory(&mut self, question: &str, default: Option<&Path>) -> io::Result<PathBuf> {
        let shown = default
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        let answer = self.ask(&format!("{} [{}]: ", question, shown))?;

        Ok(if answer.is_empty() {
            default.map(Path::to_path_buf).unwrap_or_default()
        } else {
            expand_home(&answer)
        })
    }

    /// Print a numbered menu
    pub fn show_menu(&mut self, title: &str, options: &[String]) -> io::Result<()> {
        writeln!(self.output, "\n{}", title)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, option)?;
        }
        Ok(())
    }

    /// Show `options` and ask until `parse` accepts the answer
    pub fn choose<F>(
        &mut self,
        title: &str,
        question: &str,
        options: &[String],
        parse: F,
    ) -> io::Result<Vec<String>>
    where
        F: Fn(&str, &[String]) -> Result<Vec<String>, SelectionError>,
    {
        self.show_menu(title, options)?;
        loop {
            let answer = self.ask(question)?;
            match parse(&answer, options) {
                Ok(selection) => return Ok(selection),
                Err(e) => writeln!(self.output, "Invalid selection: {}. Please try again.", e)?,
            }
        }
    }

    /// Interactive file type menu
    pub fn choose_file_types(&mut self, options: &[String]) -> io::Result<Vec<String>> {
        self.choose(
            "Available file types:",
            "Enter numbers of file types to include (comma-separated, or press Enter for all): ",
            options,
            parse_file_types,
        )
    }

    /// Interactive library menu
    pub fn choose_libraries(&mut self, options: &[String]) -> io::Result<Vec<String>> {
        self.choose(
            "Detected libraries:",
            "Enter names or numbers of libraries to include (comma-separated, 'all' for all, or press Enter to exclude all): ",
            options,
            parse_libraries,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn options(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn file_types_default_to_all() {
        let types = options(&[".md", ".py", ".rs"]);
        assert_eq!(parse_file_types("", &types).unwrap(), types);
        assert_eq!(parse_file_types(" ALL ", &types).unwrap(), types);
    }

    #[test]
    fn file_types_by_index_and_name() {
        let types = options(&[".md", ".py", ".rs"]);
        assert_eq!(parse_file_types("3, 1", &types).unwrap(), vec![".rs", ".md"]);
        assert_eq!(parse_file_types("py,.md,2", &types).unwrap(), vec![".py", ".md"]);
    }

    #[test]
    fn bad_file_type_selections_are_errors() {
        let types = options(&[".md", ".py"]);
        assert_eq!(
            parse_file_types("3", &types),
            Err(SelectionError::OutOfRange { index: 3, len: 2 })
        );
        assert_eq!(
            parse_file_types("0", &types),
            Err(SelectionError::OutOfRange { index: 0, len: 2 })
        );
        assert_eq!(
            parse_file_types("java", &types),
            Err(SelectionError::UnknownFileType("java".to_string()))
        );
        assert_eq!(
            parse_file_types("1", &[]),
            Err(SelectionError::NothingToChoose(1))
        );
    }

    #[test]
    fn libraries_default_to_none_and_accept_literal_names() {
        let libs = options(&["collections", "numpy", "os"]);
        assert!(parse_libraries("", &libs).unwrap().is_empty());
        assert_eq!(parse_libraries("all", &libs).unwrap(), libs);
        assert_eq!(parse_libraries("2,3", &libs).unwrap(), vec!["numpy", "os"]);
        assert_eq!(
            parse_libraries("NumPy, requests", &libs).unwrap(),
            vec!["numpy", "requests"]
        );
    }

    #[test]
    fn prompter_reprompts_after_invalid_input() {
        let input = Cursor::new("9\n1,2\n");
        let mut output = Vec::new();
        let mut prompter = Prompter::new(input, &mut output);

        let chosen = prompter
            .choose_file_types(&options(&[".py", ".txt"]))
            .unwrap();
        assert_eq!(chosen, vec![".py", ".txt"]);

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("1. .py\n2. .txt\n"));
        assert!(printed.contains("Invalid selection: 9 is not between 1 and 2"));
    }

    #[test]
    fn directory_prompt_uses_default_on_empty_answer() {
        let mut output = Vec::new();
        let mut prompter = Prompter::new(Cursor::new("\n/tmp/other\n"), &mut output);

        let first = prompter
            .ask_directory("Root", Some(Path::new("/work/proj")))
            .unwrap();
        let second = prompter
            .ask_directory("Root", Some(Path::new("/work/proj")))
            .unwrap();

        assert_eq!(first, PathBuf::from("/work/proj"));
        assert_eq!(second, PathBuf::from("/tmp/other"));
        assert!(String::from_utf8(output).unwrap().contains("Root [/work/proj]: "));
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut output = Vec::new();
        let mut prompter = Prompter::new(Cursor::new(""), &mut output);
        assert!(prompter.ask("? ").is_err());
    }
}
