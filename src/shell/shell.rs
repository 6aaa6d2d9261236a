use std::io::{BufRead, Lines, Write};

use chrono::Utc;
use colored::Colorize;
use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::filesystem::{AccessLevel, FileSystem, FsError, NodeId};

/// Interactive numbered menu over a [`FileSystem`].
///
/// Reads whole lines, so every answer is one line of input. End of input
/// anywhere behaves like choosing exit.
pub struct Shell {
    fs: FileSystem,
}

impl Shell {
    pub fn new(fs: FileSystem) -> Self {
        Self { fs }
    }

    /// Runs the menu loop on stdin until exit or end of input.
    pub fn run(mut self) -> Result<(), ShellError> {
        let stdin = std::io::stdin();
        let mut input = stdin.lock().lines();
        self.run_loop(&mut input)
    }

    fn run_loop<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<(), ShellError> {
        loop {
            print_menu();
            let Some(choice) = prompt(input, "Choose an option: ")? else {
                break;
            };
            if !self.dispatch(choice.trim(), input)? {
                break;
            }
        }
        Ok(())
    }

    /// Returns `false` when the shell should stop.
    fn dispatch<B: BufRead>(
        &mut self,
        choice: &str,
        input: &mut Lines<B>,
    ) -> Result<bool, ShellError> {
        match choice {
            "1" => self.add_directory(input),
            "2" => self.add_file(input),
            "3" => self.remove_directory(input),
            "4" => self.remove_file(input),
            "5" => self.search_by_name(input),
            "6" => self.search_by_extension(input),
            "7" => self.show_full_path(input),
            "8" => self.list_contents(input),
            "9" => {
                if self.fs.is_empty() {
                    println!("File system is empty.");
                } else {
                    println!("{}", "File system structure:".cyan().bold());
                    print!("{}", self.fs.render_tree());
                }
                Ok(true)
            }
            "0" => {
                println!("Exiting...");
                Ok(false)
            }
            other => {
                debug!("Rejected menu choice '{other}'");
                println!("{}", "Invalid choice, try again.".red());
                Ok(true)
            }
        }
    }

    fn add_directory<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<bool, ShellError> {
        let Some(path) = prompt(input, "Destination path: ")? else {
            return Ok(false);
        };
        let Some(name) = prompt(input, "Directory name: ")? else {
            return Ok(false);
        };
        let Some(level) = prompt_access_level(input)? else {
            return Ok(false);
        };
        match self.fs.add_directory(path.trim(), name.trim(), level) {
            Ok(_) => println!("{}", "Directory added.".green()),
            Err(e) => print_failure(&e),
        }
        Ok(true)
    }

    fn add_file<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<bool, ShellError> {
        let Some(path) = prompt(input, "Destination path: ")? else {
            return Ok(false);
        };
        let Some(name) = prompt(input, "File name: ")? else {
            return Ok(false);
        };
        let Some(extension) = prompt(input, "Extension: ")? else {
            return Ok(false);
        };
        let Some(size) = prompt_size(input)? else {
            return Ok(false);
        };
        let Some(level) = prompt_access_level(input)? else {
            return Ok(false);
        };
        match self.fs.add_file(
            path.trim(),
            name.trim(),
            extension.trim(),
            size,
            level,
            Utc::now(),
        ) {
            Ok(_) => println!("{}", "File added.".green()),
            Err(e) => print_failure(&e),
        }
        Ok(true)
    }

    fn remove_directory<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<bool, ShellError> {
        let Some(path) = prompt(input, "Parent path: ")? else {
            return Ok(false);
        };
        let Some(name) = prompt(input, "Directory name: ")? else {
            return Ok(false);
        };
        match self.fs.remove_directory(path.trim(), name.trim()) {
            Ok(()) => println!("{}", "Directory removed.".green()),
            Err(e) => print_failure(&e),
        }
        Ok(true)
    }

    fn remove_file<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<bool, ShellError> {
        let Some(path) = prompt(input, "Parent path: ")? else {
            return Ok(false);
        };
        let Some(name) = prompt(input, "File name (without extension): ")? else {
            return Ok(false);
        };
        match self.fs.remove_file(path.trim(), name.trim()) {
            Ok(()) => println!("{}", "File removed.".green()),
            Err(e) => print_failure(&e),
        }
        Ok(true)
    }

    fn search_by_name<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<bool, ShellError> {
        let Some(name) = prompt(input, "Name to search: ")? else {
            return Ok(false);
        };
        let hits = self.fs.search_by_name(name.trim());
        self.print_matches(&hits);
        Ok(true)
    }

    fn search_by_extension<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<bool, ShellError> {
        let Some(extension) = prompt(input, "Extension to search: ")? else {
            return Ok(false);
        };
        let hits = self.fs.search_by_extension(extension.trim());
        self.print_matches(&hits);
        Ok(true)
    }

    fn show_full_path<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<bool, ShellError> {
        let Some(name) = prompt(input, "Name to locate: ")? else {
            return Ok(false);
        };
        let hits = self.fs.search_by_name(name.trim());
        if hits.is_empty() {
            println!("No matches found.");
        } else {
            for &id in &hits {
                println!("  {}", self.fs.full_path(id));
            }
        }
        Ok(true)
    }

    fn list_contents<B: BufRead>(&mut self, input: &mut Lines<B>) -> Result<bool, ShellError> {
        let Some(path) = prompt(input, "Directory path: ")? else {
            return Ok(false);
        };
        match self.fs.list_contents(path.trim()) {
            Ok(lines) if lines.is_empty() => println!("Directory is empty."),
            Ok(lines) => {
                for line in lines {
                    println!("  {line}");
                }
            }
            Err(e) => print_failure(&e),
        }
        Ok(true)
    }

    fn print_matches(&self, hits: &[NodeId]) {
        if hits.is_empty() {
            println!("No matches found.");
            return;
        }
        println!("Found {} match(es):", hits.len());
        for &id in hits {
            println!("  {}", self.fs.details(id));
        }
    }
}

fn print_menu() {
    println!();
    println!("{}", "=== File System Menu ===".cyan().bold());
    println!("1. Add directory");
    println!("2. Add file");
    println!("3. Remove directory");
    println!("4. Remove file");
    println!("5. Search by name");
    println!("6. Search by extension");
    println!("7. Show full path");
    println!("8. List contents");
    println!("9. Display file system (admin view)");
    println!("0. Exit");
}

fn print_failure(error: &FsError) {
    println!("{}", error.to_string().red());
}

/// `None` means the input ended.
fn prompt<B: BufRead>(input: &mut Lines<B>, label: &str) -> Result<Option<String>, ShellError> {
    print!("{label}");
    std::io::stdout().flush().context(TerminalSnafu)?;
    match input.next() {
        Some(line) => line.map(Some).context(ReadInputSnafu),
        None => Ok(None),
    }
}

fn prompt_access_level<B: BufRead>(
    input: &mut Lines<B>,
) -> Result<Option<AccessLevel>, ShellError> {
    loop {
        let Some(raw) = prompt(input, "Access level (USER/SYSTEM): ")? else {
            return Ok(None);
        };
        match raw.parse::<AccessLevel>() {
            Ok(level) => return Ok(Some(level)),
            Err(e) => println!("{}", e.to_string().red()),
        }
    }
}

fn prompt_size<B: BufRead>(input: &mut Lines<B>) -> Result<Option<u64>, ShellError> {
    loop {
        let Some(raw) = prompt(input, "Size in bytes: ")? else {
            return Ok(None);
        };
        match raw.trim().parse::<u64>() {
            Ok(size) => return Ok(Some(size)),
            Err(_) => println!("{}", "Size must be a non-negative integer.".red()),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ShellError {
    #[snafu(display("Failed to read from standard input"))]
    ReadInputError { source: std::io::Error },
    #[snafu(display("Failed to flush standard output"))]
    TerminalError { source: std::io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_script(script: &str) -> Shell {
        let mut shell = Shell::new(FileSystem::new());
        let mut input = Cursor::new(script).lines();
        shell.run_loop(&mut input).unwrap();
        shell
    }

    #[test]
    fn scripted_session_builds_a_tree() {
        let shell = run_script("1\n/\ndocs\nUSER\n2\n/docs\nreadme\ntxt\n120\nUSER\n0\n");
        let docs = shell.fs.resolve_dir("/docs").unwrap();
        assert_eq!(shell.fs.children(docs).len(), 1);
        assert_eq!(shell.fs.size_of(docs), 120);
    }

    #[test]
    fn invalid_menu_choice_keeps_the_loop_alive() {
        let shell = run_script("42\nbogus\n1\n/\ndocs\nUSER\n0\n");
        assert!(shell.fs.resolve_dir("/docs").is_some());
    }

    #[test]
    fn end_of_input_stops_the_shell() {
        // No exit choice, the script just runs out after one command.
        let shell = run_script("1\n/\ndocs\nUSER\n");
        assert!(shell.fs.resolve_dir("/docs").is_some());
    }

    #[test]
    fn end_of_input_mid_operation_stops_cleanly() {
        let shell = run_script("1\n/\n");
        assert!(shell.fs.is_empty());
    }

    #[test]
    fn bad_access_level_is_reprompted() {
        let shell = run_script("1\n/\ndocs\nADMIN\nUSER\n0\n");
        assert!(shell.fs.resolve_dir("/docs").is_some());
    }

    #[test]
    fn bad_size_is_reprompted() {
        let shell = run_script("2\n/\na\ntxt\nlots\n12\nUSER\n0\n");
        let root = shell.fs.root();
        assert_eq!(shell.fs.children(root).len(), 1);
        assert_eq!(shell.fs.size_of(root), 12);
    }

    #[test]
    fn removal_flows_through_the_menu() {
        let shell = run_script(
            "1\n/\ndocs\nUSER\n2\n/docs\na\ntxt\n5\nUSER\n4\n/docs\na\n3\n/\ndocs\n0\n",
        );
        assert!(shell.fs.is_empty());
    }

    #[test]
    fn rejected_operation_reports_and_continues() {
        // Adding into a SYSTEM directory fails, the shell moves on and the
        // next command still runs.
        let script = "1\n/\ndocs\nUSER\n\
                      1\n/\nsys\nSYSTEM\n\
                      2\n/sys\ncore\nbin\n500\nSYSTEM\n\
                      2\n/sys\nnote\ntxt\n1\nUSER\n\
                      1\n/docs\ninner\nUSER\n0\n";
        let shell = run_script(script);
        let sys = shell.fs.resolve_dir("/sys").unwrap();
        assert_eq!(shell.fs.children(sys).len(), 1);
        assert!(shell.fs.resolve_dir("/docs/inner").is_some());
    }
}
