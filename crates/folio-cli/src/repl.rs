//! Read-eval-print loop for the folio shell.
//!
//! Reads input with rustyline (history, line editing) and hands each line
//! to the session for dispatch. Command errors are printed and do not
//! terminate the loop; use `exit` or Ctrl-D to leave.

use crate::commands::{Outcome, Session};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "folio> ";

pub struct Repl {
    session: Session,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(session: Session) -> Result<Self, ReadlineError> {
        let editor = DefaultEditor::new()?;
        Ok(Self { session, editor })
    }

    pub fn run(&mut self) {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    self.editor.add_history_entry(trimmed).ok();
                    if self.session.execute(trimmed) == Outcome::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => {
                    println!("So long...");
                    break;
                }
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    break;
                }
            }
        }
    }
}
