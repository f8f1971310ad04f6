use std::io::{self, BufRead, Write};

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> io::Result<bool>,
{
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        self(question)
    }
}

/// Prompts on stdout and reads the answer from stdin.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        print!("{} [Y/n] ", question);
        io::stdout().flush()?;
        let stdin = io::stdin();
        read_answer(&mut stdin.lock())
    }
}

/// Read one line and interpret it as a `[Y/n]` answer.
///
/// An empty answer accepts. End of input declines.
pub fn read_answer<R: BufRead>(input: &mut R) -> io::Result<bool> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(accepts(&line))
}

fn accepts(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}
