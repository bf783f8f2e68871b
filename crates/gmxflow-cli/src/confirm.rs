use std::io::{self, BufRead, Write};
use tracing::info;

/// Builds the confirmation callback handed to the validator.
///
/// With `assume_yes` every proposal is accepted without prompting, which
/// keeps automated runs non-interactive; otherwise the user is asked on the
/// terminal.
pub fn confirmer(assume_yes: bool) -> Box<dyn FnMut(&str) -> bool> {
    if assume_yes {
        Box::new(|prompt: &str| {
            info!("Auto-accepting: {}", prompt);
            true
        })
    } else {
        Box::new(|prompt: &str| {
            let stdin = io::stdin();
            let mut answer = String::new();
            loop {
                eprint!("{prompt} [y/n] ");
                let _ = io::stderr().flush();
                answer.clear();
                if stdin.lock().read_line(&mut answer).is_err() {
                    return false;
                }
                match answer.trim().to_lowercase().as_str() {
                    "y" | "yes" => return true,
                    "n" | "no" => return false,
                    _ => eprintln!("Please answer y or n."),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assume_yes_accepts_everything() {
        let mut confirm = confirmer(true);
        assert!(confirm("Did you mean 'forcefield'?"));
        assert!(confirm("Did you mean 'charmm36.ff'?"));
    }
}
