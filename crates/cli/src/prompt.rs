//! Interactive stdin prompts: unresolved check-ins and write retries.

use std::io::{self, BufRead, Write};
use std::path::Path;

use rollcall_recon::canonical_key;
use rollcall_recon::model::Resolution;

/// Resolver that asks the operator on stderr and reads answers from stdin.
///
/// Answer contract: `i` ignores the key for the rest of the run, `q` (or
/// closed stdin) aborts, an empty line re-asks, anything else is taken as
/// the corrected identifier and normalized before use.
pub fn stdin_resolver() -> impl FnMut(&str) -> Resolution {
    |key: &str| loop {
        eprint!("'{key}' is not on the roster. corrected identifier (i = ignore, q = abort): ");
        io::stderr().flush().ok();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => return Resolution::Abort,
            Ok(_) => {}
        }
        return match line.trim() {
            "" => continue,
            "q" => Resolution::Abort,
            "i" => Resolution::Ignore,
            answer => Resolution::Corrected(canonical_key(answer)),
        };
    }
}

/// After a failed report write: ask whether to try the same path again.
pub fn confirm_retry(path: &Path, err: &str) -> bool {
    eprintln!("error: {err}");
    eprint!(
        "close {} if it is open, then press Enter to retry (q = give up): ",
        path.display()
    );
    io::stderr().flush().ok();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => false,
        Ok(_) => line.trim() != "q",
    }
}
