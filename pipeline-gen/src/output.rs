// Terminal output for pipeline-gen
// Status lines go to stderr so rendered YAML can be piped from stdout

use std::path::Path;

use pipeline_builder::{Pipeline, ValidationError};

const BOLD: &str = "\x1b[1m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Right-aligned action followed by a message, e.g. "   Rendering 3 pipelines"
pub fn status(action: &str, message: &str) {
    eprintln!("{BOLD}{CYAN}{:>12}{RESET} {}", action, message);
}

pub fn header(message: &str) {
    eprintln!("{BOLD}==> {}{RESET}", message);
}

pub fn success(message: &str) {
    eprintln!("{BOLD}{GREEN}  \u{2713}{RESET} {}", message);
}

pub fn check(message: &str) {
    eprintln!("{GREEN}  \u{2713}{RESET} {}", message);
}

pub fn error(message: &str) {
    eprintln!("{BOLD}{RED}error:{RESET} {}", message);
}

/// One line per written document with its size
pub fn written(path: &Path, bytes: usize) {
    eprintln!("{GREEN}  \u{2713}{RESET} wrote {} ({} bytes)", path.display(), bytes);
}

/// Stage and job counts of a pipeline about to be rendered or checked
pub fn pipeline_summary(pipeline: &Pipeline) {
    eprintln!(
        "{CYAN}  i{RESET} {}: {} stages, {} jobs (trigger stage '{}')",
        pipeline.name(),
        pipeline.stages().len(),
        pipeline.job_count(),
        pipeline.trigger_stage()
    );
}

/// A validation problem with its location and, when known, a hint
pub fn validation_error(error: &ValidationError) {
    eprintln!("{RED}  \u{2717}{RESET} [{}] {}", error.path, error.message);
    if let Some(suggestion) = &error.suggestion {
        eprintln!("{YELLOW}      {}{RESET}", suggestion);
    }
}
