//! Code lab command handlers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use jtutor_core::catalog;
use jtutor_core::core::orchestrator::is_compilation_error;
use jtutor_core::core::share;

use crate::cli::output::Printer;
use crate::cli::{SourceArgs, Tutor};

/// Page a share link points at when `--base` is not given.
pub const DEFAULT_SHARE_BASE: &str = "http://localhost:5173/";

/// Example used when no source flag is given.
const DEFAULT_EXAMPLE: &str = "hello";

pub fn examples() {
    let printer = Printer::stdout();
    for example in catalog::EXAMPLES {
        println!(
            "{:<14} {}  {}",
            example.id,
            example.title,
            printer.dim(example.description)
        );
    }
}

pub async fn run(tutor: &Tutor, source: &SourceArgs) -> Result<()> {
    let code = load_source(source)?;
    let output = tutor.orchestrator().simulate_execution(&code).await;

    let printer = Printer::stdout();
    let compile_error = is_compilation_error(&output);
    let shown = if compile_error {
        printer.error(&output)
    } else {
        output.clone()
    };
    let mut stdout = io::stdout();
    write!(stdout, "{shown}")?;
    if !output.ends_with('\n') {
        writeln!(stdout)?;
    }
    stdout.flush()?;

    if compile_error {
        bail!("Program does not compile");
    }
    Ok(())
}

pub async fn analyze(tutor: &Tutor, source: &SourceArgs) -> Result<()> {
    let code = load_source(source)?;
    let analysis = tutor.orchestrator().analyze(&code).await;
    Printer::stdout().write_text(&mut io::stdout(), &analysis)?;
    Ok(())
}

pub async fn visualize(tutor: &Tutor, source: &SourceArgs, out: Option<&Path>) -> Result<()> {
    let code = load_source(source)?;
    let Some(svg) = tutor.orchestrator().visualize(&code).await else {
        bail!("Could not generate a visualization for this program");
    };

    match out {
        Some(path) => {
            fs::write(path, &svg)
                .with_context(|| format!("write visualization to {}", path.display()))?;
            println!("Wrote visualization to {}", path.display());
        }
        None => println!("{svg}"),
    }
    Ok(())
}

pub fn share(source: &SourceArgs, base: &str) -> Result<()> {
    let code = load_source(source)?;
    let link = share::share_url(base, &code)?;
    println!("{link}");
    Ok(())
}

fn load_source(source: &SourceArgs) -> Result<String> {
    if let Some(path) = &source.file {
        return fs::read_to_string(path)
            .with_context(|| format!("read program from {}", path.display()));
    }
    if let Some(link) = &source.url {
        let shared = share::take_shared_code(link)?;
        return shared
            .code
            .ok_or_else(|| anyhow!("Link carries no readable program: {link}"));
    }

    let id = source.example.as_deref().unwrap_or(DEFAULT_EXAMPLE);
    catalog::find_example(id)
        .map(|example| example.code.to_string())
        .ok_or_else(|| anyhow!("Unknown example '{id}'. Run `jtutor lab examples` to list them."))
}
