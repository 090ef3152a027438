use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::info;

use rs274::config::Config;
use rs274::validation::{validate_program, Severity};
use rs274::{Error, Machine};

fn report_parse_error(error: &Error) {
    eprintln!("error: {}", error);
    if let Error::Line { text, .. } = error {
        if let Some(position) = error.position() {
            eprintln!("  {}", text);
            eprintln!("  {}^", " ".repeat(position));
        }
    }
}

fn run(config: &Config) -> Result<bool> {
    let registry = config.build_registry()?;
    let flavor = registry
        .get_active_flavor()
        .context("no active flavor")?;
    info!("Using flavor '{}'", flavor.name);

    let content = fs::read_to_string(&config.file)
        .with_context(|| format!("failed to read {}", config.file.display()))?;

    let mut machine = Machine::new(flavor);
    let program = match machine.parse_program(&content) {
        Ok(program) => program,
        Err(e) => {
            report_parse_error(&e);
            return Ok(false);
        }
    };

    let validation = validate_program(&program, machine.config());
    for (index, line) in program.iter().enumerate() {
        println!("{}", line);
        for annotation in machine.annotate(line) {
            let mut notes = vec![annotation.meaning().unwrap_or("?").to_string()];
            if let Some(group) = annotation.modal_group {
                notes.push(format!("modal group {}: {}", group.id(), group.meaning()));
            }
            if let Some(group) = annotation.execution_group {
                notes.push(format!("execution order {}", group.index()));
            }
            println!("  {:<8} {}", annotation.word.to_string(), notes.join(", "));
        }
        for diagnostic in validation.diagnostics.iter().filter(|d| d.line == index + 1) {
            let label = match diagnostic.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            println!("  {}: {}", label, diagnostic.message);
        }
    }

    Ok(validation.is_valid())
}

fn main() -> Result<ExitCode> {
    let config = Config::from_args_and_env()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    if run(&config)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
