use crate::cli::config::GeneratorConfig;
use crate::form::form_model::FieldSet;
use crate::form::ingest::parse_field_set;
use crate::generator::backend::{ChatCompletionsBackend, CompletionBackend, MockBackend};
use crate::reconcile::error::FormError;
use crate::reconcile::round::RoundReport;
use crate::{run_chat, write_warnings};
use crate::session::session::FormSession;
use crate::trace::logger::TraceLogger;

// ============================================================================
// chat subcommand
// ============================================================================

pub fn cmd_chat(
    generator: &GeneratorConfig,
    backend_name: &str,
    trace_path: Option<&str>,
    replay: Option<&str>,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let backend = build_backend(backend_name, generator, replay)?;
    let tracer = TraceLogger::new(trace_path);

    if verbose > 0 {
        eprintln!(
            "Using {} backend (model={}, endpoint={})",
            backend_name, generator.model, generator.endpoint
        );
        if tracer.is_enabled() {
            eprintln!("Tracing rounds to {}", trace_path.unwrap_or_default());
        }
    }

    let mut session = FormSession::new();
    let stdin = std::io::stdin();
    run_chat(
        backend.as_ref(),
        &mut session,
        stdin.lock(),
        std::io::stdout(),
        &tracer,
        verbose,
    )?;

    if verbose > 0 {
        eprintln!("Session ended after {} rounds", session.rounds());
    }
    Ok(())
}

// ============================================================================
// reconcile subcommand
// ============================================================================

/// Reconcile `input` against `previous` and write the result.
/// Returns the round report so the caller can decide the exit code.
pub fn cmd_reconcile(
    input: &str,
    previous: Option<&str>,
    output: Option<&str>,
    verbose: u8,
) -> Result<RoundReport, Box<dyn std::error::Error>> {
    let mut session = FormSession::new();

    if let Some(path) = previous {
        let prior = load_form(path)?;
        if verbose > 0 {
            eprintln!("Seeded {} ids from {}", prior.len(), path);
        }
        session.seed(prior);
    }

    let candidate = load_form(input)?;
    let report = session.apply(candidate)?;
    let form = session
        .current()
        .ok_or("session has no form after a successful round")?;

    let rendered = form.to_pretty_json()?;
    match output {
        Some(path) => std::fs::write(path, format!("{}\n", rendered)).map_err(|e| FormError::Io {
            path: path.to_string(),
            source: e,
        })?,
        None => println!("{}", rendered),
    }

    write_warnings(std::io::stderr(), &report, form)?;
    if verbose > 0 {
        for (old, new) in report.mapping.iter().filter(|(o, n)| o != n) {
            eprintln!("  {} -> {}", old, new);
        }
    }

    Ok(report)
}

/// Read and ingest a form JSON file.
pub fn load_form(path: &str) -> Result<FieldSet, FormError> {
    let content = std::fs::read_to_string(path).map_err(|e| FormError::Io {
        path: path.to_string(),
        source: e,
    })?;
    parse_field_set(&content, path)
}

// ============================================================================
// Helpers
// ============================================================================

/// One canned completion per non-empty line.
pub fn load_replay(path: &str) -> Result<Vec<String>, FormError> {
    let content = std::fs::read_to_string(path).map_err(|e| FormError::Io {
        path: path.to_string(),
        source: e,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Build the completion backend by name.
pub fn build_backend(
    name: &str,
    generator: &GeneratorConfig,
    replay: Option<&str>,
) -> Result<Box<dyn CompletionBackend>, FormError> {
    match name {
        "mock" => {
            let responses = match replay {
                Some(path) => load_replay(path)?,
                None => Vec::new(),
            };
            Ok(Box::new(MockBackend::new(responses)))
        }
        _ => {
            let backend = ChatCompletionsBackend::from_env(
                &generator.endpoint,
                &generator.model,
                &generator.api_key_env,
            )?
            .with_sampling(generator.temperature, generator.top_p);
            Ok(Box::new(backend))
        }
    }
}
