use std::io::{self, BufRead, Write};

use crate::{
    generator::{
        backend::CompletionBackend,
        parse::parse_generated,
        prompt::{SYSTEM_PROMPT, build_user_message},
    },
    form::form_model::FieldSet,
    reconcile::{error::FormError, round::RoundReport},
    session::session::FormSession,
    trace::{logger::TraceLogger, trace::RoundTraceEvent},
};

pub mod cli;
pub mod form;
pub mod generator;
pub mod reconcile;
pub mod session;
pub mod trace;

const EXIT_WORD: &str = "exit";

/// One edit request end to end: prompt, completion, parse, reconcile.
///
/// Any failure leaves `session` as it was so the request can be retried.
pub fn generate_round(
    backend: &dyn CompletionBackend,
    session: &mut FormSession,
    request: &str,
) -> Result<RoundReport, FormError> {
    let user = build_user_message(request, session.current())?;
    let completion = backend.complete(SYSTEM_PROMPT, &user)?;
    let candidate = parse_generated(&completion)?;
    session.apply(candidate)
}

/// Interactive loop: one request per line until `exit` or end of input.
pub fn run_chat<R: BufRead, W: Write>(
    backend: &dyn CompletionBackend,
    session: &mut FormSession,
    input: R,
    mut out: W,
    tracer: &TraceLogger,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(out, "Enter your form request (or type '{}'):", EXIT_WORD)?;

    for line in input.lines() {
        let line = line?;
        let request = line.trim();

        if request.eq_ignore_ascii_case(EXIT_WORD) {
            break;
        }
        if request.is_empty() {
            continue;
        }

        let round = session.rounds() + 1;
        if verbose > 0 {
            eprintln!("Round {}: sending request ({} chars)", round, request.len());
        }

        let event = RoundTraceEvent::now(round, request);

        match generate_round(backend, session, request) {
            Ok(report) => {
                let form = session
                    .current()
                    .ok_or("session has no form after a successful round")?;

                writeln!(out, "{}", form.to_pretty_json()?)?;
                write_warnings(&mut out, &report, form)?;
                if verbose > 0 {
                    eprintln!(
                        "Round {}: {} fields, {} new, {} carried over",
                        round,
                        form.len(),
                        report.minted.len(),
                        report.carried.len()
                    );
                }
                writeln!(
                    out,
                    "\nSaved the latest form. Enter more edits or type '{}'.",
                    EXIT_WORD
                )?;

                tracer.log(&event.with_report(&report).with_form(form));
            }
            Err(e) => {
                writeln!(out, "Request failed: {}", e)?;
                if !e.is_fatal_to_round() && verbose > 0 {
                    eprintln!("Round {}: generator or I/O failure, form unchanged", round);
                }
                tracer.log(&event.with_error(&e));
            }
        }
    }

    Ok(())
}

/// Print the round's non-fatal findings, one line each.
pub fn write_warnings<W: Write>(mut out: W, report: &RoundReport, form: &FieldSet) -> io::Result<()> {
    if !report.has_warnings() {
        return Ok(());
    }

    for d in &report.dangling {
        writeln!(
            out,
            "Warning: field {} {} references unknown field {}",
            d.field, d.attachment, d.target
        )?;
    }
    for id in &report.stray_options {
        let kind = form.get(id).map_or("text", |f| f.field_type());
        writeln!(
            out,
            "Warning: field {} has options but its type '{}' offers no choices",
            id, kind
        )?;
    }
    Ok(())
}
