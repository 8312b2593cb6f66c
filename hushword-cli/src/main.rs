mod args;
mod progress;
mod settings;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, bail, Context};
use hushword_core::transcript::{flatten_transcript_file, flattened_path};
use hushword_core::{
    BatchOrchestrator, CurseLexicon, RedactConfig, RedactJob, Redactor, SegmentCombiner,
};
use tracing::{info, warn};

use crate::args::{parse_args, Command, CommonArgs, USAGE};
use crate::progress::log_progress;
use crate::settings::load_runtime_config;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("hushword=info,hushword_core=info")
                }),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("hushword failed: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let command = parse_args(std::env::args().skip(1)).map_err(|e| anyhow!("{e}\n\n{USAGE}"))?;

    match command {
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Command::Redact {
            audio,
            transcript,
            common,
        } => {
            let (config, lexicon) = prepare(&common)?;
            let redactor = Redactor::new(config, lexicon);
            let mut job = RedactJob::new(transcript, audio);
            if let Some(dir) = common.output_dir {
                job = job.with_output_dir(dir);
            }
            let segment = redactor.process_file(&job)?;
            println!("{}", segment.output.display());
            Ok(())
        }
        Command::Batch {
            pairs,
            common,
            combine,
        } => run_batch(pairs, &common, combine),
        Command::Combine {
            segments,
            config,
            validate,
        } => {
            let mut config = load_runtime_config(config.as_deref())?;
            if let Some(validate) = validate {
                config.validate_segment_formats = validate;
            }
            print_combined(&config, &segments)
        }
        Command::Flatten { transcript } => {
            let output = flattened_path(&transcript);
            let flat = flatten_transcript_file(&transcript, &output)?;
            info!(words = flat.len(), "transcript flattened");
            println!("{}", output.display());
            Ok(())
        }
    }
}

fn prepare(common: &CommonArgs) -> anyhow::Result<(RedactConfig, Arc<CurseLexicon>)> {
    let config = load_runtime_config(common.config.as_deref())?;
    let lexicon = CurseLexicon::load(&common.lexicon)
        .with_context(|| format!("loading lexicon {}", common.lexicon.display()))?;
    Ok((config, Arc::new(lexicon)))
}

fn run_batch(pairs: Vec<(PathBuf, PathBuf)>, common: &CommonArgs, combine: bool) -> anyhow::Result<()> {
    let (config, lexicon) = prepare(common)?;
    let orchestrator = BatchOrchestrator::from_config(&config);
    let redactor = Redactor::new(config.clone(), lexicon);

    let jobs: Vec<RedactJob> = pairs
        .into_iter()
        .map(|(transcript, audio)| {
            let job = RedactJob::new(transcript, audio);
            match &common.output_dir {
                Some(dir) => job.with_output_dir(dir),
                None => job,
            }
        })
        .collect();
    ensure_distinct_outputs(&jobs)?;

    let progress = {
        let rx = orchestrator.subscribe();
        thread::spawn(move || log_progress(rx))
    };
    let reports = orchestrator.run_redactions(&redactor, jobs);
    drop(orchestrator);
    let _ = progress.join();

    let mut outputs = Vec::with_capacity(reports.len());
    let mut failed = 0usize;
    for report in reports {
        match report.result {
            Ok(segment) => {
                println!("{}", segment.output.display());
                outputs.push(segment.output);
            }
            Err(e) => {
                failed += 1;
                eprintln!("job {} failed: {e}", report.index);
            }
        }
    }

    if failed > 0 {
        if combine {
            warn!(failed, "not combining a partial batch");
        }
        bail!("{failed} of {} jobs failed", failed + outputs.len());
    }
    if combine {
        print_combined(&config, &outputs)?;
    }
    Ok(())
}

/// Reject batches where two jobs would write the same clean file.
fn ensure_distinct_outputs(jobs: &[RedactJob]) -> anyhow::Result<()> {
    let mut seen: HashMap<PathBuf, usize> = HashMap::with_capacity(jobs.len());
    for (index, job) in jobs.iter().enumerate() {
        if let Some(first) = seen.insert(job.output_path(), index) {
            bail!(
                "jobs {first} and {index} both write {}",
                job.output_path().display()
            );
        }
    }
    Ok(())
}

fn print_combined(config: &RedactConfig, segments: &[PathBuf]) -> anyhow::Result<()> {
    let combined = SegmentCombiner::from_config(config).combine(segments)?;
    println!("{}", combined.path.display());
    if let Some(copy) = combined.download_copy {
        println!("{}", copy.display());
    }
    Ok(())
}
