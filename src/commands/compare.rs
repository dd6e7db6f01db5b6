use crate::annotation::{compare, AnnotationSequence, Label, MatchResult, MatchSummary};
use crate::cli::CompareArgs;
use crate::store::{paired_recordings, read_annotations};
use crate::utils::{AnnError, Result};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use std::{
    io::{self, Write},
    path::Path,
};

pub fn compare_annotations(args: CompareArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = match (args.first_path.is_dir(), args.second_path.is_dir()) {
        (false, false) => {
            let result = compare_files(&args.first_path, &args.second_path, args.label)?;
            log_summary(&result.summary(), args.label);
            write_result(&mut out, &result)
        }
        (true, true) => {
            let rows = compare_dirs(
                &args.first_path,
                &args.second_path,
                args.label,
                args.num_threads,
            )?;
            write_summaries(&mut out, &rows)
        }
        _ => {
            return Err(AnnError::InvalidInput(
                "Compare two files or two directories, not one of each".to_string(),
            ))
        }
    };
    written.map_err(|e| AnnError::io("<stdout>", e))
}

/// Compares the `label` runs of two annotation stores.
///
/// A store without annotations compares as an empty sequence.
pub fn compare_files(first: &Path, second: &Path, label: Label) -> Result<MatchResult> {
    let a = annotations_or_empty(first)?;
    let b = annotations_or_empty(second)?;
    Ok(compare(&a, &b, label))
}

fn annotations_or_empty(path: &Path) -> Result<AnnotationSequence> {
    Ok(read_annotations(path)?.unwrap_or_else(|| {
        log::warn!("{} is not annotated", path.display());
        AnnotationSequence::new()
    }))
}

/// Compares every recording present in both directories.
///
/// A recording that fails to load is logged and left out of the rows.
pub fn compare_dirs(
    first: &Path,
    second: &Path,
    label: Label,
    num_threads: usize,
) -> Result<Vec<(String, MatchSummary)>> {
    let pairs = paired_recordings(first, second)?;
    log::info!("{} recordings annotated in both directories", pairs.len());
    log::debug!("Initializing thread pool with {} threads...", num_threads);
    let pool = initialize_thread_pool(num_threads)?;

    let results: Vec<(String, Result<MatchSummary>)> = pool.install(|| {
        pairs
            .par_iter()
            .map(|(name, a, b)| {
                let summary = compare_files(a, b, label).map(|result| result.summary());
                (name.clone(), summary)
            })
            .collect()
    });

    let mut rows = Vec::with_capacity(results.len());
    for (name, result) in results {
        match result {
            Ok(summary) => rows.push((name, summary)),
            Err(err) => log::error!("Comparing {}: {}", name, err),
        }
    }
    Ok(rows)
}

fn initialize_thread_pool(num_threads: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| AnnError::InvalidInput(format!("Failed to initialize thread pool: {}", e)))
}

fn log_summary(summary: &MatchSummary, label: Label) {
    log::info!(
        "{}: {} matched pairs, {} of {} runs in A matched, {} of {} runs in B matched",
        label,
        summary.pairs,
        summary.matched_a,
        summary.matched_a + summary.unmatched_a,
        summary.matched_b,
        summary.matched_b + summary.unmatched_b
    );
}

fn write_result(out: &mut impl Write, result: &MatchResult) -> io::Result<()> {
    writeln!(out, "kind\ta\tb\toverlap")?;
    for pair in &result.matched {
        writeln!(out, "matched\t{}\t{}\t{}", pair.a, pair.b, pair.overlap())?;
    }
    for range in &result.unmatched_a {
        writeln!(out, "unmatched_a\t{}\t.\t.", range)?;
    }
    for range in &result.unmatched_b {
        writeln!(out, "unmatched_b\t.\t{}\t.", range)?;
    }
    Ok(())
}

fn write_summaries(out: &mut impl Write, rows: &[(String, MatchSummary)]) -> io::Result<()> {
    writeln!(
        out,
        "recording\tpairs\tmatched_a\tunmatched_a\tmatched_b\tunmatched_b"
    )?;
    for (name, summary) in rows {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            name,
            summary.pairs,
            summary.matched_a,
            summary.unmatched_a,
            summary.matched_b,
            summary.unmatched_b
        )?;
    }
    Ok(())
}
