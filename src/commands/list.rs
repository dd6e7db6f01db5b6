use crate::cli::ListArgs;
use crate::store::{list_recordings, RecordingEntry};
use crate::utils::{AnnError, Result};
use std::io::{self, Write};

pub fn list(args: ListArgs) -> Result<()> {
    let recordings = list_recordings(&args.input_dir, &args.output_dir)?;
    let annotated = recordings.iter().filter(|r| r.annotated).count();
    let stdout = io::stdout();
    write_listing(&mut stdout.lock(), &recordings)
        .map_err(|e| AnnError::io("<stdout>", e))?;
    log::info!(
        "{} recordings, {} annotated, {} remaining",
        recordings.len(),
        annotated,
        recordings.len() - annotated
    );
    Ok(())
}

fn write_listing(out: &mut impl Write, recordings: &[RecordingEntry]) -> io::Result<()> {
    writeln!(out, "name\tpath\textension\tsize_mib\tannotated")?;
    for recording in recordings {
        writeln!(
            out,
            "{}\t{}\t{}\t{:.2}\t{}",
            recording.name,
            recording.path.display(),
            recording.extension,
            recording.size_mib,
            if recording.annotated { "Yes" } else { "No" }
        )?;
    }
    Ok(())
}
