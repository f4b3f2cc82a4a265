use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, info, warn};

use super::{ConversionContext, ConversionError, ConversionStats, Plan, SpectralLibraryConverter};
use crate::library::{LibraryError, LibraryWriter, LibraryWriterConfig};
use crate::modifications::Reconciler;
use crate::msp::{EntryName, MspError, MspReader};

fn open_text(path: &Path) -> Result<MspReader<BufReader<File>>, ConversionError> {
    Ok(MspReader::new(BufReader::new(File::open(path)?)))
}

impl SpectralLibraryConverter {
    pub(super) fn text_to_library(
        &self,
        plan: &Plan,
        context: &mut ConversionContext,
    ) -> Result<ConversionStats, ConversionError> {
        if self.config.fasta_dir.is_some() {
            // Peptides must be known before the map can be built
            let mut sequences = Vec::new();
            for entry in open_text(&plan.input)? {
                match entry {
                    Ok(entry) => {
                        if let Ok(name) = EntryName::parse(&entry.name) {
                            sequences.push(name.sequence);
                        }
                    }
                    Err(MspError::IoError(e)) => return Err(e.into()),
                    Err(_) => {}
                }
            }
            context.prepare_proteins(&self.config, sequences)?;
        }

        let reader = open_text(&plan.input)?;
        let config = LibraryWriterConfig {
            commit_interval: self.config.commit_interval,
            library_id: self.library_id(&plan.output),
        };
        let mut writer = LibraryWriter::create(&plan.output, config).map_err(|e| match e {
            LibraryError::IoError(source) => ConversionError::OutputNotWritable {
                path: plan.output.clone(),
                source,
            },
            other => other.into(),
        })?;
        let source_name = plan
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        writer.set_source_file(source_name)?;

        let mut stats = ConversionStats::default();
        for entry in reader {
            if self.reached_limit(&stats) {
                info!("Reached limit of {} spectra", stats.written);
                break;
            }
            let entry = match entry {
                Ok(entry) => entry,
                Err(MspError::IoError(e)) => return Err(e.into()),
                Err(e) => {
                    stats.seen += 1;
                    stats.skipped += 1;
                    warn!("Skipping entry: {}", e);
                    continue;
                }
            };
            stats.seen += 1;
            self.log_progress(&stats, None);

            let line = entry.line;
            let reconciler = Reconciler::new(&context.db);
            let mut spectrum = match entry.into_spectrum(&reconciler) {
                Ok(spectrum) => spectrum,
                Err(e) => {
                    warn!("Skipping entry at line {}: {}", line, e);
                    stats.skipped += 1;
                    continue;
                }
            };
            if spectrum.peak_count() < self.config.min_peaks {
                debug!(
                    "Skipping {} at line {} with {} peaks",
                    spectrum.sequence,
                    line,
                    spectrum.peak_count()
                );
                stats.skipped += 1;
                continue;
            }

            context.annotate_proteins(&mut spectrum, &mut stats);
            // Names resolved here only feed the tally
            let _ = reconciler.tags_for(&spectrum, &mut context.tally);
            writer.write(&spectrum)?;
            stats.written += 1;
            stats.peaks_written += spectrum.peak_count();
        }

        let library_stats = writer.finish()?;
        debug!("{}", library_stats);
        Ok(stats)
    }
}
