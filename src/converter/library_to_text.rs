use std::fs::File;
use std::io::BufWriter;

use log::{debug, info, warn};

use super::{ConversionContext, ConversionError, ConversionStats, Plan, SpectralLibraryConverter};
use crate::library::LibraryReader;
use crate::modifications::Reconciler;
use crate::msp::MspWriter;

impl SpectralLibraryConverter {
    pub(super) fn library_to_text(
        &self,
        plan: &Plan,
        context: &mut ConversionContext,
    ) -> Result<ConversionStats, ConversionError> {
        let reader = LibraryReader::open(&plan.input)?;
        let total = reader.spectrum_count()?;
        info!("Library holds {} spectra", total);

        if self.config.fasta_dir.is_some() {
            context.prepare_proteins(&self.config, reader.peptide_sequences()?)?;
        }

        let file = File::create(&plan.output).map_err(|source| ConversionError::OutputNotWritable {
            path: plan.output.clone(),
            source,
        })?;
        let mut writer = MspWriter::new(BufWriter::new(file));
        let mut stats = ConversionStats::default();

        for record in reader.spectra() {
            if self.reached_limit(&stats) {
                info!("Reached limit of {} spectra", stats.written);
                break;
            }
            let record = record?;
            stats.seen += 1;
            self.log_progress(&stats, Some(total));

            let id = record.id;
            let mut spectrum = match record.decode() {
                Ok(spectrum) => spectrum,
                Err(e) => {
                    warn!("Skipping spectrum {}: {}", id, e);
                    stats.skipped += 1;
                    continue;
                }
            };
            if spectrum.peak_count() < self.config.min_peaks {
                debug!(
                    "Skipping spectrum {} with {} peaks",
                    id,
                    spectrum.peak_count()
                );
                stats.skipped += 1;
                continue;
            }

            context.annotate_proteins(&mut spectrum, &mut stats);
            let tags = Reconciler::new(&context.db).tags_for(&spectrum, &mut context.tally);
            writer.write_spectrum(&spectrum, &tags)?;
            stats.written += 1;
            stats.peaks_written += spectrum.peak_count();
        }

        writer.finish()?;
        Ok(stats)
    }
}
