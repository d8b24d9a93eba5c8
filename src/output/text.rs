//! Plain-text report for terminals.
//!
//! # Example
//!
//! ```
//! use fidedu::actions::DedupReport;
//! use fidedu::output::TextReport;
//!
//! let report = DedupReport::default();
//! assert_eq!(TextReport::new(&report).render(), "No duplicate files found.\n");
//! ```

use std::fmt::Write as _;
use std::io::Write;

use bytesize::ByteSize;

use crate::actions::DedupReport;

/// Renders a [`DedupReport`] as the human-readable summary.
#[derive(Debug, Clone, Copy)]
pub struct TextReport<'a> {
    report: &'a DedupReport,
}

impl<'a> TextReport<'a> {
    /// Wrap a report for rendering.
    #[must_use]
    pub fn new(report: &'a DedupReport) -> Self {
        Self { report }
    }

    /// Render the full report, one trailing newline included.
    #[must_use]
    pub fn render(&self) -> String {
        let r = self.report;
        let mut out = String::new();

        if r.is_empty() {
            out.push_str("No duplicate files found.\n");
            return out;
        }

        // Writing to a String cannot fail.
        let _ = writeln!(out, "Duplicate sets found: {}", r.duplicate_set_count);
        let _ = writeln!(out, "Files involved:       {}", r.files_involved);
        let _ = writeln!(out, "Planned relinks:      {}", r.relinks_planned);
        let _ = writeln!(
            out,
            "Estimated savings:    {} ({} bytes)",
            ByteSize::b(r.bytes_reclaimable),
            r.bytes_reclaimable
        );

        if !r.partitions.is_empty() {
            out.push_str("\nDetails per duplicate set:\n");
            for p in &r.partitions {
                let _ = writeln!(
                    out,
                    "  digest={}... dev={} size={} bytes count={}",
                    p.fingerprint,
                    p.device_id,
                    p.size,
                    p.paths.len()
                );
                for path in &p.paths {
                    let _ = writeln!(out, "    - {}", path.display());
                }
            }
        }

        if r.dry_run {
            out.push_str("\n[dry-run] Use --compress to apply these changes.\n");
            return out;
        }

        out.push_str("\n[execute] Relinking duplicates to canonical originals...\n");
        for failure in &r.failures {
            let _ = writeln!(out, "  [skip] {}: {}", failure.path.display(), failure.error);
        }
        for path in &r.data_loss {
            let _ = writeln!(out, "  [lost] {}", path.display());
        }
        if r.interrupted {
            let _ = writeln!(
                out,
                "[interrupted] Relinked {} of {} planned file(s).",
                r.relinks_performed, r.relinks_planned
            );
        } else {
            let _ = writeln!(
                out,
                "[done] Hardlinking complete. Relinked {} file(s).",
                r.relinks_performed
            );
        }
        out
    }

    /// Write the rendered report to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }
}
