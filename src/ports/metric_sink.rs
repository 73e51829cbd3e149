use crate::domain::{
    Category, CategoryRows, DetachedPartRow, DiskRow, MetricRow, MutationRow, PartRow, ReplicaRow,
};

/// Port for recording one host's collected rows.
///
/// A sink is scoped to a single resource/host for a single scrape.
pub trait MetricSink: Send + Sync {
    fn write_metrics(&self, rows: &[MetricRow]);

    fn write_parts(&self, rows: &[PartRow]);

    fn write_replicas(&self, rows: &[ReplicaRow]);

    fn write_mutations(&self, rows: &[MutationRow]);

    fn write_disks(&self, rows: &[DiskRow]);

    fn write_detached_parts(&self, rows: &[DetachedPartRow]);

    /// Record that the category was fetched successfully
    fn write_fetch_ok(&self, category: Category);

    /// Record that fetching the category failed
    fn write_fetch_error(&self, category: Category);

    /// Dispatch rows to the matching category writer
    fn write_rows(&self, rows: &CategoryRows) {
        match rows {
            CategoryRows::Metrics(rows) => self.write_metrics(rows),
            CategoryRows::Parts(rows) => self.write_parts(rows),
            CategoryRows::Replicas(rows) => self.write_replicas(rows),
            CategoryRows::Mutations(rows) => self.write_mutations(rows),
            CategoryRows::Disks(rows) => self.write_disks(rows),
            CategoryRows::DetachedParts(rows) => self.write_detached_parts(rows),
        }
    }
}
