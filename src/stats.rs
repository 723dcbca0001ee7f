use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_writer::ArrowWriter;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::sync::Arc;

use crate::types::{OrderId, Time};

/// One solved order, as appended by `TourSolver::solve`.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveRecord {
    pub order: OrderId,
    pub classes: usize,
    pub candidates: usize,
    pub reservations: usize,
    pub tour_length: Time,
    /// Wall-clock solve time in seconds.
    pub time: f64,
}

/// Per-solve measurements, owned by whoever drives the planning loop and
/// handed to each solve by reference. Display aggregates by class count.
#[derive(Debug, Default)]
pub struct SolveStats {
    records: Vec<SolveRecord>,
}

impl SolveStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: SolveRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[SolveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn serialize_to_parquet(&self, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
        let orders: Int64Array = self.records.iter().map(|r| r.order as i64).collect();
        let classes: Int64Array = self.records.iter().map(|r| r.classes as i64).collect();
        let candidates: Int64Array = self.records.iter().map(|r| r.candidates as i64).collect();
        let reservations: Int64Array = self.records.iter().map(|r| r.reservations as i64).collect();
        let tour_lengths: Int64Array = self.records.iter().map(|r| r.tour_length as i64).collect();
        let times: Float64Array = self.records.iter().map(|r| r.time).collect();

        // Arrow schema
        let schema = Schema::new(vec![
            Field::new("order", DataType::Int64, false),
            Field::new("classes", DataType::Int64, false),
            Field::new("candidates", DataType::Int64, false),
            Field::new("reservations", DataType::Int64, false),
            Field::new("tour_length", DataType::Int64, false),
            Field::new("time", DataType::Float64, false),
        ]);

        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(orders),
                Arc::new(classes),
                Arc::new(candidates),
                Arc::new(reservations),
                Arc::new(tour_lengths),
                Arc::new(times),
            ],
        )?;

        let file = File::create(filename)?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }
}

#[derive(Default)]
struct ClassGroup {
    tours: usize,
    candidates: usize,
    reservations: usize,
    length: i64,
    seconds: f64,
}

impl fmt::Display for SolveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut groups: BTreeMap<usize, ClassGroup> = BTreeMap::new();
        for record in &self.records {
            let group = groups.entry(record.classes).or_default();
            group.tours += 1;
            group.candidates += record.candidates;
            group.reservations += record.reservations;
            group.length += record.tour_length as i64;
            group.seconds += record.time;
        }

        writeln!(f, "tour solver statistics:")?;
        for (classes, group) in &groups {
            let n = group.tours as f64;
            writeln!(f, "  item classes: {}", classes)?;
            writeln!(f, "    tours found:         {}", group.tours)?;
            writeln!(
                f,
                "    avg pick locations:  {}",
                group.candidates / group.tours
            )?;
            writeln!(f, "    avg tour length:     {}", group.length / group.tours as i64)?;
            writeln!(
                f,
                "    avg reservations:    {}",
                group.reservations / group.tours
            )?;
            writeln!(f, "    avg solve time (ms): {:.3}", group.seconds * 1e3 / n)?;
        }
        Ok(())
    }
}
