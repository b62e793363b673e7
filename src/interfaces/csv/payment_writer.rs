use crate::domain::ids::PaymentId;
use crate::domain::payment::PaymentStatus;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// One payment header as the replay binary reports it.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentSummary {
    pub payment: PaymentId,
    pub student: String,
    pub total: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub status: PaymentStatus,
}

/// Writes final payment headers as CSV, headers included.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(target),
        }
    }

    pub fn write_summaries(&mut self, summaries: Vec<PaymentSummary>) -> Result<()> {
        for summary in summaries {
            self.writer.serialize(summary)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_writer_output_shape() {
        let mut buffer = Vec::new();
        let mut writer = PaymentWriter::new(&mut buffer);
        writer
            .write_summaries(vec![PaymentSummary {
                payment: PaymentId::new(),
                student: "Ada".into(),
                total: dec!(1000000),
                paid: dec!(400000),
                remaining: dec!(600000),
                status: PaymentStatus::Partial,
            }])
            .unwrap();
        drop(writer);

        let output = String::from_utf8(buffer).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "payment,student,total,paid,remaining,status"
        );
        assert!(
            lines
                .next()
                .unwrap()
                .ends_with("Ada,1000000,400000,600000,partial")
        );
    }
}
