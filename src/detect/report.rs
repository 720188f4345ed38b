//! Turning raw detections into the rows shown to the user.

use super::{Detection, LabelTable};
use crate::consts::format_percent;

/// One displayed detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRow {
    /// 1-based position in detector order.
    pub index: usize,
    pub class: String,
    /// Percentage with two decimals, e.g. `"87.34%"`.
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionReport {
    NoDetections,
    Rows(Vec<DetectionRow>),
}

impl DetectionReport {
    pub fn rows(&self) -> &[DetectionRow] {
        match self {
            DetectionReport::NoDetections => &[],
            DetectionReport::Rows(rows) => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    /// Render as an aligned text table with a header row.
    pub fn to_table(&self) -> String {
        const HEADERS: [&str; 3] = ["Detection #", "Class", "Confidence"];

        let rows = self.rows();
        let cells: Vec<[String; 3]> = rows
            .iter()
            .map(|r| [r.index.to_string(), r.class.clone(), r.confidence.clone()])
            .collect();

        let widths: Vec<usize> = (0..3)
            .map(|col| {
                cells
                    .iter()
                    .map(|c| c[col].chars().count())
                    .chain(std::iter::once(HEADERS[col].len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cols: [&str; 3]| {
            format!(
                "  {:<w0$}  {:<w1$}  {:>w2$}\n",
                cols[0],
                cols[1],
                cols[2],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
            )
        };

        let mut out = line(HEADERS);
        out.push_str(&format!(
            "  {}  {}  {}\n",
            "-".repeat(widths[0]),
            "-".repeat(widths[1]),
            "-".repeat(widths[2])
        ));
        for c in &cells {
            out.push_str(&line([&c[0], &c[1], &c[2]]));
        }
        out
    }
}

/// Build the display rows for `detections`, resolving class ids through `labels`.
pub fn format_detections(detections: &[Detection], labels: &LabelTable) -> DetectionReport {
    if detections.is_empty() {
        return DetectionReport::NoDetections;
    }
    let rows = detections
        .iter()
        .enumerate()
        .map(|(i, d)| DetectionRow {
            index: i + 1,
            class: labels.resolve(d.class_id),
            confidence: format_percent(d.confidence),
        })
        .collect();
    DetectionReport::Rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn detection(class_id: usize, confidence: f32) -> Detection {
        Detection {
            class_id,
            confidence,
            bbox: BoundingBox {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 1.0,
            },
        }
    }

    fn labels() -> LabelTable {
        LabelTable::new(vec![
            "upright".to_string(),
            "leaning".to_string(),
            "slouching".to_string(),
        ])
    }

    #[test]
    fn no_boxes_is_no_detections() {
        let report = format_detections(&[], &labels());
        assert_eq!(report, DetectionReport::NoDetections);
        assert!(report.is_empty());
    }

    #[test]
    fn single_slouching_row() {
        let report = format_detections(&[detection(2, 0.5021)], &labels());
        assert_eq!(
            report.rows(),
            &[DetectionRow {
                index: 1,
                class: "slouching".to_string(),
                confidence: "50.21%".to_string(),
            }]
        );
    }

    #[test]
    fn n_boxes_give_n_one_indexed_rows() {
        let detections = vec![
            detection(0, 0.8734),
            detection(1, 0.61),
            detection(2, 0.3),
        ];
        let report = format_detections(&detections, &labels());
        let rows = report.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(rows[0].confidence, "87.34%");
        assert_eq!(rows[1].confidence, "61.00%");
        assert_eq!(rows[2].class, "slouching");
    }

    #[test]
    fn unresolvable_class_falls_back_to_id() {
        let report = format_detections(&[detection(5, 0.9)], &LabelTable::unavailable());
        assert_eq!(report.rows()[0].class, "class 5");
    }

    #[test]
    fn table_is_aligned() {
        let report = format_detections(&[detection(2, 0.5021), detection(0, 0.9)], &labels());
        let table = report.to_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Detection #"));
        assert!(lines[0].contains("Confidence"));
        assert!(lines[2].contains("slouching"));
        assert!(lines[2].ends_with("50.21%"));
        assert_eq!(lines[2].len(), lines[3].len());
    }
}
