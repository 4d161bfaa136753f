use crate::error::{Error, Result};
use crate::observability::metrics::NEGATIVE_LATE_RECORDS;
use crate::types::{OperatorRecord, PerformanceMetrics, RawPerformanceRecord};

/// Parse one textual counter. Only plain ASCII digits are accepted: no sign,
/// no surrounding whitespace, and the value may not exceed `i64::MAX` so the
/// signed late adjustment can never overflow.
pub fn parse_count(field: &'static str, raw: &str) -> Result<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::parse(field, raw));
    }
    raw.parse::<i64>()
        .map(|value| value as u64)
        .map_err(|_| Error::parse(field, raw))
}

/// Convert a raw feed record into validated metrics.
///
/// The first invalid field rejects the whole record. `late` is reported net of
/// cancelled/very late trains and is not clamped: a negative value is logged
/// as a data-quality problem and passed through.
pub fn parse(raw: &RawPerformanceRecord) -> Result<PerformanceMetrics> {
    let on_time = parse_count("on_time", &raw.on_time)?;
    let cancelled_or_very_late = parse_count("cancelled_or_very_late", &raw.cancelled_or_very_late)?;
    let late = parse_count("late", &raw.late)?;
    let total = parse_count("total", &raw.total)?;

    let adjusted_late = late as i64 - cancelled_or_very_late as i64;
    if adjusted_late < 0 {
        NEGATIVE_LATE_RECORDS.inc();
        tracing::warn!(
            record = raw.label(),
            late,
            cancelled_or_very_late,
            "Cancelled count exceeds late count, adjusted late is negative"
        );
    }

    Ok(PerformanceMetrics::new(on_time, cancelled_or_very_late, adjusted_late, total))
}

/// League table variant: the validated counters plus the integer PPM figure.
pub fn parse_operator_record(raw: &RawPerformanceRecord) -> Result<OperatorRecord> {
    let metrics = parse(raw)?;
    let ppm = raw.ppm.as_deref().unwrap_or_default();
    let percentage = parse_count("ppm", ppm)? as i64;

    Ok(OperatorRecord {
        name: raw.label().to_string(),
        total: metrics.total,
        on_time: metrics.on_time,
        late: metrics.late,
        cancelled_or_very_late: metrics.cancelled_or_very_late,
        percentage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_national_summary() {
        let metrics = parse(&RawPerformanceRecord::new("80", "20", "10", "100")).unwrap();

        assert_eq!(metrics.on_time, 80);
        assert_eq!(metrics.cancelled_or_very_late, 10);
        assert_eq!(metrics.late, 10);
        assert_eq!(metrics.total, 100);
        assert_eq!(metrics.on_time_percentage.to_f64(), 80.0);
        assert_eq!(metrics.late_percentage.to_f64(), 10.0);
        assert_eq!(metrics.cancelled_or_very_late_percentage.to_f64(), 10.0);
    }

    #[test]
    fn first_invalid_field_is_reported() {
        let err = parse(&RawPerformanceRecord::new("invalid", "x", "10", "100")).unwrap_err();
        match err {
            Error::Parse { field, raw_value } => {
                assert_eq!(field, "on_time");
                assert_eq!(raw_value, "invalid");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = parse(&RawPerformanceRecord::new("1", "2", "3", "")).unwrap_err();
        assert!(matches!(err, Error::Parse { field: "total", .. }));
    }

    #[test]
    fn rejects_signs_whitespace_and_overflow() {
        for bad in ["-1", "+1", " 1", "1 ", "1.0", "99999999999999999999999"] {
            let raw = RawPerformanceRecord::new(bad, "0", "0", "1");
            assert!(parse(&raw).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn counters_above_i64_max_are_rejected() {
        let err = parse(&RawPerformanceRecord::new("0", "9223372036854775808", "1", "1")).unwrap_err();
        assert!(matches!(err, Error::Parse { field: "late", .. }));

        let err = parse(&RawPerformanceRecord::new("0", "18446744073709551615", "0", "1")).unwrap_err();
        assert!(matches!(err, Error::Parse { field: "late", .. }));

        let metrics = parse(&RawPerformanceRecord::new("0", "9223372036854775807", "0", "1")).unwrap();
        assert_eq!(metrics.late, i64::MAX);
    }

    #[test]
    fn zero_total_has_zero_percentages() {
        let metrics = parse(&RawPerformanceRecord::new("0", "0", "0", "0")).unwrap();
        assert_eq!(metrics, PerformanceMetrics::default());
    }

    #[test]
    fn negative_adjusted_late_is_not_clamped() {
        let metrics = parse(&RawPerformanceRecord::new("90", "2", "5", "100")).unwrap();
        assert_eq!(metrics.late, -3);
        assert_eq!(metrics.late_percentage.to_f64(), -3.0);
    }

    #[test]
    fn operator_record_requires_ppm() {
        let raw = RawPerformanceRecord::new("30", "10", "2", "40").with_operator("61", "Northern");
        assert!(matches!(
            parse_operator_record(&raw),
            Err(Error::Parse { field: "ppm", .. })
        ));

        let record = parse_operator_record(&raw.with_ppm("75")).unwrap();
        assert_eq!(
            record,
            OperatorRecord {
                name: "Northern".to_string(),
                total: 40,
                on_time: 30,
                late: 8,
                cancelled_or_very_late: 2,
                percentage: 75,
            }
        );
    }

    proptest! {
        #[test]
        fn valid_counters_always_parse(
            on_time in 0u32..100_000,
            late in 0u32..100_000,
            cancelled in 0u32..100_000,
            total in 0u32..100_000,
        ) {
            let raw = RawPerformanceRecord::new(
                &on_time.to_string(),
                &late.to_string(),
                &cancelled.to_string(),
                &total.to_string(),
            );
            let metrics = parse(&raw).unwrap();
            prop_assert_eq!(metrics.late, late as i64 - cancelled as i64);
            prop_assert_eq!(metrics.total, total as u64);
            if total == 0 {
                prop_assert_eq!(metrics.on_time_percentage.to_f64(), 0.0);
            }
        }

        #[test]
        fn non_numeric_field_always_fails(garbage in "[a-zA-Z ._-]{1,8}", slot in 0usize..4) {
            let mut fields = ["1".to_string(), "1".to_string(), "1".to_string(), "4".to_string()];
            fields[slot] = garbage;
            let raw = RawPerformanceRecord::new(&fields[0], &fields[1], &fields[2], &fields[3]);
            prop_assert!(parse(&raw).is_err());
        }
    }
}
