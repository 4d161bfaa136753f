use serde::{Deserialize, Serialize};

/// Counters exactly as they arrive on the feed, still textual.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPerformanceRecord {
    pub on_time: String,
    pub late: String,
    pub cancelled_or_very_late: String,
    pub total: String,
    pub operator_code: Option<String>,
    pub operator_name: Option<String>,
    /// Public performance measure as a whole-number percentage, operator pages only.
    pub ppm: Option<String>,
}

impl RawPerformanceRecord {
    pub fn new(on_time: &str, late: &str, cancelled_or_very_late: &str, total: &str) -> Self {
        RawPerformanceRecord {
            on_time: on_time.to_string(),
            late: late.to_string(),
            cancelled_or_very_late: cancelled_or_very_late.to_string(),
            total: total.to_string(),
            ..Default::default()
        }
    }

    pub fn with_operator(mut self, code: &str, name: &str) -> Self {
        self.operator_code = Some(code.to_string());
        self.operator_name = Some(name.to_string());
        self
    }

    pub fn with_ppm(mut self, ppm: &str) -> Self {
        self.ppm = Some(ppm.to_string());
        self
    }

    pub fn label(&self) -> &str {
        self.operator_name
            .as_deref()
            .or(self.operator_code.as_deref())
            .unwrap_or("national")
    }
}

/// One feed tick: the national summary plus every operator page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeedMessage {
    pub national: RawPerformanceRecord,
    pub operators: Vec<RawPerformanceRecord>,
}

impl FeedMessage {
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        let envelope: RtppmEnvelope = serde_json::from_str(text)
            .map_err(|e| crate::error::Error::FeedDecode(e.to_string()))?;
        Ok(envelope.into())
    }
}

// RTPPM wire format

#[derive(Debug, Deserialize)]
pub struct RtppmEnvelope {
    #[serde(rename = "RTPPMDataMsgV1")]
    pub msg: RtppmDataMsg,
}

#[derive(Debug, Deserialize)]
pub struct RtppmDataMsg {
    #[serde(rename = "RTPPMData")]
    pub data: RtppmData,
}

#[derive(Debug, Deserialize)]
pub struct RtppmData {
    #[serde(rename = "NationalPage")]
    pub national_page: NationalPage,
    #[serde(rename = "OperatorPage", default)]
    pub operator_pages: Vec<OperatorPage>,
}

#[derive(Debug, Deserialize)]
pub struct NationalPage {
    #[serde(rename = "NationalPPM")]
    pub national_ppm: PpmCounters,
}

#[derive(Debug, Deserialize)]
pub struct OperatorPage {
    #[serde(rename = "Operator")]
    pub operator: OperatorCounters,
}

#[derive(Debug, Default, Deserialize)]
pub struct PpmCounters {
    #[serde(rename = "Total", default)]
    pub total: String,
    #[serde(rename = "OnTime", default)]
    pub on_time: String,
    #[serde(rename = "Late", default)]
    pub late: String,
    #[serde(rename = "CancelVeryLate", default)]
    pub cancel_very_late: String,
    #[serde(rename = "PPM")]
    pub ppm: Option<PpmText>,
}

#[derive(Debug, Deserialize)]
pub struct OperatorCounters {
    pub code: String,
    pub name: String,
    #[serde(flatten)]
    pub counters: PpmCounters,
}

#[derive(Debug, Deserialize)]
pub struct PpmText {
    pub text: String,
}

impl From<PpmCounters> for RawPerformanceRecord {
    fn from(c: PpmCounters) -> Self {
        RawPerformanceRecord {
            on_time: c.on_time,
            late: c.late,
            cancelled_or_very_late: c.cancel_very_late,
            total: c.total,
            operator_code: None,
            operator_name: None,
            ppm: c.ppm.map(|p| p.text),
        }
    }
}

impl From<OperatorCounters> for RawPerformanceRecord {
    fn from(op: OperatorCounters) -> Self {
        let mut record = RawPerformanceRecord::from(op.counters);
        record.operator_code = Some(op.code);
        record.operator_name = Some(op.name);
        record
    }
}

impl From<RtppmEnvelope> for FeedMessage {
    fn from(envelope: RtppmEnvelope) -> Self {
        let data = envelope.msg.data;
        FeedMessage {
            national: data.national_page.national_ppm.into(),
            operators: data
                .operator_pages
                .into_iter()
                .map(|page| page.operator.into())
                .collect(),
        }
    }
}
