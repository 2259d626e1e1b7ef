// Generated by tonic-build from proto/*.proto (see build.rs).

pub mod user {
    tonic::include_proto!("user");
}

pub mod permission {
    tonic::include_proto!("permission");
}

pub mod hr {
    tonic::include_proto!("hr");
}

use chrono::{DateTime, Utc};

pub(crate) fn timestamp_to_datetime(ts: Option<prost_types::Timestamp>) -> Option<DateTime<Utc>> {
    let ts = ts?;
    if ts.seconds == 0 && ts.nanos == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(ts.seconds, ts.nanos.max(0) as u32)
}

pub(crate) fn datetime_to_timestamp(dt: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}
