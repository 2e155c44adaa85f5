//! Histogram wire formats.
//!
//! * legacy: `<count>,<width>,<b0>,<b1>,...;`
//! * linear: `units=bytes:hist-width=...:bucket-width=128:buckets=0,3,9`
//! * logarithmic: `units=bytes:[0-64)=12:[64-128)=3`

use super::{LinearHistogram, LogHistogram, RawHistogram};
use crate::error::{Error, Result};

/// Parse one node's raw histogram text. Empty input, and new-format text
/// without any recognizable field, yield `Ok(None)`.
pub fn parse_raw_histogram(
    name: &str,
    raw: &str,
    logarithmic: bool,
    new_histogram_version: bool,
) -> Result<Option<RawHistogram>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    if !new_histogram_version {
        return parse_legacy(name, raw).map(|h| Some(RawHistogram::Linear(h)));
    }

    if logarithmic {
        return Ok(parse_log(name, raw).map(RawHistogram::Log));
    }

    parse_linear(name, raw).map(|h| h.map(RawHistogram::Linear))
}

fn parse_int<T: std::str::FromStr>(field: &str, what: &str) -> Result<T> {
    field
        .trim()
        .parse()
        .map_err(|_| Error::MalformedHistogram(format!("{} {:?} is not a number", what, field)))
}

fn parse_legacy(name: &str, raw: &str) -> Result<LinearHistogram> {
    let mut fields = raw.split(',').skip(1);

    let width = fields
        .next()
        .ok_or_else(|| Error::MalformedHistogram("missing bucket width".to_string()))
        .and_then(|w| parse_int(w, "bucket width"))?;

    let fields: Vec<&str> = fields.collect();
    let last = fields.len().saturating_sub(1);
    let data = fields
        .into_iter()
        .enumerate()
        .map(|(i, f)| {
            let f = if i == last { f.split(';').next().unwrap_or("") } else { f };
            parse_int(f, "bucket")
        })
        .collect::<Result<Vec<u64>>>()?;

    Ok(LinearHistogram {
        histogram: name.to_string(),
        width,
        data,
        units: None,
    })
}

fn key_value(field: &str) -> Option<(&str, &str)> {
    let mut parts = field.split('=');
    let key = parts.next()?;
    let value = parts.next()?;
    Some((key, value))
}

fn parse_linear(name: &str, raw: &str) -> Result<Option<LinearHistogram>> {
    let mut units = None;
    let mut width = None;
    let mut buckets = None;

    for (key, value) in raw.split(':').filter_map(key_value) {
        match key {
            "units" => units = Some(value.to_string()),
            "bucket-width" => width = Some(value),
            "buckets" => buckets = Some(value),
            _ => {}
        }
    }

    if units.is_none() && width.is_none() && buckets.is_none() {
        return Ok(None);
    }

    let width = width
        .ok_or_else(|| Error::MalformedHistogram("missing bucket-width".to_string()))
        .and_then(|w| parse_int(w, "bucket width"))?;
    let data = buckets
        .ok_or_else(|| Error::MalformedHistogram("missing buckets".to_string()))?
        .split(',')
        .map(|b| parse_int(b, "bucket"))
        .collect::<Result<Vec<u64>>>()?;

    Ok(Some(LinearHistogram {
        histogram: name.to_string(),
        width,
        data,
        units,
    }))
}

fn parse_log(name: &str, raw: &str) -> Option<LogHistogram> {
    let mut fields = raw.split(':');
    let (key, units) = fields.next().and_then(key_value)?;
    if key != "units" {
        return None;
    }

    let data = fields
        .filter_map(key_value)
        .filter_map(|(range, count)| {
            let range = range.strip_suffix(')').unwrap_or(range);
            let range = range.strip_prefix('[').unwrap_or(range);
            let count = count.trim().parse::<u64>().ok()?;
            Some((range.to_string(), count))
        })
        .collect();

    Some(LogHistogram {
        histogram: name.to_string(),
        units: units.to_string(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_format() {
        let parsed = parse_raw_histogram("objsz", "10,128,0,2,5;", false, false)
            .unwrap()
            .unwrap();

        assert_eq!(
            parsed,
            RawHistogram::Linear(LinearHistogram {
                histogram: "objsz".to_string(),
                width: 128,
                data: vec![0, 2, 5],
                units: None,
            })
        );
    }

    #[test]
    fn test_linear_format() {
        let raw = "units=bytes:hist-width=8388608:bucket-width=8192:buckets=0,4,0,1";
        let parsed = parse_raw_histogram("object-size-linear", raw, false, true)
            .unwrap()
            .unwrap();

        let RawHistogram::Linear(h) = parsed else {
            panic!("expected linear histogram");
        };
        assert_eq!(h.width, 8192);
        assert_eq!(h.data, vec![0, 4, 0, 1]);
        assert_eq!(h.units.as_deref(), Some("bytes"));
    }

    #[test]
    fn test_linear_without_buckets_is_malformed() {
        let err = parse_raw_histogram("ttl", "units=seconds:bucket-width=10", false, true).unwrap_err();
        assert!(matches!(err, Error::MalformedHistogram(_)));

        assert_eq!(parse_raw_histogram("ttl", "nothing-here", false, true).unwrap(), None);
    }

    #[test]
    fn test_log_format() {
        let raw = "units=bytes:[0-64)=12:[64-128)=3:[128-256)=bad";
        let parsed = parse_raw_histogram("object-size", raw, true, true).unwrap().unwrap();

        let RawHistogram::Log(h) = parsed else {
            panic!("expected log histogram");
        };
        assert_eq!(h.units, "bytes");
        assert_eq!(
            h.data,
            vec![("0-64".to_string(), 12), ("64-128".to_string(), 3)]
        );
        assert_eq!(parse_raw_histogram("object-size", "[0-64)=1", true, true).unwrap(), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_raw_histogram("objsz", "", false, false).unwrap(), None);
    }
}
