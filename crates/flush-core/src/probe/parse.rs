//! Parse HTTP response header lines into ProbeResult.

use super::ProbeResult;

/// Parse collected header lines into ProbeResult. `status` is left at 0;
/// the caller fills it from the transfer.
pub(crate) fn parse_headers(lines: &[String]) -> ProbeResult {
    let mut result = ProbeResult::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                result.content_length = value.parse::<u64>().ok();
            } else if name.eq_ignore_ascii_case("accept-ranges") {
                result.accept_ranges = value.eq_ignore_ascii_case("bytes");
            } else if name.eq_ignore_ascii_case("location") && !value.is_empty() {
                result.location = Some(value.to_string());
            }
        }
    }

    result
}
