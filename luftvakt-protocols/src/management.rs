//! Management frame body helpers.

/// Timestamp, beacon interval and capability info precede the tagged
/// parameters of beacons and probe responses.
pub const BEACON_FIXED_LEN: usize = 12;

pub const ELEMENT_SSID: u8 = 0;

/// Iterates `(element_id, payload)` pairs of a tagged-parameter list. Stops at
/// the first truncated element.
pub fn elements(mut data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    std::iter::from_fn(move || {
        let (&id, rest) = data.split_first()?;
        let (&len, rest) = rest.split_first()?;
        let payload = rest.get(..len as usize)?;
        data = &rest[len as usize..];
        Some((id, payload))
    })
}

/// SSID advertised by a beacon or probe response body.
pub fn ssid(body: &[u8]) -> Option<&[u8]> {
    let tagged = body.get(BEACON_FIXED_LEN..)?;
    elements(tagged)
        .find(|(id, _)| *id == ELEMENT_SSID)
        .map(|(_, payload)| payload)
}

/// Reason code of a deauthentication or disassociation body.
pub fn reason_code(body: &[u8]) -> Option<u16> {
    let bytes = body.get(..2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}
