use heapless::String;

/// Battery Service UUID.
pub const BATTERY_SERVICE_UUID: u16 = 0x180F;

const AD_TYPE_UUID16_INCOMPLETE: u8 = 0x02;
const AD_TYPE_UUID16_COMPLETE: u8 = 0x03;
const AD_TYPE_NAME_SHORT: u8 = 0x08;
const AD_TYPE_NAME_COMPLETE: u8 = 0x09;

/// Walk the AD structures, yielding `(ad_type, payload)`.
/// Stops at the first zero-length or truncated structure.
fn ad_structures(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 0;
    core::iter::from_fn(move || {
        let len = *data.get(i)? as usize;
        if len == 0 || i + len >= data.len() {
            return None;
        }
        let ad_type = data[i + 1];
        let payload = &data[i + 2..i + 1 + len];
        i += len + 1;
        Some((ad_type, payload))
    })
}

/// Check if raw advertisement data lists the given 16-bit service UUID.
pub fn contains_service_uuid(data: &[u8], uuid: u16) -> bool {
    let wanted = uuid.to_le_bytes();
    ad_structures(data)
        .filter(|(t, _)| *t == AD_TYPE_UUID16_INCOMPLETE || *t == AD_TYPE_UUID16_COMPLETE)
        .any(|(_, uuids)| uuids.chunks_exact(2).any(|c| c == wanted))
}

pub fn contains_battery_service_uuid(data: &[u8]) -> bool {
    contains_service_uuid(data, BATTERY_SERVICE_UUID)
}

/// Extract complete/shortened local name from advertisement data.
pub fn extract_device_name(data: &[u8]) -> String<32> {
    let mut name = String::new();
    match ad_structures(data).find(|(t, _)| *t == AD_TYPE_NAME_SHORT || *t == AD_TYPE_NAME_COMPLETE)
    {
        Some((_, bytes)) => {
            for &b in bytes {
                if name.push(b as char).is_err() {
                    break;
                }
            }
        }
        None => {
            let _ = name.push_str("Unknown");
        }
    }
    name
}

/// Whether an advertised name passes the configured prefix filter.
pub fn name_matches(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_battery_uuid_in_advertisement() {
        let ad_data = [0x03, 0x03, 0x0F, 0x18];
        assert!(contains_battery_service_uuid(&ad_data));
    }

    #[test]
    fn hid_only_advertisement_is_not_battery() {
        let ad_data = [0x03, 0x03, 0x12, 0x18];
        assert!(!contains_battery_service_uuid(&ad_data));
        assert!(contains_service_uuid(&ad_data, 0x1812));
    }

    #[test]
    fn battery_uuid_among_multiple_uuids() {
        let ad_data = [
            0x02, 0x01, 0x06, // flags
            0x07, 0x02, // len=7, incomplete 16-bit UUIDs
            0x12, 0x18, // HID
            0x0F, 0x18, // Battery
            0x01, 0x18, // GATT
        ];
        assert!(contains_battery_service_uuid(&ad_data));
    }

    #[test]
    fn malformed_structures_stop_parsing() {
        assert!(!contains_battery_service_uuid(&[]));
        assert!(!contains_battery_service_uuid(&[0x00, 0x03, 0x0F, 0x18]));
        assert!(!contains_battery_service_uuid(&[0x05, 0x03, 0x0F]));
    }

    #[test]
    fn names_are_extracted_or_unknown() {
        let named = [0x06, 0x09, b'C', b'o', b'r', b'n', b'e'];
        assert_eq!(extract_device_name(&named).as_str(), "Corne");

        let short = [0x03, 0x08, b'R', b'H'];
        assert_eq!(extract_device_name(&short).as_str(), "RH");

        let unnamed = [0x02, 0x01, 0x06];
        assert_eq!(extract_device_name(&unnamed).as_str(), "Unknown");
    }

    #[test]
    fn prefix_filter() {
        assert!(name_matches("Corne Right", "Corne"));
        assert!(name_matches("anything", ""));
        assert!(!name_matches("Sofle", "Corne"));
    }
}
