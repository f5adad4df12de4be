//! Endpoint matching against hardware card names.

use crate::object::Properties;

/// Property holding the device class of an endpoint.
pub const DEVICE_CLASS: &str = "device.class";
/// Property holding the backend API of an endpoint.
pub const DEVICE_API: &str = "device.api";
/// Property holding the ALSA card name of an endpoint.
pub const ALSA_CARD_NAME: &str = "alsa.card_name";

/// Check whether an object's properties describe the hardware card `card`.
///
/// The object must be a sound device backed by ALSA whose card name equals
/// `card` exactly.
#[must_use]
pub fn matches_card(properties: &Properties, card: &str) -> bool {
    let is = |key: &str, value: &str| properties.get(key).is_some_and(|v| v == value);

    is(DEVICE_CLASS, "sound") && is(DEVICE_API, "alsa") && is(ALSA_CARD_NAME, card)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    fn card(name: &str) -> Properties {
        props(&[(DEVICE_CLASS, "sound"), (DEVICE_API, "alsa"), (ALSA_CARD_NAME, name)])
    }

    #[test]
    fn test_matches_alsa_sound_card() {
        assert!(matches_card(&card("sgtl5000"), "sgtl5000"));
    }

    #[test]
    fn test_card_name_is_exact() {
        let props = card("SIMCom SIM7100");
        assert!(!matches_card(&props, "simcom sim7100"));
        assert!(!matches_card(&props, "SIMCom"));
    }

    #[test]
    fn test_requires_class_and_api() {
        let mut monitor = card("sgtl5000");
        monitor.insert(DEVICE_CLASS.into(), "monitor".into());
        assert!(!matches_card(&monitor, "sgtl5000"));

        let mut bluez = card("sgtl5000");
        bluez.insert(DEVICE_API.into(), "bluez5".into());
        assert!(!matches_card(&bluez, "sgtl5000"));

        let missing = props(&[(DEVICE_CLASS, "sound"), (ALSA_CARD_NAME, "sgtl5000")]);
        assert!(!matches_card(&missing, "sgtl5000"));
    }
}
