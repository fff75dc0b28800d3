//! Admin approval deep link.
//!
//! Orders placed through the conversational flow hand the customer a link
//! encoding `view=admin&action=approve&orderId=...`. On load, the admin
//! surface parses the action from its query string and stores back the
//! CLEARED string, so a reload never replays the approval workflow.

use crate::models::DeliveryOrder;
use crate::orders;
use crate::records;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialAction {
    /// Open the approval workflow for this order.
    Approve { order_id: String },
}

/// Build the admin approval link for an order.
pub fn approval_link(base_url: &str, order_id: &str) -> String {
    format!("{base_url}?view=admin&action=approve&orderId={order_id}")
}

/// Full pre-filled handoff message for an order, combining the share
/// summary with the approval link built from `base_url`.
pub fn handoff_message(order: &DeliveryOrder, base_url: &str) -> String {
    orders::share_summary(order, &approval_link(base_url, &order.id))
}

/// Outbound messaging deep link (`https://wa.me/...`) carrying the
/// configured greeting to the restaurant's contact number.
pub fn outbound_contact_link(store: &Store) -> String {
    let phone: String = records::contact_phone(store)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    let message = encode_component(&records::outbound_message(store));
    format!("https://wa.me/{phone}?text={message}")
}

/// Extract the initial action from a page query string.
///
/// Returns the action (if the string encodes a complete one) together
/// with the query string to store back: the action parameters are removed
/// so a reload does not replay, while unrelated parameters survive. An
/// unknown or partial action yields no action and strips nothing.
pub fn parse_initial_action(query: &str) -> (Option<InitialAction>, String) {
    let stripped = query.strip_prefix('?').unwrap_or(query);
    if stripped.is_empty() {
        return (None, String::new());
    }

    let segments: Vec<&str> = stripped.split('&').filter(|s| !s.is_empty()).collect();
    let decoded: Vec<(String, String)> = segments
        .iter()
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((*segment, ""));
            (decode_component(key), decode_component(value))
        })
        .collect();

    let value_of = |key: &str| -> Option<&str> {
        decoded
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let is_approve = value_of("view") == Some("admin")
        && value_of("action") == Some("approve")
        && value_of("orderId").is_some_and(|id| !id.is_empty());
    if !is_approve {
        return (None, stripped.to_string());
    }

    let order_id = value_of("orderId").unwrap_or_default().to_string();
    let cleared: Vec<&str> = segments
        .iter()
        .zip(decoded.iter())
        .filter(|(_, (key, _))| key != "action" && key != "orderId")
        .map(|(segment, _)| *segment)
        .collect();

    (
        Some(InitialAction::Approve { order_id }),
        cleared.join("&"),
    )
}

fn decode_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 3 <= bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(value) => {
                        out.push(value);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_approve_action_and_clear() {
        let (action, cleared) =
            parse_initial_action("?view=admin&action=approve&orderId=order-42");
        assert_eq!(
            action,
            Some(InitialAction::Approve {
                order_id: "order-42".into()
            })
        );
        assert_eq!(cleared, "view=admin");

        // Storing the cleared string back means a reload finds no action
        let (replayed, unchanged) = parse_initial_action(&cleared);
        assert_eq!(replayed, None);
        assert_eq!(unchanged, "view=admin");
    }

    #[test]
    fn test_partial_action_is_ignored_and_untouched() {
        let (action, cleared) = parse_initial_action("view=admin&action=approve");
        assert_eq!(action, None);
        assert_eq!(cleared, "view=admin&action=approve");

        let (action, _) = parse_initial_action("view=chat&action=approve&orderId=order-1");
        assert_eq!(action, None);

        let (action, cleared) = parse_initial_action("");
        assert_eq!(action, None);
        assert_eq!(cleared, "");
    }

    #[test]
    fn test_unrelated_parameters_survive_clearing() {
        let (action, cleared) =
            parse_initial_action("lang=en&view=admin&action=approve&orderId=order-7&theme=dark");
        assert!(action.is_some());
        assert_eq!(cleared, "lang=en&view=admin&theme=dark");
    }

    #[test]
    fn test_percent_encoded_values_decode() {
        let (action, _) =
            parse_initial_action("view=admin&action=approve&orderId=order%2D99");
        assert_eq!(
            action,
            Some(InitialAction::Approve {
                order_id: "order-99".into()
            })
        );
    }

    #[test]
    fn test_approval_link_round_trips_through_parser() {
        let link = approval_link("https://stanley.example/", "order-abc");
        let query = link.split_once('?').map(|(_, q)| q).unwrap_or("");
        let (action, _) = parse_initial_action(query);
        assert_eq!(
            action,
            Some(InitialAction::Approve {
                order_id: "order-abc".into()
            })
        );
    }

    #[test]
    fn test_outbound_contact_link_uses_configured_values() {
        let dir = std::env::temp_dir().join(format!(
            "stanley_deep_link_test_{}",
            uuid::Uuid::new_v4()
        ));
        let store = Store::open(&dir).expect("open store");

        records::set_contact_phone(&store, "+1 (555) 010-0199").expect("set phone");
        records::set_outbound_message(&store, "Hi there").expect("set message");

        let link = outbound_contact_link(&store);
        assert_eq!(link, "https://wa.me/15550100199?text=Hi%20there");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_encode_component_escapes_reserved_characters() {
        assert_eq!(
            encode_component("Hello! I'd like to place an order."),
            "Hello%21%20I%27d%20like%20to%20place%20an%20order."
        );
    }
}
