//! First-run defaults for the store.
//!
//! Seeding only ever fills slots that have never been written — existence
//! is checked per slot before writing, so running the initializer again
//! (or from a second handle) never duplicates records.

use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AgentStatus, AttendanceStatus, DeliveryAgent, FaqItem, GeoPoint, Product};
use crate::store::{Collection, Store};

/// Restaurant name stamped on every order.
pub const RESTAURANT_NAME: &str = "STANLEY'S CAFETERIA";

pub const DEFAULT_ABOUT: &str = "Founded in 2025, Stanley Restaurant was born from a passion for authentic, high-quality food served with a modern twist. We believe in fresh ingredients, culinary excellence, and providing a warm, welcoming experience for every customer.";

pub const DEFAULT_ASSISTANT_INSTRUCTION: &str = "You are a friendly and helpful chatbot for Stanley Restaurant. Your goal is to assist users, show the menu, and answer any questions. You can list available food products with their prices. You can also help users place food delivery orders. Since you work for Stanley Restaurant, you do not need to ask for the restaurant name. When a user wants to place an order, if you don't have all the necessary information, ask for it. The required information is: food items, delivery address, customer's name, and phone number.";

pub const DEFAULT_CONTACT_PHONE: &str = "+971504291207";
pub const DEFAULT_CONTACT_EMAIL: &str = "contact@stanleyrestaurant.com";
pub const DEFAULT_OUTBOUND_MESSAGE: &str = "Hello! I'd like to place an order.";

fn default_products() -> Vec<Product> {
    let entries: [(&str, f64, &str, &str, i64); 5] = [
        (
            "Margherita Pizza",
            12.99,
            "Classic pizza with fresh mozzarella, tomatoes, and basil.",
            "https://placehold.co/600x400/F87171/FFFFFF?text=Pizza",
            20,
        ),
        (
            "Pepperoni Pizza",
            14.99,
            "A favorite with spicy pepperoni and melted cheese.",
            "https://placehold.co/600x400/FBBF24/FFFFFF?text=Pizza",
            15,
        ),
        (
            "Cheeseburger",
            9.99,
            "Juicy beef patty with cheddar cheese, lettuce, and tomato.",
            "https://placehold.co/600x400/34D399/FFFFFF?text=Burger",
            30,
        ),
        (
            "Caesar Salad",
            8.50,
            "Crisp romaine lettuce with Caesar dressing, croutons, and parmesan.",
            "https://placehold.co/600x400/60A5FA/FFFFFF?text=Salad",
            25,
        ),
        (
            "Coca-Cola",
            2.50,
            "A refreshing can of Coca-Cola.",
            "https://placehold.co/600x400/A78BFA/FFFFFF?text=Drink",
            50,
        ),
    ];

    entries
        .iter()
        .map(|(name, price, description, image, stock)| Product {
            id: format!("prod-{}", Uuid::new_v4()),
            name: (*name).to_string(),
            price: *price,
            description: Some((*description).to_string()),
            image: Some((*image).to_string()),
            stock: *stock,
        })
        .collect()
}

fn default_agents() -> Vec<DeliveryAgent> {
    let entries: [(&str, &str, f64); 2] = [
        ("John Doe", "123-456-7890", 12.50),
        ("Jane Smith", "098-765-4321", 13.00),
    ];

    entries
        .iter()
        .map(|(name, phone, hourly_rate)| DeliveryAgent {
            id: format!("agent-{}", Uuid::new_v4()),
            name: (*name).to_string(),
            phone: (*phone).to_string(),
            status: AgentStatus::Available,
            current_location: Some(GeoPoint {
                lat: 34.0522,
                lng: -118.2437,
            }),
            attendance_status: AttendanceStatus::ClockedOut,
            hourly_rate: *hourly_rate,
        })
        .collect()
}

fn default_faqs() -> Vec<FaqItem> {
    vec![
        FaqItem {
            id: format!("faq-{}", Uuid::new_v4()),
            question: "How can I place an order?".to_string(),
            answer: "You can place an order directly through our interactive chat! Just click the 'Chat to Order' button. You can ask our bot to show you the menu, or tell it what you'd like to order.".to_string(),
        },
        FaqItem {
            id: format!("faq-{}", Uuid::new_v4()),
            question: "What are your opening hours?".to_string(),
            answer: "We are open from 11:00 AM to 10:00 PM from Monday to Saturday, and from 12:00 PM to 9:00 PM on Sundays.".to_string(),
        },
    ]
}

/// Seed absent slots with their defaults. Safe to call on every startup.
pub fn ensure_defaults(store: &Store) -> Result<()> {
    let mut seeded = Vec::new();

    if !store.exists(Collection::Products) {
        store.write(Collection::Products, &default_products())?;
        seeded.push("products");
    }
    if !store.exists(Collection::Agents) {
        store.write(Collection::Agents, &default_agents())?;
        seeded.push("agents");
    }
    if !store.exists(Collection::ContactSubmissions) {
        store.write::<crate::models::ContactSubmission>(Collection::ContactSubmissions, &[])?;
        seeded.push("contact_submissions");
    }
    if !store.exists(Collection::Faqs) {
        store.write(Collection::Faqs, &default_faqs())?;
        seeded.push("faqs");
    }

    if !seeded.is_empty() {
        info!(slots = ?seeded, "seeded default data");
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactSubmission;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("stanley_seed_test_{}", Uuid::new_v4()))
    }

    #[test]
    fn test_seeds_defaults_on_first_run() {
        let dir = temp_dir();
        let store = Store::open(&dir).expect("open store");

        ensure_defaults(&store).expect("seed");

        let products: Vec<Product> = store.read(Collection::Products);
        assert_eq!(products.len(), 5);
        assert!(products.iter().any(|p| p.name == "Margherita Pizza"));

        let agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
        assert_eq!(agents.len(), 2);
        assert!(agents
            .iter()
            .all(|a| a.status == AgentStatus::Available
                && a.attendance_status == AttendanceStatus::ClockedOut));

        // Submissions are seeded as an explicitly-present empty slot
        assert!(store.exists(Collection::ContactSubmissions));
        let submissions: Vec<ContactSubmission> = store.read(Collection::ContactSubmissions);
        assert!(submissions.is_empty());

        let faqs: Vec<FaqItem> = store.read(Collection::Faqs);
        assert_eq!(faqs.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_seeding_twice_never_duplicates() {
        let dir = temp_dir();
        let store = Store::open(&dir).expect("open store");

        ensure_defaults(&store).expect("first seed");
        ensure_defaults(&store).expect("second seed");

        let products: Vec<Product> = store.read(Collection::Products);
        assert_eq!(products.len(), 5);
        let agents: Vec<DeliveryAgent> = store.read(Collection::Agents);
        assert_eq!(agents.len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_seeding_respects_existing_data() {
        let dir = temp_dir();
        let store = Store::open(&dir).expect("open store");

        // An admin emptied the catalog on purpose; seeding must not refill it.
        store
            .write::<Product>(Collection::Products, &[])
            .expect("write empty catalog");
        ensure_defaults(&store).expect("seed");

        let products: Vec<Product> = store.read(Collection::Products);
        assert!(
            products.is_empty(),
            "an existing (even empty) slot must not be re-seeded"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
