//! Plain-text rendering of the menu and contact card.

use menu_core::config::BrandSettings;
use menu_core::{MenuSection, MenuTree};
use std::fmt::Write;

const POPULAR: &str = "⭐";
const SPICY: &str = "🌶";

pub fn render_tree(tree: &MenuTree) -> String {
    let mut out = String::new();
    for section in tree.sections() {
        render_section(&mut out, section);
        out.push('\n');
    }
    out
}

fn render_section(out: &mut String, section: &MenuSection) {
    let _ = writeln!(out, "{} {}  [{}]", section.emoji, section.title, section.id);
    if section.items.is_empty() {
        let _ = writeln!(out, "    (empty)");
    }
    for (i, item) in section.items.iter().enumerate() {
        let mut markers = String::new();
        if item.is_popular() {
            markers.push(' ');
            markers.push_str(POPULAR);
        }
        if item.is_spicy() {
            markers.push(' ');
            markers.push_str(SPICY);
        }

        let prices = item
            .prices
            .iter()
            .enumerate()
            .map(|(p, price)| match section.caption(i, p) {
                Some(caption) => format!("{caption}: {price}"),
                None => price.clone(),
            })
            .collect::<Vec<_>>()
            .join(" | ");

        let _ = writeln!(out, "  {i:>2}. {}{markers}  {prices}", item.name);
        if let Some(desc) = &item.description {
            let _ = writeln!(out, "      {desc}");
        }
    }
}

pub fn render_contacts(brand: &BrandSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", brand.name, brand.subtitle);
    let _ = writeln!(out, "{}", brand.location);
    for phone in &brand.phones {
        let _ = writeln!(out, "{}: {}", phone.label, phone.number);
    }
    let _ = writeln!(out, "WhatsApp: {}", brand.whatsapp_link());
    let _ = writeln!(out, "Map: {}", brand.maps_link);
    let _ = writeln!(out, "Design: {} ({})", brand.designer, brand.designer_phone);
    out
}
