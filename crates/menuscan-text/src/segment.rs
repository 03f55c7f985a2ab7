// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Menu segmentation: splits noisy recognized text into menu items.
//
// Line rules, in order:
//
// 1. Lines that are blank, shorter than `min_line_chars`, or contain no
//    letter at all are noise and are dropped.
// 2. The last price token on the line becomes the item price and is cut out.
// 3. What remains splits at the first separator (" - ", " – ", " — ",
//    " | ", ":") into name and description. Nothing left means no item.
// 4. A line with no price whose first letter is lowercase continues the
//    previous item's description instead of starting a new item.

use std::sync::LazyLock;

use menuscan_core::config::SegmentationConfig;
use menuscan_core::types::MenuItem;
use regex::Regex;
use tracing::{debug, instrument};

/// An amount with optional thousands grouping and up to two decimals:
/// "12", "12.99", "8,50", "1,200", "1.250,00".
const AMOUNT: &str = r"(?:\d{1,3}(?:[.,]\d{3})+|\d+)(?:[.,]\d{1,2})?";

/// Symbol first: "$12.99", "€ 8,50", "¥1,200". Must not end mid-number.
static PREFIXED_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"[$€£¥₹]\s*{AMOUNT}\b")).expect("prefixed price pattern is valid")
});

/// Symbol or ISO code last: "8,50 €", "1200 JPY". Must not start mid-number.
static SUFFIXED_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b{AMOUNT}\s*(?:[$€£¥₹]|(?:USD|EUR|GBP|JPY|INR)\b)"
    ))
    .expect("suffixed price pattern is valid")
});

/// Name/description boundary.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+[-–—|]\s+|\s*:\s*").expect("separator pattern is valid")
});

/// Dot leaders between a dish name and its price.
static LEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.·…]{2,}").expect("leader pattern is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Characters stripped from the ends of names and descriptions.
fn is_edge_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|' | '·' | '•' | '*' | '_' | '…')
}

/// Split the last price token off `line`.
///
/// Symbol-first prices win over symbol-last ones, so in "Combo 2 $12.99"
/// the price is "$12.99" and not "2 $". Returns the remaining text with whitespace collapsed, and the price with
/// internal whitespace removed (`"$ 12.99"` becomes `"$12.99"`).
pub fn extract_price(line: &str) -> (String, Option<String>) {
    let found = PREFIXED_PRICE
        .find_iter(line)
        .last()
        .or_else(|| SUFFIXED_PRICE.find_iter(line).last());
    match found {
        Some(found) => {
            let price: String = found.as_str().split_whitespace().collect();
            let rest = format!("{} {}", &line[..found.start()], &line[found.end()..]);
            (WHITESPACE.replace_all(rest.trim(), " ").into_owned(), Some(price))
        }
        None => (WHITESPACE.replace_all(line.trim(), " ").into_owned(), None),
    }
}

/// Turn one line into a menu item, or `None` when it has no usable name.
///
/// Pure; does not apply the noise filter or the continuation rule.
pub fn segment_line(line: &str) -> Option<MenuItem> {
    let (rest, price) = extract_price(line);
    let rest = LEADER.replace_all(&rest, " ");
    let rest = rest.trim_matches(is_edge_noise);
    if rest.is_empty() {
        return None;
    }

    let (name, description) = match SEPARATOR.find(rest) {
        Some(sep) => (&rest[..sep.start()], &rest[sep.end()..]),
        None => (rest, ""),
    };
    let name = name.trim_matches(is_edge_noise);
    let description = description.trim_matches(is_edge_noise);

    // A leading separator leaves the name empty; promote the description.
    let (name, description) = if name.is_empty() {
        (description, "")
    } else {
        (name, description)
    };
    if name.is_empty() {
        return None;
    }

    Some(MenuItem::new(name, description, price.unwrap_or_default()))
}

/// Splits recognized menu text into ordered [`MenuItem`]s.
#[derive(Debug, Clone)]
pub struct MenuSegmenter {
    config: SegmentationConfig,
}

impl Default for MenuSegmenter {
    fn default() -> Self {
        Self::new(SegmentationConfig::default())
    }
}

impl MenuSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Segment `text` into menu items, preserving line order.
    #[instrument(skip_all, fields(lines = text.lines().count()))]
    pub fn segment(&self, text: &str) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = Vec::new();

        for line in text.lines().map(str::trim) {
            if self.is_noise(line) {
                continue;
            }

            if self.config.merge_continuations {
                if let Some(previous) = items.last_mut() {
                    if is_continuation(line) {
                        let extra = WHITESPACE.replace_all(line, " ");
                        let extra = extra.trim_matches(is_edge_noise);
                        if !extra.is_empty() {
                            if !previous.description.is_empty() {
                                previous.description.push(' ');
                            }
                            previous.description.push_str(extra);
                            previous.refresh_full_text();
                        }
                        continue;
                    }
                }
            }

            if let Some(item) = segment_line(line) {
                items.push(item);
            }
        }

        debug!(items = items.len(), "Menu text segmented");
        items
    }

    fn is_noise(&self, line: &str) -> bool {
        line.chars().count() < self.config.min_line_chars || !line.chars().any(char::is_alphabetic)
    }
}

/// No price and a lowercase first letter.
fn is_continuation(line: &str) -> bool {
    if PREFIXED_PRICE.is_match(line) || SUFFIXED_PRICE.is_match(line) {
        return false;
    }
    line.chars()
        .find(|c| c.is_alphabetic())
        .is_some_and(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(text: &str) -> Vec<MenuItem> {
        MenuSegmenter::default().segment(text)
    }

    #[test]
    fn caesar_salad_line() {
        let items = segment("Caesar Salad - Fresh romaine lettuce with parmesan cheese $12.99");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Caesar Salad");
        assert_eq!(
            items[0].description,
            "Fresh romaine lettuce with parmesan cheese"
        );
        assert_eq!(items[0].price, "$12.99");
        assert_eq!(
            items[0].full_text,
            "Caesar Salad - Fresh romaine lettuce with parmesan cheese $12.99"
        );
    }

    #[test]
    fn numeric_noise_yields_nothing() {
        assert!(segment("12345").is_empty());
        assert!(segment("$12.99").is_empty());
        assert!(segment("--- ### ---").is_empty());
    }

    #[test]
    fn price_only_line_has_no_name() {
        assert_eq!(segment_line("$12.99"), None);
        assert_eq!(segment_line("  € 8,50 ... "), None);
    }

    #[test]
    fn short_lines_are_noise() {
        assert!(segment("ab\n\n  \nA").is_empty());
    }

    #[test]
    fn last_price_wins() {
        let item = segment_line("Pizza Margherita small $9 large $14.50").unwrap();
        assert_eq!(item.price, "$14.50");
        assert_eq!(item.name, "Pizza Margherita small $9 large");
    }

    #[test]
    fn dot_leaders_are_removed() {
        let item = segment_line("Tomato Soup ........ $6.50").unwrap();
        assert_eq!(item.name, "Tomato Soup");
        assert_eq!(item.description, "");
        assert_eq!(item.full_text, "Tomato Soup $6.50");
    }

    #[test]
    fn suffix_currency_is_recognised() {
        let item = segment_line("Bratwurst: mit Senf und Brot 8,50 €").unwrap();
        assert_eq!(item.name, "Bratwurst");
        assert_eq!(item.description, "mit Senf und Brot");
        assert_eq!(item.price, "8,50€");

        let item = segment_line("Katsu Curry 1200 JPY").unwrap();
        assert_eq!(item.price, "1200JPY");
        assert_eq!(item.name, "Katsu Curry");
    }

    #[test]
    fn quantity_before_a_price_stays_in_the_name() {
        let item = segment_line("Combo 2 $12.99").unwrap();
        assert_eq!(item.name, "Combo 2");
        assert_eq!(item.price, "$12.99");

        let item = segment_line("Chicken Wings 10 $12.99").unwrap();
        assert_eq!(item.name, "Chicken Wings 10");
        assert_eq!(item.price, "$12.99");
    }

    #[test]
    fn thousands_separators_stay_in_the_price() {
        let item = segment_line("Katsu Curry ¥1,200").unwrap();
        assert_eq!(item.name, "Katsu Curry");
        assert_eq!(item.price, "¥1,200");

        let item = segment_line("Paneer Tikka ₹1,250.00").unwrap();
        assert_eq!(item.name, "Paneer Tikka");
        assert_eq!(item.price, "₹1,250.00");

        let item = segment_line("Côte de boeuf 1.250,00 €").unwrap();
        assert_eq!(item.name, "Côte de boeuf");
        assert_eq!(item.price, "1.250,00€");
    }

    #[test]
    fn spaced_symbol_is_normalised() {
        let item = segment_line("Fish and Chips £ 11.5").unwrap();
        assert_eq!(item.price, "£11.5");
    }

    #[test]
    fn hyphenated_words_do_not_split() {
        let item = segment_line("Stir-fry Noodles $10").unwrap();
        assert_eq!(item.name, "Stir-fry Noodles");
        assert_eq!(item.description, "");
    }

    #[test]
    fn item_without_price() {
        let item = segment_line("Chef's Special | ask your server").unwrap();
        assert_eq!(item.name, "Chef's Special");
        assert_eq!(item.description, "ask your server");
        assert_eq!(item.price, "");
        assert_eq!(item.full_text, "Chef's Special - ask your server");
    }

    #[test]
    fn leading_separator_promotes_description() {
        let item = segment_line(": Garlic Bread $4").unwrap();
        assert_eq!(item.name, "Garlic Bread");
        assert_eq!(item.description, "");
    }

    #[test]
    fn lowercase_priceless_lines_continue_the_previous_item() {
        let text = "Caesar Salad - Fresh romaine $12.99\n\
                    with parmesan and croutons\n\
                    Tomato Soup $6.50\n\
                    served with bread";
        let items = segment(text);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "Fresh romaine with parmesan and croutons");
        assert_eq!(
            items[0].full_text,
            "Caesar Salad - Fresh romaine with parmesan and croutons $12.99"
        );
        assert_eq!(items[1].name, "Tomato Soup");
        assert_eq!(items[1].description, "served with bread");
    }

    #[test]
    fn capitalised_priceless_lines_start_new_items() {
        let items = segment("Starters\nGarlic Bread $4\nBruschetta $6");
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Starters", "Garlic Bread", "Bruschetta"]);
    }

    #[test]
    fn lowercase_priced_line_is_its_own_item() {
        let items = segment("Garlic Bread $4\nextra cheese $1.50");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "extra cheese");
        assert_eq!(items[1].price, "$1.50");
    }

    #[test]
    fn leading_continuation_without_previous_item_is_an_item() {
        let items = segment("served daily\nSoup $5");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "served daily");
    }

    #[test]
    fn merging_can_be_disabled() {
        let segmenter = MenuSegmenter::new(SegmentationConfig {
            merge_continuations: false,
            ..SegmentationConfig::default()
        });
        let items = segmenter.segment("Soup $5\nwith bread");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn output_follows_input_order_and_names_prefix_full_text() {
        let text = "ENTRÉES\n\
                    Steak Frites - 8oz sirloin, fries $24\n\
                    7\n\
                    Roast Chicken: half bird, jus €18,00\n\
                    Veggie Burger $15\n\
                    Apple Pie ..... $7";
        let items = segment(text);
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            ["ENTRÉES", "Steak Frites", "Roast Chicken", "Veggie Burger", "Apple Pie"]
        );
        for item in &items {
            assert!(!item.name.is_empty());
            assert!(item.full_text.starts_with(&item.name));
        }
    }

    #[test]
    fn empty_text_yields_no_items() {
        assert!(segment("").is_empty());
        assert!(segment("\n\n   \n").is_empty());
    }
}
