//! The current-partner roster used for conflict exclusion.
//!
//! Candidates whose name matches a roster entry (case-insensitive) are
//! removed before scoring, and the roster is rendered into the oracle prompt
//! so competing non-partners can be flagged.

use serde::{Deserialize, Serialize};

/// One existing partner with its category scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentPartner {
    pub name: String,
    pub category: String,
    pub description: String,
    /// Product/service areas the partnership covers.
    #[serde(default)]
    pub inclusions: Vec<String>,
    /// Named competitors or areas excluded by the partnership terms.
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl CurrentPartner {
    fn new(name: &str, category: &str, description: &str, inclusions: &[&str], exclusions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            inclusions: inclusions.iter().map(|s| s.to_string()).collect(),
            exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// The built-in partner portfolio. Overridable via config in a future
/// revision; today callers take this as-is.
pub fn default_roster() -> Vec<CurrentPartner> {
    vec![
        CurrentPartner::new(
            "MLSE",
            "Sports and Entertainment",
            "Maple Leaf Sports & Entertainment - owner and operator of sports teams and venues",
            &["Sports teams", "Entertainment venues", "Sports management"],
            &["Competing sports organizations"],
        ),
        CurrentPartner::new(
            "Rogers",
            "Telecommunications and Media",
            "Telecommunications, internet, and media company",
            &["Telecommunications", "Media broadcasting", "Internet services"],
            &["Bell", "Telus", "Other telecom providers"],
        ),
        CurrentPartner::new(
            "A&W",
            "QSR Burger",
            "Quick service hamburgers",
            &["Hamburgers", "Fast food"],
            &["Other QSR burger chains"],
        ),
        CurrentPartner::new(
            "Adidas",
            "Athletic apparel and athletic footwear",
            "Manufacturing of athletic apparel and athletic footwear products",
            &["Athletic apparel", "Athletic footwear", "Sports equipment"],
            &["Nike", "Under Armour", "Other major athletic apparel brands"],
        ),
        CurrentPartner::new(
            "Air Canada",
            "Commercial air carrier and vacation tour services",
            "Commercial air carrier and vacation tour company services",
            &["Air travel", "Vacation packages"],
            &["Other airlines", "Other travel booking services"],
        ),
        CurrentPartner::new(
            "Amazon Web Services (AWS)",
            "Enterprise cloud infrastructure services",
            "Enterprise level cloud infrastructure and enterprise AI platforms",
            &["Cloud services", "AI platforms"],
            &["Microsoft Azure", "Google Cloud", "Other cloud providers"],
        ),
        CurrentPartner::new(
            "Coca-Cola Refreshments",
            "Non-alcoholic beverages",
            "Carbonated and non-carbonated soft drinks, waters, teas, and juices",
            &["Soft drinks", "Juices", "Water"],
            &["Pepsi products", "Other competing beverage brands"],
        ),
        CurrentPartner::new(
            "Gatorade",
            "Sports drink and nutrition",
            "Sports drinks, electrolyte and fluid replacement beverages, sports nutrition products",
            &["Sports drinks", "Electrolyte beverages"],
            &["BodyArmor", "Other sports drink brands"],
        ),
        CurrentPartner::new(
            "FedEx",
            "Delivery services",
            "Express, ground and freight delivery services",
            &["Package delivery", "Shipping services"],
            &["UPS", "Other shipping companies"],
        ),
        CurrentPartner::new(
            "GoodLife Fitness",
            "Fitness facility",
            "Member-based brick and mortar fitness facility",
            &["Gym memberships", "Fitness centers"],
            &["Other gym chains"],
        ),
        CurrentPartner::new(
            "Scotiabank",
            "Banking and financial services",
            "Retail banking, financial products, and investment services with arena naming rights",
            &["Banking", "Financial services", "Naming rights"],
            &["Other banks", "Financial institutions"],
        ),
        CurrentPartner::new(
            "Molson Coors",
            "Brewing industry",
            "Beer, malt based coolers, other brewed malt beverages and ciders",
            &["Beer", "Cider", "Malt beverages"],
            &["Other beer manufacturers"],
        ),
        CurrentPartner::new(
            "Sobeys",
            "Grocery retail",
            "Retail supermarket and grocery stores, online grocery, meal kit delivery",
            &["Grocery stores", "Supermarkets"],
            &["Other grocery chains"],
        ),
        CurrentPartner::new(
            "Mastercard",
            "Payment systems",
            "Credit card, charge card, electronic payment and pre-paid card systems",
            &["Credit cards", "Payment processing"],
            &["Visa", "American Express", "Other payment processors"],
        ),
        CurrentPartner::new(
            "Sun Life",
            "Insurance and financial services",
            "Insurance, wealth, and asset management solutions",
            &["Insurance", "Financial planning"],
            &["Other insurance and financial service companies"],
        ),
        CurrentPartner::new(
            "Tim Hortons",
            "Coffee and baked goods",
            "Quick service restaurant specializing in coffee, donuts, and baked goods",
            &["Coffee", "Donuts", "Baked goods"],
            &["Starbucks", "Other coffee chains"],
        ),
        CurrentPartner::new(
            "PlayStation",
            "Video game consoles",
            "Home-based video game consoles and hand-held video game devices",
            &["Gaming consoles", "Video games"],
            &["Xbox", "Nintendo", "Other gaming platforms"],
        ),
        CurrentPartner::new(
            "Uber Eats",
            "Food delivery",
            "Online food ordering and delivery platform",
            &["Food delivery", "Restaurant delivery"],
            &["Other food delivery services"],
        ),
    ]
}

/// Render the roster for inclusion in an oracle prompt.
pub fn roster_prompt_text(roster: &[CurrentPartner]) -> String {
    let mut out = String::new();
    for partner in roster {
        out.push_str(&format!(
            "- {} ({}): {}. Covers: {}. Excludes: {}.\n",
            partner.name,
            partner.category,
            partner.description,
            partner.inclusions.join(", "),
            partner.exclusions.join(", "),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_names_are_unique() {
        let roster = default_roster();
        let mut names: Vec<String> = roster.iter().map(|p| p.name.to_lowercase()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), roster.len());
    }

    #[test]
    fn prompt_text_lists_every_partner() {
        let roster = default_roster();
        let text = roster_prompt_text(&roster);
        for partner in &roster {
            assert!(text.contains(&partner.name), "missing {}", partner.name);
        }
    }
}
