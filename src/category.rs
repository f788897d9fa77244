use std::collections::BTreeSet;

pub const HORSE_RACING_ID: &str = "4a2788f8-e825-4d36-9894-efd4baf1cfae";
pub const HARNESS_RACING_ID: &str = "161d9be2-e909-4326-8c2c-35ed71fb460b";
pub const GREYHOUND_RACING_ID: &str = "9daef0d7-bf3c-4f50-921d-8e818c60fe61";

/// The three race codes the feed publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
pub enum RaceCategory {
    Horse,
    Harness,
    Greyhound,
}

impl RaceCategory {
    pub const ALL: [RaceCategory; 3] = [
        RaceCategory::Horse,
        RaceCategory::Harness,
        RaceCategory::Greyhound,
    ];

    /// The opaque identifier used by the API's `category_id` field.
    pub fn id(self) -> &'static str {
        match self {
            RaceCategory::Horse => HORSE_RACING_ID,
            RaceCategory::Harness => HARNESS_RACING_ID,
            RaceCategory::Greyhound => GREYHOUND_RACING_ID,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RaceCategory::Horse => "Horse Racing",
            RaceCategory::Harness => "Harness Racing",
            RaceCategory::Greyhound => "Greyhound Racing",
        }
    }

    /// Short fixed-width tag for list rows.
    pub fn glyph(self) -> &'static str {
        match self {
            RaceCategory::Horse => "HRS",
            RaceCategory::Harness => "HNS",
            RaceCategory::Greyhound => "GRY",
        }
    }
}

/// Display name for any `category_id`, known or not.
pub fn category_name(id: &str) -> &'static str {
    RaceCategory::from_id(id)
        .map(RaceCategory::display_name)
        .unwrap_or("Unknown Race")
}

/// The set of category identifiers a user wants to see.
///
/// An empty filter lets every category through. Identifiers are kept as raw
/// strings so that categories the app does not know about still filter by
/// their literal id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    ids: BTreeSet<String>,
}

impl CategoryFilter {
    /// Filter that lets everything through.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Every known category selected.
    pub fn all_known() -> Self {
        Self::from_categories(RaceCategory::ALL)
    }

    pub fn from_categories<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = RaceCategory>,
    {
        Self {
            ids: categories.into_iter().map(|c| c.id().to_string()).collect(),
        }
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Whether a race with this `category_id` passes the filter.
    pub fn allows(&self, id: &str) -> bool {
        self.is_unrestricted() || self.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Flip membership of `id`. Removing the last member resets the filter
    /// to every known category, so toggling never leaves it empty.
    pub fn toggle(&mut self, id: &str) {
        if self.ids.remove(id) {
            if self.ids.is_empty() {
                *self = Self::all_known();
            }
        } else {
            self.ids.insert(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_roundtrips_known_categories() {
        for category in RaceCategory::ALL {
            assert_eq!(RaceCategory::from_id(category.id()), Some(category));
        }
        assert_eq!(RaceCategory::from_id("not-a-category"), None);
    }

    #[test]
    fn test_category_name_falls_back_for_unknown() {
        assert_eq!(category_name(GREYHOUND_RACING_ID), "Greyhound Racing");
        assert_eq!(category_name("1"), "Unknown Race");
    }

    #[test]
    fn test_unrestricted_filter_allows_anything() {
        let filter = CategoryFilter::unrestricted();
        assert!(filter.allows(HORSE_RACING_ID));
        assert!(filter.allows("something-else"));
    }

    #[test]
    fn test_filter_matches_literal_ids() {
        let filter = CategoryFilter::from_ids(["custom"]);
        assert!(filter.allows("custom"));
        assert!(!filter.allows(HORSE_RACING_ID));
    }

    #[test]
    fn test_toggle_removes_and_adds() {
        let mut filter = CategoryFilter::all_known();
        filter.toggle(HORSE_RACING_ID);
        assert_eq!(
            filter,
            CategoryFilter::from_categories([RaceCategory::Harness, RaceCategory::Greyhound])
        );

        filter.toggle(HORSE_RACING_ID);
        assert_eq!(filter, CategoryFilter::all_known());
    }

    #[test]
    fn test_toggle_last_member_resets_to_all_known() {
        let mut filter = CategoryFilter::from_categories([RaceCategory::Harness]);
        filter.toggle(HARNESS_RACING_ID);
        assert_eq!(filter, CategoryFilter::all_known());
        assert!(!filter.is_unrestricted());
    }

    #[test]
    fn test_toggle_on_unrestricted_adds_member() {
        let mut filter = CategoryFilter::unrestricted();
        filter.toggle(GREYHOUND_RACING_ID);
        assert_eq!(filter.ids().collect::<Vec<_>>(), vec![GREYHOUND_RACING_ID]);
    }
}
