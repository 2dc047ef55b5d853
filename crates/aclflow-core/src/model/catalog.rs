// ── Option catalog ──
//
// Reference data fetched from the backend once per form session. Never
// mutated in place: a forced sync builds a new catalog and swaps it in.

use serde::Serialize;

use aclflow_api::{CategoryOption, EndpointOption, OptionsResponse, RecordId};

use super::row::{Direction, OTHERS};

/// Server-provided dropdown data and the known flows used for pairing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptionCatalog {
    pub system_types: Vec<String>,
    pub categories: Vec<CategoryOption>,
    pub source_endpoints: Vec<EndpointOption>,
    pub destination_endpoints: Vec<EndpointOption>,
    pub services: Vec<String>,
    pub last_sync: Option<String>,
}

/// An endpoint plus the opposite end of the same known flow, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairedEndpoint {
    pub endpoint: EndpointOption,
    pub paired: Option<EndpointOption>,
}

impl PairedEndpoint {
    /// The paired value, or the placeholder a picker would show.
    pub fn paired_label(&self, direction: Direction) -> String {
        self.paired.as_ref().map_or_else(
            || format!("No matching {}", direction.opposite()),
            |p| p.value.clone(),
        )
    }
}

impl From<OptionsResponse> for OptionCatalog {
    fn from(resp: OptionsResponse) -> Self {
        Self {
            system_types: resp.system_types,
            categories: resp.categories,
            source_endpoints: resp.source_ips,
            destination_endpoints: resp.destination_ips,
            services: resp.services,
            last_sync: resp.last_sync,
        }
    }
}

impl OptionCatalog {
    fn endpoints(&self, direction: Direction) -> &[EndpointOption] {
        match direction {
            Direction::Source => &self.source_endpoints,
            Direction::Destination => &self.destination_endpoints,
        }
    }

    /// Categories offered for a system type. Empty for a blank system type
    /// or "Others".
    pub fn categories_for(&self, system_type: &str) -> Vec<&CategoryOption> {
        if system_type.is_empty() || system_type == OTHERS {
            return Vec::new();
        }
        self.categories
            .iter()
            .filter(|c| c.system_type == system_type)
            .collect()
    }

    /// Whether `category` is a catalog category of `system_type`.
    pub fn has_category(&self, system_type: &str, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.system_type == system_type && c.value == category)
    }

    /// Endpoints on one side filtered by system type and category, each
    /// enriched with its paired opposite endpoint.
    pub fn endpoints_for(
        &self,
        direction: Direction,
        system_type: &str,
        category: &str,
    ) -> Vec<PairedEndpoint> {
        if system_type.is_empty() || category.is_empty() || system_type == OTHERS {
            return Vec::new();
        }
        self.endpoints(direction)
            .iter()
            .filter(|e| e.system_type == system_type && e.category == category)
            .map(|e| PairedEndpoint {
                endpoint: e.clone(),
                paired: self.find(direction.opposite(), &e.id).cloned(),
            })
            .collect()
    }

    /// Look up an endpoint by id on one side, ignoring filters.
    pub fn find(&self, direction: Direction, id: &RecordId) -> Option<&EndpointOption> {
        self.endpoints(direction).iter().find(|e| &e.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    fn endpoint(id: i64, value: &str, host: &str, category: &str) -> EndpointOption {
        EndpointOption {
            id: RecordId::from(id),
            value: value.into(),
            host: host.into(),
            system_type: "Prod".into(),
            category: category.into(),
            service: "https".into(),
            description: "web to db".into(),
        }
    }

    /// Prod/Web flow 7: 10.0.0.1 (web1) -> 10.0.0.2 (db1). Flow 8 has no
    /// destination side.
    pub(crate) fn sample() -> OptionCatalog {
        OptionCatalog {
            system_types: vec!["Prod".into(), "Dev".into(), "Others".into()],
            categories: vec![
                CategoryOption {
                    value: "Web".into(),
                    system_type: "Prod".into(),
                    display: "Web".into(),
                },
                CategoryOption {
                    value: "Batch".into(),
                    system_type: "Dev".into(),
                    display: "Batch".into(),
                },
            ],
            source_endpoints: vec![
                endpoint(7, "10.0.0.1", "web1", "Web"),
                endpoint(8, "10.0.0.5", "web5", "Web"),
            ],
            destination_endpoints: vec![endpoint(7, "10.0.0.2", "db1", "Web")],
            services: vec!["https".into()],
            last_sync: None,
        }
    }

    #[test]
    fn categories_filtered_by_system_type() {
        let catalog = sample();
        let cats = catalog.categories_for("Prod");
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].value, "Web");
        assert!(catalog.categories_for("Others").is_empty());
        assert!(catalog.categories_for("").is_empty());
    }

    #[test]
    fn endpoints_are_paired_by_id() {
        let catalog = sample();
        let sources = catalog.endpoints_for(Direction::Source, "Prod", "Web");
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].paired.as_ref().unwrap().value, "10.0.0.2");
        assert!(sources[1].paired.is_none());
        assert_eq!(
            sources[1].paired_label(Direction::Source),
            "No matching destination"
        );

        let dests = catalog.endpoints_for(Direction::Destination, "Prod", "Web");
        assert_eq!(dests[0].paired.as_ref().unwrap().host, "web1");
    }

    #[test]
    fn endpoints_need_system_type_and_category() {
        let catalog = sample();
        assert!(catalog.endpoints_for(Direction::Source, "Prod", "").is_empty());
        assert!(catalog.endpoints_for(Direction::Source, "Others", "Web").is_empty());
        assert!(catalog.endpoints_for(Direction::Source, "Dev", "Web").is_empty());
    }
}
